//! Static traversal of component dependency graphs. Starting from the entry points and bind
//! targets of a component, every reachable type is visited once and described by a
//! [ConstructionRecord]. Traversal is generic over the type key, so the same algorithm runs on
//! names parsed from sources as well as on runtime type keys.

use crate::declaration::{BindModule, ComponentDeclaration};
use crate::error::CompileError;
use diy_di::declaration::Declarations;
use diy_di::error::DeclarationError;
use fxhash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::fmt::Display;
use std::hash::Hash;
use tracing::{debug, info};

/// Single application of a bind function.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct BindStep {
    pub module: String,
    pub function: String,
}

/// Requested type along with the type actually constructed for it. The chain lists the bind
/// functions to apply to the provided instance, outermost first.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Dependency<K> {
    pub requested: K,
    pub provided: K,
    pub chain: Vec<BindStep>,
}

/// Construction description of a single concrete type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ConstructionRecord<K> {
    pub ty: K,
    pub parameters: Vec<Dependency<K>>,
    pub is_singleton: bool,
}

/// Entry point with its requested type already substituted.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ResolvedEntryPoint<K> {
    pub name: String,
    pub dependency: Dependency<K>,
}

/// Result of compiling a component - records are kept in discovery order.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ComponentGraph<K> {
    pub name: String,
    pub entry_points: Vec<ResolvedEntryPoint<K>>,
    pub records: Vec<ConstructionRecord<K>>,
}

impl<K: Eq> ComponentGraph<K> {
    pub fn record(&self, ty: &K) -> Option<&ConstructionRecord<K>> {
        self.records.iter().find(|record| record.ty == *ty)
    }
}

/// Requested type -> (provided type, bind function) mapping.
struct BindMap<K> {
    binds: FxHashMap<K, (K, BindStep)>,
}

impl<K: Clone + Eq + Hash + Display> BindMap<K> {
    fn new(modules: &[BindModule<K>]) -> Result<Self, CompileError> {
        let mut binds = FxHashMap::default();
        for module in modules {
            let mut module_binds = FxHashMap::default();
            for function in &module.binds {
                let [parameter] = function.parameters.as_slice() else {
                    return Err(DeclarationError::MalformedBindFunction {
                        module: module.name.clone(),
                        function: function.name.clone(),
                        count: function.parameters.len(),
                    }
                    .into());
                };

                module_binds.insert(
                    function.requested.clone(),
                    (
                        parameter.clone(),
                        BindStep {
                            module: module.name.clone(),
                            function: function.name.clone(),
                        },
                    ),
                );
            }

            for (requested, bind) in module_binds {
                binds.entry(requested).or_insert(bind);
            }
        }

        Ok(Self { binds })
    }

    fn substitute(&self, requested: &K) -> Result<Dependency<K>, CompileError> {
        let mut provided = requested.clone();
        let mut chain = vec![];
        let mut visited = FxHashSet::default();

        while let Some((next, step)) = self.binds.get(&provided) {
            if !visited.insert(provided.clone()) {
                return Err(CompileError::BindingCycle(provided.to_string()));
            }

            chain.push(step.clone());
            provided = next.clone();
        }

        Ok(Dependency {
            requested: requested.clone(),
            provided,
            chain,
        })
    }
}

/// Compiles component declarations into [ComponentGraph]s.
pub struct GraphCompiler<'a, D: ?Sized> {
    declarations: &'a D,
}

impl<'a, D: ?Sized> GraphCompiler<'a, D> {
    pub fn new(declarations: &'a D) -> Self {
        Self { declarations }
    }

    /// Compiles a single component. Fails on the first error found, without partial results.
    pub fn compile<K>(
        &self,
        component: &ComponentDeclaration<K>,
    ) -> Result<ComponentGraph<K>, CompileError>
    where
        D: Declarations<K>,
        K: Clone + Eq + Hash + Display,
    {
        info!(component = %component.name, "Compiling component graph.");

        let binds = BindMap::new(&component.modules)?;

        let entry_points: Vec<_> = component
            .entry_points
            .iter()
            .map(|entry_point| {
                binds
                    .substitute(&entry_point.ty)
                    .map(|dependency| ResolvedEntryPoint {
                        name: entry_point.name.clone(),
                        dependency,
                    })
            })
            .collect::<Result<_, _>>()?;

        let mut queue = VecDeque::new();
        for entry_point in &entry_points {
            queue.push_back((
                entry_point.dependency.provided.clone(),
                format!("entry point '{}'", entry_point.name),
            ));
        }

        for module in &component.modules {
            for function in &module.binds {
                for parameter in &function.parameters {
                    queue.push_back((
                        binds.substitute(parameter)?.provided,
                        format!("bind function '{}::{}'", module.name, function.name),
                    ));
                }
            }
        }

        let mut visited = FxHashSet::default();
        let mut records = vec![];

        while let Some((ty, required_by)) = queue.pop_front() {
            if !visited.insert(ty.clone()) {
                continue;
            }

            let parameters = self
                .declarations
                .injectable_constructor(&ty)?
                .ok_or_else(|| CompileError::UnresolvedType {
                    type_name: ty.to_string(),
                    required_by,
                })?;

            let parameters: Vec<_> = parameters
                .iter()
                .map(|parameter| binds.substitute(parameter))
                .collect::<Result<_, _>>()?;

            for parameter in &parameters {
                queue.push_back((
                    parameter.provided.clone(),
                    format!("constructor of '{ty}'"),
                ));
            }

            let is_singleton = self.declarations.is_singleton(&ty);
            debug!(%ty, is_singleton, "Recorded construction.");

            records.push(ConstructionRecord {
                ty,
                parameters,
                is_singleton,
            });
        }

        check_cycles(&records)?;

        info!(
            component = %component.name,
            count = records.len(),
            "Compiled component graph."
        );

        Ok(ComponentGraph {
            name: component.name.clone(),
            entry_points,
            records,
        })
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum VisitState {
    InProgress,
    Done,
}

fn check_cycles<K: Eq + Hash + Display>(records: &[ConstructionRecord<K>]) -> Result<(), CompileError> {
    let indices: FxHashMap<&K, usize> = records
        .iter()
        .enumerate()
        .map(|(index, record)| (&record.ty, index))
        .collect();

    let mut states = vec![None; records.len()];
    for start in 0..records.len() {
        let mut path = vec![];
        visit(start, records, &indices, &mut states, &mut path)?;
    }

    Ok(())
}

fn visit<K: Eq + Hash + Display>(
    index: usize,
    records: &[ConstructionRecord<K>],
    indices: &FxHashMap<&K, usize>,
    states: &mut [Option<VisitState>],
    path: &mut Vec<usize>,
) -> Result<(), CompileError> {
    match states[index] {
        Some(VisitState::Done) => return Ok(()),
        Some(VisitState::InProgress) => {
            let start = path
                .iter()
                .position(|visited| *visited == index)
                .unwrap_or_default();

            return Err(CompileError::DependencyCycle(
                path[start..]
                    .iter()
                    .chain([index].iter())
                    .map(|index| records[*index].ty.to_string())
                    .collect(),
            ));
        }
        None => {}
    }

    states[index] = Some(VisitState::InProgress);
    path.push(index);

    for parameter in &records[index].parameters {
        if let Some(next) = indices.get(&parameter.provided) {
            visit(*next, records, indices, states, path)?;
        }
    }

    path.pop();
    states[index] = Some(VisitState::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::declaration::{BindFunction, BindModule, ComponentDeclaration, EntryPoint, TypeName};
    use crate::error::CompileError;
    use crate::graph::{BindStep, GraphCompiler};
    use diy_di::declaration::Declarations;
    use diy_di::error::DeclarationError;
    use fxhash::{FxHashMap, FxHashSet};

    #[derive(Default)]
    struct TestDeclarations {
        constructors: FxHashMap<TypeName, Vec<Vec<TypeName>>>,
        singletons: FxHashSet<TypeName>,
    }

    impl TestDeclarations {
        fn with(mut self, ty: &str, parameters: &[&str]) -> Self {
            self.constructors
                .entry(ty.into())
                .or_default()
                .push(parameters.iter().map(|parameter| (*parameter).into()).collect());
            self
        }

        fn with_singleton(mut self, ty: &str, parameters: &[&str]) -> Self {
            self.singletons.insert(ty.into());
            self.with(ty, parameters)
        }
    }

    impl Declarations<TypeName> for TestDeclarations {
        fn injectable_constructor(
            &self,
            ty: &TypeName,
        ) -> Result<Option<Vec<TypeName>>, DeclarationError> {
            diy_di::declaration::single_constructor(
                ty,
                self.constructors.get(ty).cloned().unwrap_or_default(),
            )
        }

        fn is_singleton(&self, ty: &TypeName) -> bool {
            self.singletons.contains(ty)
        }
    }

    fn bind(name: &str, requested: &str, parameters: &[&str]) -> BindFunction<TypeName> {
        BindFunction {
            name: name.to_string(),
            requested: requested.into(),
            parameters: parameters.iter().map(|parameter| (*parameter).into()).collect(),
        }
    }

    fn component(
        entry_points: &[(&str, &str)],
        modules: Vec<BindModule<TypeName>>,
    ) -> ComponentDeclaration<TypeName> {
        ComponentDeclaration {
            name: "TestComponent".to_string(),
            entry_points: entry_points
                .iter()
                .map(|(name, ty)| EntryPoint {
                    name: name.to_string(),
                    ty: (*ty).into(),
                })
                .collect(),
            modules,
        }
    }

    fn module(name: &str, binds: Vec<BindFunction<TypeName>>) -> BindModule<TypeName> {
        BindModule {
            name: name.to_string(),
            binds,
        }
    }

    #[test]
    fn should_record_diamond_once() {
        let declarations = TestDeclarations::default()
            .with("A", &["X", "Y"])
            .with("X", &["Z"])
            .with("Y", &["Z"])
            .with_singleton("Z", &[]);

        let graph = GraphCompiler::new(&declarations)
            .compile(&component(&[("a", "A")], vec![]))
            .unwrap();

        let types: Vec<_> = graph.records.iter().map(|record| record.ty.as_str()).collect();
        assert_eq!(types, vec!["A", "X", "Y", "Z"]);
        assert!(graph.record(&"Z".into()).unwrap().is_singleton);
        assert!(!graph.record(&"A".into()).unwrap().is_singleton);
    }

    #[test]
    fn should_substitute_bound_types() {
        let declarations = TestDeclarations::default()
            .with("CoffeeMaker", &["dyn Pump"])
            .with("Thermosiphon", &[]);

        let graph = GraphCompiler::new(&declarations)
            .compile(&component(
                &[("maker", "CoffeeMaker"), ("pump", "dyn Pump")],
                vec![module(
                    "CoffeeBinds",
                    vec![bind("bind_pump", "dyn Pump", &["Thermosiphon"])],
                )],
            ))
            .unwrap();

        let pump = &graph.entry_points[1].dependency;
        assert_eq!(pump.provided.as_str(), "Thermosiphon");
        assert_eq!(
            pump.chain,
            vec![BindStep {
                module: "CoffeeBinds".to_string(),
                function: "bind_pump".to_string(),
            }]
        );

        let maker = graph.record(&"CoffeeMaker".into()).unwrap();
        assert_eq!(maker.parameters[0].provided.as_str(), "Thermosiphon");
        assert!(graph.record(&"dyn Pump".into()).is_none());
    }

    #[test]
    fn should_follow_bind_chains() {
        let declarations = TestDeclarations::default().with("C", &[]);

        let graph = GraphCompiler::new(&declarations)
            .compile(&component(
                &[("a", "A")],
                vec![module(
                    "Binds",
                    vec![bind("a_to_b", "A", &["B"]), bind("b_to_c", "B", &["C"])],
                )],
            ))
            .unwrap();

        let functions: Vec<_> = graph.entry_points[0]
            .dependency
            .chain
            .iter()
            .map(|step| step.function.as_str())
            .collect();
        assert_eq!(functions, vec!["a_to_b", "b_to_c"]);
        assert_eq!(graph.records.len(), 1);
    }

    #[test]
    fn should_prefer_first_module_and_last_bind_within_module() {
        let declarations = TestDeclarations::default()
            .with("A", &[])
            .with("B", &[])
            .with("C", &[]);

        let graph = GraphCompiler::new(&declarations)
            .compile(&component(
                &[("heater", "dyn Heater")],
                vec![
                    module(
                        "First",
                        vec![
                            bind("to_a", "dyn Heater", &["A"]),
                            bind("to_b", "dyn Heater", &["B"]),
                        ],
                    ),
                    module("Second", vec![bind("to_c", "dyn Heater", &["C"])]),
                ],
            ))
            .unwrap();

        assert_eq!(graph.entry_points[0].dependency.provided.as_str(), "B");

        // all bind targets are constructible, even when overridden
        assert_eq!(graph.records.len(), 3);
    }

    #[test]
    fn should_reject_malformed_bind_functions() {
        let declarations = TestDeclarations::default();

        let error = GraphCompiler::new(&declarations)
            .compile(&component(
                &[],
                vec![module("Binds", vec![bind("bad", "A", &["B", "C"])])],
            ))
            .unwrap_err();

        assert!(matches!(
            error,
            CompileError::Declaration(DeclarationError::MalformedBindFunction { count: 2, .. })
        ));
    }

    #[test]
    fn should_reject_ambiguous_constructors() {
        let declarations = TestDeclarations::default().with("A", &[]).with("A", &["B"]);

        let error = GraphCompiler::new(&declarations)
            .compile(&component(&[("a", "A")], vec![]))
            .unwrap_err();

        assert!(matches!(
            error,
            CompileError::Declaration(DeclarationError::AmbiguousInjectableConstructor {
                count: 2,
                ..
            })
        ));
    }

    #[test]
    fn should_reject_unresolved_types() {
        let declarations = TestDeclarations::default().with("A", &["B"]);

        let error = GraphCompiler::new(&declarations)
            .compile(&component(&[("a", "A")], vec![]))
            .unwrap_err();

        match error {
            CompileError::UnresolvedType {
                type_name,
                required_by,
            } => {
                assert_eq!(type_name, "B");
                assert_eq!(required_by, "constructor of 'A'");
            }
            error => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn should_reject_binding_cycles() {
        let declarations = TestDeclarations::default();

        let error = GraphCompiler::new(&declarations)
            .compile(&component(
                &[("a", "A")],
                vec![module(
                    "Binds",
                    vec![bind("a_to_b", "A", &["B"]), bind("b_to_a", "B", &["A"])],
                )],
            ))
            .unwrap_err();

        assert!(matches!(error, CompileError::BindingCycle(_)));
    }

    #[test]
    fn should_reject_dependency_cycles() {
        let declarations = TestDeclarations::default()
            .with("A", &["B"])
            .with("B", &["C"])
            .with("C", &["A"]);

        let error = GraphCompiler::new(&declarations)
            .compile(&component(&[("a", "A")], vec![]))
            .unwrap_err();

        match error {
            CompileError::DependencyCycle(cycle) => {
                assert_eq!(cycle, vec!["A", "B", "C", "A"]);
            }
            error => panic!("Unexpected error: {error}"),
        }
    }
}
