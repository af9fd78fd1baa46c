//! The runtime resolution context. An [ObjectGraph] lazily resolves requested types using
//! explicit providers from [modules](crate::module) first, and falls back to deriving providers
//! from registered [injectable constructors](crate::constructor_registry). Resolved providers are
//! cached per graph, so singleton-scoped types resolve to the same instance within a graph, but
//! never across graphs.
//!
//! ```
//! use diy_di::instance_provider::{InstancePtr, TypedInstanceResolver};
//! use diy_di::object_graph::ObjectGraphBuilder;
//! use diy_di::Injectable;
//!
//! #[derive(Injectable)]
//! #[inject(singleton)]
//! struct Logger;
//!
//! #[derive(Injectable)]
//! struct Service {
//!     logger: InstancePtr<Logger>,
//! }
//!
//! let mut graph = ObjectGraphBuilder::new().build();
//! let first = graph.resolve_typed::<Service>().unwrap();
//! let second = graph.resolve_typed::<Service>().unwrap();
//!
//! assert!(!InstancePtr::ptr_eq(&first, &second));
//! assert!(InstancePtr::ptr_eq(&first.logger, &second.logger));
//! ```

use crate::constructor_registry::{ConstructorRegistry, StaticConstructorRegistry};
use crate::error::ResolutionError;
use crate::instance_provider::{InstanceAnyPtr, InstanceResolver, TypeKey};
use crate::module::{Module, ModuleChain, ModulePtr};
use crate::provider::{provider_ptr, singleton, ProviderPtr, ReflectiveProvider};
use fxhash::{FxHashMap, FxHashSet};
use std::any::TypeId;
use tracing::{debug, trace};

#[cfg(not(feature = "threadsafe"))]
pub type ConstructorRegistryPtr = Box<dyn ConstructorRegistry>;
#[cfg(feature = "threadsafe")]
pub type ConstructorRegistryPtr = Box<dyn ConstructorRegistry + Send + Sync>;

/// Builder for [ObjectGraph] with sensible defaults, for easy construction.
pub struct ObjectGraphBuilder {
    modules: Vec<ModulePtr>,
    constructor_registry: ConstructorRegistryPtr,
}

impl ObjectGraphBuilder {
    /// Creates a new builder with a default configuration: no modules and all statically
    /// registered constructors.
    pub fn new() -> Self {
        Self {
            modules: vec![],
            constructor_registry: Box::new(StaticConstructorRegistry::new()),
        }
    }

    /// Adds a module with lower priority than all previously added ones.
    pub fn with_module(mut self, module: ModulePtr) -> Self {
        self.modules.push(module);
        self
    }

    /// Adds modules with lower priority than all previously added ones.
    pub fn with_modules<I: IntoIterator<Item = ModulePtr>>(mut self, modules: I) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Sets new [ConstructorRegistry].
    pub fn with_constructor_registry(mut self, constructor_registry: ConstructorRegistryPtr) -> Self {
        self.constructor_registry = constructor_registry;
        self
    }

    /// Builds resulting [ObjectGraph].
    pub fn build(self) -> ObjectGraph {
        ObjectGraph::new(ModuleChain::new(self.modules), self.constructor_registry)
    }
}

impl Default for ObjectGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolution context owning its modules, constructor registry and resolved providers.
pub struct ObjectGraph {
    modules: ModuleChain,
    constructor_registry: ConstructorRegistryPtr,
    providers: FxHashMap<TypeId, ProviderPtr>,
    types_under_construction: FxHashSet<TypeId>,
}

impl ObjectGraph {
    /// Creates a new graph with given modules, queried in order, and constructor registry.
    pub fn new(modules: ModuleChain, constructor_registry: ConstructorRegistryPtr) -> Self {
        Self {
            modules,
            constructor_registry,
            providers: Default::default(),
            types_under_construction: Default::default(),
        }
    }

    fn provider(&mut self, ty: TypeKey) -> Result<ProviderPtr, ResolutionError> {
        if let Some(provider) = self.providers.get(&ty.id()) {
            return Ok(provider.clone());
        }

        let provider = match self.modules.provider(ty) {
            Some(provider) => {
                debug!(requested_type = %ty, "Using explicitly installed provider.");
                provider
            }
            None => self.derive_provider(ty)?,
        };

        self.providers.insert(ty.id(), provider.clone());
        Ok(provider)
    }

    fn derive_provider(&self, ty: TypeKey) -> Result<ProviderPtr, ResolutionError> {
        let constructor = self
            .constructor_registry
            .constructor(ty)?
            .ok_or(ResolutionError::UnresolvedType(ty))?;

        debug!(
            requested_type = %ty,
            is_singleton = constructor.is_singleton,
            "Deriving provider from injectable constructor."
        );

        let is_singleton = constructor.is_singleton;
        let provider = ReflectiveProvider::new(constructor);
        Ok(if is_singleton {
            provider_ptr(singleton(provider))
        } else {
            provider_ptr(provider)
        })
    }
}

impl InstanceResolver for ObjectGraph {
    fn resolve(&mut self, ty: TypeKey) -> Result<InstanceAnyPtr, ResolutionError> {
        trace!(requested_type = %ty, "Resolving instance.");

        if self.types_under_construction.contains(&ty.id()) {
            return Err(ResolutionError::DependencyCycle(ty));
        }

        let provider = self.provider(ty)?;

        self.types_under_construction.insert(ty.id());
        let instance = provider.get(self);
        self.types_under_construction.remove(&ty.id());

        instance
    }
}

#[cfg(test)]
mod tests {
    use crate::constructor_registry::{InjectableConstructor, MockConstructorRegistry};
    use crate::error::{DeclarationError, ResolutionError};
    use crate::inject::Inject;
    use crate::instance_provider::{InstancePtr, TypeKey, TypedInstanceResolver};
    use crate::module::{BindingModule, ModuleChain, ModulePtr};
    use crate::object_graph::{ConstructorRegistryPtr, ObjectGraph};
    use mockall::predicate::*;

    #[derive(Debug)]
    struct Leaf;

    impl Inject for Leaf {
        type Parameters = ();

        fn inject(_parameters: Self::Parameters) -> Self {
            Leaf
        }
    }

    #[derive(Debug)]
    struct Shared;

    impl Inject for Shared {
        type Parameters = ();

        const SINGLETON: bool = true;

        fn inject(_parameters: Self::Parameters) -> Self {
            Shared
        }
    }

    #[derive(Debug)]
    struct Egg;

    impl Inject for Egg {
        type Parameters = (InstancePtr<Chicken>,);

        fn inject(_parameters: Self::Parameters) -> Self {
            Egg
        }
    }

    #[derive(Debug)]
    struct Chicken;

    impl Inject for Chicken {
        type Parameters = (InstancePtr<Egg>,);

        fn inject(_parameters: Self::Parameters) -> Self {
            Chicken
        }
    }

    fn create_graph(registry: MockConstructorRegistry, modules: Vec<ModulePtr>) -> ObjectGraph {
        ObjectGraph::new(
            ModuleChain::new(modules),
            Box::new(registry) as ConstructorRegistryPtr,
        )
    }

    fn registry_of(constructors: Vec<InjectableConstructor>) -> MockConstructorRegistry {
        let mut registry = MockConstructorRegistry::new();
        registry.expect_constructor().returning(move |ty| {
            Ok(constructors
                .iter()
                .find(|constructor| constructor.target == ty)
                .cloned())
        });
        registry
    }

    #[test]
    fn should_derive_provider_once() {
        let mut registry = MockConstructorRegistry::new();
        registry
            .expect_constructor()
            .with(eq(TypeKey::of::<Leaf>()))
            .times(1)
            .returning(|_| Ok(Some(InjectableConstructor::of::<Leaf>())));

        let mut graph = create_graph(registry, vec![]);
        let first = graph.resolve_typed::<Leaf>().unwrap();
        let second = graph.resolve_typed::<Leaf>().unwrap();

        assert!(!InstancePtr::ptr_eq(&first, &second));
    }

    #[test]
    fn should_memoize_singletons_per_graph() {
        let mut graph = create_graph(registry_of(vec![InjectableConstructor::of::<Shared>()]), vec![]);
        let first = graph.resolve_typed::<Shared>().unwrap();
        let second = graph.resolve_typed::<Shared>().unwrap();
        assert!(InstancePtr::ptr_eq(&first, &second));

        let mut other =
            create_graph(registry_of(vec![InjectableConstructor::of::<Shared>()]), vec![]);
        let third = other.resolve_typed::<Shared>().unwrap();
        assert!(!InstancePtr::ptr_eq(&first, &third));
    }

    #[test]
    fn should_prefer_modules() {
        let leaf = InstancePtr::new(Leaf);
        let mut module = BindingModule::new();
        module.install_instance(leaf.clone());

        let mut registry = MockConstructorRegistry::new();
        registry.expect_constructor().never();

        let mut graph = create_graph(registry, vec![Box::new(module)]);
        assert!(InstancePtr::ptr_eq(
            &graph.resolve_typed::<Leaf>().unwrap(),
            &leaf
        ));
    }

    #[test]
    fn should_not_resolve_unknown_type() {
        let mut graph = create_graph(registry_of(vec![]), vec![]);
        assert_eq!(
            graph.resolve_typed::<Leaf>().unwrap_err(),
            ResolutionError::UnresolvedType(TypeKey::of::<Leaf>())
        );
    }

    #[test]
    fn should_forward_declaration_errors() {
        let mut registry = MockConstructorRegistry::new();
        registry.expect_constructor().returning(|ty| {
            Err(DeclarationError::AmbiguousInjectableConstructor {
                type_name: ty.to_string(),
                count: 2,
            })
        });

        let mut graph = create_graph(registry, vec![]);
        assert!(matches!(
            graph.resolve_typed::<Leaf>().unwrap_err(),
            ResolutionError::Declaration(DeclarationError::AmbiguousInjectableConstructor {
                count: 2,
                ..
            })
        ));
    }

    #[test]
    fn should_detect_dependency_cycles() {
        let mut graph = create_graph(
            registry_of(vec![
                InjectableConstructor::of::<Egg>(),
                InjectableConstructor::of::<Chicken>(),
            ]),
            vec![],
        );

        assert_eq!(
            graph.resolve_typed::<Egg>().unwrap_err(),
            ResolutionError::DependencyCycle(TypeKey::of::<Egg>())
        );

        // the graph stays usable after a failed resolution
        assert_eq!(
            graph.resolve_typed::<Chicken>().unwrap_err(),
            ResolutionError::DependencyCycle(TypeKey::of::<Chicken>())
        );
    }
}
