//! Emission of construction units. A compiled [ComponentGraph] becomes a plain struct with one
//! `provide_*` method per construction record and an implementation of the component trait, which
//! constructs everything directly without registry or metadata lookups.

use crate::config::CompilerConfig;
use crate::declaration::TypeName;
use crate::error::CompileError;
use crate::graph::{ComponentGraph, ConstructionRecord, Dependency};
use config::ConfigError;
use fxhash::{FxHashMap, FxHashSet};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::{Path, Type};

fn type_path(ty: &TypeName) -> Result<TokenStream, CompileError> {
    syn::parse_str::<Type>(ty.as_str())
        .map(|ty| quote!(#ty))
        .map_err(|_| CompileError::InvalidTypeName(ty.to_string()))
}

fn item_path(name: &str) -> Result<TokenStream, CompileError> {
    syn::parse_str::<Path>(name)
        .map(|path| quote!(#path))
        .map_err(|_| CompileError::InvalidTypeName(name.to_string()))
}

struct Emitter<'a> {
    runtime: Path,
    slots: FxHashMap<&'a TypeName, Ident>,
}

impl<'a> Emitter<'a> {
    fn new(
        graph: &'a ComponentGraph<TypeName>,
        config: &CompilerConfig,
    ) -> Result<Self, CompileError> {
        let runtime = syn::parse_str::<Path>(&config.runtime_crate).map_err(|error| {
            ConfigError::Message(format!(
                "Invalid runtime crate path '{}': {error}",
                config.runtime_crate
            ))
        })?;

        let mut used = FxHashSet::default();
        let slots = graph
            .records
            .iter()
            .map(|record| {
                let mut base = record.ty.snake_name();
                // keywords and names starting with digits are not valid identifiers
                if syn::parse_str::<Ident>(&base).is_err() {
                    base = format!("type_{base}");
                }

                let mut name = base.clone();
                let mut suffix = 1;
                while !used.insert(name.clone()) {
                    suffix += 1;
                    name = format!("{base}_{suffix}");
                }

                (&record.ty, format_ident!("{}", name))
            })
            .collect();

        Ok(Self { runtime, slots })
    }

    fn slot(&self, ty: &TypeName) -> Result<&Ident, CompileError> {
        self.slots
            .get(ty)
            .ok_or_else(|| CompileError::UnresolvedType {
                type_name: ty.to_string(),
                required_by: "generated code".to_string(),
            })
    }

    fn instance_ptr(&self, ty: &TypeName) -> Result<TokenStream, CompileError> {
        let runtime = &self.runtime;
        let path = type_path(ty)?;
        Ok(quote!(#runtime::instance_provider::InstancePtr<#path>))
    }

    fn dependency(&self, dependency: &Dependency<TypeName>) -> Result<TokenStream, CompileError> {
        let provide = format_ident!("provide_{}", self.slot(&dependency.provided)?);
        let mut value = quote!(self.#provide());

        for step in dependency.chain.iter().rev() {
            let module = item_path(&step.module)?;
            let function = format_ident!("{}", step.function);
            value = quote!(#module::#function(#value));
        }

        Ok(value)
    }

    fn field(&self, record: &ConstructionRecord<TypeName>) -> Result<Option<TokenStream>, CompileError> {
        if !record.is_singleton {
            return Ok(None);
        }

        let runtime = &self.runtime;
        let slot = self.slot(&record.ty)?;
        let instance = self.instance_ptr(&record.ty)?;
        Ok(Some(
            quote!(#slot: #runtime::instance_provider::InstanceCell<#instance>),
        ))
    }

    fn initializer(&self, record: &ConstructionRecord<TypeName>) -> Result<Option<TokenStream>, CompileError> {
        if !record.is_singleton {
            return Ok(None);
        }

        let runtime = &self.runtime;
        let slot = self.slot(&record.ty)?;
        Ok(Some(
            quote!(#slot: #runtime::instance_provider::InstanceCell::new()),
        ))
    }

    fn provider(&self, record: &ConstructionRecord<TypeName>) -> Result<TokenStream, CompileError> {
        let runtime = &self.runtime;
        let slot = self.slot(&record.ty)?;
        let provide = format_ident!("provide_{}", slot);
        let path = type_path(&record.ty)?;
        let instance = self.instance_ptr(&record.ty)?;
        let parameters = record
            .parameters
            .iter()
            .map(|parameter| self.dependency(parameter))
            .collect::<Result<Vec<_>, _>>()?;

        let construction = quote! {
            #runtime::instance_provider::InstancePtr::new(
                <#path as #runtime::inject::Inject>::inject((#(#parameters,)*))
            )
        };

        Ok(if record.is_singleton {
            quote! {
                fn #provide(&self) -> #instance {
                    self.#slot.get_or_init(|| #construction).clone()
                }
            }
        } else {
            quote! {
                fn #provide(&self) -> #instance {
                    #construction
                }
            }
        })
    }

    fn emit(&self, graph: &ComponentGraph<TypeName>, name: &Ident) -> Result<TokenStream, CompileError> {
        let component = item_path(&graph.name)?;

        let mut fields = vec![];
        let mut initializers = vec![];
        let mut providers = vec![];
        for record in &graph.records {
            fields.extend(self.field(record)?);
            initializers.extend(self.initializer(record)?);
            providers.push(self.provider(record)?);
        }

        let accessors = graph
            .entry_points
            .iter()
            .map(|entry_point| {
                let accessor = format_ident!("{}", entry_point.name);
                let instance = self.instance_ptr(&entry_point.dependency.requested)?;
                let value = self.dependency(&entry_point.dependency)?;
                Ok(quote! {
                    fn #accessor(&self) -> #instance {
                        #value
                    }
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        Ok(quote! {
            pub struct #name {
                #(#fields,)*
            }

            #[allow(dead_code)]
            impl #name {
                pub fn new() -> Self {
                    Self {
                        #(#initializers,)*
                    }
                }

                #(#providers)*
            }

            impl Default for #name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl #component for #name {
                #(#accessors)*
            }
        })
    }
}

/// Name of the generated construction unit of a component.
pub fn generated_name(component: &str, config: &CompilerConfig) -> String {
    let component = component.rsplit("::").next().unwrap_or(component);
    format!("{}{component}", config.generated_prefix)
}

/// Emits the construction unit of a compiled component. Output only depends on the graph and
/// configuration, so identical input always results in identical output.
pub fn emit(
    graph: &ComponentGraph<TypeName>,
    config: &CompilerConfig,
) -> Result<TokenStream, CompileError> {
    let name = format_ident!("{}", generated_name(&graph.name, config));
    Emitter::new(graph, config)?.emit(graph, &name)
}

#[cfg(test)]
mod tests {
    use crate::config::CompilerConfig;
    use crate::declaration::TypeName;
    use crate::emit::{emit, generated_name};
    use crate::graph::{
        BindStep, ComponentGraph, ConstructionRecord, Dependency, ResolvedEntryPoint,
    };

    fn direct(ty: &str) -> Dependency<TypeName> {
        Dependency {
            requested: ty.into(),
            provided: ty.into(),
            chain: vec![],
        }
    }

    fn graph() -> ComponentGraph<TypeName> {
        ComponentGraph {
            name: "crate::CoffeeComponent".to_string(),
            entry_points: vec![ResolvedEntryPoint {
                name: "pump".to_string(),
                dependency: Dependency {
                    requested: "dyn crate::pump::Pump + Send + Sync".into(),
                    provided: "crate::pump::Thermosiphon".into(),
                    chain: vec![BindStep {
                        module: "crate::CoffeeBinds".to_string(),
                        function: "bind_pump".to_string(),
                    }],
                },
            }],
            records: vec![
                ConstructionRecord {
                    ty: "crate::pump::Thermosiphon".into(),
                    parameters: vec![direct("crate::CoffeeLogger")],
                    is_singleton: false,
                },
                ConstructionRecord {
                    ty: "crate::CoffeeLogger".into(),
                    parameters: vec![],
                    is_singleton: true,
                },
            ],
        }
    }

    fn emit_text(config: &CompilerConfig) -> String {
        emit(&graph(), config).unwrap().to_string()
    }

    #[test]
    fn should_emit_component_implementation() {
        let text = emit_text(&CompilerConfig::default());

        assert!(text.contains("pub struct GeneratedCoffeeComponent"));
        assert!(text.contains("impl crate :: CoffeeComponent for GeneratedCoffeeComponent"));
        assert!(text.contains("fn provide_thermosiphon (& self)"));
        assert!(text.contains(
            "crate :: CoffeeBinds :: bind_pump (self . provide_thermosiphon ())"
        ));
        assert!(text.contains(
            "fn pump (& self) -> diy_di :: instance_provider :: InstancePtr < dyn crate :: pump :: Pump + Send + Sync >"
        ));
    }

    #[test]
    fn should_memoize_singletons_only() {
        let text = emit_text(&CompilerConfig::default());

        assert!(text.contains("coffee_logger : diy_di :: instance_provider :: InstanceCell"));
        assert!(!text.contains("thermosiphon : diy_di :: instance_provider :: InstanceCell"));
        assert!(text.contains("self . coffee_logger . get_or_init"));
    }

    #[test]
    fn should_use_configured_names() {
        let config = CompilerConfig::default()
            .with_runtime_crate("::my_di")
            .with_generated_prefix("Static");
        let text = emit_text(&config);

        assert!(text.contains("pub struct StaticCoffeeComponent"));
        assert!(text.contains(":: my_di :: inject :: Inject"));
        assert_eq!(generated_name("crate::CoffeeComponent", &config), "StaticCoffeeComponent");
    }

    #[test]
    fn should_emit_deterministically() {
        let config = CompilerConfig::default();
        assert_eq!(emit_text(&config), emit_text(&config));
    }

    #[test]
    fn should_reject_invalid_runtime_path() {
        let config = CompilerConfig::default().with_runtime_crate("not a path");
        assert!(emit(&graph(), &config).is_err());
    }

    #[test]
    fn should_keep_same_named_types_apart() {
        let mut graph = graph();
        graph.records.push(ConstructionRecord {
            ty: "crate::other::CoffeeLogger".into(),
            parameters: vec![],
            is_singleton: false,
        });
        let text = emit(&graph, &CompilerConfig::default()).unwrap().to_string();

        assert!(text.contains("fn provide_coffee_logger (& self)"));
        assert!(text.contains("fn provide_coffee_logger_2 (& self)"));
        assert!(text.contains("< crate :: other :: CoffeeLogger as diy_di :: inject :: Inject >"));
    }
}
