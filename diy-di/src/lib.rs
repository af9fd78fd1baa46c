//! A dependency injection framework resolving object graphs from injectable constructors and
//! explicit binding modules.
//!
//! The core concepts are:
//!
//! * [Injectable types](crate::inject) - types with a single designated constructor, whose
//!   parameters are other injectable types or explicitly bound ones.
//! * [Providers](crate::provider) - units of construction for a single type, optionally memoized as
//!   singletons.
//! * [Modules](crate::module) - explicit bindings of requested types to providers, most notably
//!   binding abstract `dyn Trait` types to concrete implementations.
//! * [Object graphs](crate::object_graph) - resolution contexts lazily resolving requested types.
//!
//! The same declarations can also be compiled ahead of time into plain construction code by a
//! static graph compiler, which produces identical object graphs without any runtime metadata.
//!
//! ### Features
//!
//! * `threadsafe` - use thread-safe pointers and singleton cells (default)
//! * `derive` - re-export the procedural macros (default)
//!
//! ### Basic usage
//!
//! ```
//! use diy_di::instance_provider::{InstancePtr, TypedInstanceResolver};
//! use diy_di::module::{BindingModule, ModulePtr};
//! use diy_di::object_graph::ObjectGraphBuilder;
//! use diy_di::{binds, Injectable};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Injectable)]
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "Hello!".to_string()
//!     }
//! }
//!
//! struct GreeterBinds;
//!
//! #[binds]
//! impl GreeterBinds {
//!     fn bind_greeter(greeter: InstancePtr<EnglishGreeter>) -> InstancePtr<dyn Greeter> {
//!         greeter
//!     }
//! }
//!
//! let mut graph = ObjectGraphBuilder::new()
//!     .with_module(Box::new(BindingModule::from_binds::<GreeterBinds>()) as ModulePtr)
//!     .build();
//!
//! let greeter = graph.resolve_typed::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "Hello!");
//! ```

pub mod constructor_registry;
pub mod declaration;
pub mod error;
pub mod factory;
pub mod inject;
pub mod instance_provider;
pub mod module;
pub mod object_graph;
pub mod provider;

#[cfg(feature = "derive")]
pub use diy_di_derive::{binds, component, injectable, Injectable};

/// Registers a manual [Inject](crate::inject::Inject) implementation, making it visible to the
/// [StaticConstructorRegistry](crate::constructor_registry::StaticConstructorRegistry) and the
/// [FactoryModule](crate::factory::FactoryModule). Implementations generated by the macros are
/// registered automatically.
#[macro_export]
macro_rules! register_injectable {
    ($ty:ty) => {
        const _: () = {
            fn register_constructor() -> $crate::constructor_registry::InjectableConstructor {
                $crate::constructor_registry::InjectableConstructor::of::<$ty>()
            }

            fn register_factory() -> $crate::factory::FactoryDefinition {
                $crate::factory::FactoryDefinition::of::<$ty>()
            }

            $crate::constructor_registry::internal::submit! {
                $crate::constructor_registry::internal::ConstructorRegisterer {
                    register: register_constructor
                }
            }

            $crate::constructor_registry::internal::submit! {
                $crate::factory::internal::FactoryRegisterer {
                    register: register_factory
                }
            }
        };
    };
}
