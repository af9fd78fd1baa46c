//! The coffee maker, wired in two ways: lazily by the [ObjectGraph] runtime resolver from
//! registered constructors, and by [GeneratedCoffeeComponent], which is generated at build time
//! by the static graph compiler from the same declarations.

use crate::component::CoffeeBinds;
use diy_di::module::{BindingModule, ModulePtr};
use diy_di::object_graph::{ObjectGraph, ObjectGraphBuilder};

pub mod coffee_maker;
pub mod component;
pub mod heater;
pub mod logger;
pub mod pump;

include!(concat!(env!("OUT_DIR"), "/coffee_component.rs"));

/// Creates a runtime resolution context with the same bindings as the generated component.
pub fn coffee_graph() -> ObjectGraph {
    ObjectGraphBuilder::new()
        .with_module(Box::new(BindingModule::from_binds::<CoffeeBinds>()) as ModulePtr)
        .build()
}
