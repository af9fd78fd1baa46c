//! Static graph compiler for [diy_di] components. Reads the same declarations as the runtime
//! [ObjectGraph](diy_di::object_graph::ObjectGraph), but ahead of time: component dependency graphs
//! are traversed, validated and emitted as plain construction code, which resolves the same object
//! graph as the runtime resolver without any metadata or registry lookups.
//!
//! Compilation is split into two phases:
//!
//! 1. [GraphCompiler](graph::GraphCompiler) turns a
//!    [ComponentDeclaration](declaration::ComponentDeclaration) into a
//!    [ComponentGraph](graph::ComponentGraph) of construction records.
//! 2. [emit](emit::emit) turns the graph into a construction unit.
//!
//! Build scripts usually use the [Generator](generator::Generator), which combines both phases with
//! [source scanning](source::SourceDeclarations).

pub mod config;
pub mod declaration;
pub mod emit;
pub mod error;
pub mod generator;
pub mod graph;
pub mod module_scope;
pub mod source;
