//! Class registry for kernel bindings.
//!
//! [`ClassRegistry`] holds every wrapped class in declaration order together
//! with the single-inheritance graph, the `cast` table and the type table the
//! declaration parser resolves names against. Classes can be registered as
//! [`ClassSpec`](kernelbind_core::ClassSpec) values or loaded from an
//! [`ApiDocument`].

mod document;
mod inheritance;
mod registry;

pub use document::{ApiDocument, Bases, ClassDeclaration, FunctionDeclaration};
pub use inheritance::InheritanceGraph;
pub use registry::ClassRegistry;
