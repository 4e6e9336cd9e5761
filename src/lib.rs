//! Binding decisions for a CAD geometry kernel exposed to a managed
//! scripting runtime.
//!
//! A [`Context`] collects the class schema (as Rust values or a JSON
//! declaration document) and compiles it into one
//! [`ClassPlan`](kernelbind_compiler::ClassPlan) per class. Plans feed an
//! external template renderer, or [`Bindings`] executes them against a
//! host [`NativeLibrary`](kernelbind_runtime::NativeLibrary).

mod bindings;
mod context;

pub use bindings::{Bindings, Invocation};
pub use context::Context;

pub use kernelbind_compiler as compiler;
pub use kernelbind_core as core;
pub use kernelbind_parser as parser;
pub use kernelbind_registry as registry;
pub use kernelbind_runtime as runtime;

pub mod prelude {
    pub use crate::{Bindings, Context, Invocation};
    pub use kernelbind_compiler::{ClassPlan, FunctionPlan, Shape, Stage, Thread};
    pub use kernelbind_core::{
        ArgSpec, BindError, BindgenConfig, CallError, ClassSpec, ExecutionShapes, FunctionSpec,
        ManagedType, NumericKind, OverloadSpec, ResultCode, ReturnKind, StringKind,
    };
    pub use kernelbind_registry::{ApiDocument, ClassRegistry};
    pub use kernelbind_runtime::{
        CallOutcome, Diagnostic, DuplicatePool, ManagedError, ManagedValue, NativeArg, NativeCall,
        NativeError, NativeFunctions, NativeLibrary, NativePtr, NativeReturn, NativeValue,
        PodValue, ProgressChannel, ProgressReporter, Promise, PromiseState,
    };
}
