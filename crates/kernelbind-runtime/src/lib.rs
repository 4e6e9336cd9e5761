//! Reference runtime for compiled binding plans.
//!
//! Executes [`ClassPlan`](kernelbind_compiler::ClassPlan)s against an
//! in-process managed value model and a host-provided [`NativeLibrary`].
//! The runtime takes every decision from the plans; it never re-derives
//! conversions, dispatch or ownership on its own.
//!
//! ## Modules
//!
//! - [`value`]: managed values (`Rc`-based, caller thread only)
//! - [`native`], [`handle`]: native values and refcounted native handles (`Send`)
//! - [`wrapper`]: managed wrappers and their teardown
//! - [`library`]: the [`NativeLibrary`] seam and a closure-table implementation
//! - [`runtime`]: dispatch, marshalling and the sync/callback/promise paths
//! - [`settle`]: promises, callbacks and [`ManagedError`]
//! - [`pool`], [`duplicate_pool`], [`progress`]: worker-side plumbing

pub mod classes;
pub mod duplicate_pool;
pub mod handle;
pub mod library;
mod marshal;
pub mod native;
pub mod pool;
pub mod progress;
pub mod runtime;
pub mod settle;
pub mod value;
pub mod wrapper;

#[cfg(test)]
mod fixtures;

pub use classes::ClassTable;
pub use duplicate_pool::DuplicatePool;
pub use handle::NativePtr;
pub use library::{NativeCall, NativeError, NativeFunctions, NativeLibrary, NativeReturn};
pub use marshal::Diagnostic;
pub use native::{NativeArg, NativeValue, PodData, PodValue};
pub use pool::WorkerPool;
pub use progress::{ProgressChannel, ProgressReporter};
pub use runtime::{CallOutcome, Runtime};
pub use settle::{Callback, ManagedError, Promise, PromiseState};
pub use value::ManagedValue;
pub use wrapper::{Teardown, Wrapper};
