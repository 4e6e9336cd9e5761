//! Compiled plans bound to a native library.
//!
//! `Bindings` is the context object every wrap, unwrap and cast goes
//! through; there is no global constructor registry.

use std::sync::Arc;

use kernelbind_compiler::{ClassPlan, Shape};
use kernelbind_core::{BindError, BindgenConfig, CallError};
use kernelbind_runtime::{
    CallOutcome, Callback, ManagedError, ManagedValue, NativeLibrary, NativePtr, NativeValue,
    Promise, Runtime,
};

/// What invoking an entry point produced.
#[derive(Debug)]
pub enum Invocation {
    /// `Name`: the call already returned.
    Returned(CallOutcome),
    /// `Name_async`: settles on `run_pending`/`wait_idle`.
    Promise(Promise),
    /// `Name_callback`: the callback runs on `run_pending`/`wait_idle`.
    Queued,
}

pub struct Bindings {
    runtime: Runtime,
}

impl Bindings {
    pub fn new(
        plans: Vec<ClassPlan>,
        library: Arc<dyn NativeLibrary>,
        config: BindgenConfig,
    ) -> Result<Self, BindError> {
        Ok(Self {
            runtime: Runtime::new(plans, library, config)?,
        })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn plan(&self, class: &str) -> Option<&ClassPlan> {
        self.runtime.classes().get(class)
    }

    /// Call an entry point by its registered name.
    ///
    /// Callback entries take the callback separately since managed values
    /// carry no functions.
    pub fn invoke(
        &self,
        class: &str,
        entry: &str,
        this: Option<&ManagedValue>,
        args: &[ManagedValue],
        callback: Option<Callback>,
    ) -> Result<Invocation, CallError> {
        let (function, shape) = self
            .runtime
            .resolve_entry(class, entry)
            .ok_or_else(|| CallError::Internal(format!("{class} has no entry point {entry}")))?;
        match (shape, callback) {
            (Shape::Sync, _) => self
                .runtime
                .call(class, function, this, args)
                .map(Invocation::Returned),
            (Shape::Promise, _) => Ok(Invocation::Promise(
                self.runtime.call_async(class, function, this, args),
            )),
            (Shape::Callback, Some(callback)) => {
                self.runtime
                    .call_with_callback(class, function, this, args, callback);
                Ok(Invocation::Queued)
            }
            (Shape::Callback, None) => Err(CallError::Internal(format!(
                "{entry} needs a completion callback"
            ))),
        }
    }

    // === Delegates ===

    pub fn construct(&self, class: &str, args: &[ManagedValue]) -> Result<ManagedValue, CallError> {
        self.runtime.construct(class, args)
    }

    pub fn call(
        &self,
        class: &str,
        function: &str,
        this: Option<&ManagedValue>,
        args: &[ManagedValue],
    ) -> Result<CallOutcome, CallError> {
        self.runtime.call(class, function, this, args)
    }

    pub fn call_async(
        &self,
        class: &str,
        function: &str,
        this: Option<&ManagedValue>,
        args: &[ManagedValue],
    ) -> Promise {
        self.runtime.call_async(class, function, this, args)
    }

    pub fn call_with_callback<F>(
        &self,
        class: &str,
        function: &str,
        this: Option<&ManagedValue>,
        args: &[ManagedValue],
        callback: F,
    ) where
        F: FnOnce(Option<ManagedError>, ManagedValue) + 'static,
    {
        self.runtime
            .call_with_callback(class, function, this, args, callback)
    }

    pub fn get_field(&self, target: &ManagedValue, field: &str) -> Result<ManagedValue, CallError> {
        self.runtime.get_field(target, field)
    }

    pub fn set_field(
        &self,
        target: &ManagedValue,
        field: &str,
        value: &ManagedValue,
    ) -> Result<(), CallError> {
        self.runtime.set_field(target, field, value)
    }

    pub fn wrap(&self, class: &str, ptr: NativePtr) -> Result<ManagedValue, CallError> {
        self.runtime.wrap(class, ptr)
    }

    pub fn unwrap(&self, value: &ManagedValue, class: &str) -> Result<NativeValue, CallError> {
        self.runtime.unwrap(value, class)
    }

    pub fn cast(&self, value: &ManagedValue, requested: u32) -> Result<ManagedValue, CallError> {
        self.runtime.cast(value, requested)
    }

    pub fn instance_of(&self, value: &ManagedValue, class: &str) -> bool {
        self.runtime.instance_of(value, class)
    }

    pub fn run_pending(&self) -> usize {
        self.runtime.run_pending()
    }

    pub fn wait_idle(&self) -> usize {
        self.runtime.wait_idle()
    }

    pub fn pending_count(&self) -> usize {
        self.runtime.pending_count()
    }
}
