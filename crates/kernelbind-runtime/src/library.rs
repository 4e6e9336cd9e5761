//! The native side of the binding.
//!
//! The runtime never links against the kernel itself. Hosts implement
//! [`NativeLibrary`] (or fill a [`NativeFunctions`] table) and the runtime
//! calls into it from the calling thread or from workers.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::handle::NativePtr;
use crate::native::{NativeArg, NativeValue};

/// A native callable failed outright (not through a sentinel return).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NativeError(pub String);

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        NativeError(message.into())
    }
}

/// A prepared native call. Owned and `Send`, so it can move to a worker.
#[derive(Debug, Clone)]
pub struct NativeCall {
    /// The managed class first, then its ancestors nearest first.
    pub lineage: Arc<[String]>,
    /// Native function name.
    pub function: String,
    /// Overload index in declaration order.
    pub overload: usize,
    /// Receiver for instance methods.
    pub this: Option<NativeValue>,
    /// Arguments in managed position order; out-parameters are not included.
    pub args: Vec<NativeArg>,
}

impl NativeCall {
    pub fn class(&self) -> &str {
        self.lineage.first().map_or("", String::as_str)
    }

    pub fn arg(&self, position: usize) -> Option<&NativeValue> {
        self.args.get(position).and_then(NativeArg::value)
    }
}

/// What a native call produced.
#[derive(Debug, Clone)]
pub struct NativeReturn {
    /// The return value, or the result code / success flag.
    pub value: NativeValue,
    /// Out-parameters in declaration order.
    pub outs: Vec<NativeValue>,
}

impl NativeReturn {
    pub fn void() -> Self {
        Self::value(NativeValue::Void)
    }

    pub fn value(value: NativeValue) -> Self {
        Self {
            value,
            outs: Vec::new(),
        }
    }

    /// A kernel result code.
    pub fn code(code: u32) -> Self {
        Self::value(NativeValue::Int(i64::from(code)))
    }

    /// A success flag.
    pub fn flag(ok: bool) -> Self {
        Self::value(NativeValue::Bool(ok))
    }

    pub fn with_out(mut self, out: NativeValue) -> Self {
        self.outs.push(out);
        self
    }
}

pub trait NativeLibrary: Send + Sync {
    /// Run a method or static function. May run on a worker thread.
    fn call(&self, call: &NativeCall) -> Result<NativeReturn, NativeError>;

    /// Run the `overload`-th initializer of `class`.
    fn construct(&self, class: &str, overload: usize, args: &[NativeArg])
    -> Result<NativeValue, NativeError>;

    /// Read a public field. `lineage` is the class followed by its ancestors.
    fn get_field(
        &self,
        lineage: &[String],
        field: &str,
        _target: &NativeValue,
    ) -> Result<NativeValue, NativeError> {
        Err(NativeError(format!("{}.{field} is not readable", lineage.join("/"))))
    }

    /// Write a public field.
    fn set_field(
        &self,
        lineage: &[String],
        field: &str,
        _target: &mut NativeValue,
        _value: NativeValue,
    ) -> Result<(), NativeError> {
        Err(NativeError(format!("{}.{field} is not writable", lineage.join("/"))))
    }

    /// Heap copy of call-local storage of `class`. The copy carries its own reference.
    fn copy_object(&self, _class: &str, ptr: &NativePtr) -> NativePtr {
        ptr.retain();
        ptr.clone()
    }

    /// Invoke the named free function on `ptr`.
    fn free(&self, _function: &str, ptr: &NativePtr) {
        ptr.release();
    }
}

// ============================================================================
// Closure table
// ============================================================================

type CallFn = Arc<dyn Fn(&NativeCall) -> Result<NativeReturn, NativeError> + Send + Sync>;
type CtorFn = Arc<dyn Fn(usize, &[NativeArg]) -> Result<NativeValue, NativeError> + Send + Sync>;
type GetFn = Arc<dyn Fn(&NativeValue) -> Result<NativeValue, NativeError> + Send + Sync>;
type SetFn = Arc<dyn Fn(&mut NativeValue, NativeValue) -> Result<(), NativeError> + Send + Sync>;
type FreeFn = Arc<dyn Fn(&NativePtr) + Send + Sync>;

/// A [`NativeLibrary`] assembled from closures.
///
/// Methods and fields registered on a base class are found for derived
/// classes too.
#[derive(Default)]
pub struct NativeFunctions {
    functions: FxHashMap<(String, String), CallFn>,
    constructors: FxHashMap<String, CtorFn>,
    getters: FxHashMap<(String, String), GetFn>,
    setters: FxHashMap<(String, String), SetFn>,
    frees: FxHashMap<String, FreeFn>,
}

impl NativeFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function<F>(mut self, class: &str, function: &str, f: F) -> Self
    where
        F: Fn(&NativeCall) -> Result<NativeReturn, NativeError> + Send + Sync + 'static,
    {
        self.functions
            .insert((class.to_string(), function.to_string()), Arc::new(f));
        self
    }

    pub fn with_constructor<F>(mut self, class: &str, f: F) -> Self
    where
        F: Fn(usize, &[NativeArg]) -> Result<NativeValue, NativeError> + Send + Sync + 'static,
    {
        self.constructors.insert(class.to_string(), Arc::new(f));
        self
    }

    pub fn with_getter<F>(mut self, class: &str, field: &str, f: F) -> Self
    where
        F: Fn(&NativeValue) -> Result<NativeValue, NativeError> + Send + Sync + 'static,
    {
        self.getters
            .insert((class.to_string(), field.to_string()), Arc::new(f));
        self
    }

    pub fn with_setter<F>(mut self, class: &str, field: &str, f: F) -> Self
    where
        F: Fn(&mut NativeValue, NativeValue) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        self.setters
            .insert((class.to_string(), field.to_string()), Arc::new(f));
        self
    }

    pub fn with_free<F>(mut self, function: &str, f: F) -> Self
    where
        F: Fn(&NativePtr) + Send + Sync + 'static,
    {
        self.frees.insert(function.to_string(), Arc::new(f));
        self
    }

    fn lookup<'a, T>(
        table: &'a FxHashMap<(String, String), T>,
        lineage: &[String],
        name: &str,
    ) -> Option<&'a T> {
        lineage
            .iter()
            .find_map(|class| table.get(&(class.clone(), name.to_string())))
    }
}

impl NativeLibrary for NativeFunctions {
    fn call(&self, call: &NativeCall) -> Result<NativeReturn, NativeError> {
        let f = Self::lookup(&self.functions, &call.lineage, &call.function).ok_or_else(|| {
            NativeError(format!("no native function {}::{}", call.class(), call.function))
        })?;
        f(call)
    }

    fn construct(
        &self,
        class: &str,
        overload: usize,
        args: &[NativeArg],
    ) -> Result<NativeValue, NativeError> {
        let f = self
            .constructors
            .get(class)
            .ok_or_else(|| NativeError(format!("no native constructor for {class}")))?;
        f(overload, args)
    }

    fn get_field(
        &self,
        lineage: &[String],
        field: &str,
        target: &NativeValue,
    ) -> Result<NativeValue, NativeError> {
        let f = Self::lookup(&self.getters, lineage, field)
            .ok_or_else(|| NativeError(format!("no getter for {field}")))?;
        f(target)
    }

    fn set_field(
        &self,
        lineage: &[String],
        field: &str,
        target: &mut NativeValue,
        value: NativeValue,
    ) -> Result<(), NativeError> {
        let f = Self::lookup(&self.setters, lineage, field)
            .ok_or_else(|| NativeError(format!("no setter for {field}")))?;
        f(target, value)
    }

    fn free(&self, function: &str, ptr: &NativePtr) {
        match self.frees.get(function) {
            Some(f) => f(ptr),
            None => {
                ptr.release();
            }
        }
    }
}

impl fmt::Debug for NativeFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunctions")
            .field("functions", &self.functions.len())
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}
