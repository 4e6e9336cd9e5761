//! Executes compiled class plans.
//!
//! ## Call Path
//!
//! ```text
//! caller thread                    worker thread
//! ─────────────                    ─────────────
//! ConvertIn (select, convert)
//!   ├─ sync ──► NativeCall, Translate (inline)
//!   └─ async ─────────────────────► NativeCall, Translate
//!                                        │ completion channel
//! ConvertOut, Settle  ◄──────────────────┘ (run_pending / wait_idle)
//! ```
//!
//! Managed values never leave the caller thread. Workers see only the
//! prepared [`NativeCall`], which is `Send`.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use kernelbind_compiler::planner::{ArgPlan, OverloadPlan, ReturnShape};
use kernelbind_compiler::{ClassPlan, FunctionPlan, ResultPlan, Sentinel, Shape, Stage, Thread};
use kernelbind_core::{BindgenConfig, CallError, ReturnKind};
use rustc_hash::FxHashMap;

use crate::classes::ClassTable;
use crate::handle::NativePtr;
use crate::library::{NativeCall, NativeLibrary, NativeReturn};
use crate::marshal::{Diagnostic, ManagedOracle, Marshal};
use crate::native::{NativeArg, NativeValue};
use crate::pool::WorkerPool;
use crate::settle::{ManagedError, Promise, Settler};
use crate::value::ManagedValue;
use crate::wrapper::Wrapper;

/// Result of a synchronous call.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub value: ManagedValue,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of a worker call, sent back to the caller thread.
struct Completion {
    id: u64,
    outcome: Result<NativeReturn, CallError>,
}

/// An async call waiting for its completion.
struct PendingCall {
    class: String,
    function: String,
    overload: usize,
    settler: Settler,
}

/// A call after ConvertIn.
struct Prepared {
    call: NativeCall,
    result: ResultPlan,
    diagnostics: Vec<Diagnostic>,
}

pub struct Runtime {
    classes: ClassTable,
    library: Arc<dyn NativeLibrary>,
    config: BindgenConfig,
    pool: WorkerPool,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    pending: RefCell<FxHashMap<u64, PendingCall>>,
    next_id: Cell<u64>,
}

impl Runtime {
    pub fn new(
        plans: impl IntoIterator<Item = ClassPlan>,
        library: Arc<dyn NativeLibrary>,
        config: BindgenConfig,
    ) -> Result<Self, CallError> {
        let classes = ClassTable::new(plans);
        let pool = WorkerPool::new(config.worker_threads)
            .map_err(|e| CallError::Internal(format!("cannot start workers: {e}")))?;
        let (completion_tx, completion_rx) = unbounded();
        log::debug!("runtime ready: {} classes, {} workers", classes.len(), pool.size());
        Ok(Self {
            classes,
            library,
            config,
            pool,
            completion_tx,
            completion_rx,
            pending: RefCell::new(FxHashMap::default()),
            next_id: Cell::new(0),
        })
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn config(&self) -> &BindgenConfig {
        &self.config
    }

    fn marshal<'a>(&'a self, function: &'a str) -> Marshal<'a> {
        Marshal {
            classes: &self.classes,
            library: &self.library,
            function,
            warn_on_null_elements: self.config.warn_on_null_elements,
        }
    }

    fn class_plan(&self, class: &str) -> Result<&ClassPlan, CallError> {
        self.classes
            .get(class)
            .ok_or_else(|| CallError::Internal(format!("unknown class {class}")))
    }

    fn function_plan(&self, class: &str, function: &str) -> Result<&FunctionPlan, CallError> {
        self.class_plan(class)?
            .function(function)
            .ok_or_else(|| CallError::Internal(format!("{class} has no function {function}")))
    }

    /// Map an entry-point name (`Name`, `Name_callback`, `Name_async`) to its
    /// function and shape.
    pub fn resolve_entry(&self, class: &str, entry: &str) -> Option<(&str, Shape)> {
        self.classes.get(class)?.functions.iter().find_map(|f| {
            f.shapes
                .iter()
                .find(|s| s.entry_name == entry)
                .map(|s| (f.managed_name.as_str(), s.shape))
        })
    }

    // ==========================================================================
    // Construction and fields
    // ==========================================================================

    /// Run the constructor trampoline of `class`.
    pub fn construct(&self, class: &str, args: &[ManagedValue]) -> Result<ManagedValue, CallError> {
        let plan = self.class_plan(class)?;
        let ctor = plan.constructor.as_ref().ok_or_else(|| CallError::Native {
            function: class.to_string(),
            message: "no public constructor".to_string(),
        })?;

        let index = ctor.dispatch.select(&ManagedOracle { classes: &self.classes }, args)?;
        let overload = ctor
            .overloads
            .get(index)
            .ok_or_else(|| CallError::Internal(format!("{class}: no initializer {index}")))?;

        let marshal = self.marshal(class);
        let mut diagnostics = Vec::new();
        let native_args = convert_args(&marshal, &overload.sync_params, args, &mut diagnostics)?;
        apply_retains(overload, &native_args);

        log::trace!("construct {class}#{index}");
        let native = self
            .library
            .construct(class, index, &native_args)
            .map_err(|e| CallError::Native {
                function: class.to_string(),
                message: e.0,
            })?;

        match native {
            NativeValue::Object(ptr) => marshal.wrap(class, ptr),
            NativeValue::Pod(pod) => Ok(ManagedValue::object(Wrapper::value(class, pod))),
            other => Err(CallError::Internal(format!(
                "{class}: constructor returned {}",
                other.type_name()
            ))),
        }
    }

    pub fn get_field(&self, target: &ManagedValue, field: &str) -> Result<ManagedValue, CallError> {
        let wrapper = expect_wrapper(field, target)?;
        let plan = self.class_plan(wrapper.class())?;
        let accessor = plan.accessor(field).ok_or_else(|| CallError::Native {
            function: field.to_string(),
            message: format!("{} has no field {field}", plan.class),
        })?;

        let lineage = self.classes.lineage(wrapper.class());
        let native = self
            .library
            .get_field(&lineage, field, &wrapper.native())
            .map_err(|e| CallError::Native {
                function: field.to_string(),
                message: e.0,
            })?;
        self.marshal(field).to_managed(&accessor.conversion.to_managed, native)
    }

    pub fn set_field(
        &self,
        target: &ManagedValue,
        field: &str,
        value: &ManagedValue,
    ) -> Result<(), CallError> {
        let wrapper = expect_wrapper(field, target)?;
        let plan = self.class_plan(wrapper.class())?;
        let accessor = plan.accessor(field).ok_or_else(|| CallError::Native {
            function: field.to_string(),
            message: format!("{} has no field {field}", plan.class),
        })?;
        if accessor.read_only {
            return Err(CallError::Native {
                function: field.to_string(),
                message: format!("{}.{field} is read-only", plan.class),
            });
        }

        let arg = ArgPlan {
            name: field.to_string(),
            position: 0,
            native_slot: 0,
            default: None,
            nullable: false,
            out_param: false,
            conversion: accessor.conversion.clone(),
        };
        let native = match self.marshal(field).arg(&arg, Some(value), &mut Vec::new())? {
            NativeArg::Value(v) => v,
            NativeArg::Default(_) => NativeValue::Null,
        };

        let lineage = self.classes.lineage(wrapper.class());
        self.library
            .set_field(&lineage, field, &mut wrapper.native_mut(), native)
            .map_err(|e| CallError::Native {
                function: field.to_string(),
                message: e.0,
            })
    }

    // ==========================================================================
    // Identity
    // ==========================================================================

    /// Wrap a native object the host already owns one reference to.
    pub fn wrap(&self, class: &str, ptr: NativePtr) -> Result<ManagedValue, CallError> {
        self.marshal(class).wrap(class, ptr)
    }

    /// The native value behind `value`, if it may be used as `class`.
    pub fn unwrap(&self, value: &ManagedValue, class: &str) -> Result<NativeValue, CallError> {
        let plan = self.class_plan(class)?;
        value
            .as_object()
            .filter(|w| plan.unwrap.accepts(w.class()))
            .map(|w| w.native().clone())
            .ok_or_else(|| CallError::ArgumentTypeError {
                function: "unwrap".to_string(),
                position: 0,
                name: "value".to_string(),
                expected: class.to_string(),
                got: value.type_name(),
            })
    }

    /// `value` wraps `class` or a class derived from it.
    pub fn instance_of(&self, value: &ManagedValue, class: &str) -> bool {
        value
            .as_object()
            .is_some_and(|w| self.classes.is_a(w.class(), class))
    }

    /// Re-wrap a native object as the concrete class registered for
    /// `requested`. Matches on the kind tag or the family tag.
    pub fn cast(&self, value: &ManagedValue, requested: u32) -> Result<ManagedValue, CallError> {
        let ptr = value
            .as_object()
            .and_then(|w| w.ptr())
            .ok_or_else(|| CallError::ArgumentTypeError {
                function: "Cast".to_string(),
                position: 0,
                name: "this".to_string(),
                expected: "native object".to_string(),
                got: value.type_name(),
            })?;

        let mismatch = || CallError::CastMismatch {
            actual: ptr.kind_tag(),
            family: ptr.family_tag(),
            requested,
        };
        if ptr.kind_tag() != requested && ptr.family_tag() != requested {
            return Err(mismatch());
        }
        let target = self.classes.cast_target(requested).ok_or_else(mismatch)?;

        ptr.retain();
        log::trace!("cast native {} to {target}", ptr.identity());
        self.marshal("Cast").wrap(target, ptr)
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// ConvertIn: select the overload and convert arguments on the caller thread.
    fn prepare(
        &self,
        class: &str,
        function: &FunctionPlan,
        shape: Shape,
        this: Option<&ManagedValue>,
        args: &[ManagedValue],
    ) -> Result<Prepared, CallError> {
        if function.shape(shape).is_none() {
            return Err(CallError::Internal(format!(
                "{} has no {shape} entry point",
                function.managed_name
            )));
        }

        let (lineage, this) = if function.is_static {
            (self.classes.lineage(class), None)
        } else {
            let wrapper = this
                .and_then(ManagedValue::as_object)
                .filter(|w| self.classes.is_a(w.class(), class))
                .ok_or_else(|| CallError::ArgumentTypeError {
                    function: function.managed_name.clone(),
                    position: 0,
                    name: "this".to_string(),
                    expected: class.to_string(),
                    got: this.map_or_else(|| "undefined".to_string(), ManagedValue::type_name),
                })?;
            let receiver = wrapper.native().clone();
            (self.classes.lineage(wrapper.class()), Some(receiver))
        };

        let index = function
            .dispatch
            .select(&ManagedOracle { classes: &self.classes }, args)?;
        let overload = function.overload(index).ok_or_else(|| {
            CallError::Internal(format!("{}: no overload {index}", function.managed_name))
        })?;

        let marshal = self.marshal(&function.managed_name);
        let mut diagnostics = Vec::new();
        let native_args = convert_args(&marshal, overload.params(shape), args, &mut diagnostics)?;
        apply_retains(overload, &native_args);

        log::trace!("{shape} call {class}.{}#{index}", function.managed_name);
        Ok(Prepared {
            call: NativeCall {
                lineage,
                function: function.name.clone(),
                overload: index,
                this,
                args: native_args,
            },
            result: overload.result,
            diagnostics,
        })
    }

    /// ConvertOut: build the managed return from the native return.
    fn convert_out(
        &self,
        function: &FunctionPlan,
        overload: &OverloadPlan,
        ret: NativeReturn,
    ) -> Result<ManagedValue, CallError> {
        let marshal = self.marshal(&function.managed_name);
        let mut primary = match overload.result.kind {
            ReturnKind::Value => Some(ret.value),
            _ => None,
        };
        let mut outs = ret.outs.into_iter();

        let mut values = Vec::with_capacity(overload.returns.len());
        for plan in &overload.returns {
            let native = if plan.out_param {
                outs.next()
            } else {
                primary.take()
            }
            .ok_or_else(|| {
                CallError::Internal(format!(
                    "{}: native call did not produce '{}'",
                    function.managed_name, plan.name
                ))
            })?;
            values.push(marshal.to_managed(&plan.conversion.to_managed, native)?);
        }

        Ok(match &overload.return_shape {
            ReturnShape::Undefined => ManagedValue::Undefined,
            ReturnShape::Single => values.pop().unwrap_or_default(),
            ReturnShape::Record(names) => {
                ManagedValue::record(names.iter().cloned().zip(values).collect())
            }
        })
    }

    /// The `Name` entry point.
    pub fn call(
        &self,
        class: &str,
        function: &str,
        this: Option<&ManagedValue>,
        args: &[ManagedValue],
    ) -> Result<CallOutcome, CallError> {
        let plan = self.function_plan(class, function)?;
        let prepared = self.prepare(class, plan, Shape::Sync, this, args)?;
        let ret = run_native(self.library.as_ref(), &prepared.call, prepared.result)?;
        let overload = plan.overload(prepared.call.overload).ok_or_else(|| {
            CallError::Internal(format!("{function}: no overload {}", prepared.call.overload))
        })?;
        let value = self.convert_out(plan, overload, ret)?;
        Ok(CallOutcome {
            value,
            diagnostics: prepared.diagnostics,
        })
    }

    /// The `Name_async` entry point.
    pub fn call_async(
        &self,
        class: &str,
        function: &str,
        this: Option<&ManagedValue>,
        args: &[ManagedValue],
    ) -> Promise {
        let promise = Promise::new();
        self.dispatch(
            class,
            function,
            Shape::Promise,
            this,
            args,
            Settler::Promise(promise.clone()),
        );
        promise
    }

    /// The `Name_callback` entry point. `callback` receives `(error, result)`.
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
        self.dispatch(
            class,
            function,
            Shape::Callback,
            this,
            args,
            Settler::Callback(Box::new(callback)),
        );
    }

    fn dispatch(
        &self,
        class: &str,
        function: &str,
        shape: Shape,
        this: Option<&ManagedValue>,
        args: &[ManagedValue],
        settler: Settler,
    ) {
        let prepared = self
            .function_plan(class, function)
            .and_then(|plan| Ok((plan, self.prepare(class, plan, shape, this, args)?)));
        let (plan, prepared) = match prepared {
            Ok(ok) => ok,
            // Pre-call failures settle right away; nothing reaches a worker.
            Err(err) => return settler.settle(Err(err.into())),
        };

        if let Settler::Promise(promise) = &settler {
            promise.add_diagnostics(prepared.diagnostics.clone());
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.pending.borrow_mut().insert(
            id,
            PendingCall {
                class: class.to_string(),
                function: function.to_string(),
                overload: prepared.call.overload,
                settler,
            },
        );

        let on_worker = plan
            .shape(shape)
            .and_then(|s| s.thread_of(Stage::NativeCall))
            == Some(Thread::Worker);
        if !on_worker {
            let outcome = run_native(self.library.as_ref(), &prepared.call, prepared.result);
            self.complete(Completion { id, outcome });
            return;
        }

        let library = Arc::clone(&self.library);
        let sender = self.completion_tx.clone();
        let Prepared { call, result, .. } = prepared;
        let queued = self.pool.execute(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                run_native(library.as_ref(), &call, result)
            }))
            .unwrap_or_else(|_| {
                Err(CallError::Internal(format!("{}: native call panicked", call.function)))
            });
            // The runtime may be gone; the completion is then moot.
            let _ = sender.send(Completion { id, outcome });
        });
        if !queued {
            self.complete(Completion {
                id,
                outcome: Err(CallError::Internal("worker pool is shut down".to_string())),
            });
        }
    }

    /// ConvertOut and Settle for one finished call.
    fn complete(&self, completion: Completion) {
        let Some(pending) = self.pending.borrow_mut().remove(&completion.id) else {
            log::warn!("completion for unknown call {}", completion.id);
            return;
        };

        let outcome = completion.outcome.and_then(|ret| {
            let plan = self.function_plan(&pending.class, &pending.function)?;
            let overload = plan.overload(pending.overload).ok_or_else(|| {
                CallError::Internal(format!("{}: no overload {}", pending.function, pending.overload))
            })?;
            self.convert_out(plan, overload, ret)
        });
        if let Err(err) = &outcome {
            log::debug!("{}.{} failed: {err}", pending.class, pending.function);
        }
        pending.settler.settle(outcome.map_err(ManagedError::from));
    }

    /// Settle every call whose native part has finished. Returns how many.
    pub fn run_pending(&self) -> usize {
        let finished: Vec<Completion> = self.completion_rx.try_iter().collect();
        let count = finished.len();
        for completion in finished {
            self.complete(completion);
        }
        count
    }

    /// Block until every queued call has settled. Returns how many settled.
    pub fn wait_idle(&self) -> usize {
        let mut count = 0;
        while self.pending_count() > 0 {
            match self.completion_rx.recv() {
                Ok(completion) => {
                    self.complete(completion);
                    count += 1;
                }
                Err(_) => break,
            }
        }
        count
    }

    /// Calls queued but not yet settled.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn convert_args(
    marshal: &Marshal<'_>,
    params: &[ArgPlan],
    args: &[ManagedValue],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<NativeArg>, CallError> {
    params
        .iter()
        .map(|p| marshal.arg(p, args.get(p.position), diagnostics))
        .collect()
}

/// Owning-pointer arguments hand the callee one reference each.
fn apply_retains(overload: &OverloadPlan, args: &[NativeArg]) {
    for &position in &overload.retains {
        if let Some(ptr) = args
            .get(position)
            .and_then(NativeArg::value)
            .and_then(NativeValue::as_ptr)
        {
            ptr.retain();
        }
    }
}

/// NativeCall and Translate. Runs on whichever thread the shape assigns.
fn run_native(
    library: &dyn NativeLibrary,
    call: &NativeCall,
    result: ResultPlan,
) -> Result<NativeReturn, CallError> {
    let ret = library.call(call).map_err(|e| CallError::Native {
        function: call.function.clone(),
        message: e.0,
    })?;
    let sentinel = match (result.kind, &ret.value) {
        (ReturnKind::ErrorCode, NativeValue::Int(code)) => {
            Sentinel::Code(u32::try_from(*code).unwrap_or(u32::MAX))
        }
        (ReturnKind::ErrorCode, NativeValue::Enum(code)) => Sentinel::Code(*code),
        (ReturnKind::ErrorBool, NativeValue::Bool(ok)) => Sentinel::Flag(*ok),
        _ => Sentinel::None,
    };
    result.translate(&call.function, sentinel)?;
    Ok(ret)
}

fn expect_wrapper<'v>(
    field: &str,
    target: &'v ManagedValue,
) -> Result<&'v std::rc::Rc<Wrapper>, CallError> {
    target.as_object().ok_or_else(|| CallError::ArgumentTypeError {
        function: field.to_string(),
        position: 0,
        name: "this".to_string(),
        expected: "object".to_string(),
        got: target.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, CURVE, SOLID, SPACE_FAMILY, solid};
    use crate::settle::PromiseState;
    use kernelbind_core::{ExecutionShapes, ResultCode};
    use std::rc::Rc;

    fn runtime() -> (Runtime, Arc<fixtures::Counting>) {
        fixtures::runtime(BindgenConfig::default().with_worker_threads(2))
    }

    fn volume(rt: &Runtime, value: &ManagedValue) -> f64 {
        rt.call("Solid", "GetVolume", Some(value), &[])
            .unwrap()
            .value
            .as_number()
            .unwrap()
    }

    fn points(rt: &Runtime, n: usize) -> ManagedValue {
        ManagedValue::array(
            (0..n)
                .map(|i| {
                    rt.construct("CartPoint3D", &[(i as f64).into(), 0.0.into(), 0.0.into()])
                        .unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn multiple_returns_become_a_record() {
        let (rt, _) = runtime();
        let s = rt.wrap("Solid", solid(10.0)).unwrap();
        let out = rt
            .call("ActionSolid", "SplitSolid", None, &[s, 0.25.into()])
            .unwrap();
        let left = out.value.get("left").unwrap();
        let right = out.value.get("right").unwrap();
        assert_eq!(volume(&rt, left), 2.5);
        assert_eq!(volume(&rt, right), 7.5);
    }

    #[test]
    fn result_codes_map_to_messages() {
        let (rt, _) = runtime();
        let err = rt
            .call("ActionSolid", "ElementarySolid", None, &[points(&rt, 2)])
            .unwrap_err();
        assert!(err.is_kernel_error());
        assert_eq!(err.code(), Some(ResultCode::TooFewAxes.code()));
        assert!(err.to_string().contains("There should be exactly one axis."));

        let s = rt.wrap("Solid", solid(1.0)).unwrap();
        let err = rt
            .call("ActionSolid", "SplitSolid", None, &[s, 2.0.into()])
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::NativeOperationFailure { code: Some(9999), ref message, .. }
                if message == kernelbind_core::result_code::GENERIC_FAILURE
        ));
    }

    #[test]
    fn false_flag_is_a_generic_failure() {
        let (rt, _) = runtime();
        let empty = rt.wrap("Solid", solid(0.0)).unwrap();
        let err = rt.call("ActionSolid", "CheckSolid", None, &[empty]).unwrap_err();
        assert!(err.is_kernel_error());
        assert_eq!(err.code(), None);

        let full = rt.wrap("Solid", solid(1.0)).unwrap();
        let ok = rt.call("ActionSolid", "CheckSolid", None, &[full]).unwrap();
        assert!(matches!(ok.value, ManagedValue::Undefined));
    }

    #[test]
    fn null_for_required_object_never_reaches_native() {
        let (rt, lib) = runtime();
        let err = rt
            .call("ActionSolid", "CheckSolid", None, &[ManagedValue::Null])
            .unwrap_err();
        assert!(err.is_pre_call());
        assert_eq!(lib.calls(), 0);

        let out = rt
            .call("ActionSolid", "Volume", None, &[ManagedValue::Null])
            .unwrap();
        assert_eq!(out.value.as_number(), Some(0.0));
        assert_eq!(lib.calls(), 1);
    }

    #[test]
    fn nullable_primitives_reach_native_as_null() {
        let (rt, lib) = runtime();
        for missing in [ManagedValue::Null, ManagedValue::Undefined] {
            let out = rt.call("ActionSolid", "Scale", None, &[missing]).unwrap();
            // The nullable number overload is listed first and takes the null.
            assert_eq!(out.value.as_number(), Some(-1.0));
        }
        assert_eq!(lib.calls(), 2);

        let out = rt.call("ActionSolid", "Scale", None, &[2.0.into()]).unwrap();
        assert_eq!(out.value.as_number(), Some(2.0));
        let s = rt.wrap("Solid", solid(1.0)).unwrap();
        let out = rt.call("ActionSolid", "Scale", None, &[s]).unwrap();
        assert_eq!(out.value.as_number(), Some(100.0));
    }

    #[test]
    fn null_iterator_walks_nothing() {
        let (rt, _) = runtime();
        let out = rt
            .call("ActionSolid", "Count", None, &[ManagedValue::Null])
            .unwrap();
        assert_eq!(out.value.as_number(), Some(0.0));

        let a = rt.wrap("Solid", solid(1.0)).unwrap();
        let b = rt.wrap("Solid", solid(2.0)).unwrap();
        let out = rt
            .call("ActionSolid", "Count", None, &[ManagedValue::array(vec![a, b])])
            .unwrap();
        assert_eq!(out.value.as_number(), Some(2.0));
    }

    #[test]
    fn by_value_objects_hand_the_callee_a_copy() {
        let (rt, _) = runtime();
        let (p, q) = (solid(5.0), solid(6.0));
        let s = rt.wrap("Solid", p.clone()).unwrap();
        let t = rt.wrap("Solid", q.clone()).unwrap();

        let out = rt.call("ActionSolid", "Weigh", None, &[s.clone()]).unwrap();
        assert_eq!(out.value.as_number(), Some(2.0));
        assert_eq!(p.use_count(), 1);

        let solids = ManagedValue::array(vec![s, t]);
        let out = rt.call("ActionSolid", "Stock", None, &[solids]).unwrap();
        assert_eq!(out.value.as_number(), Some(4.0));
        assert_eq!((p.use_count(), q.use_count()), (1, 1));
    }

    #[test]
    fn arrays_skip_nulls_and_reject_strangers() {
        let (rt, lib) = runtime();
        let a = rt.wrap("Solid", solid(1.0)).unwrap();
        let b = rt.wrap("Solid", solid(2.0)).unwrap();
        let solids = ManagedValue::array(vec![a.clone(), ManagedValue::Null, b]);
        let out = rt.call("ActionSolid", "Total", None, &[solids]).unwrap();
        assert_eq!(out.value.as_number(), Some(3.0));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].index, Some(1));

        let calls = lib.calls();
        let bad = ManagedValue::array(vec![a, "x".into()]);
        let err = rt.call("ActionSolid", "Total", None, &[bad]).unwrap_err();
        assert!(matches!(err, CallError::ArrayElementTypeError { index: 1, .. }));
        assert_eq!(lib.calls(), calls);
    }

    #[test]
    fn overloads_dispatch_on_runtime_types() {
        let (rt, _) = runtime();
        let out = rt
            .call("ActionSolid", "Measure", None, &[2.0.into(), 3.0.into()])
            .unwrap();
        assert_eq!(out.value.as_number(), Some(6.0));

        let s = rt.wrap("Solid", solid(4.0)).unwrap();
        let out = rt.call("ActionSolid", "Measure", None, &[s]).unwrap();
        assert_eq!(out.value.as_number(), Some(4.0));

        let err = rt.call("ActionSolid", "Measure", None, &[]).unwrap_err();
        assert!(matches!(err, CallError::ArityMismatch { got: 0, .. }));

        let err = rt.call("ActionSolid", "Measure", None, &["x".into()]).unwrap_err();
        assert!(matches!(err, CallError::ArgumentTypeError { position: 0, .. }));
    }

    #[test]
    fn methods_are_inherited_and_receivers_checked() {
        let (rt, _) = runtime();
        let s = rt.wrap("Solid", solid(1.0)).unwrap();
        let kind = rt.call("Solid", "IsA", Some(&s), &[]).unwrap();
        assert_eq!(kind.value.as_number(), Some(f64::from(SOLID)));
        assert!(rt.instance_of(&s, "SpaceItem"));
        assert!(rt.instance_of(&s, "RefItem"));
        assert!(!rt.instance_of(&s, "Assembly"));

        let asm = rt.construct("Assembly", &[]).unwrap();
        let err = rt.call("Solid", "GetVolume", Some(&asm), &[]).unwrap_err();
        assert!(matches!(
            err,
            CallError::ArgumentTypeError { position: 0, ref name, .. } if name == "this"
        ));
    }

    #[test]
    fn owning_arguments_retain_once() {
        let (rt, _) = runtime();
        let ptr = solid(1.0);
        let s = rt.wrap("Solid", ptr.clone()).unwrap();
        let asm = rt.construct("Assembly", &[]).unwrap();
        rt.call("Assembly", "AddItem", Some(&asm), &[s.clone()]).unwrap();
        assert_eq!(ptr.use_count(), 2);
        let count = rt.call("Assembly", "ItemsCount", Some(&asm), &[]).unwrap();
        assert_eq!(count.value.as_number(), Some(1.0));
        drop(s);
        assert_eq!(ptr.use_count(), 1);
    }

    #[test]
    fn cast_retains_and_rewraps() {
        let (rt, _) = runtime();
        let ptr = solid(5.0);
        let item = rt.wrap("SpaceItem", ptr.clone()).unwrap();
        assert!(!rt.instance_of(&item, "Solid"));

        let cast = rt.cast(&item, SOLID).unwrap();
        assert_eq!(cast.type_name(), "Solid");
        assert_eq!(ptr.use_count(), 2);
        assert_eq!(volume(&rt, &cast), 5.0);

        let family = rt.cast(&item, SPACE_FAMILY).unwrap();
        assert_eq!(family.type_name(), "SpaceItem");
        assert_eq!(ptr.use_count(), 3);

        let err = rt.cast(&item, CURVE).unwrap_err();
        assert_eq!(
            err,
            CallError::CastMismatch {
                actual: SOLID,
                family: SPACE_FAMILY,
                requested: CURVE
            }
        );
        assert_eq!(ptr.use_count(), 3);

        drop((item, cast, family));
        assert_eq!(ptr.use_count(), 0);
    }

    #[test]
    fn value_types_copy_and_expose_fields() {
        let (rt, _) = runtime();
        let v = rt
            .construct("Vector3D", &[1.0.into(), 2.0.into(), 3.0.into()])
            .unwrap();
        let copy = rt.construct("Vector3D", &[v.clone()]).unwrap();
        rt.set_field(&copy, "x", &10.0.into()).unwrap();
        assert_eq!(rt.get_field(&copy, "x").unwrap().as_number(), Some(10.0));
        assert_eq!(rt.get_field(&v, "x").unwrap().as_number(), Some(1.0));

        let p = rt
            .construct("CartPoint3D", &[0.0.into(), 0.0.into(), 0.0.into()])
            .unwrap();
        assert_eq!(rt.get_field(&p, "dimension").unwrap().as_number(), Some(3.0));
        assert!(matches!(
            rt.set_field(&p, "dimension", &2.0.into()),
            Err(CallError::Native { .. })
        ));
        assert!(rt.set_field(&p, "x", &"no".into()).is_err());
        assert!(rt.construct("ActionSolid", &[]).is_err());
    }

    #[test]
    fn promise_settles_after_wait_idle() {
        let (rt, _) = runtime();
        let promise = rt.call_async("ActionSolid", "ElementarySolid", None, &[points(&rt, 4)]);
        assert_eq!(rt.pending_count(), 1);
        assert_eq!(rt.wait_idle(), 1);
        assert_eq!(rt.pending_count(), 0);
        let solid = promise.value().unwrap();
        assert_eq!(volume(&rt, &solid), 4.0);

        let failing = rt.call_async("ActionSolid", "ElementarySolid", None, &[points(&rt, 1)]);
        rt.wait_idle();
        let err = failing.error().unwrap();
        assert!(err.is_kernel_error);
        assert_eq!(err.code, Some(ResultCode::TooFewAxes.code()));
    }

    #[test]
    fn pre_call_errors_reject_without_queueing() {
        let (rt, lib) = runtime();
        let promise = rt.call_async("ActionSolid", "CheckSolid", None, &[ManagedValue::Null]);
        assert_eq!(rt.pending_count(), 0);
        match promise.state() {
            PromiseState::Rejected(err) => assert!(!err.is_kernel_error),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(lib.calls(), 0);
    }

    #[test]
    fn callbacks_get_error_then_result() {
        let (rt, _) = runtime();
        let seen: Rc<RefCell<Vec<(bool, Option<f64>)>>> = Rc::default();
        for args in [vec![2.0.into(), 4.0.into()], vec![true.into()]] {
            let seen = Rc::clone(&seen);
            rt.call_with_callback("ActionSolid", "Measure", None, &args, move |err, value| {
                seen.borrow_mut().push((err.is_some(), value.as_number()));
            });
        }
        rt.wait_idle();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&(false, Some(8.0))));
        assert!(seen.contains(&(true, None)));
    }

    #[test]
    fn worker_panics_still_settle() {
        let (rt, _) = runtime();
        let promise = rt.call_async("ActionSolid", "Explode", None, &[]);
        rt.wait_idle();
        assert!(matches!(
            promise.error().map(|e| e.source),
            Some(CallError::Internal(_))
        ));

        let next = rt.call_async("ActionSolid", "Measure", None, &[1.0.into(), 1.0.into()]);
        rt.wait_idle();
        assert_eq!(next.value().and_then(|v| v.as_number()), Some(1.0));
    }

    #[test]
    fn run_pending_settles_finished_calls() {
        let (rt, _) = runtime();
        let promise = rt.call_async("ActionSolid", "Measure", None, &[3.0.into(), 3.0.into()]);
        let mut settled = 0;
        while settled == 0 {
            settled += rt.run_pending();
            std::thread::yield_now();
        }
        assert!(!promise.is_pending());
    }

    #[test]
    fn disabled_shapes_are_rejected() {
        let config = BindgenConfig::default()
            .with_worker_threads(1)
            .with_shapes(ExecutionShapes::SYNC);
        let (rt, _) = fixtures::runtime(config);
        let promise = rt.call_async("ActionSolid", "Measure", None, &[1.0.into(), 1.0.into()]);
        assert!(matches!(
            promise.error().map(|e| e.source),
            Some(CallError::Internal(_))
        ));
        assert!(rt.resolve_entry("ActionSolid", "Measure_async").is_none());
    }

    #[test]
    fn entry_names_resolve_to_shapes() {
        let (rt, _) = runtime();
        assert_eq!(
            rt.resolve_entry("ActionSolid", "Measure_callback"),
            Some(("Measure", Shape::Callback))
        );
        assert_eq!(rt.resolve_entry("Solid", "IsA"), Some(("IsA", Shape::Sync)));
        assert_eq!(rt.resolve_entry("Solid", "Nope"), None);
    }

    #[test]
    fn unwrap_accepts_derived_wrappers() {
        let (rt, _) = runtime();
        let s = rt.wrap("Solid", solid(1.0)).unwrap();
        assert!(rt.unwrap(&s, "SpaceItem").is_ok());
        assert!(rt.unwrap(&s, "Assembly").is_err());
        assert!(rt.unwrap(&ManagedValue::Null, "Solid").is_err());
    }
}
