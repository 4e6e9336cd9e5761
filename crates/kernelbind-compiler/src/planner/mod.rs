//! Dual Execution Planner.
//!
//! Every generated function is exposed in up to three execution shapes:
//!
//! | shape | entry point | native call | settles by |
//! |-------|-------------|-------------|------------|
//! | [`Shape::Sync`] | `Name` | inline | returning or raising |
//! | [`Shape::Callback`] | `Name_callback` | worker | `callback(error, result)` |
//! | [`Shape::Promise`] | `Name_async` | worker | resolve / reject |
//!
//! ## Stages
//!
//! Each shape is the same five [`Stage`]s, only the thread differs:
//!
//! 1. `ConvertIn`: managed arguments to native storage (calling thread)
//! 2. `NativeCall`: touches native data only
//! 3. `Translate`: sentinel to success/failure, native data only
//! 4. `ConvertOut`: native results to managed values (calling thread)
//! 5. `Settle`: return, callback or promise (calling thread)
//!
//! Plans that would touch managed values on a worker, or hand stack storage
//! to a worker, are rejected by [`validate_shape`].

mod validate;

pub use validate::validate_shape;

use std::fmt;

use kernelbind_core::{
    ArgSpec, BindgenConfig, ExecutionShapes, FunctionSpec, OverloadSpec, PlanError, TypeHash,
};
use kernelbind_registry::ClassRegistry;

use crate::conversion::{Consumer, ConversionPlan, TypeResolver};
use crate::overload::{Dispatch, build_dispatch};
use crate::result::ResultPlan;

// ============================================================================
// Shapes and Stages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Sync,
    Callback,
    Promise,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Sync, Shape::Callback, Shape::Promise];

    pub fn consumer(self) -> Consumer {
        match self {
            Shape::Sync => Consumer::Sync,
            Shape::Callback | Shape::Promise => Consumer::Async,
        }
    }

    pub fn flag(self) -> ExecutionShapes {
        match self {
            Shape::Sync => ExecutionShapes::SYNC,
            Shape::Callback => ExecutionShapes::CALLBACK,
            Shape::Promise => ExecutionShapes::PROMISE,
        }
    }

    pub fn is_async(self) -> bool {
        self.consumer() == Consumer::Async
    }

    /// Managed entry-point name for `managed_name`.
    pub fn entry_name(self, managed_name: &str, config: &BindgenConfig) -> String {
        match self {
            Shape::Sync => managed_name.to_string(),
            Shape::Callback => format!("{managed_name}{}", config.callback_suffix),
            Shape::Promise => format!("{managed_name}{}", config.promise_suffix),
        }
    }

    /// Thread each stage runs on in this shape.
    pub fn stages(self) -> Vec<StagePlan> {
        Stage::ORDER
            .iter()
            .map(|&stage| StagePlan {
                stage,
                thread: if self.is_async() && !stage.touches_managed() {
                    Thread::Worker
                } else {
                    Thread::Caller
                },
            })
            .collect()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Sync => "sync",
            Shape::Callback => "callback",
            Shape::Promise => "promise",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    ConvertIn,
    NativeCall,
    Translate,
    ConvertOut,
    Settle,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::ConvertIn,
        Stage::NativeCall,
        Stage::Translate,
        Stage::ConvertOut,
        Stage::Settle,
    ];

    /// Reads or creates managed values.
    pub fn touches_managed(self) -> bool {
        matches!(self, Stage::ConvertIn | Stage::ConvertOut | Stage::Settle)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Thread {
    /// The single managed thread.
    Caller,
    Worker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    pub stage: Stage,
    pub thread: Thread,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapePlan {
    pub shape: Shape,
    pub entry_name: String,
    pub consumer: Consumer,
    pub stages: Vec<StagePlan>,
}

impl ShapePlan {
    pub fn thread_of(&self, stage: Stage) -> Option<Thread> {
        self.stages.iter().find(|s| s.stage == stage).map(|s| s.thread)
    }
}

// ============================================================================
// Function Plans
// ============================================================================

/// One argument or return with its conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgPlan {
    pub name: String,
    pub position: usize,
    pub native_slot: usize,
    /// Native default expression used when the argument is omitted.
    pub default: Option<String>,
    /// Null/undefined passes the guard and reaches native code.
    pub nullable: bool,
    /// A return written through a native out-parameter.
    pub out_param: bool,
    pub conversion: ConversionPlan,
}

/// How the managed return value is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    Undefined,
    Single,
    /// Keyed by each return's declared name, in position order.
    Record(Vec<String>),
}

impl ReturnShape {
    fn for_returns(returns: &[ArgPlan]) -> Self {
        match returns {
            [] => ReturnShape::Undefined,
            [_] => ReturnShape::Single,
            many => ReturnShape::Record(many.iter().map(|r| r.name.clone()).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverloadPlan {
    pub index: usize,
    pub hash: TypeHash,
    /// Parameters converted for synchronous consumption.
    pub sync_params: Vec<ArgPlan>,
    /// Parameters converted for a worker.
    pub async_params: Vec<ArgPlan>,
    /// In position order.
    pub returns: Vec<ArgPlan>,
    pub result: ResultPlan,
    pub return_shape: ReturnShape,
    /// Positions of arguments whose native handle is retained before the call.
    pub retains: Vec<usize>,
}

impl OverloadPlan {
    pub fn params(&self, shape: Shape) -> &[ArgPlan] {
        if shape.is_async() {
            &self.async_params
        } else {
            &self.sync_params
        }
    }

    /// Native argument count, out-parameters included.
    pub fn native_arity(&self) -> usize {
        self.sync_params.len() + self.returns.iter().filter(|r| r.out_param).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPlan {
    /// Native name.
    pub name: String,
    pub managed_name: String,
    pub is_static: bool,
    pub hash: TypeHash,
    pub dispatch: Dispatch,
    pub overloads: Vec<OverloadPlan>,
    pub shapes: Vec<ShapePlan>,
}

impl FunctionPlan {
    pub fn shape(&self, shape: Shape) -> Option<&ShapePlan> {
        self.shapes.iter().find(|s| s.shape == shape)
    }

    pub fn overload(&self, index: usize) -> Option<&OverloadPlan> {
        self.overloads.get(index)
    }
}

// ============================================================================
// Planner
// ============================================================================

pub struct ExecutionPlanner<'r> {
    resolver: TypeResolver<'r>,
    config: &'r BindgenConfig,
}

impl<'r> ExecutionPlanner<'r> {
    pub fn new(registry: &'r ClassRegistry, config: &'r BindgenConfig) -> Self {
        Self {
            resolver: TypeResolver::new(registry),
            config,
        }
    }

    pub fn resolver(&self) -> &TypeResolver<'r> {
        &self.resolver
    }

    /// Plan every enabled shape of a non-manual function owned by `owner`.
    pub fn plan_function(
        &self,
        owner: TypeHash,
        function: &FunctionSpec,
    ) -> Result<FunctionPlan, PlanError> {
        let hash = TypeHash::from_method(owner, &function.name);
        let dispatch = build_dispatch(&function.managed_name, &function.overloads)?;

        let overloads = function
            .overloads
            .iter()
            .enumerate()
            .map(|(index, overload)| {
                self.plan_overload(&function.name, TypeHash::from_overload(hash, index), index, overload)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut shapes = Vec::new();
        for shape in Shape::ALL {
            if !self.config.shapes.contains(shape.flag()) {
                continue;
            }
            let plan = ShapePlan {
                shape,
                entry_name: shape.entry_name(&function.managed_name, self.config),
                consumer: shape.consumer(),
                stages: shape.stages(),
            };
            for overload in &overloads {
                validate_shape(&function.name, &plan, overload.params(shape))?;
            }
            shapes.push(plan);
        }

        log::debug!(
            "planned {} ({} overloads, {} shapes)",
            function.managed_name,
            overloads.len(),
            shapes.len()
        );
        Ok(FunctionPlan {
            name: function.name.clone(),
            managed_name: function.managed_name.clone(),
            is_static: function.is_static,
            hash,
            dispatch,
            overloads,
            shapes,
        })
    }

    /// Plan one overload: both parameter sets, returns and the translator.
    pub fn plan_overload(
        &self,
        function: &str,
        hash: TypeHash,
        index: usize,
        overload: &OverloadSpec,
    ) -> Result<OverloadPlan, PlanError> {
        let mut params: Vec<&ArgSpec> = overload.params.iter().collect();
        params.sort_by_key(|p| p.position);
        let mut returns: Vec<&ArgSpec> = overload.returns.iter().collect();
        returns.sort_by_key(|r| r.position);

        let sync_params = self.plan_args(&params, Consumer::Sync, false)?;
        let async_params = self.plan_args(&params, Consumer::Async, false)?;
        let returns = self.plan_args(&returns, Consumer::Sync, true)?;

        log::trace!("{function}#{index}: {} params, {} returns", sync_params.len(), returns.len());
        Ok(OverloadPlan {
            index,
            hash,
            return_shape: ReturnShape::for_returns(&returns),
            sync_params,
            async_params,
            returns,
            result: ResultPlan::new(overload.return_kind, self.config.success_code),
            retains: params
                .iter()
                .filter(|p| p.is_owning_pointer)
                .map(|p| p.position)
                .collect(),
        })
    }

    fn plan_args(
        &self,
        args: &[&ArgSpec],
        consumer: Consumer,
        returns: bool,
    ) -> Result<Vec<ArgPlan>, PlanError> {
        args.iter()
            .map(|arg| {
                Ok(ArgPlan {
                    name: arg.name.clone(),
                    position: arg.position,
                    native_slot: arg.native_index(),
                    default: arg.default.clone(),
                    nullable: arg.accepts_nullish(),
                    out_param: returns && arg.native_slot.is_some(),
                    conversion: self.resolver.resolve(arg, consumer)?,
                })
            })
            .collect()
    }
}
