//! kernelbind compiler
//!
//! Turns a validated [`ClassRegistry`](kernelbind_registry::ClassRegistry)
//! into per-class decision sets ([`ClassPlan`]) that a template renderer
//! or the reference runtime consume.
//!
//! ## Modules
//!
//! - [`conversion`]: Type Resolver, how each value crosses the binding
//! - [`overload`]: Overload Resolver, first-match runtime dispatch
//! - [`ownership`]: wrapper storage, refcounting and destructor decisions
//! - [`planner`]: Dual Execution Planner, sync/callback/promise shapes
//! - [`result`]: Result/Error Translator for sentinel returns
//! - [`class_plan`]: the per-class output
//!
//! # Example
//!
//! ```
//! use kernelbind_compiler::{Compiler, planner::Shape};
//! use kernelbind_core::{
//!     ArgSpec, BindgenConfig, ClassSpec, FunctionSpec, ManagedType, NumericKind, OverloadSpec,
//! };
//! use kernelbind_registry::ClassRegistry;
//!
//! let mut registry = ClassRegistry::new();
//! let radius = ArgSpec::new("r", "double", ManagedType::Number(NumericKind::Double), 0);
//! registry
//!     .register(
//!         ClassSpec::new("Sphere", "sphere.h")
//!             .with_function(FunctionSpec::new("SetRadius", OverloadSpec::new(vec![radius]))),
//!     )
//!     .unwrap();
//!
//! let config = BindgenConfig::default();
//! let plan = Compiler::new(&registry, &config).compile_class("Sphere").unwrap();
//! let set_radius = plan.function("SetRadius").unwrap();
//! assert_eq!(set_radius.shape(Shape::Promise).unwrap().entry_name, "SetRadius_async");
//! ```

pub mod class_plan;
mod compiler;
pub mod conversion;
pub mod overload;
pub mod ownership;
pub mod planner;
pub mod result;

pub use class_plan::{AccessorPlan, ClassPlan, ConstructorPlan, RegistrationPlan, UnwrapPlan};
pub use compiler::Compiler;
pub use conversion::{Consumer, ConversionPlan, FromManaged, Placement, ToManaged, TypeResolver};
pub use overload::{Dispatch, TypeOracle, TypePredicate, build_dispatch};
pub use ownership::{DestructorPlan, OwnershipPlan, WrapperStorage};
pub use planner::{ExecutionPlanner, FunctionPlan, OverloadPlan, Shape, Stage, Thread};
pub use result::{ResultPlan, Sentinel};
