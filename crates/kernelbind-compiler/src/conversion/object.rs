//! Wrapped objects.

use kernelbind_core::{ArgSpec, PassBy, PlanError};
use kernelbind_registry::ClassRegistry;

use super::{ConversionPlan, FromManaged, Placement, ToManaged, class_is_value_type};

/// What a null/undefined managed value becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullHandling {
    /// Rejected before any native call.
    Reject,
    /// The native default expression is used.
    UseDefault,
    /// A native null pointer is passed.
    NullPointer,
}

/// Unwrapping decision for a scalar object argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectArg {
    pub class: String,
    pub null: NullHandling,
    /// By-value parameter: the callee receives its own copy of the object.
    pub copy: bool,
    /// Retain the native handle before the call; the callee keeps it.
    pub retain: bool,
    pub value_type: bool,
    pub placement: Placement,
}

pub(super) fn plan_object(
    registry: &ClassRegistry,
    arg: &ArgSpec,
    class: &str,
    placement: Placement,
) -> Result<ConversionPlan, PlanError> {
    let value_type = class_is_value_type(registry, &arg.name, class)?;

    let null = if arg.default.is_some() {
        NullHandling::UseDefault
    } else if arg.accepts_nullish() {
        NullHandling::NullPointer
    } else {
        NullHandling::Reject
    };

    let to_managed = if value_type {
        ToManaged::EmbedValue {
            class: class.to_string(),
        }
    } else if arg.is_on_stack {
        ToManaged::HeapCopyThenWrap {
            class: class.to_string(),
        }
    } else {
        ToManaged::WrapPointer {
            class: class.to_string(),
        }
    };

    Ok(ConversionPlan {
        from_managed: FromManaged::Object(ObjectArg {
            class: class.to_string(),
            null,
            copy: arg.pass_by == PassBy::Value && !value_type,
            retain: arg.is_owning_pointer && !value_type,
            value_type,
            placement,
        }),
        to_managed,
    })
}
