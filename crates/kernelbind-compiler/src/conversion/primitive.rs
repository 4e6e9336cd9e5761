//! Numbers, booleans, enums and strings.

use kernelbind_core::{ManagedType, NumericKind, StringKind};

use super::{ConversionPlan, FromManaged, Placement, ToManaged};

/// Plan a number, boolean or enum. These never allocate.
pub(super) fn plan_scalar(ty: &ManagedType) -> ConversionPlan {
    match ty {
        ManagedType::Boolean => ConversionPlan {
            from_managed: FromManaged::Boolean,
            to_managed: ToManaged::Boolean,
        },
        ManagedType::Enum(name) => ConversionPlan {
            from_managed: FromManaged::Enum(name.clone()),
            to_managed: ToManaged::Enum(name.clone()),
        },
        ManagedType::Number(kind) => number(*kind),
        // Callers only pass scalars; anything else is extracted as a double.
        _ => number(NumericKind::Double),
    }
}

fn number(kind: NumericKind) -> ConversionPlan {
    ConversionPlan {
        from_managed: FromManaged::Number(kind),
        to_managed: ToManaged::Number(kind),
    }
}

/// Strings are always copied into an owned buffer of their own kind.
pub(super) fn plan_string(kind: StringKind, placement: Placement) -> ConversionPlan {
    ConversionPlan {
        from_managed: FromManaged::String { kind, placement },
        to_managed: ToManaged::String(kind),
    }
}
