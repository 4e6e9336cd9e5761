//! Arrays and iterator adapters.

use kernelbind_core::{ArgSpec, ManagedType, PassBy, PlanError};
use kernelbind_registry::ClassRegistry;

use super::{ConversionPlan, FromManaged, Placement, ToManaged, class_is_value_type};

/// How the native container holds a wrapped element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementStorage {
    /// The container stores pointers; elements share identity with wrappers.
    Pointer,
    /// The container stores copies of the native values.
    Value,
}

/// Per-element conversion for arrays and iterators.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementPlan {
    /// Number, boolean, enum or string elements, checked against this type.
    Primitive(ManagedType),
    /// Wrapped elements, checked with `instanceof` against `class`.
    Object {
        class: String,
        storage: ElementStorage,
    },
}

impl ElementPlan {
    /// Managed type each element must have.
    pub fn managed_type(&self) -> ManagedType {
        match self {
            ElementPlan::Primitive(ty) => ty.clone(),
            ElementPlan::Object { class, .. } => ManagedType::ObjectOf(class.clone()),
        }
    }
}

fn element_plan(registry: &ClassRegistry, arg: &ArgSpec) -> Result<ElementPlan, PlanError> {
    let (managed, pass_by) = match &arg.element_type {
        Some(element) => (element.managed_type.clone(), element.pass_by),
        None => {
            let managed = arg
                .managed_type
                .element()
                .cloned()
                .ok_or_else(|| PlanError::UnresolvedClass {
                    context: arg.name.clone(),
                    name: arg.managed_type.display_name(),
                })?;
            (managed, PassBy::Value)
        }
    };

    match managed {
        ManagedType::ObjectOf(class) => {
            let is_value = class_is_value_type(registry, &arg.name, &class)?;
            let storage = if pass_by == PassBy::Pointer && !is_value {
                ElementStorage::Pointer
            } else {
                ElementStorage::Value
            };
            Ok(ElementPlan::Object { class, storage })
        }
        other => Ok(ElementPlan::Primitive(other)),
    }
}

pub(super) fn plan_array(
    registry: &ClassRegistry,
    arg: &ArgSpec,
    placement: Placement,
) -> Result<ConversionPlan, PlanError> {
    let element = element_plan(registry, arg)?;
    Ok(ConversionPlan {
        from_managed: FromManaged::Array {
            element: element.clone(),
            nullable: arg.accepts_nullish(),
            placement,
        },
        to_managed: ToManaged::Array(element),
    })
}

pub(super) fn plan_iterator(
    registry: &ClassRegistry,
    arg: &ArgSpec,
    placement: Placement,
) -> Result<ConversionPlan, PlanError> {
    let element = element_plan(registry, arg)?;
    Ok(ConversionPlan {
        from_managed: FromManaged::Iterator {
            element: element.clone(),
            placement,
        },
        to_managed: ToManaged::Array(element),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::{Consumer, TypeResolver};
    use kernelbind_core::{ClassSpec, NumericKind};

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.register(ClassSpec::new("Curve", "curve.h")).unwrap();
        registry
            .register(ClassSpec::new("CartPoint3D", "mb_cart_point3d.h").value_type())
            .unwrap();
        registry
    }

    fn array_of(name: &str, class: &str, element_pass_by: PassBy) -> ArgSpec {
        let element = ManagedType::ObjectOf(class.into());
        ArgSpec::new(name, "RPArray", ManagedType::ArrayOf(Box::new(element.clone())), 0)
            .with_pass_by(PassBy::Reference)
            .with_element(ArgSpec::element(format!("Mb{class}"), element, element_pass_by))
    }

    #[test]
    fn pointer_arrays_share_identity() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);
        let plan = resolver
            .resolve(&array_of("curves", "Curve", PassBy::Pointer), Consumer::Sync)
            .unwrap();
        assert_eq!(
            plan.from_managed,
            FromManaged::Array {
                element: ElementPlan::Object {
                    class: "Curve".into(),
                    storage: ElementStorage::Pointer
                },
                nullable: false,
                placement: Placement::Stack,
            }
        );
    }

    #[test]
    fn value_types_store_values() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);
        let plan = resolver
            .resolve(&array_of("points", "CartPoint3D", PassBy::Pointer), Consumer::Async)
            .unwrap();
        match plan.from_managed {
            FromManaged::Array { element, placement, .. } => {
                assert_eq!(placement, Placement::Heap);
                assert!(matches!(
                    element,
                    ElementPlan::Object { storage: ElementStorage::Value, .. }
                ));
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn primitive_arrays() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);
        let number = ManagedType::Number(NumericKind::Double);
        let arg = ArgSpec::new("ts", "SArray", ManagedType::ArrayOf(Box::new(number.clone())), 0)
            .optional();
        let plan = resolver.resolve(&arg, Consumer::Sync).unwrap();
        assert_eq!(
            plan.from_managed,
            FromManaged::Array {
                element: ElementPlan::Primitive(number.clone()),
                nullable: true,
                placement: Placement::Stack,
            }
        );
        assert_eq!(plan.to_managed, ToManaged::Array(ElementPlan::Primitive(number)));
    }

    #[test]
    fn iterators_follow_the_escape_rule() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);
        let arg = array_of("edges", "Curve", PassBy::Pointer).iterator_adapter();
        let sync = resolver.resolve(&arg, Consumer::Sync).unwrap();
        assert!(matches!(
            sync.from_managed,
            FromManaged::Iterator { placement: Placement::Stack, .. }
        ));
        let async_plan = resolver.resolve(&arg, Consumer::Async).unwrap();
        assert_eq!(async_plan.from_managed.placement(), Some(Placement::Heap));
    }
}
