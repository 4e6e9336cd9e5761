//! Ownership & identity decisions per class.

use kernelbind_core::{ClassSpec, PlanError};
use kernelbind_registry::ClassRegistry;

/// What a wrapper holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapperStorage {
    /// A refcounted native handle; wrappers share identity.
    Pointer,
    /// An embedded native value; no identity, no counting.
    EmbeddedValue,
}

/// What wrapper teardown does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DestructorPlan {
    /// Call the named native free function once.
    FreeFunction(String),
    /// Release the native handle once.
    Release,
    /// Nothing to do (value types, modules, protected destructors).
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipPlan {
    pub class: String,
    pub storage: WrapperStorage,
    pub refcounted: bool,
    pub destructor: DestructorPlan,
    pub base: Option<String>,
    /// Nearest first.
    pub ancestors: Vec<String>,
}

impl OwnershipPlan {
    pub fn for_class(registry: &ClassRegistry, spec: &ClassSpec) -> Result<Self, PlanError> {
        if let Some(base) = spec.extends.as_ref().filter(|b| !registry.contains(b)) {
            return Err(PlanError::UnresolvedClass {
                context: spec.managed_class_name.clone(),
                name: base.clone(),
            });
        }

        let storage = if spec.is_value_type {
            WrapperStorage::EmbeddedValue
        } else {
            WrapperStorage::Pointer
        };

        let destructor = match (&spec.free_function, spec.protected_destructor) {
            _ if !spec.is_refcounted() => DestructorPlan::None,
            (Some(free), false) => DestructorPlan::FreeFunction(free.clone()),
            (_, true) => DestructorPlan::None,
            (None, false) => DestructorPlan::Release,
        };

        Ok(Self {
            class: spec.managed_class_name.clone(),
            storage,
            refcounted: spec.is_refcounted(),
            destructor,
            base: spec.extends.clone(),
            ancestors: registry.ancestors(&spec.managed_class_name),
        })
    }

    /// Whether `class` is this class or one of its ancestors.
    pub fn is_a(&self, class: &str) -> bool {
        self.class == class || self.ancestors.iter().any(|a| a == class)
    }
}
