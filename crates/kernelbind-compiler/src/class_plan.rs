//! Per-class decision sets handed to the renderer and the runtime.

use kernelbind_core::TypeHash;

use crate::conversion::ConversionPlan;
use crate::overload::Dispatch;
use crate::ownership::{DestructorPlan, OwnershipPlan};
use crate::planner::{FunctionPlan, OverloadPlan};

/// Getter/setter pair for a public native field.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorPlan {
    pub name: String,
    pub read_only: bool,
    pub conversion: ConversionPlan,
}

/// Constructor trampoline: dispatch over the class initializers.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorPlan {
    pub dispatch: Dispatch,
    pub overloads: Vec<OverloadPlan>,
}

/// What the registration routine installs on the managed class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationPlan {
    /// Entry-point names, every enabled shape included.
    pub static_methods: Vec<String>,
    pub instance_methods: Vec<String>,
    pub accessors: Vec<String>,
}

/// Wrappers that may be unwrapped as this class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrapPlan {
    pub class: String,
    /// This class and every class deriving from it.
    pub accepts: Vec<String>,
}

impl UnwrapPlan {
    pub fn accepts(&self, class: &str) -> bool {
        self.accepts.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassPlan {
    /// Managed class name.
    pub class: String,
    pub native_class_name: String,
    pub native_header: String,
    pub hash: TypeHash,
    pub is_module: bool,
    pub kind_tag: Option<u32>,
    pub ownership: OwnershipPlan,
    pub registration: RegistrationPlan,
    pub constructor: Option<ConstructorPlan>,
    pub functions: Vec<FunctionPlan>,
    pub accessors: Vec<AccessorPlan>,
    pub unwrap: UnwrapPlan,
}

impl ClassPlan {
    /// Function by managed name.
    pub fn function(&self, managed_name: &str) -> Option<&FunctionPlan> {
        self.functions.iter().find(|f| f.managed_name == managed_name)
    }

    pub fn accessor(&self, name: &str) -> Option<&AccessorPlan> {
        self.accessors.iter().find(|a| a.name == name)
    }

    pub fn destructor(&self) -> &DestructorPlan {
        &self.ownership.destructor
    }
}
