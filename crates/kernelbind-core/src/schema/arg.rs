//! Argument, return and field descriptors.

use serde::{Deserialize, Serialize};

use super::ManagedType;

/// How the native signature receives the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassBy {
    /// By value (`MbCartPoint3D p`).
    #[default]
    Value,
    /// By reference (`const MbVector3D & v`).
    Reference,
    /// By pointer (`MbRegTransform * iReg`).
    Pointer,
}

/// One argument, return value or field crossing the binding.
///
/// For parameters `position` is the managed positional index; `native_slot`
/// is where the value sits in the native argument list, which differs once
/// out-parameters (returns on the managed side) are interleaved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    /// Native type as written in the signature, without qualifiers.
    pub native_type: String,
    pub managed_type: ManagedType,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub native_slot: Option<usize>,
    #[serde(default)]
    pub pass_by: PassBy,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub is_nullable: bool,
    /// This descriptor is the element of an enclosing array descriptor.
    #[serde(default)]
    pub is_array_element: bool,
    #[serde(default)]
    pub element_type: Option<Box<ArgSpec>>,
    #[serde(default)]
    pub is_iterator_adapter: bool,
    /// The native callee keeps a reference to this object.
    #[serde(default)]
    pub is_owning_pointer: bool,
    /// Returns only: native storage does not outlive the call.
    #[serde(default)]
    pub is_on_stack: bool,
    /// Native default expression used when the argument is omitted.
    #[serde(default)]
    pub default: Option<String>,
}

impl ArgSpec {
    /// Create a descriptor with all flags cleared.
    pub fn new(
        name: impl Into<String>,
        native_type: impl Into<String>,
        managed_type: ManagedType,
        position: usize,
    ) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            managed_type,
            position,
            native_slot: None,
            pass_by: PassBy::Value,
            is_const: false,
            is_optional: false,
            is_nullable: false,
            is_array_element: false,
            element_type: None,
            is_iterator_adapter: false,
            is_owning_pointer: false,
            is_on_stack: false,
            default: None,
        }
    }

    /// Create an array element descriptor.
    pub fn element(native_type: impl Into<String>, managed_type: ManagedType, pass_by: PassBy) -> Self {
        let mut spec = Self::new("element", native_type, managed_type, 0);
        spec.is_array_element = true;
        spec.pass_by = pass_by;
        spec
    }

    // === Builder Methods ===

    pub fn with_pass_by(mut self, pass_by: PassBy) -> Self {
        self.pass_by = pass_by;
        self
    }

    pub fn with_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_native_slot(mut self, slot: usize) -> Self {
        self.native_slot = Some(slot);
        self
    }

    /// Mark optional with a native default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self.is_optional = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn with_element(mut self, element: ArgSpec) -> Self {
        let mut element = element;
        element.is_array_element = true;
        self.element_type = Some(Box::new(element));
        self
    }

    pub fn iterator_adapter(mut self) -> Self {
        self.is_iterator_adapter = true;
        self
    }

    pub fn owning_pointer(mut self) -> Self {
        self.is_owning_pointer = true;
        self
    }

    pub fn on_stack(mut self, on_stack: bool) -> Self {
        self.is_on_stack = on_stack;
        self
    }

    // === Queries ===

    /// Null/undefined is an acceptable managed value.
    pub fn accepts_nullish(&self) -> bool {
        self.is_optional || self.is_nullable
    }

    /// Slot in the native argument list.
    pub fn native_index(&self) -> usize {
        self.native_slot.unwrap_or(self.position)
    }

    pub fn is_pointer(&self) -> bool {
        self.pass_by == PassBy::Pointer
    }
}
