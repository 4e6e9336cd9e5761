//! Class descriptors.

use serde::{Deserialize, Serialize};

use super::{ArgSpec, FunctionSpec, OverloadSpec};
use crate::TypeHash;

/// A native data member exposed as a getter/setter pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub arg: ArgSpec,
    #[serde(default)]
    pub read_only: bool,
}

impl FieldSpec {
    pub fn new(arg: ArgSpec) -> Self {
        Self {
            arg,
            read_only: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.arg.name
    }
}

/// A wrapped native class (or a module of static functions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub native_class_name: String,
    pub managed_class_name: String,
    pub native_header: String,

    // === Inheritance ===
    /// Managed name of the single base class.
    #[serde(default)]
    pub extends: Option<String>,

    // === Ownership ===
    /// Copied by value; never reference counted.
    #[serde(default)]
    pub is_value_type: bool,
    /// Native function that releases the underlying object.
    #[serde(default)]
    pub free_function: Option<String>,
    #[serde(default)]
    pub protected_destructor: bool,

    /// Static-only declaration without wrapper instances.
    #[serde(default)]
    pub is_module: bool,
    /// Native kind tag this class corresponds to for `cast`.
    #[serde(default)]
    pub kind_tag: Option<u32>,

    // === Members ===
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
    #[serde(default)]
    pub initializers: Vec<OverloadSpec>,
    /// Other classes whose generated headers this class needs.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ClassSpec {
    /// Create a class whose native name is `Mb` + managed name.
    pub fn new(managed_class_name: impl Into<String>, native_header: impl Into<String>) -> Self {
        let managed = managed_class_name.into();
        Self {
            native_class_name: format!("Mb{managed}"),
            managed_class_name: managed,
            native_header: native_header.into(),
            extends: None,
            is_value_type: false,
            free_function: None,
            protected_destructor: false,
            is_module: false,
            kind_tag: None,
            fields: Vec::new(),
            functions: Vec::new(),
            initializers: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Create a static-only module.
    pub fn module(name: impl Into<String>, native_header: impl Into<String>) -> Self {
        let mut spec = Self::new(name, native_header);
        spec.is_module = true;
        spec
    }

    pub fn hash(&self) -> TypeHash {
        TypeHash::from_name(&self.managed_class_name)
    }

    /// The wrapper's teardown frees the native object itself.
    pub fn has_owning_destructor(&self) -> bool {
        self.free_function.is_some() && !self.protected_destructor
    }

    /// Whether wrappers share a reference-counted native identity.
    pub fn is_refcounted(&self) -> bool {
        !self.is_value_type && !self.is_module
    }

    /// Look up an own function by native name.
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|f| f.name == name)
    }

    // === Builder Methods ===

    pub fn with_native_name(mut self, name: impl Into<String>) -> Self {
        self.native_class_name = name.into();
        self
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends = Some(base.into());
        self
    }

    pub fn value_type(mut self) -> Self {
        self.is_value_type = true;
        self
    }

    pub fn with_free_function(mut self, name: impl Into<String>) -> Self {
        self.free_function = Some(name.into());
        self
    }

    pub fn with_protected_destructor(mut self) -> Self {
        self.protected_destructor = true;
        self
    }

    pub fn with_kind_tag(mut self, tag: u32) -> Self {
        self.kind_tag = Some(tag);
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_function(mut self, function: FunctionSpec) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_initializer(mut self, initializer: OverloadSpec) -> Self {
        self.initializers.push(initializer);
        self
    }

    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }
}
