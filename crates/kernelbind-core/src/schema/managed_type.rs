//! Managed-side types of arguments, fields and returns.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a managed number is extracted for the native side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    /// Extracted as a double (`double`).
    Double,
    /// Extracted as a 64-bit integer (`int`, `size_t`, `SimpleName`, ...).
    Integer,
}

/// Native string representation an argument expects.
///
/// These are not interchangeable: a `PathString` parameter must never be fed
/// a kernel string buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringKind {
    /// `const char *` passed as pointer plus explicit length.
    CStringWithLength,
    /// The kernel's own string type (`c3d::string_t`).
    KernelString,
    /// The kernel's path string type (`c3d::path_string`).
    PathString,
    /// `std::string`.
    StdString,
}

impl StringKind {
    /// Native type name of the owned buffer.
    pub fn native_buffer(self) -> &'static str {
        match self {
            StringKind::CStringWithLength => "std::string",
            StringKind::KernelString => "c3d::string_t",
            StringKind::PathString => "c3d::path_string",
            StringKind::StdString => "std::string",
        }
    }
}

/// The managed runtime type of a value crossing the binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum ManagedType {
    /// A managed number.
    Number(NumericKind),
    /// A managed boolean.
    Boolean,
    /// A managed string.
    String(StringKind),
    /// A managed array with the given element type.
    ArrayOf(Box<ManagedType>),
    /// A wrapper instance of the named class (managed class name).
    ObjectOf(String),
    /// A native enum, carried as an unsigned number.
    Enum(String),
}

impl ManagedType {
    /// Numbers, booleans and enums.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            ManagedType::Number(_) | ManagedType::Boolean | ManagedType::Enum(_)
        )
    }

    /// Whether this is an array type.
    pub fn is_array(&self) -> bool {
        matches!(self, ManagedType::ArrayOf(_))
    }

    /// The wrapped class for `ObjectOf`.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            ManagedType::ObjectOf(name) => Some(name),
            _ => None,
        }
    }

    /// The element type for `ArrayOf`.
    pub fn element(&self) -> Option<&ManagedType> {
        match self {
            ManagedType::ArrayOf(elem) => Some(elem),
            _ => None,
        }
    }

    /// Name used in user-facing messages.
    pub fn display_name(&self) -> String {
        match self {
            ManagedType::Number(_) | ManagedType::Enum(_) => "number".to_string(),
            ManagedType::Boolean => "boolean".to_string(),
            ManagedType::String(_) => "string".to_string(),
            ManagedType::ArrayOf(elem) => format!("Array<{}>", elem.display_name()),
            ManagedType::ObjectOf(name) => name.clone(),
        }
    }
}

impl fmt::Display for ManagedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        let edges = ManagedType::ArrayOf(Box::new(ManagedType::ObjectOf("CurveEdge".into())));
        assert_eq!(edges.display_name(), "Array<CurveEdge>");
        assert_eq!(ManagedType::Enum("MbeSpaceType".into()).to_string(), "number");
    }

    #[test]
    fn classifiers() {
        assert!(ManagedType::Boolean.is_primitive());
        assert!(!ManagedType::String(StringKind::StdString).is_primitive());
        assert_eq!(
            ManagedType::ObjectOf("Solid".into()).class_name(),
            Some("Solid")
        );
        assert!(ManagedType::ArrayOf(Box::new(ManagedType::Boolean)).is_array());
    }

    #[test]
    fn serde_shape() {
        let ty = ManagedType::ArrayOf(Box::new(ManagedType::Number(NumericKind::Double)));
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"array_of","of":{"kind":"number","of":"double"}}"#
        );
        let back: ManagedType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }
}
