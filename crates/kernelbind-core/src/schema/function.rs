//! Function and overload descriptors.

use serde::{Deserialize, Serialize};

use super::ArgSpec;

/// How the native return value is interpreted after the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// Nothing to interpret.
    #[default]
    Void,
    /// The native return is a value handed back to the caller.
    Value,
    /// The native return is a kernel result code; one value means success.
    ErrorCode,
    /// The native return is a success flag.
    ErrorBool,
}

impl ReturnKind {
    /// Whether the native return is a sentinel rather than a value.
    pub fn is_sentinel(self) -> bool {
        matches!(self, ReturnKind::ErrorCode | ReturnKind::ErrorBool)
    }
}

/// One native signature of a function or initializer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverloadSpec {
    #[serde(default)]
    pub params: Vec<ArgSpec>,
    /// The primary return (if `return_kind == Value`) followed by out-parameters.
    #[serde(default)]
    pub returns: Vec<ArgSpec>,
    #[serde(default)]
    pub return_kind: ReturnKind,
}

impl OverloadSpec {
    pub fn new(params: Vec<ArgSpec>) -> Self {
        Self {
            params,
            returns: Vec::new(),
            return_kind: ReturnKind::Void,
        }
    }

    pub fn with_return(mut self, ret: ArgSpec) -> Self {
        self.returns.push(ret);
        self
    }

    pub fn with_return_kind(mut self, kind: ReturnKind) -> Self {
        self.return_kind = kind;
        self
    }

    /// Declared managed arity.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Managed arity once trailing defaulted parameters are omitted.
    pub fn required_arity(&self) -> usize {
        let trailing = self
            .params
            .iter()
            .rev()
            .take_while(|p| p.default.is_some())
            .count();
        self.params.len() - trailing
    }

    /// Whether `count` managed arguments can select this overload.
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.required_arity() && count <= self.arity()
    }
}

/// A function (method or static) with one or more overloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Native name.
    pub name: String,
    /// Name exposed to the managed runtime.
    pub managed_name: String,
    #[serde(default)]
    pub is_static: bool,
    /// Hand-written elsewhere; excluded from generation.
    #[serde(default)]
    pub is_manual: bool,
    /// Not copied into derived classes.
    #[serde(default)]
    pub is_uninheritable: bool,
    pub overloads: Vec<OverloadSpec>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>, overload: OverloadSpec) -> Self {
        let name = name.into();
        Self {
            managed_name: name.clone(),
            name,
            is_static: false,
            is_manual: false,
            is_uninheritable: false,
            overloads: vec![overload],
        }
    }

    pub fn with_managed_name(mut self, name: impl Into<String>) -> Self {
        self.managed_name = name.into();
        self
    }

    pub fn with_overload(mut self, overload: OverloadSpec) -> Self {
        self.overloads.push(overload);
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn manual(mut self) -> Self {
        self.is_manual = true;
        self
    }

    pub fn uninheritable(mut self) -> Self {
        self.is_uninheritable = true;
        self
    }

    pub fn is_overloaded(&self) -> bool {
        self.overloads.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ManagedType, NumericKind};

    fn number(name: &str, pos: usize) -> ArgSpec {
        ArgSpec::new(name, "double", ManagedType::Number(NumericKind::Double), pos)
    }

    #[test]
    fn required_arity_ignores_trailing_defaults() {
        let o = OverloadSpec::new(vec![
            number("a", 0),
            number("b", 1).with_default("0"),
            number("c", 2).with_default("1"),
        ]);
        assert_eq!(o.arity(), 3);
        assert_eq!(o.required_arity(), 1);
        assert!(o.accepts_arity(1));
        assert!(o.accepts_arity(3));
        assert!(!o.accepts_arity(0));
        assert!(!o.accepts_arity(4));
    }

    #[test]
    fn non_trailing_default_is_required() {
        let o = OverloadSpec::new(vec![number("a", 0).with_default("0"), number("b", 1)]);
        assert_eq!(o.required_arity(), 2);
    }

    #[test]
    fn sentinel_kinds() {
        assert!(ReturnKind::ErrorCode.is_sentinel());
        assert!(ReturnKind::ErrorBool.is_sentinel());
        assert!(!ReturnKind::Value.is_sentinel());
    }
}
