//! Managed-side values.
//!
//! The managed runtime is single-threaded. [`ManagedValue`] is built on
//! `Rc`, so it is `!Send` and worker code cannot touch it.

use std::rc::Rc;

use crate::wrapper::Wrapper;

#[derive(Debug, Clone, Default)]
pub enum ManagedValue {
    #[default]
    Undefined,
    Null,
    Number(f64),
    Boolean(bool),
    String(Rc<str>),
    Array(Rc<Vec<ManagedValue>>),
    Object(Rc<Wrapper>),
    /// Plain keyed record, used for multi-value returns.
    Record(Rc<Vec<(String, ManagedValue)>>),
}

impl ManagedValue {
    pub fn string(value: impl AsRef<str>) -> Self {
        ManagedValue::String(Rc::from(value.as_ref()))
    }

    pub fn array(values: Vec<ManagedValue>) -> Self {
        ManagedValue::Array(Rc::new(values))
    }

    pub fn record(fields: Vec<(String, ManagedValue)>) -> Self {
        ManagedValue::Record(Rc::new(fields))
    }

    pub(crate) fn object(wrapper: Wrapper) -> Self {
        ManagedValue::Object(Rc::new(wrapper))
    }

    /// Null or undefined.
    pub fn is_nullish(&self) -> bool {
        matches!(self, ManagedValue::Undefined | ManagedValue::Null)
    }

    /// Type name as reported in error messages; wrappers report their class.
    pub fn type_name(&self) -> String {
        match self {
            ManagedValue::Undefined => "undefined".into(),
            ManagedValue::Null => "null".into(),
            ManagedValue::Number(_) => "number".into(),
            ManagedValue::Boolean(_) => "boolean".into(),
            ManagedValue::String(_) => "string".into(),
            ManagedValue::Array(_) => "array".into(),
            ManagedValue::Object(w) => w.class().to_string(),
            ManagedValue::Record(_) => "object".into(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ManagedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ManagedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ManagedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ManagedValue]> {
        match self {
            ManagedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<Wrapper>> {
        match self {
            ManagedValue::Object(w) => Some(w),
            _ => None,
        }
    }

    /// Field of a record.
    pub fn get(&self, key: &str) -> Option<&ManagedValue> {
        match self {
            ManagedValue::Record(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Same managed object (not merely the same native identity).
    pub fn same_object(&self, other: &ManagedValue) -> bool {
        match (self, other) {
            (ManagedValue::Object(a), ManagedValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for ManagedValue {
    fn from(n: f64) -> Self {
        ManagedValue::Number(n)
    }
}

impl From<bool> for ManagedValue {
    fn from(b: bool) -> Self {
        ManagedValue::Boolean(b)
    }
}

impl From<&str> for ManagedValue {
    fn from(s: &str) -> Self {
        ManagedValue::string(s)
    }
}
