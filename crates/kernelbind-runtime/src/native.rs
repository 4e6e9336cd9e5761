//! Native-side values. Everything here is `Send`.

use std::any::Any;
use std::fmt;

use kernelbind_core::StringKind;

use crate::handle::NativePtr;

/// Payload of a value-type object.
pub trait PodData: Any + Send + fmt::Debug {
    fn clone_box(&self) -> Box<dyn PodData>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send + Clone + fmt::Debug> PodData for T {
    fn clone_box(&self) -> Box<dyn PodData> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A copied native value of a value-type class.
#[derive(Debug)]
pub struct PodValue {
    class: String,
    data: Box<dyn PodData>,
}

impl PodValue {
    pub fn new<T: PodData>(class: impl Into<String>, data: T) -> Self {
        Self {
            class: class.into(),
            data: Box::new(data),
        }
    }

    /// Managed class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.as_any_mut().downcast_mut()
    }
}

impl Clone for PodValue {
    fn clone(&self) -> Self {
        Self {
            class: self.class.clone(),
            data: self.data.clone_box(),
        }
    }
}

/// A value in native representation.
#[derive(Debug, Clone)]
pub enum NativeValue {
    Void,
    /// Null pointer.
    Null,
    Int(i64),
    Double(f64),
    Bool(bool),
    Enum(u32),
    String { kind: StringKind, value: String },
    Object(NativePtr),
    Pod(PodValue),
    /// Dynamic array, list or iterator source.
    Array(Vec<NativeValue>),
}

impl NativeValue {
    pub fn string(kind: StringKind, value: impl Into<String>) -> Self {
        NativeValue::String {
            kind,
            value: value.into(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Void => "void",
            NativeValue::Null => "null",
            NativeValue::Int(_) => "int",
            NativeValue::Double(_) => "double",
            NativeValue::Bool(_) => "bool",
            NativeValue::Enum(_) => "enum",
            NativeValue::String { .. } => "string",
            NativeValue::Object(_) => "object",
            NativeValue::Pod(_) => "value",
            NativeValue::Array(_) => "array",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Int(v) => Some(*v as f64),
            NativeValue::Double(v) => Some(*v),
            NativeValue::Enum(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn as_ptr(&self) -> Option<&NativePtr> {
        match self {
            NativeValue::Object(ptr) => Some(ptr),
            _ => None,
        }
    }

    pub fn as_pod(&self) -> Option<&PodValue> {
        match self {
            NativeValue::Pod(pod) => Some(pod),
            _ => None,
        }
    }
}

/// One native argument.
#[derive(Debug, Clone)]
pub enum NativeArg {
    Value(NativeValue),
    /// The argument was omitted; the callee applies this default expression.
    Default(String),
}

impl NativeArg {
    pub fn value(&self) -> Option<&NativeValue> {
        match self {
            NativeArg::Value(v) => Some(v),
            NativeArg::Default(_) => None,
        }
    }
}
