//! Executes conversion plans in both directions.

use std::sync::Arc;

use kernelbind_compiler::conversion::{ElementPlan, ElementStorage, NullHandling};
use kernelbind_compiler::planner::ArgPlan;
use kernelbind_compiler::overload::TypePredicate;
use kernelbind_compiler::{FromManaged, ToManaged, TypeOracle};
use kernelbind_core::{CallError, ManagedType, NumericKind};

use crate::classes::ClassTable;
use crate::handle::NativePtr;
use crate::library::NativeLibrary;
use crate::native::{NativeArg, NativeValue};
use crate::value::ManagedValue;
use crate::wrapper::{Teardown, Wrapper};

/// A non-fatal conversion event reported alongside the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub function: String,
    pub position: usize,
    pub argument: String,
    /// Element index inside an array argument.
    pub index: Option<usize>,
    pub message: String,
}

pub(crate) struct Marshal<'a> {
    pub classes: &'a ClassTable,
    pub library: &'a Arc<dyn NativeLibrary>,
    pub function: &'a str,
    pub warn_on_null_elements: bool,
}

impl Marshal<'_> {
    // ==========================================================================
    // Managed -> native
    // ==========================================================================

    pub fn arg(
        &self,
        plan: &ArgPlan,
        value: Option<&ManagedValue>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<NativeArg, CallError> {
        let value = match value {
            Some(v) if !v.is_nullish() => v,
            missing => return self.nullish(plan, missing),
        };

        let native = match &plan.conversion.from_managed {
            FromManaged::Number(kind) => number(*kind, self.expect_number(plan, value)?),
            FromManaged::Boolean => NativeValue::Bool(
                value
                    .as_bool()
                    .ok_or_else(|| self.type_error(plan, "boolean", value))?,
            ),
            FromManaged::Enum(_) => NativeValue::Enum(self.expect_number(plan, value)? as u32),
            FromManaged::String { kind, .. } => NativeValue::string(
                *kind,
                value
                    .as_str()
                    .ok_or_else(|| self.type_error(plan, "string", value))?,
            ),
            FromManaged::Array { element, .. } | FromManaged::Iterator { element, .. } => {
                let items = value
                    .as_array()
                    .ok_or_else(|| self.type_error(plan, "array", value))?;
                NativeValue::Array(self.elements(plan, element, items, diagnostics)?)
            }
            FromManaged::Object(obj) => {
                let wrapper = value
                    .as_object()
                    .filter(|w| self.classes.is_a(w.class(), &obj.class))
                    .ok_or_else(|| self.type_error(plan, &obj.class, value))?;
                let native = wrapper.native().clone();
                match native {
                    NativeValue::Object(ptr) if obj.copy => {
                        NativeValue::Object(self.library.copy_object(&obj.class, &ptr))
                    }
                    native => native,
                }
            }
        };
        Ok(NativeArg::Value(native))
    }

    fn nullish(&self, plan: &ArgPlan, value: Option<&ManagedValue>) -> Result<NativeArg, CallError> {
        if let Some(default) = &plan.default {
            return Ok(NativeArg::Default(default.clone()));
        }
        let from = &plan.conversion.from_managed;
        let accepts_null = plan.nullable
            || match from {
                FromManaged::Object(obj) => obj.null != NullHandling::Reject,
                FromManaged::Array { nullable, .. } => *nullable,
                _ => false,
            };
        if accepts_null {
            // A null iterator walks nothing.
            let native = match from {
                FromManaged::Iterator { .. } => NativeValue::Array(Vec::new()),
                _ => NativeValue::Null,
            };
            return Ok(NativeArg::Value(native));
        }
        let got = value.map_or_else(|| "undefined".to_string(), ManagedValue::type_name);
        Err(CallError::ArgumentTypeError {
            function: self.function.to_string(),
            position: plan.position,
            name: plan.name.clone(),
            expected: expected_name(&plan.conversion.from_managed),
            got,
        })
    }

    fn elements(
        &self,
        plan: &ArgPlan,
        element: &ElementPlan,
        items: &[ManagedValue],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<NativeValue>, CallError> {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if item.is_nullish() {
                let message = format!("skipped {} element", item.type_name());
                if self.warn_on_null_elements {
                    log::warn!(
                        "{}: argument {} ('{}') element {index}: {message}",
                        self.function,
                        plan.position,
                        plan.name
                    );
                }
                diagnostics.push(Diagnostic {
                    function: self.function.to_string(),
                    position: plan.position,
                    argument: plan.name.clone(),
                    index: Some(index),
                    message,
                });
                continue;
            }

            let converted = match element {
                ElementPlan::Primitive(ty) => primitive_element(ty, item),
                ElementPlan::Object { class, storage } => item
                    .as_object()
                    .filter(|w| self.classes.is_a(w.class(), class))
                    .map(|w| {
                        let native = w.native().clone();
                        match (storage, native) {
                            (ElementStorage::Value, NativeValue::Object(ptr)) => {
                                NativeValue::Object(self.library.copy_object(class, &ptr))
                            }
                            (_, native) => native,
                        }
                    }),
            };
            let native = converted.ok_or_else(|| CallError::ArrayElementTypeError {
                function: self.function.to_string(),
                position: plan.position,
                index,
                expected: element.managed_type().display_name(),
                got: item.type_name(),
            })?;
            out.push(native);
        }
        Ok(out)
    }

    fn expect_number(&self, plan: &ArgPlan, value: &ManagedValue) -> Result<f64, CallError> {
        value
            .as_number()
            .ok_or_else(|| self.type_error(plan, "number", value))
    }

    fn type_error(&self, plan: &ArgPlan, expected: &str, value: &ManagedValue) -> CallError {
        CallError::ArgumentTypeError {
            function: self.function.to_string(),
            position: plan.position,
            name: plan.name.clone(),
            expected: expected.to_string(),
            got: value.type_name(),
        }
    }

    // ==========================================================================
    // Native -> managed
    // ==========================================================================

    pub fn to_managed(&self, plan: &ToManaged, native: NativeValue) -> Result<ManagedValue, CallError> {
        let value = match (plan, native) {
            (_, NativeValue::Null) => ManagedValue::Null,
            (ToManaged::Number(_) | ToManaged::Enum(_), native) => ManagedValue::Number(
                native.as_f64().ok_or_else(|| self.mismatch("number", &native))?,
            ),
            (ToManaged::Boolean, NativeValue::Bool(b)) => ManagedValue::Boolean(b),
            (ToManaged::String(_), NativeValue::String { value, .. }) => ManagedValue::string(value),
            (ToManaged::Array(element), NativeValue::Array(items)) => ManagedValue::array(
                items
                    .into_iter()
                    .map(|item| self.element_to_managed(element, item))
                    .collect::<Result<_, _>>()?,
            ),
            (ToManaged::WrapPointer { class }, NativeValue::Object(ptr)) => self.wrap(class, ptr)?,
            (ToManaged::HeapCopyThenWrap { class }, NativeValue::Object(ptr)) => {
                let copy = self.library.copy_object(class, &ptr);
                self.wrap(class, copy)?
            }
            (
                ToManaged::EmbedValue { class }
                | ToManaged::HeapCopyThenWrap { class }
                | ToManaged::WrapPointer { class },
                NativeValue::Pod(pod),
            ) => ManagedValue::object(Wrapper::value(class.clone(), pod)),
            (plan, native) => {
                return Err(CallError::Internal(format!(
                    "{}: cannot convert native {} with {plan:?}",
                    self.function,
                    native.type_name()
                )));
            }
        };
        Ok(value)
    }

    fn element_to_managed(
        &self,
        element: &ElementPlan,
        native: NativeValue,
    ) -> Result<ManagedValue, CallError> {
        match (element, native) {
            (ElementPlan::Primitive(ManagedType::Boolean), NativeValue::Bool(b)) => {
                Ok(ManagedValue::Boolean(b))
            }
            (ElementPlan::Primitive(ManagedType::String(_)), NativeValue::String { value, .. }) => {
                Ok(ManagedValue::string(value))
            }
            (ElementPlan::Primitive(_), native) => native
                .as_f64()
                .map(ManagedValue::Number)
                .ok_or_else(|| self.mismatch("number", &native)),
            (ElementPlan::Object { class, .. }, NativeValue::Object(ptr)) => self.wrap(class, ptr),
            (ElementPlan::Object { class, .. }, NativeValue::Pod(pod)) => {
                Ok(ManagedValue::object(Wrapper::value(class.clone(), pod)))
            }
            (ElementPlan::Object { .. }, NativeValue::Null) => Ok(ManagedValue::Null),
            (_, native) => Err(self.mismatch("element", &native)),
        }
    }

    /// Wrap `ptr` as `class`. Shares identity; the count is unchanged.
    pub fn wrap(&self, class: &str, ptr: NativePtr) -> Result<ManagedValue, CallError> {
        let plan = self
            .classes
            .get(class)
            .ok_or_else(|| CallError::Internal(format!("no wrapper class {class}")))?;
        let teardown = Teardown::from_plan(&plan.ownership.destructor, self.library);
        Ok(ManagedValue::object(Wrapper::pointer(class, ptr, teardown)))
    }

    fn mismatch(&self, expected: &str, native: &NativeValue) -> CallError {
        CallError::Internal(format!(
            "{}: expected native {expected}, got {}",
            self.function,
            native.type_name()
        ))
    }
}

fn number(kind: NumericKind, n: f64) -> NativeValue {
    match kind {
        NumericKind::Double => NativeValue::Double(n),
        NumericKind::Integer => NativeValue::Int(n as i64),
    }
}

fn primitive_element(ty: &ManagedType, item: &ManagedValue) -> Option<NativeValue> {
    match (ty, item) {
        (ManagedType::Number(kind), ManagedValue::Number(n)) => Some(number(*kind, *n)),
        (ManagedType::Enum(_), ManagedValue::Number(n)) => Some(NativeValue::Enum(*n as u32)),
        (ManagedType::Boolean, ManagedValue::Boolean(b)) => Some(NativeValue::Bool(*b)),
        (ManagedType::String(kind), ManagedValue::String(s)) => {
            Some(NativeValue::string(*kind, s.to_string()))
        }
        _ => None,
    }
}

fn expected_name(from: &FromManaged) -> String {
    match from {
        FromManaged::Number(_) | FromManaged::Enum(_) => "number".into(),
        FromManaged::Boolean => "boolean".into(),
        FromManaged::String { .. } => "string".into(),
        FromManaged::Array { .. } | FromManaged::Iterator { .. } => "array".into(),
        FromManaged::Object(obj) => obj.class.clone(),
    }
}

// ============================================================================
// Overload guards
// ============================================================================

/// Answers overload guard predicates for managed values.
pub(crate) struct ManagedOracle<'a> {
    pub classes: &'a ClassTable,
}

impl TypeOracle for ManagedOracle<'_> {
    type Value = ManagedValue;

    fn is_nullish(&self, value: &ManagedValue) -> bool {
        value.is_nullish()
    }

    fn satisfies(&self, value: &ManagedValue, predicate: &TypePredicate) -> bool {
        match (predicate, value) {
            (TypePredicate::IsNumber, ManagedValue::Number(_)) => true,
            (TypePredicate::IsBoolean, ManagedValue::Boolean(_)) => true,
            (TypePredicate::IsString, ManagedValue::String(_)) => true,
            (TypePredicate::IsArray, ManagedValue::Array(_)) => true,
            (TypePredicate::InstanceOf(class), ManagedValue::Object(w)) => {
                self.classes.is_a(w.class(), class)
            }
            _ => false,
        }
    }

    fn describe(&self, value: &ManagedValue) -> String {
        value.type_name()
    }
}
