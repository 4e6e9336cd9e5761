//! Result/Error Translator.
//!
//! Native functions report failure three ways: a kernel result code, a
//! success flag, or not at all. [`ResultPlan::translate`] turns the raw
//! native sentinel into either success or a tagged
//! [`CallError::NativeOperationFailure`]. It only reads native data, so it
//! runs on whichever thread made the native call.

use kernelbind_core::result_code::GENERIC_FAILURE;
use kernelbind_core::{CallError, ResultCode, ReturnKind};

/// Raw native outcome handed to the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// `Void` and `Value` returns carry no sentinel.
    None,
    Code(u32),
    Flag(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultPlan {
    pub kind: ReturnKind,
    /// Code that means success for `ErrorCode` returns.
    pub success_code: u32,
}

impl ResultPlan {
    pub fn new(kind: ReturnKind, success_code: u32) -> Self {
        Self { kind, success_code }
    }

    /// Translate the native outcome of `function`.
    pub fn translate(&self, function: &str, sentinel: Sentinel) -> Result<(), CallError> {
        match (self.kind, sentinel) {
            (ReturnKind::Void | ReturnKind::Value, _) => Ok(()),
            (ReturnKind::ErrorCode, Sentinel::Code(code)) if code == self.success_code => Ok(()),
            (ReturnKind::ErrorCode, Sentinel::Code(code)) => Err(CallError::NativeOperationFailure {
                function: function.to_string(),
                code: Some(code),
                message: ResultCode::message_for(code).to_string(),
                is_kernel_error: true,
            }),
            (ReturnKind::ErrorBool, Sentinel::Flag(true)) => Ok(()),
            (ReturnKind::ErrorBool, Sentinel::Flag(false)) => {
                Err(CallError::NativeOperationFailure {
                    function: function.to_string(),
                    code: None,
                    message: GENERIC_FAILURE.to_string(),
                    is_kernel_error: true,
                })
            }
            (kind, other) => Err(CallError::Internal(format!(
                "{function}: {kind:?} return produced {other:?}"
            ))),
        }
    }
}
