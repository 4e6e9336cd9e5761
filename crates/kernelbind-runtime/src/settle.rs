//! Promises, callbacks and the managed error object.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kernelbind_core::CallError;
use thiserror::Error;

use crate::marshal::Diagnostic;
use crate::value::ManagedValue;

/// The error object handed to managed code.
///
/// `is_kernel_error` tells kernel failures apart from argument errors on
/// every path (sync, callback and promise).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ManagedError {
    pub message: String,
    pub code: Option<u32>,
    pub is_kernel_error: bool,
    pub source: CallError,
}

impl From<CallError> for ManagedError {
    fn from(err: CallError) -> Self {
        Self {
            message: err.to_string(),
            code: err.code(),
            is_kernel_error: err.is_kernel_error(),
            source: err,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum PromiseState {
    #[default]
    Pending,
    Fulfilled(ManagedValue),
    Rejected(ManagedError),
}

#[derive(Default)]
struct PromiseInner {
    state: PromiseState,
    diagnostics: Vec<Diagnostic>,
}

/// A managed promise. Settles at most once; later settlements are ignored.
#[derive(Clone, Default)]
pub struct Promise(Rc<RefCell<PromiseInner>>);

impl Promise {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PromiseState {
        self.0.borrow().state.clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.0.borrow().state, PromiseState::Pending)
    }

    pub fn value(&self) -> Option<ManagedValue> {
        match &self.0.borrow().state {
            PromiseState::Fulfilled(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<ManagedError> {
        match &self.0.borrow().state {
            PromiseState::Rejected(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Diagnostics raised while converting the arguments.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.0.borrow().diagnostics.clone()
    }

    pub(crate) fn add_diagnostics(&self, diagnostics: Vec<Diagnostic>) {
        self.0.borrow_mut().diagnostics.extend(diagnostics);
    }

    fn settle(&self, state: PromiseState) -> bool {
        let mut inner = self.0.borrow_mut();
        if !matches!(inner.state, PromiseState::Pending) {
            log::warn!("promise settled twice; ignoring");
            return false;
        }
        inner.state = state;
        true
    }

    pub fn resolve(&self, value: ManagedValue) -> bool {
        self.settle(PromiseState::Fulfilled(value))
    }

    pub fn reject(&self, error: ManagedError) -> bool {
        self.settle(PromiseState::Rejected(error))
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Promise").field(&self.0.borrow().state).finish()
    }
}

/// Node-style completion callback: `(error, result)`.
pub type Callback = Box<dyn FnOnce(Option<ManagedError>, ManagedValue)>;

/// Where an async call delivers its outcome. Consumed by settling.
pub(crate) enum Settler {
    Promise(Promise),
    Callback(Callback),
}

impl Settler {
    pub(crate) fn settle(self, outcome: Result<ManagedValue, ManagedError>) {
        match (self, outcome) {
            (Settler::Promise(p), Ok(value)) => {
                p.resolve(value);
            }
            (Settler::Promise(p), Err(err)) => {
                p.reject(err);
            }
            (Settler::Callback(cb), Ok(value)) => cb(None, value),
            (Settler::Callback(cb), Err(err)) => cb(Some(err), ManagedValue::Undefined),
        }
    }
}
