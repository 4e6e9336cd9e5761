//! Error types for every phase of binding generation and execution.
//!
//! ## Error Hierarchy
//!
//! ```text
//! BindError (facade wrapper)
//! ├── ParseError        - declaration parsing (with ParseErrorKind)
//! ├── RegistrationError - class registration / document loading / validation
//! ├── PlanError         - execution plans violating the thread boundary
//! ├── ConfigError       - configuration loading
//! └── CallError         - runtime call failures surfaced to managed code
//! ```
//!
//! `CallError` is the taxonomy managed callers observe. Its first four variants
//! are raised before any native call is made.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of declaration parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A character that cannot start any token.
    UnexpectedChar,
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of input.
    UnexpectedEof,
    /// A type was expected.
    ExpectedType,
    /// A name was expected.
    ExpectedIdentifier,
    /// A template argument list was not closed.
    UnterminatedTemplate,
    /// A default value expression could not be read.
    InvalidDefault,
}

impl ParseErrorKind {
    pub fn description(self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedChar => "unexpected character",
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of declaration",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::UnterminatedTemplate => "unterminated template argument list",
            ParseErrorKind::InvalidDefault => "invalid default value",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// A declaration parse error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {detail}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub detail: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, detail: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            detail: detail.into(),
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while registering, flattening or validating classes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    #[error("class '{0}' is already registered")]
    DuplicateClass(String),

    #[error("class '{class}' extends unknown base '{base}'")]
    UnknownBase { class: String, base: String },

    #[error("class '{0}' cannot extend itself")]
    SelfInheritance(String),

    #[error("class '{class}' declares multiple bases ({}); only single inheritance is supported", .bases.join(", "))]
    MultipleInheritance { class: String, bases: Vec<String> },

    #[error("'{context}' refers to unknown class '{name}'")]
    UnknownClass { context: String, name: String },

    #[error("'{context}' refers to undeclared enum '{name}'")]
    UnknownEnum { context: String, name: String },

    #[error("'{function}' has non-contiguous parameter positions: expected {expected}, found {found}")]
    NonContiguousParams {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("'{function}' declares no overloads")]
    EmptyOverloads { function: String },

    #[error("value type '{0}' cannot declare a free function")]
    ValueTypeWithFreeFunction(String),

    #[error("kind tag {tag} is claimed by both '{first}' and '{second}'")]
    DuplicateKindTag {
        tag: u32,
        first: String,
        second: String,
    },

    #[error("in class '{class}': {source}")]
    Declaration {
        class: String,
        #[source]
        source: ParseError,
    },

    #[error("in class '{class}': '{signature}' has unknown option '{key}'")]
    UnknownOption {
        class: String,
        signature: String,
        key: String,
    },

    #[error("invalid declaration document: {0}")]
    Document(String),
}

// ============================================================================
// Plan Errors
// ============================================================================

/// Errors raised when an execution plan violates the thread-boundary contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("{function} ({shape}): stage '{stage}' touches managed values but runs on a worker")]
    ManagedStageOnWorker {
        function: String,
        shape: String,
        stage: String,
    },

    #[error("{function} ({shape}): argument '{arg}' is consumed asynchronously but placed on the stack")]
    StackPlacementEscapes {
        function: String,
        shape: String,
        arg: String,
    },

    #[error("{function} ({shape}): stages out of order at '{stage}'")]
    StageOrder {
        function: String,
        shape: String,
        stage: String,
    },

    #[error("'{function}' has no overloads to plan")]
    NoOverloads { function: String },

    #[error("'{context}' refers to unresolved class '{name}'")]
    UnresolvedClass { context: String, name: String },
}

// ============================================================================
// Config Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(String),

    #[error("worker_threads must be at least 1")]
    NoWorkers,

    #[error("{field} must not be empty")]
    EmptySuffix { field: &'static str },

    #[error("callback and promise suffixes are both '{0}'")]
    SuffixCollision(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

// ============================================================================
// Call Errors
// ============================================================================

/// A failed call as observed by managed code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// No candidate accepts the number of arguments supplied.
    #[error("{function}: expected {expected} arguments, got {got}")]
    ArityMismatch {
        function: String,
        expected: String,
        got: usize,
    },

    /// The only candidate rejected an argument.
    #[error("{function}: argument {position} ('{name}') must be {expected}, got {got}")]
    ArgumentTypeError {
        function: String,
        position: usize,
        name: String,
        expected: String,
        got: String,
    },

    /// Several candidates exist and none of their guards passed.
    #[error("{function}: no matching overload for {got} arguments")]
    NoMatchingOverload { function: String, got: usize },

    /// An array element has the wrong type.
    #[error("{function}: element {index} of argument {position} must be {expected}, got {got}")]
    ArrayElementTypeError {
        function: String,
        position: usize,
        index: usize,
        expected: String,
        got: String,
    },

    /// The kernel reported failure through a sentinel return.
    #[error("Operation {function} failed with error: {message}")]
    NativeOperationFailure {
        function: String,
        code: Option<u32>,
        message: String,
        is_kernel_error: bool,
    },

    /// `cast` requested a kind the object is not.
    #[error("Operation Cast failed: object is a {actual} with family {family} but trying to cast to {requested}")]
    CastMismatch {
        actual: u32,
        family: u32,
        requested: u32,
    },

    /// The native callable failed outright.
    #[error("{function}: {message}")]
    Native { function: String, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CallError {
    /// Raised before any native call was made.
    pub fn is_pre_call(&self) -> bool {
        matches!(
            self,
            CallError::ArityMismatch { .. }
                | CallError::ArgumentTypeError { .. }
                | CallError::NoMatchingOverload { .. }
                | CallError::ArrayElementTypeError { .. }
        )
    }

    /// Reported by the kernel rather than by argument checking.
    pub fn is_kernel_error(&self) -> bool {
        matches!(
            self,
            CallError::NativeOperationFailure {
                is_kernel_error: true,
                ..
            }
        )
    }

    /// The kernel result code, when there is one.
    pub fn code(&self) -> Option<u32> {
        match self {
            CallError::NativeOperationFailure { code, .. } => *code,
            _ => None,
        }
    }
}

// ============================================================================
// Facade Error
// ============================================================================

/// Any error produced while building or running bindings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Call(#[from] CallError),
}
