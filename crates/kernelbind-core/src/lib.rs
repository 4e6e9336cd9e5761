//! Core types shared by every kernelbind crate.
//!
//! ## Modules
//!
//! - [`schema`]: the declarative class/function/argument schema consumed by code generation
//! - [`type_hash`]: deterministic identities for classes, functions and overloads
//! - [`error`]: the error taxonomy for registration, parsing, planning and calls
//! - [`result_code`]: the kernel's result-code table and its messages
//! - [`config`]: generator and runtime configuration

pub mod config;
pub mod error;
pub mod result_code;
pub mod schema;
pub mod span;
pub mod type_hash;

pub use config::{BindgenConfig, ExecutionShapes};
pub use error::{
    BindError, CallError, ConfigError, ParseError, ParseErrorKind, PlanError, RegistrationError,
};
pub use result_code::ResultCode;
pub use schema::{
    ArgSpec, ClassSpec, FieldSpec, FunctionSpec, ManagedType, NumericKind, OverloadSpec, PassBy,
    ReturnKind, StringKind,
};
pub use span::Span;
pub use type_hash::TypeHash;
