//! Declaration parser for native kernel signatures.
//!
//! Turns signature strings as they appear in kernel headers into schema
//! descriptors:
//!
//! ```
//! use kernelbind_parser::{parse_function, FunctionOptions, TypeTable};
//!
//! let types = TypeTable::new();
//! let f = parse_function(
//!     "void Move(const MbVector3D & v, MbRegTransform * iReg = NULL)",
//!     &FunctionOptions::default(),
//!     &types,
//! )
//! .unwrap();
//! assert_eq!(f.overloads[0].required_arity(), 1);
//! ```

pub mod lexer;
pub mod options;
mod parser;
pub mod types;

pub use options::{FunctionOptions, ParamOptions, ReturnOptions};
pub use parser::{parse_field, parse_function, parse_initializer};
pub use types::{ContainerKind, Indirection, TypeRef, TypeTable};
