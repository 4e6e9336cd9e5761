//! The declarative binding schema.
//!
//! A schema is authored once and is an immutable input to code generation:
//!
//! ```text
//! ClassSpec
//! ├── FieldSpec*        - native data members exposed as accessors
//! ├── FunctionSpec*     - methods / statics
//! │   └── OverloadSpec+ - one per native signature, in declaration order
//! │       ├── ArgSpec*  - managed parameters
//! │       └── ArgSpec*  - returns (primary return + out-parameters)
//! └── OverloadSpec*     - initializers (constructor overloads)
//! ```
//!
//! The entities these describe (wrappers, native objects) have runtime
//! lifecycles; the schema values themselves do not.

mod arg;
mod class;
mod function;
mod managed_type;

pub use arg::{ArgSpec, PassBy};
pub use class::{ClassSpec, FieldSpec};
pub use function::{FunctionSpec, OverloadSpec, ReturnKind};
pub use managed_type::{ManagedType, NumericKind, StringKind};
