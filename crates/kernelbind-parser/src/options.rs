//! Per-declaration options that annotate a signature string.
//!
//! In a declaration document a function is either a bare signature string or
//! an object carrying the signature plus these options:
//!
//! ```json
//! {
//!   "signature": "const MbItem * GetItemByName(SimpleName n, MbPath & path, MbMatrix3D & from)",
//!   "params": { "path": { "is_return": true }, "from": { "is_return": true } },
//!   "return": { "name": "item" }
//! }
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Options for one parameter, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamOptions {
    /// Treat a reference parameter as an out-parameter.
    pub is_return: bool,
    /// Treat a `*&` parameter as an input pointer.
    pub is_input: bool,
    pub is_nullable: bool,
    /// The callee keeps a reference to the object.
    pub is_owning: bool,
}

/// Options for the primary return value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReturnOptions {
    /// Name used as the record key when there are several returns.
    pub name: Option<String>,
    /// A `bool` return is a success flag, not a value.
    pub is_error_bool: bool,
    /// Drop the native return value.
    pub ignore: bool,
    /// Override whether the returned storage is call-local.
    pub is_on_stack: Option<bool>,
}

/// Options for one function declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionOptions {
    pub managed_name: Option<String>,
    pub is_manual: bool,
    pub is_uninheritable: bool,
    pub is_static: bool,
    pub params: FxHashMap<String, ParamOptions>,
    #[serde(rename = "return")]
    pub return_options: ReturnOptions,
}

impl FunctionOptions {
    pub fn param(&self, name: &str) -> Option<&ParamOptions> {
        self.params.get(name)
    }

    pub fn with_param(mut self, name: impl Into<String>, options: ParamOptions) -> Self {
        self.params.insert(name.into(), options);
        self
    }

    pub fn returning(mut self, name: impl Into<String>) -> Self {
        self.return_options.name = Some(name.into());
        self
    }
}

impl ParamOptions {
    pub fn out() -> Self {
        Self {
            is_return: true,
            ..Self::default()
        }
    }

    pub fn input() -> Self {
        Self {
            is_input: true,
            ..Self::default()
        }
    }

    pub fn nullable() -> Self {
        Self {
            is_nullable: true,
            ..Self::default()
        }
    }

    pub fn owning() -> Self {
        Self {
            is_owning: true,
            ..Self::default()
        }
    }
}
