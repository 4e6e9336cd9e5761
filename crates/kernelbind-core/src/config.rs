//! Generation and runtime configuration.
//!
//! ```toml
//! worker_threads = 4
//! success_code = 0
//! warn_on_null_elements = true
//! callback_suffix = "_callback"
//! promise_suffix = "_async"
//! shapes = "SYNC | PROMISE"
//! ```
//!
//! Every key is optional; missing keys take their [`Default`] values.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ResultCode};

bitflags! {
    /// Execution shapes to emit for each function.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ExecutionShapes: u8 {
        /// Blocking call returning the result or raising.
        const SYNC = 1 << 0;
        /// Worker call delivering `(error, result)` to a trailing callback.
        const CALLBACK = 1 << 1;
        /// Worker call settling a promise.
        const PROMISE = 1 << 2;

        const ASYNC = Self::CALLBACK.bits() | Self::PROMISE.bits();
    }
}

impl Default for ExecutionShapes {
    fn default() -> Self {
        ExecutionShapes::all()
    }
}

/// Configuration shared by the planner and the reference runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindgenConfig {
    /// Worker pool size; `None` uses the number of CPUs.
    pub worker_threads: Option<usize>,
    /// Result code that denotes success for `ErrorCode` returns.
    pub success_code: u32,
    /// Log skipped null array elements.
    pub warn_on_null_elements: bool,
    pub callback_suffix: String,
    pub promise_suffix: String,
    pub shapes: ExecutionShapes,
}

impl Default for BindgenConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            success_code: ResultCode::Success.code(),
            warn_on_null_elements: true,
            callback_suffix: "_callback".to_string(),
            promise_suffix: "_async".to_string(),
            shapes: ExecutionShapes::default(),
        }
    }
}

impl BindgenConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: BindgenConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == Some(0) {
            return Err(ConfigError::NoWorkers);
        }
        if self.callback_suffix.is_empty() {
            return Err(ConfigError::EmptySuffix {
                field: "callback_suffix",
            });
        }
        if self.promise_suffix.is_empty() {
            return Err(ConfigError::EmptySuffix {
                field: "promise_suffix",
            });
        }
        if self.callback_suffix == self.promise_suffix {
            return Err(ConfigError::SuffixCollision(self.callback_suffix.clone()));
        }
        Ok(())
    }

    // === Builder Methods ===

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_success_code(mut self, code: u32) -> Self {
        self.success_code = code;
        self
    }

    pub fn with_shapes(mut self, shapes: ExecutionShapes) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn quiet_null_elements(mut self) -> Self {
        self.warn_on_null_elements = false;
        self
    }
}
