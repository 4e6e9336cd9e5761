//! Generation context: configuration plus the class registry.
//!
//! # Example
//!
//! ```
//! use kernelbind::Context;
//!
//! let ctx = Context::from_json(r#"{
//!     "classes": [
//!         { "name": "Curve3D", "native_header": "curve3d.h",
//!           "functions": ["double GetTMax()"] }
//!     ]
//! }"#).unwrap();
//! let plans = ctx.compile().unwrap();
//! assert_eq!(plans[0].registration.instance_methods, ["GetTMax", "GetTMax_callback", "GetTMax_async"]);
//! ```

use std::sync::Arc;

use kernelbind_compiler::{ClassPlan, Compiler};
use kernelbind_core::{BindError, BindgenConfig, ClassSpec, TypeHash};
use kernelbind_registry::{ApiDocument, ClassRegistry};
use kernelbind_runtime::NativeLibrary;

use crate::Bindings;

/// Owns the configuration and the registry that plans are compiled from.
#[derive(Debug, Default)]
pub struct Context {
    config: BindgenConfig,
    registry: ClassRegistry,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context holding every declaration of `document`.
    pub fn from_document(document: &ApiDocument) -> Result<Self, BindError> {
        let mut ctx = Self::new();
        ctx.load_document(document)?;
        Ok(ctx)
    }

    /// A context holding every declaration of a JSON document.
    pub fn from_json(source: &str) -> Result<Self, BindError> {
        Self::from_document(&ApiDocument::from_json_str(source)?)
    }

    pub fn with_config(mut self, config: BindgenConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BindgenConfig {
        &self.config
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn load_document(&mut self, document: &ApiDocument) -> Result<(), BindError> {
        self.registry.load_document(document)?;
        Ok(())
    }

    pub fn register(&mut self, spec: ClassSpec) -> Result<TypeHash, BindError> {
        Ok(self.registry.register(spec)?)
    }

    /// Check the configuration and the registered schema.
    pub fn validate(&self) -> Result<(), BindError> {
        self.config.validate()?;
        self.registry.validate()?;
        Ok(())
    }

    /// Validate, then plan every registered class.
    pub fn compile(&self) -> Result<Vec<ClassPlan>, BindError> {
        self.validate()?;
        let plans = Compiler::new(&self.registry, &self.config).compile_all()?;
        log::info!("compiled {} classes", plans.len());
        Ok(plans)
    }

    pub fn compile_class(&self, name: &str) -> Result<ClassPlan, BindError> {
        self.validate()?;
        Ok(Compiler::new(&self.registry, &self.config).compile_class(name)?)
    }

    /// Compile every class and bind the plans to `library`.
    pub fn bind(&self, library: Arc<dyn NativeLibrary>) -> Result<Bindings, BindError> {
        Bindings::new(self.compile()?, library, self.config.clone())
    }
}
