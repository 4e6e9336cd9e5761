//! JSON declaration documents.
//!
//! A document lists enums, classes and modules in dependency order. Members
//! are native signature strings, parsed when the document is loaded:
//!
//! ```json
//! {
//!   "enums": ["MbeSpaceType"],
//!   "classes": [
//!     { "name": "RefItem", "native_header": "reference_item.h",
//!       "free_function": "DeleteItem", "protected_destructor": true,
//!       "functions": ["refcount_t GetUseCount()"] },
//!     { "name": "SpaceItem", "native_header": "space_item.h", "extends": "RefItem",
//!       "functions": ["MbeSpaceType IsA()",
//!                     { "signature": "MbItem * Cast()", "is_manual": true }] }
//!   ],
//!   "modules": []
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kernelbind_core::{ClassSpec, ParseError, RegistrationError};
use kernelbind_parser::{FunctionOptions, parse_field, parse_function, parse_initializer};

use crate::ClassRegistry;

/// A whole declaration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiDocument {
    pub enums: Vec<String>,
    pub classes: Vec<ClassDeclaration>,
    /// Static-only declarations.
    pub modules: Vec<ClassDeclaration>,
}

/// One base or a list of bases as written in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bases {
    One(String),
    Many(Vec<String>),
}

/// A function as a bare signature or a signature with options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionDeclaration {
    Signature(String),
    Detailed {
        signature: String,
        #[serde(flatten)]
        options: FunctionOptions,
        /// Keys no option claims. Rejected on load.
        #[serde(flatten)]
        unknown: BTreeMap<String, serde_json::Value>,
    },
}

impl FunctionDeclaration {
    fn parts(&self, class: &str) -> Result<(&str, FunctionOptions), RegistrationError> {
        match self {
            FunctionDeclaration::Signature(signature) => Ok((signature, FunctionOptions::default())),
            FunctionDeclaration::Detailed {
                signature,
                options,
                unknown,
            } => match unknown.keys().next() {
                Some(key) => Err(RegistrationError::UnknownOption {
                    class: class.to_string(),
                    signature: signature.clone(),
                    key: key.clone(),
                }),
                None => Ok((signature, options.clone())),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDeclaration {
    /// Managed class name.
    pub name: String,
    /// Defaults to `Mb` + `name`.
    pub native_class_name: Option<String>,
    pub native_header: String,
    pub extends: Option<Bases>,
    #[serde(alias = "is_pod")]
    pub is_value_type: bool,
    pub free_function: Option<String>,
    pub protected_destructor: bool,
    pub kind_tag: Option<u32>,
    pub dependencies: Vec<String>,
    pub initializers: Vec<String>,
    pub fields: Vec<String>,
    pub functions: Vec<FunctionDeclaration>,
}

impl ClassDeclaration {
    fn native_name(&self) -> String {
        self.native_class_name
            .clone()
            .unwrap_or_else(|| format!("Mb{}", self.name))
    }

    /// The single base, rejecting multiple inheritance.
    fn base(&self) -> Result<Option<String>, RegistrationError> {
        match &self.extends {
            None => Ok(None),
            Some(Bases::One(base)) => Ok(Some(base.clone())),
            Some(Bases::Many(bases)) => match bases.as_slice() {
                [] => Ok(None),
                [base] => Ok(Some(base.clone())),
                _ => Err(RegistrationError::MultipleInheritance {
                    class: self.name.clone(),
                    bases: bases.clone(),
                }),
            },
        }
    }
}

impl ApiDocument {
    pub fn from_json_str(source: &str) -> Result<Self, RegistrationError> {
        serde_json::from_str(source).map_err(|e| RegistrationError::Document(e.to_string()))
    }
}

impl ClassRegistry {
    /// Parse every declaration of `document` and register it in order.
    pub fn load_document(&mut self, document: &ApiDocument) -> Result<(), RegistrationError> {
        for name in &document.enums {
            self.declare_enum(name.clone());
        }
        // Names first, so forward references resolve to the right managed names.
        for decl in document.classes.iter().chain(&document.modules) {
            self.predeclare(&decl.native_name(), &decl.name);
        }

        for decl in &document.classes {
            let spec = self.build_class(decl, false)?;
            self.register(spec)?;
        }
        for decl in &document.modules {
            let spec = self.build_class(decl, true)?;
            self.register(spec)?;
        }
        log::debug!(
            "loaded {} classes and {} modules",
            document.classes.len(),
            document.modules.len()
        );
        Ok(())
    }

    fn build_class(
        &self,
        decl: &ClassDeclaration,
        is_module: bool,
    ) -> Result<ClassSpec, RegistrationError> {
        let in_class = |source: ParseError| RegistrationError::Declaration {
            class: decl.name.clone(),
            source,
        };
        let types = self.types();

        let spec = if is_module {
            ClassSpec::module(decl.name.as_str(), decl.native_header.as_str())
        } else {
            ClassSpec::new(decl.name.as_str(), decl.native_header.as_str())
        };
        let mut spec = spec.with_native_name(decl.native_name());

        spec.extends = decl.base()?;
        spec.is_value_type = decl.is_value_type;
        spec.free_function = decl.free_function.clone();
        spec.protected_destructor = decl.protected_destructor;
        spec.kind_tag = decl.kind_tag;
        spec.dependencies = decl.dependencies.clone();

        for init in &decl.initializers {
            spec.initializers
                .push(parse_initializer(init, types).map_err(in_class)?);
        }
        for field in &decl.fields {
            spec.fields.push(parse_field(field, types).map_err(in_class)?);
        }
        for function in &decl.functions {
            let (signature, mut options) = function.parts(&decl.name)?;
            options.is_static |= is_module;
            let parsed = parse_function(signature, &options, types).map_err(in_class)?;
            // Repeated names are overloads, kept in declaration order.
            match spec
                .functions
                .iter_mut()
                .find(|f| f.managed_name == parsed.managed_name)
            {
                Some(existing) => existing.overloads.extend(parsed.overloads),
                None => spec.functions.push(parsed),
            }
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernelbind_core::{ManagedType, ParseErrorKind, ReturnKind};

    const DOC: &str = r#"{
        "enums": ["MbeSpaceType"],
        "classes": [
            { "name": "RefItem", "native_header": "reference_item.h",
              "free_function": "DeleteItem", "protected_destructor": true,
              "functions": ["refcount_t GetUseCount()"] },
            { "name": "SpaceItem", "native_header": "space_item.h", "extends": "RefItem",
              "functions": [
                "MbeSpaceType IsA()",
                { "signature": "MbItem * Cast()", "is_manual": true },
                "void Move(const MbVector3D & v, MbRegTransform * iReg = NULL)"
              ] },
            { "name": "Vector3D", "native_header": "mb_vector3d.h", "is_pod": true,
              "initializers": ["double a, double b, double c"],
              "fields": ["double x", "double y", "double z"] },
            { "name": "RegTransform", "native_header": "name_item.h" }
        ],
        "modules": [
            { "name": "ActionSolid", "native_header": "action_solid.h",
              "functions": [
                { "signature": "MbResultType ElementarySolid(const SArray<MbCartPoint3D> & points, MbSolid *& result)",
                  "return": { "name": "solid" } }
              ] }
        ]
    }"#;

    #[test]
    fn loads_classes_and_modules() {
        let doc = ApiDocument::from_json_str(DOC).unwrap();
        let mut registry = ClassRegistry::new();
        registry.load_document(&doc).unwrap();

        let space = registry.get("SpaceItem").unwrap();
        assert_eq!(space.native_class_name, "MbSpaceItem");
        let names: Vec<_> = space.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["IsA", "Cast", "Move", "GetUseCount"]);
        assert_eq!(space.free_function.as_deref(), Some("DeleteItem"));

        let vector = registry.get("Vector3D").unwrap();
        assert!(vector.is_value_type);
        assert_eq!(vector.fields.len(), 3);

        let module = registry.get("ActionSolid").unwrap();
        assert!(module.is_module);
        let f = &module.functions[0];
        assert!(f.is_static);
        assert_eq!(f.overloads[0].return_kind, ReturnKind::ErrorCode);
        assert_eq!(
            f.overloads[0].returns[0].managed_type,
            ManagedType::ObjectOf("Solid".into())
        );
    }

    #[test]
    fn repeated_names_become_overloads() {
        let doc = ApiDocument::from_json_str(
            r#"{ "classes": [
                { "name": "Curve3D", "native_header": "curve3d.h",
                  "functions": [
                    "double PointOn(double t)",
                    "void Move(const MbVector3D & v)",
                    "double PointOn(double t, bool clamp)"
                  ] },
                { "name": "Vector3D", "native_header": "mb_vector3d.h", "is_pod": true }
            ] }"#,
        )
        .unwrap();
        let mut registry = ClassRegistry::new();
        registry.load_document(&doc).unwrap();
        let curve = registry.get("Curve3D").unwrap();
        assert_eq!(curve.functions.len(), 2);
        let point_on = curve.function("PointOn").unwrap();
        assert!(point_on.is_overloaded());
        assert_eq!(point_on.overloads[1].arity(), 2);
    }

    #[test]
    fn multiple_inheritance_is_rejected() {
        let doc = ApiDocument::from_json_str(
            r#"{ "classes": [
                { "name": "A", "native_header": "a.h" },
                { "name": "B", "native_header": "b.h" },
                { "name": "Item", "native_header": "model_item.h", "extends": ["A", "B"] }
            ] }"#,
        )
        .unwrap();
        let mut registry = ClassRegistry::new();
        let err = registry.load_document(&doc).unwrap_err();
        assert!(matches!(err, RegistrationError::MultipleInheritance { ref bases, .. } if bases.len() == 2));
    }

    #[test]
    fn parse_errors_name_the_class() {
        let doc = ApiDocument::from_json_str(
            r#"{ "classes": [ { "name": "Bad", "native_header": "bad.h", "functions": ["void Move(double"] } ] }"#,
        )
        .unwrap();
        let err = ClassRegistry::new().load_document(&doc).unwrap_err();
        match err {
            RegistrationError::Declaration { class, source } => {
                assert_eq!(class, "Bad");
                assert_eq!(source.kind, ParseErrorKind::ExpectedIdentifier);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn misspelled_options_are_rejected() {
        let doc = ApiDocument::from_json_str(
            r#"{ "classes": [ { "name": "Item", "native_header": "model_item.h",
                "functions": [ { "signature": "void Move(double d)", "is_manul": true } ] } ] }"#,
        )
        .unwrap();
        let err = ClassRegistry::new().load_document(&doc).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::UnknownOption { ref class, ref key, .. }
                if class == "Item" && key == "is_manul"
        ));

        for options in [
            r#""params": { "d": { "is_nulable": true } }"#,
            r#""return": { "nmae": "item" }"#,
        ] {
            let source = format!(
                r#"{{ "classes": [ {{ "name": "Item", "native_header": "model_item.h",
                    "functions": [ {{ "signature": "double Move(double d)", {options} }} ] }} ] }}"#
            );
            assert!(matches!(
                ApiDocument::from_json_str(&source),
                Err(RegistrationError::Document(_))
            ));
        }
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            ApiDocument::from_json_str("{ \"classes\": 3 }"),
            Err(RegistrationError::Document(_))
        ));
    }
}
