//! ClassRegistry - the validated, flattened set of wrapped classes.
//!
//! # Registration Model
//!
//! Classes are registered in declaration order; a base must be registered
//! before anything that extends it. On registration a derived class is
//! flattened:
//!
//! - the base's non-manual, inheritable functions are appended unless the
//!   derived class declares a function with the same name;
//! - the base's fields are appended unless shadowed;
//! - the base's free function is inherited when none is declared.
//!
//! Because each base was flattened when it was registered, one level of
//! copying carries members down the whole chain.
//!
//! # Thread Safety
//!
//! The registry is built single-threaded and read-only afterwards; share it
//! behind an `Arc` once registration is complete.

use rustc_hash::{FxHashMap, FxHashSet};

use kernelbind_core::{ArgSpec, ClassSpec, ManagedType, RegistrationError, TypeHash};
use kernelbind_parser::TypeTable;

use crate::inheritance::InheritanceGraph;

#[derive(Debug, Default)]
pub struct ClassRegistry {
    /// Classes in registration order.
    classes: Vec<ClassSpec>,
    by_name: FxHashMap<String, usize>,
    by_hash: FxHashMap<TypeHash, usize>,
    /// Number of functions each class declared itself, before flattening.
    own_functions: FxHashMap<String, usize>,
    graph: InheritanceGraph,
    enums: FxHashSet<String>,
    /// Native kind tag to concrete class, for `cast`.
    cast_table: FxHashMap<u32, String>,
    types: TypeTable,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    pub fn declare_enum(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.types.add_enum(name.clone());
        self.enums.insert(name);
    }

    /// Register a class, flattening it against its base.
    pub fn register(&mut self, mut spec: ClassSpec) -> Result<TypeHash, RegistrationError> {
        let name = spec.managed_class_name.clone();
        if self.by_name.contains_key(&name) {
            return Err(RegistrationError::DuplicateClass(name));
        }

        if let Some(base) = spec.extends.clone() {
            if base == name {
                return Err(RegistrationError::SelfInheritance(name));
            }
            let Some(base_spec) = self.get(&base) else {
                return Err(RegistrationError::UnknownBase { class: name, base });
            };
            flatten(&mut spec, base_spec);
        }

        if let Some(tag) = spec.kind_tag {
            if let Some(first) = self.cast_table.get(&tag) {
                return Err(RegistrationError::DuplicateKindTag {
                    tag,
                    first: first.clone(),
                    second: name,
                });
            }
        }

        let own = spec.functions.len();
        let hash = spec.hash();
        self.graph.add_class(&name);
        if let Some(base) = &spec.extends {
            self.graph.set_base(&name, base);
        }
        if let Some(tag) = spec.kind_tag {
            self.cast_table.insert(tag, name.clone());
        }
        self.types
            .add_class(spec.native_class_name.clone(), name.clone());

        log::debug!(
            "registered class {} ({} functions, base {:?})",
            name,
            spec.functions.len(),
            spec.extends
        );

        let index = self.classes.len();
        self.by_name.insert(name.clone(), index);
        self.by_hash.insert(hash, index);
        self.own_functions.insert(name, own);
        self.classes.push(spec);
        Ok(hash)
    }

    /// Make a class name resolvable before the class itself is registered.
    pub(crate) fn predeclare(&mut self, native: &str, managed: &str) {
        self.types.add_class(native, managed);
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn get(&self, name: &str) -> Option<&ClassSpec> {
        self.by_name.get(name).map(|&i| &self.classes[i])
    }

    pub fn get_by_hash(&self, hash: TypeHash) -> Option<&ClassSpec> {
        self.by_hash.get(&hash).map(|&i| &self.classes[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Classes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassSpec> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains(name)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Functions a class declared itself, excluding inherited ones.
    pub fn own_function_count(&self, name: &str) -> usize {
        self.own_functions.get(name).copied().unwrap_or(0)
    }

    // ==========================================================================
    // Inheritance
    // ==========================================================================

    pub fn is_base_of(&self, base: &str, derived: &str) -> bool {
        self.graph.is_base_of(base, derived)
    }

    /// `instanceof`: the class itself or any descendant.
    pub fn is_a(&self, class: &str, target: &str) -> bool {
        self.graph.is_a(class, target)
    }

    /// Ancestors, nearest first.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        self.graph.ancestors(name)
    }

    pub fn base_of(&self, name: &str) -> Option<&str> {
        self.graph.base_of(name)
    }

    pub fn graph(&self) -> &InheritanceGraph {
        &self.graph
    }

    // ==========================================================================
    // Cast table
    // ==========================================================================

    /// The concrete class wrapping objects of a native kind.
    pub fn cast_target(&self, kind_tag: u32) -> Option<&ClassSpec> {
        self.cast_table.get(&kind_tag).and_then(|name| self.get(name))
    }

    pub fn cast_table(&self) -> &FxHashMap<u32, String> {
        &self.cast_table
    }

    // ==========================================================================
    // Validation
    // ==========================================================================

    /// Check schema invariants across all registered classes.
    ///
    /// Manual functions are skipped; they are not generated.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        for class in &self.classes {
            let name = &class.managed_class_name;
            if class.is_value_type && class.free_function.is_some() {
                return Err(RegistrationError::ValueTypeWithFreeFunction(name.clone()));
            }

            for field in &class.fields {
                let context = format!("{name}.{}", field.name());
                self.check_arg(&context, &field.arg)?;
            }

            for (i, init) in class.initializers.iter().enumerate() {
                let context = format!("{name}#init{i}");
                check_positions(&context, &init.params)?;
                for arg in &init.params {
                    self.check_arg(&context, arg)?;
                }
            }

            for function in class.functions.iter().filter(|f| !f.is_manual) {
                let context = format!("{name}.{}", function.name);
                if function.overloads.is_empty() {
                    return Err(RegistrationError::EmptyOverloads { function: context });
                }
                for overload in &function.overloads {
                    check_positions(&context, &overload.params)?;
                    for arg in overload.params.iter().chain(&overload.returns) {
                        self.check_arg(&context, arg)?;
                    }
                }
            }
        }
        log::debug!("validated {} classes", self.classes.len());
        Ok(())
    }

    fn check_arg(&self, context: &str, arg: &ArgSpec) -> Result<(), RegistrationError> {
        self.check_type(context, &arg.managed_type)?;
        if let Some(element) = &arg.element_type {
            self.check_type(context, &element.managed_type)?;
        }
        Ok(())
    }

    fn check_type(&self, context: &str, ty: &ManagedType) -> Result<(), RegistrationError> {
        match ty {
            ManagedType::ObjectOf(class) if !self.contains(class) => {
                Err(RegistrationError::UnknownClass {
                    context: context.to_string(),
                    name: class.clone(),
                })
            }
            ManagedType::Enum(name) if !self.is_enum(name) => Err(RegistrationError::UnknownEnum {
                context: context.to_string(),
                name: name.clone(),
            }),
            ManagedType::ArrayOf(element) => self.check_type(context, element),
            _ => Ok(()),
        }
    }
}

/// Managed positions must be exactly `0..n`.
fn check_positions(context: &str, params: &[ArgSpec]) -> Result<(), RegistrationError> {
    for (expected, arg) in params.iter().enumerate() {
        if arg.position != expected {
            return Err(RegistrationError::NonContiguousParams {
                function: context.to_string(),
                expected,
                found: arg.position,
            });
        }
    }
    Ok(())
}

/// Copy inheritable members of `base` into `derived`.
fn flatten(derived: &mut ClassSpec, base: &ClassSpec) {
    let own: FxHashSet<String> = derived.functions.iter().map(|f| f.name.clone()).collect();
    let inherited = base
        .functions
        .iter()
        .filter(|f| !f.is_manual && !f.is_uninheritable && !own.contains(&f.name))
        .cloned();
    derived.functions.extend(inherited);

    let own_fields: FxHashSet<String> = derived.fields.iter().map(|f| f.name().to_string()).collect();
    let fields = base
        .fields
        .iter()
        .filter(|f| !own_fields.contains(f.name()))
        .cloned();
    derived.fields.extend(fields);

    if derived.free_function.is_none() {
        derived.free_function = base.free_function.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernelbind_core::{FieldSpec, FunctionSpec, NumericKind, OverloadSpec};

    fn number(name: &str, position: usize) -> ArgSpec {
        ArgSpec::new(name, "double", ManagedType::Number(NumericKind::Double), position)
    }

    fn func(name: &str) -> FunctionSpec {
        FunctionSpec::new(name, OverloadSpec::default())
    }

    fn hierarchy() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry
            .register(
                ClassSpec::new("RefItem", "reference_item.h")
                    .with_free_function("DeleteItem")
                    .with_protected_destructor()
                    .with_function(func("GetUseCount"))
                    .with_function(func("AddRef").uninheritable()),
            )
            .unwrap();
        registry
            .register(
                ClassSpec::new("SpaceItem", "space_item.h")
                    .extends("RefItem")
                    .with_function(func("IsA"))
                    .with_function(func("Cast").manual())
                    .with_field(FieldSpec::new(number("tolerance", 0))),
            )
            .unwrap();
        registry
            .register(
                ClassSpec::new("Solid", "solid.h")
                    .extends("SpaceItem")
                    .with_kind_tag(3001)
                    .with_function(func("IsA")),
            )
            .unwrap();
        registry
    }

    #[test]
    fn flattening_copies_inheritable_functions() {
        let registry = hierarchy();
        let solid = registry.get("Solid").unwrap();
        let names: Vec<_> = solid.functions.iter().map(|f| f.name.as_str()).collect();
        // Own IsA shadows the inherited one; Cast is manual; AddRef is uninheritable.
        assert_eq!(names, ["IsA", "GetUseCount"]);
        assert_eq!(solid.fields.len(), 1);
        assert_eq!(solid.free_function.as_deref(), Some("DeleteItem"));
        assert!(!solid.protected_destructor);
        assert!(solid.has_owning_destructor());
        assert_eq!(registry.own_function_count("Solid"), 1);
    }

    #[test]
    fn rejects_bad_registrations() {
        let mut registry = hierarchy();
        assert_eq!(
            registry.register(ClassSpec::new("Solid", "solid.h")),
            Err(RegistrationError::DuplicateClass("Solid".into()))
        );
        assert!(matches!(
            registry.register(ClassSpec::new("Loop", "x.h").extends("Loop")),
            Err(RegistrationError::SelfInheritance(_))
        ));
        assert!(matches!(
            registry.register(ClassSpec::new("Face", "x.h").extends("Shell")),
            Err(RegistrationError::UnknownBase { .. })
        ));
        assert!(matches!(
            registry.register(ClassSpec::new("Other", "x.h").with_kind_tag(3001)),
            Err(RegistrationError::DuplicateKindTag { tag: 3001, .. })
        ));
        assert!(!registry.contains("Other"));
    }

    #[test]
    fn inheritance_queries() {
        let registry = hierarchy();
        assert!(registry.is_base_of("RefItem", "Solid"));
        assert!(registry.is_a("Solid", "SpaceItem"));
        assert!(!registry.is_a("SpaceItem", "Solid"));
        assert_eq!(registry.ancestors("Solid"), ["SpaceItem", "RefItem"]);
        assert_eq!(registry.cast_target(3001).unwrap().managed_class_name, "Solid");
        assert!(registry.cast_target(1).is_none());
    }

    #[test]
    fn validate_reports_unknown_classes_and_enums() {
        let mut registry = hierarchy();
        registry
            .register(ClassSpec::new("Model", "model.h").with_function(FunctionSpec::new(
                "AddItem",
                OverloadSpec::new(vec![ArgSpec::new(
                    "item",
                    "MbItem",
                    ManagedType::ObjectOf("Item".into()),
                    0,
                )]),
            )))
            .unwrap();
        assert!(matches!(
            registry.validate(),
            Err(RegistrationError::UnknownClass { ref name, .. }) if name == "Item"
        ));

        let mut registry = ClassRegistry::new();
        registry
            .register(ClassSpec::new("Solid", "solid.h").with_function(FunctionSpec::new(
                "IsA",
                OverloadSpec::default().with_return(ArgSpec::new(
                    "_result",
                    "MbeSpaceType",
                    ManagedType::Enum("MbeSpaceType".into()),
                    0,
                )),
            )))
            .unwrap();
        assert!(matches!(registry.validate(), Err(RegistrationError::UnknownEnum { .. })));
        registry.declare_enum("MbeSpaceType");
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn validate_checks_positions_and_value_types() {
        let mut registry = ClassRegistry::new();
        registry
            .register(ClassSpec::new("Cube", "mb_cube.h").with_initializer(OverloadSpec::new(vec![
                number("a", 0),
                number("b", 2),
            ])))
            .unwrap();
        assert!(matches!(
            registry.validate(),
            Err(RegistrationError::NonContiguousParams { expected: 1, found: 2, .. })
        ));

        let mut registry = ClassRegistry::new();
        registry
            .register(
                ClassSpec::new("CartPoint3D", "mb_cart_point3d.h")
                    .value_type()
                    .with_free_function("Free"),
            )
            .unwrap();
        assert!(matches!(
            registry.validate(),
            Err(RegistrationError::ValueTypeWithFreeFunction(_))
        ));
    }
}
