//! Compiles registered classes into [`ClassPlan`]s.

use kernelbind_core::{BindgenConfig, ClassSpec, PlanError, ReturnKind, TypeHash};
use kernelbind_registry::ClassRegistry;

use crate::class_plan::{AccessorPlan, ClassPlan, ConstructorPlan, RegistrationPlan, UnwrapPlan};
use crate::conversion::Consumer;
use crate::overload::build_dispatch;
use crate::ownership::OwnershipPlan;
use crate::planner::{ExecutionPlanner, FunctionPlan};

pub struct Compiler<'r> {
    registry: &'r ClassRegistry,
    config: &'r BindgenConfig,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r ClassRegistry, config: &'r BindgenConfig) -> Self {
        Self { registry, config }
    }

    /// Compile every registered class, in registration order.
    pub fn compile_all(&self) -> Result<Vec<ClassPlan>, PlanError> {
        self.registry.iter().map(|spec| self.compile_spec(spec)).collect()
    }

    /// Compile one class by managed name.
    pub fn compile_class(&self, name: &str) -> Result<ClassPlan, PlanError> {
        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| PlanError::UnresolvedClass {
                context: "compile".to_string(),
                name: name.to_string(),
            })?;
        self.compile_spec(spec)
    }

    fn compile_spec(&self, spec: &ClassSpec) -> Result<ClassPlan, PlanError> {
        let planner = ExecutionPlanner::new(self.registry, self.config);
        let hash = spec.hash();

        let functions = spec
            .functions
            .iter()
            .filter(|f| !f.is_manual)
            .map(|f| planner.plan_function(hash, f))
            .collect::<Result<Vec<_>, _>>()?;

        let accessors = spec
            .fields
            .iter()
            .map(|field| {
                Ok(AccessorPlan {
                    name: field.name().to_string(),
                    read_only: field.read_only,
                    conversion: planner.resolver().resolve(&field.arg, Consumer::Sync)?,
                })
            })
            .collect::<Result<Vec<_>, PlanError>>()?;

        let constructor = if spec.is_module || spec.initializers.is_empty() {
            None
        } else {
            Some(self.plan_constructor(&planner, spec, hash)?)
        };

        let registration = registration(&functions, &accessors);
        let accepts = self
            .registry
            .iter()
            .filter(|other| self.registry.is_a(&other.managed_class_name, &spec.managed_class_name))
            .map(|other| other.managed_class_name.clone())
            .collect();

        log::debug!(
            "compiled {}: {} functions, {} accessors, constructor: {}",
            spec.managed_class_name,
            functions.len(),
            accessors.len(),
            constructor.is_some()
        );

        Ok(ClassPlan {
            class: spec.managed_class_name.clone(),
            native_class_name: spec.native_class_name.clone(),
            native_header: spec.native_header.clone(),
            hash,
            is_module: spec.is_module,
            kind_tag: spec.kind_tag,
            ownership: OwnershipPlan::for_class(self.registry, spec)?,
            registration,
            constructor,
            functions,
            accessors,
            unwrap: UnwrapPlan {
                class: spec.managed_class_name.clone(),
                accepts,
            },
        })
    }

    fn plan_constructor(
        &self,
        planner: &ExecutionPlanner<'_>,
        spec: &ClassSpec,
        hash: TypeHash,
    ) -> Result<ConstructorPlan, PlanError> {
        let dispatch = build_dispatch(&spec.managed_class_name, &spec.initializers)?;
        let overloads = spec
            .initializers
            .iter()
            .enumerate()
            .map(|(index, init)| {
                let mut plan = planner.plan_overload(
                    &spec.managed_class_name,
                    TypeHash::from_initializer(hash, index),
                    index,
                    init,
                )?;
                plan.result.kind = ReturnKind::Void;
                Ok(plan)
            })
            .collect::<Result<Vec<_>, PlanError>>()?;
        Ok(ConstructorPlan {
            dispatch,
            overloads,
        })
    }
}

fn registration(functions: &[FunctionPlan], accessors: &[AccessorPlan]) -> RegistrationPlan {
    let mut plan = RegistrationPlan::default();
    for function in functions {
        let names = function.shapes.iter().map(|s| s.entry_name.clone());
        if function.is_static {
            plan.static_methods.extend(names);
        } else {
            plan.instance_methods.extend(names);
        }
    }
    plan.accessors = accessors.iter().map(|a| a.name.clone()).collect();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::DestructorPlan;
    use crate::planner::Shape;
    use kernelbind_registry::ApiDocument;

    const DOC: &str = r#"{
        "enums": ["MbeSpaceType"],
        "classes": [
            { "name": "RefItem", "native_header": "reference_item.h",
              "free_function": "DeleteItem",
              "functions": ["refcount_t GetUseCount()"] },
            { "name": "SpaceItem", "native_header": "space_item.h", "extends": "RefItem",
              "kind_tag": 1,
              "functions": [
                "MbeSpaceType IsA()",
                { "signature": "MbItem * Cast()", "is_manual": true },
                "void Move(const MbVector3D & v, MbRegTransform * iReg = NULL)"
              ] },
            { "name": "Solid", "native_header": "solid.h", "extends": "SpaceItem", "kind_tag": 2 },
            { "name": "Vector3D", "native_header": "mb_vector3d.h", "is_pod": true,
              "initializers": ["double a, double b, double c", "const MbVector3D & other"],
              "fields": ["double x", "double y", "double z"] },
            { "name": "RegTransform", "native_header": "name_item.h" },
            { "name": "CartPoint3D", "native_header": "mb_cart_point3d.h", "is_pod": true }
        ],
        "modules": [
            { "name": "ActionSolid", "native_header": "action_solid.h",
              "functions": [
                { "signature": "MbResultType ElementarySolid(const SArray<MbCartPoint3D> & points, MbSolid *& result)",
                  "return": { "name": "solid" } }
              ] }
        ]
    }"#;

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        let doc = ApiDocument::from_json_str(DOC).unwrap();
        registry.load_document(&doc).unwrap();
        registry
    }

    #[test]
    fn manual_functions_are_skipped() {
        let registry = registry();
        let config = BindgenConfig::default();
        let plan = Compiler::new(&registry, &config).compile_class("SpaceItem").unwrap();
        assert!(plan.function("Cast").is_none());
        assert!(plan.function("Move").is_some());
        // Inherited from RefItem.
        assert!(plan.function("GetUseCount").is_some());
        assert_eq!(
            plan.registration.instance_methods[..3],
            ["IsA", "IsA_callback", "IsA_async"]
        );
    }

    #[test]
    fn value_types_get_constructor_and_accessors() {
        let registry = registry();
        let config = BindgenConfig::default();
        let plan = Compiler::new(&registry, &config).compile_class("Vector3D").unwrap();
        let ctor = plan.constructor.as_ref().unwrap();
        assert_eq!(ctor.overloads.len(), 2);
        assert_eq!(ctor.dispatch.arity_labels(), ["3", "1"]);
        assert_eq!(plan.registration.accessors, ["x", "y", "z"]);
        assert_eq!(plan.destructor(), &DestructorPlan::None);
    }

    #[test]
    fn modules_register_static_methods() {
        let registry = registry();
        let config = BindgenConfig::default();
        let plan = Compiler::new(&registry, &config).compile_class("ActionSolid").unwrap();
        assert!(plan.is_module);
        assert!(plan.constructor.is_none());
        assert_eq!(
            plan.registration.static_methods,
            ["ElementarySolid", "ElementarySolid_callback", "ElementarySolid_async"]
        );
        let f = plan.function("ElementarySolid").unwrap();
        assert!(f.shape(Shape::Promise).is_some());
        assert_eq!(f.overloads[0].result.kind, ReturnKind::ErrorCode);
    }

    #[test]
    fn unwrap_accepts_derived_wrappers() {
        let registry = registry();
        let config = BindgenConfig::default();
        let plan = Compiler::new(&registry, &config).compile_class("RefItem").unwrap();
        assert!(plan.unwrap.accepts("Solid"));
        assert!(plan.unwrap.accepts("RefItem"));
        assert!(!plan.unwrap.accepts("Vector3D"));
        assert_eq!(plan.destructor(), &DestructorPlan::FreeFunction("DeleteItem".into()));
    }

    #[test]
    fn compile_all_covers_the_registry() {
        let registry = registry();
        let config = BindgenConfig::default();
        let plans = Compiler::new(&registry, &config).compile_all().unwrap();
        assert_eq!(plans.len(), registry.len());
    }
}
