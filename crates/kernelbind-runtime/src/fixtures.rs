//! A small kernel model shared by the runtime tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kernelbind_compiler::{ClassPlan, Compiler};
use kernelbind_core::{BindgenConfig, ResultCode};
use kernelbind_registry::{ApiDocument, ClassRegistry};

use crate::handle::NativePtr;
use crate::library::{NativeCall, NativeError, NativeFunctions, NativeLibrary, NativeReturn};
use crate::native::{NativeArg, NativeValue, PodValue};
use crate::runtime::Runtime;

pub const SPACE_FAMILY: u32 = 3000;
pub const SOLID: u32 = 3001;
pub const ASSEMBLY: u32 = 3002;
pub const CURVE: u32 = 2001;

pub const DOC: &str = r#"{
    "enums": ["MbeSpaceType"],
    "classes": [
        { "name": "RefItem", "native_header": "reference_item.h",
          "functions": ["refcount_t GetUseCount()"] },
        { "name": "SpaceItem", "native_header": "space_item.h", "extends": "RefItem",
          "kind_tag": 3000,
          "functions": ["MbeSpaceType IsA()", "void Move(const MbVector3D & to)"] },
        { "name": "Solid", "native_header": "solid.h", "extends": "SpaceItem",
          "kind_tag": 3001, "functions": ["double GetVolume()"] },
        { "name": "Assembly", "native_header": "assembly.h", "extends": "SpaceItem",
          "kind_tag": 3002, "initializers": [""],
          "functions": [
            { "signature": "void AddItem(MbSpaceItem * item)",
              "params": { "item": { "is_owning": true } } },
            "size_t ItemsCount()"
          ] },
        { "name": "Curve3D", "native_header": "curve3d.h", "extends": "SpaceItem",
          "kind_tag": 2001 },
        { "name": "Vector3D", "native_header": "mb_vector3d.h", "is_pod": true,
          "initializers": ["double a, double b, double c", "const MbVector3D & other"],
          "fields": ["double x", "double y", "double z"] },
        { "name": "CartPoint3D", "native_header": "mb_cart_point3d.h", "is_pod": true,
          "initializers": ["double a, double b, double c"],
          "fields": ["double x", "double y", "double z", "const int dimension"] }
    ],
    "modules": [
        { "name": "ActionSolid", "native_header": "action_solid.h",
          "functions": [
            "MbResultType ElementarySolid(const SArray<MbCartPoint3D> & points, MbSolid *& result)",
            "MbResultType SplitSolid(const MbSolid & solid, double ratio, MbSolid *& left, MbSolid *& right)",
            { "signature": "bool CheckSolid(const MbSolid & solid)",
              "return": { "is_error_bool": true } },
            { "signature": "double Volume(const MbSolid * solid)",
              "params": { "solid": { "is_nullable": true } } },
            "double Measure(double a, double b)",
            "double Measure(const MbSolid & solid)",
            "double Total(const RPArray<MbSolid> & solids)",
            { "signature": "double Scale(double factor)",
              "params": { "factor": { "is_nullable": true } } },
            { "signature": "double Scale(const MbSolid * solid)",
              "params": { "solid": { "is_nullable": true } } },
            { "signature": "size_t Count(LIterator<MbSolid> & solids)",
              "params": { "solids": { "is_nullable": true } } },
            "refcount_t Weigh(MbSolid solid)",
            "refcount_t Stock(const SArray<MbSolid> & solids)",
            "void Explode()"
          ] }
    ]
}"#;

#[derive(Debug, Clone, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug)]
pub struct SolidData {
    pub volume: f64,
}

#[derive(Debug, Default)]
pub struct AssemblyData {
    pub items: Vec<NativePtr>,
}

pub fn solid(volume: f64) -> NativePtr {
    NativePtr::new(SOLID, SPACE_FAMILY, SolidData { volume })
}

pub fn plans(config: &BindgenConfig) -> Vec<ClassPlan> {
    let mut registry = ClassRegistry::new();
    registry
        .load_document(&ApiDocument::from_json_str(DOC).unwrap())
        .unwrap();
    Compiler::new(&registry, config).compile_all().unwrap()
}

/// Counts native calls, then defers to the closure table.
pub struct Counting {
    pub inner: NativeFunctions,
    pub calls: AtomicUsize,
}

impl Counting {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NativeLibrary for Counting {
    fn call(&self, call: &NativeCall) -> Result<NativeReturn, NativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.call(call)
    }

    fn construct(
        &self,
        class: &str,
        overload: usize,
        args: &[NativeArg],
    ) -> Result<NativeValue, NativeError> {
        self.inner.construct(class, overload, args)
    }

    fn get_field(
        &self,
        lineage: &[String],
        field: &str,
        target: &NativeValue,
    ) -> Result<NativeValue, NativeError> {
        self.inner.get_field(lineage, field, target)
    }

    fn set_field(
        &self,
        lineage: &[String],
        field: &str,
        target: &mut NativeValue,
        value: NativeValue,
    ) -> Result<(), NativeError> {
        self.inner.set_field(lineage, field, target, value)
    }
}

fn number(value: Option<&NativeValue>) -> Result<f64, NativeError> {
    value
        .and_then(NativeValue::as_f64)
        .ok_or_else(|| NativeError::new("expected a number"))
}

fn volume_of(value: Option<&NativeValue>) -> Result<f64, NativeError> {
    value
        .and_then(NativeValue::as_ptr)
        .and_then(|ptr| ptr.with(|s: &SolidData| s.volume))
        .ok_or_else(|| NativeError::new("expected a solid"))
}

fn this_ptr(call: &NativeCall) -> Result<&NativePtr, NativeError> {
    call.this
        .as_ref()
        .and_then(NativeValue::as_ptr)
        .ok_or_else(|| NativeError::new("missing receiver"))
}

fn vec3(value: &NativeValue) -> Result<&Vec3, NativeError> {
    value
        .as_pod()
        .and_then(PodValue::get::<Vec3>)
        .ok_or_else(|| NativeError::new("expected a vector"))
}

fn with_vector_fields(lib: NativeFunctions, class: &'static str) -> NativeFunctions {
    let lib = lib
        .with_getter(class, "x", |t| Ok(NativeValue::Double(vec3(t)?.x)))
        .with_getter(class, "y", |t| Ok(NativeValue::Double(vec3(t)?.y)))
        .with_getter(class, "z", |t| Ok(NativeValue::Double(vec3(t)?.z)));
    ["x", "y", "z"].into_iter().fold(lib, |lib, axis| {
        lib.with_setter(class, axis, move |target, value| {
            let n = number(Some(&value))?;
            let v = match target {
                NativeValue::Pod(pod) => pod.get_mut::<Vec3>(),
                _ => None,
            }
            .ok_or_else(|| NativeError::new("expected a vector"))?;
            match axis {
                "x" => v.x = n,
                "y" => v.y = n,
                _ => v.z = n,
            }
            Ok(())
        })
    })
}

pub fn library() -> Counting {
    let lib = NativeFunctions::new()
        .with_function("RefItem", "GetUseCount", |call| {
            Ok(NativeReturn::value(NativeValue::Int(this_ptr(call)?.use_count() as i64)))
        })
        .with_function("SpaceItem", "IsA", |call| {
            Ok(NativeReturn::value(NativeValue::Enum(this_ptr(call)?.kind_tag())))
        })
        .with_function("SpaceItem", "Move", |call| {
            call.arg(0).map(vec3).transpose()?;
            Ok(NativeReturn::void())
        })
        .with_function("Solid", "GetVolume", |call| {
            let volume = this_ptr(call)?
                .with(|s: &SolidData| s.volume)
                .ok_or_else(|| NativeError::new("not a solid"))?;
            Ok(NativeReturn::value(NativeValue::Double(volume)))
        })
        .with_constructor("Assembly", |_, _| {
            Ok(NativeValue::Object(NativePtr::new(
                ASSEMBLY,
                SPACE_FAMILY,
                AssemblyData::default(),
            )))
        })
        .with_function("Assembly", "AddItem", |call| {
            let item = call
                .arg(0)
                .and_then(NativeValue::as_ptr)
                .cloned()
                .ok_or_else(|| NativeError::new("expected an item"))?;
            this_ptr(call)?.with_mut(|a: &mut AssemblyData| a.items.push(item));
            Ok(NativeReturn::void())
        })
        .with_function("Assembly", "ItemsCount", |call| {
            let count = this_ptr(call)?
                .with(|a: &AssemblyData| a.items.len())
                .unwrap_or_default();
            Ok(NativeReturn::value(NativeValue::Int(count as i64)))
        })
        .with_constructor("Vector3D", |overload, args| {
            let v = match overload {
                0 => Vec3 {
                    x: number(args.first().and_then(NativeArg::value))?,
                    y: number(args.get(1).and_then(NativeArg::value))?,
                    z: number(args.get(2).and_then(NativeArg::value))?,
                },
                _ => args
                    .first()
                    .and_then(NativeArg::value)
                    .map(vec3)
                    .transpose()?
                    .cloned()
                    .ok_or_else(|| NativeError::new("expected a vector"))?,
            };
            Ok(NativeValue::Pod(PodValue::new("Vector3D", v)))
        })
        .with_constructor("CartPoint3D", |_, args| {
            Ok(NativeValue::Pod(PodValue::new(
                "CartPoint3D",
                Vec3 {
                    x: number(args.first().and_then(NativeArg::value))?,
                    y: number(args.get(1).and_then(NativeArg::value))?,
                    z: number(args.get(2).and_then(NativeArg::value))?,
                },
            )))
        })
        .with_getter("CartPoint3D", "dimension", |_| Ok(NativeValue::Int(3)))
        .with_function("ActionSolid", "ElementarySolid", |call| {
            let points = match call.arg(0) {
                Some(NativeValue::Array(points)) => points.len(),
                _ => return Err(NativeError::new("expected points")),
            };
            if points < 3 {
                return Ok(NativeReturn::code(ResultCode::TooFewAxes.code()));
            }
            Ok(NativeReturn::code(0).with_out(NativeValue::Object(solid(points as f64))))
        })
        .with_function("ActionSolid", "SplitSolid", |call| {
            let volume = volume_of(call.arg(0))?;
            let ratio = number(call.arg(1))?;
            if !(0.0..=1.0).contains(&ratio) {
                return Ok(NativeReturn::code(9999));
            }
            Ok(NativeReturn::code(0)
                .with_out(NativeValue::Object(solid(volume * ratio)))
                .with_out(NativeValue::Object(solid(volume * (1.0 - ratio)))))
        })
        .with_function("ActionSolid", "CheckSolid", |call| {
            Ok(NativeReturn::flag(volume_of(call.arg(0))? > 0.0))
        })
        .with_function("ActionSolid", "Volume", |call| {
            let volume = match call.arg(0) {
                Some(NativeValue::Null) => 0.0,
                other => volume_of(other)?,
            };
            Ok(NativeReturn::value(NativeValue::Double(volume)))
        })
        .with_function("ActionSolid", "Measure", |call| {
            let measure = match call.overload {
                0 => number(call.arg(0))? * number(call.arg(1))?,
                _ => volume_of(call.arg(0))?,
            };
            Ok(NativeReturn::value(NativeValue::Double(measure)))
        })
        .with_function("ActionSolid", "Total", |call| {
            let total = match call.arg(0) {
                Some(NativeValue::Array(items)) => items
                    .iter()
                    .map(|item| volume_of(Some(item)))
                    .sum::<Result<f64, _>>()?,
                _ => return Err(NativeError::new("expected solids")),
            };
            Ok(NativeReturn::value(NativeValue::Double(total)))
        })
        .with_function("ActionSolid", "Scale", |call| {
            let scale = match (call.overload, call.arg(0)) {
                (0, Some(NativeValue::Null)) => -1.0,
                (0, other) => number(other)?,
                _ => 100.0,
            };
            Ok(NativeReturn::value(NativeValue::Double(scale)))
        })
        .with_function("ActionSolid", "Count", |call| match call.arg(0) {
            Some(NativeValue::Array(items)) => {
                Ok(NativeReturn::value(NativeValue::Int(items.len() as i64)))
            }
            _ => Err(NativeError::new("expected an iterator")),
        })
        .with_function("ActionSolid", "Weigh", |call| {
            // The callee owns its by-value copy and destroys it on return.
            let ptr = call
                .arg(0)
                .and_then(NativeValue::as_ptr)
                .ok_or_else(|| NativeError::new("expected a solid"))?;
            let count = ptr.use_count();
            ptr.release();
            Ok(NativeReturn::value(NativeValue::Int(count as i64)))
        })
        .with_function("ActionSolid", "Stock", |call| {
            let items = match call.arg(0) {
                Some(NativeValue::Array(items)) => items,
                _ => return Err(NativeError::new("expected solids")),
            };
            let mut counts = 0;
            for ptr in items.iter().filter_map(NativeValue::as_ptr) {
                counts += ptr.use_count();
                ptr.release();
            }
            Ok(NativeReturn::value(NativeValue::Int(counts as i64)))
        })
        .with_function("ActionSolid", "Explode", |_| panic!("kernel fault"));

    let lib = with_vector_fields(lib, "Vector3D");
    let lib = with_vector_fields(lib, "CartPoint3D");
    Counting {
        inner: lib,
        calls: AtomicUsize::new(0),
    }
}

/// A runtime over the fixture model plus a handle on its call counter.
pub fn runtime(config: BindgenConfig) -> (Runtime, Arc<Counting>) {
    let library = Arc::new(library());
    let runtime = Runtime::new(plans(&config), library.clone(), config).unwrap();
    (runtime, library)
}
