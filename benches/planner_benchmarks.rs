//! Performance benchmarks for declaration parsing and plan compilation.
//!
//! This benchmark suite measures the generation pipeline across workloads:
//! - Declarations: single signatures of growing complexity
//! - Documents: generated class hierarchies from 10 to 500 classes
//!
//! ```bash
//! cargo bench --bench planner_benchmarks
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use kernelbind::Context;
use kernelbind::parser::{FunctionOptions, TypeTable, parse_function};
use std::hint::black_box;

/// A document with `classes` curve classes in a chain under `RefItem`,
/// plus one module that takes each of them.
fn generated_document(classes: usize) -> String {
    let mut entries = vec![
        r#"{ "name": "RefItem", "native_header": "reference_item.h",
             "free_function": "DeleteItem", "functions": ["refcount_t GetUseCount()"] }"#
            .to_string(),
    ];
    let mut module_functions = Vec::with_capacity(classes);
    for i in 0..classes {
        let base = if i == 0 { "RefItem".to_string() } else { format!("Curve{}", i - 1) };
        entries.push(format!(
            r#"{{ "name": "Curve{i}", "native_header": "curve{i}.h", "extends": "{base}",
                 "kind_tag": {tag},
                 "functions": [
                    "double GetTMax()",
                    "MbResultType Trim{i}(double t0, double t1 = 1, MbCurve{i} *& result)"
                 ] }}"#,
            tag = 1000 + i,
        ));
        module_functions.push(format!(
            r#""MbResultType Join{i}(const RPArray<MbCurve{i}> & curves, MbCurve{i} *& result)""#
        ));
    }
    format!(
        r#"{{ "classes": [{}], "modules": [{{ "name": "ActionCurve",
             "native_header": "action_curve.h", "functions": [{}] }}] }}"#,
        entries.join(","),
        module_functions.join(","),
    )
}

/// Benchmark single declaration parsing
fn declaration_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/declarations");
    let types = TypeTable::new().with_enums(["MbeCopyMode"]);
    let options = FunctionOptions::default();

    let cases = [
        ("simple", "double GetTMax()"),
        (
            "out_params",
            "MbResultType ElementarySolid(const SArray<MbCartPoint3D> & points, \
             ElementaryShellType solidType, const MbSNameMaker & names, MbSolid *& result)",
        ),
        (
            "defaults",
            "MbCurve3D * Duplicate(MbRegDuplicate * iReg = NULL, MbeCopyMode mode = cm_Copy) const",
        ),
    ];
    for (name, decl) in cases {
        group.throughput(Throughput::Bytes(decl.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| parse_function(black_box(decl), &options, &types))
        });
    }

    group.finish();
}

/// Benchmark whole-document compilation
fn document_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("compiler/documents");

    for classes in [10, 100, 500] {
        let source = generated_document(classes);
        group.throughput(Throughput::Elements(classes as u64));

        group.bench_function(format!("load_{classes}_classes"), |b| {
            b.iter(|| Context::from_json(black_box(&source)).map(|ctx| ctx.registry().len()))
        });

        let ctx = match Context::from_json(&source) {
            Ok(ctx) => ctx,
            Err(err) => panic!("generated document failed to load: {err}"),
        };
        group.bench_function(format!("compile_{classes}_classes"), |b| {
            b.iter(|| ctx.compile().map(|plans| black_box(plans.len())))
        });
    }

    group.finish();
}

criterion_group!(benches, declaration_benchmarks, document_benchmarks);
criterion_main!(benches);
