//! Benchmark – direct (global heap and bump), and arena decoding of a
//! generated container
#![allow(missing_docs)]

use std::{fmt::Write, time::Duration};

use bumpalo::Bump;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glbscan::{Arena, CHUNK_BIN, CHUNK_JSON, Global, JSON_START, MAGIC};

/// A deterministic document with `nodes` nodes in a binary tree, one mesh per
/// node, and one bounded accessor per mesh.
fn make_document(nodes: usize) -> String {
    let mut json = String::with_capacity(nodes * 256);
    json.push_str(r#"{"asset":{"generator":"bench","version":"2.0"},"scene":0,"scenes":[{"nodes":[0]}],"nodes":["#);
    for i in 0..nodes {
        if i > 0 {
            json.push(',');
        }
        let children: Vec<String> = [2 * i + 1, 2 * i + 2]
            .into_iter()
            .filter(|&c| c < nodes)
            .map(|c| c.to_string())
            .collect();
        write!(
            json,
            r#"{{"name":"node {i}","mesh":{i},"children":[{}],"translation":[{i}.5,0,-1.25]}}"#,
            children.join(",")
        )
        .unwrap();
    }
    json.push_str(r#"],"meshes":["#);
    for i in 0..nodes {
        if i > 0 {
            json.push(',');
        }
        write!(
            json,
            r#"{{"primitives":[{{"attributes":{{"POSITION":{i},"NORMAL":{i},"TEXCOORD_0":{i}}},"mode":4}}]}}"#
        )
        .unwrap();
    }
    json.push_str(r#"],"accessors":["#);
    for i in 0..nodes {
        if i > 0 {
            json.push(',');
        }
        write!(
            json,
            r#"{{"min":[-{i}.25,0,0],"max":[{i}.75,1,1],"componentType":5126,"type":"VEC3","count":3,"bufferView":0}}"#
        )
        .unwrap();
    }
    json.push_str(r#"],"bufferViews":[{"buffer":0,"byteLength":36}],"buffers":[{"byteLength":36}]}"#);
    json
}

fn make_container(json: &str) -> Vec<u8> {
    let bin = [0u8; 36];
    let total = JSON_START + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    for word in [MAGIC, 2, u32::try_from(total).unwrap()] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for (kind, chunk) in [(CHUNK_JSON, json.as_bytes()), (CHUNK_BIN, &bin[..])] {
        out.extend_from_slice(&u32::try_from(chunk.len()).unwrap().to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(chunk);
    }
    out
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for &nodes in &[10usize, 1_000, 20_000] {
        let bytes = make_container(&make_document(nodes));
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("direct", nodes), &bytes, |b, bytes| {
            b.iter(|| {
                let doc = glbscan::parse(black_box(bytes), Global).unwrap();
                black_box(doc.nodes().len());
            });
        });

        let mut bump = Bump::new();
        group.bench_with_input(BenchmarkId::new("direct_bump", nodes), &bytes, |b, bytes| {
            b.iter(|| {
                bump.reset();
                let doc = glbscan::parse(black_box(bytes), &bump).unwrap();
                black_box(doc.nodes().len());
            });
        });

        group.bench_with_input(BenchmarkId::new("size", nodes), &bytes, |b, bytes| {
            b.iter(|| black_box(glbscan::size(black_box(bytes)).unwrap()));
        });

        let sizes = glbscan::size(&bytes).unwrap();
        group.bench_with_input(BenchmarkId::new("fill", nodes), &bytes, |b, bytes| {
            b.iter(|| {
                let doc = glbscan::fill(black_box(bytes), Arena::new(&sizes), &sizes).unwrap();
                black_box(doc.consumed());
            });
        });
    }
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(3))
            .measurement_time(Duration::from_secs(5));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_decode }
criterion_main!(benches);
