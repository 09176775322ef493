use alloc::vec::Vec;

use bstr::BStr;
use rstest::rstest;

use super::{glb, strict};
use crate::{
    AccessorType, Arena, Component, ComponentType, DecodeOptions, Decoder, DrawMode, Global,
    IDENTITY, Resolved, Semantic, Sizes, Target, fill, parse, parse_json, size,
};

const SCENARIO: &[u8] = br#"{"asset":{"generator":"x","version":"2.0"},"scene":0,"scenes":[{"nodes":[0]}],"nodes":[{"mesh":0}],"meshes":[{"primitives":[{"attributes":{"POSITION":0},"indices":1,"mode":4}]}],"accessors":[{"componentType":5126,"type":"VEC3","count":3,"bufferView":0},{"componentType":5123,"type":"SCALAR","count":3,"bufferView":1}],"bufferViews":[{"buffer":0,"byteLength":36,"byteOffset":0},{"buffer":0,"byteLength":6,"byteOffset":36}],"buffers":[{"byteLength":42}]}"#;

fn scenario_bin() -> Vec<u8> {
    (0..42u8).collect()
}

#[test]
fn decodes_the_reference_scene() {
    let bytes = glb(SCENARIO, &scenario_bin());
    let doc = Decoder::new(strict()).parse(&bytes, Global).unwrap();

    assert_eq!(doc.asset().generator, Some(BStr::new("x")));
    assert_eq!(doc.asset().version, Some(BStr::new("2.0")));
    assert_eq!(doc.scene_index(), Some(0));

    let scene = doc.default_scene().found().unwrap();
    assert_eq!(doc.scenes().len(), 1);
    assert_eq!(doc.scene_nodes(scene), &[0]);

    let node = doc.node(0).found().unwrap();
    assert_eq!(doc.nodes().len(), 1);
    assert_eq!(node.mesh, Some(0));
    assert!(doc.node_children(node).is_empty());
    assert_eq!(node.matrix, IDENTITY);

    let mesh = doc.mesh_of(node).found().unwrap();
    let [primitive] = doc.primitives(mesh) else {
        panic!("expected one primitive");
    };
    assert_eq!(primitive.draw_mode(), Some(DrawMode::Triangles));

    let [position] = doc.attributes(primitive) else {
        panic!("expected one attribute");
    };
    assert_eq!(position.semantic, Semantic::Position);
    assert_eq!(position.set_index, -1);
    assert_eq!(position.set(), None);

    let positions = doc.accessor_of(position).found().unwrap();
    assert_eq!(positions.component_type, Some(ComponentType::F32));
    assert_eq!(positions.kind, Some(AccessorType::Vec3));
    assert_eq!(positions.count, 3);

    let indices = doc.indices_of(primitive).found().unwrap();
    assert_eq!(indices.component_type, Some(ComponentType::U16));
    assert_eq!(indices.kind, Some(AccessorType::Scalar));
    assert_eq!(indices.count, 3);

    let view = doc.buffer_view_of(indices).found().unwrap();
    assert_eq!((view.byte_offset, view.byte_length), (36, 6));
    assert_eq!(doc.buffer_view_data(view), Some(&[36u8, 37, 38, 39, 40, 41][..]));

    let buffer = doc.buffer_of(view).found().unwrap();
    assert_eq!(buffer.byte_length, 42);
    assert_eq!(buffer.uri, None);
    assert_eq!(doc.bin().len(), 42);
    assert_eq!(doc.consumed(), SCENARIO.len());
}

#[test]
fn arena_protocol_matches_direct_protocol() {
    let bytes = glb(SCENARIO, &scenario_bin());

    let direct = parse(&bytes, Global).unwrap();
    let sizes = size(&bytes).unwrap();
    let filled = fill(&bytes, Arena::new(&sizes), &sizes).unwrap();

    assert_eq!(sizes.consumed, direct.consumed());
    assert_eq!(filled, direct);
    assert_eq!(
        (sizes.scenes, sizes.nodes, sizes.meshes, sizes.primitives),
        (1, 1, 1, 1)
    );
    assert_eq!((sizes.attributes, sizes.accessors), (1, 2));
    assert_eq!((sizes.buffer_views, sizes.buffers, sizes.indices), (2, 1, 1));
}

#[test]
fn sizing_never_writes() {
    let bytes = glb(SCENARIO, &scenario_bin());
    let first = size(&bytes).unwrap();
    let second = size(&bytes).unwrap();
    assert_eq!(first, second);
    assert!(first.arena_bytes() > 0);
}

#[test]
fn unknown_root_keys_do_not_change_counts() {
    let with_extensions = br#"{
        "extensionsUsed": ["EXT_a"],
        "extensions": {"EXT_a": {"nested": [1, {"scenes": []}], "s": "}]"}},
        "scenes": [{"nodes": [0, 1]}],
        "nodes": [{"children": [1]}, {}],
        "extras": 17
    }"#;
    let plain = br#"{"scenes":[{"nodes":[0,1]}],"nodes":[{"children":[1]},{}]}"#;

    let a = size(&glb(with_extensions, &[])).unwrap();
    let b = size(&glb(plain, &[])).unwrap();
    assert_eq!(Sizes { consumed: 0, ..a }, Sizes { consumed: 0, ..b });

    let doc = parse_json(with_extensions, Global).unwrap();
    assert_eq!(doc.scene_nodes(&doc.scenes()[0]), &[0, 1]);
    assert_eq!(doc.node_children(&doc.nodes()[0]), &[1]);
}

#[test]
fn unknown_element_fields_are_skipped() {
    let json = br#"{"nodes":[{"extras":{"mesh":5},"name":"n","camera":0,"mesh":2}]}"#;
    let doc = parse_json(json, Global).unwrap();
    let node = &doc.nodes()[0];
    assert_eq!(node.mesh, Some(2));
    assert_eq!(node.name, Some(BStr::new("n")));
}

#[rstest]
#[case::bounds_first(br#"{"accessors":[{"min":[-1.5,0,2],"max":[1,2.75,3],"componentType":5126,"type":"VEC3"}]}"#)]
#[case::bounds_last(br#"{"accessors":[{"componentType":5126,"type":"VEC3","min":[-1.5,0,2],"max":[1,2.75,3]}]}"#)]
#[case::interleaved(br#"{"accessors":[{"max":[1,2.75,3],"type":"VEC3","min":[-1.5,0,2],"componentType":5126}]}"#)]
fn bounds_decode_regardless_of_field_order(#[case] json: &[u8]) {
    let doc = parse_json(json, Global).unwrap();
    let accessor = &doc.accessors()[0];

    let min = doc.accessor_min(accessor).unwrap();
    let max = doc.accessor_max(accessor).unwrap();
    assert_eq!(min.len(), 3);
    assert_eq!(max.len(), 3);
    assert_eq!(min.bytes().len(), 12);
    assert_eq!(
        min.iter().collect::<Vec<_>>(),
        [Component::F32(-1.5), Component::F32(0.0), Component::F32(2.0)]
    );
    assert_eq!(max.get(1), Some(Component::F32(2.75)));
    assert_eq!(max.get(3), None);
}

#[test]
fn integer_bounds_truncate_into_component_width() {
    let json = br#"{"accessors":[
        {"componentType":5123,"type":"SCALAR","min":[0],"max":[65535]},
        {"componentType":5120,"type":"VEC2","min":[-128,-3.9],"max":[127.2,0]}
    ]}"#;
    let doc = parse_json(json, Global).unwrap();
    let [a, b] = doc.accessors() else {
        panic!("expected two accessors");
    };

    let max = doc.accessor_max(a).unwrap();
    assert_eq!(max.bytes(), &[0xFF, 0xFF]);
    assert_eq!(max.get(0).map(Component::as_f64), Some(65535.0));

    let min = doc.accessor_min(b).unwrap();
    assert_eq!(min.component_type(), ComponentType::I8);
    assert_eq!(
        min.iter().collect::<Vec<_>>(),
        [Component::I8(-128), Component::I8(-3)]
    );
    assert_eq!(doc.accessor_max(b).unwrap().get(0), Some(Component::I8(127)));
}

#[test]
fn accessors_without_bounds_leave_them_absent() {
    let json = br#"{"accessors":[{"componentType":5126,"type":"MAT4","count":1}]}"#;
    let doc = parse_json(json, Global).unwrap();
    let accessor = &doc.accessors()[0];
    assert_eq!(accessor.min, None);
    assert!(doc.accessor_min(accessor).is_none());
    assert!(doc.accessor_max(accessor).is_none());
}

#[test]
fn node_transforms_and_defaults() {
    let json = br#"{"nodes":[
        {"translation":[1,2,3],"rotation":[0,0.5,0,0.5],"scale":[2,2,2],"skin":0},
        {"matrix":[2,0,0,0, 0,2,0,0, 0,0,2,0, 5,6,7,1]},
        {}
    ]}"#;
    let doc = parse_json(json, Global).unwrap();
    let [trs, matrix, empty] = doc.nodes() else {
        panic!("expected three nodes");
    };

    assert_eq!(trs.translation, [1.0, 2.0, 3.0]);
    assert_eq!(trs.rotation, [0.0, 0.5, 0.0, 0.5]);
    assert_eq!(trs.scale, [2.0; 3]);
    assert_eq!(trs.skin, Some(0));
    assert_eq!(trs.matrix, IDENTITY);

    assert_eq!(matrix.matrix[0], 2.0);
    assert_eq!(&matrix.matrix[12..], &[5.0, 6.0, 7.0, 1.0]);

    assert_eq!(empty.mesh, None);
    assert_eq!(empty.rotation, [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(empty.scale, [1.0; 3]);
    assert_eq!(doc.mesh_of(empty), Resolved::Absent);
}

#[test]
fn supplemented_fields() {
    let json = br#"{
        "asset": {"version": "2.0", "minVersion": "2.0", "copyright": "(c) someone"},
        "meshes": [{"name": "m", "weights": [0.5, 0.25], "primitives": [
            {"attributes": {"NORMAL": 1, "TEXCOORD_1": 2, "JOINTS_0": 3}, "material": 4}
        ]}],
        "accessors": [{"name": "acc", "normalized": true, "byteOffset": 8, "componentType": 5121, "type": "VEC4"}],
        "bufferViews": [{"name": "bv", "buffer": 0, "byteLength": 4, "byteStride": 12, "target": 34962}],
        "buffers": [{"name": "b", "uri": "data.bin", "byteLength": 4294967296}]
    }"#;
    let doc = parse_json(json, Global).unwrap();

    let asset = doc.asset();
    assert_eq!(asset.min_version, Some(BStr::new("2.0")));
    assert_eq!(asset.copyright, Some(BStr::new("(c) someone")));
    assert_eq!(asset.generator, None);

    let mesh = &doc.meshes()[0];
    assert_eq!(mesh.name, Some(BStr::new("m")));
    assert_eq!(doc.weights(mesh), &[0.5, 0.25]);

    let primitive = &doc.primitives(mesh)[0];
    assert_eq!(primitive.mode, DrawMode::DEFAULT_RAW);
    assert_eq!(primitive.material, Some(4));
    assert_eq!(primitive.indices, None);
    assert_eq!(doc.indices_of(primitive), Resolved::Absent);
    let attributes: Vec<_> = doc
        .attributes(primitive)
        .iter()
        .map(|a| (a.semantic, a.set_index, a.accessor))
        .collect();
    assert_eq!(
        attributes,
        [
            (Semantic::Normal, -1, 1),
            (Semantic::TexCoord, 1, 2),
            (Semantic::Joints, 0, 3),
        ]
    );
    assert_eq!(doc.accessor_of(&doc.attributes(primitive)[2]), Resolved::OutOfRange(3));

    let accessor = &doc.accessors()[0];
    assert_eq!(accessor.name, Some(BStr::new("acc")));
    assert!(accessor.normalized);
    assert_eq!(accessor.byte_offset, 8);
    assert_eq!(doc.buffer_view_of(accessor), Resolved::Absent);

    let view = &doc.buffer_views()[0];
    assert_eq!(view.name, Some(BStr::new("bv")));
    assert_eq!(view.byte_stride, 12);
    assert_eq!(view.target_kind(), Some(Target::ArrayBuffer));

    let buffer = &doc.buffers()[0];
    assert_eq!(buffer.name, Some(BStr::new("b")));
    assert_eq!(buffer.uri, Some(BStr::new("data.bin")));
    assert_eq!(buffer.byte_length, 1 << 32);
    assert_eq!(doc.buffer_view_data(view), None);
}

#[test]
fn strings_borrow_from_the_input() {
    let json = br#"{"nodes":[{"name":"quoted \"name\" \\"}]}"#;
    let doc = parse_json(json, Global).unwrap();
    let name = doc.nodes()[0].name.unwrap();
    assert_eq!(name, BStr::new(r#"quoted \"name\" \\"#));

    let range = json.as_ptr_range();
    assert!(range.contains(&name.as_ptr()));
}

#[test]
fn repeated_root_sections_keep_the_first() {
    let json = br#"{"scene":1,"scenes":[{},{}],"scene":0,"scenes":[{}, {}, {}]}"#;
    let doc = parse_json(json, Global).unwrap();
    assert_eq!(doc.scene_index(), Some(1));
    assert_eq!(doc.scenes().len(), 2);
}

#[test]
fn empty_sections_and_whitespace() {
    let json = b" {\n \"scenes\" : [ ] ,\r\n\t\"nodes\":[] , \"asset\" : { } } ";
    let doc = parse_json(json, Global).unwrap();
    assert!(doc.scenes().is_empty());
    assert!(doc.nodes().is_empty());
    assert_eq!(*doc.asset(), crate::Asset::default());
    assert_eq!(doc.consumed(), json.len() - 1);
    assert_eq!(doc.default_scene(), Resolved::Absent);
}

#[test]
fn default_scene_out_of_range_resolves_as_such() {
    let doc = parse_json(br#"{"scene":3,"scenes":[{}]}"#, Global).unwrap();
    assert_eq!(doc.default_scene(), Resolved::OutOfRange(3));
}

#[test]
fn container_may_omit_the_binary_chunk_when_allowed() {
    let json = br#"{"buffers":[{"uri":"a.bin","byteLength":1}]}"#;
    let mut bytes = glb(json, &[]);
    bytes.truncate(bytes.len() - 8);
    let total = u32::try_from(bytes.len()).unwrap();
    bytes[8..12].copy_from_slice(&total.to_le_bytes());

    let decoder = Decoder::new(DecodeOptions {
        allow_missing_bin_chunk: true,
        verify_total_length: true,
        ..Default::default()
    });
    let doc = decoder.parse(&bytes, Global).unwrap();
    assert!(doc.bin().is_empty());
    assert_eq!(doc.buffers().len(), 1);
}

#[test]
fn only_buffer_zero_maps_onto_the_binary_chunk() {
    let json = br#"{
        "bufferViews": [
            {"buffer": 0, "byteOffset": 1, "byteLength": 2},
            {"buffer": 1, "byteOffset": 1, "byteLength": 2}
        ],
        "buffers": [{"byteLength": 4}, {"byteLength": 4}]
    }"#;
    let bytes = glb(json, &[10, 11, 12, 13]);
    let doc = parse(&bytes, Global).unwrap();

    let views = doc.buffer_views();
    assert_eq!(doc.buffer_view_data(&views[0]), Some(&[11u8, 12][..]));
    assert!(doc.buffer_of(&views[1]).found().is_some());
    assert_eq!(doc.buffer_view_data(&views[1]), None);
}

#[test]
fn arena_can_be_reused_across_documents() {
    let bytes = glb(SCENARIO, &scenario_bin());
    let sizes = size(&bytes).unwrap();
    let first = fill(&bytes, Arena::new(&sizes), &sizes).unwrap();
    let expected = first.clone();

    let second = fill(&bytes, first.into_arena(), &sizes).unwrap();
    assert_eq!(second, expected);
}
