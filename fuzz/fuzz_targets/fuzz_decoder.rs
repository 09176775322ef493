#![no_main]

use arbitrary::Arbitrary;
use glbscan::{Arena, DecodeOptions, Decoder, Global};
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};

/// Keys the decoder recognizes somewhere in the document, mixed with a few it
/// must skip.
static KEYS: &[&str] = &[
    "asset", "scene", "scenes", "nodes", "meshes", "accessors", "bufferViews", "buffers",
    "generator", "version", "name", "children", "mesh", "skin", "matrix", "translation",
    "rotation", "scale", "primitives", "weights", "attributes", "indices", "material", "mode",
    "componentType", "type", "bufferView", "byteOffset", "count", "normalized", "min", "max",
    "buffer", "byteLength", "byteStride", "target", "uri", "POSITION", "TEXCOORD_0", "COLOR_1",
    "extensions", "extras",
];

static STRINGS: &[&str] = &["VEC3", "SCALAR", "MAT4", "2.0", "a\\\"b", "}]", ""];

#[derive(Debug, Arbitrary)]
enum Node {
    Int(u16),
    Float(i16, u8),
    Bool(bool),
    Null,
    Str(u8),
    Array(Vec<Node>),
    Object(Vec<(u8, Node)>),
}

impl Node {
    fn into_value(self, depth: usize) -> Value {
        match self {
            Node::Int(i) if i % 3 == 0 => Value::from(5120 + u32::from(i % 7)),
            Node::Int(i) => Value::from(i % 64),
            Node::Float(whole, frac) => Value::from(f64::from(whole) + f64::from(frac % 4) / 4.0),
            Node::Bool(b) => Value::from(b),
            Node::Null => Value::Null,
            Node::Str(i) => Value::from(STRINGS[usize::from(i) % STRINGS.len()]),
            Node::Array(items) if depth < 8 => {
                items.into_iter().map(|n| n.into_value(depth + 1)).collect()
            }
            Node::Object(members) if depth < 8 => {
                let mut map = Map::new();
                for (key, node) in members {
                    let key = KEYS[usize::from(key) % KEYS.len()];
                    map.insert(key.into(), node.into_value(depth + 1));
                }
                Value::Object(map)
            }
            Node::Array(_) | Node::Object(_) => Value::Null,
        }
    }
}

#[derive(Debug, Arbitrary)]
enum Input {
    /// Arbitrary bytes straight into the container reader.
    Raw(Vec<u8>),
    /// Arbitrary JSON text framed into a well-formed container.
    Text { json: Vec<u8>, bin: Vec<u8> },
    /// A structurally valid JSON document built from the known vocabulary.
    Document { root: Vec<(u8, Node)>, bin: Vec<u8> },
}

fn frame(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let total = glbscan::JSON_START + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    for word in [glbscan::MAGIC, 2, u32::try_from(total).unwrap_or(u32::MAX)] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for (kind, chunk) in [(glbscan::CHUNK_JSON, json), (glbscan::CHUNK_BIN, bin)] {
        out.extend_from_slice(&u32::try_from(chunk.len()).unwrap_or(u32::MAX).to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(chunk);
    }
    out
}

/// Both protocols must agree: same document on success, same error otherwise.
fn check(bytes: &[u8]) {
    let decoder = Decoder::new(DecodeOptions::default());
    let direct = decoder.parse(bytes, Global);
    let sizes = decoder.size(bytes);

    match (direct, sizes) {
        (Ok(doc), Ok(sizes)) => {
            assert_eq!(sizes.consumed, doc.consumed());
            let filled = decoder
                .fill(bytes, Arena::new(&sizes), &sizes)
                .expect("fill after a successful size");
            assert_eq!(filled, doc);
        }
        (Err(a), Err(b)) => assert_eq!(a, b),
        (direct, sizes) => panic!("protocols disagree: {direct:?} vs {sizes:?}"),
    }
}

fuzz_target!(|input: Input| {
    match input {
        Input::Raw(bytes) => check(&bytes),
        Input::Text { json, bin } => check(&frame(&json, &bin)),
        Input::Document { root, bin } => {
            let root = Node::Object(root).into_value(0);
            let json = serde_json::to_vec(&root).unwrap();
            check(&frame(&json, &bin));
        }
    }
});
