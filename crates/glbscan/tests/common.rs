#![allow(missing_docs)]
#![allow(dead_code)]

pub const TRIANGLE: &str = r#"
{
    "asset": {"generator": "x", "version": "2.0"},
    "scene": 0,
    "scenes": [{"name": "main", "nodes": [0]}],
    "nodes": [
        {"name": "root", "children": [1], "translation": [0, 1.5, 0]},
        {"mesh": 0}
    ],
    "meshes": [
        {
            "name": "tri",
            "primitives": [
                {"attributes": {"POSITION": 0, "TEXCOORD_0": 2}, "indices": 1, "mode": 4}
            ]
        }
    ],
    "accessors": [
        {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "max": [1, 1, 0], "min": [-1, -1, 0]},
        {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR", "max": [2], "min": [0]},
        {"bufferView": 0, "byteOffset": 0, "componentType": 5126, "count": 3, "type": "VEC2"}
    ],
    "bufferViews": [
        {"buffer": 0, "byteLength": 36, "byteOffset": 0, "target": 34962},
        {"buffer": 0, "byteLength": 6, "byteOffset": 36, "target": 34963}
    ],
    "buffers": [{"byteLength": 42}],
    "extensionsUsed": []
}
"#;

/// Frames `json` and `bin` into a binary container.
pub fn glb(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let total = glbscan::JSON_START + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    for word in [glbscan::MAGIC, 2, u32::try_from(total).unwrap()] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for (kind, chunk) in [(glbscan::CHUNK_JSON, json), (glbscan::CHUNK_BIN, bin)] {
        out.extend_from_slice(&u32::try_from(chunk.len()).unwrap().to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(chunk);
    }
    out
}

pub fn triangle() -> Vec<u8> {
    let bin: Vec<u8> = (0..42).collect();
    glb(TRIANGLE.as_bytes(), &bin)
}
