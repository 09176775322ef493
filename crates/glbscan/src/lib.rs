//! A zero-copy decoder for binary glTF containers.
//!
//! The decoder validates the container framing, then walks the JSON chunk
//! once per protocol with a structural-byte cursor, sizing every array with a
//! counting pass before filling it. Strings in the resulting [`Document`]
//! borrow from the input buffer; its pools come from the [`Allocator`] the
//! caller hands in, or from a pre-sized [`Arena`].
//!
//! ```rust
//! let json = br#"{"asset":{"version":"2.0"},"scenes":[{"nodes":[0]}],"nodes":[{}]}"#;
//! let doc = glbscan::parse_json(json, glbscan::Global).unwrap();
//! assert_eq!(doc.asset().version.map(|v| v.to_vec()), Some(b"2.0".to_vec()));
//! assert_eq!(doc.scene_nodes(&doc.scenes()[0]), &[0]);
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod container;
mod decoder;
mod document;
mod error;
mod fields;
mod options;
mod scanner;
mod schema;
mod sink;
mod walker;

#[cfg(test)]
mod tests;

pub use allocator_api2::alloc::{Allocator, Global};
pub use container::{CHUNK_BIN, CHUNK_JSON, Container, JSON_START, MAGIC};
pub use decoder::{Decoder, fill, parse, parse_json, size};
pub use document::{
    Accessor, Asset, Attribute, Bounds, Buffer, BufferView, Document, IDENTITY, Mesh, Node,
    Primitive, Resolved, Scene,
};
pub use error::{CapacityError, DecodeError, ErrorSource, FormatError, SchemaError, SyntaxError};
pub use fields::{MAX_INTEGER_LEN, parse_bool, parse_float, parse_int, parse_u32, parse_u64};
pub use options::DecodeOptions;
pub use schema::{AccessorType, Component, ComponentType, DrawMode, Semantic, Target};
pub use sink::{Arena, Pool, Sizes, Slice};
