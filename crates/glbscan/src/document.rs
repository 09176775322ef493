//! The decoded document and its entities.
//!
//! Every string is a `&'a BStr` borrowed from the input buffer, so a
//! [`Document<'a>`] cannot outlive the bytes it was decoded from. Foreign
//! keys are kept as the plain integers the format stores; resolve them
//! through the [`Document`] methods, which bounds-check every lookup.

use allocator_api2::alloc::{Allocator, Global};
use bstr::BStr;

use crate::{
    schema::{AccessorType, Component, ComponentType, DrawMode, Semantic, Target},
    sink::{Arena, Pools, Slice},
};

#[rustfmt::skip]
pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// Metadata about the asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Asset<'a> {
    pub generator: Option<&'a BStr>,
    pub version: Option<&'a BStr>,
    pub min_version: Option<&'a BStr>,
    pub copyright: Option<&'a BStr>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Scene<'a> {
    pub name: Option<&'a BStr>,
    /// Root node indices.
    pub nodes: Slice,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Node<'a> {
    pub name: Option<&'a BStr>,
    pub mesh: Option<u32>,
    pub skin: Option<u32>,
    /// The sixteen `matrix` values in document order.
    pub matrix: [f32; 16],
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Child node indices.
    pub children: Slice,
}

impl Default for Node<'_> {
    fn default() -> Self {
        Self {
            name: None,
            mesh: None,
            skin: None,
            matrix: IDENTITY,
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            children: Slice::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Mesh<'a> {
    pub name: Option<&'a BStr>,
    pub primitives: Slice,
    /// Default morph-target weights.
    pub weights: Slice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Primitive {
    pub attributes: Slice,
    pub indices: Option<u32>,
    pub material: Option<u32>,
    /// Raw topology code, `4` (triangles) when absent.
    pub mode: u32,
}

impl Default for Primitive {
    fn default() -> Self {
        Self {
            attributes: Slice::default(),
            indices: None,
            material: None,
            mode: DrawMode::DEFAULT_RAW,
        }
    }
}

impl Primitive {
    /// The topology, if `mode` is one the format defines.
    #[must_use]
    pub fn draw_mode(&self) -> Option<DrawMode> {
        DrawMode::from_raw(self.mode)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attribute {
    pub accessor: u32,
    pub semantic: Semantic,
    /// `-1` for semantics without a numbered variant.
    pub set_index: i32,
}

impl Attribute {
    /// The set index of a numbered semantic such as `TEXCOORD_1`.
    #[must_use]
    pub fn set(&self) -> Option<u32> {
        u32::try_from(self.set_index).ok()
    }
}

/// A typed view over a buffer view.
///
/// `min` and `max` are only decoded once both `component_type` and `kind`
/// are known; read them through [`Document::accessor_min`] and
/// [`Document::accessor_max`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Accessor<'a> {
    pub name: Option<&'a BStr>,
    pub component_type: Option<ComponentType>,
    /// The element shape (`type` in the JSON).
    pub kind: Option<AccessorType>,
    pub buffer_view: Option<u32>,
    pub byte_offset: u32,
    pub count: u32,
    pub normalized: bool,
    pub min: Option<Slice>,
    pub max: Option<Slice>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BufferView<'a> {
    pub name: Option<&'a BStr>,
    pub buffer: u32,
    pub byte_length: u32,
    pub byte_offset: u32,
    /// `0` when elements are tightly packed.
    pub byte_stride: u32,
    pub target: Option<u32>,
}

impl BufferView<'_> {
    #[must_use]
    pub fn target_kind(&self) -> Option<Target> {
        self.target.and_then(Target::from_raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Buffer<'a> {
    pub name: Option<&'a BStr>,
    /// `None` when the buffer is the container's binary chunk.
    pub uri: Option<&'a BStr>,
    pub byte_length: u64,
}

/// Outcome of resolving a foreign key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'d, T> {
    /// The referring field was not present.
    Absent,
    /// The index points past the end of its collection.
    OutOfRange(u32),
    Found(&'d T),
}

impl<'d, T> Resolved<'d, T> {
    #[must_use]
    pub fn found(self) -> Option<&'d T> {
        match self {
            Self::Found(item) => Some(item),
            _ => None,
        }
    }

    fn lookup(items: &'d [T], index: Option<u32>) -> Self {
        match index {
            None => Self::Absent,
            Some(i) => items
                .get(i as usize)
                .map_or(Self::OutOfRange(i), Self::Found),
        }
    }
}

/// Typed `min`/`max` values of one accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds<'d> {
    component_type: ComponentType,
    bytes: &'d [u8],
}

impl<'d> Bounds<'d> {
    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// The raw little-endian components.
    #[must_use]
    pub fn bytes(&self) -> &'d [u8] {
        self.bytes
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.component_type.byte_width()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Component> {
        let width = self.component_type.byte_width();
        let start = index.checked_mul(width)?;
        self.component_type
            .decode(self.bytes.get(start..start + width)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = Component> + 'd {
        let ty = self.component_type;
        self.bytes
            .chunks_exact(ty.byte_width())
            .filter_map(move |c| ty.decode(c))
    }
}

/// A decoded document.
///
/// Built once by a successful decode and immutable afterwards. Its storage
/// belongs to the allocator `A` the decode was given.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(bound = ""))]
pub struct Document<'a, A: Allocator = Global> {
    pub(crate) asset: Asset<'a>,
    pub(crate) scene: Option<u32>,
    pub(crate) pools: Pools<'a, A>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) bin: &'a [u8],
    pub(crate) consumed: usize,
}

impl<'a, A: Allocator, B: Allocator> PartialEq<Document<'a, B>> for Document<'a, A> {
    fn eq(&self, other: &Document<'a, B>) -> bool {
        self.asset == other.asset
            && self.scene == other.scene
            && self.pools == other.pools
            && self.bin == other.bin
            && self.consumed == other.consumed
    }
}

impl<'a, A: Allocator> Document<'a, A> {
    #[must_use]
    pub fn asset(&self) -> &Asset<'a> {
        &self.asset
    }

    /// Index of the default scene, if the document names one.
    #[must_use]
    pub fn scene_index(&self) -> Option<u32> {
        self.scene
    }

    #[must_use]
    pub fn default_scene(&self) -> Resolved<'_, Scene<'a>> {
        Resolved::lookup(&self.pools.scenes, self.scene)
    }

    #[must_use]
    pub fn scenes(&self) -> &[Scene<'a>] {
        &self.pools.scenes
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node<'a>] {
        &self.pools.nodes
    }

    #[must_use]
    pub fn meshes(&self) -> &[Mesh<'a>] {
        &self.pools.meshes
    }

    #[must_use]
    pub fn accessors(&self) -> &[Accessor<'a>] {
        &self.pools.accessors
    }

    #[must_use]
    pub fn buffer_views(&self) -> &[BufferView<'a>] {
        &self.pools.buffer_views
    }

    #[must_use]
    pub fn buffers(&self) -> &[Buffer<'a>] {
        &self.pools.buffers
    }

    /// The container's binary chunk. Empty for bare JSON input.
    #[must_use]
    pub fn bin(&self) -> &'a [u8] {
        self.bin
    }

    /// Gives the document's storage back for another fill pass.
    #[must_use]
    pub fn into_arena(self) -> Arena<'a, A> {
        Arena { pools: self.pools }
    }

    /// JSON bytes the decode consumed, through the root's closing brace.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    // Nested collections. Slices are produced by the decoder and always lie
    // inside their pool, so these only come back empty for foreign slices.

    #[must_use]
    pub fn scene_nodes(&self, scene: &Scene<'a>) -> &[u32] {
        self.pools.indices.get(scene.nodes.range()).unwrap_or_default()
    }

    #[must_use]
    pub fn node_children(&self, node: &Node<'a>) -> &[u32] {
        self.pools.indices.get(node.children.range()).unwrap_or_default()
    }

    #[must_use]
    pub fn primitives(&self, mesh: &Mesh<'a>) -> &[Primitive] {
        self.pools
            .primitives
            .get(mesh.primitives.range())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn weights(&self, mesh: &Mesh<'a>) -> &[f32] {
        self.pools.weights.get(mesh.weights.range()).unwrap_or_default()
    }

    #[must_use]
    pub fn attributes(&self, primitive: &Primitive) -> &[Attribute] {
        self.pools
            .attributes
            .get(primitive.attributes.range())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn accessor_min(&self, accessor: &Accessor<'a>) -> Option<Bounds<'_>> {
        self.bounds(accessor, accessor.min)
    }

    #[must_use]
    pub fn accessor_max(&self, accessor: &Accessor<'a>) -> Option<Bounds<'_>> {
        self.bounds(accessor, accessor.max)
    }

    fn bounds(&self, accessor: &Accessor<'a>, slice: Option<Slice>) -> Option<Bounds<'_>> {
        Some(Bounds {
            component_type: accessor.component_type?,
            bytes: self.pools.bound_bytes.get(slice?.range())?,
        })
    }

    // Foreign keys.

    #[must_use]
    pub fn node(&self, index: u32) -> Resolved<'_, Node<'a>> {
        Resolved::lookup(&self.pools.nodes, Some(index))
    }

    #[must_use]
    pub fn accessor(&self, index: u32) -> Resolved<'_, Accessor<'a>> {
        Resolved::lookup(&self.pools.accessors, Some(index))
    }

    #[must_use]
    pub fn mesh_of(&self, node: &Node<'a>) -> Resolved<'_, Mesh<'a>> {
        Resolved::lookup(&self.pools.meshes, node.mesh)
    }

    #[must_use]
    pub fn indices_of(&self, primitive: &Primitive) -> Resolved<'_, Accessor<'a>> {
        Resolved::lookup(&self.pools.accessors, primitive.indices)
    }

    #[must_use]
    pub fn accessor_of(&self, attribute: &Attribute) -> Resolved<'_, Accessor<'a>> {
        Resolved::lookup(&self.pools.accessors, Some(attribute.accessor))
    }

    #[must_use]
    pub fn buffer_view_of(&self, accessor: &Accessor<'a>) -> Resolved<'_, BufferView<'a>> {
        Resolved::lookup(&self.pools.buffer_views, accessor.buffer_view)
    }

    #[must_use]
    pub fn buffer_of(&self, view: &BufferView<'a>) -> Resolved<'_, Buffer<'a>> {
        Resolved::lookup(&self.pools.buffers, Some(view.buffer))
    }

    /// The bytes of `view` inside the binary chunk.
    ///
    /// Only buffer 0 can stand for the binary chunk, and only when it has no
    /// URI. `None` for any other buffer, or when the view's range does not
    /// fit the binary chunk.
    #[must_use]
    pub fn buffer_view_data(&self, view: &BufferView<'a>) -> Option<&'a [u8]> {
        if view.buffer != 0 {
            return None;
        }
        let buffer = self.buffer_of(view).found()?;
        if buffer.uri.is_some() {
            return None;
        }
        let start = view.byte_offset as usize;
        let end = start.checked_add(view.byte_length as usize)?;
        self.bin.get(start..end)
    }
}
