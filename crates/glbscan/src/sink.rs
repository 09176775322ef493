//! Where the walker's output goes.
//!
//! The walker is written once and is generic over a [`Sink`]. Two sinks
//! exist:
//! - [`Sizer`] only counts. Every allocation request bumps a per-pool total
//!   in [`Sizes`] and every write is dropped.
//! - [`Filler`] writes into [`Pools`]. It either grows the pools as the
//!   walker counts each array (the direct protocol), or is bounded by a
//!   [`Sizes`] record from an earlier sizing pass and refuses to go past it
//!   or past the storage the arena already holds (the arena protocol).
//!
//! Because both sinks hand out slices from running per-pool totals, a
//! sizing pass and a fill pass over the same bytes produce identical slice
//! offsets.
//!
//! Nested collections (a node's children, a mesh's primitives, a
//! primitive's attributes, accessor bounds) are [`Slice`]s into shared flat
//! pools, so tearing down a document is dropping one set of vectors.
//!
//! Every pool is a vector over the caller's [`Allocator`]; nothing here
//! touches the global heap unless the caller hands in [`Global`].

use core::ops::Range;

use allocator_api2::{
    alloc::{Allocator, Global},
    vec::Vec,
};

use crate::{
    document::{
        Accessor, Asset, Attribute, Buffer, BufferView, Document, Mesh, Node, Primitive, Scene,
    },
    error::{CapacityError, DecodeError},
};

/// One of the flat pools a document is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Pool {
    Scenes,
    Nodes,
    Meshes,
    Primitives,
    Attributes,
    Accessors,
    BufferViews,
    Buffers,
    /// Node indices: scene roots and node children.
    Indices,
    /// Mesh morph-target weights.
    Weights,
    /// Little-endian accessor `min`/`max` components.
    BoundBytes,
}

impl Pool {
    pub const ALL: [Pool; 11] = [
        Pool::Scenes,
        Pool::Nodes,
        Pool::Meshes,
        Pool::Primitives,
        Pool::Attributes,
        Pool::Accessors,
        Pool::BufferViews,
        Pool::Buffers,
        Pool::Indices,
        Pool::Weights,
        Pool::BoundBytes,
    ];
}

/// A run of consecutive elements in one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Slice {
    start: u32,
    len: u32,
}

impl Slice {
    fn new(pool: Pool, start: usize, len: usize) -> Result<Self, CapacityError> {
        let too_big = || CapacityError::Exceeded {
            pool,
            capacity: u32::MAX as usize,
            requested: start.saturating_add(len),
        };
        let end = start.checked_add(len).ok_or_else(too_big)?;
        u32::try_from(end).map_err(|_| too_big())?;
        Ok(Self {
            start: u32::try_from(start).map_err(|_| too_big())?,
            len: u32::try_from(len).map_err(|_| too_big())?,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub(crate) fn range(&self) -> Range<usize> {
        self.start()..self.start() + self.len()
    }
}

/// Exact element counts per pool, as computed by a sizing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Sizes {
    pub scenes: usize,
    pub nodes: usize,
    pub meshes: usize,
    pub primitives: usize,
    pub attributes: usize,
    pub accessors: usize,
    pub buffer_views: usize,
    pub buffers: usize,
    pub indices: usize,
    pub weights: usize,
    pub bound_bytes: usize,
    /// JSON bytes consumed by the walk, up to and including the closing
    /// brace of the root object.
    pub consumed: usize,
}

impl Sizes {
    #[must_use]
    pub fn get(&self, pool: Pool) -> usize {
        match pool {
            Pool::Scenes => self.scenes,
            Pool::Nodes => self.nodes,
            Pool::Meshes => self.meshes,
            Pool::Primitives => self.primitives,
            Pool::Attributes => self.attributes,
            Pool::Accessors => self.accessors,
            Pool::BufferViews => self.buffer_views,
            Pool::Buffers => self.buffers,
            Pool::Indices => self.indices,
            Pool::Weights => self.weights,
            Pool::BoundBytes => self.bound_bytes,
        }
    }

    fn slot_mut(&mut self, pool: Pool) -> &mut usize {
        match pool {
            Pool::Scenes => &mut self.scenes,
            Pool::Nodes => &mut self.nodes,
            Pool::Meshes => &mut self.meshes,
            Pool::Primitives => &mut self.primitives,
            Pool::Attributes => &mut self.attributes,
            Pool::Accessors => &mut self.accessors,
            Pool::BufferViews => &mut self.buffer_views,
            Pool::Buffers => &mut self.buffers,
            Pool::Indices => &mut self.indices,
            Pool::Weights => &mut self.weights,
            Pool::BoundBytes => &mut self.bound_bytes,
        }
    }

    /// Bytes of element storage an arena built from these sizes reserves.
    #[must_use]
    pub fn arena_bytes(&self) -> usize {
        use core::mem::size_of;

        self.scenes * size_of::<Scene<'_>>()
            + self.nodes * size_of::<Node<'_>>()
            + self.meshes * size_of::<Mesh<'_>>()
            + self.primitives * size_of::<Primitive>()
            + self.attributes * size_of::<Attribute>()
            + self.accessors * size_of::<Accessor<'_>>()
            + self.buffer_views * size_of::<BufferView<'_>>()
            + self.buffers * size_of::<Buffer<'_>>()
            + self.indices * size_of::<u32>()
            + self.weights * size_of::<f32>()
            + self.bound_bytes
    }
}

/// Backing storage of a [`Document`].
#[derive(Debug, Clone)]
pub(crate) struct Pools<'a, A: Allocator> {
    pub scenes: Vec<Scene<'a>, A>,
    pub nodes: Vec<Node<'a>, A>,
    pub meshes: Vec<Mesh<'a>, A>,
    pub primitives: Vec<Primitive, A>,
    pub attributes: Vec<Attribute, A>,
    pub accessors: Vec<Accessor<'a>, A>,
    pub buffer_views: Vec<BufferView<'a>, A>,
    pub buffers: Vec<Buffer<'a>, A>,
    pub indices: Vec<u32, A>,
    pub weights: Vec<f32, A>,
    pub bound_bytes: Vec<u8, A>,
}

impl<A: Allocator + Clone> Pools<'_, A> {
    fn with_capacity_in(sizes: &Sizes, alloc: A) -> Self {
        Self {
            scenes: Vec::with_capacity_in(sizes.scenes, alloc.clone()),
            nodes: Vec::with_capacity_in(sizes.nodes, alloc.clone()),
            meshes: Vec::with_capacity_in(sizes.meshes, alloc.clone()),
            primitives: Vec::with_capacity_in(sizes.primitives, alloc.clone()),
            attributes: Vec::with_capacity_in(sizes.attributes, alloc.clone()),
            accessors: Vec::with_capacity_in(sizes.accessors, alloc.clone()),
            buffer_views: Vec::with_capacity_in(sizes.buffer_views, alloc.clone()),
            buffers: Vec::with_capacity_in(sizes.buffers, alloc.clone()),
            indices: Vec::with_capacity_in(sizes.indices, alloc.clone()),
            weights: Vec::with_capacity_in(sizes.weights, alloc.clone()),
            bound_bytes: Vec::with_capacity_in(sizes.bound_bytes, alloc),
        }
    }
}

impl<A: Allocator> Pools<'_, A> {
    fn len(&self, pool: Pool) -> usize {
        match pool {
            Pool::Scenes => self.scenes.len(),
            Pool::Nodes => self.nodes.len(),
            Pool::Meshes => self.meshes.len(),
            Pool::Primitives => self.primitives.len(),
            Pool::Attributes => self.attributes.len(),
            Pool::Accessors => self.accessors.len(),
            Pool::BufferViews => self.buffer_views.len(),
            Pool::Buffers => self.buffers.len(),
            Pool::Indices => self.indices.len(),
            Pool::Weights => self.weights.len(),
            Pool::BoundBytes => self.bound_bytes.len(),
        }
    }

    fn clear(&mut self) {
        self.scenes.clear();
        self.nodes.clear();
        self.meshes.clear();
        self.primitives.clear();
        self.attributes.clear();
        self.accessors.clear();
        self.buffer_views.clear();
        self.buffers.clear();
        self.indices.clear();
        self.weights.clear();
        self.bound_bytes.clear();
    }
}

// Pools compare by contents, whatever allocator backs either side.
impl<'a, A: Allocator, B: Allocator> PartialEq<Pools<'a, B>> for Pools<'a, A> {
    fn eq(&self, other: &Pools<'a, B>) -> bool {
        self.scenes.as_slice() == other.scenes.as_slice()
            && self.nodes.as_slice() == other.nodes.as_slice()
            && self.meshes.as_slice() == other.meshes.as_slice()
            && self.primitives.as_slice() == other.primitives.as_slice()
            && self.attributes.as_slice() == other.attributes.as_slice()
            && self.accessors.as_slice() == other.accessors.as_slice()
            && self.buffer_views.as_slice() == other.buffer_views.as_slice()
            && self.buffers.as_slice() == other.buffers.as_slice()
            && self.indices.as_slice() == other.indices.as_slice()
            && self.weights.as_slice() == other.weights.as_slice()
            && self.bound_bytes.as_slice() == other.bound_bytes.as_slice()
    }
}

#[cfg(feature = "serde")]
impl<A: Allocator> serde::Serialize for Pools<'_, A> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut out = serializer.serialize_struct("Pools", Pool::ALL.len())?;
        out.serialize_field("scenes", self.scenes.as_slice())?;
        out.serialize_field("nodes", self.nodes.as_slice())?;
        out.serialize_field("meshes", self.meshes.as_slice())?;
        out.serialize_field("primitives", self.primitives.as_slice())?;
        out.serialize_field("attributes", self.attributes.as_slice())?;
        out.serialize_field("accessors", self.accessors.as_slice())?;
        out.serialize_field("buffer_views", self.buffer_views.as_slice())?;
        out.serialize_field("buffers", self.buffers.as_slice())?;
        out.serialize_field("indices", self.indices.as_slice())?;
        out.serialize_field("weights", self.weights.as_slice())?;
        out.serialize_field("bound_bytes", self.bound_bytes.as_slice())?;
        out.end()
    }
}

/// A type stored in one of the document pools.
pub(crate) trait Pooled<'a>: Sized + Default {
    const POOL: Pool;

    fn pool<'p, A: Allocator>(pools: &'p mut Pools<'a, A>) -> &'p mut Vec<Self, A>;
}

macro_rules! pooled {
    ($lt:lifetime; $($ty:ty => $pool:ident . $field:ident),* $(,)?) => {
        $(
            impl<$lt> Pooled<$lt> for $ty {
                const POOL: Pool = Pool::$pool;

                #[inline]
                fn pool<'p, A: Allocator>(pools: &'p mut Pools<$lt, A>) -> &'p mut Vec<Self, A> {
                    &mut pools.$field
                }
            }
        )*
    };
}

pooled! {
    'a;
    Scene<'a> => Scenes.scenes,
    Node<'a> => Nodes.nodes,
    Mesh<'a> => Meshes.meshes,
    Primitive => Primitives.primitives,
    Attribute => Attributes.attributes,
    Accessor<'a> => Accessors.accessors,
    BufferView<'a> => BufferViews.buffer_views,
    Buffer<'a> => Buffers.buffers,
    u32 => Indices.indices,
    f32 => Weights.weights,
    u8 => BoundBytes.bound_bytes,
}

/// Output capability of the walker: counting mode or writing mode.
pub(crate) trait Sink<'a> {
    /// Reserves `count` consecutive elements of `T` and returns where they
    /// start.
    fn alloc<T: Pooled<'a>>(&mut self, count: usize) -> Result<Slice, CapacityError>;

    /// Stores `value` at an index previously handed out by [`Sink::alloc`].
    fn put<T: Pooled<'a>>(&mut self, at: usize, value: T);

    fn asset(&mut self, asset: Asset<'a>);

    fn default_scene(&mut self, scene: u32);
}

/// Counting mode: records sizes and writes nothing.
#[derive(Debug, Default)]
pub(crate) struct Sizer {
    pub sizes: Sizes,
}

impl<'a> Sink<'a> for Sizer {
    fn alloc<T: Pooled<'a>>(&mut self, count: usize) -> Result<Slice, CapacityError> {
        let total = self.sizes.slot_mut(T::POOL);
        let slice = Slice::new(T::POOL, *total, count)?;
        *total += count;
        Ok(slice)
    }

    #[inline]
    fn put<T: Pooled<'a>>(&mut self, _at: usize, _value: T) {}

    #[inline]
    fn asset(&mut self, _asset: Asset<'a>) {}

    #[inline]
    fn default_scene(&mut self, _scene: u32) {}
}

/// Pre-sized storage for the arena protocol.
///
/// Every pool is reserved once, up front, from a [`Sizes`] record; the fill
/// pass then writes into that storage and fails with
/// [`CapacityError::Exceeded`] rather than grow it.
#[derive(Debug)]
pub struct Arena<'a, A: Allocator = Global> {
    pub(crate) pools: Pools<'a, A>,
}

impl Arena<'_> {
    /// An arena on the global heap.
    #[must_use]
    pub fn new(sizes: &Sizes) -> Self {
        Self::new_in(sizes, Global)
    }
}

impl<A: Allocator + Clone> Arena<'_, A> {
    /// An arena whose pools come from `alloc`, one allocation per non-empty
    /// pool.
    #[must_use]
    pub fn new_in(sizes: &Sizes, alloc: A) -> Self {
        Self {
            pools: Pools::with_capacity_in(sizes, alloc),
        }
    }
}

/// An arena with no storage. Filling it fails unless the document is empty.
impl Default for Arena<'_> {
    fn default() -> Self {
        Self::new(&Sizes::default())
    }
}

impl<A: Allocator> Arena<'_, A> {
    /// Elements the arena can hold in `pool` without allocating.
    #[must_use]
    pub fn capacity(&self, pool: Pool) -> usize {
        match pool {
            Pool::Scenes => self.pools.scenes.capacity(),
            Pool::Nodes => self.pools.nodes.capacity(),
            Pool::Meshes => self.pools.meshes.capacity(),
            Pool::Primitives => self.pools.primitives.capacity(),
            Pool::Attributes => self.pools.attributes.capacity(),
            Pool::Accessors => self.pools.accessors.capacity(),
            Pool::BufferViews => self.pools.buffer_views.capacity(),
            Pool::Buffers => self.pools.buffers.capacity(),
            Pool::Indices => self.pools.indices.capacity(),
            Pool::Weights => self.pools.weights.capacity(),
            Pool::BoundBytes => self.pools.bound_bytes.capacity(),
        }
    }
}

/// Writing mode.
#[derive(Debug)]
pub(crate) struct Filler<'a, A: Allocator> {
    pools: Pools<'a, A>,
    asset: Asset<'a>,
    scene: Option<u32>,
    /// Set in the arena protocol: the fill may not exceed these sizes.
    limits: Option<Sizes>,
}

impl<'a, A: Allocator + Clone> Filler<'a, A> {
    /// A filler that grows its pools through `alloc` as arrays are counted.
    pub fn growable(alloc: A) -> Self {
        Self {
            pools: Pools::with_capacity_in(&Sizes::default(), alloc),
            asset: Asset::default(),
            scene: None,
            limits: None,
        }
    }
}

impl<'a, A: Allocator> Filler<'a, A> {
    /// A filler confined to `arena`, which must have been sized by `sizes`.
    pub fn bounded(mut arena: Arena<'a, A>, sizes: &Sizes) -> Self {
        arena.pools.clear();
        Self {
            pools: arena.pools,
            asset: Asset::default(),
            scene: None,
            limits: Some(*sizes),
        }
    }

    /// Seals the pools into a document.
    ///
    /// In the arena protocol every pool must be filled to exactly its sized
    /// length.
    pub fn finish(
        self,
        bin: &'a [u8],
        consumed: usize,
        base: usize,
    ) -> Result<Document<'a, A>, DecodeError> {
        if let Some(limits) = &self.limits {
            for pool in Pool::ALL {
                let (expected, found) = (limits.get(pool), self.pools.len(pool));
                if expected != found {
                    return Err(DecodeError::new(
                        CapacityError::Mismatch {
                            pool,
                            expected,
                            found,
                        },
                        base + consumed,
                    ));
                }
            }
        }

        Ok(Document {
            asset: self.asset,
            scene: self.scene,
            pools: self.pools,
            bin,
            consumed,
        })
    }
}

impl<'a, A: Allocator> Sink<'a> for Filler<'a, A> {
    fn alloc<T: Pooled<'a>>(&mut self, count: usize) -> Result<Slice, CapacityError> {
        let pool = T::pool(&mut self.pools);
        let start = pool.len();
        let slice = Slice::new(T::POOL, start, count)?;
        let end = start + count;

        match &self.limits {
            Some(limits) => {
                // Bounded by the sized total and by what the arena holds.
                let capacity = limits.get(T::POOL).min(pool.capacity());
                if end > capacity {
                    return Err(CapacityError::Exceeded {
                        pool: T::POOL,
                        capacity,
                        requested: end,
                    });
                }
            }
            None => pool.reserve(count),
        }

        pool.resize_with(end, T::default);
        Ok(slice)
    }

    #[inline]
    fn put<T: Pooled<'a>>(&mut self, at: usize, value: T) {
        if let Some(slot) = T::pool(&mut self.pools).get_mut(at) {
            *slot = value;
        }
    }

    fn asset(&mut self, asset: Asset<'a>) {
        self.asset = asset;
    }

    fn default_scene(&mut self, scene: u32) {
        self.scene = Some(scene);
    }
}
