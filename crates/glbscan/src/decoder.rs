//! Entry points.
//!
//! Two protocols produce the same [`Document`]:
//! - direct: [`Decoder::parse`] grows the pools through the allocator it is
//!   handed as it walks;
//! - arena: [`Decoder::size`] computes exact pool sizes without writing, the
//!   caller builds an [`Arena`] from them (or reuses one), and
//!   [`Decoder::fill`] walks again into that storage without allocating.
//!
//! Each call is independent and holds no state between calls.

use allocator_api2::alloc::Allocator;

use crate::{
    container::{Container, JSON_START},
    document::Document,
    error::DecodeError,
    options::DecodeOptions,
    sink::{Arena, Filler, Sizer, Sizes},
    walker::Walker,
};

/// A configured decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    #[must_use]
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes a binary container in one call. Every pool of the document
    /// is allocated through `alloc`.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`]; nothing is returned on failure.
    pub fn parse<'a, A: Allocator + Clone>(
        &self,
        bytes: &'a [u8],
        alloc: A,
    ) -> Result<Document<'a, A>, DecodeError> {
        let container = Container::read(bytes, &self.options)?;
        self.decode(container.json, JSON_START, container.bin, Filler::growable(alloc))
    }

    /// The sizing pass of the arena protocol. Allocates nothing.
    ///
    /// # Errors
    ///
    /// The same errors [`Decoder::parse`] would report for `bytes`.
    pub fn size(&self, bytes: &[u8]) -> Result<Sizes, DecodeError> {
        let container = Container::read(bytes, &self.options)?;
        let mut sizer = Sizer::default();
        let consumed = Walker::new(container.json, JSON_START, &mut sizer, &self.options).walk()?;
        sizer.sizes.consumed = consumed;
        log::debug!("sized {consumed} JSON bytes: {:?}", sizer.sizes);
        Ok(sizer.sizes)
    }

    /// The fill pass of the arena protocol.
    ///
    /// `sizes` must come from [`Decoder::size`] over the same `bytes`. The
    /// arena is cleared and reused; the fill never grows its storage.
    ///
    /// # Errors
    ///
    /// A [`CapacityError`](crate::CapacityError) when the input needs more
    /// or fewer elements than `sizes` records, or more than `arena` holds,
    /// plus anything [`Decoder::parse`] reports.
    pub fn fill<'a, A: Allocator>(
        &self,
        bytes: &'a [u8],
        arena: Arena<'a, A>,
        sizes: &Sizes,
    ) -> Result<Document<'a, A>, DecodeError> {
        let container = Container::read(bytes, &self.options)?;
        let filler = Filler::bounded(arena, sizes);
        self.decode(container.json, JSON_START, container.bin, filler)
    }

    /// Decodes a bare JSON document, as found in a `.gltf` file. The
    /// resulting document has an empty binary chunk.
    ///
    /// # Errors
    ///
    /// Any syntax, schema or capacity error.
    pub fn parse_json<'a, A: Allocator + Clone>(
        &self,
        json: &'a [u8],
        alloc: A,
    ) -> Result<Document<'a, A>, DecodeError> {
        self.decode(json, 0, &[], Filler::growable(alloc))
    }

    fn decode<'a, A: Allocator>(
        &self,
        json: &'a [u8],
        base: usize,
        bin: &'a [u8],
        mut filler: Filler<'a, A>,
    ) -> Result<Document<'a, A>, DecodeError> {
        let consumed = Walker::new(json, base, &mut filler, &self.options).walk()?;
        filler.finish(bin, consumed, base)
    }
}

/// [`Decoder::parse`] with default options.
///
/// # Errors
///
/// See [`Decoder::parse`].
pub fn parse<A: Allocator + Clone>(
    bytes: &[u8],
    alloc: A,
) -> Result<Document<'_, A>, DecodeError> {
    Decoder::default().parse(bytes, alloc)
}

/// [`Decoder::size`] with default options.
///
/// # Errors
///
/// See [`Decoder::size`].
pub fn size(bytes: &[u8]) -> Result<Sizes, DecodeError> {
    Decoder::default().size(bytes)
}

/// [`Decoder::fill`] with default options.
///
/// # Errors
///
/// See [`Decoder::fill`].
pub fn fill<'a, A: Allocator>(
    bytes: &'a [u8],
    arena: Arena<'a, A>,
    sizes: &Sizes,
) -> Result<Document<'a, A>, DecodeError> {
    Decoder::default().fill(bytes, arena, sizes)
}

/// [`Decoder::parse_json`] with default options.
///
/// # Errors
///
/// See [`Decoder::parse_json`].
pub fn parse_json<A: Allocator + Clone>(
    json: &[u8],
    alloc: A,
) -> Result<Document<'_, A>, DecodeError> {
    Decoder::default().parse_json(json, alloc)
}
