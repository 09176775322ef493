//! Schema-aware recursive descent over the JSON chunk.
//!
//! Overview
//! - The root object is counted once, then walked member by member. Keys
//!   naming one of the eight known sections are decoded; every other key is
//!   skipped without decoding, so extensions never fail a parse.
//! - Every array is counted before it is walked, and the count sizes the
//!   destination in a single [`Sink::alloc`] call.
//! - The same walk serves the sizing pass and the fill pass; only the sink
//!   differs, so both passes read the input byte for byte identically.
//!
//! Values
//! - After a `:`, `[` or `,` the next structural byte classifies the value:
//!   a quote opens a string, a brace or bracket opens a container, and a
//!   `,` `}` `]` ends a bare value (number, boolean, null) whose span is the
//!   trimmed gap before it. That delimiter is then held in `pending` so the
//!   separator check after the value sees it.
//! - Every other gap between structural bytes must be whitespace. Anything
//!   else there is reported as an unexpected character.
//!
//! Deferred accessor bounds
//! - `min`/`max` can only be decoded once `componentType` and `type` are
//!   known, and those may come later in the same object. The walker saves a
//!   copy of the cursor at the opening bracket, skips the array, and once the
//!   whole accessor object has been read re-scans from the saved cursor.

use bstr::BStr;

use crate::{
    document::{Accessor, Asset, Attribute, Buffer, BufferView, Mesh, Node, Primitive, Scene},
    error::{DecodeError, ErrorSource, SchemaError, SyntaxError},
    fields,
    options::DecodeOptions,
    scanner::{Count, Cursor, closing_name},
    schema::{AccessorType, ComponentType, Semantic},
    sink::{Pooled, Sink, Slice},
};

/// One JSON value, classified by the structural byte that starts or ends it.
#[derive(Debug, Clone, Copy)]
enum Value<'a> {
    Str { span: &'a [u8], at: usize },
    Bare { span: &'a [u8], at: usize },
    Object { at: usize },
    Array { at: usize },
}

impl Value<'_> {
    fn at(&self) -> usize {
        match *self {
            Value::Str { at, .. }
            | Value::Bare { at, .. }
            | Value::Object { at }
            | Value::Array { at } => at,
        }
    }
}

/// The recognized root sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Accessors,
    Asset,
    BufferViews,
    Buffers,
    Meshes,
    Nodes,
    Scene,
    Scenes,
}

impl Section {
    fn from_key(key: &[u8]) -> Option<Self> {
        Some(match key {
            b"accessors" => Self::Accessors,
            b"asset" => Self::Asset,
            b"bufferViews" => Self::BufferViews,
            b"buffers" => Self::Buffers,
            b"meshes" => Self::Meshes,
            b"nodes" => Self::Nodes,
            b"scene" => Self::Scene,
            b"scenes" => Self::Scenes,
            _ => return None,
        })
    }
}

type Result<T> = core::result::Result<T, DecodeError>;

#[allow(clippy::cast_possible_truncation)]
fn narrow(value: f64) -> f32 {
    value as f32
}

pub(crate) struct Walker<'a, 's, S> {
    cursor: Cursor<'a>,
    /// A delimiter already consumed by the bare value before it.
    pending: Option<usize>,
    /// Offset of the JSON bytes inside the caller's buffer.
    base: usize,
    sink: &'s mut S,
    #[cfg_attr(not(any(test, feature = "fuzzing")), allow(dead_code))]
    options: &'s DecodeOptions,
}

impl<'a, 's, S: Sink<'a>> Walker<'a, 's, S> {
    pub fn new(json: &'a [u8], base: usize, sink: &'s mut S, options: &'s DecodeOptions) -> Self {
        Self {
            cursor: Cursor::new(json),
            pending: None,
            base,
            sink,
            options,
        }
    }

    // ---------------------------------------------------------------------
    // Scanning primitives
    // ---------------------------------------------------------------------

    fn fail(&self, source: impl Into<ErrorSource>, at: usize) -> DecodeError {
        let err = DecodeError::new(source, self.base + at);
        #[cfg(any(test, feature = "fuzzing"))]
        if self.options.panic_on_error {
            panic!("{err}");
        }
        err
    }

    fn byte(&self, at: usize) -> u8 {
        self.cursor.src()[at]
    }

    /// Offset of the next structural byte, consuming it.
    fn next(&mut self) -> Result<usize> {
        if let Some(at) = self.pending.take() {
            return Ok(at);
        }
        match self.cursor.seek_next_structural() {
            Some(at) => Ok(at),
            None => Err(self.fail(SyntaxError::UnexpectedEndOfInput, self.cursor.src().len())),
        }
    }

    /// Fails unless only whitespace lies in `start..at`.
    fn blank(&self, start: usize, at: usize, expected: &'static str) -> Result<()> {
        let gap = &self.cursor.src()[start..at];
        match gap.iter().position(|b| !b.is_ascii_whitespace()) {
            None => Ok(()),
            Some(i) => Err(self.fail(
                SyntaxError::UnexpectedCharacter {
                    found: gap[i] as char,
                    expected,
                },
                start + i,
            )),
        }
    }

    /// Consumes the next structural byte, which must be `want` and preceded
    /// by nothing but whitespace.
    fn expect(&mut self, want: u8, expected: &'static str) -> Result<usize> {
        let start = self.cursor.pos();
        let bare = self.pending.is_some();
        let at = self.next()?;
        if !bare {
            self.blank(start, at, expected)?;
        }
        let found = self.byte(at);
        if found == want {
            Ok(at)
        } else {
            Err(self.fail(
                SyntaxError::UnexpectedCharacter {
                    found: found as char,
                    expected,
                },
                at,
            ))
        }
    }

    /// Counts the items of the container just opened.
    fn count(&self, close: u8) -> Result<Count> {
        self.cursor
            .count_items(close)
            .map_err(|(err, at)| self.fail(err, at))
    }

    /// Consumes the `,` between siblings or the closing byte after the last.
    fn separator(&mut self, index: usize, count: usize, close: u8) -> Result<()> {
        if index + 1 < count {
            self.expect(b',', "','")?;
        } else {
            self.expect(close, closing_name(close))?;
        }
        Ok(())
    }

    /// Reads a member key and its colon. Returns the key and the offset of
    /// its opening quote.
    fn key(&mut self) -> Result<(&'a [u8], usize)> {
        let open = self.expect(b'"', "a key")?;
        let close = self.next()?;
        self.expect(b':', "':'")?;
        Ok((&self.cursor.src()[open + 1..close], open))
    }

    fn value(&mut self) -> Result<Value<'a>> {
        debug_assert!(self.pending.is_none());
        let start = self.cursor.pos();
        let at = self.next()?;
        let src = self.cursor.src();
        if src[at] != b',' && src[at] != b'}' && src[at] != b']' {
            self.blank(start, at, "a value")?;
        }
        match src[at] {
            b'"' => {
                let end = self.next()?;
                Ok(Value::Str {
                    span: &src[at + 1..end],
                    at,
                })
            }
            b'{' => Ok(Value::Object { at }),
            b'[' => Ok(Value::Array { at }),
            b',' | b'}' | b']' => {
                let span = fields::trim(&src[start..at]);
                if span.is_empty() {
                    return Err(self.fail(SyntaxError::MissingValue, at));
                }
                self.pending = Some(at);
                Ok(Value::Bare { span, at: start })
            }
            found => Err(self.fail(
                SyntaxError::UnexpectedCharacter {
                    found: found as char,
                    expected: "a value",
                },
                at,
            )),
        }
    }

    /// Steps over a value without decoding it.
    fn skip(&mut self, value: Value<'a>) -> Result<()> {
        let close = match value {
            Value::Object { .. } => b'}',
            Value::Array { .. } => b']',
            Value::Str { .. } | Value::Bare { .. } => return Ok(()),
        };
        let count = self.count(close)?;
        self.cursor.resume_after(count);
        Ok(())
    }

    /// Re-scans from a saved cursor, then resumes where the walk left off.
    fn rescan<R>(
        &mut self,
        from: Cursor<'a>,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let resume = core::mem::replace(&mut self.cursor, from);
        let pending = self.pending.take();
        let out = f(self);
        self.cursor = resume;
        self.pending = pending;
        out
    }

    // ---------------------------------------------------------------------
    // Typed values
    // ---------------------------------------------------------------------

    fn wrong_type(
        &self,
        field: &'static str,
        expected: &'static str,
        value: Value<'a>,
    ) -> DecodeError {
        self.fail(SchemaError::WrongValueType { field, expected }, value.at())
    }

    fn bare(
        &self,
        field: &'static str,
        expected: &'static str,
        value: Value<'a>,
    ) -> Result<(&'a [u8], usize)> {
        match value {
            Value::Bare { span, at } => Ok((span, at)),
            _ => Err(self.wrong_type(field, expected, value)),
        }
    }

    fn uint(&self, field: &'static str, value: Value<'a>) -> Result<u32> {
        let (span, at) = self.bare(field, "an integer", value)?;
        fields::parse_u32(span).map_err(|err| self.fail(err, at))
    }

    fn float(&self, field: &'static str, value: Value<'a>) -> Result<f64> {
        let (span, at) = self.bare(field, "a number", value)?;
        fields::parse_float(span).map_err(|err| self.fail(err, at))
    }

    fn boolean(&self, field: &'static str, value: Value<'a>) -> Result<bool> {
        let (span, at) = self.bare(field, "a boolean", value)?;
        fields::parse_bool(span).map_err(|err| self.fail(err, at))
    }

    fn string(&self, field: &'static str, value: Value<'a>) -> Result<&'a BStr> {
        match value {
            Value::Str { span, .. } => Ok(BStr::new(span)),
            _ => Err(self.wrong_type(field, "a string", value)),
        }
    }

    fn open_object(&self, field: &'static str, value: Value<'a>) -> Result<()> {
        match value {
            Value::Object { .. } => Ok(()),
            _ => Err(self.wrong_type(field, "an object", value)),
        }
    }

    fn open_array(&self, field: &'static str, value: Value<'a>) -> Result<()> {
        match value {
            Value::Array { .. } => Ok(()),
            _ => Err(self.wrong_type(field, "an array", value)),
        }
    }

    // ---------------------------------------------------------------------
    // Containers
    // ---------------------------------------------------------------------

    /// Walks the members of the object just opened. `member` must consume
    /// the value it is handed.
    fn object(
        &mut self,
        mut member: impl FnMut(&mut Self, &'a [u8], Value<'a>) -> Result<()>,
    ) -> Result<()> {
        let count = self.count(b'}')?.items;
        if count == 0 {
            self.expect(b'}', "'}'")?;
            return Ok(());
        }
        for i in 0..count {
            let (key, _) = self.key()?;
            let value = self.value()?;
            member(self, key, value)?;
            self.separator(i, count, b'}')?;
        }
        Ok(())
    }

    /// Like [`Walker::object`], but each member becomes one pooled element.
    /// `member` also gets the offset of the key's opening quote.
    fn members<T: Pooled<'a>>(
        &mut self,
        mut member: impl FnMut(&mut Self, &'a [u8], usize, Value<'a>) -> Result<T>,
    ) -> Result<Slice> {
        let count = self.count(b'}')?.items;
        let slice = self.alloc::<T>(count)?;
        if count == 0 {
            self.expect(b'}', "'}'")?;
            return Ok(slice);
        }
        for i in 0..count {
            let (key, key_at) = self.key()?;
            let value = self.value()?;
            let item = member(self, key, key_at, value)?;
            self.sink.put(slice.start() + i, item);
            self.separator(i, count, b'}')?;
        }
        Ok(slice)
    }

    /// Walks the items of the array just opened into one pooled allocation.
    fn items<T: Pooled<'a>>(
        &mut self,
        mut item: impl FnMut(&mut Self, Value<'a>) -> Result<T>,
    ) -> Result<Slice> {
        let count = self.count(b']')?.items;
        let slice = self.alloc::<T>(count)?;
        if count == 0 {
            self.expect(b']', "']'")?;
            return Ok(slice);
        }
        for i in 0..count {
            let value = self.value()?;
            let decoded = item(self, value)?;
            self.sink.put(slice.start() + i, decoded);
            self.separator(i, count, b']')?;
        }
        Ok(slice)
    }

    fn alloc<T: Pooled<'a>>(&mut self, count: usize) -> Result<Slice> {
        let at = self.cursor.pos();
        match self.sink.alloc::<T>(count) {
            Ok(slice) => Ok(slice),
            Err(err) => Err(self.fail(err, at)),
        }
    }

    /// An array of objects, each decoded by `element`.
    fn objects<T: Pooled<'a>>(
        &mut self,
        field: &'static str,
        value: Value<'a>,
        element: fn(&mut Self) -> Result<T>,
    ) -> Result<Slice> {
        self.open_array(field, value)?;
        self.items(|w, item| {
            w.open_object(field, item)?;
            element(w)
        })
    }

    fn index_list(&mut self, field: &'static str, value: Value<'a>) -> Result<Slice> {
        self.open_array(field, value)?;
        self.items::<u32>(|w, item| w.uint(field, item))
    }

    fn float_list(&mut self, field: &'static str, value: Value<'a>) -> Result<Slice> {
        self.open_array(field, value)?;
        self.items::<f32>(|w, item| w.float(field, item).map(narrow))
    }

    /// A float array of exactly `N` items, stored inline.
    fn floats<const N: usize>(
        &mut self,
        field: &'static str,
        value: Value<'a>,
    ) -> Result<[f32; N]> {
        self.open_array(field, value)?;
        let count = self.count(b']')?.items;
        if count != N {
            return Err(self.fail(
                SchemaError::WrongLength {
                    field,
                    expected: N,
                    found: count,
                },
                value.at(),
            ));
        }
        let mut out = [0.0f32; N];
        for (i, slot) in out.iter_mut().enumerate() {
            let item = self.value()?;
            *slot = narrow(self.float(field, item)?);
            self.separator(i, N, b']')?;
        }
        Ok(out)
    }

    // ---------------------------------------------------------------------
    // Root
    // ---------------------------------------------------------------------

    /// Walks the whole document and returns the number of JSON bytes read.
    pub fn walk(mut self) -> Result<usize> {
        self.expect(b'{', "'{'")?;
        let mut seen: [bool; 8] = [false; 8];

        self.object(|w, key, value| {
            let Some(section) = Section::from_key(key) else {
                log::trace!("skipping unknown root key {:?}", BStr::new(key));
                return w.skip(value);
            };
            if core::mem::replace(&mut seen[section as usize], true) {
                log::warn!("ignoring repeated root section {section:?}");
                return w.skip(value);
            }
            w.section(section, value)
        })?;

        let end = self.cursor.pos();
        self.blank(end, self.cursor.src().len(), "end of input")?;
        Ok(end)
    }

    fn section(&mut self, section: Section, value: Value<'a>) -> Result<()> {
        let slice = match section {
            Section::Asset => {
                self.open_object("asset", value)?;
                let asset = self.asset()?;
                self.sink.asset(asset);
                return Ok(());
            }
            Section::Scene => {
                let scene = self.uint("scene", value)?;
                self.sink.default_scene(scene);
                return Ok(());
            }
            Section::Scenes => self.objects("scenes", value, Self::scene)?,
            Section::Nodes => self.objects("nodes", value, Self::node)?,
            Section::Meshes => self.objects("meshes", value, Self::mesh)?,
            Section::Accessors => self.objects("accessors", value, Self::accessor)?,
            Section::BufferViews => self.objects("bufferViews", value, Self::buffer_view)?,
            Section::Buffers => self.objects("buffers", value, Self::buffer)?,
        };
        log::debug!("{section:?}: {} elements", slice.len());
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Elements
    // ---------------------------------------------------------------------

    fn asset(&mut self) -> Result<Asset<'a>> {
        let mut asset = Asset::default();
        self.object(|w, key, value| {
            match key {
                b"generator" => asset.generator = Some(w.string("generator", value)?),
                b"version" => asset.version = Some(w.string("version", value)?),
                b"minVersion" => asset.min_version = Some(w.string("minVersion", value)?),
                b"copyright" => asset.copyright = Some(w.string("copyright", value)?),
                _ => w.skip(value)?,
            }
            Ok(())
        })?;
        Ok(asset)
    }

    fn scene(&mut self) -> Result<Scene<'a>> {
        let mut scene = Scene::default();
        self.object(|w, key, value| {
            match key {
                b"name" => scene.name = Some(w.string("name", value)?),
                b"nodes" => scene.nodes = w.index_list("nodes", value)?,
                _ => w.skip(value)?,
            }
            Ok(())
        })?;
        Ok(scene)
    }

    fn node(&mut self) -> Result<Node<'a>> {
        let mut node = Node::default();
        self.object(|w, key, value| {
            match key {
                b"name" => node.name = Some(w.string("name", value)?),
                b"mesh" => node.mesh = Some(w.uint("mesh", value)?),
                b"skin" => node.skin = Some(w.uint("skin", value)?),
                b"matrix" => node.matrix = w.floats("matrix", value)?,
                b"translation" => node.translation = w.floats("translation", value)?,
                b"rotation" => node.rotation = w.floats("rotation", value)?,
                b"scale" => node.scale = w.floats("scale", value)?,
                b"children" => node.children = w.index_list("children", value)?,
                _ => w.skip(value)?,
            }
            Ok(())
        })?;
        Ok(node)
    }

    fn mesh(&mut self) -> Result<Mesh<'a>> {
        let mut mesh = Mesh::default();
        self.object(|w, key, value| {
            match key {
                b"name" => mesh.name = Some(w.string("name", value)?),
                b"primitives" => mesh.primitives = w.objects("primitives", value, Self::primitive)?,
                b"weights" => mesh.weights = w.float_list("weights", value)?,
                _ => w.skip(value)?,
            }
            Ok(())
        })?;
        Ok(mesh)
    }

    fn primitive(&mut self) -> Result<Primitive> {
        let mut primitive = Primitive::default();
        self.object(|w, key, value| {
            match key {
                b"attributes" => {
                    w.open_object("attributes", value)?;
                    primitive.attributes = w.members::<Attribute>(|w, name, name_at, value| {
                        let (semantic, set_index) =
                            Semantic::parse(name).map_err(|err| w.fail(err, name_at))?;
                        Ok(Attribute {
                            accessor: w.uint("attributes", value)?,
                            semantic,
                            set_index,
                        })
                    })?;
                }
                b"indices" => primitive.indices = Some(w.uint("indices", value)?),
                b"material" => primitive.material = Some(w.uint("material", value)?),
                b"mode" => primitive.mode = w.uint("mode", value)?,
                _ => w.skip(value)?,
            }
            Ok(())
        })?;
        Ok(primitive)
    }

    fn accessor(&mut self) -> Result<Accessor<'a>> {
        let start = self.cursor.pos();
        let mut accessor = Accessor::default();
        let mut min_at = None;
        let mut max_at = None;

        self.object(|w, key, value| {
            match key {
                b"name" => accessor.name = Some(w.string("name", value)?),
                b"bufferView" => accessor.buffer_view = Some(w.uint("bufferView", value)?),
                b"byteOffset" => accessor.byte_offset = w.uint("byteOffset", value)?,
                b"count" => accessor.count = w.uint("count", value)?,
                b"normalized" => accessor.normalized = w.boolean("normalized", value)?,
                b"componentType" => {
                    let (span, at) = w.bare("componentType", "an integer", value)?;
                    let ty = ComponentType::from_code(span).ok_or_else(|| {
                        w.fail(SchemaError::UnknownComponentType(span.into()), at)
                    })?;
                    accessor.component_type = Some(ty);
                }
                b"type" => {
                    let span = w.string("type", value)?;
                    let ty = AccessorType::from_name(span).ok_or_else(|| {
                        w.fail(SchemaError::UnknownAccessorType(span.into()), value.at())
                    })?;
                    accessor.kind = Some(ty);
                }
                b"min" | b"max" => {
                    w.open_array(if key == b"min" { "min" } else { "max" }, value)?;
                    let saved = w.cursor;
                    w.skip(value)?;
                    if key == b"min" {
                        min_at = Some(saved);
                    } else {
                        max_at = Some(saved);
                    }
                }
                _ => w.skip(value)?,
            }
            Ok(())
        })?;

        if min_at.is_none() && max_at.is_none() {
            return Ok(accessor);
        }
        let (Some(component_type), Some(kind)) = (accessor.component_type, accessor.kind) else {
            return Err(self.fail(SchemaError::UnresolvedBounds, start));
        };
        if let Some(from) = min_at {
            let slice = self.rescan(from, |w| w.bounds("min", component_type, kind))?;
            accessor.min = Some(slice);
        }
        if let Some(from) = max_at {
            let slice = self.rescan(from, |w| w.bounds("max", component_type, kind))?;
            accessor.max = Some(slice);
        }
        Ok(accessor)
    }

    /// Decodes a `min`/`max` array into little-endian components.
    fn bounds(
        &mut self,
        field: &'static str,
        ty: ComponentType,
        kind: AccessorType,
    ) -> Result<Slice> {
        let at = self.cursor.pos();
        let count = self.count(b']')?.items;
        let expected = kind.component_count();
        if count != expected {
            return Err(self.fail(
                SchemaError::WrongLength {
                    field,
                    expected,
                    found: count,
                },
                at,
            ));
        }

        let width = ty.byte_width();
        let slice = self.alloc::<u8>(count * width)?;
        for i in 0..count {
            let item = self.value()?;
            let value = self.float(field, item)?;
            let mut bytes = [0u8; 4];
            let written = ty
                .encode(value, &mut bytes)
                .map_err(|err| self.fail(err, item.at()))?;
            for (j, &b) in bytes[..written].iter().enumerate() {
                self.sink.put::<u8>(slice.start() + i * width + j, b);
            }
            self.separator(i, count, b']')?;
        }
        Ok(slice)
    }

    fn buffer_view(&mut self) -> Result<BufferView<'a>> {
        let mut view = BufferView::default();
        self.object(|w, key, value| {
            match key {
                b"name" => view.name = Some(w.string("name", value)?),
                b"buffer" => view.buffer = w.uint("buffer", value)?,
                b"byteLength" => view.byte_length = w.uint("byteLength", value)?,
                b"byteOffset" => view.byte_offset = w.uint("byteOffset", value)?,
                b"byteStride" => view.byte_stride = w.uint("byteStride", value)?,
                b"target" => view.target = Some(w.uint("target", value)?),
                _ => w.skip(value)?,
            }
            Ok(())
        })?;
        Ok(view)
    }

    fn buffer(&mut self) -> Result<Buffer<'a>> {
        let mut buffer = Buffer::default();
        self.object(|w, key, value| {
            match key {
                b"name" => buffer.name = Some(w.string("name", value)?),
                b"uri" => buffer.uri = Some(w.string("uri", value)?),
                b"byteLength" => {
                    let (span, at) = w.bare("byteLength", "an integer", value)?;
                    buffer.byte_length = fields::parse_u64(span).map_err(|err| w.fail(err, at))?;
                }
                _ => w.skip(value)?,
            }
            Ok(())
        })?;
        Ok(buffer)
    }
}
