//! Fixed vocabularies of the format and their lookup tables.

use bstr::BString;

use crate::{error::SchemaError, fields};

/// Scalar type of one accessor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

static COMPONENT_TYPES: [(&[u8], ComponentType); 6] = [
    (b"5120", ComponentType::I8),
    (b"5121", ComponentType::U8),
    (b"5122", ComponentType::I16),
    (b"5123", ComponentType::U16),
    (b"5125", ComponentType::U32),
    (b"5126", ComponentType::F32),
];

impl ComponentType {
    /// Looks up a `componentType` code by its exact spelling.
    #[must_use]
    pub fn from_code(span: &[u8]) -> Option<Self> {
        COMPONENT_TYPES
            .iter()
            .find(|(code, _)| *code == span)
            .map(|&(_, ty)| ty)
    }

    /// The numeric code used in the JSON.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::I8 => 5120,
            Self::U8 => 5121,
            Self::I16 => 5122,
            Self::U16 => 5123,
            Self::U32 => 5125,
            Self::F32 => 5126,
        }
    }

    #[must_use]
    pub fn byte_width(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    /// Writes `value` as one little-endian component into `out`, returning
    /// the number of bytes written. Integer types truncate toward zero.
    pub(crate) fn encode(self, value: f64, out: &mut [u8; 4]) -> Result<usize, SchemaError> {
        fn int<T: TryFrom<i64>>(value: f64) -> Result<T, SchemaError> {
            let truncated = value.trunc();
            #[allow(clippy::cast_possible_truncation)]
            let wide = truncated as i64;
            #[allow(clippy::cast_precision_loss)]
            let exact = wide as f64 == truncated;
            if !exact {
                return Err(SchemaError::BoundOutOfRange { value });
            }
            T::try_from(wide).map_err(|_| SchemaError::BoundOutOfRange { value })
        }

        let width = self.byte_width();
        match self {
            Self::I8 => out[..1].copy_from_slice(&int::<i8>(value)?.to_le_bytes()),
            Self::U8 => out[..1].copy_from_slice(&int::<u8>(value)?.to_le_bytes()),
            Self::I16 => out[..2].copy_from_slice(&int::<i16>(value)?.to_le_bytes()),
            Self::U16 => out[..2].copy_from_slice(&int::<u16>(value)?.to_le_bytes()),
            Self::U32 => out.copy_from_slice(&int::<u32>(value)?.to_le_bytes()),
            #[allow(clippy::cast_possible_truncation)]
            Self::F32 => out.copy_from_slice(&(value as f32).to_le_bytes()),
        }
        Ok(width)
    }

    /// Reads one little-endian component. `bytes` must be exactly
    /// [`ComponentType::byte_width`] long.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<Component> {
        Some(match self {
            Self::I8 => Component::I8(i8::from_le_bytes(bytes.try_into().ok()?)),
            Self::U8 => Component::U8(u8::from_le_bytes(bytes.try_into().ok()?)),
            Self::I16 => Component::I16(i16::from_le_bytes(bytes.try_into().ok()?)),
            Self::U16 => Component::U16(u16::from_le_bytes(bytes.try_into().ok()?)),
            Self::U32 => Component::U32(u32::from_le_bytes(bytes.try_into().ok()?)),
            Self::F32 => Component::F32(f32::from_le_bytes(bytes.try_into().ok()?)),
        })
    }
}

/// One decoded accessor component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Component {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    U32(u32),
    F32(f32),
}

impl Component {
    /// Widens the component to `f64`, which holds every variant exactly.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::I8(v) => f64::from(v),
            Self::U8(v) => f64::from(v),
            Self::I16(v) => f64::from(v),
            Self::U16(v) => f64::from(v),
            Self::U32(v) => f64::from(v),
            Self::F32(v) => f64::from(v),
        }
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

static ACCESSOR_TYPES: [(&[u8], AccessorType); 7] = [
    (b"SCALAR", AccessorType::Scalar),
    (b"VEC2", AccessorType::Vec2),
    (b"VEC3", AccessorType::Vec3),
    (b"VEC4", AccessorType::Vec4),
    (b"MAT2", AccessorType::Mat2),
    (b"MAT3", AccessorType::Mat3),
    (b"MAT4", AccessorType::Mat4),
];

impl AccessorType {
    #[must_use]
    pub fn from_name(span: &[u8]) -> Option<Self> {
        ACCESSOR_TYPES
            .iter()
            .find(|(name, _)| *name == span)
            .map(|&(_, ty)| ty)
    }

    /// Number of components in one element.
    #[must_use]
    pub fn component_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

/// What an attribute's data means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Semantic {
    #[default]
    Position,
    Normal,
    Tangent,
    TexCoord,
    Color,
    Joints,
    Weights,
}

/// Prefix, semantic, and whether the semantic is numbered (`_<n>` suffix).
static SEMANTICS: [(&[u8], Semantic, bool); 7] = [
    (b"POSITION", Semantic::Position, false),
    (b"NORMAL", Semantic::Normal, false),
    (b"TANGENT", Semantic::Tangent, false),
    (b"TEXCOORD", Semantic::TexCoord, true),
    (b"COLOR", Semantic::Color, true),
    (b"JOINTS", Semantic::Joints, true),
    (b"WEIGHTS", Semantic::Weights, true),
];

impl Semantic {
    /// Resolves an attribute key such as `POSITION` or `TEXCOORD_1` into its
    /// semantic and set index (`-1` for unnumbered semantics).
    ///
    /// # Errors
    ///
    /// Numbered semantics without a suffix, unnumbered semantics with one,
    /// and names outside the vocabulary are rejected.
    pub fn parse(name: &[u8]) -> Result<(Self, i32), SchemaError> {
        for &(prefix, semantic, numbered) in &SEMANTICS {
            let Some(rest) = name.strip_prefix(prefix) else {
                continue;
            };
            match rest.split_first() {
                None if numbered => return Err(SchemaError::MissingSetIndex(BString::from(name))),
                None => return Ok((semantic, -1)),
                Some((b'_', digits)) if numbered => {
                    return fields::parse_u32(digits)
                        .ok()
                        .filter(|_| digits.iter().all(u8::is_ascii_digit))
                        .and_then(|set| i32::try_from(set).ok())
                        .map(|set| (semantic, set))
                        .ok_or_else(|| SchemaError::UnknownSemantic(BString::from(name)));
                }
                Some((b'_', _)) => {
                    return Err(SchemaError::UnexpectedSetIndex(BString::from(name)));
                }
                Some(_) => {}
            }
        }
        Err(SchemaError::UnknownSemantic(BString::from(name)))
    }
}

/// Primitive topology, a view over the raw `mode` integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl DrawMode {
    /// The format's default when `mode` is absent.
    pub const DEFAULT_RAW: u32 = 4;

    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Points,
            1 => Self::Lines,
            2 => Self::LineLoop,
            3 => Self::LineStrip,
            4 => Self::Triangles,
            5 => Self::TriangleStrip,
            6 => Self::TriangleFan,
            _ => return None,
        })
    }
}

/// Intended GPU binding of a buffer view, a view over the raw `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    ArrayBuffer,
    ElementArrayBuffer,
}

impl Target {
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            34962 => Some(Self::ArrayBuffer),
            34963 => Some(Self::ElementArrayBuffer),
            _ => None,
        }
    }
}
