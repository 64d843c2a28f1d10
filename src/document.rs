//! # The XFS container format.
//!
//! Constants and structures in this module describe the on-disk shape of an
//! XFS file, independent of how any particular section is read or written.
//!
//! An XFS file is organized into three segments:
//!
//! 1. Header
//! 2. Schema block (offset table, definition records, string pool)
//! 3. Root object (a class reference followed by its recursively nested body)
//!
//! # References
//!
//! Reverse-engineered from the MT Framework `xfs2json` reference tool; see
//! `DESIGN.md` for the provenance of each wire layout.

/// The number of bytes of data required to define an XFS header.
pub const HEADER_SIZE: usize = 20;

/// The XFS magic number, little-endian word `0x00534658` (bytes `X F S \0`).
pub const HEADER_MAGIC: u32 = 0x0053_4658;

/// Fixed-width header preceding the schema block.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub struct Header {
    pub major_version: u16,
    pub minor_version: u16,
    /// Running count of objects emitted during encoding; informational on decode.
    pub class_count: i64,
    pub def_count: i32,
    /// Byte length of the schema block immediately following the header.
    pub def_size: i32,
}

/// The full set of value type tags a property or field may carry.
///
/// Dense tags occupy `0x00..=0x4B`; `Custom` is a sparse outlier at `0x80`.
/// Tags marked reserved in the original engine (`PROPERTY`, `EVENT`, `GROUP`,
/// and friends) are represented here so a schema that declares one can still
/// be inspected, but the value codec refuses to read or write a value of a
/// reserved type (`Error::UnsupportedType`) rather than silently skipping it.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, Ord, PartialOrd)]
#[repr(u32)]
pub enum PropType {
    Undefined = 0x00,
    Class = 0x01,
    ClassRef = 0x02,
    Bool = 0x03,
    U8 = 0x04,
    U16 = 0x05,
    U32 = 0x06,
    U64 = 0x07,
    S8 = 0x08,
    S16 = 0x09,
    S32 = 0x0A,
    S64 = 0x0B,
    F32 = 0x0C,
    F64 = 0x0D,
    String = 0x0E,
    Color = 0x0F,
    Point = 0x10,
    Size = 0x11,
    Rect = 0x12,
    Matrix = 0x13,
    Vector3 = 0x14,
    Vector4 = 0x15,
    Quaternion = 0x16,
    Property = 0x17,
    Event = 0x18,
    Group = 0x19,
    PageBegin = 0x1A,
    PageEnd = 0x1B,
    Event32 = 0x1C,
    Array = 0x1D,
    PropertyList = 0x1E,
    GroupEnd = 0x1F,
    CString = 0x20,
    Time = 0x21,
    Float2 = 0x22,
    Float3 = 0x23,
    Float4 = 0x24,
    Float3x3 = 0x25,
    Float4x3 = 0x26,
    Float4x4 = 0x27,
    EaseCurve = 0x28,
    Line = 0x29,
    LineSegment = 0x2A,
    Ray = 0x2B,
    Plane = 0x2C,
    Sphere = 0x2D,
    Capsule = 0x2E,
    Aabb = 0x2F,
    Obb = 0x30,
    Cylinder = 0x31,
    Triangle = 0x32,
    Cone = 0x33,
    Torus = 0x34,
    Ellipsoid = 0x35,
    Range = 0x36,
    RangeF = 0x37,
    RangeU16 = 0x38,
    HermiteCurve = 0x39,
    EnumList = 0x3A,
    Float3x4 = 0x3B,
    LineSegment4 = 0x3C,
    Aabb4 = 0x3D,
    Oscillator = 0x3E,
    Variable = 0x3F,
    Vector2 = 0x40,
    Matrix33 = 0x41,
    Rect3dXz = 0x42,
    Rect3d = 0x43,
    Rect3dCollision = 0x44,
    PlaneXz = 0x45,
    RayY = 0x46,
    PointF = 0x47,
    SizeF = 0x48,
    RectF = 0x49,
    Event64 = 0x4A,
    End = 0x4B,
    Custom = 0x80,
}

impl PropType {
    /// Tags the original engine declares but never stores a value for; the
    /// value codec rejects any attempt to read or write one.
    pub fn is_reserved(self) -> bool {
        use PropType::*;
        matches!(
            self,
            Undefined
                | Property
                | Event
                | Group
                | PageBegin
                | PageEnd
                | Event32
                | Array
                | PropertyList
                | GroupEnd
                | EnumList
                | Oscillator
                | Variable
                | Rect3dCollision
                | Event64
                | End
        )
    }

    pub fn from_u32(tag: u32) -> Option<PropType> {
        use PropType::*;
        Some(match tag {
            0x00 => Undefined,
            0x01 => Class,
            0x02 => ClassRef,
            0x03 => Bool,
            0x04 => U8,
            0x05 => U16,
            0x06 => U32,
            0x07 => U64,
            0x08 => S8,
            0x09 => S16,
            0x0A => S32,
            0x0B => S64,
            0x0C => F32,
            0x0D => F64,
            0x0E => String,
            0x0F => Color,
            0x10 => Point,
            0x11 => Size,
            0x12 => Rect,
            0x13 => Matrix,
            0x14 => Vector3,
            0x15 => Vector4,
            0x16 => Quaternion,
            0x17 => Property,
            0x18 => Event,
            0x19 => Group,
            0x1A => PageBegin,
            0x1B => PageEnd,
            0x1C => Event32,
            0x1D => Array,
            0x1E => PropertyList,
            0x1F => GroupEnd,
            0x20 => CString,
            0x21 => Time,
            0x22 => Float2,
            0x23 => Float3,
            0x24 => Float4,
            0x25 => Float3x3,
            0x26 => Float4x3,
            0x27 => Float4x4,
            0x28 => EaseCurve,
            0x29 => Line,
            0x2A => LineSegment,
            0x2B => Ray,
            0x2C => Plane,
            0x2D => Sphere,
            0x2E => Capsule,
            0x2F => Aabb,
            0x30 => Obb,
            0x31 => Cylinder,
            0x32 => Triangle,
            0x33 => Cone,
            0x34 => Torus,
            0x35 => Ellipsoid,
            0x36 => Range,
            0x37 => RangeF,
            0x38 => RangeU16,
            0x39 => HermiteCurve,
            0x3A => EnumList,
            0x3B => Float3x4,
            0x3C => LineSegment4,
            0x3D => Aabb4,
            0x3E => Oscillator,
            0x3F => Variable,
            0x40 => Vector2,
            0x41 => Matrix33,
            0x42 => Rect3dXz,
            0x43 => Rect3d,
            0x44 => Rect3dCollision,
            0x45 => PlaneXz,
            0x46 => RayY,
            0x47 => PointF,
            0x48 => SizeF,
            0x49 => RectF,
            0x4A => Event64,
            0x4B => End,
            0x80 => Custom,
            _ => return None,
        })
    }
}

/// A padded 3-component vector: 16 bytes on the wire. The trailing pad float
/// carries no semantic meaning but is preserved verbatim across decode/encode
/// (the original copies the whole 16-byte struct on write) so a binary
/// round-trip stays byte-exact even when a file's pad word is non-zero; it is
/// not surfaced in the JSON projection, which defaults it to `0.0` on load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub pad: f32,
}

/// An unpadded 4-component vector: 16 bytes on the wire, used directly for
/// `VECTOR4`/`QUATERNION`/`FLOAT4` and as the per-axis lane of `SoaVector3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// An unpadded 3-component vector: 12 bytes on the wire. Distinct from
/// [`Vector3`] despite the similar name — `FLOAT3`/`PLANE`/`SPHERE`/`CONE`
/// never carry the wire-only padding float that `VECTOR3` does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A "structure of arrays" vector3: each axis lane is itself a full 4-float
/// [`Vector4`], 48 bytes total. Used by `LINESEGMENT4`/`AABB4`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoaVector3 {
    pub x: Vector4,
    pub y: Vector4,
    pub z: Vector4,
}
