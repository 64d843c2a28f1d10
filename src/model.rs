//! # The XFS document model.
//!
//! A [`Document`] owns every definition and the (possibly absent) root
//! object. This module holds no decode/encode logic — see [`crate::schema`]
//! for the schema block and [`crate::codec`] for the value tree.

use std::rc::Rc;

use crate::document::{Float3, PropType, SoaVector3, Vector3, Vector4};

/// A class definition: the ordered property schema shared by every object of
/// one `dti_hash`.
#[derive(Debug, Clone)]
pub struct Definition {
    pub dti_hash: u32,
    /// Absent in v16; defaults to `false` when missing or loaded from JSON.
    pub init: bool,
    /// The verbatim on-disk definition header bytes (16 for v15, 8 for v16),
    /// preserved across decode/encode to round-trip unknown padding bits.
    /// `None` for a definition built programmatically or loaded from JSON —
    /// the schema encoder synthesizes a zero-padded header in that case.
    pub raw_header: Option<Vec<u8>>,
    pub props: Vec<PropertyDef>,
}

/// One property slot in a [`Definition`].
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: Rc<str>,
    pub prop_type: PropType,
    pub attr: u8,
    /// 15-bit size-in-bytes field.
    pub bytes: u16,
    pub disable: bool,
}

/// A decoded or constructed object: a reference to its [`Definition`] plus
/// one [`Field`] per property, in the definition's declared order.
#[derive(Debug, Clone)]
pub struct Object {
    pub def_id: usize,
    pub id: i16,
    pub fields: Vec<Field>,
}

/// One property value attached to an [`Object`].
#[derive(Debug, Clone)]
pub struct Field {
    /// Cloned from the owning [`Definition`]'s [`PropertyDef::name`] — cheap,
    /// since `Rc<str>` clones are a refcount bump, not an allocation.
    pub name: Rc<str>,
    pub prop_type: PropType,
    pub value: FieldValue,
}

/// Whether a field carries a single value or an array, per the wire count.
/// A wire count of 1 is a scalar; 0 or >1 is an array.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Scalar(Data),
    Array(Vec<Data>),
}

/// A tagged union over every value shape the format can carry. One sum type
/// in place of a set of separate value variants — every variant here owns
/// exactly what it needs, freed uniformly by `Drop`.
#[derive(Debug, Clone)]
pub enum Data {
    /// A nested object, or `None` for the sentinel "null child" reference.
    Class(Option<Box<Object>>),
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    S8(i8),
    S16(i16),
    S32(i32),
    S64(i64),
    F32(f32),
    F64(f64),
    String(String),
    CString(String),
    /// Packed `0xRRGGBBAA`-style 32-bit word; see [`crate::json`] for the hex projection.
    Color(u32),
    Point { x: i32, y: i32 },
    Size { w: i32, h: i32 },
    Rect { l: i32, t: i32, r: i32, b: i32 },
    Matrix([[f32; 4]; 4]),
    Vector3(Vector3),
    Vector4(Vector4),
    Quaternion(Vector4),
    Time(i64),
    Float2 { x: f32, y: f32 },
    Float3(Float3),
    Float4(Vector4),
    Float3x3([[f32; 3]; 3]),
    /// 4 rows of 3 columns, matching the wire's `float m[4][3]`.
    Float4x3([[f32; 3]; 4]),
    Float4x4([[f32; 4]; 4]),
    EaseCurve { p1: f32, p2: f32 },
    Line { from: Vector3, dir: Vector3 },
    LineSegment { p0: Vector3, p1: Vector3 },
    Ray { from: Vector3, dir: Vector3 },
    Plane { normal: Float3, dist: f32 },
    Sphere { center: Float3, radius: f32 },
    /// `pad` is the trailing 3-float pad block, preserved verbatim across
    /// decode/encode (see [`crate::document::Vector3`]'s doc) and zeroed when
    /// built from JSON.
    Capsule { p0: Vector3, p1: Vector3, radius: f32, pad: [f32; 3] },
    Aabb { min: Vector3, max: Vector3 },
    Obb { transform: [[f32; 4]; 4], extent: Vector3 },
    /// `pad` is the trailing 3-float pad block, preserved like [`Data::Capsule`]'s.
    Cylinder { p0: Vector3, p1: Vector3, radius: f32, pad: [f32; 3] },
    Triangle { p0: Vector3, p1: Vector3, p2: Vector3 },
    Cone { p0: Float3, r0: f32, p1: Float3, r1: f32 },
    Torus { pos: Vector3, r: f32, axis: Vector3, cr: f32 },
    Ellipsoid { pos: Vector3, r: Vector3 },
    Range { s: i32, r: u32 },
    RangeF { s: f32, r: f32 },
    RangeU16 { s: u16, r: u16 },
    HermiteCurve { x: [f32; 8], y: [f32; 8] },
    Float3x4([[f32; 4]; 3]),
    LineSegment4 { p0: SoaVector3, p1: SoaVector3 },
    Aabb4 { min: SoaVector3, max: SoaVector3 },
    Vector2 { x: f32, y: f32 },
    Matrix33([[f32; 3]; 3]),
    Rect3dXz { lt: (f32, f32), lb: (f32, f32), rt: (f32, f32), rb: (f32, f32), height: f32 },
    Rect3d { normal: Vector3, size_w: f32, center: Vector3, size_h: f32 },
    PlaneXz { dist: f32 },
    RayY { from: Float3, dir: f32 },
    PointF { x: f32, y: f32 },
    SizeF { w: f32, h: f32 },
    RectF { l: f32, t: f32, r: f32, b: f32 },
    /// Up to 255 owned strings, length-prefixed by a single `u8` count on the wire.
    Custom(Vec<String>),
}

/// A full XFS document: header fields, the class schema, and the (possibly
/// absent) root object subtree.
#[derive(Debug, Clone)]
pub struct Document {
    pub major_version: u16,
    pub minor_version: u16,
    /// Running object counter; informational on a loaded document, rebuilt
    /// from scratch by the encoder for a document assembled from JSON.
    pub class_count: i64,
    pub definitions: Vec<Definition>,
    pub root: Option<Object>,
}
