//! # Value codec.
//!
//! Decodes and encodes the root class reference and the recursive object
//! tree it anchors. The schema block (already decoded into `&[Definition]`)
//! supplies the per-property types that drive every `decode_data`/`encode_data`
//! dispatch below.

use crate::cursor::{
    read_bool, read_cstring, read_f32, read_s16, read_s32, read_s64, read_u16, read_u32, read_u8, Writer,
};
use crate::document::{Float3, Header, PropType, SoaVector3, Vector3, Vector4, HEADER_MAGIC, HEADER_SIZE};
use crate::error::{Error, Result};
use crate::model::{Data, Definition, Document, Field, FieldValue, Object};
use crate::schema::{decode_schema, encode_schema};

/// Reads a full document: header, schema block, and the root object subtree.
pub fn decode(input: &[u8]) -> Result<Document> {
    let (header, schema_start) = decode_header(input)?;

    let schema_end = schema_start + header.def_size as usize;
    let schema_block = input.get(schema_start..schema_end).ok_or_else(|| {
        Error::SchemaOverflow(format!("def_size {} overruns {}-byte input", header.def_size, input.len()))
    })?;
    let definitions = decode_schema(header.major_version, schema_block, header.def_count as usize)?;

    let (root, _) = decode_object_ref(input, schema_end, header.major_version, &definitions)?;

    Ok(Document {
        major_version: header.major_version,
        minor_version: header.minor_version,
        class_count: header.class_count,
        definitions,
        root,
    })
}

/// Encodes a document back to its binary form: header, schema block, root subtree.
pub fn encode(doc: &Document) -> Result<Vec<u8>> {
    let schema_bytes = encode_schema(doc.major_version, &doc.definitions)?;

    let mut out = Writer::new();
    out.write_u32(HEADER_MAGIC);
    out.write_u16(doc.major_version);
    out.write_u16(doc.minor_version);
    out.write_s64(doc.class_count);
    out.write_s32(doc.definitions.len() as i32);
    out.write_s32(schema_bytes.len() as i32);
    out.write_bytes(&schema_bytes);

    encode_object_ref(&mut out, doc.root.as_ref(), doc.major_version, &doc.definitions)?;

    Ok(out.into_bytes())
}

fn decode_header(input: &[u8]) -> Result<(Header, usize)> {
    let (magic, next) = read_u32(input, 0)?;
    if magic != HEADER_MAGIC {
        return Err(Error::InvalidMagic);
    }
    let (major_version, next) = read_u16(input, next)?;
    let (minor_version, next) = read_u16(input, next)?;
    let (class_count, next) = read_s64(input, next)?;
    let (def_count, next) = read_s32(input, next)?;
    let (def_size, next) = read_s32(input, next)?;

    if def_count < 0 || def_size < 0 {
        return Err(Error::SchemaOverflow("negative def_count or def_size in header".to_string()));
    }

    debug_assert_eq!(next, HEADER_SIZE);
    Ok((Header { major_version, minor_version, class_count, def_count, def_size }, next))
}

/// Reads a class reference and, unless it is the sentinel, the object body it
/// points to. A sub-read failure inside the object body unwinds rather than
/// propagating: the cursor is repositioned to the declared end of the object
/// and a null is returned in its place.
pub(crate) fn decode_object_ref(
    input: &[u8],
    at: usize,
    major_version: u16,
    defs: &[Definition],
) -> Result<(Option<Object>, usize)> {
    let (class_id, next) = read_s16(input, at)?;
    let (var, next) = read_s16(input, next)?;

    let raw = class_id as u16;
    if (raw >> 1 & 0x7FFF) == 0x7FFF || (raw & 1) == 0 {
        return Ok((None, next));
    }

    let def_id = ((raw >> 1) & 0x7FFF) as usize;
    if def_id >= defs.len() {
        return Err(Error::SchemaOverflow(format!("class reference to out-of-range definition {}", def_id)));
    }

    let size_field_pos = next;
    let (size, field_start) = match major_version {
        16 => {
            let (size, next) = read_u32(input, size_field_pos)?;
            (size as u64, next)
        }
        15 => {
            let (size, next) = read_u32(input, size_field_pos)?;
            let (_reserved, next) = read_u32(input, next)?;
            (size as u64, next)
        }
        other => return Err(Error::UnsupportedVersion(other)),
    };

    match decode_fields(input, field_start, def_id, var, &defs[def_id], major_version, defs) {
        Ok((object, end)) => Ok((Some(object), end)),
        Err(err) => {
            let resume_at = size_field_pos + size as usize;
            tracing::warn!(def_id, resume_at, %err, "object decode failed, skipping to next sibling");
            Ok((None, resume_at))
        }
    }
}

fn decode_fields(
    input: &[u8],
    at: usize,
    def_id: usize,
    id: i16,
    def: &Definition,
    major_version: u16,
    defs: &[Definition],
) -> Result<(Object, usize)> {
    let mut pos = at;
    let mut fields = Vec::with_capacity(def.props.len());

    for prop in &def.props {
        // Read as unsigned: a corrupt count must never be reinterpreted as a
        // huge positive `usize` through a signed cast.
        let (count, next) = read_u32(input, pos)?;
        pos = next;

        let value = if count == 1 {
            let (data, next) = decode_data(input, pos, prop.prop_type, major_version, defs)?;
            pos = next;
            FieldValue::Scalar(data)
        } else {
            let len = count as usize;
            // Every entry consumes at least one byte, so a declared length
            // longer than the remaining input is already known-bogus — reject
            // it here rather than pre-allocating `len` capacity from an
            // untrusted, possibly attacker-controlled field and risking an
            // unrecoverable allocation abort that the caller's unwind-and-
            // reseek recovery (decode_object_ref) cannot catch.
            let remaining = input.len().saturating_sub(pos);
            if len > remaining {
                return Err(Error::TruncatedValue(format!(
                    "property \"{}\" declares {} array entries, only {} bytes remain",
                    prop.name, len, remaining
                )));
            }
            let mut items = Vec::new();
            for _ in 0..len {
                let (data, next) = decode_data(input, pos, prop.prop_type, major_version, defs)?;
                pos = next;
                items.push(data);
            }
            FieldValue::Array(items)
        };

        fields.push(Field { name: prop.name.clone(), prop_type: prop.prop_type, value });
    }

    Ok((Object { def_id, id, fields }, pos))
}

fn decode_data(input: &[u8], at: usize, prop_type: PropType, major_version: u16, defs: &[Definition]) -> Result<(Data, usize)> {
    use PropType::*;

    if prop_type.is_reserved() || prop_type == Undefined {
        return Err(Error::UnsupportedType(prop_type as u32));
    }

    Ok(match prop_type {
        Class | ClassRef => {
            let (obj, next) = decode_object_ref(input, at, major_version, defs)?;
            (Data::Class(obj.map(Box::new)), next)
        }
        Bool => {
            let (v, n) = read_bool(input, at)?;
            (Data::Bool(v), n)
        }
        U8 => {
            let (v, n) = read_u8(input, at)?;
            (Data::U8(v), n)
        }
        U16 => {
            let (v, n) = read_u16(input, at)?;
            (Data::U16(v), n)
        }
        U32 => {
            let (v, n) = read_u32(input, at)?;
            (Data::U32(v), n)
        }
        U64 => {
            let (v, n) = crate::cursor::read_u64(input, at)?;
            (Data::U64(v), n)
        }
        S8 => {
            let (v, n) = crate::cursor::read_s8(input, at)?;
            (Data::S8(v), n)
        }
        S16 => {
            let (v, n) = read_s16(input, at)?;
            (Data::S16(v), n)
        }
        S32 => {
            let (v, n) = read_s32(input, at)?;
            (Data::S32(v), n)
        }
        S64 => {
            let (v, n) = read_s64(input, at)?;
            (Data::S64(v), n)
        }
        F32 => {
            let (v, n) = read_f32(input, at)?;
            (Data::F32(v), n)
        }
        F64 => {
            let (v, n) = crate::cursor::read_f64(input, at)?;
            (Data::F64(v), n)
        }
        String => {
            let (s, n) = read_cstring(input, at, 512)?;
            (Data::String(s), n)
        }
        CString => {
            let (s, n) = read_cstring(input, at, 512)?;
            (Data::CString(s), n)
        }
        Color => {
            let (v, n) = read_u32(input, at)?;
            (Data::Color(v), n)
        }
        Point => {
            let (x, n) = read_s32(input, at)?;
            let (y, n) = read_s32(input, n)?;
            (Data::Point { x, y }, n)
        }
        Size => {
            let (w, n) = read_s32(input, at)?;
            let (h, n) = read_s32(input, n)?;
            (Data::Size { w, h }, n)
        }
        Rect => {
            let (l, n) = read_s32(input, at)?;
            let (t, n) = read_s32(input, n)?;
            let (r, n) = read_s32(input, n)?;
            let (b, n) = read_s32(input, n)?;
            (Data::Rect { l, t, r, b }, n)
        }
        Matrix => {
            let (m, n) = read_matrix4(input, at)?;
            (Data::Matrix(m), n)
        }
        Vector3 => {
            let (v, n) = read_vector3(input, at)?;
            (Data::Vector3(v), n)
        }
        Vector4 => {
            let (v, n) = read_vector4(input, at)?;
            (Data::Vector4(v), n)
        }
        Quaternion => {
            let (v, n) = read_vector4(input, at)?;
            (Data::Quaternion(v), n)
        }
        Time => {
            let (v, n) = read_s64(input, at)?;
            (Data::Time(v), n)
        }
        Float2 => {
            let (x, n) = read_f32(input, at)?;
            let (y, n) = read_f32(input, n)?;
            (Data::Float2 { x, y }, n)
        }
        Float3 => {
            let (v, n) = read_float3(input, at)?;
            (Data::Float3(v), n)
        }
        Float4 => {
            let (v, n) = read_vector4(input, at)?;
            (Data::Float4(v), n)
        }
        Float3x3 => {
            let (m, n) = read_matrix3(input, at)?;
            (Data::Float3x3(m), n)
        }
        Float4x3 => {
            let (m, n) = read_mat4x3(input, at)?;
            (Data::Float4x3(m), n)
        }
        Float4x4 => {
            let (m, n) = read_matrix4(input, at)?;
            (Data::Float4x4(m), n)
        }
        EaseCurve => {
            let (p1, n) = read_f32(input, at)?;
            let (p2, n) = read_f32(input, n)?;
            (Data::EaseCurve { p1, p2 }, n)
        }
        Line => {
            let (from, n) = read_vector3(input, at)?;
            let (dir, n) = read_vector3(input, n)?;
            (Data::Line { from, dir }, n)
        }
        LineSegment => {
            let (p0, n) = read_vector3(input, at)?;
            let (p1, n) = read_vector3(input, n)?;
            (Data::LineSegment { p0, p1 }, n)
        }
        Ray => {
            let (from, n) = read_vector3(input, at)?;
            let (dir, n) = read_vector3(input, n)?;
            (Data::Ray { from, dir }, n)
        }
        Plane => {
            let (normal, n) = read_float3(input, at)?;
            let (dist, n) = read_f32(input, n)?;
            (Data::Plane { normal, dist }, n)
        }
        Sphere => {
            let (center, n) = read_float3(input, at)?;
            let (radius, n) = read_f32(input, n)?;
            (Data::Sphere { center, radius }, n)
        }
        Capsule => {
            let (p0, n) = read_vector3(input, at)?;
            let (p1, n) = read_vector3(input, n)?;
            let (radius, n) = read_f32(input, n)?;
            let (pad0, n) = read_f32(input, n)?;
            let (pad1, n) = read_f32(input, n)?;
            let (pad2, n) = read_f32(input, n)?;
            (Data::Capsule { p0, p1, radius, pad: [pad0, pad1, pad2] }, n)
        }
        Aabb => {
            let (min, n) = read_vector3(input, at)?;
            let (max, n) = read_vector3(input, n)?;
            (Data::Aabb { min, max }, n)
        }
        Obb => {
            let (transform, n) = read_matrix4(input, at)?;
            let (extent, n) = read_vector3(input, n)?;
            (Data::Obb { transform, extent }, n)
        }
        Cylinder => {
            let (p0, n) = read_vector3(input, at)?;
            let (p1, n) = read_vector3(input, n)?;
            let (radius, n) = read_f32(input, n)?;
            let (pad0, n) = read_f32(input, n)?;
            let (pad1, n) = read_f32(input, n)?;
            let (pad2, n) = read_f32(input, n)?;
            (Data::Cylinder { p0, p1, radius, pad: [pad0, pad1, pad2] }, n)
        }
        Triangle => {
            let (p0, n) = read_vector3(input, at)?;
            let (p1, n) = read_vector3(input, n)?;
            let (p2, n) = read_vector3(input, n)?;
            (Data::Triangle { p0, p1, p2 }, n)
        }
        Cone => {
            let (p0, n) = read_float3(input, at)?;
            let (r0, n) = read_f32(input, n)?;
            let (p1, n) = read_float3(input, n)?;
            let (r1, n) = read_f32(input, n)?;
            (Data::Cone { p0, r0, p1, r1 }, n)
        }
        Torus => {
            let (pos, n) = read_vector3(input, at)?;
            let (r, n) = read_f32(input, n)?;
            let (axis, n) = read_vector3(input, n)?;
            let (cr, n) = read_f32(input, n)?;
            (Data::Torus { pos, r, axis, cr }, n)
        }
        Ellipsoid => {
            let (pos, n) = read_vector3(input, at)?;
            let (r, n) = read_vector3(input, n)?;
            (Data::Ellipsoid { pos, r }, n)
        }
        Range => {
            let (s, n) = read_s32(input, at)?;
            let (r, n) = read_u32(input, n)?;
            (Data::Range { s, r }, n)
        }
        RangeF => {
            let (s, n) = read_f32(input, at)?;
            let (r, n) = read_f32(input, n)?;
            (Data::RangeF { s, r }, n)
        }
        RangeU16 => {
            let (s, n) = read_u16(input, at)?;
            let (r, n) = read_u16(input, n)?;
            (Data::RangeU16 { s, r }, n)
        }
        HermiteCurve => {
            let mut x = [0f32; 8];
            let mut pos = at;
            for slot in x.iter_mut() {
                let (v, n) = read_f32(input, pos)?;
                *slot = v;
                pos = n;
            }
            let mut y = [0f32; 8];
            for slot in y.iter_mut() {
                let (v, n) = read_f32(input, pos)?;
                *slot = v;
                pos = n;
            }
            (Data::HermiteCurve { x, y }, pos)
        }
        Float3x4 => {
            let (m, n) = read_mat3x4(input, at)?;
            (Data::Float3x4(m), n)
        }
        LineSegment4 => {
            let (p0, n) = read_soa_vector3(input, at)?;
            let (p1, n) = read_soa_vector3(input, n)?;
            (Data::LineSegment4 { p0, p1 }, n)
        }
        Aabb4 => {
            let (min, n) = read_soa_vector3(input, at)?;
            let (max, n) = read_soa_vector3(input, n)?;
            (Data::Aabb4 { min, max }, n)
        }
        Vector2 => {
            let (x, n) = read_f32(input, at)?;
            let (y, n) = read_f32(input, n)?;
            (Data::Vector2 { x, y }, n)
        }
        Matrix33 => {
            let (m, n) = read_matrix3(input, at)?;
            (Data::Matrix33(m), n)
        }
        Rect3dXz => {
            let (lt_x, n) = read_f32(input, at)?;
            let (lt_y, n) = read_f32(input, n)?;
            let (lb_x, n) = read_f32(input, n)?;
            let (lb_y, n) = read_f32(input, n)?;
            let (rt_x, n) = read_f32(input, n)?;
            let (rt_y, n) = read_f32(input, n)?;
            let (rb_x, n) = read_f32(input, n)?;
            let (rb_y, n) = read_f32(input, n)?;
            let (height, n) = read_f32(input, n)?;
            (Data::Rect3dXz { lt: (lt_x, lt_y), lb: (lb_x, lb_y), rt: (rt_x, rt_y), rb: (rb_x, rb_y), height }, n)
        }
        Rect3d => {
            let (normal, n) = read_vector3(input, at)?;
            let (size_w, n) = read_f32(input, n)?;
            let (center, n) = read_vector3(input, n)?;
            let (size_h, n) = read_f32(input, n)?;
            (Data::Rect3d { normal, size_w, center, size_h }, n)
        }
        PlaneXz => {
            let (dist, n) = read_f32(input, at)?;
            (Data::PlaneXz { dist }, n)
        }
        RayY => {
            let (from, n) = read_float3(input, at)?;
            let (dir, n) = read_f32(input, n)?;
            (Data::RayY { from, dir }, n)
        }
        PointF => {
            let (x, n) = read_f32(input, at)?;
            let (y, n) = read_f32(input, n)?;
            (Data::PointF { x, y }, n)
        }
        SizeF => {
            let (w, n) = read_f32(input, at)?;
            let (h, n) = read_f32(input, n)?;
            (Data::SizeF { w, h }, n)
        }
        RectF => {
            let (l, n) = read_f32(input, at)?;
            let (t, n) = read_f32(input, n)?;
            let (r, n) = read_f32(input, n)?;
            let (b, n) = read_f32(input, n)?;
            (Data::RectF { l, t, r, b }, n)
        }
        Custom => {
            let (count, n) = read_u8(input, at)?;
            let mut values = Vec::with_capacity(count as usize);
            let mut pos = n;
            for _ in 0..count {
                let (s, next) = read_cstring(input, pos, 128)?;
                values.push(s);
                pos = next;
            }
            (Data::Custom(values), pos)
        }
        Undefined | Property | Event | Group | PageBegin | PageEnd | Event32 | Array | PropertyList | GroupEnd
        | EnumList | Oscillator | Variable | Rect3dCollision | Event64 | End => {
            return Err(Error::UnsupportedType(prop_type as u32));
        }
    })
}

pub(crate) fn encode_object_ref(out: &mut Writer, obj: Option<&Object>, major_version: u16, defs: &[Definition]) -> Result<()> {
    let object = match obj {
        None => {
            out.write_s16(0);
            out.write_s16(0);
            return Ok(());
        }
        Some(object) => object,
    };

    if object.def_id >= defs.len() {
        return Err(Error::SchemaOverflow(format!("object references out-of-range definition {}", object.def_id)));
    }

    let class_id = (((object.def_id as u32) << 1) | 1) as u16 as i16;
    out.write_s16(class_id);
    out.write_s16(object.id);

    let size_field_pos = out.tell();
    let placeholder = match major_version {
        16 => out.write_zeros(4),
        15 => {
            let placeholder = out.write_zeros(4);
            out.write_zeros(4);
            placeholder
        }
        other => return Err(Error::UnsupportedVersion(other)),
    };

    for field in &object.fields {
        match &field.value {
            FieldValue::Scalar(data) => {
                out.write_s32(1);
                encode_data(out, data, major_version, defs)?;
            }
            FieldValue::Array(items) => {
                out.write_s32(items.len() as i32);
                for item in items {
                    encode_data(out, item, major_version, defs)?;
                }
            }
        }
    }

    let size = (out.tell() - size_field_pos) as u64;
    match major_version {
        16 => out.set_u32(placeholder, size as u32),
        15 => out.set_u64(placeholder, size),
        other => return Err(Error::UnsupportedVersion(other)),
    }

    Ok(())
}

fn encode_data(out: &mut Writer, data: &Data, major_version: u16, defs: &[Definition]) -> Result<()> {
    match data {
        Data::Class(obj) => encode_object_ref(out, obj.as_deref(), major_version, defs)?,
        Data::Bool(v) => out.write_bool(*v),
        Data::U8(v) => out.write_u8(*v),
        Data::U16(v) => out.write_u16(*v),
        Data::U32(v) => out.write_u32(*v),
        Data::U64(v) => out.write_u64(*v),
        Data::S8(v) => out.write_s8(*v),
        Data::S16(v) => out.write_s16(*v),
        Data::S32(v) => out.write_s32(*v),
        Data::S64(v) => out.write_s64(*v),
        Data::F32(v) => out.write_f32(*v),
        Data::F64(v) => out.write_f64(*v),
        Data::String(s) => out.write_cstring(s),
        Data::CString(s) => out.write_cstring(s),
        Data::Color(v) => out.write_u32(*v),
        Data::Point { x, y } => {
            out.write_s32(*x);
            out.write_s32(*y);
        }
        Data::Size { w: width, h } => {
            out.write_s32(*width);
            out.write_s32(*h);
        }
        Data::Rect { l, t, r, b } => {
            out.write_s32(*l);
            out.write_s32(*t);
            out.write_s32(*r);
            out.write_s32(*b);
        }
        Data::Matrix(m) => write_matrix4(out, m),
        Data::Vector3(v) => write_vector3(out, v),
        Data::Vector4(v) => write_vector4(out, v),
        Data::Quaternion(v) => write_vector4(out, v),
        Data::Time(v) => out.write_s64(*v),
        Data::Float2 { x, y } => {
            out.write_f32(*x);
            out.write_f32(*y);
        }
        Data::Float3(v) => write_float3(out, v),
        Data::Float4(v) => write_vector4(out, v),
        Data::Float3x3(m) => write_matrix3(out, m),
        Data::Float4x3(m) => write_mat4x3(out, m),
        Data::Float4x4(m) => write_matrix4(out, m),
        Data::EaseCurve { p1, p2 } => {
            out.write_f32(*p1);
            out.write_f32(*p2);
        }
        Data::Line { from, dir } => {
            write_vector3(out, from);
            write_vector3(out, dir);
        }
        Data::LineSegment { p0, p1 } => {
            write_vector3(out, p0);
            write_vector3(out, p1);
        }
        Data::Ray { from, dir } => {
            write_vector3(out, from);
            write_vector3(out, dir);
        }
        Data::Plane { normal, dist } => {
            write_float3(out, normal);
            out.write_f32(*dist);
        }
        Data::Sphere { center, radius } => {
            write_float3(out, center);
            out.write_f32(*radius);
        }
        Data::Capsule { p0, p1, radius, pad } => {
            write_vector3(out, p0);
            write_vector3(out, p1);
            out.write_f32(*radius);
            out.write_f32(pad[0]);
            out.write_f32(pad[1]);
            out.write_f32(pad[2]);
        }
        Data::Aabb { min, max } => {
            write_vector3(out, min);
            write_vector3(out, max);
        }
        Data::Obb { transform, extent } => {
            write_matrix4(out, transform);
            write_vector3(out, extent);
        }
        Data::Cylinder { p0, p1, radius, pad } => {
            write_vector3(out, p0);
            write_vector3(out, p1);
            out.write_f32(*radius);
            out.write_f32(pad[0]);
            out.write_f32(pad[1]);
            out.write_f32(pad[2]);
        }
        Data::Triangle { p0, p1, p2 } => {
            write_vector3(out, p0);
            write_vector3(out, p1);
            write_vector3(out, p2);
        }
        Data::Cone { p0, r0, p1, r1 } => {
            write_float3(out, p0);
            out.write_f32(*r0);
            write_float3(out, p1);
            out.write_f32(*r1);
        }
        Data::Torus { pos, r, axis, cr } => {
            write_vector3(out, pos);
            out.write_f32(*r);
            write_vector3(out, axis);
            out.write_f32(*cr);
        }
        Data::Ellipsoid { pos, r } => {
            write_vector3(out, pos);
            write_vector3(out, r);
        }
        Data::Range { s, r } => {
            out.write_s32(*s);
            out.write_u32(*r);
        }
        Data::RangeF { s, r } => {
            out.write_f32(*s);
            out.write_f32(*r);
        }
        Data::RangeU16 { s, r } => {
            out.write_u16(*s);
            out.write_u16(*r);
        }
        Data::HermiteCurve { x, y } => {
            for v in x {
                out.write_f32(*v);
            }
            for v in y {
                out.write_f32(*v);
            }
        }
        Data::Float3x4(m) => write_mat3x4(out, m),
        Data::LineSegment4 { p0, p1 } => {
            write_soa_vector3(out, p0);
            write_soa_vector3(out, p1);
        }
        Data::Aabb4 { min, max } => {
            write_soa_vector3(out, min);
            write_soa_vector3(out, max);
        }
        Data::Vector2 { x, y } => {
            out.write_f32(*x);
            out.write_f32(*y);
        }
        Data::Matrix33(m) => write_matrix3(out, m),
        Data::Rect3dXz { lt, lb, rt, rb, height } => {
            out.write_f32(lt.0);
            out.write_f32(lt.1);
            out.write_f32(lb.0);
            out.write_f32(lb.1);
            out.write_f32(rt.0);
            out.write_f32(rt.1);
            out.write_f32(rb.0);
            out.write_f32(rb.1);
            out.write_f32(*height);
        }
        Data::Rect3d { normal, size_w, center, size_h } => {
            write_vector3(out, normal);
            out.write_f32(*size_w);
            write_vector3(out, center);
            out.write_f32(*size_h);
        }
        Data::PlaneXz { dist } => out.write_f32(*dist),
        Data::RayY { from, dir } => {
            write_float3(out, from);
            out.write_f32(*dir);
        }
        Data::PointF { x, y } => {
            out.write_f32(*x);
            out.write_f32(*y);
        }
        Data::SizeF { w: width, h } => {
            out.write_f32(*width);
            out.write_f32(*h);
        }
        Data::RectF { l, t, r, b } => {
            out.write_f32(*l);
            out.write_f32(*t);
            out.write_f32(*r);
            out.write_f32(*b);
        }
        Data::Custom(values) => {
            if values.len() > 255 {
                return Err(Error::Allocation);
            }
            out.write_u8(values.len() as u8);
            for value in values {
                out.write_cstring(value);
            }
        }
    }
    Ok(())
}

fn read_vector3(input: &[u8], at: usize) -> Result<(Vector3, usize)> {
    let (x, n) = read_f32(input, at)?;
    let (y, n) = read_f32(input, n)?;
    let (z, n) = read_f32(input, n)?;
    let (pad, n) = read_f32(input, n)?;
    Ok((Vector3 { x, y, z, pad }, n))
}

fn write_vector3(out: &mut Writer, v: &Vector3) {
    out.write_f32(v.x);
    out.write_f32(v.y);
    out.write_f32(v.z);
    out.write_f32(v.pad);
}

fn read_vector4(input: &[u8], at: usize) -> Result<(Vector4, usize)> {
    let (x, n) = read_f32(input, at)?;
    let (y, n) = read_f32(input, n)?;
    let (z, n) = read_f32(input, n)?;
    let (w, n) = read_f32(input, n)?;
    Ok((Vector4 { x, y, z, w }, n))
}

fn write_vector4(out: &mut Writer, v: &Vector4) {
    out.write_f32(v.x);
    out.write_f32(v.y);
    out.write_f32(v.z);
    out.write_f32(v.w);
}

fn read_float3(input: &[u8], at: usize) -> Result<(Float3, usize)> {
    let (x, n) = read_f32(input, at)?;
    let (y, n) = read_f32(input, n)?;
    let (z, n) = read_f32(input, n)?;
    Ok((Float3 { x, y, z }, n))
}

fn write_float3(out: &mut Writer, v: &Float3) {
    out.write_f32(v.x);
    out.write_f32(v.y);
    out.write_f32(v.z);
}

fn read_soa_vector3(input: &[u8], at: usize) -> Result<(SoaVector3, usize)> {
    let (x, n) = read_vector4(input, at)?;
    let (y, n) = read_vector4(input, n)?;
    let (z, n) = read_vector4(input, n)?;
    Ok((SoaVector3 { x, y, z }, n))
}

fn write_soa_vector3(out: &mut Writer, v: &SoaVector3) {
    write_vector4(out, &v.x);
    write_vector4(out, &v.y);
    write_vector4(out, &v.z);
}

fn read_square_matrix<const N: usize>(input: &[u8], at: usize) -> Result<([[f32; N]; N], usize)> {
    let mut m = [[0f32; N]; N];
    let mut pos = at;
    for row in m.iter_mut() {
        for cell in row.iter_mut() {
            let (v, n) = read_f32(input, pos)?;
            *cell = v;
            pos = n;
        }
    }
    Ok((m, pos))
}

fn write_square_matrix<const N: usize>(out: &mut Writer, m: &[[f32; N]; N]) {
    for row in m {
        for v in row {
            out.write_f32(*v);
        }
    }
}

fn read_matrix4(input: &[u8], at: usize) -> Result<([[f32; 4]; 4], usize)> {
    read_square_matrix::<4>(input, at)
}

fn write_matrix4(out: &mut Writer, m: &[[f32; 4]; 4]) {
    write_square_matrix(out, m)
}

fn read_matrix3(input: &[u8], at: usize) -> Result<([[f32; 3]; 3], usize)> {
    read_square_matrix::<3>(input, at)
}

fn write_matrix3(out: &mut Writer, m: &[[f32; 3]; 3]) {
    write_square_matrix(out, m)
}

/// 4 rows of 3 columns, matching `FLOAT4x3`'s `float m[4][3]`.
fn read_mat4x3(input: &[u8], at: usize) -> Result<([[f32; 3]; 4], usize)> {
    let mut m = [[0f32; 3]; 4];
    let mut pos = at;
    for row in m.iter_mut() {
        for cell in row.iter_mut() {
            let (v, n) = read_f32(input, pos)?;
            *cell = v;
            pos = n;
        }
    }
    Ok((m, pos))
}

fn write_mat4x3(out: &mut Writer, m: &[[f32; 3]; 4]) {
    for row in m {
        for v in row {
            out.write_f32(*v);
        }
    }
}

/// 3 rows of 4 columns, matching `FLOAT3x4`'s `float m[3][4]`.
fn read_mat3x4(input: &[u8], at: usize) -> Result<([[f32; 4]; 3], usize)> {
    let mut m = [[0f32; 4]; 3];
    let mut pos = at;
    for row in m.iter_mut() {
        for cell in row.iter_mut() {
            let (v, n) = read_f32(input, pos)?;
            *cell = v;
            pos = n;
        }
    }
    Ok((m, pos))
}

fn write_mat3x4(out: &mut Writer, m: &[[f32; 4]; 3]) {
    for row in m {
        for v in row {
            out.write_f32(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyDef;
    use std::rc::Rc;

    fn v16_empty_document() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&HEADER_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0i64.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn decodes_empty_v16_document() {
        let bytes = v16_empty_document();
        let doc = decode(&bytes).unwrap();
        assert_eq!(doc.major_version, 16);
        assert!(doc.definitions.is_empty());
        assert!(doc.root.is_none());
    }

    #[test]
    fn empty_document_round_trips() {
        let bytes = v16_empty_document();
        let doc = decode(&bytes).unwrap();
        let re_encoded = encode(&doc).unwrap();
        assert_eq!(bytes, re_encoded);
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = vec![0u8; 20];
        assert!(matches!(decode(&bytes), Err(Error::InvalidMagic)));
    }

    fn u32_property_document() -> Document {
        let def = Definition {
            dti_hash: 0xDEAD_BEEF,
            init: false,
            raw_header: None,
            props: vec![PropertyDef { name: Rc::from("x"), prop_type: PropType::U32, attr: 0, bytes: 4, disable: false }],
        };
        let root = Object {
            def_id: 0,
            id: 0,
            fields: vec![Field { name: Rc::from("x"), prop_type: PropType::U32, value: FieldValue::Scalar(Data::U32(42)) }],
        };
        Document { major_version: 16, minor_version: 0, class_count: 1, definitions: vec![def], root: Some(root) }
    }

    #[test]
    fn single_u32_property_round_trips() {
        let doc = u32_property_document();
        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.definitions.len(), 1);
        let root = decoded.root.unwrap();
        match &root.fields[0].value {
            FieldValue::Scalar(Data::U32(v)) => assert_eq!(*v, 42),
            other => panic!("unexpected field value: {:?}", other),
        }
    }

    #[test]
    fn array_of_s32_round_trips() {
        let mut doc = u32_property_document();
        doc.definitions[0].props[0].prop_type = PropType::S32;
        doc.root.as_mut().unwrap().fields[0].prop_type = PropType::S32;
        doc.root.as_mut().unwrap().fields[0].value =
            FieldValue::Array(vec![Data::S32(1), Data::S32(-2), Data::S32(3), Data::S32(-4)]);

        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        match &decoded.root.unwrap().fields[0].value {
            FieldValue::Array(items) => {
                let values: Vec<i32> = items
                    .iter()
                    .map(|d| match d {
                        Data::S32(v) => *v,
                        other => panic!("unexpected {:?}", other),
                    })
                    .collect();
                assert_eq!(values, vec![1, -2, 3, -4]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn null_class_ref_round_trips() {
        let def = Definition {
            dti_hash: 1,
            init: false,
            raw_header: None,
            props: vec![PropertyDef { name: Rc::from("body"), prop_type: PropType::Class, attr: 0, bytes: 4, disable: false }],
        };
        let root = Object {
            def_id: 0,
            id: 0,
            fields: vec![Field { name: Rc::from("body"), prop_type: PropType::Class, value: FieldValue::Scalar(Data::Class(None)) }],
        };
        let doc = Document { major_version: 16, minor_version: 0, class_count: 1, definitions: vec![def], root: Some(root) };

        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        match &decoded.root.unwrap().fields[0].value {
            FieldValue::Scalar(Data::Class(None)) => {}
            other => panic!("expected null class ref, got {:?}", other),
        }
    }

    #[test]
    fn custom_value_round_trips() {
        let def = Definition {
            dti_hash: 2,
            init: false,
            raw_header: None,
            props: vec![PropertyDef { name: Rc::from("tags"), prop_type: PropType::Custom, attr: 0, bytes: 0, disable: false }],
        };
        let values = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let root = Object {
            def_id: 0,
            id: 0,
            fields: vec![Field {
                name: Rc::from("tags"),
                prop_type: PropType::Custom,
                value: FieldValue::Scalar(Data::Custom(values.clone())),
            }],
        };
        let doc = Document { major_version: 16, minor_version: 0, class_count: 1, definitions: vec![def], root: Some(root) };

        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        match &decoded.root.unwrap().fields[0].value {
            FieldValue::Scalar(Data::Custom(got)) => assert_eq!(got, &values),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn reserved_type_is_rejected() {
        let result = decode_data(&[0u8; 16], 0, PropType::Property, 16, &[]);
        assert!(matches!(result, Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn vector3_pad_word_round_trips_through_binary() {
        let def = Definition {
            dti_hash: 3,
            init: false,
            raw_header: None,
            props: vec![PropertyDef { name: Rc::from("pos"), prop_type: PropType::Vector3, attr: 0, bytes: 16, disable: false }],
        };
        let v = Vector3 { x: 1.0, y: 2.0, z: 3.0, pad: f32::from_bits(0xDEAD_BEEF) };
        let root = Object {
            def_id: 0,
            id: 0,
            fields: vec![Field { name: Rc::from("pos"), prop_type: PropType::Vector3, value: FieldValue::Scalar(Data::Vector3(v)) }],
        };
        let doc = Document { major_version: 16, minor_version: 0, class_count: 1, definitions: vec![def], root: Some(root) };

        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        match &decoded.root.unwrap().fields[0].value {
            FieldValue::Scalar(Data::Vector3(got)) => assert_eq!(got.pad.to_bits(), 0xDEAD_BEEF),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn capsule_trailing_pad_round_trips_through_binary() {
        let p0 = Vector3 { x: 0.0, y: 0.0, z: 0.0, pad: 0.0 };
        let p1 = Vector3 { x: 1.0, y: 1.0, z: 1.0, pad: 0.0 };
        let def = Definition {
            dti_hash: 4,
            init: false,
            raw_header: None,
            props: vec![PropertyDef { name: Rc::from("shape"), prop_type: PropType::Capsule, attr: 0, bytes: 48, disable: false }],
        };
        let root = Object {
            def_id: 0,
            id: 0,
            fields: vec![Field {
                name: Rc::from("shape"),
                prop_type: PropType::Capsule,
                value: FieldValue::Scalar(Data::Capsule { p0, p1, radius: 2.0, pad: [1.0, 2.0, 3.0] }),
            }],
        };
        let doc = Document { major_version: 16, minor_version: 0, class_count: 1, definitions: vec![def], root: Some(root) };

        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        match &decoded.root.unwrap().fields[0].value {
            FieldValue::Scalar(Data::Capsule { pad, .. }) => assert_eq!(*pad, [1.0, 2.0, 3.0]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn implausible_array_count_fails_object_without_aborting() {
        let mut bytes = encode(&u32_property_document()).unwrap();
        let def_size = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]) as usize;
        // Overwrite the single field's wire count (right after the schema
        // block, the 4-byte class ref, and the 4-byte size field) with a
        // huge, clearly-bogus value.
        let count_offset = HEADER_SIZE + def_size + 4 + 4;
        bytes[count_offset..count_offset + 4].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

        // Must not abort via allocation/capacity panic: the bad object
        // unwinds to a null root, same as any other sub-decode failure.
        let doc = decode(&bytes).unwrap();
        assert!(doc.root.is_none());
    }
}
