//! # JSON projection.
//!
//! Bidirectional mapping between [`Document`] and `serde_json::Value`. Built
//! as direct `Value`/`Map` builders rather than a derived `Serialize`/
//! `Deserialize` impl, since the object shape is keyed dynamically by
//! property name.

use std::rc::Rc;

use serde_json::{json, Map, Value};

use crate::document::{Float3, PropType, SoaVector3, Vector3, Vector4};
use crate::error::{Error, Result};
use crate::model::{Data, Definition, Document, Field, FieldValue, Object, PropertyDef};

/// Projects a document to its JSON envelope.
pub fn to_json(doc: &Document) -> Value {
    let defs: Vec<Value> = doc.definitions.iter().map(definition_to_json).collect();
    json!({
        "root": doc.root.as_ref().map(object_to_json),
        "$defs": defs,
        "$major_version": doc.major_version,
        "$minor_version": doc.minor_version,
    })
}

fn definition_to_json(def: &Definition) -> Value {
    let props: Vec<Value> = def.props.iter().map(property_to_json).collect();
    json!({
        "dti": def.dti_hash,
        "init": def.init,
        "props": props,
    })
}

fn property_to_json(prop: &PropertyDef) -> Value {
    json!({
        "name": prop.name.as_ref(),
        "type": prop.prop_type as u32,
        "attr": prop.attr,
        "bytes": prop.bytes,
        "disable": prop.disable,
    })
}

fn object_to_json(obj: &Object) -> Value {
    let mut map = Map::new();
    map.insert("$id".to_string(), json!(obj.def_id));
    for field in &obj.fields {
        map.insert(field.name.to_string(), field_value_to_json(&field.value));
    }
    Value::Object(map)
}

fn field_value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Scalar(data) => data_to_json(data),
        FieldValue::Array(items) => Value::Array(items.iter().map(data_to_json).collect()),
    }
}

fn data_to_json(data: &Data) -> Value {
    match data {
        Data::Class(obj) => match obj {
            Some(object) => object_to_json(object),
            None => Value::Null,
        },
        Data::Bool(v) => json!(v),
        Data::U8(v) => json!(v),
        Data::U16(v) => json!(v),
        Data::U32(v) => json!(v),
        Data::U64(v) => json!(v),
        Data::S8(v) => json!(v),
        Data::S16(v) => json!(v),
        Data::S32(v) => json!(v),
        Data::S64(v) => json!(v),
        Data::F32(v) => json!(*v as f64),
        Data::F64(v) => json!(v),
        Data::String(s) => json!(s),
        Data::CString(s) => json!(s),
        Data::Color(v) => json!(format!("#{:08X}", v)),
        Data::Point { x, y } => json!({ "x": x, "y": y }),
        Data::Size { w, h } => json!({ "w": w, "h": h }),
        Data::Rect { l, t, r, b } => json!({ "l": l, "t": t, "r": r, "b": b }),
        Data::Matrix(m) => matrix_to_json(m),
        Data::Vector3(v) => vector3_to_json(v),
        Data::Vector4(v) => vector4_to_json(v),
        Data::Quaternion(v) => vector4_to_json(v),
        Data::Time(v) => json!(v),
        Data::Float2 { x, y } => json!({ "x": x, "y": y }),
        Data::Float3(v) => float3_to_json(v),
        Data::Float4(v) => vector4_to_json(v),
        Data::Float3x3(m) => matrix_to_json(m),
        Data::Float4x3(m) => matrix_to_json(m),
        Data::Float4x4(m) => matrix_to_json(m),
        Data::EaseCurve { p1, p2 } => json!({ "p1": p1, "p2": p2 }),
        Data::Line { from, dir } => json!({ "from": vector3_to_json(from), "dir": vector3_to_json(dir) }),
        Data::LineSegment { p0, p1 } => json!({ "p0": vector3_to_json(p0), "p1": vector3_to_json(p1) }),
        Data::Ray { from, dir } => json!({ "from": vector3_to_json(from), "dir": vector3_to_json(dir) }),
        Data::Plane { normal, dist } => json!({ "normal": float3_to_json(normal), "dist": dist }),
        Data::Sphere { center, radius } => json!({ "center": float3_to_json(center), "radius": radius }),
        Data::Capsule { p0, p1, radius, .. } => {
            json!({ "p0": vector3_to_json(p0), "p1": vector3_to_json(p1), "radius": radius })
        }
        Data::Aabb { min, max } => json!({ "min": vector3_to_json(min), "max": vector3_to_json(max) }),
        Data::Obb { transform, extent } => json!({ "transform": matrix_to_json(transform), "extent": vector3_to_json(extent) }),
        Data::Cylinder { p0, p1, radius, .. } => {
            json!({ "p0": vector3_to_json(p0), "p1": vector3_to_json(p1), "radius": radius })
        }
        Data::Triangle { p0, p1, p2 } => {
            json!({ "p0": vector3_to_json(p0), "p1": vector3_to_json(p1), "p2": vector3_to_json(p2) })
        }
        Data::Cone { p0, r0, p1, r1 } => {
            json!({ "p0": float3_to_json(p0), "r0": r0, "p1": float3_to_json(p1), "r1": r1 })
        }
        Data::Torus { pos, r, axis, cr } => {
            json!({ "pos": vector3_to_json(pos), "r": r, "axis": vector3_to_json(axis), "cr": cr })
        }
        Data::Ellipsoid { pos, r } => json!({ "pos": vector3_to_json(pos), "r": vector3_to_json(r) }),
        Data::Range { s, r } => json!({ "s": s, "r": r }),
        Data::RangeF { s, r } => json!({ "s": s, "r": r }),
        Data::RangeU16 { s, r } => json!({ "s": s, "r": r }),
        Data::HermiteCurve { x, y } => json!({ "x": x.to_vec(), "y": y.to_vec() }),
        Data::Float3x4(m) => matrix_to_json(m),
        Data::LineSegment4 { p0, p1 } => json!({ "p0": soa_vector3_to_json(p0), "p1": soa_vector3_to_json(p1) }),
        Data::Aabb4 { min, max } => json!({ "min": soa_vector3_to_json(min), "max": soa_vector3_to_json(max) }),
        Data::Vector2 { x, y } => json!({ "x": x, "y": y }),
        Data::Matrix33(m) => matrix_to_json(m),
        Data::Rect3dXz { lt, lb, rt, rb, height } => json!({
            "lt": { "x": lt.0, "y": lt.1 },
            "lb": { "x": lb.0, "y": lb.1 },
            "rt": { "x": rt.0, "y": rt.1 },
            "rb": { "x": rb.0, "y": rb.1 },
            "height": height,
        }),
        Data::Rect3d { normal, size_w, center, size_h } => json!({
            "normal": vector3_to_json(normal),
            "size_w": size_w,
            "center": vector3_to_json(center),
            "size_h": size_h,
        }),
        Data::PlaneXz { dist } => json!({ "dist": dist }),
        Data::RayY { from, dir } => json!({ "from": float3_to_json(from), "dir": dir }),
        Data::PointF { x, y } => json!({ "x": x, "y": y }),
        Data::SizeF { w, h } => json!({ "w": w, "h": h }),
        Data::RectF { l, t, r, b } => json!({ "l": l, "t": t, "r": r, "b": b }),
        Data::Custom(values) => json!({ "values": values }),
    }
}

fn vector3_to_json(v: &Vector3) -> Value {
    json!({ "x": v.x, "y": v.y, "z": v.z })
}

fn vector4_to_json(v: &Vector4) -> Value {
    json!({ "x": v.x, "y": v.y, "z": v.z, "w": v.w })
}

fn float3_to_json(v: &Float3) -> Value {
    json!({ "x": v.x, "y": v.y, "z": v.z })
}

fn soa_vector3_to_json(v: &SoaVector3) -> Value {
    json!({ "x": vector4_to_json(&v.x), "y": vector4_to_json(&v.y), "z": vector4_to_json(&v.z) })
}

/// Row-major `{"m00": ..., "m01": ..., ...}`, `rows`×`cols` keyed by actual shape.
fn matrix_to_json<const R: usize, const C: usize>(m: &[[f32; C]; R]) -> Value {
    let mut map = Map::new();
    for (i, row) in m.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            map.insert(format!("m{}{}", i, j), json!(v));
        }
    }
    Value::Object(map)
}

// --- JSON -> Document -------------------------------------------------------

/// Parses a document's JSON envelope back into a [`Document`], synthesizing
/// `raw_header` for every definition (no captured raw header survives a JSON
/// round-trip; `$defs` is the only class-schema input) and assigning each
/// decoded object a fresh `id` by incrementing a running `class_count`.
pub fn from_json(value: &Value) -> Result<Document> {
    let obj = value.as_object().ok_or_else(|| Error::JsonShape("document envelope must be an object".to_string()))?;

    let major_version = get_u16(obj, "$major_version")?;
    let minor_version = get_u16(obj, "$minor_version")?;

    let defs_json = obj
        .get("$defs")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::JsonShape("missing or non-array \"$defs\"".to_string()))?;
    // `raw_header` is left `None` for every definition — the schema encoder
    // synthesizes a zero-padded header from `dti_hash`/`prop_count`/`init`
    // when it is absent, which is exactly what a JSON-sourced document needs.
    let definitions: Vec<Definition> = defs_json.iter().map(definition_from_json).collect::<Result<_>>()?;

    let mut class_count = 0i64;
    let root = match obj.get("root") {
        Some(Value::Null) | None => None,
        Some(root_json) => Some(object_from_json(root_json, &definitions, &mut class_count)?),
    };

    Ok(Document { major_version, minor_version, class_count, definitions, root })
}

fn definition_from_json(value: &Value) -> Result<Definition> {
    let obj = value.as_object().ok_or_else(|| Error::JsonShape("definition must be an object".to_string()))?;
    let dti_hash = get_u32(obj, "dti")?;
    let init = obj.get("init").and_then(Value::as_bool).unwrap_or(false);
    let props_json = obj
        .get("props")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::JsonShape("definition missing \"props\" array".to_string()))?;
    let props = props_json.iter().map(property_from_json).collect::<Result<_>>()?;
    Ok(Definition { dti_hash, init, raw_header: None, props })
}

fn property_from_json(value: &Value) -> Result<PropertyDef> {
    let obj = value.as_object().ok_or_else(|| Error::JsonShape("property must be an object".to_string()))?;
    let name = obj.get("name").and_then(Value::as_str).ok_or_else(|| Error::JsonShape("property missing \"name\"".to_string()))?;
    let prop_type_tag = get_u32(obj, "type")?;
    let prop_type = PropType::from_u32(prop_type_tag).ok_or(Error::UnsupportedType(prop_type_tag))?;
    let attr = get_u32(obj, "attr")? as u8;
    let bytes = get_u32(obj, "bytes")? as u16;
    let disable = obj.get("disable").and_then(Value::as_bool).unwrap_or(false);
    Ok(PropertyDef { name: Rc::from(name), prop_type, attr, bytes, disable })
}

fn object_from_json(value: &Value, defs: &[Definition], class_count: &mut i64) -> Result<Object> {
    let obj = value.as_object().ok_or_else(|| Error::JsonShape("object must be an object".to_string()))?;
    let def_id = get_u32(obj, "$id")? as usize;
    let def = defs.get(def_id).ok_or_else(|| Error::JsonShape(format!("object references unknown definition {}", def_id)))?;

    let id = *class_count as i16;
    *class_count += 1;

    let mut fields = Vec::with_capacity(def.props.len());
    for prop in &def.props {
        let field_json = obj
            .get(prop.name.as_ref())
            .ok_or_else(|| Error::JsonShape(format!("object missing property \"{}\"", prop.name)))?;
        let value = if field_json.is_array() {
            let items = field_json
                .as_array()
                .unwrap()
                .iter()
                .map(|item| data_from_json(item, prop.prop_type, defs, class_count))
                .collect::<Result<_>>()?;
            FieldValue::Array(items)
        } else {
            FieldValue::Scalar(data_from_json(field_json, prop.prop_type, defs, class_count)?)
        };
        fields.push(Field { name: prop.name.clone(), prop_type: prop.prop_type, value });
    }

    Ok(Object { def_id, id, fields })
}

fn data_from_json(value: &Value, prop_type: PropType, defs: &[Definition], class_count: &mut i64) -> Result<Data> {
    use PropType::*;

    if prop_type.is_reserved() || prop_type == Undefined {
        return Err(Error::UnsupportedType(prop_type as u32));
    }

    Ok(match prop_type {
        Class | ClassRef => match value {
            Value::Null => Data::Class(None),
            _ => Data::Class(Some(Box::new(object_from_json(value, defs, class_count)?))),
        },
        Bool => Data::Bool(req_bool(value)?),
        U8 => Data::U8(req_u64(value)? as u8),
        U16 => Data::U16(req_u64(value)? as u16),
        U32 => Data::U32(req_u64(value)? as u32),
        U64 => Data::U64(req_u64(value)?),
        S8 => Data::S8(req_i64(value)? as i8),
        S16 => Data::S16(req_i64(value)? as i16),
        S32 => Data::S32(req_i64(value)? as i32),
        S64 => Data::S64(req_i64(value)?),
        F32 => Data::F32(req_f64(value)? as f32),
        F64 => Data::F64(req_f64(value)?),
        String => Data::String(req_str(value)?.to_string()),
        CString => Data::CString(req_str(value)?.to_string()),
        Color => Data::Color(parse_color(req_str(value)?)?),
        Point => Data::Point { x: field_i64(value, "x")? as i32, y: field_i64(value, "y")? as i32 },
        Size => Data::Size { w: field_i64(value, "w")? as i32, h: field_i64(value, "h")? as i32 },
        Rect => Data::Rect {
            l: field_i64(value, "l")? as i32,
            t: field_i64(value, "t")? as i32,
            r: field_i64(value, "r")? as i32,
            b: field_i64(value, "b")? as i32,
        },
        Matrix => Data::Matrix(matrix_from_json(value)?),
        Vector3 => Data::Vector3(vector3_from_json(value)?),
        Vector4 => Data::Vector4(vector4_from_json(value)?),
        Quaternion => Data::Quaternion(vector4_from_json(value)?),
        Time => Data::Time(req_i64(value)?),
        Float2 => Data::Float2 { x: field_f64(value, "x")? as f32, y: field_f64(value, "y")? as f32 },
        Float3 => Data::Float3(float3_from_json(value)?),
        Float4 => Data::Float4(vector4_from_json(value)?),
        Float3x3 => Data::Float3x3(matrix_from_json(value)?),
        Float4x3 => Data::Float4x3(matrix_from_json(value)?),
        Float4x4 => Data::Float4x4(matrix_from_json(value)?),
        EaseCurve => Data::EaseCurve { p1: field_f64(value, "p1")? as f32, p2: field_f64(value, "p2")? as f32 },
        Line => Data::Line { from: field_vector3(value, "from")?, dir: field_vector3(value, "dir")? },
        LineSegment => Data::LineSegment { p0: field_vector3(value, "p0")?, p1: field_vector3(value, "p1")? },
        Ray => Data::Ray { from: field_vector3(value, "from")?, dir: field_vector3(value, "dir")? },
        Plane => Data::Plane { normal: field_float3(value, "normal")?, dist: field_f64(value, "dist")? as f32 },
        Sphere => Data::Sphere { center: field_float3(value, "center")?, radius: field_f64(value, "radius")? as f32 },
        Capsule => Data::Capsule {
            p0: field_vector3(value, "p0")?,
            p1: field_vector3(value, "p1")?,
            radius: field_f64(value, "radius")? as f32,
            pad: [0.0; 3],
        },
        Aabb => Data::Aabb { min: field_vector3(value, "min")?, max: field_vector3(value, "max")? },
        Obb => Data::Obb { transform: field_matrix(value, "transform")?, extent: field_vector3(value, "extent")? },
        Cylinder => Data::Cylinder {
            p0: field_vector3(value, "p0")?,
            p1: field_vector3(value, "p1")?,
            radius: field_f64(value, "radius")? as f32,
            pad: [0.0; 3],
        },
        Triangle => {
            Data::Triangle { p0: field_vector3(value, "p0")?, p1: field_vector3(value, "p1")?, p2: field_vector3(value, "p2")? }
        }
        Cone => Data::Cone {
            p0: field_float3(value, "p0")?,
            r0: field_f64(value, "r0")? as f32,
            p1: field_float3(value, "p1")?,
            r1: field_f64(value, "r1")? as f32,
        },
        Torus => Data::Torus {
            pos: field_vector3(value, "pos")?,
            r: field_f64(value, "r")? as f32,
            axis: field_vector3(value, "axis")?,
            cr: field_f64(value, "cr")? as f32,
        },
        Ellipsoid => Data::Ellipsoid { pos: field_vector3(value, "pos")?, r: field_vector3(value, "r")? },
        Range => Data::Range { s: field_i64(value, "s")? as i32, r: field_i64(value, "r")? as u32 },
        RangeF => Data::RangeF { s: field_f64(value, "s")? as f32, r: field_f64(value, "r")? as f32 },
        RangeU16 => Data::RangeU16 { s: field_i64(value, "s")? as u16, r: field_i64(value, "r")? as u16 },
        HermiteCurve => {
            let x = field_f32_array::<8>(value, "x")?;
            let y = field_f32_array::<8>(value, "y")?;
            Data::HermiteCurve { x, y }
        }
        Float3x4 => Data::Float3x4(matrix_from_json(value)?),
        LineSegment4 => Data::LineSegment4 { p0: field_soa_vector3(value, "p0")?, p1: field_soa_vector3(value, "p1")? },
        Aabb4 => Data::Aabb4 { min: field_soa_vector3(value, "min")?, max: field_soa_vector3(value, "max")? },
        Vector2 => Data::Vector2 { x: field_f64(value, "x")? as f32, y: field_f64(value, "y")? as f32 },
        Matrix33 => Data::Matrix33(matrix_from_json(value)?),
        Rect3dXz => Data::Rect3dXz {
            lt: field_vector2(value, "lt")?,
            lb: field_vector2(value, "lb")?,
            rt: field_vector2(value, "rt")?,
            rb: field_vector2(value, "rb")?,
            height: field_f64(value, "height")? as f32,
        },
        Rect3d => Data::Rect3d {
            normal: field_vector3(value, "normal")?,
            size_w: field_f64(value, "size_w")? as f32,
            center: field_vector3(value, "center")?,
            size_h: field_f64(value, "size_h")? as f32,
        },
        PlaneXz => Data::PlaneXz { dist: field_f64(value, "dist")? as f32 },
        RayY => Data::RayY { from: field_float3(value, "from")?, dir: field_f64(value, "dir")? as f32 },
        PointF => Data::PointF { x: field_f64(value, "x")? as f32, y: field_f64(value, "y")? as f32 },
        SizeF => Data::SizeF { w: field_f64(value, "w")? as f32, h: field_f64(value, "h")? as f32 },
        RectF => Data::RectF {
            l: field_f64(value, "l")? as f32,
            t: field_f64(value, "t")? as f32,
            r: field_f64(value, "r")? as f32,
            b: field_f64(value, "b")? as f32,
        },
        Custom => {
            let values = value
                .get("values")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::JsonShape("custom value missing \"values\" array".to_string()))?
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| Error::JsonShape("custom entry must be a string".to_string())))
                .collect::<Result<Vec<_>>>()?;
            if values.len() > 255 {
                return Err(Error::Allocation);
            }
            Data::Custom(values)
        }
        Undefined | Property | Event | Group | PageBegin | PageEnd | Event32 | Array | PropertyList | GroupEnd
        | EnumList | Oscillator | Variable | Rect3dCollision | Event64 | End => {
            return Err(Error::UnsupportedType(prop_type as u32));
        }
    })
}

fn parse_color(hex: &str) -> Result<u32> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    u32::from_str_radix(digits, 16).map_err(|_| Error::JsonShape(format!("invalid color literal \"{}\"", hex)))
}

fn get_u16(obj: &Map<String, Value>, key: &str) -> Result<u16> {
    obj.get(key)
        .and_then(Value::as_u64)
        .map(|v| v as u16)
        .ok_or_else(|| Error::JsonShape(format!("missing or non-numeric \"{}\"", key)))
}

fn get_u32(obj: &Map<String, Value>, key: &str) -> Result<u32> {
    obj.get(key)
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .ok_or_else(|| Error::JsonShape(format!("missing or non-numeric \"{}\"", key)))
}

fn req_bool(value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| Error::JsonShape("expected a boolean".to_string()))
}

fn req_u64(value: &Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| Error::JsonShape("expected a non-negative integer".to_string()))
}

fn req_i64(value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| Error::JsonShape("expected an integer".to_string()))
}

fn req_f64(value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| Error::JsonShape("expected a number".to_string()))
}

fn req_str(value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| Error::JsonShape("expected a string".to_string()))
}

fn field_i64(value: &Value, key: &str) -> Result<i64> {
    value
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::JsonShape(format!("missing or non-numeric \"{}\"", key)))
}

fn field_f64(value: &Value, key: &str) -> Result<f64> {
    value
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::JsonShape(format!("missing or non-numeric \"{}\"", key)))
}

fn field_vector3(value: &Value, key: &str) -> Result<Vector3> {
    value.get(key).ok_or_else(|| Error::JsonShape(format!("missing \"{}\"", key))).and_then(vector3_from_json)
}

fn field_float3(value: &Value, key: &str) -> Result<Float3> {
    value.get(key).ok_or_else(|| Error::JsonShape(format!("missing \"{}\"", key))).and_then(float3_from_json)
}

fn field_matrix<const R: usize, const C: usize>(value: &Value, key: &str) -> Result<[[f32; C]; R]> {
    value.get(key).ok_or_else(|| Error::JsonShape(format!("missing \"{}\"", key))).and_then(matrix_from_json)
}

fn field_soa_vector3(value: &Value, key: &str) -> Result<SoaVector3> {
    value.get(key).ok_or_else(|| Error::JsonShape(format!("missing \"{}\"", key))).and_then(soa_vector3_from_json)
}

fn field_vector2(value: &Value, key: &str) -> Result<(f32, f32)> {
    let node = value.get(key).ok_or_else(|| Error::JsonShape(format!("missing \"{}\"", key)))?;
    Ok((field_f64(node, "x")? as f32, field_f64(node, "y")? as f32))
}

fn field_f32_array<const N: usize>(value: &Value, key: &str) -> Result<[f32; N]> {
    let arr = value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::JsonShape(format!("missing or non-array \"{}\"", key)))?;
    if arr.len() != N {
        return Err(Error::JsonShape(format!("\"{}\" must have exactly {} entries", key, N)));
    }
    let mut out = [0f32; N];
    for (slot, v) in out.iter_mut().zip(arr.iter()) {
        *slot = v.as_f64().ok_or_else(|| Error::JsonShape(format!("\"{}\" entries must be numbers", key)))? as f32;
    }
    Ok(out)
}

/// The wire-only pad word is not part of the JSON projection; it is always
/// synthesized as `0.0` when building a `Vector3` from JSON.
fn vector3_from_json(value: &Value) -> Result<Vector3> {
    Ok(Vector3 {
        x: field_f64(value, "x")? as f32,
        y: field_f64(value, "y")? as f32,
        z: field_f64(value, "z")? as f32,
        pad: 0.0,
    })
}

fn vector4_from_json(value: &Value) -> Result<Vector4> {
    Ok(Vector4 {
        x: field_f64(value, "x")? as f32,
        y: field_f64(value, "y")? as f32,
        z: field_f64(value, "z")? as f32,
        w: field_f64(value, "w")? as f32,
    })
}

fn float3_from_json(value: &Value) -> Result<Float3> {
    Ok(Float3 { x: field_f64(value, "x")? as f32, y: field_f64(value, "y")? as f32, z: field_f64(value, "z")? as f32 })
}

fn soa_vector3_from_json(value: &Value) -> Result<SoaVector3> {
    Ok(SoaVector3 {
        x: field_vector4(value, "x")?,
        y: field_vector4(value, "y")?,
        z: field_vector4(value, "z")?,
    })
}

fn field_vector4(value: &Value, key: &str) -> Result<Vector4> {
    value.get(key).ok_or_else(|| Error::JsonShape(format!("missing \"{}\"", key))).and_then(vector4_from_json)
}

fn matrix_from_json<const R: usize, const C: usize>(value: &Value) -> Result<[[f32; C]; R]> {
    let mut m = [[0f32; C]; R];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = field_f64(value, &format!("m{}{}", i, j))? as f32;
        }
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyDef;

    #[test]
    fn empty_document_projects_to_spec_envelope() {
        let doc = Document { major_version: 16, minor_version: 0, class_count: 0, definitions: vec![], root: None };
        let value = to_json(&doc);
        assert_eq!(value["root"], Value::Null);
        assert_eq!(value["$defs"], json!([]));
        assert_eq!(value["$major_version"], 16);
        assert_eq!(value["$minor_version"], 0);
    }

    #[test]
    fn color_projects_to_uppercase_hex() {
        assert_eq!(data_to_json(&Data::Color(0xAABBCCDD)), json!("#AABBCCDD"));
    }

    #[test]
    fn round_trips_through_json() {
        let def = Definition {
            dti_hash: 7,
            init: true,
            raw_header: Some(vec![0; 8]),
            props: vec![PropertyDef { name: Rc::from("x"), prop_type: PropType::U32, attr: 0, bytes: 4, disable: false }],
        };
        let root = Object {
            def_id: 0,
            id: 0,
            fields: vec![Field { name: Rc::from("x"), prop_type: PropType::U32, value: FieldValue::Scalar(Data::U32(42)) }],
        };
        let doc = Document { major_version: 16, minor_version: 0, class_count: 1, definitions: vec![def], root: Some(root) };

        let json = to_json(&doc);
        let round_tripped = from_json(&json).unwrap();
        assert_eq!(round_tripped.major_version, 16);
        assert_eq!(round_tripped.definitions[0].dti_hash, 7);
        assert!(round_tripped.definitions[0].init);
        match &round_tripped.root.unwrap().fields[0].value {
            FieldValue::Scalar(Data::U32(v)) => assert_eq!(*v, 42),
            other => panic!("unexpected {:?}", other),
        }
    }
}
