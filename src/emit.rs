//! Descriptor output: a JSON-Schema-ish document and a TypeScript-like type
//! expression. The JSON form is also what `returns` hints are written in, so it
//! parses back with [`TypeDescriptor::from_json`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::descriptor::{Literal, Primitive, TypeDescriptor};
use crate::error::json_kind;

// ------------------------------- JSON ------------------------------------- //

pub fn to_json(d: &TypeDescriptor) -> Value {
    match d {
        TypeDescriptor::Unknown => json!({ "type": "unknown" }),
        TypeDescriptor::Primitive(p) => match p {
            Primitive::Boolean => json!({ "type": "boolean" }),
            Primitive::Date => json!({ "type": "date" }),
            Primitive::Integer => json!({ "type": "integer" }),
            Primitive::Float => json!({ "type": "float" }),
            Primitive::String => json!({ "type": "string" }),
            Primitive::EmptyObject => json!({ "type": "emptyObject" }),
            Primitive::Literal(lit) => match lit.to_json() {
                Some(v) => json!({ "const": v }),
                None => json!({ "type": "undefined" }),
            },
        },
        TypeDescriptor::UnionOf(members) => {
            json!({ "anyOf": members.iter().map(to_json).collect::<Vec<_>>() })
        }
        TypeDescriptor::ArrayOf(el) => json!({ "type": "array", "items": to_json(el) }),
        TypeDescriptor::ObjectOf(fields) => {
            let props = fields
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect::<Map<String, Value>>();
            json!({ "type": "object", "properties": props })
        }
    }
}

impl TypeDescriptor {
    /// Inverse of [`to_json`]. A bare string is shorthand for `{"type": <string>}`.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let map = match value {
            Value::String(ty) => return Self::from_type_name(ty, &Map::new()),
            Value::Object(map) => map,
            other => return Err(format!("expected a type object or type name, found {}", json_kind(other))),
        };
        if let Some(members) = map.get("anyOf") {
            let Value::Array(members) = members else {
                return Err("`anyOf` must be an array".into());
            };
            let parsed = members.iter().map(Self::from_json).collect::<Result<Vec<_>, _>>()?;
            if parsed.is_empty() {
                return Err("`anyOf` must not be empty".into());
            }
            return Ok(Self::union(parsed));
        }
        if let Some(c) = map.get("const") {
            return Literal::from_json(c)
                .map(Self::literal)
                .ok_or_else(|| format!("`const` must be a scalar, found {}", json_kind(c)));
        }
        match map.get("type") {
            Some(Value::String(ty)) => Self::from_type_name(ty, map),
            Some(other) => Err(format!("`type` must be a string, found {}", json_kind(other))),
            None => Err("expected one of `type`, `const` or `anyOf`".into()),
        }
    }

    fn from_type_name(ty: &str, map: &Map<String, Value>) -> Result<Self, String> {
        Ok(match ty {
            "unknown" => Self::Unknown,
            "boolean" => Self::boolean(),
            "date" => Self::date(),
            "integer" => Self::integer(),
            "float" | "number" => Self::float(),
            "string" => Self::string(),
            "emptyObject" => Self::empty_object(),
            "undefined" => Self::undefined(),
            "null" => Self::null(),
            "array" => Self::array_of(match map.get("items") {
                Some(items) => Self::from_json(items)?,
                None => Self::Unknown,
            }),
            "object" => match map.get("properties") {
                None => Self::ObjectOf(Default::default()),
                Some(Value::Object(props)) => Self::ObjectOf(
                    props
                        .iter()
                        .map(|(k, v)| Self::from_json(v).map(|d| (k.clone(), d)))
                        .collect::<Result<_, _>>()?,
                ),
                Some(other) => return Err(format!("`properties` must be an object, found {}", json_kind(other))),
            },
            other => return Err(format!("unknown type `{other}`")),
        })
    }
}

// ------------------------------- Text ------------------------------------- //

// `None` only if the pattern fails to compile; every key is quoted then.
static IDENTIFIER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").ok());

/// `{ a: string; b: integer[] | undefined }`
pub fn render(d: &TypeDescriptor) -> String {
    match d {
        TypeDescriptor::Unknown => "unknown".into(),
        TypeDescriptor::Primitive(p) => match p {
            Primitive::Boolean => "boolean".into(),
            Primitive::Date => "Date".into(),
            Primitive::Integer => "integer".into(),
            Primitive::Float => "float".into(),
            Primitive::String => "string".into(),
            Primitive::EmptyObject => "{}".into(),
            Primitive::Literal(lit) => lit.to_string(),
        },
        TypeDescriptor::UnionOf(members) => members.iter().map(render).collect::<Vec<_>>().join(" | "),
        TypeDescriptor::ArrayOf(el) if el.is_union() => format!("({})[]", render(el)),
        TypeDescriptor::ArrayOf(el) => format!("{}[]", render(el)),
        TypeDescriptor::ObjectOf(fields) if fields.is_empty() => "{}".into(),
        TypeDescriptor::ObjectOf(fields) => {
            let body = fields
                .iter()
                .map(|(k, v)| format!("{}: {}", render_key(k), render(v)))
                .collect::<Vec<_>>()
                .join("; ");
            format!("{{ {body} }}")
        }
    }
}

/// Multi-line variant of [`render`] for CLI output.
pub fn render_pretty(d: &TypeDescriptor) -> String {
    let mut out = String::new();
    write_pretty(d, 0, &mut out);
    out
}

fn write_pretty(d: &TypeDescriptor, depth: usize, out: &mut String) {
    match d {
        TypeDescriptor::ObjectOf(fields) if !fields.is_empty() => {
            out.push_str("{\n");
            for (k, v) in fields {
                out.push_str(&"  ".repeat(depth + 1));
                out.push_str(&render_key(k));
                out.push_str(": ");
                write_pretty(v, depth + 1, out);
                out.push_str(";\n");
            }
            out.push_str(&"  ".repeat(depth));
            out.push('}');
        }
        TypeDescriptor::ArrayOf(el) if matches!(**el, TypeDescriptor::ObjectOf(_)) => {
            write_pretty(el, depth, out);
            out.push_str("[]");
        }
        TypeDescriptor::UnionOf(members) => {
            let mut first = true;
            for m in members {
                if !first {
                    out.push_str(" | ");
                }
                first = false;
                write_pretty(m, depth, out);
            }
        }
        other => out.push_str(&render(other)),
    }
}

fn render_key(k: &str) -> String {
    if matches!(&*IDENTIFIER, Some(re) if re.is_match(k)) {
        k.to_string()
    } else {
        Value::from(k).to_string()
    }
}

// ------------------------------- Tests ------------------------------------ //
