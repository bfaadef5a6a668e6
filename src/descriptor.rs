//! The inferred value-type tree.
//!
//! A [`TypeDescriptor`] is what a compiled schema hands back: plain tagged data,
//! ordered (`BTreeMap`/`BTreeSet`) so structural equality and set semantics hold
//! independent of declaration order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ordered_float::OrderedFloat;
use serde_json::Value;

/// A single literal value. `Undefined` stands for "absent".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(OrderedFloat<f64>),
    String(String),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Primitive {
    Boolean,
    Date,
    Integer,
    Float,
    String,
    /// `{}`: "some object", with no known fields.
    EmptyObject,
    Literal(Literal),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeDescriptor {
    Unknown,
    Primitive(Primitive),
    /// Always normalized: flat, at least two members, never contains `Unknown`.
    UnionOf(BTreeSet<TypeDescriptor>),
    ArrayOf(Box<TypeDescriptor>),
    ObjectOf(BTreeMap<String, TypeDescriptor>),
}

// ------------------------------ Literals ---------------------------------- //

impl Literal {
    /// Scalar JSON → literal. Arrays and objects are not literals.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => n.as_f64().map(|f| Literal::Number(OrderedFloat(f))),
            Value::String(s) => Some(Literal::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// `None` for `Undefined`, which has no JSON spelling.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Literal::Undefined => None,
            Literal::Null => Some(Value::Null),
            Literal::Bool(b) => Some(Value::Bool(*b)),
            Literal::Number(n) => Some(json_num_pref_i64(n.0)),
            Literal::String(s) => Some(Value::String(s.clone())),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Undefined => f.write_str("undefined"),
            other => match other.to_json() {
                Some(v) => write!(f, "{v}"),
                None => f.write_str("undefined"),
            },
        }
    }
}

// Prefer integers when exact, so `0` prints as `0` and not `0.0`.
pub(crate) fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ---------------------------- Constructors -------------------------------- //

impl TypeDescriptor {
    pub fn boolean() -> Self { Self::Primitive(Primitive::Boolean) }
    pub fn date() -> Self { Self::Primitive(Primitive::Date) }
    pub fn integer() -> Self { Self::Primitive(Primitive::Integer) }
    pub fn float() -> Self { Self::Primitive(Primitive::Float) }
    pub fn string() -> Self { Self::Primitive(Primitive::String) }
    pub fn empty_object() -> Self { Self::Primitive(Primitive::EmptyObject) }
    pub fn literal(lit: Literal) -> Self { Self::Primitive(Primitive::Literal(lit)) }
    pub fn undefined() -> Self { Self::literal(Literal::Undefined) }
    pub fn null() -> Self { Self::literal(Literal::Null) }

    pub fn array_of(element: TypeDescriptor) -> Self {
        Self::ArrayOf(Box::new(element))
    }

    pub fn object_of<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TypeDescriptor)>,
        K: Into<String>,
    {
        Self::ObjectOf(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a normalized union: nested unions are flattened, duplicates
    /// collapse, a single member stands alone, and `Unknown` swallows the rest.
    /// An empty member list yields `Unknown`.
    pub fn union<I>(members: I) -> Self
    where
        I: IntoIterator<Item = TypeDescriptor>,
    {
        let mut set = BTreeSet::new();
        for m in members {
            match m {
                TypeDescriptor::Unknown => return TypeDescriptor::Unknown,
                TypeDescriptor::UnionOf(inner) => set.extend(inner),
                other => { set.insert(other); }
            }
        }
        match set.len() {
            0 => TypeDescriptor::Unknown,
            1 => set.into_iter().next().unwrap_or(TypeDescriptor::Unknown),
            _ => TypeDescriptor::UnionOf(set),
        }
    }

    /// The structural descriptor of a concrete JSON value: scalars become
    /// literals, arrays the union of their elements, objects their fields.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Array(xs) if xs.is_empty() => Self::array_of(Self::Unknown),
            Value::Array(xs) => Self::array_of(Self::union(xs.iter().map(Self::of_value))),
            Value::Object(map) => Self::object_of(map.iter().map(|(k, v)| (k.clone(), Self::of_value(v)))),
            scalar => match Literal::from_json(scalar) {
                Some(lit) => Self::literal(lit),
                None => Self::Unknown,
            },
        }
    }
}

// ------------------------------ Queries ----------------------------------- //

impl TypeDescriptor {
    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeDescriptor::Unknown)
    }

    pub fn is_union(&self) -> bool {
        matches!(self, TypeDescriptor::UnionOf(_))
    }

    /// Union members, or the descriptor itself as a one-element view.
    pub fn members(&self) -> Vec<&TypeDescriptor> {
        match self {
            TypeDescriptor::UnionOf(set) => set.iter().collect(),
            other => vec![other],
        }
    }

    pub fn field(&self, name: &str) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::ObjectOf(fields) => fields.get(name),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::ArrayOf(el) => Some(el),
            _ => None,
        }
    }

    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Unknown => "unknown",
            TypeDescriptor::Primitive(p) => match p {
                Primitive::Boolean => "boolean",
                Primitive::Date => "date",
                Primitive::Integer => "integer",
                Primitive::Float => "float",
                Primitive::String => "string",
                Primitive::EmptyObject => "empty object",
                Primitive::Literal(_) => "literal",
            },
            TypeDescriptor::UnionOf(_) => "union",
            TypeDescriptor::ArrayOf(_) => "array",
            TypeDescriptor::ObjectOf(_) => "object",
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::emit::render(self))
    }
}

// ------------------------------- Tests ------------------------------------ //
