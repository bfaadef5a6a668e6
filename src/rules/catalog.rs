use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::descriptor::TypeDescriptor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Sanitizer,
    Validator,
}

/// What a builtin rule leaves behind in the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputPrimitive {
    Boolean,
    Date,
    Integer,
    Float,
    String,
    EmptyObject,
}

impl OutputPrimitive {
    pub fn descriptor(self) -> TypeDescriptor {
        match self {
            OutputPrimitive::Boolean => TypeDescriptor::boolean(),
            OutputPrimitive::Date => TypeDescriptor::date(),
            OutputPrimitive::Integer => TypeDescriptor::integer(),
            OutputPrimitive::Float => TypeDescriptor::float(),
            OutputPrimitive::String => TypeDescriptor::string(),
            OutputPrimitive::EmptyObject => TypeDescriptor::empty_object(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CatalogEntry {
    pub kind: RuleKind,
    pub output_primitive: OutputPrimitive,
}

impl CatalogEntry {
    pub const fn sanitizer(output_primitive: OutputPrimitive) -> Self {
        Self { kind: RuleKind::Sanitizer, output_primitive }
    }

    pub const fn validator(output_primitive: OutputPrimitive) -> Self {
        Self { kind: RuleKind::Validator, output_primitive }
    }
}

/// Rule name → builtin behavior. Names not in the catalog are ignored by the
/// classifier.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    entries: IndexMap<String, CatalogEntry>,
}

const SANITIZERS: &[(&str, OutputPrimitive)] = &[
    ("toBoolean", OutputPrimitive::Boolean),
    ("toDate", OutputPrimitive::Date),
    ("toFloat", OutputPrimitive::Float),
    ("toInt", OutputPrimitive::Integer),
    ("ltrim", OutputPrimitive::String),
    ("rtrim", OutputPrimitive::String),
    ("trim", OutputPrimitive::String),
    ("toLowerCase", OutputPrimitive::String),
    ("toUpperCase", OutputPrimitive::String),
    ("escape", OutputPrimitive::String),
    ("unescape", OutputPrimitive::String),
];

const VALIDATORS: &[(&str, OutputPrimitive)] = &[
    ("isBoolean", OutputPrimitive::Boolean),
    ("isDate", OutputPrimitive::Date),
    ("isFloat", OutputPrimitive::Float),
    ("isInt", OutputPrimitive::Integer),
    ("isString", OutputPrimitive::String),
    ("isULID", OutputPrimitive::String),
    ("isAlpha", OutputPrimitive::String),
    ("isAlphanumeric", OutputPrimitive::String),
    ("isAscii", OutputPrimitive::String),
    ("isBase32", OutputPrimitive::String),
    ("isBase58", OutputPrimitive::String),
    ("isBase64", OutputPrimitive::String),
    ("isBtcAddress", OutputPrimitive::String),
    ("isCreditCard", OutputPrimitive::String),
    ("isCurrency", OutputPrimitive::String),
    ("isEmail", OutputPrimitive::String),
    ("isISO6346", OutputPrimitive::String),
    ("isISO4217", OutputPrimitive::String),
    ("isISO8601", OutputPrimitive::String),
    ("isObject", OutputPrimitive::EmptyObject),
];

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    let mut catalog = Catalog::empty();
    for (name, out) in SANITIZERS {
        catalog.insert(*name, CatalogEntry::sanitizer(*out));
    }
    for (name, out) in VALIDATORS {
        catalog.insert(*name, CatalogEntry::validator(*out));
    }
    catalog
});

impl Catalog {
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn empty() -> Self {
        Self { entries: IndexMap::new() }
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: CatalogEntry) -> Option<CatalogEntry> {
        self.entries.insert(name.into(), entry)
    }

    /// Add (or override) entries from a caller-supplied table.
    pub fn extend<I, K>(&mut self, table: I)
    where
        I: IntoIterator<Item = (K, CatalogEntry)>,
        K: Into<String>,
    {
        for (name, entry) in table {
            self.insert(name, entry);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of `kind` among `names`, in the order the names are given.
    pub fn matching<'a, I>(&'a self, names: I, kind: RuleKind) -> impl Iterator<Item = (&'a str, &'a CatalogEntry)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().filter_map(move |name| {
            self.entries.get_key_value(name)
                .filter(|(_, e)| e.kind == kind)
                .map(|(k, e)| (k.as_str(), e))
        })
    }
}
