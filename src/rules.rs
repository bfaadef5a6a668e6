//! Field declarations and the rule classifier.
//!
//! A declaration is a bag of rule categories (`isInt`, `optional`, `custom`, …)
//! keyed by name. Classification picks exactly one inference strategy for it,
//! by a fixed precedence; see [`Strategy::PRECEDENCE`].
pub mod catalog;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use catalog::{Catalog, CatalogEntry, OutputPrimitive, RuleKind};

pub const OPTIONAL: &str = "optional";
pub const DEFAULT: &str = "default";
pub const CUSTOM_SANITIZER: &str = "customSanitizer";
pub const CUSTOM: &str = "custom";
pub const IS_IN: &str = "isIn";
pub const IS_ARRAY: &str = "isArray";
pub const TO_ARRAY: &str = "toArray";

pub const DEFAULT_OR_OPTIONAL_KEYS: [&str; 2] = [OPTIONAL, DEFAULT];
pub const ARRAY_KEYS: [&str; 2] = [IS_ARRAY, TO_ARRAY];

// ---------------------------- Declarations -------------------------------- //

/// Rule category → opaque options payload, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDeclaration {
    rules: IndexMap<String, Value>,
}

impl FieldDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: `FieldDeclaration::new().rule("isInt", true)`.
    pub fn rule(mut self, name: impl Into<String>, options: impl Into<Value>) -> Self {
        self.rules.insert(name.into(), options.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, options: impl Into<Value>) -> Option<Value> {
        self.rules.insert(name.into(), options.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.rules.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn has_any(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.has(n))
    }

    /// A copy with the given categories stripped, used for the recursive
    /// strategies (optional/default, array wrapper).
    pub fn without(&self, names: &[&str]) -> Self {
        Self {
            rules: self.rules.iter()
                .filter(|(k, _)| !names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FieldDeclaration {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self { rules: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

impl TryFrom<Value> for FieldDeclaration {
    type Error = serde_json::Error;
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

// ----------------------------- Classifier --------------------------------- //

/// Inference strategies, declared in precedence order (the derived `Ord`
/// follows it): the first one whose rules are present wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    DefaultOrOptional,
    CustomSanitizer,
    CustomValidator,
    Enumeration,
    ArrayWrapper,
    BuiltinSanitizer,
    BuiltinValidator,
    None,
}

impl Strategy {
    pub const PRECEDENCE: [Strategy; 8] = [
        Strategy::DefaultOrOptional,
        Strategy::CustomSanitizer,
        Strategy::CustomValidator,
        Strategy::Enumeration,
        Strategy::ArrayWrapper,
        Strategy::BuiltinSanitizer,
        Strategy::BuiltinValidator,
        Strategy::None,
    ];

    fn applies(self, declaration: &FieldDeclaration, catalog: &Catalog) -> bool {
        match self {
            Strategy::DefaultOrOptional => declaration.has_any(&DEFAULT_OR_OPTIONAL_KEYS),
            Strategy::CustomSanitizer => declaration.has(CUSTOM_SANITIZER),
            Strategy::CustomValidator => declaration.has(CUSTOM),
            Strategy::Enumeration => declaration.has(IS_IN),
            Strategy::ArrayWrapper => declaration.has_any(&ARRAY_KEYS),
            Strategy::BuiltinSanitizer => {
                catalog.matching(declaration.rule_names(), RuleKind::Sanitizer).next().is_some()
            }
            Strategy::BuiltinValidator => {
                catalog.matching(declaration.rule_names(), RuleKind::Validator).next().is_some()
            }
            Strategy::None => true,
        }
    }
}

pub fn classify(declaration: &FieldDeclaration, catalog: &Catalog) -> Strategy {
    Strategy::PRECEDENCE
        .into_iter()
        .find(|s| s.applies(declaration, catalog))
        .unwrap_or(Strategy::None)
}
