//! Declaration → value type.
//!
//! Each strategy from [`crate::rules::classify`] has one arm here. The two
//! recursive strategies (optional/default and the array wrapper) strip their
//! own rule categories and resolve what is left.
//!
//! Builtin validators widen to `T | T[]` on top-level fields only, unless the
//! resolver is built with `widen_nested_validators(true)` (config
//! `widenNestedValidators`), which widens nested fields as well, as the
//! validation library's own typings do.

use serde_json::{Map, Value};

use crate::descriptor::{Literal, TypeDescriptor};
use crate::error::{json_kind, RuleError};
use crate::rules::{
    self, classify, Catalog, FieldDeclaration, OutputPrimitive, RuleKind, Strategy,
    ARRAY_KEYS, DEFAULT_OR_OPTIONAL_KEYS,
};

/// Where in the tree a declaration sits. Builtin validators accept either a
/// scalar or an array of it, but only a top-level field is widened that way
/// by default: nested fields are not, and array elements never are.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Field,
    NestedField,
    Element,
}

/// How an optional field looks when it is left out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Absence {
    /// `undefined`
    Undefined,
    /// `null | undefined`
    Nullish,
    /// `"" | 0 | false | null | undefined`
    Falsy,
}

impl Absence {
    pub fn descriptor(self) -> TypeDescriptor {
        let lits: &[Literal] = match self {
            Absence::Undefined => &[Literal::Undefined],
            Absence::Nullish => &[Literal::Null, Literal::Undefined],
            Absence::Falsy => &[
                Literal::String(String::new()),
                Literal::Number(0.0.into()),
                Literal::Bool(false),
                Literal::Null,
                Literal::Undefined,
            ],
        };
        TypeDescriptor::union(lits.iter().cloned().map(TypeDescriptor::literal))
    }

    fn from_values_discriminator(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Absence::Undefined),
            Value::String(s) => match s.as_str() {
                "undefined" => Some(Absence::Undefined),
                "null" => Some(Absence::Nullish),
                "falsy" => Some(Absence::Falsy),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A resolved declaration, with the absence representation kept apart so the
/// tree builder can re-attach it after merging deeper declarations.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub base: TypeDescriptor,
    pub absence: Option<TypeDescriptor>,
}

impl Resolved {
    fn present(base: TypeDescriptor) -> Self {
        Self { base, absence: None }
    }

    pub fn into_descriptor(self) -> TypeDescriptor {
        match self.absence {
            None => self.base,
            Some(absent) => TypeDescriptor::union([self.base, absent]),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    widen_nested_validators: bool,
}

impl Default for Resolver<'static> {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog, widen_nested_validators: false }
    }

    pub fn widen_nested_validators(mut self, yes: bool) -> Self {
        self.widen_nested_validators = yes;
        self
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Resolve a top-level field declaration.
    pub fn resolve(&self, declaration: &FieldDeclaration) -> Result<TypeDescriptor, RuleError> {
        self.resolve_at(declaration, Position::Field)
    }

    pub fn resolve_at(&self, declaration: &FieldDeclaration, position: Position) -> Result<TypeDescriptor, RuleError> {
        self.resolve_parts(declaration, position).map(Resolved::into_descriptor)
    }

    pub fn resolve_parts(&self, declaration: &FieldDeclaration, position: Position) -> Result<Resolved, RuleError> {
        let strategy = classify(declaration, self.catalog);
        tracing::trace!(?strategy, ?position, rules = declaration.len(), "resolving declaration");
        match strategy {
            Strategy::DefaultOrOptional => self.default_or_optional(declaration, position),
            Strategy::CustomSanitizer => hint(declaration, rules::CUSTOM_SANITIZER).map(Resolved::present),
            Strategy::CustomValidator => hint(declaration, rules::CUSTOM).map(Resolved::present),
            Strategy::Enumeration => enumeration(declaration).map(Resolved::present),
            Strategy::ArrayWrapper => self.array_wrapper(declaration).map(Resolved::present),
            Strategy::BuiltinSanitizer => Ok(Resolved::present(self.builtin(declaration, RuleKind::Sanitizer, false))),
            Strategy::BuiltinValidator => {
                let widen = match position {
                    Position::Field => true,
                    Position::NestedField => self.widen_nested_validators,
                    Position::Element => false,
                };
                Ok(Resolved::present(self.builtin(declaration, RuleKind::Validator, widen)))
            }
            Strategy::None => Ok(Resolved::present(TypeDescriptor::Unknown)),
        }
    }

    fn default_or_optional(&self, declaration: &FieldDeclaration, position: Position) -> Result<Resolved, RuleError> {
        if let Some(value) = default_value(declaration.get(rules::DEFAULT))? {
            return Ok(Resolved::present(TypeDescriptor::of_value(value)));
        }
        let absence = optional_absence(declaration.get(rules::OPTIONAL))?;
        let rest = declaration.without(&DEFAULT_OR_OPTIONAL_KEYS);
        let base = self.resolve_parts(&rest, position)?.into_descriptor();
        Ok(Resolved { base, absence: Some(absence.descriptor()) })
    }

    fn array_wrapper(&self, declaration: &FieldDeclaration) -> Result<TypeDescriptor, RuleError> {
        for name in ARRAY_KEYS {
            match declaration.get(name) {
                None | Some(Value::Bool(true)) | Some(Value::Object(_)) => {}
                Some(other) => {
                    return Err(RuleError::new(name, format!("expected `true` or an options object, found {}", json_kind(other))));
                }
            }
        }
        let rest = declaration.without(&ARRAY_KEYS);
        let element = self.resolve_at(&rest, Position::Element)?;
        Ok(TypeDescriptor::array_of(element))
    }

    fn builtin(&self, declaration: &FieldDeclaration, kind: RuleKind, widen: bool) -> TypeDescriptor {
        TypeDescriptor::union(
            self.catalog
                .matching(declaration.rule_names(), kind)
                .map(|(_, entry)| {
                    let scalar = entry.output_primitive.descriptor();
                    if widen && entry.output_primitive != OutputPrimitive::EmptyObject {
                        TypeDescriptor::union([scalar.clone(), TypeDescriptor::array_of(scalar)])
                    } else {
                        scalar
                    }
                }),
        )
    }
}

// ------------------------------ Payloads ---------------------------------- //

/// `default: {options: D}` → `Some(D)`; `default: {}` (or absent) → `None`.
fn default_value(payload: Option<&Value>) -> Result<Option<&Value>, RuleError> {
    match payload {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(map.get("options")),
        Some(other) => Err(RuleError::new(
            rules::DEFAULT,
            format!("expected an object with `options`, found {}", json_kind(other)),
        )),
    }
}

fn optional_absence(payload: Option<&Value>) -> Result<Absence, RuleError> {
    let err = |msg: String| RuleError::new(rules::OPTIONAL, msg);
    match payload {
        None | Some(Value::Bool(true)) => Ok(Absence::Undefined),
        Some(Value::Object(map)) => match map.get("options") {
            None => Ok(Absence::Undefined),
            Some(Value::Object(options)) => optional_options(options).map_err(err),
            Some(other) => Err(err(format!("`options` must be an object, found {}", json_kind(other)))),
        },
        Some(other) => Err(err(format!("expected `true` or an object, found {}", json_kind(other)))),
    }
}

// Checked in the order nullable, checkFalsy, values.
fn optional_options(options: &Map<String, Value>) -> Result<Absence, String> {
    for (key, value) in options {
        match (key.as_str(), value) {
            ("nullable" | "checkFalsy", Value::Bool(_)) => {}
            ("values", v) if Absence::from_values_discriminator(v).is_some() => {}
            ("values", v) => {
                return Err(format!("`values` must be \"undefined\", \"null\" or \"falsy\", found {v}"));
            }
            (key @ ("nullable" | "checkFalsy"), v) => {
                return Err(format!("`{key}` must be a boolean, found {}", json_kind(v)));
            }
            (key, _) => return Err(format!("unrecognized option `{key}`")),
        }
    }
    let flag = |name: &str| matches!(options.get(name), Some(Value::Bool(true)));
    if flag("nullable") {
        return Ok(Absence::Nullish);
    }
    if flag("checkFalsy") {
        return Ok(Absence::Falsy);
    }
    Ok(options
        .get("values")
        .and_then(Absence::from_values_discriminator)
        .unwrap_or(Absence::Undefined))
}

/// `isIn: {options: [[a, b, c]]}` → `a | b | c`.
fn enumeration(declaration: &FieldDeclaration) -> Result<TypeDescriptor, RuleError> {
    let err = |msg: &str| RuleError::new(rules::IS_IN, msg);
    let options = match declaration.get(rules::IS_IN) {
        Some(Value::Object(map)) => map.get("options"),
        _ => None,
    };
    let allowed = match options {
        Some(Value::Array(outer)) => match outer.as_slice() {
            [Value::Array(values)] => values,
            _ => return Err(err("`options` must hold exactly one array of allowed values")),
        },
        _ => return Err(err("expected `{options: [[...values]]}`")),
    };
    if allowed.is_empty() {
        return Err(err("the list of allowed values is empty"));
    }
    Ok(TypeDescriptor::union(allowed.iter().map(TypeDescriptor::of_value)))
}

/// Custom rules are opaque; a `returns` hint names their result type.
fn hint(declaration: &FieldDeclaration, rule: &str) -> Result<TypeDescriptor, RuleError> {
    match declaration.get(rule) {
        Some(Value::Object(map)) => match map.get("returns") {
            Some(returns) => TypeDescriptor::from_json(returns)
                .map_err(|msg| RuleError::new(rule, format!("invalid `returns` hint: {msg}"))),
            None => Ok(TypeDescriptor::Unknown),
        },
        _ => Ok(TypeDescriptor::Unknown),
    }
}

// ------------------------------- Tests ------------------------------------ //
