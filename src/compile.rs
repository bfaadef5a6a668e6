//! Front API: schema documents in, one root descriptor (or every error) out.

use std::path::Path;

use serde_json::Value;

use crate::config::CompilerConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{json_kind, CompileErrors, LoadError};
use crate::resolve::Resolver;
use crate::rules::{Catalog, FieldDeclaration};
use crate::tree::TreeBuilder;

/// Ordered `(path, declaration)` entries. The same path may appear twice;
/// its declarations are merged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    entries: Vec<(String, FieldDeclaration)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: `Schema::new().field("a.b", decl)`.
    pub fn field(mut self, path: impl Into<String>, declaration: FieldDeclaration) -> Self {
        self.push(path, declaration);
        self
    }

    pub fn push(&mut self, path: impl Into<String>, declaration: FieldDeclaration) {
        self.entries.push((path.into(), declaration));
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldDeclaration)> {
        self.entries.iter().map(|(p, d)| (p.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A JSON object of path → declaration object; key order is kept.
    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        let Value::Object(map) = value else {
            return Err(LoadError::SchemaNotAnObject { found: json_kind(&value) });
        };
        let mut schema = Schema::new();
        for (path, declaration) in map {
            if !declaration.is_object() {
                return Err(LoadError::DeclarationNotAnObject { found: json_kind(&declaration), path });
            }
            schema.push(path, FieldDeclaration::try_from(declaration)?);
        }
        Ok(schema)
    }

    pub fn from_str(src: &str) -> Result<Self, LoadError> {
        Self::from_value(serde_json::from_str(src)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        Self::from_str(&src)
    }
}

impl<P: Into<String>> FromIterator<(P, FieldDeclaration)> for Schema {
    fn from_iter<I: IntoIterator<Item = (P, FieldDeclaration)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(p, d)| (p.into(), d)).collect() }
    }
}

/// Holds the catalog and policy; compile as many schemas as you like with it,
/// from as many threads as you like.
#[derive(Clone, Debug)]
pub struct Compiler {
    catalog: Catalog,
    widen_nested_validators: bool,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::with_catalog(Catalog::builtin().clone())
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self { catalog, widen_nested_validators: false }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            catalog: config.catalog(),
            widen_nested_validators: config.widen_nested_validators,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.catalog).widen_nested_validators(self.widen_nested_validators)
    }

    /// Build the tree, finalize it, and report every error found on the way.
    pub fn compile(&self, schema: &Schema) -> Result<TypeDescriptor, CompileErrors> {
        let mut builder = TreeBuilder::new(self.resolver());
        for (path, declaration) in schema.entries() {
            builder.insert(path, declaration);
        }
        let (tree, mut errors) = builder.into_parts();
        let root = tree.finalize_into(&mut errors);
        tracing::debug!(entries = schema.len(), errors = errors.len(), "compiled schema");
        match errors.is_empty() {
            true => Ok(root),
            false => Err(CompileErrors(errors)),
        }
    }
}

/// Compile with the builtin catalog and default policy.
pub fn compile(schema: &Schema) -> Result<TypeDescriptor, CompileErrors> {
    Compiler::default().compile(schema)
}
