//! Build-time scaffold: flat `(path, declaration)` entries folded into a tree,
//! then finalized bottom-up into one immutable [`TypeDescriptor`].
//!
//! A node can hold inline declarations (the path ended here) and a shape (deeper
//! paths went through it). The shape is object-like for key segments and
//! array-like for `*`; one node cannot be both. Inline declarations and shape are
//! only reconciled in [`SchemaTree::finalize`], through [`crate::merge`].

use indexmap::IndexMap;

use crate::descriptor::TypeDescriptor;
use crate::error::{CompileError, CompileErrors};
use crate::merge::{merge, MergeConflict};
use crate::path::{self, PathSegments, Segment};
use crate::resolve::{Position, Resolved, Resolver};
use crate::rules::FieldDeclaration;

// ------------------------------- State ------------------------------------ //

#[derive(Clone, Debug, Default)]
pub struct SchemaTree {
    fields: IndexMap<String, TreeNode>,
}

#[derive(Clone, Debug, Default)]
pub struct TreeNode {
    leaves: Vec<Leaf>,
    /// Union of the absence representations of optional/default leaves.
    fallback: Option<TypeDescriptor>,
    shape: Option<Shape>,
}

#[derive(Clone, Debug)]
pub struct Leaf {
    pub source: String,
    pub declaration: FieldDeclaration,
    pub resolved: Resolved,
}

#[derive(Clone, Debug)]
enum Shape {
    /// `origin` is the first input path that went through this node.
    Object { origin: String, fields: IndexMap<String, TreeNode> },
    Array { origin: String, element: Box<TreeNode> },
}

impl Shape {
    fn origin(&self) -> &str {
        match self {
            Shape::Object { origin, .. } | Shape::Array { origin, .. } => origin,
        }
    }

    fn placeholder(&self) -> TypeDescriptor {
        match self {
            Shape::Object { .. } => TypeDescriptor::object_of(std::iter::empty::<(String, _)>()),
            Shape::Array { .. } => TypeDescriptor::array_of(TypeDescriptor::Unknown),
        }
    }
}

// ------------------------------- Build ------------------------------------ //

/// Incremental builder; keeps going after a bad entry so one pass reports
/// every independent error.
pub struct TreeBuilder<'a> {
    resolver: Resolver<'a>,
    tree: SchemaTree,
    errors: Vec<CompileError>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self { resolver, tree: SchemaTree::default(), errors: Vec::new() }
    }

    pub fn insert(&mut self, path: &str, declaration: &FieldDeclaration) {
        if let Err(e) = self.try_insert(path, declaration) {
            tracing::debug!(path, error = %e, "rejected schema entry");
            self.errors.push(e);
        }
    }

    fn try_insert(&mut self, path: &str, declaration: &FieldDeclaration) -> Result<(), CompileError> {
        let segments = path::parse(path)?;
        let position = match segments.last() {
            Some(Segment::WildcardArray) => Position::Element,
            _ if segments.len() == 1 => Position::Field,
            _ => Position::NestedField,
        };
        let resolved = self
            .resolver
            .resolve_parts(declaration, position)
            .map_err(|source| CompileError::Configuration { path: path.to_string(), source })?;

        let node = self.tree.walk(&segments, path)?;
        if let Some(absent) = &resolved.absence {
            node.fallback = Some(match node.fallback.take() {
                None => absent.clone(),
                Some(prev) => TypeDescriptor::union([prev, absent.clone()]),
            });
        }
        node.leaves.push(Leaf {
            source: path.to_string(),
            declaration: declaration.clone(),
            resolved,
        });
        Ok(())
    }

    pub fn into_parts(self) -> (SchemaTree, Vec<CompileError>) {
        (self.tree, self.errors)
    }

    pub fn finish(self) -> Result<SchemaTree, CompileErrors> {
        match self.errors.is_empty() {
            true => Ok(self.tree),
            false => Err(CompileErrors(self.errors)),
        }
    }
}

/// Fold all entries into a tree.
pub fn build<'e, I, P>(entries: I, resolver: Resolver<'_>) -> Result<SchemaTree, CompileErrors>
where
    I: IntoIterator<Item = (P, &'e FieldDeclaration)>,
    P: AsRef<str>,
{
    let mut builder = TreeBuilder::new(resolver);
    for (path, declaration) in entries {
        builder.insert(path.as_ref(), declaration);
    }
    builder.finish()
}

impl SchemaTree {
    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn walk(&mut self, segments: &PathSegments, path: &str) -> Result<&mut TreeNode, CompileError> {
        let (first, rest) = match segments.segments().split_first() {
            Some((Segment::Key(name), rest)) => (name, rest),
            _ => return Err(CompileError::malformed(path, "a path must start with a field name")),
        };
        let mut node = self.fields.entry(first.clone()).or_default();
        for (i, segment) in rest.iter().enumerate() {
            node = node.descend(segment, path, || segments.prefix(i + 1))?;
        }
        Ok(node)
    }
}

impl TreeNode {
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn fallback(&self) -> Option<&TypeDescriptor> {
        self.fallback.as_ref()
    }

    pub fn is_array_shaped(&self) -> bool {
        matches!(self.shape, Some(Shape::Array { .. }))
    }

    pub fn is_object_shaped(&self) -> bool {
        matches!(self.shape, Some(Shape::Object { .. }))
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        match &self.shape {
            Some(Shape::Object { fields, .. }) => fields.get(name),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&TreeNode> {
        match &self.shape {
            Some(Shape::Array { element, .. }) => Some(&**element),
            _ => None,
        }
    }

    fn descend(
        &mut self,
        segment: &Segment,
        path: &str,
        at: impl FnOnce() -> String,
    ) -> Result<&mut TreeNode, CompileError> {
        let shape = self.shape.get_or_insert_with(|| match segment {
            Segment::Key(_) => Shape::Object { origin: path.to_string(), fields: IndexMap::new() },
            Segment::WildcardArray => Shape::Array { origin: path.to_string(), element: Box::default() },
        });
        match (shape, segment) {
            (Shape::Object { fields, .. }, Segment::Key(name)) => Ok(fields.entry(name.clone()).or_default()),
            (Shape::Array { element, .. }, Segment::WildcardArray) => Ok(element.as_mut()),
            (existing, _) => {
                let wanted = match segment {
                    Segment::Key(name) => TypeDescriptor::object_of([(name.clone(), TypeDescriptor::Unknown)]),
                    Segment::WildcardArray => TypeDescriptor::array_of(TypeDescriptor::Unknown),
                };
                Err(CompileError::ShapeConflict {
                    at: at(),
                    left_source: existing.origin().to_string(),
                    left: existing.placeholder(),
                    right_source: path.to_string(),
                    right: wanted,
                })
            }
        }
    }
}

// ------------------------------ Finalize ---------------------------------- //

impl SchemaTree {
    /// Bottom-up: array nodes become `ArrayOf`, object nodes `ObjectOf`, leaves
    /// pass through; the root is always `ObjectOf`.
    pub fn finalize(&self) -> Result<TypeDescriptor, CompileErrors> {
        let mut errors = Vec::new();
        let root = finalize_fields(&self.fields, "", &mut errors);
        match errors.is_empty() {
            true => Ok(root),
            false => Err(CompileErrors(errors)),
        }
    }

    /// Like [`SchemaTree::finalize`], but conflicts are appended to `errors`
    /// and the best-effort root is always returned.
    pub fn finalize_into(&self, errors: &mut Vec<CompileError>) -> TypeDescriptor {
        finalize_fields(&self.fields, "", errors)
    }
}

fn finalize_fields(fields: &IndexMap<String, TreeNode>, at: &str, errors: &mut Vec<CompileError>) -> TypeDescriptor {
    TypeDescriptor::object_of(fields.iter().map(|(name, node)| {
        let here = if at.is_empty() { name.clone() } else { format!("{at}.{name}") };
        (name.clone(), node.finalize(&here, errors))
    }))
}

/// Running merge of contributions, remembering who contributed first.
struct Accumulator<'s> {
    source: Option<&'s str>,
    value: TypeDescriptor,
}

impl<'s> Accumulator<'s> {
    fn new() -> Self {
        Self { source: None, value: TypeDescriptor::Unknown }
    }

    fn add(&mut self, source: &'s str, contribution: TypeDescriptor, at: &str, errors: &mut Vec<CompileError>) {
        match merge(&self.value, &contribution) {
            Ok(merged) => {
                self.value = merged;
                self.source.get_or_insert(source);
            }
            Err(conflict) => errors.push(conflict_error(conflict, at, self.source.unwrap_or(source), source)),
        }
    }
}

fn conflict_error(conflict: MergeConflict, at: &str, left_source: &str, right_source: &str) -> CompileError {
    CompileError::ShapeConflict {
        at: conflict.location(at),
        left_source: left_source.to_string(),
        left: conflict.left,
        right_source: right_source.to_string(),
        right: conflict.right,
    }
}

impl TreeNode {
    /// Inline leaves contribute their base, deeper paths their shape; the
    /// union of the leaves' absence representations is added back last.
    fn finalize(&self, at: &str, errors: &mut Vec<CompileError>) -> TypeDescriptor {
        let mut acc = Accumulator::new();
        for leaf in &self.leaves {
            let base = match self.shape {
                Some(Shape::Array { .. }) => narrow_to_array(&leaf.resolved.base),
                _ => leaf.resolved.base.clone(),
            };
            acc.add(&leaf.source, base, at, errors);
        }
        if let Some(shape) = &self.shape {
            let shaped = match shape {
                Shape::Object { fields, .. } => finalize_fields(fields, at, errors),
                Shape::Array { element, .. } => {
                    TypeDescriptor::array_of(element.finalize(&format!("{at}.{}", path::WILDCARD), errors))
                }
            };
            acc.add(shape.origin(), shaped, at, errors);
        }
        let out = match &self.fallback {
            Some(absent) => TypeDescriptor::union([acc.value, absent.clone()]),
            None => acc.value,
        };
        tracing::trace!(at, kind = out.kind_name(), "finalized node");
        out
    }
}

/// On a node that `*` paths go through, a widened validator result
/// (`T | T[]`) keeps only its array members.
fn narrow_to_array(base: &TypeDescriptor) -> TypeDescriptor {
    match base {
        TypeDescriptor::UnionOf(members) if members.iter().any(|m| m.element().is_some()) => {
            TypeDescriptor::union(members.iter().filter(|m| m.element().is_some()).cloned())
        }
        other => other.clone(),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    type D = TypeDescriptor;

    fn entries(v: Value) -> Vec<(String, FieldDeclaration)> {
        v.as_object()
            .unwrap()
            .iter()
            .map(|(k, d)| (k.clone(), FieldDeclaration::try_from(d.clone()).unwrap()))
            .collect()
    }

    fn compile(v: Value) -> Result<D, CompileErrors> {
        let es = entries(v);
        build(es.iter().map(|(p, d)| (p, d)), Resolver::default())?.finalize()
    }

    #[test]
    fn wildcard_marks_node_as_array() {
        let es = entries(json!({"items.*": {"isString": true}, "tags.*.name": {"trim": true}}));
        let tree = build(es.iter().map(|(p, d)| (p, d)), Resolver::default()).unwrap();
        let items = tree.get("items").unwrap();
        assert!(items.is_array_shaped());
        assert_eq!(items.element().unwrap().leaves().len(), 1);
        let tags = tree.get("tags").unwrap();
        assert!(tags.element().unwrap().is_object_shaped());
        assert!(tags.element().unwrap().child("name").is_some());
    }

    #[test]
    fn fallback_recorded_for_optional_leaves() {
        let es = entries(json!({"a": {"isObject": true, "optional": {"options": {"nullable": true}}}}));
        let tree = build(es.iter().map(|(p, d)| (p, d)), Resolver::default()).unwrap();
        assert_eq!(tree.get("a").unwrap().fallback(), Some(&D::union([D::null(), D::undefined()])));
    }

    #[test]
    fn wildcard_node_is_array_regardless_of_order() {
        let forward = compile(json!({"list": {"isArray": true}, "list.*.id": {"isInt": true}})).unwrap();
        let backward = compile(json!({"list.*.id": {"isInt": true}, "list": {"isArray": true}})).unwrap();
        let expected = D::object_of([("list", D::array_of(D::object_of([("id", D::integer())])))]);
        assert_eq!(forward, expected);
        assert_eq!(backward, expected);
    }

    #[test]
    fn inline_object_rule_merges_with_children() {
        let d = compile(json!({"obj": {"isObject": true}, "obj.a": {"isString": true}})).unwrap();
        assert_eq!(d, D::object_of([("obj", D::object_of([("a", D::string())]))]));
    }

    #[test]
    fn optional_object_keeps_absence() {
        let d = compile(json!({"obj": {"isObject": true, "optional": true}, "obj.a": {"isString": true}})).unwrap();
        assert_eq!(
            d.field("obj").unwrap(),
            &D::union([D::object_of([("a", D::string())]), D::undefined()])
        );
    }

    #[test]
    fn scalar_vs_children_conflict_names_both_paths() {
        let errs = compile(json!({"x": {"isString": true}, "x.y": {"isInt": true}})).unwrap_err();
        assert_eq!(errs.len(), 1);
        match &errs.0[0] {
            CompileError::ShapeConflict { at, left_source, right_source, right, .. } => {
                assert_eq!(at, "x");
                assert_eq!(left_source, "x");
                assert_eq!(right_source, "x.y");
                assert_eq!(right, &D::object_of([("y", D::integer())]));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn object_vs_array_node_conflict() {
        let errs = compile(json!({"a.b": {"trim": true}, "a.*": {"trim": true}})).unwrap_err();
        match &errs.0[0] {
            CompileError::ShapeConflict { at, left_source, right_source, .. } => {
                assert_eq!(at, "a");
                assert_eq!(left_source, "a.b");
                assert_eq!(right_source, "a.*");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn collects_every_independent_error() {
        let errs = compile(json!({
            "": {"isInt": true},
            "ok": {"isInt": true},
            "bad": {"toInt": true, "optional": false},
            "x": {"toInt": true},
            "x.y": {"trim": true},
            "*.z": {"trim": true},
        }))
        .unwrap_err();
        let kinds: Vec<_> = errs
            .iter()
            .map(|e| match e {
                CompileError::MalformedPath { .. } => "malformed",
                CompileError::Configuration { .. } => "config",
                CompileError::ShapeConflict { .. } => "conflict",
            })
            .collect();
        assert_eq!(kinds, vec!["malformed", "config", "malformed"]);

        // build errors do not hide finalize conflicts
        let es = entries(json!({"bad": {"optional": 0}, "x": {"toInt": true}, "x.y": {"trim": true}}));
        let mut builder = TreeBuilder::new(Resolver::default());
        for (p, d) in &es {
            builder.insert(p, d);
        }
        let (tree, mut errors) = builder.into_parts();
        tree.finalize_into(&mut errors);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn validator_on_wildcard_node_stays_an_array() {
        let d = compile(json!({"items": {"isString": true}, "items.*": {"isString": true}})).unwrap();
        assert_eq!(d, D::object_of([("items", D::array_of(D::string()))]));

        let reversed = compile(json!({"items.*": {"isString": true}, "items": {"isString": true}})).unwrap();
        assert_eq!(reversed, d);

        let errs = compile(json!({"ids": {"isString": true}, "ids.*": {"isInt": true}})).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.0[0].path(), "ids");
    }

    #[test]
    fn repeated_optional_paths_do_not_depend_on_order() {
        let forward = vec![
            ("x".to_string(), FieldDeclaration::new().rule("toInt", true)),
            ("x".to_string(), FieldDeclaration::new().rule("toInt", true).rule("optional", true)),
            ("x".to_string(), FieldDeclaration::new().rule("toInt", true).rule("optional", json!({"options": {"nullable": true}}))),
        ];
        let backward: Vec<_> = forward.iter().rev().cloned().collect();
        let run = |es: &Vec<(String, FieldDeclaration)>| {
            build(es.iter().map(|(p, d)| (p, d)), Resolver::default()).unwrap().finalize()
        };
        let expected = D::object_of([("x", D::union([D::integer(), D::null(), D::undefined()]))]);
        assert_eq!(run(&forward).unwrap(), expected);
        assert_eq!(run(&backward).unwrap(), expected);

        let clash = vec![
            ("x".to_string(), FieldDeclaration::new().rule("toInt", true)),
            ("x".to_string(), FieldDeclaration::new().rule("trim", true).rule("optional", true)),
            ("x".to_string(), FieldDeclaration::new().rule("toInt", true).rule("optional", json!({"options": {"nullable": true}}))),
        ];
        let clash_backward: Vec<_> = clash.iter().rev().cloned().collect();
        assert!(run(&clash).is_err());
        assert!(run(&clash_backward).is_err());
    }

    #[test]
    fn repeated_paths_merge() {
        let d = compile(json!({"a.b": {"trim": true}})).unwrap();
        let es = vec![
            ("a.b".to_string(), FieldDeclaration::new().rule("trim", true)),
            ("a.b".to_string(), FieldDeclaration::new().rule("escape", true)),
        ];
        let twice = build(es.iter().map(|(p, d)| (p, d)), Resolver::default()).unwrap().finalize().unwrap();
        assert_eq!(twice, d);
    }
}
