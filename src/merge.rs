//! Descriptor merge (⊔) for contributions that land on the same tree node.
//!
//! Laws on non-conflicting inputs: associative, commutative, idempotent.
//! `Unknown` is the identity; empty-object is the identity for objects.
//! Unions only merge with unions. Anything that would require picking a side
//! is a [`MergeConflict`].

use std::collections::BTreeMap;

use crate::descriptor::{Primitive, TypeDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot merge {left} with {right}")]
pub struct MergeConflict {
    /// Location below the merge root: field names, `*` for array elements.
    pub trail: Vec<String>,
    pub left: TypeDescriptor,
    pub right: TypeDescriptor,
}

impl MergeConflict {
    fn new(left: &TypeDescriptor, right: &TypeDescriptor) -> Self {
        Self { trail: Vec::new(), left: left.clone(), right: right.clone() }
    }

    fn within(mut self, segment: &str) -> Self {
        self.trail.insert(0, segment.to_string());
        self
    }

    /// `base` extended with the trail, dot separated.
    pub fn location(&self, base: &str) -> String {
        std::iter::once(base)
            .chain(self.trail.iter().map(String::as_str))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }
}

pub fn merge(a: &TypeDescriptor, b: &TypeDescriptor) -> Result<TypeDescriptor, MergeConflict> {
    use TypeDescriptor as D;

    match (a, b) {
        (D::Unknown, x) | (x, D::Unknown) => Ok(x.clone()),

        (D::Primitive(Primitive::EmptyObject), x @ D::ObjectOf(_))
        | (x @ D::ObjectOf(_), D::Primitive(Primitive::EmptyObject)) => Ok(x.clone()),

        (D::ObjectOf(l), D::ObjectOf(r)) => merge_fields(l, r).map(D::ObjectOf),

        (D::ArrayOf(l), D::ArrayOf(r)) => merge(l, r)
            .map(D::array_of)
            .map_err(|c| c.within(crate::path::WILDCARD)),

        (D::Primitive(l), D::Primitive(r)) if l == r => Ok(a.clone()),

        (D::UnionOf(l), D::UnionOf(r)) => Ok(D::union(l.iter().chain(r).cloned())),

        // a union against a non-union conflicts, even against its own member
        _ => Err(MergeConflict::new(a, b)),
    }
}

fn merge_fields(
    l: &BTreeMap<String, TypeDescriptor>,
    r: &BTreeMap<String, TypeDescriptor>,
) -> Result<BTreeMap<String, TypeDescriptor>, MergeConflict> {
    let mut out = l.clone();
    for (k, rv) in r {
        let merged = match out.get(k) {
            Some(lv) => merge(lv, rv).map_err(|c| c.within(k))?,
            None => rv.clone(),
        };
        out.insert(k.clone(), merged);
    }
    Ok(out)
}

/// Fold a sequence left to right; an empty sequence is `Unknown`.
pub fn merge_all<'a, I>(descriptors: I) -> Result<TypeDescriptor, MergeConflict>
where
    I: IntoIterator<Item = &'a TypeDescriptor>,
{
    descriptors
        .into_iter()
        .try_fold(TypeDescriptor::Unknown, |acc, d| merge(&acc, d))
}

// ------------------------------- Tests ------------------------------------ //
