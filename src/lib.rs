//! Static shape inference for request-validation schemas.
//!
//! A schema is a flat list of dotted paths (`user.name.first`, `tags.*`), each
//! with a declaration of validation/sanitization rules (`isInt`, `trim`,
//! `optional`, …). Compiling it yields the [`TypeDescriptor`] of the data a
//! correctly configured validator would hand back, without running any check.
//!
//! ```
//! use rule_shape::{compile, FieldDeclaration, Schema, TypeDescriptor};
//!
//! let schema = Schema::new()
//!     .field("a.b", FieldDeclaration::new().rule("isString", true))
//!     .field("a.c", FieldDeclaration::new().rule("isInt", true));
//! let root = compile(&schema).unwrap();
//! assert_eq!(root.to_string(), "{ a: { b: string; c: integer } }");
//! ```
//!
//! Pipeline: [`path`] splits keys, [`rules`] classifies each declaration,
//! [`resolve`] turns it into a descriptor, [`tree`] folds everything together
//! and [`merge`] reconciles contributions that meet on one node.
pub mod compile;
pub mod config;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod merge;
pub mod path;
pub mod resolve;
pub mod rules;
pub mod tree;

pub use compile::{compile, Compiler, Schema};
pub use config::CompilerConfig;
pub use descriptor::{Literal, Primitive, TypeDescriptor};
pub use error::{CompileError, CompileErrors, LoadError, RuleError};
pub use merge::{merge, MergeConflict};
pub use resolve::{Position, Resolver};
pub use rules::{classify, Catalog, CatalogEntry, FieldDeclaration, Strategy};
