//! The language frontend seam
//!
//! Parsing and semantic binding are not implemented here. A [`Frontend`]
//! supplies syntax trees, compilations and symbol queries; everything in this
//! crate is written against that trait only.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::request::{OutputKind, Platform, TargetVersion};
use crate::symbol::{Symbol, TypeSymbol};

/// Index of a tree inside the compilation it was bound into
///
/// Trees are numbered in the order they were passed to [`Frontend::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeId(pub usize);

/// Tree-local syntax node handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Where a symbol is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxLocation {
    pub tree: TreeId,
    pub node: NodeId,
}

/// An import (using) directive of a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    pub node: NodeId,
    /// Namespace the directive brings into scope, as written
    pub namespace: String,
}

/// Options shared by both compilation passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationOptions {
    pub assembly_name: String,
    pub output_kind: OutputKind,
    pub platform: Platform,
    pub target: TargetVersion,
}

/// A binary reference handed to the binder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataReference {
    pub path: PathBuf,
}

/// A resource embedded into the emitted artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestResource {
    pub name: String,
    pub path: PathBuf,
    pub public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single frontend diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    /// `file(line,column)` when the diagnostic has a source position
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{} {}: {}", self.severity, self.code, self.message)
    }
}

/// Diagnostics in the order the frontend reported them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self(diagnostics)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.0 {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

/// Parsing, binding, symbol queries and emission for one source language
///
/// Symbols coming out of the query methods are already normalized to
/// [`TypeSymbol`]s, so results from different compilations can be compared.
/// Query faults are reported through [`Frontend::Error`] and are never
/// retried by the driver.
pub trait Frontend {
    type Tree: Clone;
    type Compilation;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parse source text; syntax errors travel inside the tree
    fn parse(&self, name: &str, text: &str) -> Self::Tree;

    /// The source text a tree was parsed from (or rewritten to)
    fn tree_text<'t>(&self, tree: &'t Self::Tree) -> &'t str;

    /// Bind trees and references into a compilation
    ///
    /// Fails only when no semantic model can be produced at all; semantic
    /// errors in otherwise bindable sources are reported by [`Frontend::emit`].
    fn bind(
        &self,
        trees: Vec<Self::Tree>,
        references: &[MetadataReference],
        options: &CompilationOptions,
    ) -> Result<Self::Compilation, Diagnostics>;

    /// Every descendant node of a bound tree, in document order
    fn nodes(&self, compilation: &Self::Compilation, tree: TreeId)
        -> Result<Vec<NodeId>, Self::Error>;

    /// The symbol referenced at a node, if any
    fn resolve_symbol_at(
        &self,
        compilation: &Self::Compilation,
        tree: TreeId,
        node: NodeId,
    ) -> Result<Option<Symbol>, Self::Error>;

    /// The type declared by a type-declaration node; `None` for other nodes
    fn declared_symbol_of(
        &self,
        compilation: &Self::Compilation,
        tree: TreeId,
        node: NodeId,
    ) -> Result<Option<TypeSymbol>, Self::Error>;

    /// Declarations of a symbol inside the compilation's trees
    ///
    /// Empty for types supplied by references rather than source.
    fn declaring_locations_of(
        &self,
        compilation: &Self::Compilation,
        symbol: &TypeSymbol,
    ) -> Result<Vec<SyntaxLocation>, Self::Error>;

    fn import_directives(&self, tree: &Self::Tree) -> Vec<ImportDirective>;

    /// A copy of `tree` without the given nodes and their trivia
    fn remove_nodes(&self, tree: &Self::Tree, nodes: &[NodeId]) -> Self::Tree;

    /// Emit the compilation with the given resources attached
    fn emit(
        &self,
        compilation: &Self::Compilation,
        resources: &[ManifestResource],
    ) -> Result<Vec<u8>, Diagnostics>;
}
