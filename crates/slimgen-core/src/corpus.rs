//! Source units of a build: the library corpus plus the entry snippet
//!
//! Corpus units are bound first, in corpus order, and the entry unit last.
//! That fixes the [`TreeId`] of every unit for the lifetime of one
//! compilation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::frontend::{Frontend, TreeId};
use crate::symbol::TypeSymbol;

/// A library source file and its syntax tree
#[derive(Debug, Clone)]
pub struct SourceUnit<T> {
    pub path: PathBuf,
    pub tree: T,
    /// Reachable types this unit was found to declare
    pub declared: BTreeSet<TypeSymbol>,
}

impl<T> SourceUnit<T> {
    pub fn new(path: impl Into<PathBuf>, tree: T) -> Self {
        Self {
            path: path.into(),
            tree,
            declared: BTreeSet::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The caller's snippet; part of every compilation
#[derive(Debug, Clone)]
pub struct EntryUnit<T> {
    pub tree: T,
}

/// Synthetic file name the entry snippet is parsed under
pub const ENTRY_NAME: &str = "<entry>";

/// The ordered set of library units of one build
#[derive(Debug, Clone)]
pub struct Corpus<T> {
    units: Vec<SourceUnit<T>>,
}

impl<T: Clone> Corpus<T> {
    pub fn new(units: Vec<SourceUnit<T>>) -> Self {
        Self { units }
    }

    /// Parse `(path, text)` pairs with the given frontend
    pub fn parse<F>(frontend: &F, files: Vec<(PathBuf, String)>) -> Self
    where
        F: Frontend<Tree = T>,
    {
        let units = files
            .into_iter()
            .map(|(path, text)| {
                let tree = frontend.parse(&path.display().to_string(), &text);
                SourceUnit::new(path, tree)
            })
            .collect();
        Self { units }
    }

    pub fn units(&self) -> &[SourceUnit<T>] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [SourceUnit<T>] {
        &mut self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Tree id the entry unit receives when bound after this corpus
    pub fn entry_tree_id(&self) -> TreeId {
        TreeId(self.units.len())
    }

    /// Corpus index for a tree id, `None` for the entry tree
    pub fn unit_index(&self, tree: TreeId) -> Option<usize> {
        (tree.0 < self.units.len()).then_some(tree.0)
    }

    /// Trees in bind order: corpus first, entry last
    pub fn compilation_trees(&self, entry: &EntryUnit<T>) -> Vec<T> {
        let mut trees: Vec<T> = self.units.iter().map(|u| u.tree.clone()).collect();
        trees.push(entry.tree.clone());
        trees
    }

    /// Keep only the units whose index satisfies `keep`, preserving order
    pub fn retain_indices(&self, keep: impl Fn(usize) -> bool) -> Self {
        let units = self
            .units
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(_, u)| u.clone())
            .collect();
        Self { units }
    }
}
