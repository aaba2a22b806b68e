//! A line-oriented fake frontend for exercising the pruning algorithm
//!
//! Each non-empty line of a source is one node:
//!
//! ```text
//! decl Lib.Helper          declares a type
//! use Lib.Inner            names a type
//! call Lib.Inner.Run       calls a member of a type
//! import Lib               import directive
//! local x                  resolves to a local
//! literal 42               resolves to nothing
//! syntax-error             makes bind fail
//! fault                    makes every query on the tree fail
//! ```
//!
//! Emission fails for any `use`/`call` of a type that is neither declared in
//! the compilation nor under `System.`.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use slimgen_core::frontend::{
    CompilationOptions, Diagnostic, Diagnostics, Frontend, ImportDirective, ManifestResource,
    MetadataReference, NodeId, SyntaxLocation, TreeId,
};
use slimgen_core::symbol::{Symbol, TypeSymbol};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Decl(String),
    Use(String),
    Call(String),
    Import(String),
    Local(String),
    Literal,
    SyntaxError,
    Fault,
}

#[derive(Debug, Clone)]
pub struct FakeTree {
    pub name: String,
    pub text: String,
    pub lines: Vec<Line>,
}

pub struct FakeCompilation {
    pub trees: Vec<FakeTree>,
    declarations: HashMap<String, Vec<SyntaxLocation>>,
}

#[derive(Debug, thiserror::Error)]
#[error("fake frontend fault in tree {0}")]
pub struct FakeError(pub usize);

/// Counts `nodes()` calls per tree name
#[derive(Default)]
pub struct FakeFrontend {
    pub node_queries: RefCell<BTreeMap<String, usize>>,
}

impl FakeFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queries_for(&self, name: &str) -> usize {
        self.node_queries.borrow().get(name).copied().unwrap_or(0)
    }

    fn tree<'c>(&self, compilation: &'c FakeCompilation, tree: TreeId) -> Result<&'c FakeTree, FakeError> {
        let t = compilation.trees.get(tree.0).ok_or(FakeError(tree.0))?;
        if t.lines.contains(&Line::Fault) {
            return Err(FakeError(tree.0));
        }
        Ok(t)
    }
}

fn parse_line(line: &str) -> Option<Line> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim().to_string();
    Some(match head {
        "decl" => Line::Decl(rest),
        "use" => Line::Use(rest),
        "call" => Line::Call(rest),
        "import" => Line::Import(rest),
        "local" => Line::Local(rest),
        "syntax-error" => Line::SyntaxError,
        "fault" => Line::Fault,
        _ => Line::Literal,
    })
}

fn member_symbol(path: &str) -> Symbol {
    match path.rsplit_once('.') {
        Some((ty, member)) => Symbol::Member {
            containing_type: TypeSymbol::parse(ty).expect("valid type"),
            name: member.to_string(),
        },
        None => Symbol::Local(path.to_string()),
    }
}

impl Frontend for FakeFrontend {
    type Tree = FakeTree;
    type Compilation = FakeCompilation;
    type Error = FakeError;

    fn parse(&self, name: &str, text: &str) -> FakeTree {
        FakeTree {
            name: name.to_string(),
            text: text.to_string(),
            lines: text.lines().filter_map(parse_line).collect(),
        }
    }

    fn tree_text<'t>(&self, tree: &'t FakeTree) -> &'t str {
        &tree.text
    }

    fn bind(
        &self,
        trees: Vec<FakeTree>,
        _references: &[MetadataReference],
        _options: &CompilationOptions,
    ) -> Result<FakeCompilation, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let mut declarations: HashMap<String, Vec<SyntaxLocation>> = HashMap::new();
        for (t, tree) in trees.iter().enumerate() {
            for (n, line) in tree.lines.iter().enumerate() {
                match line {
                    Line::Decl(name) => declarations.entry(name.clone()).or_default().push(SyntaxLocation {
                        tree: TreeId(t),
                        node: NodeId(n),
                    }),
                    Line::SyntaxError => diagnostics.push(
                        Diagnostic::error("FK1001", "Syntax error").at(tree.name.clone()),
                    ),
                    _ => {}
                }
            }
        }
        if diagnostics.has_errors() {
            return Err(diagnostics);
        }
        Ok(FakeCompilation { trees, declarations })
    }

    fn nodes(&self, compilation: &FakeCompilation, tree: TreeId) -> Result<Vec<NodeId>, FakeError> {
        let t = self.tree(compilation, tree)?;
        *self
            .node_queries
            .borrow_mut()
            .entry(t.name.clone())
            .or_default() += 1;
        Ok((0..t.lines.len()).map(NodeId).collect())
    }

    fn resolve_symbol_at(
        &self,
        compilation: &FakeCompilation,
        tree: TreeId,
        node: NodeId,
    ) -> Result<Option<Symbol>, FakeError> {
        let t = self.tree(compilation, tree)?;
        Ok(match t.lines.get(node.0) {
            Some(Line::Use(name)) => TypeSymbol::parse(name).ok().map(Symbol::Type),
            Some(Line::Call(path)) => Some(member_symbol(path)),
            Some(Line::Import(ns)) => Some(Symbol::Namespace(ns.clone())),
            Some(Line::Local(name)) => Some(Symbol::Local(name.clone())),
            _ => None,
        })
    }

    fn declared_symbol_of(
        &self,
        compilation: &FakeCompilation,
        tree: TreeId,
        node: NodeId,
    ) -> Result<Option<TypeSymbol>, FakeError> {
        let t = self.tree(compilation, tree)?;
        Ok(match t.lines.get(node.0) {
            Some(Line::Decl(name)) => TypeSymbol::parse(name).ok(),
            _ => None,
        })
    }

    fn declaring_locations_of(
        &self,
        compilation: &FakeCompilation,
        symbol: &TypeSymbol,
    ) -> Result<Vec<SyntaxLocation>, FakeError> {
        Ok(compilation
            .declarations
            .get(symbol.qualified_name())
            .cloned()
            .unwrap_or_default())
    }

    fn import_directives(&self, tree: &FakeTree) -> Vec<ImportDirective> {
        tree.lines
            .iter()
            .enumerate()
            .filter_map(|(n, line)| match line {
                Line::Import(ns) => Some(ImportDirective {
                    node: NodeId(n),
                    namespace: ns.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    fn remove_nodes(&self, tree: &FakeTree, nodes: &[NodeId]) -> FakeTree {
        let text: String = tree
            .text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .filter(|(n, _)| !nodes.contains(&NodeId(*n)))
            .map(|(_, l)| format!("{}\n", l))
            .collect();
        self.parse(&tree.name, &text)
    }

    fn emit(
        &self,
        compilation: &FakeCompilation,
        _resources: &[ManifestResource],
    ) -> Result<Vec<u8>, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        for tree in &compilation.trees {
            for line in &tree.lines {
                let ty = match line {
                    Line::Use(name) => name.clone(),
                    Line::Call(path) => match path.rsplit_once('.') {
                        Some((ty, _)) => ty.to_string(),
                        None => continue,
                    },
                    _ => continue,
                };
                if !ty.starts_with("System.") && !compilation.declarations.contains_key(&ty) {
                    diagnostics.push(
                        Diagnostic::error("FK0246", format!("Undefined type '{}'", ty))
                            .at(tree.name.clone()),
                    );
                }
            }
        }
        if diagnostics.has_errors() {
            return Err(diagnostics);
        }
        let names: Vec<&str> = compilation.trees.iter().map(|t| t.name.as_str()).collect();
        Ok(names.join("\n").into_bytes())
    }
}

/// Shorthand for building `(path, text)` corpora
pub fn files(entries: &[(&str, &str)]) -> Vec<(std::path::PathBuf, String)> {
    entries
        .iter()
        .map(|(path, text)| (std::path::PathBuf::from(path), text.to_string()))
        .collect()
}
