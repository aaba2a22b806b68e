//! Reference frontend for slimgen
//!
//! Parses, binds and emits a C#-shaped source subset: using directives,
//! block and file-scoped namespaces, type declarations with nested types,
//! and dotted name references inside member bodies. It is precise about
//! declarations and deliberately shallow about statements, which is all the
//! reachability analysis needs.
//!
//! ```
//! use slimgen_core::frontend::{CompilationOptions, Frontend};
//! use slimgen_frontend::LiteFrontend;
//!
//! let frontend = LiteFrontend::new();
//! let tree = frontend.parse("Lib.cs", "namespace Lib { class Helper { } }");
//! let compilation = frontend
//!     .bind(vec![tree], &[], &CompilationOptions::default())
//!     .unwrap();
//! assert_eq!(compilation.declared_types().count(), 1);
//! ```

pub mod binder;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod rewrite;
pub mod syntax;

pub use binder::LiteCompilation;
pub use emit::{Artifact, ArtifactManifest};
pub use error::FrontendError;
pub use syntax::SyntaxTree;

use slimgen_core::frontend::{
    CompilationOptions, Diagnostics, Frontend, ImportDirective, ManifestResource,
    MetadataReference, NodeId, SyntaxLocation, TreeId,
};
use slimgen_core::symbol::{Symbol, TypeSymbol};

#[derive(Debug, Clone, Copy, Default)]
pub struct LiteFrontend;

impl LiteFrontend {
    pub fn new() -> Self {
        Self
    }
}

impl Frontend for LiteFrontend {
    type Tree = SyntaxTree;
    type Compilation = LiteCompilation;
    type Error = FrontendError;

    fn parse(&self, name: &str, text: &str) -> SyntaxTree {
        parser::parse(name, text)
    }

    fn tree_text<'t>(&self, tree: &'t SyntaxTree) -> &'t str {
        tree.text()
    }

    fn bind(
        &self,
        trees: Vec<SyntaxTree>,
        references: &[MetadataReference],
        options: &CompilationOptions,
    ) -> Result<LiteCompilation, Diagnostics> {
        LiteCompilation::bind(trees, references, options)
    }

    fn nodes(&self, compilation: &LiteCompilation, tree: TreeId) -> Result<Vec<NodeId>, FrontendError> {
        compilation.node_ids(tree)
    }

    fn resolve_symbol_at(
        &self,
        compilation: &LiteCompilation,
        tree: TreeId,
        node: NodeId,
    ) -> Result<Option<Symbol>, FrontendError> {
        compilation.resolve(tree, node)
    }

    fn declared_symbol_of(
        &self,
        compilation: &LiteCompilation,
        tree: TreeId,
        node: NodeId,
    ) -> Result<Option<TypeSymbol>, FrontendError> {
        compilation.declared_symbol(tree, node)
    }

    fn declaring_locations_of(
        &self,
        compilation: &LiteCompilation,
        symbol: &TypeSymbol,
    ) -> Result<Vec<SyntaxLocation>, FrontendError> {
        Ok(compilation.declaring_locations(symbol))
    }

    /// Plain namespace imports only; static and alias directives are kept
    fn import_directives(&self, tree: &SyntaxTree) -> Vec<ImportDirective> {
        tree.using_directives()
            .filter(|(_, using)| using.is_namespace_import())
            .map(|(node, using)| ImportDirective {
                node,
                namespace: using.target.clone(),
            })
            .collect()
    }

    fn remove_nodes(&self, tree: &SyntaxTree, nodes: &[NodeId]) -> SyntaxTree {
        rewrite::remove_nodes(tree, nodes)
    }

    fn emit(
        &self,
        compilation: &LiteCompilation,
        resources: &[ManifestResource],
    ) -> Result<Vec<u8>, Diagnostics> {
        emit::emit(compilation, resources)
    }
}
