//! Declaration table and name resolution
//!
//! A [`LiteCompilation`] owns its trees. Binding builds a table of every type
//! declared in source (keyed by qualified name, so partial declarations
//! collect several locations) and the set of type names supplied by
//! references. Name references are resolved lazily against the scope chain
//! of the node that contains them.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;

use slimgen_core::corpus::ENTRY_NAME;
use slimgen_core::frontend::{
    CompilationOptions, Diagnostic, Diagnostics, MetadataReference, NodeId, SyntaxLocation, TreeId,
};
use slimgen_core::symbol::{Symbol, TypeSymbol};
use tracing::{debug, trace};

use crate::error::{FrontendError, Result};
use crate::syntax::{NameContext, SyntaxKind, SyntaxTree};

/// One declaration site of a source type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration {
    pub location: SyntaxLocation,
    pub partial: bool,
    pub has_static_main: bool,
}

#[derive(Debug, Clone)]
pub struct DeclaredType {
    pub symbol: TypeSymbol,
    pub declarations: Vec<Declaration>,
}

/// Names visible at one node
#[derive(Debug, Default)]
struct Scope<'c> {
    /// Enclosing namespace segments, outermost first
    namespace: Vec<&'c str>,
    /// Enclosing types, innermost first
    enclosing_types: Vec<TypeSymbol>,
    type_parameters: HashSet<&'c str>,
    /// Imported namespaces, innermost scope first
    imports: Vec<&'c str>,
    aliases: HashMap<&'c str, &'c str>,
}

pub struct LiteCompilation {
    trees: Vec<SyntaxTree>,
    options: CompilationOptions,
    declared: BTreeMap<String, DeclaredType>,
    external: HashMap<String, TypeSymbol>,
    namespaces: HashSet<String>,
}

impl LiteCompilation {
    /// Bind trees and references
    ///
    /// Fails on syntax errors in the entry tree and on unreadable
    /// references. Syntax errors in corpus trees are reported by emission, so
    /// a broken file that pruning discards never fails a build.
    pub fn bind(
        trees: Vec<SyntaxTree>,
        references: &[MetadataReference],
        options: &CompilationOptions,
    ) -> std::result::Result<Self, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        for tree in trees.iter().filter(|t| t.name() == ENTRY_NAME) {
            syntax_diagnostics(tree, &mut diagnostics);
        }
        let external = load_reference_types(references, &mut diagnostics);
        if diagnostics.has_errors() {
            return Err(diagnostics);
        }

        let mut declared: BTreeMap<String, DeclaredType> = BTreeMap::new();
        for (t, tree) in trees.iter().enumerate() {
            for (node, declaration) in tree.type_declarations() {
                let Some(symbol) = declared_symbol(tree, node) else {
                    continue;
                };
                let site = Declaration {
                    location: SyntaxLocation {
                        tree: TreeId(t),
                        node,
                    },
                    partial: declaration.is_partial(),
                    has_static_main: declaration.has_static_main,
                };
                declared
                    .entry(symbol.qualified_name().to_string())
                    .or_insert_with(|| DeclaredType {
                        symbol,
                        declarations: Vec::new(),
                    })
                    .declarations
                    .push(site);
            }
        }

        let mut namespaces = HashSet::new();
        let all_types = declared
            .values()
            .map(|d| &d.symbol)
            .chain(external.values());
        for symbol in all_types {
            let mut namespace = symbol.containing_namespace();
            while !namespace.is_empty() {
                namespaces.insert(namespace.to_string());
                namespace = namespace.rsplit_once('.').map(|(n, _)| n).unwrap_or("");
            }
        }

        debug!(
            trees = trees.len(),
            source_types = declared.len(),
            reference_types = external.len(),
            "Bound compilation"
        );

        Ok(Self {
            trees,
            options: options.clone(),
            declared,
            external,
            namespaces,
        })
    }

    pub fn trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    pub fn tree(&self, id: TreeId) -> Result<&SyntaxTree> {
        self.trees.get(id.0).ok_or(FrontendError::UnknownTree(id))
    }

    pub fn node_ids(&self, id: TreeId) -> Result<Vec<NodeId>> {
        let tree = self.tree(id)?;
        // the compilation unit itself is not a descendant
        Ok((1..tree.len()).map(NodeId).collect())
    }

    /// Source-declared types in qualified-name order
    pub fn declared_types(&self) -> impl Iterator<Item = &DeclaredType> {
        self.declared.values()
    }

    pub fn is_reference_type(&self, qualified: &str) -> bool {
        self.external.contains_key(qualified)
    }

    pub fn declaring_locations(&self, symbol: &TypeSymbol) -> Vec<SyntaxLocation> {
        self.declared
            .get(symbol.qualified_name())
            .map(|d| d.declarations.iter().map(|site| site.location).collect())
            .unwrap_or_default()
    }

    pub fn declared_symbol(&self, tree: TreeId, node: NodeId) -> Result<Option<TypeSymbol>> {
        let syntax = self.tree(tree)?;
        if syntax.node(node).is_none() {
            return Err(FrontendError::UnknownNode { tree, node });
        }
        Ok(declared_symbol(syntax, node))
    }

    /// Resolve the name reference at `node`
    ///
    /// The shortest prefix of the chain that names a type wins; further
    /// segments extend into nested types, and the first segment that is not
    /// a nested type is a member of the type found so far.
    pub fn resolve(&self, tree: TreeId, node: NodeId) -> Result<Option<Symbol>> {
        let syntax = self.tree(tree)?;
        let Some(syntax_node) = syntax.node(node) else {
            return Err(FrontendError::UnknownNode { tree, node });
        };
        let SyntaxKind::Name(reference) = &syntax_node.kind else {
            return Ok(None);
        };
        let scope = scope_of(syntax, node);
        let symbol = match reference.context {
            NameContext::Attribute => self.resolve_attribute(&reference.segments, &scope),
            _ => self.resolve_in(&reference.segments, &scope),
        };
        trace!(name = %reference.dotted(), ?symbol, "Resolved name");
        Ok(symbol)
    }

    /// `[Name]` binds to `NameAttribute` when that type exists, else to `Name`
    fn resolve_attribute(&self, segments: &[String], scope: &Scope<'_>) -> Option<Symbol> {
        if let Some((last, rest)) = segments.split_last() {
            if !last.ends_with("Attribute") {
                let mut suffixed = rest.to_vec();
                suffixed.push(format!("{}Attribute", last));
                if let Some(symbol @ Symbol::Type(_)) = self.resolve_in(&suffixed, scope) {
                    return Some(symbol);
                }
            }
        }
        self.resolve_in(segments, scope)
    }

    fn resolve_in(&self, segments: &[String], scope: &Scope<'_>) -> Option<Symbol> {
        if segments.len() == 1 && scope.type_parameters.contains(segments[0].as_str()) {
            return Some(Symbol::Local(segments[0].clone()));
        }

        for prefix in 1..=segments.len() {
            let Some(mut ty) = self.lookup(&segments[..prefix], scope) else {
                continue;
            };
            let mut consumed = prefix;
            while consumed < segments.len() {
                let nested = format!("{}.{}", ty.qualified_name(), segments[consumed]);
                match self.type_named(&nested) {
                    Some(inner) => {
                        ty = inner;
                        consumed += 1;
                    }
                    None => break,
                }
            }
            return Some(if consumed == segments.len() {
                Symbol::Type(ty)
            } else {
                Symbol::Member {
                    containing_type: ty,
                    name: segments[consumed].clone(),
                }
            });
        }

        let dotted = segments.join(".");
        self.namespaces
            .contains(&dotted)
            .then_some(Symbol::Namespace(dotted))
    }

    fn lookup(&self, parts: &[String], scope: &Scope<'_>) -> Option<TypeSymbol> {
        let name = parts.join(".");

        for outer in &scope.enclosing_types {
            if let Some(ty) = self.type_named(&format!("{}.{}", outer.qualified_name(), name)) {
                return Some(ty);
            }
        }

        if let Some(target) = scope.aliases.get(parts[0].as_str()) {
            let rest = parts[1..].join(".");
            let qualified = if rest.is_empty() {
                target.to_string()
            } else {
                format!("{}.{}", target, rest)
            };
            if let Some(ty) = self.type_named(&qualified) {
                return Some(ty);
            }
        }

        for depth in (0..=scope.namespace.len()).rev() {
            let qualified = qualify(&scope.namespace[..depth].join("."), &name);
            if let Some(ty) = self.type_named(&qualified) {
                return Some(ty);
            }
        }

        scope
            .imports
            .iter()
            .find_map(|import| self.type_named(&qualify(import, &name)))
    }

    fn type_named(&self, qualified: &str) -> Option<TypeSymbol> {
        self.declared
            .get(qualified)
            .map(|d| d.symbol.clone())
            .or_else(|| self.external.get(qualified).cloned())
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// SG1001 for every syntax error of `tree`
pub(crate) fn syntax_diagnostics(tree: &SyntaxTree, diagnostics: &mut Diagnostics) {
    for error in tree.errors() {
        diagnostics.push(
            Diagnostic::error("SG1001", error.message.clone()).at(tree.location(error.offset)),
        );
    }
}

/// Symbol declared by a type-declaration node
pub(crate) fn declared_symbol(tree: &SyntaxTree, node: NodeId) -> Option<TypeSymbol> {
    let SyntaxKind::Type(declaration) = &tree.node(node)?.kind else {
        return None;
    };
    let mut types = vec![declaration.name.as_str()];
    let mut namespaces = Vec::new();
    for (_, ancestor) in tree.ancestors(node) {
        match &ancestor.kind {
            SyntaxKind::Type(outer) => types.push(outer.name.as_str()),
            SyntaxKind::Namespace(name) => namespaces.push(name.as_str()),
            _ => {}
        }
    }
    types.reverse();
    namespaces.reverse();
    Some(TypeSymbol::new(namespaces.join("."), types.join(".")))
}

fn scope_of(tree: &SyntaxTree, node: NodeId) -> Scope<'_> {
    let mut scope = Scope::default();
    for (id, ancestor) in tree.ancestors(node) {
        match &ancestor.kind {
            SyntaxKind::Type(declaration) => {
                if let Some(symbol) = declared_symbol(tree, id) {
                    scope.enclosing_types.push(symbol);
                }
                scope
                    .type_parameters
                    .extend(declaration.type_parameters.iter().map(String::as_str));
            }
            SyntaxKind::Namespace(_) | SyntaxKind::CompilationUnit => {
                if let SyntaxKind::Namespace(name) = &ancestor.kind {
                    scope.namespace.extend(name.split('.').rev());
                }
                for child in &ancestor.children {
                    let Some(SyntaxKind::Using(using)) = tree.node(*child).map(|n| &n.kind) else {
                        continue;
                    };
                    match &using.alias {
                        Some(alias) => {
                            scope.aliases.entry(alias.as_str()).or_insert(using.target.as_str());
                        }
                        None if !using.is_static => scope.imports.push(using.target.as_str()),
                        None => {}
                    }
                }
            }
            _ => {}
        }
    }
    scope.namespace.reverse();
    scope
}

/// Type names listed by text references
///
/// A reference that is not UTF-8 text (a real binary assembly) contributes
/// no names. One that cannot be read at all is a binding error.
fn load_reference_types(
    references: &[MetadataReference],
    diagnostics: &mut Diagnostics,
) -> HashMap<String, TypeSymbol> {
    let mut types = HashMap::new();
    for reference in references {
        let bytes = match fs::read(&reference.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                diagnostics.push(Diagnostic::error(
                    "SG0006",
                    format!("Metadata file '{}' could not be found", reference.path.display()),
                ));
                continue;
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "SG0009",
                    format!(
                        "Metadata file '{}' could not be opened -- {}",
                        reference.path.display(),
                        e
                    ),
                ));
                continue;
            }
        };
        let Ok(text) = String::from_utf8(bytes) else {
            debug!(path = %reference.path.display(), "Binary reference lists no type names");
            continue;
        };
        let mut listed = 0usize;
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if let Ok(symbol) = TypeSymbol::parse(line) {
                listed += 1;
                types.insert(symbol.qualified_name().to_string(), symbol);
            }
        }
        trace!(path = %reference.path.display(), types = listed, "Loaded reference");
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::io::Write;

    fn bind(sources: &[(&str, &str)]) -> LiteCompilation {
        let trees = sources.iter().map(|(n, t)| parse(n, t)).collect();
        LiteCompilation::bind(trees, &[], &CompilationOptions::default()).unwrap()
    }

    fn first_name(compilation: &LiteCompilation, tree: usize, dotted: &str) -> NodeId {
        let syntax = &compilation.trees()[tree];
        let index = syntax
            .nodes()
            .iter()
            .position(|n| matches!(&n.kind, SyntaxKind::Name(r) if r.dotted() == dotted))
            .unwrap_or_else(|| panic!("no reference {}", dotted));
        NodeId(index)
    }

    fn resolve(compilation: &LiteCompilation, tree: usize, dotted: &str) -> Option<Symbol> {
        let node = first_name(compilation, tree, dotted);
        compilation.resolve(TreeId(tree), node).unwrap()
    }

    fn ty(q: &str) -> Symbol {
        Symbol::Type(TypeSymbol::parse(q).unwrap())
    }

    #[test]
    fn test_declared_symbols_are_qualified() {
        let c = bind(&[("A.cs", "namespace Lib { namespace Exec { class Outer { class Inner { } } } }")]);
        let names: Vec<&str> = c.declared_types().map(|d| d.symbol.qualified_name()).collect();
        assert_eq!(names, vec!["Lib.Exec.Outer", "Lib.Exec.Outer.Inner"]);
        let inner = c.declared_types().nth(1).unwrap();
        assert_eq!(inner.symbol.containing_namespace(), "Lib.Exec");
        assert_eq!(inner.symbol.name(), "Outer.Inner");
    }

    #[test]
    fn test_partial_declarations_collect_locations() {
        let c = bind(&[
            ("A.cs", "namespace Lib { partial class Api { } }"),
            ("B.cs", "namespace Lib { partial class Api { } }"),
        ]);
        let locations = c.declaring_locations(&TypeSymbol::new("Lib", "Api"));
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[1].tree, TreeId(1));
    }

    #[test]
    fn test_resolution_through_imports_and_namespaces() {
        let c = bind(&[
            ("Lib.cs", "namespace Lib { class Helper { } }"),
            ("Entry.cs", "using Lib; class E { void M() { Helper.Run(); Lib.Helper h; } }"),
            ("Same.cs", "namespace Lib.Sub { class User { Helper h; } }"),
        ]);
        assert_eq!(
            resolve(&c, 1, "Helper.Run"),
            Some(Symbol::Member {
                containing_type: TypeSymbol::new("Lib", "Helper"),
                name: "Run".into()
            })
        );
        assert_eq!(resolve(&c, 1, "Lib.Helper"), Some(ty("Lib.Helper")));
        assert_eq!(resolve(&c, 2, "Helper"), Some(ty("Lib.Helper")));
    }

    #[test]
    fn test_nested_type_chains() {
        let c = bind(&[
            ("Lib.cs", "namespace Lib { class Win32 { public class Kernel32 { } } }"),
            ("Entry.cs", "using Lib; class E { void M() { Win32.Kernel32.OpenProcess(); } }"),
        ]);
        assert_eq!(
            resolve(&c, 1, "Win32.Kernel32.OpenProcess"),
            Some(Symbol::Member {
                containing_type: TypeSymbol::new("Lib", "Win32.Kernel32"),
                name: "OpenProcess".into()
            })
        );
    }

    #[test]
    fn test_enclosing_type_members_resolve_first() {
        let c = bind(&[(
            "A.cs",
            "namespace Lib { class Outer { class Inner { } Inner field; } class Inner { } }",
        )]);
        assert_eq!(resolve(&c, 0, "Inner"), Some(ty("Lib.Outer.Inner")));
    }

    #[test]
    fn test_aliases_resolve() {
        let c = bind(&[
            ("Lib.cs", "namespace Lib.Deep { class Thing { } }"),
            ("Entry.cs", "using D = Lib.Deep; class E { D.Thing t; }"),
        ]);
        assert_eq!(resolve(&c, 1, "D.Thing"), Some(ty("Lib.Deep.Thing")));
    }

    #[test]
    fn test_type_parameters_and_unknowns() {
        let c = bind(&[("A.cs", "class Box<T> { T item; Missing other; }")]);
        assert_eq!(resolve(&c, 0, "T"), Some(Symbol::Local("T".into())));
        assert_eq!(resolve(&c, 0, "Missing"), None);
    }

    #[test]
    fn test_namespace_references() {
        let c = bind(&[
            ("Lib.cs", "namespace Lib.Exec { class Shell { } }"),
            ("Entry.cs", "class E { void M() { var n = nameof(Lib.Exec); } }"),
        ]);
        assert_eq!(resolve(&c, 1, "Lib.Exec"), Some(Symbol::Namespace("Lib.Exec".into())));
    }

    #[test]
    fn test_text_reference_supplies_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mscorlib.txt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "# core types\nSystem.Text.StringBuilder\n\nSystem.Console").unwrap();

        let trees = vec![parse("E.cs", "using System.Text; class E { StringBuilder sb; }")];
        let references = [MetadataReference { path }];
        let c = LiteCompilation::bind(trees, &references, &CompilationOptions::default()).unwrap();
        assert!(c.is_reference_type("System.Console"));
        assert_eq!(resolve(&c, 0, "StringBuilder"), Some(ty("System.Text.StringBuilder")));
        assert!(c.declaring_locations(&TypeSymbol::parse("System.Console").unwrap()).is_empty());
    }

    #[test]
    fn test_binary_reference_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("System.dll");
        fs::write(&path, [0x4d, 0x5a, 0x90, 0x00, 0xff, 0xfe]).unwrap();
        let references = [MetadataReference { path }];
        let c = LiteCompilation::bind(vec![], &references, &CompilationOptions::default()).unwrap();
        assert_eq!(c.declared_types().count(), 0);
    }

    #[test]
    fn test_missing_reference_fails_binding() {
        let references = [MetadataReference {
            path: "/nonexistent/System.dll".into(),
        }];
        let err = LiteCompilation::bind(vec![], &references, &CompilationOptions::default())
            .err()
            .unwrap();
        assert_eq!(err.0[0].code, "SG0006");
    }

    #[test]
    fn test_entry_syntax_errors_fail_binding() {
        let trees = vec![parse("Good.cs", "class B { }"), parse(ENTRY_NAME, "class A {")];
        let err = LiteCompilation::bind(trees, &[], &CompilationOptions::default())
            .err()
            .unwrap();
        assert_eq!(err.len(), 1);
        assert_eq!(err.0[0].code, "SG1001");
        assert!(err.0[0].location.as_deref().unwrap().starts_with("<entry>("));
    }

    #[test]
    fn test_corpus_syntax_errors_bind() {
        let c = bind(&[
            ("Bad.cs", "/*** banner ***/\nnamespace Lib { class Dead { string s = @$\"x{1}\"; } } }"),
            ("Use.cs", "namespace Lib { class Good : Dead { } }"),
        ]);
        assert!(!c.trees()[0].errors().is_empty());
        assert_eq!(resolve(&c, 1, "Dead"), Some(ty("Lib.Dead")));
    }

    #[test]
    fn test_attribute_names_take_the_suffix() {
        let c = bind(&[
            ("Attrs.cs", "namespace Lib { class MarkerAttribute { } class Plain { } }"),
            ("Use.cs", "using Lib;\n[Marker]\n[Plain]\nclass A { }"),
        ]);
        assert_eq!(resolve(&c, 1, "Marker"), Some(ty("Lib.MarkerAttribute")));
        assert_eq!(resolve(&c, 1, "Plain"), Some(ty("Lib.Plain")));
    }

    #[test]
    fn test_unknown_tree_is_an_error() {
        let c = bind(&[]);
        assert!(matches!(
            c.resolve(TreeId(3), NodeId(0)),
            Err(FrontendError::UnknownTree(TreeId(3)))
        ));
    }
}
