//! Syntax tree for the C#-shaped source subset
//!
//! Nodes live in a flat arena in document order; node 0 is always the
//! compilation unit. Only the constructs the binder needs are represented:
//! directives, namespaces, type declarations and name references. Everything
//! else in a source file is kept as text only.

use std::fmt;
use std::ops::Range;

use slimgen_core::frontend::NodeId;

/// How a name reference is used at its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameContext {
    /// `new Name(...)`
    ObjectCreation,
    /// Listed after `:` in a type declaration
    BaseType,
    /// Type of a field, local, parameter or return value
    Declaration,
    /// Anything else: calls, member access, `typeof`, generic arguments
    Expression,
    /// Inside an attribute list; `[Name]` may mean `NameAttribute`
    Attribute,
}

impl NameContext {
    /// Whether the name must resolve to a type for the source to compile
    pub fn requires_type(&self) -> bool {
        !matches!(self, NameContext::Expression | NameContext::Attribute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKeyword {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
}

impl TypeKeyword {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "class" => Some(TypeKeyword::Class),
            "struct" => Some(TypeKeyword::Struct),
            "interface" => Some(TypeKeyword::Interface),
            "enum" => Some(TypeKeyword::Enum),
            "record" => Some(TypeKeyword::Record),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            TypeKeyword::Class => "class",
            TypeKeyword::Struct => "struct",
            TypeKeyword::Interface => "interface",
            TypeKeyword::Enum => "enum",
            TypeKeyword::Record => "record",
        };
        write!(f, "{}", word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    /// Imported namespace, or the aliased/static target
    pub target: String,
    pub alias: Option<String>,
    pub is_static: bool,
}

impl UsingDirective {
    /// A plain `using N;` that only brings a namespace into scope
    pub fn is_namespace_import(&self) -> bool {
        self.alias.is_none() && !self.is_static
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub keyword: TypeKeyword,
    pub name: String,
    pub modifiers: Vec<String>,
    /// Type parameters of the type and of its generic methods
    pub type_parameters: Vec<String>,
    pub has_static_main: bool,
}

impl TypeDeclaration {
    pub fn is_partial(&self) -> bool {
        self.modifiers.iter().any(|m| m == "partial")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameReference {
    pub segments: Vec<String>,
    pub context: NameContext,
}

impl NameReference {
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxKind {
    CompilationUnit,
    Using(UsingDirective),
    /// Name as written, e.g. `SharpSploit.Execution`
    Namespace(String),
    Type(TypeDeclaration),
    Name(NameReference),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    /// Byte range in the tree text
    pub span: Range<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
}

/// A parsed source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    name: String,
    text: String,
    nodes: Vec<SyntaxNode>,
    errors: Vec<SyntaxError>,
}

impl SyntaxTree {
    pub(crate) fn from_parts(
        name: String,
        text: String,
        nodes: Vec<SyntaxNode>,
        errors: Vec<SyntaxError>,
    ) -> Self {
        Self {
            name,
            text,
            nodes,
            errors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Parents of `id`, innermost first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.node(id).and_then(|n| n.parent),
        }
    }

    pub fn using_directives(&self) -> impl Iterator<Item = (NodeId, &UsingDirective)> {
        self.nodes.iter().enumerate().filter_map(|(i, node)| match &node.kind {
            SyntaxKind::Using(using) => Some((NodeId(i), using)),
            _ => None,
        })
    }

    pub fn type_declarations(&self) -> impl Iterator<Item = (NodeId, &TypeDeclaration)> {
        self.nodes.iter().enumerate().filter_map(|(i, node)| match &node.kind {
            SyntaxKind::Type(decl) => Some((NodeId(i), decl)),
            _ => None,
        })
    }

    /// `name(line,column)`, both 1-based
    pub fn location(&self, offset: usize) -> String {
        let offset = offset.min(self.text.len());
        let before = &self.text.as_bytes()[..offset];
        let line = before.iter().filter(|b| **b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|p| p + 1)
            .unwrap_or(0);
        let column = self.text[line_start..offset].chars().count() + 1;
        format!("{}({},{})", self.name, line, column)
    }
}

pub struct Ancestors<'t> {
    tree: &'t SyntaxTree,
    next: Option<NodeId>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = (NodeId, &'t SyntaxNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.tree.node(id)?;
        self.next = node.parent;
        Some((id, node))
    }
}
