//! Recursive-descent parser over the token stream
//!
//! The parser recognizes declarations precisely and treats statement and
//! expression bodies as a flat token stream, from which it picks out dotted
//! name chains. Recovery is local: an unexpected token is reported and
//! skipped, so a tree is always produced.

use std::ops::Range;

use slimgen_core::frontend::NodeId;

use crate::lexer::{tokenize, Token, TokenSpan};
use crate::syntax::{
    NameContext, NameReference, SyntaxError, SyntaxKind, SyntaxNode, SyntaxTree, TypeDeclaration,
    TypeKeyword, UsingDirective,
};

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "sealed", "abstract", "partial",
    "readonly", "unsafe", "virtual", "override", "extern", "const", "volatile", "async", "file",
    "required",
];

/// Words that never start a name chain
const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
    // contextual
    "var", "dynamic", "async", "await", "yield", "get", "set", "init", "add", "remove", "value",
    "partial", "where", "when", "nameof", "record", "global", "from", "select", "group", "into",
    "orderby", "join", "let", "on", "equals", "by", "ascending", "descending", "nint", "nuint",
    "managed", "unmanaged", "notnull", "with", "and", "or", "not", "required", "file",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn is_modifier(word: &str) -> bool {
    MODIFIERS.contains(&word)
}

/// Parse `text` into a tree named `name`
pub fn parse(name: &str, text: &str) -> SyntaxTree {
    let (tokens, lex_errors) = tokenize(text);
    let mut parser = Parser::new(text, tokens);
    for span in lex_errors {
        let message = format!("Unexpected character '{}'", &text[span.clone()]);
        parser.error(message, span.start);
    }

    let root = parser.add_node(SyntaxKind::CompilationUnit, 0..text.len(), None);
    parser.parse_members(root, false);

    SyntaxTree::from_parts(name.to_string(), text.to_string(), parser.nodes, parser.errors)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<TokenSpan>,
    pos: usize,
    nodes: Vec<SyntaxNode>,
    errors: Vec<SyntaxError>,
    /// Token index of the `]` closing the last attribute list
    attribute_end: Option<usize>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, tokens: Vec<TokenSpan>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            nodes: Vec::new(),
            errors: Vec::new(),
            attribute_end: None,
        }
    }

    // ---- token access ----

    fn token_at(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index).map(|t| &t.token)
    }

    fn peek(&self, offset: usize) -> Option<&Token> {
        self.token_at(self.pos + offset)
    }

    fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|p| self.token_at(p))
    }

    fn at(&self, token: &Token) -> bool {
        self.peek(0) == Some(token)
    }

    fn at_ident(&self, word: &str) -> bool {
        self.peek(0).is_some_and(|t| t.is_ident(word))
    }

    fn bump(&mut self) -> Option<Range<usize>> {
        let span = self.tokens.get(self.pos)?.span.clone();
        self.pos += 1;
        Some(span)
    }

    fn current_start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start)
            .unwrap_or(self.source.len())
    }

    fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.tokens.get(p))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn error(&mut self, message: impl Into<String>, offset: usize) {
        self.errors.push(SyntaxError {
            message: message.into(),
            offset,
        });
    }

    fn add_node(&mut self, kind: SyntaxKind, span: Range<usize>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SyntaxNode {
            kind,
            span,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    // ---- declarations ----

    /// Members of a compilation unit or namespace, up to `}` when `braced`
    fn parse_members(&mut self, parent: NodeId, braced: bool) {
        let mut modifiers: Vec<String> = Vec::new();
        loop {
            let Some(token) = self.peek(0).cloned() else {
                if braced {
                    self.error("} expected", self.source.len());
                }
                return;
            };
            match token {
                Token::RBrace => {
                    let span = self.bump().unwrap_or_default();
                    if braced {
                        return;
                    }
                    self.error(
                        "Type or namespace definition, or end-of-file expected",
                        span.start,
                    );
                    modifiers.clear();
                }
                Token::LBrace => {
                    self.scan_balanced(parent, &Token::LBrace, &Token::RBrace);
                    modifiers.clear();
                }
                Token::Semi => {
                    self.bump();
                    modifiers.clear();
                }
                Token::Ident(word) => {
                    if self.starts_using() {
                        self.parse_using(parent);
                        modifiers.clear();
                    } else if word == "namespace" {
                        self.parse_namespace(parent);
                        modifiers.clear();
                    } else if let Some(keyword) = self.type_keyword_here() {
                        self.parse_type(parent, keyword, std::mem::take(&mut modifiers));
                    } else if is_modifier(&word) {
                        modifiers.push(word);
                        self.bump();
                    } else {
                        self.scan_token(parent);
                    }
                }
                _ => self.scan_token(parent),
            }
        }
    }

    fn starts_using(&self) -> bool {
        let offset = usize::from(self.at_ident("global"));
        self.peek(offset).is_some_and(|t| t.is_ident("using"))
            && self.peek(offset + 1) != Some(&Token::LParen)
    }

    /// `class Name`, `record struct Name`, ...
    fn type_keyword_here(&self) -> Option<TypeKeyword> {
        let keyword = TypeKeyword::from_keyword(self.peek(0)?.ident()?)?;
        let next = self.peek(1)?.ident()?;
        if keyword == TypeKeyword::Record && (next == "class" || next == "struct") {
            return Some(keyword);
        }
        (!is_keyword(next)).then_some(keyword)
    }

    fn parse_using(&mut self, parent: NodeId) {
        let start = self.current_start();
        if self.at_ident("global") {
            self.bump();
        }
        self.bump();

        let is_static = self.at_ident("static");
        if is_static {
            self.bump();
        }

        let mut target_span = self.current_start()..self.current_start();
        let Some(first) = self.dotted_name() else {
            self.error("Identifier expected", self.current_start());
            self.skip_past_semicolon();
            return;
        };
        target_span.end = self.last_end();
        let (alias, target) = if self.at(&Token::Assign) {
            self.bump();
            target_span = self.current_start()..self.current_start();
            let target = self.dotted_name().unwrap_or_default();
            target_span.end = self.last_end().max(target_span.start);
            if self.at(&Token::Lt) {
                self.scan_balanced(parent, &Token::Lt, &Token::Gt);
            }
            (Some(first), target)
        } else {
            (None, first)
        };

        // Static and alias targets name a type directly
        if (is_static || alias.is_some()) && !target.is_empty() {
            let reference = NameReference {
                segments: target.split('.').map(str::to_string).collect(),
                context: NameContext::Expression,
            };
            self.add_node(SyntaxKind::Name(reference), target_span, Some(parent));
        }

        if self.at(&Token::Semi) {
            self.bump();
        } else {
            self.error("; expected", self.current_start());
        }

        let directive = UsingDirective {
            target,
            alias,
            is_static,
        };
        let end = self.last_end();
        self.add_node(SyntaxKind::Using(directive), start..end, Some(parent));
    }

    fn parse_namespace(&mut self, parent: NodeId) {
        let start = self.current_start();
        self.bump();

        let Some(name) = self.dotted_name() else {
            self.error("Identifier expected", self.current_start());
            return;
        };

        match self.peek(0) {
            Some(Token::LBrace) => {
                self.bump();
                let node = self.add_node(SyntaxKind::Namespace(name), start..start, Some(parent));
                self.parse_members(node, true);
                self.nodes[node.0].span.end = self.last_end();
            }
            Some(Token::Semi) => {
                self.bump();
                let node = self.add_node(SyntaxKind::Namespace(name), start..start, Some(parent));
                self.parse_members(node, false);
                self.nodes[node.0].span.end = self.source.len();
            }
            _ => self.error("{ expected", self.current_start()),
        }
    }

    fn parse_type(&mut self, parent: NodeId, keyword: TypeKeyword, modifiers: Vec<String>) {
        let start = self.current_start();
        self.bump();
        if keyword == TypeKeyword::Record && (self.at_ident("class") || self.at_ident("struct")) {
            self.bump();
        }
        let name = self
            .peek(0)
            .and_then(|t| t.ident())
            .map(str::to_string)
            .unwrap_or_default();
        self.bump();

        let declaration = TypeDeclaration {
            keyword,
            name,
            modifiers,
            type_parameters: Vec::new(),
            has_static_main: false,
        };
        let node = self.add_node(SyntaxKind::Type(declaration), start..self.last_end(), Some(parent));

        if self.at(&Token::Lt) {
            let parameters = self.type_parameter_list();
            self.type_declaration_mut(node).type_parameters.extend(parameters);
        }
        if self.at(&Token::LParen) {
            self.scan_balanced(node, &Token::LParen, &Token::RParen);
        }
        if self.at(&Token::Colon) {
            self.bump();
            self.parse_base_list(node);
        }

        // constraint clauses up to the body
        loop {
            match self.peek(0) {
                Some(Token::LBrace) => break,
                Some(Token::Semi) => {
                    self.bump();
                    self.nodes[node.0].span.end = self.last_end();
                    return;
                }
                Some(Token::RBrace) | None => {
                    self.error("{ expected", self.current_start());
                    return;
                }
                Some(_) => self.scan_token(node),
            }
        }

        self.bump();
        let method_parameters = self.generic_method_parameters();
        self.type_declaration_mut(node)
            .type_parameters
            .extend(method_parameters);
        self.parse_type_body(node);
        self.nodes[node.0].span.end = self.last_end();
    }

    fn type_declaration_mut(&mut self, node: NodeId) -> &mut TypeDeclaration {
        match &mut self.nodes[node.0].kind {
            SyntaxKind::Type(declaration) => declaration,
            _ => unreachable!("node {} is not a type declaration", node.0),
        }
    }

    /// `<T, in U, out V>`
    fn type_parameter_list(&mut self) -> Vec<String> {
        let mut parameters = Vec::new();
        self.bump();
        while let Some(token) = self.peek(0).cloned() {
            self.bump();
            match token {
                Token::Gt => break,
                Token::Ident(word) if word != "in" && word != "out" => parameters.push(word),
                _ => {}
            }
        }
        parameters
    }

    fn parse_base_list(&mut self, node: NodeId) {
        loop {
            match self.peek(0).cloned() {
                Some(Token::Ident(word)) if !is_keyword(&word) => {
                    let start = self.current_start();
                    let segments = self.chain_segments();
                    let reference = NameReference {
                        segments,
                        context: NameContext::BaseType,
                    };
                    let end = self.last_end();
                    self.add_node(SyntaxKind::Name(reference), start..end, Some(node));
                    if self.at(&Token::Lt) {
                        self.scan_balanced(node, &Token::Lt, &Token::Gt);
                    }
                    if self.at(&Token::LParen) {
                        self.scan_balanced(node, &Token::LParen, &Token::RParen);
                    }
                }
                Some(Token::Comma) => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    /// Type parameters of generic methods declared anywhere in the body
    /// that starts at the current position
    fn generic_method_parameters(&self) -> Vec<String> {
        let mut parameters = Vec::new();
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(token) = self.token_at(i) {
            match token {
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Token::Ident(_) if self.token_at(i + 1) == Some(&Token::Lt) => {
                    let mut j = i + 2;
                    let mut names = Vec::new();
                    while let Some(Token::Ident(name)) = self.token_at(j) {
                        names.push(name.clone());
                        match self.token_at(j + 1) {
                            Some(Token::Comma) => j += 2,
                            _ => {
                                j += 1;
                                break;
                            }
                        }
                    }
                    if self.token_at(j) == Some(&Token::Gt)
                        && self.token_at(j + 1) == Some(&Token::LParen)
                    {
                        parameters.extend(names);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        parameters
    }

    /// Members of a type body, up to and including the closing `}`
    fn parse_type_body(&mut self, node: NodeId) {
        let mut depth = 0usize;
        let mut modifiers: Vec<String> = Vec::new();
        loop {
            let Some(token) = self.peek(0).cloned() else {
                self.error("} expected", self.source.len());
                return;
            };
            match token {
                Token::LBrace => {
                    self.bump();
                    depth += 1;
                }
                Token::RBrace => {
                    self.bump();
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        modifiers.clear();
                    }
                }
                Token::Semi => {
                    self.bump();
                    if depth == 0 {
                        modifiers.clear();
                    }
                }
                Token::Ident(word) if depth == 0 => {
                    if let Some(keyword) = self.type_keyword_here() {
                        self.parse_type(node, keyword, std::mem::take(&mut modifiers));
                    } else if is_modifier(&word) {
                        modifiers.push(word);
                        self.bump();
                    } else {
                        if word == "Main"
                            && self.peek(1) == Some(&Token::LParen)
                            && modifiers.iter().any(|m| m == "static")
                        {
                            self.type_declaration_mut(node).has_static_main = true;
                        }
                        self.scan_token(node);
                    }
                }
                _ => self.scan_token(node),
            }
        }
    }

    // ---- bodies ----

    /// Consume one token, recording a name reference if a chain starts here
    fn scan_token(&mut self, parent: NodeId) {
        if self.at(&Token::LBracket) && self.starts_attribute_list() {
            self.parse_attribute_list(parent);
            return;
        }
        let head = match self.peek(0) {
            Some(Token::Ident(word)) => word.clone(),
            _ => {
                self.bump();
                return;
            }
        };
        // member access tails and declarator names
        let declarator = matches!(self.previous(), Some(Token::Ident(prev)) if !is_keyword(prev));
        if is_keyword(&head) || declarator || self.previous() == Some(&Token::Dot) {
            self.bump();
            return;
        }

        let creation = self.previous().is_some_and(|t| t.is_ident("new"));
        let start = self.current_start();
        let segments = self.chain_segments();
        let end = self.last_end();

        let context = if creation {
            NameContext::ObjectCreation
        } else {
            let after = self.skip_type_suffix(self.pos);
            match self.token_at(after) {
                Some(Token::Ident(next)) if !is_keyword(next) => NameContext::Declaration,
                _ => NameContext::Expression,
            }
        };

        let reference = NameReference { segments, context };
        self.add_node(SyntaxKind::Name(reference), start..end, Some(parent));
    }

    /// A `[` opens an attribute list where a declaration may start, or
    /// right after another attribute list
    fn starts_attribute_list(&self) -> bool {
        match self.previous() {
            None
            | Some(Token::Semi | Token::LBrace | Token::RBrace | Token::LParen | Token::Comma) => true,
            Some(Token::RBracket) => self.attribute_end == self.pos.checked_sub(1),
            _ => false,
        }
    }

    /// `[target: Name(args), Other]`
    fn parse_attribute_list(&mut self, parent: NodeId) {
        self.bump();
        if self.peek(1) == Some(&Token::Colon) && self.peek(0).is_some_and(|t| t.ident().is_some()) {
            self.bump();
            self.bump();
        }
        loop {
            match self.peek(0).cloned() {
                Some(Token::RBracket) => {
                    self.bump();
                    self.attribute_end = self.pos.checked_sub(1);
                    return;
                }
                Some(Token::Ident(word)) if !is_keyword(&word) => {
                    let start = self.current_start();
                    let segments = self.chain_segments();
                    let reference = NameReference {
                        segments,
                        context: NameContext::Attribute,
                    };
                    let end = self.last_end();
                    self.add_node(SyntaxKind::Name(reference), start..end, Some(parent));
                    if self.at(&Token::LParen) {
                        self.scan_balanced(parent, &Token::LParen, &Token::RParen);
                    }
                }
                Some(Token::Comma) => {
                    self.bump();
                }
                Some(_) => self.scan_token(parent),
                None => {
                    self.error("] expected", self.source.len());
                    return;
                }
            }
        }
    }

    /// `Ident (. Ident)*` at the current position
    fn chain_segments(&mut self) -> Vec<String> {
        let mut segments = Vec::new();
        if let Some(Token::Ident(word)) = self.peek(0).cloned() {
            segments.push(word);
            self.bump();
        }
        while self.at(&Token::Dot) {
            match self.peek(1).cloned() {
                Some(Token::Ident(word)) if !is_keyword(&word) => {
                    segments.push(word);
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }
        segments
    }

    /// Dotted name text for directives and namespaces; keywords allowed
    fn dotted_name(&mut self) -> Option<String> {
        let mut name = self.peek(0)?.ident()?.to_string();
        self.bump();
        while self.at(&Token::Dot) {
            let Some(word) = self.peek(1).and_then(|t| t.ident()).map(str::to_string) else {
                break;
            };
            name.push('.');
            name.push_str(&word);
            self.bump();
            self.bump();
        }
        Some(name)
    }

    /// Index past generic arguments and array ranks following a type name
    fn skip_type_suffix(&self, start: usize) -> usize {
        let mut i = start;
        if self.token_at(i) == Some(&Token::Lt) {
            let mut depth = 0usize;
            loop {
                match self.token_at(i) {
                    Some(Token::Lt) => depth += 1,
                    Some(Token::Gt) => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    Some(Token::Ident(_) | Token::Dot | Token::Comma) => {}
                    Some(Token::LBracket | Token::RBracket) => {}
                    _ => return start,
                }
                i += 1;
            }
        }
        while self.token_at(i) == Some(&Token::LBracket) {
            let mut j = i + 1;
            while self.token_at(j) == Some(&Token::Comma) {
                j += 1;
            }
            if self.token_at(j) != Some(&Token::RBracket) {
                break;
            }
            i = j + 1;
        }
        i
    }

    /// Scan a balanced `open ... close` group, recording references inside
    fn scan_balanced(&mut self, parent: NodeId, open: &Token, close: &Token) {
        let mut depth = 0usize;
        while let Some(token) = self.peek(0) {
            if token == open {
                depth += 1;
                self.bump();
            } else if token == close {
                self.bump();
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            } else {
                self.scan_token(parent);
            }
        }
        self.error(format!("{:?} expected", close), self.source.len());
    }

    fn skip_past_semicolon(&mut self) {
        while let Some(token) = self.peek(0) {
            let done = *token == Token::Semi;
            self.bump();
            if done {
                break;
            }
        }
    }
}
