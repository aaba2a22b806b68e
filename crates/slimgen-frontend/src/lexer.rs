use std::ops::Range;

use logos::Logos;

/// Tokens of the C#-shaped source subset
///
/// Keywords lex as identifiers; the parser decides which identifiers are
/// keywords in context.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Ident(String),

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r#"@"([^"]|"")*""#)]
    Str,

    /// `$"..."`, `$@"..."` or `@$"..."`; holds the spans of the hole expressions
    #[token("$\"", interpolated)]
    #[token("$@\"", interpolated)]
    #[token("@$\"", interpolated)]
    Interpolated(Vec<Range<usize>>),

    #[regex(r"'([^'\\\n]|\\.)+'")]
    Char,

    #[regex(r"[0-9][0-9A-Za-z_]*(\.[0-9][0-9A-Za-z_]*)?")]
    Number,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,

    #[regex(r"==|!=|<=|>=|=>|&&|\|\||\+\+|--|\?\?|::|<<|\+=|-=|\*=|/=|%=|&=|\|=|\^=")]
    #[regex(r"[+\-*/%&|\^!~?$]")]
    Op,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/", logos::skip)]
    BlockComment,

    #[regex(r"#[^\n]*", logos::skip)]
    Preprocessor,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_ident(&self, expected: &str) -> bool {
        self.ident() == Some(expected)
    }
}

/// Consume the rest of an interpolated string after its opening quote
fn interpolated(lex: &mut logos::Lexer<Token>) -> Option<Vec<Range<usize>>> {
    let verbatim = lex.slice().contains('@');
    let base = lex.span().end;
    let bytes = lex.remainder().as_bytes();
    let mut holes = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if !verbatim => i += 2,
            b'"' if verbatim && bytes.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => {
                lex.bump(i + 1);
                return Some(holes);
            }
            b'\n' if !verbatim => return None,
            b'{' if bytes.get(i + 1) == Some(&b'{') => i += 2,
            b'{' => {
                let (expression_end, close) = hole_end(bytes, i + 1)?;
                holes.push(base + i + 1..base + expression_end);
                i = close + 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// End of a hole's expression (before any `,alignment` or `:format`) and
/// the index of its closing `}`
fn hole_end(bytes: &[u8], start: usize) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut expression_end = None;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'}' if depth == 0 => return Some((expression_end.unwrap_or(i), i)),
            b'}' => depth -= 1,
            b':' if bytes.get(i + 1) == Some(&b':') => i += 1,
            b':' | b',' if depth == 0 && expression_end.is_none() => expression_end = Some(i),
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub span: Range<usize>,
}

/// Tokenize `source`, returning tokens and the spans of unrecognized input
///
/// An interpolated string becomes a [`Token::Str`] followed by the tokens of
/// each hole expression, wrapped in parentheses spanning the hole's braces.
pub fn tokenize(source: &str) -> (Vec<TokenSpan>, Vec<Range<usize>>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    tokenize_into(source, 0, &mut tokens, &mut errors);
    (tokens, errors)
}

fn tokenize_into(
    source: &str,
    offset: usize,
    tokens: &mut Vec<TokenSpan>,
    errors: &mut Vec<Range<usize>>,
) {
    let shift = |span: Range<usize>| span.start + offset..span.end + offset;
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(Token::Interpolated(holes)) => {
                tokens.push(TokenSpan {
                    token: Token::Str,
                    span: shift(lexer.span()),
                });
                for hole in holes {
                    tokens.push(TokenSpan {
                        token: Token::LParen,
                        span: shift(hole.start - 1..hole.start),
                    });
                    tokenize_into(&source[hole.clone()], offset + hole.start, tokens, errors);
                    tokens.push(TokenSpan {
                        token: Token::RParen,
                        span: shift(hole.end..hole.end),
                    });
                }
            }
            Ok(token) => tokens.push(TokenSpan {
                token,
                span: shift(lexer.span()),
            }),
            Err(()) => errors.push(shift(lexer.span())),
        }
    }
}
