//! Token types for the Python line lexer

use logos::{Lexer, Logos};

/// The kind of token produced by the lexer
///
/// Only the distinctions needed to find logical-line boundaries are kept:
/// strings and comments (which may contain brackets and newlines), bracket
/// nesting, and line breaks. Everything else is copied through verbatim.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\f]+")]
pub enum TokenKind {
    /// `"""..."""` or `'''...'''`, with an optional prefix such as `r` or `b`
    #[regex(r#"[rRbBuUfF]{0,2}""""#, |lex| close_triple(lex, "\"\"\""))]
    #[regex(r"[rRbBuUfF]{0,2}'''", |lex| close_triple(lex, "'''"))]
    TripleString,

    /// Single-line string literal
    #[regex(r#"[rRbBuUfF]{0,2}"([^"\\\n]|\\.)*""#)]
    #[regex(r"[rRbBuUfF]{0,2}'([^'\\\n]|\\.)*'")]
    String,

    #[regex(r"#[^\r\n]*")]
    Comment,

    #[token("(")]
    #[token("[")]
    #[token("{")]
    Open,

    #[token(")")]
    #[token("]")]
    #[token("}")]
    Close,

    /// Backslash line continuation
    #[regex(r"\\\r?\n")]
    Continuation,

    #[regex(r"\r?\n")]
    Newline,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", priority = 3)]
    #[regex(r"[\p{XID_Start}][\p{XID_Continue}]*", priority = 2)]
    Name,

    #[regex(r"[0-9][0-9a-zA-Z_.]*")]
    Number,

    /// Operators and any other punctuation, one character at a time
    #[regex(r#"[^\sa-zA-Z0-9_#'"()\[\]{}\\]"#, priority = 1)]
    Punct,
}

/// Consume up to and including the closing triple quote
///
/// An unterminated string swallows the rest of the input, which is what the
/// Python tokenizer reports as an error; here the remainder is simply not
/// documented.
fn close_triple(lex: &mut Lexer<TokenKind>, quote: &str) -> bool {
    let rest = lex.remainder();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if rest[i..].starts_with(quote) {
            lex.bump(i + quote.len());
            return true;
        }
    }
    lex.bump(rest.len());
    true
}

impl TokenKind {
    /// Returns true for string literal tokens
    pub const fn is_string(self) -> bool {
        matches!(self, Self::String | Self::TripleString)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        TokenKind::lexer(source).filter_map(Result::ok).collect()
    }

    #[test]
    fn lex_triple_string_spans_lines() {
        let source = "\"\"\"doc\nwith ( bracket\n\"\"\"\nx";
        assert_eq!(
            kinds(source),
            vec![TokenKind::TripleString, TokenKind::Newline, TokenKind::Name]
        );
    }

    #[test]
    fn lex_prefixed_strings() {
        assert_eq!(kinds(r#"r"a\d" b'x'"#), vec![TokenKind::String, TokenKind::String]);
        assert_eq!(kinds("r'''raw'''"), vec![TokenKind::TripleString]);
    }

    #[test]
    fn lex_empty_string_is_not_triple() {
        assert_eq!(
            kinds("x = \"\""),
            vec![TokenKind::Name, TokenKind::Punct, TokenKind::String]
        );
    }

    #[test]
    fn lex_comment_and_brackets() {
        assert_eq!(
            kinds("f(a) # call (x"),
            vec![
                TokenKind::Name,
                TokenKind::Open,
                TokenKind::Name,
                TokenKind::Close,
                TokenKind::Comment
            ]
        );
    }
}
