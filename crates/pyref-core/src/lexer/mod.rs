//! Logical-line lexer for Python source
//!
//! Python statements can span several physical lines: inside brackets, after
//! a backslash, or inside a triple-quoted string. The extractor works on
//! logical lines, so this module tokenizes the source with logos and glues
//! physical lines back together, recording for each logical line:
//! - its indentation (tabs expand to multiples of eight)
//! - the 1-indexed line it starts on
//! - a trailing `#` comment, if any

mod token;

pub use token::TokenKind;

use logos::Logos;

/// One logical line of Python source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// Indentation column of the first token
    pub indent: usize,
    /// 1-indexed starting line
    pub line: usize,
    /// Statement text with continuation newlines folded into spaces.
    /// Empty for comment-only lines.
    pub text: String,
    /// Comment text without the leading `#`
    pub comment: Option<String>,
    /// True when the whole statement is a single string literal
    pub is_string: bool,
}

/// Maps byte offsets to line numbers
#[derive(Debug, Clone)]
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// (1-indexed line, byte offset of the line start)
    fn locate(&self, offset: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        (line + 1, self.line_starts[line])
    }
}

struct LineBuilder {
    indent: usize,
    line: usize,
    text: String,
    comment: Option<String>,
    tokens: usize,
    only_strings: bool,
    last_end: usize,
}

impl LineBuilder {
    fn finish(self) -> Option<LogicalLine> {
        if self.text.is_empty() {
            return None;
        }
        Some(LogicalLine {
            indent: self.indent,
            line: self.line,
            text: self.text,
            comment: self.comment,
            is_string: self.only_strings && self.tokens > 0,
        })
    }
}

fn indent_width(prefix: &str) -> usize {
    prefix.chars().fold(0, |col, c| match c {
        '\t' => (col / 8 + 1) * 8,
        _ => col + 1,
    })
}

/// Split source into logical lines
pub fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let index = LineIndex::new(source);
    let mut lexer = TokenKind::lexer(source);
    let mut lines = Vec::new();
    let mut current: Option<LineBuilder> = None;
    let mut depth = 0usize;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let Ok(kind) = result else {
            continue;
        };

        match kind {
            TokenKind::Newline => {
                if depth == 0 {
                    if let Some(line) = current.take().and_then(LineBuilder::finish) {
                        lines.push(line);
                    }
                }
            }
            TokenKind::Continuation => {}
            TokenKind::Comment => {
                let text = slice.trim_start_matches('#').trim().to_string();
                match current.as_mut() {
                    Some(builder) => {
                        if builder.comment.is_none() {
                            builder.comment = Some(text);
                        }
                    }
                    None => {
                        let (line, line_start) = index.locate(span.start);
                        lines.push(LogicalLine {
                            indent: indent_width(&source[line_start..span.start]),
                            line,
                            text: String::new(),
                            comment: Some(text),
                            is_string: false,
                        });
                    }
                }
            }
            _ => {
                match kind {
                    TokenKind::Open => depth += 1,
                    TokenKind::Close => depth = depth.saturating_sub(1),
                    _ => {}
                }

                let builder = current.get_or_insert_with(|| {
                    let (line, line_start) = index.locate(span.start);
                    LineBuilder {
                        indent: indent_width(&source[line_start..span.start]),
                        line,
                        text: String::new(),
                        comment: None,
                        tokens: 0,
                        only_strings: true,
                        last_end: span.start,
                    }
                });

                if !builder.text.is_empty() && span.start > builder.last_end {
                    let gap = &source[builder.last_end..span.start];
                    if gap.contains('\n') {
                        // Fold the line break; drop a dangling comma before a closer
                        if kind == TokenKind::Close && builder.text.ends_with(',') {
                            builder.text.pop();
                        } else if kind != TokenKind::Close
                            && !builder.text.ends_with(['(', '[', '{'])
                        {
                            builder.text.push(' ');
                        }
                    } else if !gap.contains('\\') {
                        builder.text.push_str(gap);
                    } else {
                        builder.text.push(' ');
                    }
                }

                builder.text.push_str(slice);
                builder.tokens += 1;
                builder.only_strings &= kind.is_string();
                builder.last_end = span.end;
            }
        }
    }

    if let Some(line) = current.take().and_then(LineBuilder::finish) {
        lines.push(line);
    }
    lines
}

/// Decode the contents of a string literal token (prefix and quotes removed)
///
/// Escape sequences are left as written except for escaped quotes and
/// backslashes, which is all docstrings and `__all__` entries need.
pub fn string_value(literal: &str) -> Option<&str> {
    let body = literal.trim_start_matches(['r', 'R', 'b', 'B', 'u', 'U', 'f', 'F']);
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= quote.len() * 2 && body.starts_with(quote) && body.ends_with(quote) {
            return Some(&body[quote.len()..body.len() - quote.len()]);
        }
    }
    // Unterminated triple-quoted strings run to end of input
    for quote in ["\"\"\"", "'''"] {
        if let Some(rest) = body.strip_prefix(quote) {
            return Some(rest);
        }
    }
    None
}
