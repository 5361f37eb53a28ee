//! Documentation extractor - walks logical lines and extracts documentation
//!
//! This is a structural scan, not a full Python parser: it recognizes the
//! statement shapes that carry documentation (`def`, `class`, ALL-CAPS
//! assignments, `__all__`, imports) and skips everything else.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::docstring::Docstring;
use crate::lexer::{logical_lines, string_value, LogicalLine};
use crate::types::{parent_name, Class, Constant, Function, Module};

/// Options controlling what the extractor keeps
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Keep names with a single leading underscore
    pub include_private: bool,
}

/// Returns true if the given name should be documented.
/// Dunder names such as `__init__` are always kept.
pub fn should_include(name: &str, include_private: bool) -> bool {
    include_private
        || !name.starts_with('_')
        || (name.starts_with("__") && name.ends_with("__"))
}

/// Python's `str.isupper`: at least one cased character, none lowercase
fn is_upper(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && !name.chars().any(char::is_lowercase)
}

fn def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:async\s+)?def\s+(\w+)\s*\(").expect("valid regex"))
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^class\s+(\w+)\s*(?:\((.*)\))?\s*:").expect("valid regex"))
}

fn assign_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z_]\w*)\s*(\+?=|:)(.*)$").expect("valid regex"))
}

fn string_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"\\]*)"|'([^'\\]*)'"#).expect("valid regex"))
}

/// Extracts documentation from one Python source file
pub struct DocExtractor<'a> {
    lines: Vec<LogicalLine>,
    fully_qualified_name: &'a str,
    is_package: bool,
    options: ExtractOptions,
}

impl<'a> DocExtractor<'a> {
    /// Extract a module from source text
    pub fn extract(
        source: &str,
        path: &Path,
        fully_qualified_name: &'a str,
        is_package: bool,
        options: ExtractOptions,
    ) -> Module {
        let extractor = Self {
            lines: logical_lines(source),
            fully_qualified_name,
            is_package,
            options,
        };
        extractor.extract_module(path)
    }

    fn extract_module(&self, path: &Path) -> Module {
        let mut module = Module::new(path, self.fully_qualified_name);
        module.is_package = self.is_package;

        if let Some(first) = self.next_code(0) {
            if self.lines[first].indent == 0 {
                module.docstring = self.string_at(first).map(Docstring::parse);
            }
        }

        let mut i = 0;
        while let Some(idx) = self.next_code(i) {
            let line = &self.lines[idx];
            let text = line.text.as_str();
            let top_level = line.indent == 0;

            if def_re().is_match(text) || class_re().is_match(text) {
                let end = self.block_end(idx);
                if top_level {
                    if let Some(caps) = def_re().captures(text) {
                        if should_include(&caps[1], self.options.include_private) {
                            module.functions.push(self.extract_function(
                                idx,
                                &caps[1],
                                &module.fully_qualified_name,
                            ));
                        }
                    } else if let Some(class) = self.extract_class(idx, &module.fully_qualified_name)
                    {
                        module.classes.push(class);
                    }
                }
                i = end;
                continue;
            }

            if text.starts_with("import ") || text.starts_with("from ") {
                self.record_imports(text, &mut module);
            } else if top_level {
                self.record_assignment(idx, &mut module);
            }
            i = idx + 1;
        }

        module
    }

    fn next_code(&self, from: usize) -> Option<usize> {
        (from..self.lines.len()).find(|&j| !self.lines[j].text.is_empty())
    }

    /// Index of the first code line after `header` that is not indented under it
    fn block_end(&self, header: usize) -> usize {
        let indent = self.lines[header].indent;
        (header + 1..self.lines.len())
            .find(|&j| !self.lines[j].text.is_empty() && self.lines[j].indent <= indent)
            .unwrap_or(self.lines.len())
    }

    fn string_at(&self, idx: usize) -> Option<&str> {
        let line = &self.lines[idx];
        if line.is_string {
            string_value(&line.text)
        } else {
            None
        }
    }

    /// Docstring of the block opened at `header`
    fn block_docstring(&self, header: usize) -> Option<Docstring> {
        let end = self.block_end(header);
        let first = self.next_code(header + 1).filter(|&j| j < end)?;
        self.string_at(first).map(Docstring::parse)
    }

    fn extract_function(&self, idx: usize, name: &str, parent_fqn: &str) -> Function {
        let text = &self.lines[idx].text;
        let signature = match header_end(text) {
            Some(end) => text[..=end].to_string(),
            None => text.clone(),
        };
        Function {
            name: name.to_string(),
            fully_qualified_name: format!("{}.{}", parent_fqn, name),
            signature,
            docstring: self.block_docstring(idx),
        }
    }

    fn extract_class(&self, idx: usize, parent_fqn: &str) -> Option<Class> {
        let header = &self.lines[idx];
        let caps = class_re().captures(&header.text)?;
        let name = caps[1].to_string();
        if !should_include(&name, self.options.include_private) {
            return None;
        }

        let signature = match caps.get(2).map(|m| m.as_str().trim()) {
            Some(bases) if !bases.is_empty() => format!("class {}({}):", name, bases),
            _ => format!("class {}:", name),
        };
        let mut class = Class {
            fully_qualified_name: format!("{}.{}", parent_fqn, name),
            name,
            signature,
            docstring: self.block_docstring(idx),
            functions: Vec::new(),
            classes: Vec::new(),
        };

        let end = self.block_end(idx);
        let Some(first) = self.next_code(idx + 1).filter(|&j| j < end) else {
            return Some(class);
        };
        let body_indent = self.lines[first].indent;

        let mut i = first;
        while let Some(j) = self.next_code(i).filter(|&j| j < end) {
            let line = &self.lines[j];
            if line.indent != body_indent {
                i = j + 1;
                continue;
            }
            if let Some(caps) = def_re().captures(&line.text) {
                if should_include(&caps[1], self.options.include_private) {
                    class.functions.push(self.extract_function(
                        j,
                        &caps[1],
                        &class.fully_qualified_name,
                    ));
                }
                i = self.block_end(j);
            } else if class_re().is_match(&line.text) {
                if let Some(nested) = self.extract_class(j, &class.fully_qualified_name) {
                    class.classes.push(nested);
                }
                i = self.block_end(j);
            } else {
                i = j + 1;
            }
        }

        Some(class)
    }

    fn record_assignment(&self, idx: usize, module: &mut Module) {
        let line = &self.lines[idx];
        let Some(caps) = assign_re().captures(&line.text) else {
            return;
        };
        let name = &caps[1];
        let op = &caps[2];
        let rest = caps[3].trim();

        if name == "__all__" {
            if op != ":" || rest.contains('=') {
                module.exports.extend(parse_string_list(rest));
            }
            return;
        }
        if !is_upper(name)
            || name == "__ALL__"
            || !should_include(name, self.options.include_private)
        {
            return;
        }
        if op == "+=" || rest.starts_with('=') {
            // augmented assignment or comparison, not a definition
            return;
        }

        let (mut type_name, value) = if op == ":" {
            match find_assign(rest) {
                Some(pos) => (
                    Some(rest[..pos].trim().to_string()),
                    rest[pos + 1..].trim().to_string(),
                ),
                None => (Some(rest.to_string()), "None".to_string()),
            }
        } else {
            (None, rest.to_string())
        };

        let mut comment = None;
        match line.comment.as_deref() {
            Some(c) if c.starts_with("type:") => {
                if type_name.is_none() {
                    type_name = Some(c["type:".len()..].trim().to_string());
                }
            }
            Some(c) => comment = Some(c.to_string()),
            None => {}
        }
        if comment.is_none() {
            comment = self.following_comment(idx);
        }

        module.constants.push(Constant {
            name: name.to_string(),
            fully_qualified_name: format!("{}.{}", module.fully_qualified_name, name),
            value,
            type_name: type_name.filter(|t| !t.is_empty()),
            comment,
        });
    }

    /// Attribute docstring or comment on the line right after a constant
    fn following_comment(&self, idx: usize) -> Option<String> {
        let next = self.lines.get(idx + 1)?;
        if next.line != self.lines[idx].line + 1 + self.lines[idx].text.matches('\n').count() {
            return None;
        }
        if next.text.is_empty() {
            return next.comment.clone();
        }
        let value = self.string_at(idx + 1)?;
        Some(value.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn record_imports(&self, text: &str, module: &mut Module) {
        if let Some(rest) = text.strip_prefix("import ") {
            for item in rest.split(',') {
                let item = item.trim();
                match item.split_once(" as ") {
                    Some((target, local)) => {
                        module
                            .aliases
                            .insert(local.trim().to_string(), target.trim().to_string());
                    }
                    None => {
                        let head = item.split('.').next().unwrap_or(item);
                        if !head.is_empty() {
                            module.aliases.insert(head.to_string(), head.to_string());
                        }
                    }
                }
            }
            return;
        }

        let Some(rest) = text.strip_prefix("from ") else {
            return;
        };
        let Some((source, names)) = rest.split_once(" import ") else {
            return;
        };
        let Some(source) = self.absolute_module(source.trim()) else {
            return;
        };

        let names = names.trim().trim_start_matches('(').trim_end_matches(')');
        for item in names.split(',') {
            let item = item.trim();
            if item.is_empty() || item == "*" {
                continue;
            }
            let (target, local) = match item.split_once(" as ") {
                Some((target, local)) => (target.trim(), local.trim()),
                None => (item, item),
            };
            let fqn = if source.is_empty() {
                target.to_string()
            } else {
                format!("{}.{}", source, target)
            };
            module.aliases.insert(local.to_string(), fqn);
        }
    }

    /// Resolve a possibly relative `from` target against this module's package
    fn absolute_module(&self, source: &str) -> Option<String> {
        let level = source.chars().take_while(|&c| c == '.').count();
        let relative = &source[level..];
        if level == 0 {
            return Some(relative.to_string());
        }

        let mut base = if self.is_package {
            self.fully_qualified_name
        } else {
            parent_name(self.fully_qualified_name)?
        };
        for _ in 1..level {
            base = parent_name(base)?;
        }
        Some(if relative.is_empty() {
            base.to_string()
        } else {
            format!("{}.{}", base, relative)
        })
    }
}

/// Byte index of the colon that ends a `def`/`class` header
pub(crate) fn header_end(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Position of a top-level `=` that is an assignment, not `==`
fn find_assign(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'=' if depth == 0 => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let next = bytes.get(i + 1).copied();
                if next != Some(b'=') && !matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Pull the string literals out of an `__all__` list or tuple
fn parse_string_list(text: &str) -> Vec<String> {
    let text = text.trim_start_matches('=').trim();
    if !(text.starts_with('[') || text.starts_with('(')) {
        return Vec::new();
    }
    string_literal_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#""""Core functionality module using Google-style docstrings."""

from __future__ import annotations

from .models import User as Account, Group
from . import utils
import json

MAX_ITEMS: int = 100  # upper bound
TIMEOUT = 30
"""Seconds before giving up."""
_PRIVATE = 1
lowercase = 2

__all__ = ["DataProcessor", "load", "Account"]


@decorator
def load(
    path: str,
    *,
    strict: bool = False,
) -> dict:
    """Load data.

    Args:
        path (str): Where to read.
    """
    def inner():
        pass
    return {}


def _hidden():
    pass


class DataProcessor(Base, metaclass=Meta):
    """Process data."""

    LIMIT = 3

    def run(self, item: Account) -> None:
        """Run once."""

    async def stream(self): ...

    class Config:
        """Nested config."""

        def validate(self):
            pass
"#;

    fn extract(source: &str, fqn: &str, is_package: bool) -> Module {
        DocExtractor::extract(
            source,
            Path::new("pkg/core.py"),
            fqn,
            is_package,
            ExtractOptions::default(),
        )
    }

    #[test]
    fn test_module_docstring() {
        let module = extract(SOURCE, "pkg.core", false);
        assert_eq!(
            module.docstring.unwrap().short_description.as_deref(),
            Some("Core functionality module using Google-style docstrings.")
        );
    }

    #[test]
    fn test_constants() {
        let module = extract(SOURCE, "pkg.core", false);
        let names: Vec<_> = module.constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["MAX_ITEMS", "TIMEOUT"]);

        let max = &module.constants[0];
        assert_eq!(max.fully_qualified_name, "pkg.core.MAX_ITEMS");
        assert_eq!(max.type_name.as_deref(), Some("int"));
        assert_eq!(max.value, "100");
        assert_eq!(max.comment.as_deref(), Some("upper bound"));

        let timeout = &module.constants[1];
        assert_eq!(timeout.comment.as_deref(), Some("Seconds before giving up."));
    }

    #[test]
    fn test_functions() {
        let module = extract(SOURCE, "pkg.core", false);
        assert_eq!(module.functions.len(), 1);
        let load = &module.functions[0];
        assert_eq!(load.fully_qualified_name, "pkg.core.load");
        assert_eq!(
            load.signature,
            "def load(path: str, *, strict: bool = False) -> dict:"
        );
        assert_eq!(load.docstring.as_ref().unwrap().params[0].name, "path");
    }

    #[test]
    fn test_classes() {
        let module = extract(SOURCE, "pkg.core", false);
        assert_eq!(module.classes.len(), 1);
        let class = &module.classes[0];
        assert_eq!(class.signature, "class DataProcessor(Base, metaclass=Meta):");
        let methods: Vec<_> = class.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(methods, vec!["run", "stream"]);
        assert_eq!(class.functions[1].signature, "async def stream(self):");
        assert_eq!(class.classes[0].fully_qualified_name, "pkg.core.DataProcessor.Config");
        assert_eq!(class.classes[0].functions[0].name, "validate");
    }

    #[test]
    fn test_exports_and_aliases() {
        let module = extract(SOURCE, "pkg.core", false);
        assert_eq!(module.exports, vec!["DataProcessor", "load", "Account"]);
        assert_eq!(module.aliases.get("Account").map(String::as_str), Some("pkg.models.User"));
        assert_eq!(module.aliases.get("Group").map(String::as_str), Some("pkg.models.Group"));
        assert_eq!(module.aliases.get("utils").map(String::as_str), Some("pkg.utils"));
        assert_eq!(module.aliases.get("json").map(String::as_str), Some("json"));
    }

    #[test]
    fn test_relative_import_from_package() {
        let module = extract("from .core import Processor\nfrom ..other import X\n", "pkg.sub", true);
        assert_eq!(module.aliases["Processor"], "pkg.sub.core.Processor");
        assert_eq!(module.aliases["X"], "pkg.other.X");
    }

    #[test]
    fn test_include_private() {
        let module = DocExtractor::extract(
            SOURCE,
            Path::new("pkg/core.py"),
            "pkg.core",
            false,
            ExtractOptions {
                include_private: true,
            },
        );
        assert!(module.constants.iter().any(|c| c.name == "_PRIVATE"));
        assert!(module.functions.iter().any(|f| f.name == "_hidden"));
    }

    #[test]
    fn test_should_include() {
        assert!(should_include("public", false));
        assert!(!should_include("_private", false));
        assert!(should_include("__init__", false));
        assert!(should_include("_private", true));
    }

    #[test]
    fn test_header_end_skips_nested_colons() {
        let text = "def f(a: dict[str, int] = {'k': 1}) -> Callable[[int], str]: return x";
        let end = header_end(text).unwrap();
        assert_eq!(&text[..=end], "def f(a: dict[str, int] = {'k': 1}) -> Callable[[int], str]:");
    }
}
