//! Docstring parsing
//!
//! Docstrings are autodetected as Google, NumPy or reST style and normalized
//! into a single [`Docstring`] structure. Anything that is not recognized as
//! a section or field stays part of the description.

use std::sync::OnceLock;

use regex::Regex;

/// Parsed docstring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Docstring {
    /// First paragraph, joined onto one line
    pub short_description: Option<String>,
    /// Everything between the first paragraph and the first section
    pub long_description: Option<String>,
    pub params: Vec<ParamDoc>,
    pub attributes: Vec<ParamDoc>,
    pub returns: Option<ReturnsDoc>,
    pub raises: Vec<RaisesDoc>,
    /// Example blocks, verbatim
    pub examples: Vec<String>,
    /// Docusaurus admonitions (`:::note` etc.) in source order
    pub admonitions: Vec<(Admonition, String)>,
}

/// A documented parameter or attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamDoc {
    pub name: String,
    pub type_name: Option<String>,
    pub default: Option<String>,
    pub description: Option<String>,
}

/// Documented return value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnsDoc {
    pub type_name: Option<String>,
    pub description: Option<String>,
}

/// A documented exception
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaisesDoc {
    pub type_name: Option<String>,
    pub description: Option<String>,
}

/// Docusaurus admonition kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Admonition {
    Note,
    Info,
    Warn,
    Tip,
}

impl Admonition {
    /// Name used after `:::` in the rendered Markdown
    pub fn directive(self) -> &'static str {
        match self {
            Admonition::Note => "note",
            Admonition::Info => "info",
            Admonition::Warn => "warn",
            Admonition::Tip => "tip",
        }
    }
}

/// Docstring conventions understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStyle {
    Google,
    Numpy,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Params,
    Attributes,
    Returns,
    Raises,
    Examples,
    Admonition(Admonition),
    Other,
}

fn section_for(title: &str) -> Option<Section> {
    let section = match title.trim().to_lowercase().as_str() {
        "args" | "arguments" | "parameters" | "params" | "keyword args" | "keyword arguments"
        | "kwargs" | "other parameters" => Section::Params,
        "attributes" | "attribs" => Section::Attributes,
        "returns" | "return" | "yields" | "yield" => Section::Returns,
        "raises" | "raise" | "except" | "exceptions" => Section::Raises,
        "example" | "examples" => Section::Examples,
        "note" | "notes" => Section::Admonition(Admonition::Note),
        "info" => Section::Admonition(Admonition::Info),
        "warn" | "warns" | "warning" | "warnings" => Section::Admonition(Admonition::Warn),
        "tip" | "tips" | "hint" => Section::Admonition(Admonition::Tip),
        "see also" | "references" | "todo" => Section::Other,
        _ => return None,
    };
    Some(section)
}

fn rest_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^:([A-Za-z]+)(?:\s+([^:]*?))?\s*:\s*(.*)$").expect("valid regex")
    })
}

fn google_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\*{0,2}[\w.]+)\s*(?:\(([^)]*)\))?\s*:\s*(.*)$").expect("valid regex")
    })
}

fn numpy_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\*{0,2}[\w.]+)\s*(?::\s*(.*))?$").expect("valid regex"))
}

fn default_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)defaults?\s+to\s+(`[^`]+`|[^\s,;]+)").expect("valid regex")
    })
}

impl Docstring {
    /// Parse a raw docstring, detecting its style
    pub fn parse(raw: &str) -> Self {
        let text = clean(raw);
        match detect_style(&text) {
            DocStyle::Rest => parse_rest(&text),
            style => parse_sections(&text, style),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.short_description.is_none()
            && self.long_description.is_none()
            && self.params.is_empty()
            && self.attributes.is_empty()
            && self.returns.is_none()
            && self.raises.is_empty()
            && self.examples.is_empty()
            && self.admonitions.is_empty()
    }

    fn set_description(&mut self, lines: &[&str]) {
        let text = lines.join("\n");
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let (short, long) = match text.find("\n\n") {
            Some(pos) => (&text[..pos], Some(text[pos..].trim())),
            None => (text, None),
        };
        self.short_description = join_text(short.lines());
        self.long_description = long.filter(|l| !l.is_empty()).map(str::to_string);
    }

    fn append_long_description(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.long_description = Some(match self.long_description.take() {
            Some(existing) => format!("{}\n\n{}", existing, text),
            None => text.to_string(),
        });
    }

    fn param_mut(params: &mut Vec<ParamDoc>, name: &str) -> usize {
        if let Some(pos) = params.iter().position(|p| p.name == name) {
            return pos;
        }
        params.push(ParamDoc {
            name: name.to_string(),
            ..ParamDoc::default()
        });
        params.len() - 1
    }
}

/// Strip the docstring's indentation the way `inspect.cleandoc` does
pub fn clean(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        out.push(first.trim());
    }
    for line in lines.iter().skip(1) {
        if indent_of(line) >= margin {
            out.push(line.get(margin..).unwrap_or(line).trim_end());
        } else {
            out.push(line.trim());
        }
    }

    while out.first().is_some_and(|l| l.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Guess the docstring convention from its shape
pub fn detect_style(text: &str) -> DocStyle {
    let lines: Vec<&str> = text.lines().collect();
    if lines.iter().any(|l| is_rest_field(l.trim_start())) {
        DocStyle::Rest
    } else if lines
        .windows(2)
        .any(|w| indent_of(w[0]) == 0 && section_for(w[0]).is_some() && is_underline(w[1]))
    {
        DocStyle::Numpy
    } else {
        DocStyle::Google
    }
}

fn is_rest_field(line: &str) -> bool {
    rest_field_re().captures(line).is_some_and(|c| {
        matches!(
            &c[1],
            "param"
                | "parameter"
                | "arg"
                | "argument"
                | "key"
                | "keyword"
                | "type"
                | "return"
                | "returns"
                | "rtype"
                | "raise"
                | "raises"
                | "except"
                | "exception"
                | "ivar"
                | "var"
                | "cvar"
                | "vartype"
                | "yield"
                | "yields"
                | "ytype"
        )
    })
}

fn is_underline(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn header_at(lines: &[&str], i: usize, style: DocStyle) -> Option<Section> {
    let line = lines[i];
    if indent_of(line) > 0 {
        return None;
    }
    match style {
        DocStyle::Google => section_for(line.trim().strip_suffix(':')?),
        DocStyle::Numpy => {
            if is_underline(lines.get(i + 1)?) {
                section_for(line)
            } else {
                None
            }
        }
        DocStyle::Rest => None,
    }
}

fn parse_sections(text: &str, style: DocStyle) -> Docstring {
    let lines: Vec<&str> = text.lines().collect();
    let mut preamble: Vec<&str> = Vec::new();
    let mut sections: Vec<(Section, Vec<&str>)> = Vec::new();
    let mut open = false;

    let mut i = 0;
    while i < lines.len() {
        if let Some(section) = header_at(&lines, i, style) {
            sections.push((section, Vec::new()));
            open = true;
            i += if style == DocStyle::Numpy { 2 } else { 1 };
            continue;
        }

        let line = lines[i];
        // Google sections end at the first unindented line
        if style == DocStyle::Google && !line.trim().is_empty() && indent_of(line) == 0 {
            open = false;
        }
        match sections.last_mut() {
            Some((_, body)) if open => body.push(line),
            _ => preamble.push(line),
        }
        i += 1;
    }

    let mut doc = Docstring::default();
    doc.set_description(&preamble);

    for (section, body) in sections {
        let body = dedent(&body);
        match section {
            Section::Params => doc.params.extend(parse_params(&body, style)),
            Section::Attributes => doc.attributes.extend(parse_params(&body, style)),
            Section::Returns => doc.returns = parse_returns(&body, style),
            Section::Raises => doc.raises.extend(parse_raises(&body, style)),
            Section::Examples => {
                let example = body.join("\n").trim().to_string();
                if !example.is_empty() {
                    doc.examples.push(example);
                }
            }
            Section::Admonition(kind) => {
                let text = body.join("\n").trim().to_string();
                if !text.is_empty() {
                    doc.admonitions.push((kind, text));
                }
            }
            Section::Other => doc.append_long_description(body.join("\n").trim()),
        }
    }

    doc
}

fn dedent(lines: &[&str]) -> Vec<String> {
    let margin = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l.get(margin..).unwrap_or(l).trim_end().to_string()
            }
        })
        .collect()
}

/// Split a dedented section body into item heads and their continuation lines
fn group_items(body: &[String]) -> Vec<(String, Vec<String>)> {
    let mut items: Vec<(String, Vec<String>)> = Vec::new();
    for line in body {
        if line.is_empty() {
            continue;
        }
        match items.last_mut() {
            Some((_, cont)) if indent_of(line) > 0 => cont.push(line.trim().to_string()),
            _ => items.push((line.trim().to_string(), Vec::new())),
        }
    }
    items
}

fn join_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let joined = parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn parse_params(body: &[String], style: DocStyle) -> Vec<ParamDoc> {
    let mut params = Vec::new();
    for (head, cont) in group_items(body) {
        let (name, type_text, first) = match style {
            DocStyle::Numpy => match numpy_item_re().captures(&head) {
                Some(c) => (
                    c[1].to_string(),
                    c.get(2).map(|m| m.as_str().to_string()),
                    String::new(),
                ),
                None => (head.clone(), None, String::new()),
            },
            _ => match google_item_re().captures(&head) {
                Some(c) => (
                    c[1].to_string(),
                    c.get(2).map(|m| m.as_str().to_string()),
                    c[3].to_string(),
                ),
                None => (head.clone(), None, String::new()),
            },
        };

        let description =
            join_text(std::iter::once(first.as_str()).chain(cont.iter().map(String::as_str)));
        let (type_name, mut default) = match type_text {
            Some(t) => split_type_options(&t),
            None => (None, None),
        };
        if default.is_none() {
            default = description.as_deref().and_then(find_default);
        }

        params.push(ParamDoc {
            name,
            type_name,
            default,
            description,
        });
    }
    params
}

fn parse_returns(body: &[String], style: DocStyle) -> Option<ReturnsDoc> {
    let items = group_items(body);
    let (head, _) = items.first()?;

    if style == DocStyle::Numpy {
        let type_name = match head.split_once(':') {
            Some((_, ty)) => ty.trim().to_string(),
            None => head.clone(),
        };
        let description = join_text(items.iter().flat_map(|(_, c)| c.iter().map(String::as_str)));
        return Some(ReturnsDoc {
            type_name: Some(type_name).filter(|t| !t.is_empty()),
            description,
        });
    }

    let all_lines = items
        .iter()
        .flat_map(|(h, c)| std::iter::once(h).chain(c.iter()))
        .map(String::as_str)
        .collect::<Vec<_>>();
    match head.split_once(':') {
        Some((ty, rest)) if looks_like_type(ty) => Some(ReturnsDoc {
            type_name: Some(ty.trim().to_string()),
            description: join_text(std::iter::once(rest).chain(all_lines.into_iter().skip(1))),
        }),
        _ => Some(ReturnsDoc {
            type_name: None,
            description: join_text(all_lines),
        }),
    }
}

fn parse_raises(body: &[String], style: DocStyle) -> Vec<RaisesDoc> {
    group_items(body)
        .into_iter()
        .map(|(head, cont)| {
            let cont = cont.iter().map(String::as_str);
            if style == DocStyle::Numpy {
                return RaisesDoc {
                    type_name: Some(head.clone()),
                    description: join_text(cont),
                };
            }
            match head.split_once(':') {
                Some((ty, rest)) if looks_like_type(ty) => RaisesDoc {
                    type_name: Some(ty.trim().to_string()),
                    description: join_text(std::iter::once(rest).chain(cont)),
                },
                _ if looks_like_type(&head) => RaisesDoc {
                    type_name: Some(head.clone()),
                    description: join_text(cont),
                },
                _ => RaisesDoc {
                    type_name: None,
                    description: join_text(std::iter::once(head.as_str()).chain(cont)),
                },
            }
        })
        .collect()
}

fn parse_rest(text: &str) -> Docstring {
    let mut preamble: Vec<&str> = Vec::new();
    // (field, args, description)
    let mut fields: Vec<(String, String, String)> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(c) = rest_field_re().captures(trimmed) {
            fields.push((
                c[1].to_lowercase(),
                c.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                c[3].trim().to_string(),
            ));
        } else if let Some((_, _, desc)) = fields.last_mut() {
            if !trimmed.is_empty() {
                if !desc.is_empty() {
                    desc.push(' ');
                }
                desc.push_str(trimmed.trim_end());
            }
        } else {
            preamble.push(line);
        }
    }

    let mut doc = Docstring::default();
    doc.set_description(&preamble);

    for (field, args, desc) in fields {
        let description = Some(desc.clone()).filter(|d| !d.is_empty());
        match field.as_str() {
            "param" | "parameter" | "arg" | "argument" | "key" | "keyword" | "ivar" | "var"
            | "cvar" => {
                let target = if matches!(field.as_str(), "ivar" | "var" | "cvar") {
                    &mut doc.attributes
                } else {
                    &mut doc.params
                };
                let (type_name, name) = match args.rsplit_once(char::is_whitespace) {
                    Some((ty, name)) => (Some(ty.trim().to_string()), name.to_string()),
                    None => (None, args.clone()),
                };
                let idx = Docstring::param_mut(target, &name);
                let param = &mut target[idx];
                if type_name.is_some() {
                    param.type_name = type_name;
                }
                param.default = description.as_deref().and_then(find_default);
                param.description = description;
            }
            "type" | "vartype" => {
                let target = if field == "vartype" {
                    &mut doc.attributes
                } else {
                    &mut doc.params
                };
                let idx = Docstring::param_mut(target, &args);
                target[idx].type_name = description;
            }
            "returns" | "return" | "yields" | "yield" => {
                doc.returns.get_or_insert_with(ReturnsDoc::default).description = description;
            }
            "rtype" | "ytype" => {
                doc.returns.get_or_insert_with(ReturnsDoc::default).type_name = description;
            }
            "raises" | "raise" | "except" | "exception" => doc.raises.push(RaisesDoc {
                type_name: Some(args).filter(|a| !a.is_empty()),
                description,
            }),
            _ => {}
        }
    }

    doc
}

/// Split `int, optional` or `str, default "x"` into the type and a default
fn split_type_options(text: &str) -> (Option<String>, Option<String>) {
    let mut kept = Vec::new();
    let mut default = None;
    for part in split_top_level(text, ',') {
        let part = part.trim();
        if part.eq_ignore_ascii_case("optional") {
            continue;
        }
        if let Some(rest) = part.strip_prefix("default") {
            let value = rest.trim_start_matches([' ', '=', ':']).trim();
            if !value.is_empty() {
                default = Some(value.to_string());
            }
            continue;
        }
        kept.push(part);
    }
    let type_name = kept.join(", ");
    (Some(type_name).filter(|t| !t.is_empty()), default)
}

/// Split on `sep` outside of brackets
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn find_default(description: &str) -> Option<String> {
    let caps = default_re().captures(description)?;
    let value = caps[1].trim_matches('`').trim_end_matches('.');
    Some(value.to_string()).filter(|v| !v.is_empty())
}

/// True when `text` reads like a type expression rather than prose
fn looks_like_type(text: &str) -> bool {
    let mut expect_word = true;
    let mut seen = false;
    for token in text.split_whitespace() {
        if token == "|" {
            expect_word = true;
            continue;
        }
        if !expect_word {
            return false;
        }
        if !token
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | ','))
        {
            return false;
        }
        seen = true;
        // `dict[str, int]` splits into two words joined by a comma
        expect_word = token.ends_with(',');
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_indentation() {
        let raw = "Summary line.\n\n        Indented body.\n            More.\n    ";
        assert_eq!(clean(raw), "Summary line.\n\nIndented body.\n    More.");
    }

    #[test]
    fn test_parse_simple_doc() {
        let doc = Docstring::parse("This is a simple function.");
        assert_eq!(doc.short_description.as_deref(), Some("This is a simple function."));
        assert!(doc.long_description.is_none());
    }

    #[test]
    fn test_parse_google() {
        let text = r"Process a batch.

        Longer explanation
        over two lines.

        Args:
            data (list[str]): Items to process.
            limit (int, optional): Maximum count. Defaults to 10.

        Returns:
            Result | None: The processed result.

        Raises:
            ValueError: If data is empty.

        Note:
            Runs in place.
        ";
        let doc = Docstring::parse(text);
        assert_eq!(detect_style(&clean(text)), DocStyle::Google);
        assert_eq!(doc.short_description.as_deref(), Some("Process a batch."));
        assert_eq!(
            doc.long_description.as_deref(),
            Some("Longer explanation\nover two lines.")
        );
        assert_eq!(doc.params.len(), 2);
        assert_eq!(doc.params[0].name, "data");
        assert_eq!(doc.params[0].type_name.as_deref(), Some("list[str]"));
        assert_eq!(doc.params[1].type_name.as_deref(), Some("int"));
        assert_eq!(doc.params[1].default.as_deref(), Some("10"));

        let returns = doc.returns.unwrap();
        assert_eq!(returns.type_name.as_deref(), Some("Result | None"));
        assert_eq!(returns.description.as_deref(), Some("The processed result."));

        assert_eq!(doc.raises[0].type_name.as_deref(), Some("ValueError"));
        assert_eq!(doc.admonitions, vec![(Admonition::Note, "Runs in place.".to_string())]);
    }

    #[test]
    fn test_google_returns_without_type() {
        let doc = Docstring::parse("Do it.\n\nReturns:\n    The sum of a and b\n");
        let returns = doc.returns.unwrap();
        assert!(returns.type_name.is_none());
        assert_eq!(returns.description.as_deref(), Some("The sum of a and b"));
    }

    #[test]
    fn test_parse_numpy() {
        let text = "Load a file.

Parameters
----------
path : str
    Where to read from.
strict : bool, optional
    Fail on unknown keys.

Returns
-------
dict[str, Any]
    Parsed content.

Raises
------
FileNotFoundError
    If the path is missing.
";
        let doc = Docstring::parse(text);
        assert_eq!(detect_style(text), DocStyle::Numpy);
        assert_eq!(doc.params.len(), 2);
        assert_eq!(doc.params[0].type_name.as_deref(), Some("str"));
        assert_eq!(doc.params[0].description.as_deref(), Some("Where to read from."));
        assert_eq!(doc.params[1].type_name.as_deref(), Some("bool"));
        let returns = doc.returns.unwrap();
        assert_eq!(returns.type_name.as_deref(), Some("dict[str, Any]"));
        assert_eq!(doc.raises[0].type_name.as_deref(), Some("FileNotFoundError"));
        assert_eq!(doc.raises[0].description.as_deref(), Some("If the path is missing."));
    }

    #[test]
    fn test_parse_rest() {
        let text = "Format a value.

:param value: The value
    to format.
:type value: int
:param str sep: Separator, defaults to `,`.
:returns: Formatted text.
:rtype: str
:raises TypeError: On bad input.
";
        let doc = Docstring::parse(text);
        assert_eq!(doc.short_description.as_deref(), Some("Format a value."));
        assert_eq!(doc.params[0].name, "value");
        assert_eq!(doc.params[0].type_name.as_deref(), Some("int"));
        assert_eq!(doc.params[0].description.as_deref(), Some("The value to format."));
        assert_eq!(doc.params[1].type_name.as_deref(), Some("str"));
        assert_eq!(doc.params[1].default.as_deref(), Some(","));
        let returns = doc.returns.unwrap();
        assert_eq!(returns.type_name.as_deref(), Some("str"));
        assert_eq!(doc.raises[0].type_name.as_deref(), Some("TypeError"));
    }

    #[test]
    fn test_looks_like_type() {
        assert!(looks_like_type("int"));
        assert!(looks_like_type("Foo | None"));
        assert!(looks_like_type("dict[str, int]"));
        assert!(!looks_like_type("The result"));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("dict[str, int], optional", ','), vec!["dict[str, int]", " optional"]);
    }
}
