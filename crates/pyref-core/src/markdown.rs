//! Markdown documentation generator

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::crosslink::{alias_for, CrossLinker};
use crate::docstring::{split_top_level, Admonition, Docstring};
use crate::layout::SiteLayout;
use crate::types::{
    Class, Constant, Function, Module, Package, SymbolKind, ATTR_FLAG, CLASS_FLAG, FUNC_FLAG,
    MODULE_FLAG,
};

const ESCAPED: &str = "\\`*_{}[]<>()#+.!|";
const ESCAPED_SIMPLE: &str = "\\`*_{}[]<>()#+!|";

/// Signatures longer than this are split one parameter per line
const SIGNATURE_WIDTH: usize = 88;

/// Backslash-escape Markdown control characters.
/// The simple variant leaves `.` alone.
pub fn escape_markdown(text: &str, simple: bool) -> String {
    let set = if simple { ESCAPED_SIMPLE } else { ESCAPED };
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if set.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Front matter block used by every page
pub fn front_matter(title: &str) -> String {
    format!("---\ntitle: {}\n---\n\n", title)
}

/// Anchor id of a documented item on its module page
pub fn anchor(kind: SymbolKind, name: &str) -> String {
    format!("{}-{}", kind.anchor_tag(), name.to_lowercase())
}

/// Lay a long `def` header out one parameter per line
pub fn format_signature(signature: &str) -> String {
    let signature = signature.trim();
    if signature.len() <= SIGNATURE_WIDTH {
        return signature.to_string();
    }
    let (Some(open), Some(close)) = (signature.find('('), matching_paren(signature)) else {
        return signature.to_string();
    };

    let params: Vec<&str> = split_top_level(&signature[open + 1..close], ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let mut out = String::new();
    writeln!(out, "{}", &signature[..=open]).unwrap();
    for param in params {
        writeln!(out, "    {},", param).unwrap();
    }
    write!(out, "{}", &signature[close..]).unwrap();
    out
}

/// Byte index of the `)` closing the first `(`
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 && c == ')' {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Renders modules to Markdown, linking every type reference
pub struct MarkdownRenderer<'r, 'a> {
    linker: &'r mut CrossLinker<'a>,
}

impl<'r, 'a> MarkdownRenderer<'r, 'a> {
    pub fn new(linker: &'r mut CrossLinker<'a>) -> Self {
        Self { linker }
    }

    /// The `index.md` page: legend, module list and the root module body
    pub fn render_index(&mut self, package: &Package, layout: &SiteLayout, title: &str) -> String {
        let mut output = front_matter(title);

        writeln!(output, "# `{}`", package.name).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "- {} Module", MODULE_FLAG).unwrap();
        writeln!(output, "- {} Class", CLASS_FLAG).unwrap();
        writeln!(output, "- {} Function or method", FUNC_FLAG).unwrap();
        writeln!(output, "- {} Attribute or constant", ATTR_FLAG).unwrap();
        writeln!(output).unwrap();

        writeln!(output, "## Table of Contents").unwrap();
        writeln!(output).unwrap();
        for module in &package.modules {
            if module.fully_qualified_name == package.name {
                continue;
            }
            writeln!(
                output,
                "- {} [{}](./{})",
                MODULE_FLAG,
                escape_markdown(&module.fully_qualified_name, true),
                layout.page_path(&module.fully_qualified_name)
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        if let Some(root) = package.root_module() {
            output.push_str(&self.render_module(root, false));
        }
        finish(output)
    }

    /// A full module page with front matter
    pub fn render_page(&mut self, module: &Module) -> String {
        let mut output = front_matter(&module.name);
        output.push_str(&self.render_module(module, true));
        finish(output)
    }

    /// Module body: TOC, docstring, then the detailed sections
    pub fn render_module(&mut self, module: &Module, add_toc: bool) -> String {
        let mut output = String::new();
        let fqn = module.fully_qualified_name.as_str();

        if add_toc {
            writeln!(output, "## TOC").unwrap();
            writeln!(output).unwrap();
        }

        if let Some(doc) = &module.docstring {
            self.write_docstring(&mut output, doc, fqn, &module.aliases);
        }

        Self::write_toc(&mut output, module, add_toc);

        if !module.constants.is_empty() {
            writeln!(output, "## Attributes").unwrap();
            writeln!(output).unwrap();
            for constant in &module.constants {
                self.write_constant(&mut output, constant, &module.aliases);
            }
        }

        if !module.functions.is_empty() {
            writeln!(output, "## Functions").unwrap();
            writeln!(output).unwrap();
            for function in &module.functions {
                self.write_function(&mut output, function, 3, &module.aliases);
            }
        }

        if !module.classes.is_empty() {
            writeln!(output, "## Classes").unwrap();
            writeln!(output).unwrap();
            for class in &module.classes {
                self.write_class(&mut output, class, 3, &module.aliases);
            }
        }

        if !module.exports.is_empty() {
            writeln!(output, "## Exports {{#exports}}").unwrap();
            writeln!(output).unwrap();
            for export in &module.exports {
                let alias = alias_for(export, &module.aliases);
                let resolution = self.linker.resolve(fqn, export, alias.as_deref(), false);
                let flag = resolution.kind.map_or(ATTR_FLAG, SymbolKind::flag);
                writeln!(output, "- {} {}", flag, resolution.to_markdown()).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn write_toc(output: &mut String, module: &Module, add_toc: bool) {
        if module.is_empty() {
            return;
        }

        if add_toc && !module.exports.is_empty() {
            writeln!(output, "- **[Exports](#exports)**").unwrap();
        }
        if !module.constants.is_empty() {
            writeln!(output, "- **Attributes:**").unwrap();
            for constant in &module.constants {
                write!(
                    output,
                    "  - {} [{}](#{})",
                    ATTR_FLAG,
                    escape_markdown(&constant.name, false),
                    anchor(SymbolKind::Constant, &constant.name)
                )
                .unwrap();
                if let Some(comment) = &constant.comment {
                    write!(output, " - {}", escape_markdown(comment, true)).unwrap();
                }
                writeln!(output).unwrap();
            }
        }
        if !module.functions.is_empty() {
            writeln!(output, "- **Functions:**").unwrap();
            for function in &module.functions {
                write!(
                    output,
                    "  - {} [{}](#{})",
                    FUNC_FLAG,
                    escape_markdown(&function.name, false),
                    anchor(SymbolKind::Function, &function.name)
                )
                .unwrap();
                write_summary(output, function.docstring.as_ref());
            }
        }
        if !module.classes.is_empty() {
            writeln!(output, "- **Classes:**").unwrap();
            for class in &module.classes {
                Self::write_class_toc(output, class, 1);
            }
        }
        writeln!(output).unwrap();
    }

    fn write_class_toc(output: &mut String, class: &Class, indent: usize) {
        write!(
            output,
            "{}- {} [{}](#{})",
            "  ".repeat(indent),
            CLASS_FLAG,
            escape_markdown(&class.name, false),
            anchor(SymbolKind::Class, &class.name)
        )
        .unwrap();
        write_summary(output, class.docstring.as_ref());
        for nested in &class.classes {
            Self::write_class_toc(output, nested, indent + 1);
        }
    }

    fn write_constant(
        &mut self,
        output: &mut String,
        constant: &Constant,
        aliases: &BTreeMap<String, String>,
    ) {
        writeln!(
            output,
            "### {} {} {{#{}}}",
            ATTR_FLAG,
            escape_markdown(&constant.name, true),
            anchor(SymbolKind::Constant, &constant.name)
        )
        .unwrap();
        writeln!(output).unwrap();

        writeln!(output, "```python").unwrap();
        write!(output, "{}", constant.name).unwrap();
        if let Some(type_name) = &constant.type_name {
            write!(output, ": {}", type_name).unwrap();
        }
        write!(output, " = {}", constant.value.trim()).unwrap();
        if let Some(comment) = &constant.comment {
            write!(output, "  # {}", comment).unwrap();
        }
        writeln!(output).unwrap();
        writeln!(output, "```").unwrap();
        writeln!(output).unwrap();

        if let Some(type_name) = &constant.type_name {
            let linked = self
                .linker
                .link_type(&constant.fully_qualified_name, type_name, aliases);
            writeln!(output, "**Type:** {}", linked).unwrap();
            writeln!(output).unwrap();
        }
    }

    fn write_function(
        &mut self,
        output: &mut String,
        function: &Function,
        level: usize,
        aliases: &BTreeMap<String, String>,
    ) {
        writeln!(
            output,
            "{} {} {} {{#{}}}",
            "#".repeat(level),
            FUNC_FLAG,
            escape_markdown(&function.name, false),
            anchor(SymbolKind::Function, &function.name)
        )
        .unwrap();
        writeln!(output).unwrap();

        writeln!(output, "```python").unwrap();
        writeln!(output, "{}", format_signature(&function.signature)).unwrap();
        writeln!(output, "```").unwrap();
        writeln!(output).unwrap();

        if let Some(doc) = &function.docstring {
            self.write_docstring(output, doc, &function.fully_qualified_name, aliases);
        }
    }

    /// Classes put their methods and nested classes on the host module page
    fn write_class(
        &mut self,
        output: &mut String,
        class: &Class,
        level: usize,
        aliases: &BTreeMap<String, String>,
    ) {
        writeln!(
            output,
            "{} {} {} {{#{}}}",
            "#".repeat(level),
            CLASS_FLAG,
            escape_markdown(&class.name, true),
            anchor(SymbolKind::Class, &class.name)
        )
        .unwrap();
        writeln!(output).unwrap();

        writeln!(output, "```python").unwrap();
        writeln!(output, "{}", class.signature).unwrap();
        writeln!(output, "```").unwrap();
        writeln!(output).unwrap();

        if let Some(doc) = &class.docstring {
            self.write_docstring(output, doc, &class.fully_qualified_name, aliases);
        }

        if !class.functions.is_empty() {
            writeln!(output, "**Functions:**").unwrap();
            writeln!(output).unwrap();
            for method in &class.functions {
                self.write_function(output, method, level + 1, aliases);
            }
        }

        for nested in &class.classes {
            self.write_class(output, nested, level, aliases);
        }
    }

    fn write_docstring(
        &mut self,
        output: &mut String,
        doc: &Docstring,
        current: &str,
        aliases: &BTreeMap<String, String>,
    ) {
        if let Some(short) = &doc.short_description {
            writeln!(output, "{}", escape_markdown(short, true)).unwrap();
            writeln!(output).unwrap();
        }
        if let Some(long) = &doc.long_description {
            writeln!(output, "{}", escape_markdown(long, true)).unwrap();
            writeln!(output).unwrap();
        }

        for (title, params) in [("Parameters", &doc.params), ("Attributes", &doc.attributes)] {
            if params.is_empty() {
                continue;
            }
            writeln!(output, "**{}:**", title).unwrap();
            writeln!(output).unwrap();
            for param in params {
                write!(output, "- **{}**", escape_markdown(&param.name, true)).unwrap();
                if let Some(type_name) = &param.type_name {
                    let linked = self.linker.link_type(current, type_name, aliases);
                    write!(output, " ({})", linked).unwrap();
                }
                if let Some(default) = &param.default {
                    write!(output, " (default to `{}`)", default).unwrap();
                }
                if let Some(description) = &param.description {
                    write!(output, ": {}", escape_markdown(description, true)).unwrap();
                }
                writeln!(output).unwrap();
            }
            writeln!(output).unwrap();
        }

        if let Some(returns) = &doc.returns {
            writeln!(output, "**Returns:**").unwrap();
            writeln!(output).unwrap();
            let linked = returns
                .type_name
                .as_ref()
                .map(|t| format!("**{}**", self.linker.link_type(current, t, aliases)));
            let description = returns
                .description
                .as_ref()
                .map(|d| escape_markdown(d, true));
            match (linked, description) {
                (Some(t), Some(d)) => writeln!(output, "- {}: {}", t, d).unwrap(),
                (Some(t), None) => writeln!(output, "- {}", t).unwrap(),
                (None, Some(d)) => writeln!(output, "- {}", d).unwrap(),
                (None, None) => {}
            }
            writeln!(output).unwrap();
        }

        if !doc.raises.is_empty() {
            writeln!(output, "**Raises:**").unwrap();
            writeln!(output).unwrap();
            for raised in &doc.raises {
                let linked = raised
                    .type_name
                    .as_ref()
                    .map(|t| self.linker.link_type(current, t, aliases))
                    .unwrap_or_default();
                match &raised.description {
                    Some(d) => writeln!(output, "- **{}**: {}", linked, escape_markdown(d, true)),
                    None => writeln!(output, "- **{}**", linked),
                }
                .unwrap();
            }
            writeln!(output).unwrap();
        }

        if !doc.examples.is_empty() {
            writeln!(output, "**Examples:**").unwrap();
            writeln!(output).unwrap();
            for example in &doc.examples {
                writeln!(output, "```python").unwrap();
                writeln!(output, "{}", example).unwrap();
                writeln!(output, "```").unwrap();
            }
            writeln!(output).unwrap();
        }

        for kind in [
            Admonition::Note,
            Admonition::Info,
            Admonition::Warn,
            Admonition::Tip,
        ] {
            let bodies: Vec<&str> = doc
                .admonitions
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, body)| body.as_str())
                .collect();
            if bodies.is_empty() {
                continue;
            }
            writeln!(output, ":::{}", kind.directive()).unwrap();
            for body in bodies {
                writeln!(output, "{}", body).unwrap();
                writeln!(output).unwrap();
            }
            writeln!(output, ":::").unwrap();
            writeln!(output).unwrap();
        }
    }
}

/// ` - <short description>` after a TOC entry
fn write_summary(output: &mut String, doc: Option<&Docstring>) {
    if let Some(short) = doc.and_then(|d| d.short_description.as_ref()) {
        write!(output, " - {}", escape_markdown(short, true)).unwrap();
    }
    writeln!(output).unwrap();
}

/// Collapse trailing blank lines to a single newline
fn finish(mut output: String) -> String {
    let trimmed = output.trim_end().len();
    output.truncate(trimmed);
    output.push('\n');
    output
}
