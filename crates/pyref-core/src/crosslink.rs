//! Cross-linking for documentation
//!
//! This module resolves symbol references found in docstrings, annotations
//! and export lists to Markdown links. Resolution tries, in order:
//!
//! 1. the symbol registry, preferring the nearest enclosing scope
//! 2. a live runtime lookup, when the package root imports
//! 3. the catalog of well-known external names
//!
//! and otherwise leaves the text unlinked.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::catalog;
use crate::docstring::split_top_level;
use crate::layout::SiteLayout;
use crate::markdown::escape_markdown;
use crate::registry::{Binding, SymbolRegistry};
use crate::runtime::LiveLookup;
use crate::types::{parent_name, short_name, SymbolKind};

/// Outcome of resolving one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Relative page link, `#anchor`, or absolute URL
    pub link: Option<String>,
    pub kind: Option<SymbolKind>,
    /// Text to show for the reference
    pub display: String,
}

impl Resolution {
    fn unresolved(text: &str) -> Self {
        Self {
            link: None,
            kind: None,
            display: text.to_string(),
        }
    }

    /// Render as a Markdown link, or escaped text when unresolved
    pub fn to_markdown(&self) -> String {
        let text = escape_markdown(&self.display, true);
        match &self.link {
            Some(link) => format!("[{}]({})", text, link),
            None => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    current: String,
    text: String,
    alias: Option<String>,
    expect_non_callable: bool,
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*").expect("valid regex")
    })
}

/// Resolves references against a fully populated registry
pub struct CrossLinker<'a> {
    registry: &'a SymbolRegistry,
    layout: &'a SiteLayout,
    live: Option<&'a mut dyn LiveLookup>,
    live_available: Option<bool>,
    cache: HashMap<CacheKey, Resolution>,
    /// Registry generation the cache was built against
    generation: u64,
}

impl<'a> CrossLinker<'a> {
    /// Create a cross-linker without runtime lookup.
    ///
    /// The registry stays borrowed for the linker's lifetime, so nothing can
    /// be registered while links are resolved and cached:
    ///
    /// ```compile_fail
    /// use pyref_core::{CrossLinker, SiteLayout, SymbolKind, SymbolRegistry};
    ///
    /// let mut registry = SymbolRegistry::default();
    /// registry.register_fqn("pkg", SymbolKind::Module);
    /// let layout = SiteLayout::from_parts("pkg", Vec::<String>::new());
    /// let mut linker = CrossLinker::new(&registry, &layout);
    /// registry.register_fqn("pkg.Late", SymbolKind::Class);
    /// linker.resolve("pkg", "Late", None, false);
    /// ```
    pub fn new(registry: &'a SymbolRegistry, layout: &'a SiteLayout) -> Self {
        Self {
            registry,
            layout,
            live: None,
            live_available: None,
            cache: HashMap::new(),
            generation: registry.generation(),
        }
    }

    /// Enable the runtime fallback
    pub fn with_live_lookup(mut self, live: &'a mut dyn LiveLookup) -> Self {
        self.live = Some(live);
        self
    }

    /// Number of memoized resolutions
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Resolve `symbol_text` as seen from `current_fqn`.
    ///
    /// `alias` is tried before the text itself. With `expect_non_callable`,
    /// registry or runtime hits on modules, functions and methods are only
    /// used when nothing else matches.
    pub fn resolve(
        &mut self,
        current_fqn: &str,
        symbol_text: &str,
        alias: Option<&str>,
        expect_non_callable: bool,
    ) -> Resolution {
        debug_assert_eq!(self.generation, self.registry.generation());

        let key = CacheKey {
            current: current_fqn.to_string(),
            text: symbol_text.to_string(),
            alias: alias.map(str::to_string),
            expect_non_callable,
        };
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let resolution =
            self.resolve_uncached(current_fqn, symbol_text, alias, expect_non_callable);
        debug!(
            current = current_fqn,
            symbol = symbol_text,
            link = resolution.link.as_deref().unwrap_or("-"),
            "resolved reference"
        );
        self.cache.insert(key, resolution.clone());
        resolution
    }

    fn resolve_uncached(
        &mut self,
        current_fqn: &str,
        symbol_text: &str,
        alias: Option<&str>,
        expect_non_callable: bool,
    ) -> Resolution {
        let text = symbol_text.trim();
        if text.is_empty() {
            return Resolution::unresolved(symbol_text);
        }
        let mut fallback = None;

        // 1. registry
        for name in alias.into_iter().chain(std::iter::once(text)) {
            if let Some(binding) =
                self.registry_match(current_fqn, name, expect_non_callable, &mut fallback)
            {
                return self.in_tree(current_fqn, &binding.fully_qualified_name, binding.kind, text);
            }
        }

        // 2. runtime
        if let Some(resolution) =
            self.runtime_match(current_fqn, text, expect_non_callable, &mut fallback)
        {
            return resolution;
        }

        // 3. catalog
        if let Some(entry) = catalog_match(text) {
            return Resolution {
                link: Some(entry.url),
                kind: Some(SymbolKind::Class),
                display: entry.display.to_string(),
            };
        }

        match fallback {
            Some(resolution) => Resolution {
                display: text.to_string(),
                ..resolution
            },
            None => Resolution::unresolved(symbol_text),
        }
    }

    /// Registry candidates for `name`, nearest enclosing scope first
    fn registry_match(
        &self,
        current_fqn: &str,
        name: &str,
        expect_non_callable: bool,
        fallback: &mut Option<Resolution>,
    ) -> Option<Binding> {
        let candidates: Vec<&Binding> = if let Some((prefix, short)) = name.rsplit_once('.') {
            // written qualified: the prefix must match
            let suffix = format!(".{}", name);
            self.registry
                .lookup(short, Some(prefix))?
                .into_iter()
                .filter(|b| {
                    b.fully_qualified_name == name || b.fully_qualified_name.ends_with(&suffix)
                })
                .collect()
        } else {
            let mut scope = Some(current_fqn);
            let mut found = None;
            while let Some(container) = scope {
                let bindings = self.registry.lookup(name, Some(container))?;
                if bindings.len() == 1 {
                    found = Some(bindings);
                    break;
                }
                scope = parent_name(container);
            }
            match found {
                Some(mut bindings) => {
                    // a scoped callable should not hide a type elsewhere
                    if expect_non_callable {
                        bindings.extend(self.registry.lookup(name, None).unwrap_or_default());
                    }
                    bindings
                }
                None => self.registry.lookup(name, None)?,
            }
        };

        if !expect_non_callable {
            return candidates.first().map(|b| (*b).clone());
        }
        if let Some(binding) = candidates.iter().find(|b| !b.kind.is_callable_or_module()) {
            return Some((*binding).clone());
        }
        if fallback.is_none() {
            if let Some(first) = candidates.first() {
                *fallback = Some(self.in_tree(
                    current_fqn,
                    &first.fully_qualified_name,
                    first.kind,
                    name,
                ));
            }
        }
        None
    }

    fn runtime_match(
        &mut self,
        current_fqn: &str,
        text: &str,
        expect_non_callable: bool,
        fallback: &mut Option<Resolution>,
    ) -> Option<Resolution> {
        let module = match parent_name(text) {
            Some(prefix) => prefix.to_string(),
            None => self.owning_module(current_fqn),
        };
        let short = short_name(text);

        let live = self.live.as_deref_mut()?;
        let available = *self.live_available.get_or_insert_with(|| live.is_available());
        if !available {
            return None;
        }
        let found = live.lookup(&module, short)?;

        // the object's own name, not the possibly aliased attribute
        let target = match found.kind {
            SymbolKind::Module => found.location.clone(),
            _ => format!("{}.{}", found.location, found.name),
        };
        let resolution = if self.layout.contains(&target) {
            self.in_tree(current_fqn, &target, found.kind, text)
        } else {
            let url = match found.kind {
                SymbolKind::Module => catalog::stdlib_module_url(&found.location)?,
                _ => catalog::stdlib_url(&found.location, &found.name)?,
            };
            Resolution {
                link: Some(url),
                kind: Some(found.kind),
                display: text.to_string(),
            }
        };

        if expect_non_callable && found.kind.is_callable_or_module() {
            if fallback.is_none() {
                *fallback = Some(resolution);
            }
            return None;
        }
        Some(resolution)
    }

    /// Link to a symbol documented somewhere in the generated tree
    fn in_tree(
        &self,
        current_fqn: &str,
        target_fqn: &str,
        kind: SymbolKind,
        text: &str,
    ) -> Resolution {
        let host = match kind {
            SymbolKind::Module => target_fqn.to_string(),
            SymbolKind::Class | SymbolKind::Constant | SymbolKind::Unknown => {
                // anchors on the module page, so drop the trailing `.name`
                let stripped = parent_name(target_fqn).unwrap_or(target_fqn);
                self.owning_module(stripped)
            }
            SymbolKind::Function | SymbolKind::Method => self.owning_module(target_fqn),
        };
        let current = self.owning_module(current_fqn);
        let anchor = format!(
            "{}-{}",
            kind.anchor_tag(),
            short_name(target_fqn).to_lowercase()
        );

        let link = if kind == SymbolKind::Module {
            self.layout.link_between(&current, &host)
        } else if host == current {
            format!("#{}", anchor)
        } else {
            format!("{}#{}", self.layout.link_between(&current, &host), anchor)
        };

        Resolution {
            link: Some(link),
            kind: Some(kind),
            display: text.to_string(),
        }
    }

    /// Nearest registered module at or above `fqn`
    fn owning_module(&self, fqn: &str) -> String {
        let mut scope = Some(fqn);
        while let Some(name) = scope {
            if self.registry.is_module(name) {
                return name.to_string();
            }
            scope = parent_name(name);
        }
        fqn.to_string()
    }

    /// Render a type annotation with every recognizable name linked.
    ///
    /// Top-level `|` alternatives are resolved independently and rejoined
    /// with `" | "`. Inside subscripts such as `dict[str, Foo]` each
    /// identifier is linked and the punctuation escaped.
    pub fn link_type(
        &mut self,
        current_fqn: &str,
        type_text: &str,
        aliases: &BTreeMap<String, String>,
    ) -> String {
        split_top_level(type_text, '|')
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| self.link_type_part(current_fqn, part, aliases))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn link_type_part(
        &mut self,
        current_fqn: &str,
        part: &str,
        aliases: &BTreeMap<String, String>,
    ) -> String {
        let mut out = String::new();
        let mut last = 0;
        for m in identifier_re().find_iter(part) {
            out.push_str(&escape_markdown(&part[last..m.start()], false));
            let name = m.as_str();
            let alias = alias_for(name, aliases);
            let resolution = self.resolve(current_fqn, name, alias.as_deref(), true);
            out.push_str(&resolution.to_markdown());
            last = m.end();
        }
        out.push_str(&escape_markdown(&part[last..], false));
        out
    }
}

/// Alias-table target for a possibly dotted local name
pub fn alias_for(name: &str, aliases: &BTreeMap<String, String>) -> Option<String> {
    if let Some(target) = aliases.get(name) {
        return Some(target.clone());
    }
    let (head, rest) = name.split_once('.')?;
    aliases.get(head).map(|target| format!("{}.{}", target, rest))
}

/// Exact catalog match, also accepting `typing.X` style qualified names
fn catalog_match(text: &str) -> Option<catalog::CatalogEntry> {
    catalog::lookup(text).or_else(|| {
        let (prefix, short) = text.rsplit_once('.')?;
        if catalog::is_stdlib_module(prefix) {
            catalog::lookup(short)
        } else {
            None
        }
    })
}
