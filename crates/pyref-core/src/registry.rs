//! Symbol registry
//!
//! Maps short names to every fully-qualified binding discovered while
//! crawling a package. The registry is filled once during the crawl and then
//! borrowed immutably by the resolver, so no lookup can observe a
//! half-populated index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{short_name, SymbolKind};

/// One known symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Last dotted segment of `fully_qualified_name`
    pub short_name: String,
    pub fully_qualified_name: String,
    pub kind: SymbolKind,
}

/// Order in which ambiguous candidates are returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Sort by fully-qualified name
    #[default]
    Lexicographic,
    /// Keep registration order
    Insertion,
}

/// Run-scoped index of all discovered symbol bindings
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    /// Short name -> bindings in registration order
    symbol_index: HashMap<String, Vec<Binding>>,
    tie_break: TieBreak,
    generation: u64,
}

impl SymbolRegistry {
    /// Create an empty registry
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            symbol_index: HashMap::new(),
            tie_break,
            generation: 0,
        }
    }

    /// Add a binding. Re-registering a known fully-qualified name replaces
    /// its kind and leaves other bindings under the same short name alone.
    pub fn register(&mut self, short: &str, fully_qualified_name: &str, kind: SymbolKind) {
        debug_assert_eq!(short, short_name(fully_qualified_name));
        self.generation += 1;

        let bindings = self.symbol_index.entry(short.to_string()).or_default();
        match bindings
            .iter_mut()
            .find(|b| b.fully_qualified_name == fully_qualified_name)
        {
            Some(existing) => existing.kind = kind,
            None => bindings.push(Binding {
                short_name: short.to_string(),
                fully_qualified_name: fully_qualified_name.to_string(),
                kind,
            }),
        }
    }

    /// Register a fully-qualified name under its own last segment
    pub fn register_fqn(&mut self, fully_qualified_name: &str, kind: SymbolKind) {
        self.register(short_name(fully_qualified_name), fully_qualified_name, kind);
    }

    /// Look up bindings for a short name.
    ///
    /// A single binding is returned unconditionally. With several, a binding
    /// living directly in `preferred_container` wins; otherwise the whole
    /// set comes back ordered by the configured tie-break.
    pub fn lookup(&self, short: &str, preferred_container: Option<&str>) -> Option<Vec<&Binding>> {
        let bindings = self.symbol_index.get(short).filter(|b| !b.is_empty())?;
        if bindings.len() == 1 {
            return Some(vec![&bindings[0]]);
        }

        if let Some(container) = preferred_container {
            let key = format!("{}.{}", container, short);
            if let Some(binding) = bindings.iter().find(|b| b.fully_qualified_name == key) {
                return Some(vec![binding]);
            }
        }

        Some(self.ordered(bindings))
    }

    /// Kind of an exact fully-qualified name, if registered
    pub fn kind_of(&self, fully_qualified_name: &str) -> Option<SymbolKind> {
        self.symbol_index
            .get(short_name(fully_qualified_name))?
            .iter()
            .find(|b| b.fully_qualified_name == fully_qualified_name)
            .map(|b| b.kind)
    }

    /// True if the exact fully-qualified name is a registered module
    pub fn is_module(&self, fully_qualified_name: &str) -> bool {
        self.kind_of(fully_qualified_name) == Some(SymbolKind::Module)
    }

    fn ordered<'a>(&self, bindings: &'a [Binding]) -> Vec<&'a Binding> {
        let mut out: Vec<_> = bindings.iter().collect();
        if self.tie_break == TieBreak::Lexicographic {
            out.sort_by(|a, b| a.fully_qualified_name.cmp(&b.fully_qualified_name));
        }
        out
    }

    /// All bindings, sorted by short name then fully-qualified name
    pub fn all_bindings(&self) -> Vec<&Binding> {
        let mut bindings: Vec<_> = self.symbol_index.values().flatten().collect();
        bindings.sort_by(|a, b| {
            a.short_name
                .cmp(&b.short_name)
                .then_with(|| a.fully_qualified_name.cmp(&b.fully_qualified_name))
        });
        bindings
    }

    /// Bindings of one kind
    pub fn bindings_by_kind(&self, kind: SymbolKind) -> Vec<&Binding> {
        self.all_bindings()
            .into_iter()
            .filter(|b| b.kind == kind)
            .collect()
    }

    /// Short names bound to more than one fully-qualified name, sorted
    pub fn ambiguous_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self
            .symbol_index
            .iter()
            .filter(|(_, b)| b.len() > 1)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.symbol_index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Incremented by every registration
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fqns(bindings: &[&Binding]) -> Vec<String> {
        bindings
            .iter()
            .map(|b| b.fully_qualified_name.clone())
            .collect()
    }

    #[test]
    fn test_single_binding_ignores_container() {
        let mut registry = SymbolRegistry::default();
        registry.register("Processor", "pkg.core.Processor", SymbolKind::Class);

        let found = registry.lookup("Processor", Some("pkg.other")).unwrap();
        assert_eq!(fqns(&found), vec!["pkg.core.Processor"]);
        assert!(registry.lookup("Missing", None).is_none());
    }

    #[test]
    fn test_preferred_container_disambiguates() {
        let mut registry = SymbolRegistry::default();
        registry.register("Config", "pkg.b.Config", SymbolKind::Class);
        registry.register("Config", "pkg.a.Config", SymbolKind::Class);

        let found = registry.lookup("Config", Some("pkg.b")).unwrap();
        assert_eq!(fqns(&found), vec!["pkg.b.Config"]);

        let ambiguous = registry.lookup("Config", Some("pkg.c")).unwrap();
        assert_eq!(fqns(&ambiguous), vec!["pkg.a.Config", "pkg.b.Config"]);
        assert_eq!(registry.ambiguous_names(), vec!["Config"]);
    }

    #[test]
    fn test_insertion_tie_break() {
        let mut registry = SymbolRegistry::new(TieBreak::Insertion);
        registry.register_fqn("pkg.b.Config", SymbolKind::Class);
        registry.register_fqn("pkg.a.Config", SymbolKind::Class);

        let found = registry.lookup("Config", None).unwrap();
        assert_eq!(fqns(&found), vec!["pkg.b.Config", "pkg.a.Config"]);
    }

    #[test]
    fn test_reregister_overwrites_kind() {
        let mut registry = SymbolRegistry::default();
        registry.register_fqn("pkg.core.load", SymbolKind::Unknown);
        registry.register_fqn("pkg.util.load", SymbolKind::Function);
        registry.register_fqn("pkg.core.load", SymbolKind::Function);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.kind_of("pkg.core.load"), Some(SymbolKind::Function));
        assert_eq!(registry.kind_of("pkg.util.load"), Some(SymbolKind::Function));
        assert_eq!(registry.generation(), 3);
    }

    #[test]
    fn test_bindings_by_kind() {
        let mut registry = SymbolRegistry::default();
        registry.register_fqn("pkg", SymbolKind::Module);
        registry.register_fqn("pkg.core", SymbolKind::Module);
        registry.register_fqn("pkg.core.MAX", SymbolKind::Constant);

        assert_eq!(registry.bindings_by_kind(SymbolKind::Module).len(), 2);
        assert!(registry.is_module("pkg.core"));
        assert!(!registry.is_module("pkg.core.MAX"));
    }
}
