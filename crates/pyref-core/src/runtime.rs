//! Best-effort runtime lookup
//!
//! When a name is not in the registry, the resolver may ask a live Python
//! interpreter what the name refers to. The [`LiveLookup`] trait is the port;
//! [`PythonLiveLookup`] spawns an interpreter and [`StaticLiveLookup`] serves
//! a fixed table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::types::{short_name, SymbolKind};

/// What a name turned out to be at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSymbol {
    pub kind: SymbolKind,
    /// `__module__` of the object, or the module's own name for modules
    pub location: String,
    /// `__qualname__` of the object, which differs from the attribute name
    /// for aliased imports
    pub name: String,
}

/// Capability to classify names by importing modules
pub trait LiveLookup {
    /// Whether the package root can be imported at all.
    /// Implementations probe once and remember the answer.
    fn is_available(&mut self) -> bool;

    /// Classify `name` as an attribute of `module_fqn`
    fn lookup(&mut self, module_fqn: &str, name: &str) -> Option<RuntimeSymbol>;
}

const INSPECT_SCRIPT: &str = r#"
import importlib, inspect, json, sys
sys.path.insert(0, sys.argv[1])
module = importlib.import_module(sys.argv[2])
out = {}
def qualname(obj, name):
    real = getattr(obj, "__qualname__", None) or getattr(obj, "__name__", None)
    return real if isinstance(real, str) else name
for name in dir(module):
    try:
        obj = getattr(module, name)
    except Exception:
        continue
    if inspect.ismodule(obj):
        out[name] = ["module", obj.__name__, obj.__name__.rpartition(".")[2]]
    elif inspect.isclass(obj):
        out[name] = ["class", obj.__module__, qualname(obj, name)]
    elif inspect.ismethod(obj):
        where = getattr(obj, "__module__", None) or module.__name__
        out[name] = ["method", where, qualname(obj, name)]
    elif inspect.isfunction(obj) or inspect.isbuiltin(obj):
        where = getattr(obj, "__module__", None) or module.__name__
        out[name] = ["function", where, qualname(obj, name)]
    else:
        out[name] = ["constant", module.__name__, name]
print(json.dumps(out))
"#;

/// Attribute name to `(kind, location, qualified name)`
type Members = HashMap<String, (SymbolKind, String, String)>;

/// Runs a Python interpreter once per module and caches what it reports
#[derive(Debug)]
pub struct PythonLiveLookup {
    python: String,
    /// Directory containing the package, put first on `sys.path`
    search_path: PathBuf,
    root: String,
    available: Option<bool>,
    /// `None` records a module that failed to import
    modules: HashMap<String, Option<Members>>,
}

impl PythonLiveLookup {
    /// `package_dir` is the package directory itself; its parent goes on
    /// `sys.path` so that `import <root>` works.
    pub fn new(python: impl Into<String>, package_dir: &Path, root: impl Into<String>) -> Self {
        let search_path = package_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            python: python.into(),
            search_path,
            root: root.into(),
            available: None,
            modules: HashMap::new(),
        }
    }

    fn members(&mut self, module_fqn: &str) -> Option<&Members> {
        if !self.modules.contains_key(module_fqn) {
            let loaded = self.import(module_fqn);
            self.modules.insert(module_fqn.to_string(), loaded);
        }
        self.modules.get(module_fqn)?.as_ref()
    }

    fn import(&self, module_fqn: &str) -> Option<Members> {
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(INSPECT_SCRIPT)
            .arg(&self.search_path)
            .arg(module_fqn)
            .stdin(Stdio::null())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                debug!(
                    module = module_fqn,
                    python = %self.python,
                    error = %err,
                    "could not start interpreter"
                );
                return None;
            }
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(
                module = module_fqn,
                error = stderr.lines().last().unwrap_or_default(),
                "runtime import failed"
            );
            return None;
        }

        match serde_json::from_slice::<Members>(&output.stdout) {
            Ok(members) => {
                debug!(module = module_fqn, members = members.len(), "imported module");
                Some(members)
            }
            Err(err) => {
                debug!(module = module_fqn, error = %err, "unreadable introspection output");
                None
            }
        }
    }
}

impl LiveLookup for PythonLiveLookup {
    fn is_available(&mut self) -> bool {
        if let Some(available) = self.available {
            return available;
        }
        let root = self.root.clone();
        let available = self.members(&root).is_some();
        self.available = Some(available);
        available
    }

    fn lookup(&mut self, module_fqn: &str, name: &str) -> Option<RuntimeSymbol> {
        let (kind, location, name) = self.members(module_fqn)?.get(name)?.clone();
        Some(RuntimeSymbol {
            kind,
            location,
            name,
        })
    }
}

/// Table-backed lookup
#[derive(Debug, Clone, Default)]
pub struct StaticLiveLookup {
    available: bool,
    entries: HashMap<(String, String), RuntimeSymbol>,
}

impl StaticLiveLookup {
    /// An available lookup with no entries
    pub fn new() -> Self {
        Self {
            available: true,
            entries: HashMap::new(),
        }
    }

    /// A lookup whose root probe fails
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Add an entry for `module_fqn.name`, defined under the same name
    pub fn with(self, module_fqn: &str, name: &str, kind: SymbolKind, location: &str) -> Self {
        let real = match kind {
            SymbolKind::Module => short_name(location),
            _ => name,
        };
        self.with_alias(module_fqn, name, kind, location, real)
    }

    /// Add an entry for an attribute bound under a different name than
    /// the object's own, as `from x import Real as Local` does
    pub fn with_alias(
        mut self,
        module_fqn: &str,
        local: &str,
        kind: SymbolKind,
        location: &str,
        name: &str,
    ) -> Self {
        self.entries.insert(
            (module_fqn.to_string(), local.to_string()),
            RuntimeSymbol {
                kind,
                location: location.to_string(),
                name: name.to_string(),
            },
        );
        self
    }
}

impl LiveLookup for StaticLiveLookup {
    fn is_available(&mut self) -> bool {
        self.available
    }

    fn lookup(&mut self, module_fqn: &str, name: &str) -> Option<RuntimeSymbol> {
        if !self.available {
            return None;
        }
        self.entries
            .get(&(module_fqn.to_string(), name.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_lookup() {
        let mut live = StaticLiveLookup::new().with(
            "pkg.core",
            "OrderedDict",
            SymbolKind::Class,
            "collections",
        );
        assert!(live.is_available());
        assert_eq!(
            live.lookup("pkg.core", "OrderedDict"),
            Some(RuntimeSymbol {
                kind: SymbolKind::Class,
                location: "collections".to_string(),
                name: "OrderedDict".to_string(),
            })
        );
        assert!(live.lookup("pkg.core", "Missing").is_none());
    }

    #[test]
    fn test_static_lookup_keeps_real_name() {
        let mut live = StaticLiveLookup::new()
            .with_alias("pkg.core", "OD", SymbolKind::Class, "collections", "OrderedDict")
            .with("pkg.core", "json", SymbolKind::Module, "json");

        let found = live.lookup("pkg.core", "OD").unwrap();
        assert_eq!(found.name, "OrderedDict");
        assert_eq!(found.location, "collections");
        assert_eq!(live.lookup("pkg.core", "json").unwrap().name, "json");
    }

    #[test]
    fn test_unavailable_static_lookup() {
        let mut live = StaticLiveLookup::unavailable();
        assert!(!live.is_available());
    }

    #[test]
    fn test_missing_interpreter_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("pkg");
        let mut live = PythonLiveLookup::new("pyref-no-such-python", &package, "pkg");
        assert!(!live.is_available());
        // cached as absent, no retry
        assert!(live.lookup("pkg", "anything").is_none());
        assert_eq!(live.modules.len(), 1);
    }
}
