//! Types for representing a crawled Python package

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::docstring::Docstring;

/// Flag shown before functions and methods
pub const FUNC_FLAG: &str = "🅵";
/// Flag shown before classes
pub const CLASS_FLAG: &str = "🅲";
/// Flag shown before modules
pub const MODULE_FLAG: &str = "🅼";
/// Flag shown before constants and attributes
pub const ATTR_FLAG: &str = "🅰";

/// Kind of a documented symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    Method,
    Constant,
    Unknown,
}

impl SymbolKind {
    /// Tag used as the first half of an in-page anchor (`#<tag>-<name>`)
    pub fn anchor_tag(self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Class => "class",
            SymbolKind::Function | SymbolKind::Method => "function",
            SymbolKind::Constant => "constant",
            SymbolKind::Unknown => "symbol",
        }
    }

    /// Visual flag rendered in front of links and headings
    pub fn flag(self) -> &'static str {
        match self {
            SymbolKind::Module => MODULE_FLAG,
            SymbolKind::Class => CLASS_FLAG,
            SymbolKind::Function | SymbolKind::Method => FUNC_FLAG,
            SymbolKind::Constant | SymbolKind::Unknown => ATTR_FLAG,
        }
    }

    /// Modules, functions and methods are never the answer to a type reference
    pub fn is_callable_or_module(self) -> bool {
        matches!(
            self,
            SymbolKind::Module | SymbolKind::Function | SymbolKind::Method
        )
    }

    /// Get the display name for the kind
    pub fn display_name(self) -> &'static str {
        match self {
            SymbolKind::Module => "Module",
            SymbolKind::Class => "Class",
            SymbolKind::Function => "Function",
            SymbolKind::Method => "Method",
            SymbolKind::Constant => "Constant",
            SymbolKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.display_name().to_lowercase())
    }
}

/// Last dotted segment of a fully-qualified name
pub fn short_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}

/// Everything before the last dotted segment, if there is one
pub fn parent_name(fqn: &str) -> Option<&str> {
    fqn.rsplit_once('.').map(|(parent, _)| parent)
}

/// A crawled package: the root name plus every module under it
#[derive(Debug, Clone)]
pub struct Package {
    /// Directory the package was crawled from
    pub path: PathBuf,
    /// Directory name, which is also the root fully-qualified name
    pub name: String,
    /// All modules, sorted by fully-qualified name
    pub modules: Vec<Module>,
}

impl Package {
    /// The `__init__` module of the package itself
    pub fn root_module(&self) -> Option<&Module> {
        self.modules
            .iter()
            .find(|m| m.fully_qualified_name == self.name)
    }

    /// Find a module by fully-qualified name
    pub fn module(&self, fqn: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.fully_qualified_name == fqn)
    }
}

/// A Python module (a `.py` file or a package `__init__.py`)
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub path: PathBuf,
    /// Final name segment (file stem, or the directory name for packages)
    pub name: String,
    /// e.g. `pkg.sub.module`, or `pkg` for the package root
    pub fully_qualified_name: String,
    /// True for `__init__.py` modules
    pub is_package: bool,
    pub docstring: Option<Docstring>,
    pub constants: Vec<Constant>,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    /// Names listed in `__all__`
    pub exports: Vec<String>,
    /// Local name -> fully-qualified name it was imported as
    pub aliases: BTreeMap<String, String>,
}

impl Module {
    /// Create an empty module
    pub fn new(path: impl Into<PathBuf>, fully_qualified_name: impl Into<String>) -> Self {
        let fully_qualified_name = fully_qualified_name.into();
        Self {
            path: path.into(),
            name: short_name(&fully_qualified_name).to_string(),
            fully_qualified_name,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
            && self.functions.is_empty()
            && self.classes.is_empty()
            && self.exports.is_empty()
    }
}

/// A class definition
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    /// e.g. `pkg.module.Outer.Inner`
    pub fully_qualified_name: String,
    /// Header line such as `class Foo(Base):`
    pub signature: String,
    pub docstring: Option<Docstring>,
    /// Methods
    pub functions: Vec<Function>,
    /// Nested classes
    pub classes: Vec<Class>,
}

/// A function or method definition
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// e.g. `pkg.module.Class.method`
    pub fully_qualified_name: String,
    /// Header such as `def run(self, x: int) -> str:`
    pub signature: String,
    pub docstring: Option<Docstring>,
}

/// A module-level constant (an ALL-CAPS assignment)
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub fully_qualified_name: String,
    /// Source text of the assigned value
    pub value: String,
    /// Annotation or `# type:` comment, if any
    pub type_name: Option<String>,
    /// Trailing comment or attribute docstring
    pub comment: Option<String>,
}
