//! pyref Core - cross-linked Markdown API reference for Python packages
//!
//! This crate provides the core functionality:
//! - Lexer: Logical lines of Python source
//! - Extractor: Modules, classes, functions and constants from source
//! - Docstring: Google, NumPy and reST docstring parsing
//! - Registry: Index of every documented symbol
//! - Cross-linking: Resolution of symbol references to links
//! - Markdown: Page rendering and site output

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - logical lines of Python source
pub mod lexer;

/// Documented entities and symbol kinds
pub mod types;

/// Docstring parsing
pub mod docstring;

/// Extraction of documentation from one source file
pub mod extractor;

/// Package directory traversal
pub mod crawl;

/// Symbol registry - short name to fully-qualified bindings
pub mod registry;

/// Well-known external symbols
pub mod catalog;

/// Output path layout and relative links
pub mod layout;

/// Runtime lookup through a Python interpreter
pub mod runtime;

/// Cross-link resolution engine
pub mod crosslink;

/// Markdown rendering
pub mod markdown;

/// Generated pages
pub mod site;

/// Generator configuration
pub mod config;

/// Crawl and render a whole package
pub mod project;

pub use config::{Config, ConfigError};
pub use crawl::CrawlError;
pub use crosslink::{CrossLinker, Resolution};
pub use layout::{layout, relative_path, SiteLayout};
pub use project::Project;
pub use registry::{Binding, SymbolRegistry, TieBreak};
pub use runtime::{LiveLookup, PythonLiveLookup, StaticLiveLookup};
pub use site::{Page, Site, SiteError};
pub use types::{Package, SymbolKind};
