//! Package crawling
//!
//! Walks a package directory, extracts every module and records each
//! documented symbol in the registry as it goes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::extractor::{should_include, DocExtractor, ExtractOptions};
use crate::registry::SymbolRegistry;
use crate::types::{Class, Module, Package, SymbolKind};

/// Errors that stop a crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("package path '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("package path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot derive a package name from '{}'", .0.display())]
    InvalidName(PathBuf),

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

const INIT_FILE: &str = "__init__.py";

/// Crawl the package at `path`, registering its symbols
pub fn crawl_package(
    path: &Path,
    options: ExtractOptions,
    registry: &mut SymbolRegistry,
) -> Result<Package, CrawlError> {
    if !path.exists() {
        return Err(CrawlError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(CrawlError::NotADirectory(path.to_path_buf()));
    }
    let name = path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .filter(|n| is_identifier(n))
        .ok_or_else(|| CrawlError::InvalidName(path.to_path_buf()))?;

    let mut crawler = Crawler {
        options,
        registry,
        modules: Vec::new(),
    };
    crawler.walk(path, &name)?;

    let mut modules = crawler.modules;
    modules.sort_by(|a, b| a.fully_qualified_name.cmp(&b.fully_qualified_name));
    debug!(package = %name, modules = modules.len(), symbols = registry.len(), "crawled package");

    Ok(Package {
        path: path.to_path_buf(),
        name,
        modules,
    })
}

struct Crawler<'r> {
    options: ExtractOptions,
    registry: &'r mut SymbolRegistry,
    modules: Vec<Module>,
}

impl Crawler<'_> {
    fn walk(&mut self, dir: &Path, fqn: &str) -> Result<(), CrawlError> {
        let io_error = |source| CrawlError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = fs::read_dir(dir)
            .map_err(io_error)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_error)?;
        entries.sort();

        let init = dir.join(INIT_FILE);
        if init.is_file() {
            self.add_module(&init, fqn, true);
        }

        for path in entries {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !should_include(stem, self.options.include_private) {
                debug!(path = %path.display(), "skipping private module");
                continue;
            }
            if path.is_file() {
                let is_python = path.extension().is_some_and(|ext| ext == "py");
                if is_python && stem != "__init__" && is_identifier(stem) {
                    self.add_module(&path, &format!("{}.{}", fqn, stem), false);
                }
            } else if path.is_dir() && is_identifier(stem) && path.join(INIT_FILE).is_file() {
                self.walk(&path, &format!("{}.{}", fqn, stem))?;
            }
        }
        Ok(())
    }

    fn add_module(&mut self, path: &Path, fqn: &str, is_package: bool) {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable file");
                return;
            }
        };
        let module = DocExtractor::extract(&source, path, fqn, is_package, self.options);
        self.register(&module);
        self.modules.push(module);
    }

    fn register(&mut self, module: &Module) {
        self.registry
            .register_fqn(&module.fully_qualified_name, SymbolKind::Module);
        for constant in &module.constants {
            self.registry
                .register_fqn(&constant.fully_qualified_name, SymbolKind::Constant);
        }
        for function in &module.functions {
            self.registry
                .register_fqn(&function.fully_qualified_name, SymbolKind::Function);
        }
        for class in &module.classes {
            self.register_class(class);
        }
    }

    fn register_class(&mut self, class: &Class) {
        self.registry
            .register_fqn(&class.fully_qualified_name, SymbolKind::Class);
        for method in &class.functions {
            self.registry
                .register_fqn(&method.fully_qualified_name, SymbolKind::Method);
        }
        for nested in &class.classes {
            self.register_class(nested);
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
