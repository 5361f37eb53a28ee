//! Output path layout
//!
//! Fully-qualified names map to extensionless page paths under the output
//! directory. Every link between pages is computed from these paths with
//! [`relative_path`], without touching the filesystem.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::types::Package;

/// Page name of the package root
pub const INDEX_PAGE: &str = "index";

/// Map a fully-qualified name to its output path, without extension.
///
/// The root segment is dropped and the rest joined with `/`, lowercased,
/// with `_` turned into `-`. A name whose last two segments are equal
/// (`pkg.foo.foo`) gets a trailing `-` so the file cannot clash with the
/// `foo/` directory next to it. The package root itself maps to `index`.
pub fn layout(fully_qualified_name: &str) -> String {
    let parts: Vec<&str> = fully_qualified_name.split('.').collect();
    if parts.len() < 2 {
        return INDEX_PAGE.to_string();
    }

    let mut path = parts[1..].join("/");
    if parts[parts.len() - 1] == parts[parts.len() - 2] {
        path.push('_');
    }
    path.to_lowercase().replace('_', "-")
}

/// Relative link from one page path to another.
///
/// The last segment of each path is the page itself; only the directories
/// before it take part in the shared-prefix walk. The result climbs out of
/// the unshared part of `from` with `../` and then descends into `to`.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segments: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segments: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let from_dir = &from_segments[..from_segments.len().saturating_sub(1)];
    let to_dir = &to_segments[..to_segments.len().saturating_sub(1)];

    let common = from_dir
        .iter()
        .zip(to_dir)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_dir.len() - common];
    parts.extend(&to_segments[common..]);
    parts.join("/")
}

/// Page paths for every module of one crawled package
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: String,
    packages: HashSet<String>,
}

impl SiteLayout {
    pub fn new(package: &Package) -> Self {
        Self {
            root: package.name.clone(),
            packages: package
                .modules
                .iter()
                .filter(|m| m.is_package)
                .map(|m| m.fully_qualified_name.clone())
                .collect(),
        }
    }

    /// Layout for a package with the given root name and subpackages
    pub fn from_parts(root: impl Into<String>, packages: impl IntoIterator<Item = String>) -> Self {
        Self {
            root: root.into(),
            packages: packages.into_iter().collect(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// True if the name is the root package or lives under it
    pub fn contains(&self, fully_qualified_name: &str) -> bool {
        fully_qualified_name == self.root
            || fully_qualified_name
                .strip_prefix(self.root.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Extensionless page path of a module; subpackages get `<dir>/index`
    pub fn page_path(&self, module_fqn: &str) -> String {
        if module_fqn == self.root {
            INDEX_PAGE.to_string()
        } else if self.packages.contains(module_fqn) {
            format!("{}/{}", layout(module_fqn), INDEX_PAGE)
        } else {
            layout(module_fqn)
        }
    }

    /// Output file of a module, relative to the output directory
    pub fn file_path(&self, module_fqn: &str) -> PathBuf {
        PathBuf::from(format!("{}.md", self.page_path(module_fqn)))
    }

    /// Link from one module's page to another's
    pub fn link_between(&self, from_module: &str, to_module: &str) -> String {
        relative_path(&self.page_path(from_module), &self.page_path(to_module))
    }
}
