//! Project-wide documentation generation
//!
//! Ties the phases together: crawl the package (filling the registry), then
//! freeze the registry and render every page through one cross-linker.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::crawl::{crawl_package, CrawlError};
use crate::crosslink::CrossLinker;
use crate::extractor::ExtractOptions;
use crate::layout::SiteLayout;
use crate::markdown::MarkdownRenderer;
use crate::registry::SymbolRegistry;
use crate::runtime::{LiveLookup, PythonLiveLookup};
use crate::site::{Page, Site};
use crate::types::Package;

/// A crawled package together with its symbol registry
#[derive(Debug, Clone)]
pub struct Project {
    pub package: Package,
    pub registry: SymbolRegistry,
    pub layout: SiteLayout,
}

impl Project {
    /// Crawl the package at `path`
    pub fn crawl(path: &Path, config: &Config) -> Result<Self, CrawlError> {
        let mut registry = SymbolRegistry::new(config.tie_break);
        let options = ExtractOptions {
            include_private: config.include_private,
        };
        let package = crawl_package(path, options, &mut registry)?;
        let layout = SiteLayout::new(&package);
        Ok(Self {
            package,
            registry,
            layout,
        })
    }

    /// Render all pages, using a Python interpreter for runtime lookup
    /// when the configuration enables it
    pub fn render(&self, config: &Config) -> Site {
        if config.runtime {
            let mut live =
                PythonLiveLookup::new(&config.python, &self.package.path, &self.package.name);
            self.render_with(config, Some(&mut live))
        } else {
            self.render_with(config, None)
        }
    }

    /// Render all pages with an explicit runtime lookup
    pub fn render_with<'a>(
        &'a self,
        config: &Config,
        live: Option<&'a mut dyn LiveLookup>,
    ) -> Site {
        let mut linker = CrossLinker::new(&self.registry, &self.layout);
        if let Some(live) = live {
            linker = linker.with_live_lookup(live);
        }
        let mut renderer = MarkdownRenderer::new(&mut linker);

        let mut pages = vec![Page {
            path: PathBuf::from("index.md"),
            content: renderer.render_index(&self.package, &self.layout, &config.title),
        }];
        let mut seen: HashSet<PathBuf> = pages.iter().map(|p| p.path.clone()).collect();

        for module in &self.package.modules {
            if module.fully_qualified_name == self.package.name {
                continue;
            }
            let path = self.layout.file_path(&module.fully_qualified_name);
            if !seen.insert(path.clone()) {
                warn!(
                    module = %module.fully_qualified_name,
                    path = %path.display(),
                    "page path already taken, skipping module"
                );
                continue;
            }
            pages.push(Page {
                path,
                content: renderer.render_page(module),
            });
        }

        debug!(pages = pages.len(), resolutions = linker.cache_len(), "rendered site");
        Site { pages }
    }
}
