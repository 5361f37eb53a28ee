//! Generated pages and writing them to disk

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Errors raised while writing the output tree
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("failed to create directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One Markdown page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Path relative to the output directory, e.g. `utils/helpers.md`
    pub path: PathBuf,
    pub content: String,
}

/// Every page of a generated reference
#[derive(Debug, Clone, Default)]
pub struct Site {
    pub pages: Vec<Page>,
}

impl Site {
    /// Find a page by its relative path
    pub fn page(&self, path: impl AsRef<Path>) -> Option<&Page> {
        let path = path.as_ref();
        self.pages.iter().find(|p| p.path == path)
    }

    /// Write all pages under `dir`, returning the files written
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>, SiteError> {
        let mut written = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let path = dir.join(&page.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| SiteError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, &page.content).map_err(|source| SiteError::Write {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "wrote page");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site {
            pages: vec![
                Page {
                    path: PathBuf::from("index.md"),
                    content: "# index\n".to_string(),
                },
                Page {
                    path: PathBuf::from("sub/deep/page.md"),
                    content: "# page\n".to_string(),
                },
            ],
        };

        let written = site.write(dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("sub/deep/page.md")).unwrap(),
            "# page\n"
        );
        assert!(site.page("index.md").is_some());
        assert!(site.page("missing.md").is_none());
    }

    #[test]
    fn test_write_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("sub");
        fs::write(&blocker, "a file, not a directory").unwrap();
        let site = Site {
            pages: vec![Page {
                path: PathBuf::from("sub/page.md"),
                content: String::new(),
            }],
        };

        let err = site.write(dir.path()).unwrap_err();
        assert!(matches!(err, SiteError::CreateDir { ref path, .. } if path == &blocker));
    }
}
