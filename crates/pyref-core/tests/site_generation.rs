//! Integration tests for generating a reference site from a package on disk

use std::fs;
use std::path::{Path, PathBuf};

use pyref_core::{Config, Project, StaticLiveLookup, SymbolKind};

const INIT: &str = r#""""Sample package for testing docstring to markdown conversion.

The modules below use Google, reST and NumPy docstrings.
"""

from .core import DataProcessor
from .models import User as Account
from .utils import load_json

__all__ = ["DataProcessor", "Account", "load_json"]

VERSION = "1.0.0"
"#;

const CORE: &str = r#""""Core functionality module using Google-style docstrings."""

from typing import Optional

from .models import User

MAX_ITEMS: int = 100  # Maximum number of items processed at once


class DataProcessor:
    """Process batches of records.

    Attributes:
        owner (User): Who owns the processor.
    """

    def __init__(self, owner: User, limit: int = MAX_ITEMS):
        """Create a processor.

        Args:
            owner (User): Who owns the processor.
            limit (int): Batch size. Defaults to 100.
        """
        self.owner = owner

    def process(self, data: list[dict]) -> Optional[User]:
        """Process a batch.

        Args:
            data (list[dict]): Records to process.

        Returns:
            User | None: The user the batch belongs to.

        Raises:
            ValueError: If the batch is empty.
        """
        return None
"#;

const UTILS: &str = r#""""Utility functions module using ReST-style docstrings."""

import json


def load_json(path):
    """Load a JSON document.

    :param path: File to read.
    :type path: str
    :returns: The parsed document.
    :rtype: dict
    :raises FileNotFoundError: If the file does not exist.
    """
    with open(path) as f:
        return json.load(f)
"#;

const MODELS: &str = r#""""Data models using NumPy-style docstrings."""


class User:
    """A user of the system.

    Parameters
    ----------
    name : str
        Display name.
    processor : DataProcessor
        Processor bound to the user.
    """

    def __init__(self, name, processor=None):
        self.name = name
"#;

const HELPERS_INIT: &str = r#""""Helper subpackage."""
"#;

const HELPERS: &str = r#""""Helpers sharing their package's name."""


def slugify(text: str) -> str:
    """Slugify text.

    Args:
        text (str): Text to slugify.

    Returns:
        DataProcessor: Unrelated, but linked across directories.
    """
    return text
"#;

fn write_package(root: &Path) -> PathBuf {
    let package = root.join("sample_package");
    fs::create_dir_all(package.join("helpers")).unwrap();
    fs::write(package.join("__init__.py"), INIT).unwrap();
    fs::write(package.join("core.py"), CORE).unwrap();
    fs::write(package.join("utils.py"), UTILS).unwrap();
    fs::write(package.join("models.py"), MODELS).unwrap();
    fs::write(package.join("helpers/__init__.py"), HELPERS_INIT).unwrap();
    fs::write(package.join("helpers/helpers.py"), HELPERS).unwrap();
    package
}

fn offline_config() -> Config {
    Config {
        runtime: false,
        ..Config::default()
    }
}

#[test]
fn test_crawl_registers_every_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_package(dir.path());

    let project = Project::crawl(&package, &offline_config()).unwrap();

    assert_eq!(project.package.name, "sample_package");
    let modules: Vec<&str> = project
        .package
        .modules
        .iter()
        .map(|m| m.fully_qualified_name.as_str())
        .collect();
    assert_eq!(
        modules,
        vec![
            "sample_package",
            "sample_package.core",
            "sample_package.helpers",
            "sample_package.helpers.helpers",
            "sample_package.models",
            "sample_package.utils",
        ]
    );

    let registry = &project.registry;
    assert_eq!(
        registry.kind_of("sample_package.core.DataProcessor"),
        Some(SymbolKind::Class)
    );
    assert_eq!(
        registry.kind_of("sample_package.core.DataProcessor.process"),
        Some(SymbolKind::Method)
    );
    assert_eq!(
        registry.kind_of("sample_package.core.MAX_ITEMS"),
        Some(SymbolKind::Constant)
    );
    assert!(registry.is_module("sample_package.helpers.helpers"));

    let ambiguous = registry.ambiguous_names();
    assert!(ambiguous.contains(&"helpers"));
    assert!(ambiguous.contains(&"__init__"));
    assert!(!ambiguous.contains(&"DataProcessor"));
}

#[test]
fn test_site_layout_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_package(dir.path());
    let out = dir.path().join("docs");

    let config = offline_config();
    let project = Project::crawl(&package, &config).unwrap();
    let written = project.render(&config).write(&out).unwrap();

    let mut relative: Vec<PathBuf> = written
        .iter()
        .map(|p| p.strip_prefix(&out).unwrap().to_path_buf())
        .collect();
    relative.sort();
    assert_eq!(
        relative,
        vec![
            PathBuf::from("core.md"),
            PathBuf::from("helpers/helpers-.md"),
            PathBuf::from("helpers/index.md"),
            PathBuf::from("index.md"),
            PathBuf::from("models.md"),
            PathBuf::from("utils.md"),
        ]
    );
    for path in &written {
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("---\ntitle: "));
        assert!(content.ends_with('\n') && !content.ends_with("\n\n"));
    }
}

#[test]
fn test_index_page() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_package(dir.path());
    let config = Config {
        title: "Sample Reference".to_string(),
        ..offline_config()
    };

    let project = Project::crawl(&package, &config).unwrap();
    let site = project.render(&config);
    let index = &site.page("index.md").unwrap().content;

    assert!(index.starts_with("---\ntitle: Sample Reference\n---\n"));
    assert!(index.contains("# `sample_package`"));
    assert!(index.contains("- 🅼 Module"));
    assert!(index.contains("## Table of Contents"));
    assert!(index.contains("- 🅼 [sample\\_package.core](./core)"));
    assert!(index.contains("- 🅼 [sample\\_package.helpers](./helpers/index)"));
    assert!(index.contains("- 🅼 [sample\\_package.helpers.helpers](./helpers/helpers-)"));
    assert!(index.contains("Sample package for testing docstring to markdown conversion."));

    // exports resolve through the import table
    assert!(index.contains("## Exports {#exports}"));
    assert!(index.contains("- 🅲 [DataProcessor](core#class-dataprocessor)"));
    assert!(index.contains("- 🅲 [Account](models#class-user)"));
    assert!(index.contains("- 🅵 [load\\_json](utils#function-load_json)"));
}

#[test]
fn test_google_style_page() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_package(dir.path());
    let config = offline_config();

    let project = Project::crawl(&package, &config).unwrap();
    let site = project.render(&config);
    let core = &site.page("core.md").unwrap().content;

    assert!(core.starts_with("---\ntitle: core\n---\n"));
    assert!(core.contains("Core functionality module using Google-style docstrings."));
    assert!(core.contains("MAX_ITEMS: int = 100  # Maximum number of items processed at once"));
    assert!(core.contains("**Type:** [int](https://docs.python.org/3/library/functions.html#int)"));
    assert!(core.contains("### 🅲 DataProcessor {#class-dataprocessor}"));
    assert!(core.contains("def process(self, data: list[dict]) -> Optional[User]:"));

    // imported name links to the page that defines it
    assert!(core.contains("- **owner** ([User](models#class-user)): Who owns the processor."));
    assert!(core.contains("(default to `100`)"));
    assert!(core.contains(
        "[list](https://docs.python.org/3/library/stdtypes.html#list)\\[[dict](https://docs.python.org/3/library/stdtypes.html#dict)\\]"
    ));
    assert!(core.contains(
        "**[User](models#class-user) | [None](https://docs.python.org/3/library/constants.html#None)**: The user the batch belongs to."
    ));
    assert!(core.contains(
        "- **[ValueError](https://docs.python.org/3/library/exceptions.html#ValueError)**: If the batch is empty."
    ));
}

#[test]
fn test_rest_and_numpy_pages() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_package(dir.path());
    let config = offline_config();

    let project = Project::crawl(&package, &config).unwrap();
    let site = project.render(&config);

    let utils = &site.page("utils.md").unwrap().content;
    assert!(utils.contains("Utility functions module using ReST-style docstrings."));
    assert!(utils.contains(
        "- **path** ([str](https://docs.python.org/3/library/stdtypes.html#str)): File to read."
    ));
    assert!(utils.contains(
        "- **[dict](https://docs.python.org/3/library/stdtypes.html#dict)**: The parsed document."
    ));
    assert!(utils.contains(
        "[FileNotFoundError](https://docs.python.org/3/library/exceptions.html#FileNotFoundError)"
    ));

    let models = &site.page("models.md").unwrap().content;
    assert!(models.contains("### 🅲 User {#class-user}"));
    assert!(models.contains(
        "- **processor** ([DataProcessor](core#class-dataprocessor)): Processor bound to the user."
    ));
}

#[test]
fn test_links_across_directories() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_package(dir.path());
    let config = offline_config();

    let project = Project::crawl(&package, &config).unwrap();
    let site = project.render(&config);

    let helpers = &site.page("helpers/index.md").unwrap().content;
    assert!(helpers.starts_with("---\ntitle: helpers\n---\n"));
    assert!(helpers.contains("Helper subpackage."));

    let nested = &site.page("helpers/helpers-.md").unwrap().content;
    assert!(nested.contains("{#function-slugify}"));
    assert!(nested.contains(
        "**[DataProcessor](../core#class-dataprocessor)**: Unrelated, but linked across directories."
    ));
}

#[test]
fn test_runtime_lookup_fills_registry_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let package = dir.path().join("pkg");
    fs::create_dir_all(&package).unwrap();
    fs::write(
        package.join("__init__.py"),
        r#""""Runtime lookup."""

from collections import OrderedDict


def build(items):
    """Build a mapping.

    Returns:
        OrderedDict: The mapping.
    """
"#,
    )
    .unwrap();

    let config = Config::default();
    let project = Project::crawl(&package, &config).unwrap();
    let mut live =
        StaticLiveLookup::new().with("pkg", "OrderedDict", SymbolKind::Class, "collections");
    let site = project.render_with(&config, Some(&mut live));

    let index = &site.page("index.md").unwrap().content;
    assert!(index.contains(
        "**[OrderedDict](https://docs.python.org/3/library/collections.html#collections.OrderedDict)**: The mapping."
    ));
}
