//! Well-known external symbols
//!
//! A fixed table of builtin types, common exceptions and typing constructs
//! that link to the Python documentation. Consulted only after the registry
//! and the runtime lookup have failed.

const DOCS: &str = "https://docs.python.org/3/library";

/// An external documentation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub url: String,
    /// Canonical qualified name, e.g. `typing.Optional`
    pub display: &'static str,
}

/// (name, page and fragment under the library docs, display name)
const CATALOG: &[(&str, &str, &str)] = &[
    ("int", "functions.html#int", "int"),
    ("float", "functions.html#float", "float"),
    ("complex", "functions.html#complex", "complex"),
    ("str", "stdtypes.html#str", "str"),
    ("bool", "functions.html#bool", "bool"),
    ("bytes", "stdtypes.html#bytes", "bytes"),
    ("bytearray", "stdtypes.html#bytearray", "bytearray"),
    ("list", "stdtypes.html#list", "list"),
    ("dict", "stdtypes.html#dict", "dict"),
    ("tuple", "stdtypes.html#tuple", "tuple"),
    ("set", "stdtypes.html#set", "set"),
    ("frozenset", "stdtypes.html#frozenset", "frozenset"),
    ("range", "stdtypes.html#range", "range"),
    ("object", "functions.html#object", "object"),
    ("type", "functions.html#type", "type"),
    ("None", "constants.html#None", "None"),
    ("NoneType", "constants.html#None", "None"),
    ("Ellipsis", "constants.html#Ellipsis", "Ellipsis"),
    ("NotImplemented", "constants.html#NotImplemented", "NotImplemented"),
    ("Any", "typing.html#typing.Any", "typing.Any"),
    ("Optional", "typing.html#typing.Optional", "typing.Optional"),
    ("Union", "typing.html#typing.Union", "typing.Union"),
    ("Callable", "typing.html#typing.Callable", "typing.Callable"),
    ("Literal", "typing.html#typing.Literal", "typing.Literal"),
    ("TypeVar", "typing.html#typing.TypeVar", "typing.TypeVar"),
    ("Generic", "typing.html#typing.Generic", "typing.Generic"),
    ("Protocol", "typing.html#typing.Protocol", "typing.Protocol"),
    ("ClassVar", "typing.html#typing.ClassVar", "typing.ClassVar"),
    ("Final", "typing.html#typing.Final", "typing.Final"),
    ("TypedDict", "typing.html#typing.TypedDict", "typing.TypedDict"),
    ("NamedTuple", "typing.html#typing.NamedTuple", "typing.NamedTuple"),
    ("List", "typing.html#typing.List", "typing.List"),
    ("Dict", "typing.html#typing.Dict", "typing.Dict"),
    ("Tuple", "typing.html#typing.Tuple", "typing.Tuple"),
    ("Set", "typing.html#typing.Set", "typing.Set"),
    ("Type", "typing.html#typing.Type", "typing.Type"),
    ("Iterable", "collections.abc.html#collections.abc.Iterable", "collections.abc.Iterable"),
    ("Iterator", "collections.abc.html#collections.abc.Iterator", "collections.abc.Iterator"),
    ("Generator", "collections.abc.html#collections.abc.Generator", "collections.abc.Generator"),
    ("Sequence", "collections.abc.html#collections.abc.Sequence", "collections.abc.Sequence"),
    ("Mapping", "collections.abc.html#collections.abc.Mapping", "collections.abc.Mapping"),
    ("MutableMapping", "collections.abc.html#collections.abc.MutableMapping", "collections.abc.MutableMapping"),
    ("Awaitable", "collections.abc.html#collections.abc.Awaitable", "collections.abc.Awaitable"),
    ("Exception", "exceptions.html#Exception", "Exception"),
    ("BaseException", "exceptions.html#BaseException", "BaseException"),
    ("ValueError", "exceptions.html#ValueError", "ValueError"),
    ("TypeError", "exceptions.html#TypeError", "TypeError"),
    ("KeyError", "exceptions.html#KeyError", "KeyError"),
    ("IndexError", "exceptions.html#IndexError", "IndexError"),
    ("AttributeError", "exceptions.html#AttributeError", "AttributeError"),
    ("RuntimeError", "exceptions.html#RuntimeError", "RuntimeError"),
    ("NotImplementedError", "exceptions.html#NotImplementedError", "NotImplementedError"),
    ("OSError", "exceptions.html#OSError", "OSError"),
    ("IOError", "exceptions.html#OSError", "OSError"),
    ("FileNotFoundError", "exceptions.html#FileNotFoundError", "FileNotFoundError"),
    ("PermissionError", "exceptions.html#PermissionError", "PermissionError"),
    ("ImportError", "exceptions.html#ImportError", "ImportError"),
    ("StopIteration", "exceptions.html#StopIteration", "StopIteration"),
    ("TimeoutError", "exceptions.html#TimeoutError", "TimeoutError"),
    ("ZeroDivisionError", "exceptions.html#ZeroDivisionError", "ZeroDivisionError"),
    ("Path", "pathlib.html#pathlib.Path", "pathlib.Path"),
    ("datetime", "datetime.html#datetime.datetime", "datetime.datetime"),
    ("Enum", "enum.html#enum.Enum", "enum.Enum"),
];

/// Exact-match lookup of a bare identifier
pub fn lookup(name: &str) -> Option<CatalogEntry> {
    CATALOG
        .iter()
        .find(|(key, _, _)| *key == name)
        .map(|&(_, target, display)| CatalogEntry {
            url: format!("{}/{}", DOCS, target),
            display,
        })
}

/// Top-level standard library modules with pages under `docs.python.org`
const STDLIB_MODULES: &[&str] = &[
    "abc", "argparse", "array", "asyncio", "base64", "bisect", "builtins", "collections",
    "concurrent", "contextlib", "copy", "csv", "dataclasses", "datetime", "decimal", "enum",
    "functools", "glob", "hashlib", "heapq", "http", "importlib", "inspect", "io", "itertools",
    "json", "logging", "math", "multiprocessing", "operator", "os", "pathlib", "pickle",
    "queue", "random", "re", "shutil", "socket", "sqlite3", "string", "struct", "subprocess",
    "sys", "tempfile", "textwrap", "threading", "time", "types", "typing", "unittest", "urllib",
    "uuid", "warnings", "weakref", "xml", "zipfile",
];

/// True if the top-level segment of `module` is a standard library module
pub fn is_stdlib_module(module: &str) -> bool {
    let top = module.split('.').next().unwrap_or(module);
    STDLIB_MODULES.contains(&top)
}

/// External URL for `name` found at runtime in the stdlib module `location`
pub fn stdlib_url(location: &str, name: &str) -> Option<String> {
    let top = location.split('.').next().unwrap_or(location);
    is_stdlib_module(top).then(|| format!("{}/{}.html#{}.{}", DOCS, top, location, name))
}

/// External URL of the page for the stdlib module `module`
pub fn stdlib_module_url(module: &str) -> Option<String> {
    is_stdlib_module(module).then(|| format!("{}/{}.html", DOCS, module))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let int = lookup("int").unwrap();
        assert_eq!(int.display, "int");
        assert!(int.url.ends_with("#int"));
        assert_eq!(lookup("NoneType"), lookup("None"));
        assert_eq!(lookup("Optional").unwrap().display, "typing.Optional");
        assert!(lookup("Processor").is_none());
    }

    #[test]
    fn test_stdlib_url() {
        assert_eq!(
            stdlib_url("collections", "OrderedDict").as_deref(),
            Some("https://docs.python.org/3/library/collections.html#collections.OrderedDict")
        );
        assert!(stdlib_url("numpy", "ndarray").is_none());
        assert!(is_stdlib_module("os.path"));
        assert_eq!(
            stdlib_module_url("os.path").as_deref(),
            Some("https://docs.python.org/3/library/os.path.html")
        );
    }
}
