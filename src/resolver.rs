//! Import path -> package name resolution.
//!
//! The walker only needs one fact about an imported package: the name its
//! `package` clause declares. `PackageResolver` is the seam; `GoEnvResolver`
//! answers it from the file system the way `go build` lays packages out.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use crate::package;

pub trait PackageResolver {
    /// Declared name of the package at `import_path`, if it can be found.
    fn package_name(&self, import_path: &str) -> Option<String>;
}

impl<R: PackageResolver + ?Sized> PackageResolver for &R {
    fn package_name(&self, import_path: &str) -> Option<String> {
        (**self).package_name(import_path)
    }
}

impl<R: PackageResolver + ?Sized> PackageResolver for Box<R> {
    fn package_name(&self, import_path: &str) -> Option<String> {
        (**self).package_name(import_path)
    }
}

/// Resolves nothing; every unaliased import falls back to its path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl PackageResolver for NullResolver {
    fn package_name(&self, _import_path: &str) -> Option<String> {
        None
    }
}

/// Fixed table of import path -> package name.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    names: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, import_path: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(import_path.into(), name.into());
        self
    }
}

impl<P: Into<String>, N: Into<String>> FromIterator<(P, N)> for StaticResolver {
    fn from_iter<I: IntoIterator<Item = (P, N)>>(iter: I) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|(p, n)| (p.into(), n.into()))
                .collect(),
        }
    }
}

impl PackageResolver for StaticResolver {
    fn package_name(&self, import_path: &str) -> Option<String> {
        self.names.get(import_path).cloned()
    }
}

// =============================================================================
// Go environment
// =============================================================================

/// Source roots taken from the environment: `$GOPATH` (default `$HOME/go`)
/// and `$GOROOT`.
#[derive(Debug, Clone, Default)]
pub struct GoEnv {
    pub gopath: Vec<PathBuf>,
    pub goroot: Option<PathBuf>,
}

impl GoEnv {
    pub fn from_env() -> Self {
        let gopath = match env::var_os("GOPATH") {
            Some(list) if !list.is_empty() => env::split_paths(&list).collect(),
            _ => env::var_os("HOME")
                .map(|home| vec![PathBuf::from(home).join("go")])
                .unwrap_or_default(),
        };
        let goroot = env::var_os("GOROOT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self { gopath, goroot }
    }

    /// `src` directories in lookup order: `$GOROOT/src` first, then each
    /// `$GOPATH` entry.
    pub fn src_dirs(&self) -> Vec<PathBuf> {
        self.goroot
            .iter()
            .chain(&self.gopath)
            .map(|p| absolute(&p.join("src")))
            .collect()
    }

    /// Import path a package in `dir` would have: module path plus the
    /// directory relative to the module root, or the directory relative to a
    /// `src` root. Empty when neither applies.
    pub fn import_path_of(&self, dir: &Path) -> String {
        let dir = absolute(dir);
        if let Some(module) = Module::enclosing(&dir) {
            if let Some(rel) = relative_slash_path(&module.root, &dir) {
                return join_import_path(&module.path, &rel);
            }
        }
        for src in self.src_dirs() {
            if let Some(rel) = relative_slash_path(&src, &dir) {
                return rel;
            }
        }
        String::new()
    }
}

/// The `go.mod` enclosing a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub root: PathBuf,
    pub path: String,
}

impl Module {
    pub fn enclosing(dir: &Path) -> Option<Self> {
        dir.ancestors().find_map(|root| {
            let text = fs::read_to_string(root.join("go.mod")).ok()?;
            let path = module_directive(&text)?;
            Some(Self {
                root: root.to_path_buf(),
                path,
            })
        })
    }
}

/// Module path from the `module` directive of a `go.mod` file.
pub fn module_directive(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next()?.trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}

// =============================================================================
// File-system resolver
// =============================================================================

#[derive(Debug, Clone)]
struct SearchRoot {
    /// Import path prefix the root serves; empty matches everything.
    prefix: String,
    dir: PathBuf,
}

impl SearchRoot {
    fn candidate(&self, import_path: &str) -> Option<PathBuf> {
        let rest = if self.prefix.is_empty() {
            import_path
        } else if import_path == self.prefix {
            ""
        } else {
            import_path.strip_prefix(&self.prefix)?.strip_prefix('/')?
        };
        Some(rest.split('/').filter(|s| !s.is_empty()).fold(self.dir.clone(), |d, s| d.join(s)))
    }
}

/// Looks packages up like `go build` does from a given directory: `vendor/`
/// directories from the innermost outwards, the enclosing module, then
/// `$GOROOT/src` and `$GOPATH/src`.
#[derive(Debug, Clone)]
pub struct GoEnvResolver {
    roots: Vec<SearchRoot>,
}

impl GoEnvResolver {
    pub fn new(dir: &Path, env: &GoEnv) -> Self {
        let dir = absolute(dir);
        let mut roots = Vec::new();

        for ancestor in dir.ancestors() {
            let vendor = ancestor.join("vendor");
            if vendor.is_dir() {
                roots.push(SearchRoot {
                    prefix: String::new(),
                    dir: vendor,
                });
            }
        }
        if let Some(module) = Module::enclosing(&dir) {
            roots.push(SearchRoot {
                prefix: module.path,
                dir: module.root,
            });
        }
        for src in env.src_dirs() {
            roots.push(SearchRoot {
                prefix: String::new(),
                dir: src,
            });
        }

        debug!(dir = %dir.display(), roots = roots.len(), "package search roots");
        Self { roots }
    }

    /// Resolver for `dir` using `$GOPATH`/`$GOROOT` from the process.
    pub fn from_env(dir: &Path) -> Self {
        Self::new(dir, &GoEnv::from_env())
    }
}

impl PackageResolver for GoEnvResolver {
    fn package_name(&self, import_path: &str) -> Option<String> {
        for root in &self.roots {
            let Some(dir) = root.candidate(import_path) else {
                continue;
            };
            trace!(import_path, dir = %dir.display(), "probing");
            let Ok(files) = package::go_files(&dir) else {
                continue;
            };
            for file in files {
                let Ok(src) = fs::read_to_string(&file) else {
                    continue;
                };
                if let Some(name) = interfake_syntax::package_name_of(&src) {
                    debug!(import_path, name, "resolved package name");
                    return Some(name.to_string());
                }
            }
        }
        None
    }
}

// =============================================================================
// Path helpers
// =============================================================================

pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Absolute directory containing `file`.
pub fn absolute_dir(file: &Path) -> PathBuf {
    let abs = absolute(file);
    match abs.parent() {
        Some(dir) => dir.to_path_buf(),
        None => abs,
    }
}

/// `path` relative to `base` with `/` separators, if `path` is inside `base`.
pub(crate) fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(s) => parts.push(s.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

fn join_import_path(base: &str, rel: &str) -> String {
    match (base.is_empty(), rel.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => rel.to_string(),
        (false, false) => format!("{base}/{rel}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_directive_forms() {
        assert_eq!(
            module_directive("// comment\nmodule example.com/m // trailing\n\ngo 1.22\n"),
            Some("example.com/m".to_string())
        );
        assert_eq!(
            module_directive("module \"quoted/path\"\n"),
            Some("quoted/path".to_string())
        );
        assert_eq!(module_directive("modules x\n"), None);
        assert_eq!(module_directive("go 1.22\n"), None);
    }

    #[test]
    fn search_root_candidates() {
        let any = SearchRoot {
            prefix: String::new(),
            dir: PathBuf::from("/src"),
        };
        assert_eq!(any.candidate("a/b"), Some(PathBuf::from("/src/a/b")));

        let module = SearchRoot {
            prefix: "example.com/m".into(),
            dir: PathBuf::from("/work/m"),
        };
        assert_eq!(module.candidate("example.com/m"), Some(PathBuf::from("/work/m")));
        assert_eq!(
            module.candidate("example.com/m/store"),
            Some(PathBuf::from("/work/m/store"))
        );
        assert_eq!(module.candidate("example.com/mx"), None);
    }

    #[test]
    fn static_and_null_resolvers() {
        let r: StaticResolver = [("io", "io"), ("gopkg.in/yaml.v3", "yaml")]
            .into_iter()
            .collect();
        assert_eq!(r.package_name("gopkg.in/yaml.v3").as_deref(), Some("yaml"));
        assert_eq!(r.package_name("fmt"), None);
        assert_eq!(NullResolver.package_name("io"), None);
    }
}
