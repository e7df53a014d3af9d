//! Go files of one package directory.
//!
//! Selection follows `go build` for the host platform, minus full build
//! constraint evaluation: only `//go:build ignore` excludes a file by its
//! contents.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::SourceFile;
use crate::resolver::{GoEnv, PackageResolver};
use crate::walker::Walker;

/// A directory imported as a Go package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDir {
    pub dir: PathBuf,
    /// Empty when the directory is outside any module or `src` root.
    pub import_path: String,
    /// Buildable, non-test `.go` files, sorted by name.
    pub go_files: Vec<PathBuf>,
}

impl PackageDir {
    pub fn import(dir: &Path) -> Result<Self> {
        Self::import_with(dir, &GoEnv::from_env())
    }

    pub fn import_with(dir: &Path, env: &GoEnv) -> Result<Self> {
        let go_files = go_files(dir)?;
        let import_path = env.import_path_of(dir);
        debug!(
            dir = %dir.display(),
            import_path = %import_path,
            files = go_files.len(),
            "imported package directory"
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            import_path,
            go_files,
        })
    }
}

/// Walks every buildable file of `dir`.
pub fn parse_package_dir<R: PackageResolver>(dir: &Path, resolver: R) -> Result<Vec<SourceFile>> {
    let pkg = PackageDir::import(dir)?;
    Walker::new(resolver).walk(&pkg.go_files, &pkg.import_path)
}

/// Buildable `.go` files directly inside `dir`, sorted by name.
pub fn go_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_go_source_name(name) || !matches_host(name) || path.is_dir() {
            continue;
        }
        let src = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        if is_ignored(&src) {
            debug!(file = %path.display(), "skipping //go:build ignore");
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn is_go_source_name(name: &str) -> bool {
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('_')
        && !name.starts_with('.')
}

// =============================================================================
// Platform filename suffixes
// =============================================================================

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Host `GOOS`.
pub fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Host `GOARCH`.
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        other => other,
    }
}

fn os_matches(want: &str, host: &str) -> bool {
    want == host
        || (want == "linux" && host == "android")
        || (want == "solaris" && host == "illumos")
        || (want == "darwin" && host == "ios")
}

fn matches_host(name: &str) -> bool {
    matches_platform(name, host_os(), host_arch())
}

/// Applies the `name_GOOS.go`, `name_GOARCH.go` and `name_GOOS_GOARCH.go`
/// conventions. The first underscore-separated element never counts.
pub fn matches_platform(name: &str, os: &str, arch: &str) -> bool {
    let stem = name.strip_suffix(".go").unwrap_or(name);
    let stem = stem.strip_suffix("_test").unwrap_or(stem);
    let parts: Vec<&str> = stem.split('_').skip(1).collect();

    match parts.as_slice() {
        [.., maybe_os, maybe_arch]
            if KNOWN_OS.contains(maybe_os) && KNOWN_ARCH.contains(maybe_arch) =>
        {
            os_matches(maybe_os, os) && *maybe_arch == arch
        }
        [.., last] if KNOWN_OS.contains(last) => os_matches(last, os),
        [.., last] if KNOWN_ARCH.contains(last) => *last == arch,
        _ => true,
    }
}

/// `//go:build ignore` (or the legacy `// +build ignore`) in the file header.
fn is_ignored(src: &str) -> bool {
    for line in src.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("/*") || line.starts_with('*') {
            continue;
        }
        if !line.starts_with("//") {
            return false;
        }
        let expr = line
            .strip_prefix("//go:build")
            .or_else(|| line.strip_prefix("// +build"));
        if let Some(expr) = expr {
            if expr.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '!'))
                .any(|word| word == "ignore")
            {
                return true;
            }
        }
    }
    false
}
