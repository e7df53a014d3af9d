//! Go interface extraction for fake generation.
//!
//! - `walker` turns Go source files into the `model` (interfaces, methods,
//!   type expressions) using the `interfake-syntax` parser.
//! - `resolver` and `package` stand in for the Go build system: import path
//!   to package name lookup, and the file list of a package directory.
//! - `seek_interface` / `find_interface` pick the target out of the result.

pub mod error;
pub mod model;
pub mod package;
pub mod resolver;
pub mod walker;

pub use error::{Error, Result};
pub use model::{
    ChanDir, Interface, Method, PackagePathSet, PackageTable, Parameter, SourceFile, TypeExpr,
};
pub use package::{parse_package_dir, PackageDir};
pub use resolver::{GoEnv, GoEnvResolver, NullResolver, PackageResolver, StaticResolver};
pub use walker::Walker;

/// An interface found among walked files, with where it was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<'a> {
    pub interface: &'a Interface,
    pub package_name: &'a str,
    /// Empty when the declaring directory's import path is unknown.
    pub import_path: &'a str,
}

/// First interface named `name`, with its file's package name.
pub fn seek_interface<'a>(files: &'a [SourceFile], name: &str) -> Option<(&'a Interface, &'a str)> {
    files.iter().find_map(|file| {
        file.interfaces
            .iter()
            .find(|intf| intf.name == name)
            .map(|intf| (intf, file.package_name.as_str()))
    })
}

/// Like `seek_interface`, but a missing interface is an `Error::NotFound`.
pub fn find_interface<'a>(
    files: &'a [SourceFile],
    name: &str,
    import_path: &'a str,
) -> Result<Located<'a>> {
    let (interface, package_name) = seek_interface(files, name).ok_or_else(|| Error::NotFound {
        name: name.to_string(),
    })?;
    Ok(Located {
        interface,
        package_name,
        import_path,
    })
}
