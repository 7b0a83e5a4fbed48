pub mod common;
pub mod go;
pub mod resolver;

pub use common::{GoFile, GoPackage};

use crate::errors::Result;
use std::path::Path;

/// Parser frontend trait: turns a package directory into the syntax model
/// the merge engine consumes.
pub trait PackageFrontend {
    /// Load every non-test source file of the package rooted at `dir`.
    fn load_package(&self, dir: &Path) -> Result<GoPackage>;
}
