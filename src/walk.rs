use crate::errors::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// File extension of Go sources.
const GO_EXTENSION: &str = "go";

/// Files the Go toolchain never compiles into the package itself.
const DEFAULT_EXCLUDES: &[&str] = &["*_test.go"];

/// Discover the Go source files of the package in `dir`.
///
/// - Only direct children of `dir` (Go packages are not recursive)
/// - Excludes `*_test.go`
/// - Does not apply `.gitignore`; the Go toolchain does not either
/// - Returns sorted paths for deterministic output
pub fn discover_package_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let exclude_set = default_exclude_set()?;

    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .max_depth(Some(1))
        .build();

    let mut files = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let path = entry.path();

        // Only consider files
        if !path.is_file() {
            continue;
        }

        let ext_match = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == GO_EXTENSION);
        if !ext_match {
            continue;
        }

        // Check just the filename for patterns like *_test.go
        if let Some(fname) = path.file_name() {
            if exclude_set.is_match(Path::new(fname)) {
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    // Sort for deterministic output
    files.sort();

    Ok(files)
}

fn default_exclude_set() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in DEFAULT_EXCLUDES {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
