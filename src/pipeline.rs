use crate::config::MergeConfig;
use crate::errors::Result;
use crate::extract::SourceImplementation;
use crate::merge::model::MergedOutput;
use crate::merge::Merger;
use crate::output;
use crate::parse::go::GoFrontend;
use crate::parse::{GoPackage, PackageFrontend};
use crate::rewrite::Rewriter;

/// Parse every configured source package, merge, and render the Go file.
pub fn generate(config: &MergeConfig) -> Result<String> {
    generate_with(&GoFrontend::new(), config)
}

/// Same as [`generate`] with a caller-provided package front-end.
pub fn generate_with<F: PackageFrontend + ?Sized>(
    frontend: &F,
    config: &MergeConfig,
) -> Result<String> {
    // Bad rewrite patterns fail before any package is parsed.
    let rewriter = Rewriter::compile(&config.output.rewrite)?;

    let packages = config
        .sources
        .iter()
        .map(|source| frontend.load_package(&source.package.source_dir))
        .collect::<Result<Vec<_>>>()?;

    let merged = merge_packages_with(config, &packages, &rewriter)?;
    output::render(&merged)
}

/// Merge already-loaded packages (one per configured source, same order) and
/// apply the configured rewrite rules.
pub fn merge_packages(config: &MergeConfig, packages: &[GoPackage]) -> Result<MergedOutput> {
    let rewriter = Rewriter::compile(&config.output.rewrite)?;
    merge_packages_with(config, packages, &rewriter)
}

fn merge_packages_with(
    config: &MergeConfig,
    packages: &[GoPackage],
    rewriter: &Rewriter,
) -> Result<MergedOutput> {
    let impls = packages
        .iter()
        .zip(&config.sources)
        .map(|(package, source)| SourceImplementation::find(package, &source.type_name))
        .collect::<Result<Vec<_>>>()?;

    let mut merged = Merger::new(config).merge(&impls)?;
    rewriter.apply(&mut merged);

    tracing::debug!(
        "merged {} sources into {} methods",
        merged.sources.len(),
        merged.methods.len()
    );
    Ok(merged)
}
