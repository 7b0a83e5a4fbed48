use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum MergeError {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(gomergetypes::config))]
    Config(String),

    #[error("No Go package found in {dir}")]
    #[diagnostic(code(gomergetypes::no_package))]
    NoPackage { dir: PathBuf },

    #[error("Parse error in {file}: {message}")]
    #[diagnostic(code(gomergetypes::parse_error))]
    Parse { file: PathBuf, message: String },

    #[error("Implementation type {type_name} not found in package {package}")]
    #[diagnostic(code(gomergetypes::type_not_found))]
    TypeNotFound { type_name: String, package: String },

    #[error("Constructor {constructor} was not found for type {type_name} in package {package}")]
    #[diagnostic(code(gomergetypes::constructor_not_found))]
    ConstructorNotFound {
        constructor: String,
        type_name: String,
        package: String,
    },

    #[error("Constructor {constructor} in package {package} must return (T) or (T, error)")]
    #[diagnostic(code(gomergetypes::unsupported_constructor))]
    UnsupportedConstructor {
        constructor: String,
        package: String,
    },

    #[error("Unsupported type expression ({kind}): {text}")]
    #[diagnostic(code(gomergetypes::unsupported_type))]
    UnsupportedType { kind: String, text: String },

    #[error("Invalid rewrite pattern '{pattern}': {source}")]
    #[diagnostic(code(gomergetypes::rewrite))]
    InvalidRewrite {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Generated code is out of date: {file}")]
    #[diagnostic(
        code(gomergetypes::stale),
        help("run gomergetypes without --check to regenerate")
    )]
    Stale { file: PathBuf },

    #[error(transparent)]
    #[diagnostic(code(gomergetypes::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(gomergetypes::glob))]
    Glob(#[from] globset::Error),
}

pub type Result<T> = std::result::Result<T, MergeError>;
