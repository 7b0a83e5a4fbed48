//! Unified model produced by the merge pass and consumed by the emitter.

/// One argument, returned value component, or constructor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub source_index: usize,
    /// Name in the merged output, after alt suffixes and rewrites
    pub name: String,
    /// Name as declared in the source; flattened struct fields are read by it
    pub source_name: String,
    /// Canonical type signature
    pub ty: String,
}

impl Field {
    pub fn new(source_index: usize, name: impl Into<String>, ty: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source_index,
            source_name: name.clone(),
            name,
            ty: ty.into(),
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.ty.starts_with("...")
    }
}

/// How a variation's underlying call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    NoReturn,
    OnlyError,
    Value,
    ValueAndError,
}

/// One source's concrete realization of a bucket method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variation {
    /// Method name on the underlying implementation; never rewritten
    pub name: String,
    pub source_index: usize,
    pub tag: String,
    pub args: Vec<Field>,
    pub returned_fields: Vec<Field>,
    pub merge_returned_struct: bool,
    pub shape: CallShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnType {
    pub name: String,
    pub fields: Vec<Field>,
}

/// Bucket method merged across every source implementing a method of this name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub variations: Vec<Variation>,
    pub args: Vec<Field>,
    pub return_type: ReturnType,
    pub no_return: bool,
    pub single_return: bool,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            return_type: ReturnType {
                name: format!("{name}Output"),
                fields: Vec::new(),
            },
            name,
            variations: Vec::new(),
            args: Vec::new(),
            no_return: false,
            single_return: false,
        }
    }

    /// Whether a named wrapper type is generated for the return value.
    pub fn has_wrapper(&self) -> bool {
        !self.no_return && !self.single_return
    }
}

/// A source after merging: alias fixed and constructor arguments assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSource {
    pub type_name: String,
    pub tag: String,
    pub alias: String,
    pub import_path: String,
    /// Signature of the value the constructor returns, e.g. `*pkg1_1.Impl1`
    pub handle_type: String,
    /// Names forwarded to the constructor, in declaration order
    pub init_args: Vec<Field>,
    pub constructor_returns_error: bool,
}

impl MergedSource {
    pub fn constructor(&self) -> String {
        format!("New{}", self.type_name)
    }
}

/// Model of the generated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedOutput {
    pub type_name: String,
    pub package: String,
    pub default_tag: String,
    pub sources: Vec<MergedSource>,
    pub init_args: Vec<Field>,
    pub methods: Vec<Method>,
    /// Extra import declarations, e.g. `"math/big"` or `biggie "math/big"`
    pub imports: Vec<String>,
}

impl MergedOutput {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}
