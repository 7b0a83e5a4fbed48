use crate::parse::resolver::import_package_name;
use std::path::PathBuf;

/// All files of one Go package, in sorted file order.
#[derive(Debug, Clone)]
pub struct GoPackage {
    /// Name from the package clause
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<GoFile>,
}

/// Declarations of a single Go source file that matter for merging.
#[derive(Debug, Clone, Default)]
pub struct GoFile {
    pub path: PathBuf,
    pub package: String,
    pub imports: Vec<ImportDecl>,
    pub funcs: Vec<FuncDecl>,
    pub types: Vec<TypeDecl>,
}

/// `import alias "path"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub alias: Option<String>,
    /// Import path without quotes
    pub path: String,
}

impl ImportDecl {
    /// Declaration text as it appears inside an import block.
    pub fn declaration(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{alias} \"{}\"", self.path),
            None => format!("\"{}\"", self.path),
        }
    }

    /// Package name this import is referenced by when it has no alias.
    pub fn package_name(&self) -> &str {
        import_package_name(&self.path)
    }
}

/// Function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    /// 1-indexed line of the declaration
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    /// Base type name with pointers and type arguments stripped
    pub type_name: String,
}

/// One parameter or result declaration, possibly naming several values.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

impl Param {
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}

/// `type Name T` or `type Name = T`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub embedded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Structural view of a Go type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `T`, `int`, `error`
    Ident(String),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[N]T`, `[...]T`, or `[]T` when `len` is `None`
    Array {
        len: Option<String>,
        elem: Box<TypeExpr>,
    },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan { dir: ChanDir, value: Box<TypeExpr> },
    /// `pkg.T`
    Qualified { package: String, name: String },
    /// Anonymous `struct { ... }`
    Struct(Vec<StructField>),
    /// `...T` in a variadic parameter
    Ellipsis(Box<TypeExpr>),
    /// Anything not modeled above, kept as collapsed source text
    Other { kind: String, text: String },
}

impl TypeExpr {
    /// Strip every pointer level.
    pub fn strip_pointers(&self) -> &TypeExpr {
        match self {
            TypeExpr::Pointer(inner) => inner.strip_pointers(),
            other => other,
        }
    }
}
