use crate::errors::{MergeError, Result};
use crate::parse::common::{FuncDecl, GoPackage, ImportDecl, TypeDecl, TypeExpr};
use crate::parse::resolver::is_exported;

/// Extracted view of one source package around its designated type.
#[derive(Debug, Clone)]
pub struct SourceImplementation<'a> {
    pub package: &'a GoPackage,
    pub type_decl: &'a TypeDecl,
    pub constructor: &'a FuncDecl,
    /// Exported methods of the type, in file then declaration order
    pub methods: Vec<&'a FuncDecl>,
    pub types: Vec<&'a TypeDecl>,
    pub imports: Vec<ImportDecl>,
}

impl<'a> SourceImplementation<'a> {
    /// Locate `type_name`, its `New<type_name>` constructor, and its methods.
    pub fn find(package: &'a GoPackage, type_name: &str) -> Result<Self> {
        let files = &package.files;

        let types: Vec<&TypeDecl> = files.iter().flat_map(|f| &f.types).collect();
        let imports: Vec<ImportDecl> = files.iter().flat_map(|f| f.imports.clone()).collect();

        let type_decl = types
            .iter()
            .copied()
            .find(|t| t.name == type_name)
            .ok_or_else(|| MergeError::TypeNotFound {
                type_name: type_name.to_string(),
                package: package.name.clone(),
            })?;

        let constructor_name = format!("New{type_name}");
        let funcs = files.iter().flat_map(|f| &f.funcs);

        let constructor = funcs
            .clone()
            .find(|f| f.receiver.is_none() && f.name == constructor_name)
            .ok_or_else(|| MergeError::ConstructorNotFound {
                constructor: constructor_name.clone(),
                type_name: type_name.to_string(),
                package: package.name.clone(),
            })?;

        let methods: Vec<&FuncDecl> = funcs
            .filter(|f| {
                f.receiver
                    .as_ref()
                    .is_some_and(|r| r.type_name == type_name)
            })
            .filter(|f| {
                let exported = is_exported(&f.name);
                if !exported {
                    tracing::debug!("Ignoring unexported method {}.{}", type_name, f.name);
                }
                exported
            })
            .collect();

        tracing::debug!(
            "Found {} with {} exported methods in package {} ({})",
            type_name,
            methods.len(),
            package.name,
            package.dir.display()
        );

        Ok(Self {
            package,
            type_decl,
            constructor,
            methods,
            types,
            imports,
        })
    }

    /// Look up a locally declared type by the base name of `ty`.
    pub fn local_type(&self, ty: &TypeExpr) -> Option<&'a TypeDecl> {
        let TypeExpr::Ident(name) = ty.strip_pointers() else {
            return None;
        };
        self.types.iter().copied().find(|t| &t.name == name)
    }
}
