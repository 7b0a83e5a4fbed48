use crate::errors::{MergeError, Result};
use crate::parse::common::{
    ChanDir, FuncDecl, GoFile, GoPackage, ImportDecl, Param, Receiver, StructField, TypeDecl,
    TypeExpr,
};
use crate::parse::PackageFrontend;
use crate::walk;
use std::path::Path;
use streaming_iterator::StreamingIterator;
use tree_sitter::Node;

const IMPORT_QUERY: &str = "(import_spec) @spec";

/// tree-sitter backed Go frontend.
pub struct GoFrontend {
    language: tree_sitter::Language,
}

impl GoFrontend {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Parse one Go source file into its declarations.
    pub fn parse_file(&self, source: &[u8], file_path: &Path) -> Result<GoFile> {
        let parse_error = |message: String| MergeError::Parse {
            file: file_path.to_path_buf(),
            message,
        };

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| parse_error(e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| parse_error("parser returned no tree".into()))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root)
                .map(|n| n.start_position().row + 1)
                .unwrap_or(1);
            return Err(parse_error(format!("syntax error at line {line}")));
        }

        let mut file = GoFile {
            path: file_path.to_path_buf(),
            imports: self
                .extract_imports(root, source)
                .map_err(|e| parse_error(e.to_string()))?,
            ..GoFile::default()
        };

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "package_clause" => {
                    if let Some(name) = node.named_child(0) {
                        file.package = node_text(name, source).to_string();
                    }
                }
                "function_declaration" | "method_declaration" => {
                    file.funcs.push(convert_func(node, source)?);
                }
                "type_declaration" => {
                    let mut specs = node.walk();
                    for spec in node.named_children(&mut specs) {
                        if matches!(spec.kind(), "type_spec" | "type_alias") {
                            file.types.push(TypeDecl {
                                name: node_text(required(spec, "name")?, source).to_string(),
                                ty: convert_type(required(spec, "type")?, source)?,
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        if file.package.is_empty() {
            return Err(parse_error("missing package clause".into()));
        }

        Ok(file)
    }

    fn extract_imports(
        &self,
        root: Node,
        source: &[u8],
    ) -> std::result::Result<Vec<ImportDecl>, tree_sitter::QueryError> {
        let query = tree_sitter::Query::new(&self.language, IMPORT_QUERY)?;

        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(&query, root, source);

        let mut imports = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let spec = capture.node;
                let path = spec
                    .child_by_field_name("path")
                    .map(|p| strip_string_quotes(node_text(p, source)))
                    .unwrap_or_default();
                if path.is_empty() {
                    continue;
                }
                let alias = spec
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string());
                imports.push(ImportDecl { alias, path });
            }
        }

        Ok(imports)
    }
}

impl Default for GoFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageFrontend for GoFrontend {
    fn load_package(&self, dir: &Path) -> Result<GoPackage> {
        let paths = walk::discover_package_files(dir)?;

        let mut parsed = Vec::with_capacity(paths.len());
        for path in &paths {
            let source = std::fs::read(path)?;
            parsed.push(self.parse_file(&source, path)?);
        }

        let name = match parsed.first() {
            Some(first) => first.package.clone(),
            None => {
                return Err(MergeError::NoPackage {
                    dir: dir.to_path_buf(),
                })
            }
        };

        let files: Vec<GoFile> = parsed
            .into_iter()
            .filter(|file| {
                let same = file.package == name;
                if !same {
                    tracing::warn!(
                        "Skipping {}: package {} differs from {}",
                        file.path.display(),
                        file.package,
                        name
                    );
                }
                same
            })
            .collect();

        tracing::info!(
            "Loaded package {} from {} ({} files)",
            name,
            dir.display(),
            files.len()
        );

        Ok(GoPackage {
            name,
            dir: dir.to_path_buf(),
            files,
        })
    }
}

fn convert_func(node: Node, source: &[u8]) -> Result<FuncDecl> {
    let receiver = match node.child_by_field_name("receiver") {
        Some(list) => receiver_of(list, source),
        None => None,
    };

    let params = convert_params(required(node, "parameters")?, source)?;

    let results = match node.child_by_field_name("result") {
        Some(result) if result.kind() == "parameter_list" => convert_params(result, source)?,
        Some(result) => vec![Param {
            names: vec![],
            ty: convert_type(result, source)?,
        }],
        None => vec![],
    };

    Ok(FuncDecl {
        name: node_text(required(node, "name")?, source).to_string(),
        receiver,
        params,
        results,
        line: node.start_position().row + 1,
    })
}

fn convert_params(list: Node, source: &[u8]) -> Result<Vec<Param>> {
    let mut params = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        let variadic = match decl.kind() {
            "parameter_declaration" => false,
            "variadic_parameter_declaration" => true,
            _ => continue,
        };

        let mut names_cursor = decl.walk();
        let names = decl
            .children_by_field_name("name", &mut names_cursor)
            .map(|n| node_text(n, source).to_string())
            .collect();

        let ty = convert_type(required(decl, "type")?, source)?;
        let ty = if variadic {
            TypeExpr::Ellipsis(Box::new(ty))
        } else {
            ty
        };

        params.push(Param { names, ty });
    }
    Ok(params)
}

/// Extract the receiver base type.
/// `func (s *Server) Handle()` → `Server`
fn receiver_of(list: Node, source: &[u8]) -> Option<Receiver> {
    let mut cursor = list.walk();
    let decl = list
        .named_children(&mut cursor)
        .find(|c| c.kind() == "parameter_declaration")?;
    let mut ty = decl.child_by_field_name("type")?;

    loop {
        match ty.kind() {
            "pointer_type" | "parenthesized_type" => ty = ty.named_child(0)?,
            "generic_type" => ty = ty.child_by_field_name("type")?,
            _ => break,
        }
    }

    Some(Receiver {
        type_name: node_text(ty, source).to_string(),
    })
}

/// Convert a tree-sitter type node into the structural type model.
fn convert_type(node: Node, source: &[u8]) -> Result<TypeExpr> {
    let ty = match node.kind() {
        "type_identifier" | "identifier" => TypeExpr::Ident(node_text(node, source).to_string()),
        "pointer_type" => TypeExpr::Pointer(Box::new(convert_type(first_named(node)?, source)?)),
        "parenthesized_type" => convert_type(first_named(node)?, source)?,
        "qualified_type" => TypeExpr::Qualified {
            package: node_text(required(node, "package")?, source).to_string(),
            name: node_text(required(node, "name")?, source).to_string(),
        },
        "slice_type" => TypeExpr::Array {
            len: None,
            elem: Box::new(convert_type(required(node, "element")?, source)?),
        },
        "array_type" => {
            let len = node_text(required(node, "length")?, source);
            TypeExpr::Array {
                len: Some(collapse_whitespace(len)),
                elem: Box::new(convert_type(required(node, "element")?, source)?),
            }
        }
        "implicit_length_array_type" => TypeExpr::Array {
            len: Some("...".to_string()),
            elem: Box::new(convert_type(required(node, "element")?, source)?),
        },
        "map_type" => TypeExpr::Map {
            key: Box::new(convert_type(required(node, "key")?, source)?),
            value: Box::new(convert_type(required(node, "value")?, source)?),
        },
        "channel_type" => {
            let mut cursor = node.walk();
            let tokens: Vec<&str> = node
                .children(&mut cursor)
                .take(2)
                .map(|c| c.kind())
                .collect();
            let dir = match tokens.as_slice() {
                ["<-", ..] => ChanDir::Recv,
                [_, "<-"] => ChanDir::Send,
                _ => ChanDir::Both,
            };
            TypeExpr::Chan {
                dir,
                value: Box::new(convert_type(required(node, "value")?, source)?),
            }
        }
        "struct_type" => TypeExpr::Struct(convert_struct_fields(node, source)?),
        "ERROR" => return Err(unsupported(node, source)),
        kind => TypeExpr::Other {
            kind: kind.to_string(),
            text: collapse_whitespace(node_text(node, source)),
        },
    };
    Ok(ty)
}

fn convert_struct_fields(node: Node, source: &[u8]) -> Result<Vec<StructField>> {
    let mut fields = Vec::new();
    let mut cursor = node.walk();
    let Some(list) = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "field_declaration_list")
    else {
        return Ok(fields);
    };

    let mut list_cursor = list.walk();
    for decl in list.named_children(&mut list_cursor) {
        if decl.kind() != "field_declaration" {
            continue;
        }

        let mut names_cursor = decl.walk();
        let names: Vec<String> = decl
            .children_by_field_name("name", &mut names_cursor)
            .map(|n| node_text(n, source).to_string())
            .collect();
        let ty = convert_type(required(decl, "type")?, source)?;

        if !names.is_empty() {
            fields.push(StructField {
                names,
                ty,
                embedded: false,
            });
            continue;
        }

        let mut token_cursor = decl.walk();
        let pointer = decl.children(&mut token_cursor).any(|c| c.kind() == "*");
        let name = embedded_name(&ty);
        let ty = if pointer {
            TypeExpr::Pointer(Box::new(ty))
        } else {
            ty
        };
        fields.push(StructField {
            names: vec![name],
            ty,
            embedded: true,
        });
    }
    Ok(fields)
}

/// Field name Go gives an embedded type: `pkg.Reader` → `Reader`.
fn embedded_name(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Ident(name) | TypeExpr::Qualified { name, .. } => name.clone(),
        TypeExpr::Other { text, .. } => {
            let base = text.split('[').next().unwrap_or(text);
            base.rsplit('.').next().unwrap_or(base).to_string()
        }
        other => format!("{other:?}"),
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error)
}

fn required<'t>(node: Node<'t>, field: &str) -> Result<Node<'t>> {
    node.child_by_field_name(field)
        .ok_or_else(|| MergeError::UnsupportedType {
            kind: node.kind().to_string(),
            text: format!("missing {field}"),
        })
}

fn first_named(node: Node) -> Result<Node> {
    node.named_child(0).ok_or_else(|| MergeError::UnsupportedType {
        kind: node.kind().to_string(),
        text: "missing inner type".to_string(),
    })
}

fn unsupported(node: Node, source: &[u8]) -> MergeError {
    MergeError::UnsupportedType {
        kind: node.kind().to_string(),
        text: collapse_whitespace(node_text(node, source)),
    }
}

fn node_text<'s>(node: Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

fn strip_string_quotes(s: &str) -> String {
    s.trim_matches('"').trim_matches('`').to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
