use crate::errors::{MergeError, Result};
use crate::parse::common::{ChanDir, TypeExpr};
use crate::parse::resolver::is_exported;

/// Signature of Go's built-in error interface.
pub const ERROR_SIGNATURE: &str = "error";

/// Render a type expression as a canonical signature.
///
/// Exported bare identifiers are qualified with `alias` when one is given, so
/// types declared in a source package stay reachable from the generated file.
pub fn resolve(alias: Option<&str>, ty: &TypeExpr) -> Result<String> {
    let signature = match ty {
        TypeExpr::Ident(name) => match alias {
            Some(alias) if !alias.is_empty() && is_exported(name) => format!("{alias}.{name}"),
            _ => name.clone(),
        },
        TypeExpr::Pointer(inner) => format!("*{}", resolve(alias, inner)?),
        TypeExpr::Array { len, elem } => {
            format!(
                "[{}]{}",
                len.as_deref().unwrap_or(""), resolve(alias, elem)?
            )
        }
        TypeExpr::Map { key, value } => {
            format!("map[{}]{}", resolve(alias, key)?, resolve(alias, value)?)
        }
        TypeExpr::Chan { dir, value } => {
            let chan = match dir {
                ChanDir::Both => "chan",
                ChanDir::Send => "chan<-",
                ChanDir::Recv => "<-chan",
            };
            format!("{chan} {}", resolve(alias, value)?)
        }
        TypeExpr::Qualified { package, name } => format!("{package}.{name}"),
        TypeExpr::Ellipsis(inner) => format!("...{}", resolve(alias, inner)?),
        TypeExpr::Struct(fields) => {
            let mut parts = Vec::with_capacity(fields.len());
            for field in fields {
                let ty = resolve(alias, &field.ty)?;
                if field.embedded {
                    parts.push(ty);
                } else {
                    parts.push(format!("{} {ty}", field.names.join(", ")));
                }
            }
            if parts.is_empty() {
                "struct{}".to_string()
            } else {
                format!("struct{{ {} }}", parts.join("; "))
            }
        }
        TypeExpr::Other { kind, text } => {
            if text.is_empty() {
                return Err(MergeError::UnsupportedType {
                    kind: kind.clone(),
                    text: text.clone(),
                });
            }
            text.clone()
        }
    };
    Ok(signature)
}

/// Whether the expression names a type declared in the source package itself:
/// an exported bare identifier, possibly behind pointers.
pub fn is_local_type(ty: &TypeExpr) -> bool {
    matches!(ty.strip_pointers(), TypeExpr::Ident(name) if is_exported(name))
}
