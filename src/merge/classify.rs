use crate::errors::Result;
use crate::extract::SourceImplementation;
use crate::merge::model::{CallShape, Field};
use crate::merge::signature::{is_local_type, resolve, ERROR_SIGNATURE};
use crate::parse::common::{Param, StructField, TypeExpr};
use crate::parse::resolver::{is_exported, title_case_alias};

/// Result list of a method, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnShape<'a> {
    NoReturn,
    OnlyError,
    Value(&'a TypeExpr),
    ValueAndError(&'a TypeExpr),
}

impl ReturnShape<'_> {
    pub fn call_shape(&self) -> CallShape {
        match self {
            ReturnShape::NoReturn => CallShape::NoReturn,
            ReturnShape::OnlyError => CallShape::OnlyError,
            ReturnShape::Value(_) => CallShape::Value,
            ReturnShape::ValueAndError(_) => CallShape::ValueAndError,
        }
    }

    pub fn value(&self) -> Option<&TypeExpr> {
        match self {
            ReturnShape::Value(ty) | ReturnShape::ValueAndError(ty) => Some(*ty),
            _ => None,
        }
    }
}

/// Why a result list cannot be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReturn {
    /// Two results whose second is not `error`
    SecondNotError,
    /// Three or more results
    Arity(usize),
}

/// Classify a result list into one of the supported return shapes.
pub fn classify_results(results: &[Param]) -> std::result::Result<ReturnShape<'_>, InvalidReturn> {
    let types: Vec<&TypeExpr> = results
        .iter()
        .flat_map(|p| std::iter::repeat(&p.ty).take(p.arity()))
        .collect();

    match types[..] {
        [] => Ok(ReturnShape::NoReturn),
        [only] if is_error(only) => Ok(ReturnShape::OnlyError),
        [only] => Ok(ReturnShape::Value(only)),
        [value, second] if is_error(second) => Ok(ReturnShape::ValueAndError(value)),
        [_, _] => Err(InvalidReturn::SecondNotError),
        _ => Err(InvalidReturn::Arity(types.len())),
    }
}

fn is_error(ty: &TypeExpr) -> bool {
    resolve(None, ty).is_ok_and(|sig| sig == ERROR_SIGNATURE)
}

/// How a returned value populates the merged return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueFields {
    /// Struct fields copied one by one (`mergeReturnedStruct`)
    Flattened(Vec<Field>),
    /// The whole value as one field
    Opaque(Field),
}

impl ValueFields {
    pub fn is_flattened(&self) -> bool {
        matches!(self, ValueFields::Flattened(_))
    }

    pub fn into_fields(self) -> Vec<Field> {
        match self {
            ValueFields::Flattened(fields) => fields,
            ValueFields::Opaque(field) => vec![field],
        }
    }
}

/// Decide how the value part of a method's result is merged.
///
/// - anonymous struct: exported fields are flattened
/// - local struct with only exported fields: flattened
/// - local struct with unexported fields: opaque `<Alias>Result`
/// - anything else: opaque `Value`
pub fn classify_value(
    source: &SourceImplementation<'_>,
    source_index: usize,
    alias: &str,
    ty: &TypeExpr,
) -> Result<ValueFields> {
    if let TypeExpr::Struct(fields) = ty {
        let exported: Vec<&StructField> = fields
            .iter()
            .filter(|f| f.names.iter().any(|n| is_exported(n)))
            .collect();
        return flatten(&exported, source_index, alias).map(ValueFields::Flattened);
    }

    let signature = resolve(Some(alias), ty)?;

    if is_local_type(ty) {
        match source.local_type(ty) {
            Some(decl) => {
                if let TypeExpr::Struct(fields) = &decl.ty {
                    if fields.iter().all(|f| f.names.iter().all(|n| is_exported(n))) {
                        let fields: Vec<&StructField> = fields.iter().collect();
                        return flatten(&fields, source_index, alias).map(ValueFields::Flattened);
                    }
                    return Ok(ValueFields::Opaque(Field::new(
                        source_index,
                        format!("{}Result", title_case_alias(alias)),
                        signature,
                    )));
                }
            }
            None => {
                tracing::warn!(
                    "local type {} not found in package {}; treating it as an opaque value",
                    signature,
                    source.package.name
                );
            }
        }
    }

    Ok(ValueFields::Opaque(Field::new(source_index, "Value", signature)))
}

fn flatten(fields: &[&StructField], source_index: usize, alias: &str) -> Result<Vec<Field>> {
    let mut flat = Vec::new();
    for field in fields {
        let ty = resolve(Some(alias), &field.ty)?;
        for name in field.names.iter().filter(|n| is_exported(n)) {
            flat.push(Field::new(source_index, name.clone(), ty.clone()));
        }
    }
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::common::GoPackage;
    use crate::parse::go::GoFrontend;
    use std::path::{Path, PathBuf};

    const SOURCE: &str = r#"package pkg3

import biggie "math/big"

type Impl3 struct{}

func NewImpl3() (*Impl3, error) { return &Impl3{}, nil }

type Result3 struct {
	B int
	C *biggie.Int
}

type hidden struct {
	Visible int
	secret  string
}

type Hidden hidden

type Mixed struct {
	Visible int
	secret  string
}

type Count int

func (impl *Impl3) None() {}
func (impl *Impl3) Err() error { return nil }
func (impl *Impl3) Plain() int { return 0 }
func (impl *Impl3) Pair() (*Result3, error) { return nil, nil }
func (impl *Impl3) Named() (n int, err error) { return 0, nil }
func (impl *Impl3) Bad() (int, string) { return 0, "" }
func (impl *Impl3) Many() (int, int, error) { return 0, 0, nil }
func (impl *Impl3) Grouped() (a, b int) { return 0, 0 }
"#;

    fn package() -> GoPackage {
        let file = GoFrontend::new()
            .parse_file(SOURCE.as_bytes(), Path::new("impl.go"))
            .unwrap();
        GoPackage {
            name: "pkg3".into(),
            dir: PathBuf::from("pkg3"),
            files: vec![file],
        }
    }

    fn ident(name: &str) -> TypeExpr {
        TypeExpr::Ident(name.into())
    }

    fn opaque(ty: &str) -> ValueFields {
        ValueFields::Opaque(Field::new(0, "Value", ty))
    }

    fn results_of<'p>(pkg: &'p GoPackage, name: &str) -> &'p [Param] {
        &pkg.files[0]
            .funcs
            .iter()
            .find(|f| f.name == name)
            .unwrap()
            .results
    }

    #[test]
    fn classifies_result_lists() {
        let pkg = package();
        let shape = |name| classify_results(results_of(&pkg, name));

        assert_eq!(shape("None"), Ok(ReturnShape::NoReturn));
        assert_eq!(shape("Err"), Ok(ReturnShape::OnlyError));
        assert!(matches!(shape("Plain"), Ok(ReturnShape::Value(_))));
        assert!(matches!(shape("Pair"), Ok(ReturnShape::ValueAndError(_))));
        assert!(matches!(shape("Named"), Ok(ReturnShape::ValueAndError(_))));
        assert_eq!(shape("Bad"), Err(InvalidReturn::SecondNotError));
        assert_eq!(shape("Many"), Err(InvalidReturn::Arity(3)));
        assert_eq!(shape("Grouped"), Err(InvalidReturn::SecondNotError));
    }

    #[test]
    fn local_exported_struct_is_flattened() {
        let pkg = package();
        let source = SourceImplementation::find(&pkg, "Impl3").unwrap();
        let ty = TypeExpr::Pointer(Box::new(ident("Result3")));

        let fields = classify_value(&source, 2, "pkg3_3", &ty).unwrap();
        assert!(fields.is_flattened());
        let fields = fields.into_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(
            (fields[0].name.as_str(), fields[0].ty.as_str()),
            ("B", "int")
        );
        assert_eq!(
            (fields[1].name.as_str(), fields[1].ty.as_str()),
            ("C", "*biggie.Int")
        );
        assert_eq!(fields[1].source_index, 2);
    }

    #[test]
    fn local_struct_with_unexported_field_is_opaque() {
        let pkg = package();
        let source = SourceImplementation::find(&pkg, "Impl3").unwrap();
        let ty = ident("Mixed");

        let fields = classify_value(&source, 2, "pkg3_3", &ty).unwrap();
        assert_eq!(
            fields,
            ValueFields::Opaque(Field::new(2, "Pkg33Result", "pkg3_3.Mixed"))
        );
    }

    #[test]
    fn local_non_struct_and_external_are_values() {
        let pkg = package();
        let source = SourceImplementation::find(&pkg, "Impl3").unwrap();

        let count = classify_value(&source, 0, "p", &ident("Count")).unwrap();
        assert_eq!(count, opaque("p.Count"));

        let hidden = classify_value(&source, 0, "p", &ident("Hidden")).unwrap();
        assert_eq!(hidden, opaque("p.Hidden"));

        let external = TypeExpr::Pointer(Box::new(TypeExpr::Qualified {
            package: "biggie".into(),
            name: "Int".into(),
        }));
        let value = classify_value(&source, 0, "p", &external).unwrap();
        assert_eq!(value, opaque("*biggie.Int"));
    }

    #[test]
    fn anonymous_struct_keeps_exported_fields() {
        let pkg = package();
        let source = SourceImplementation::find(&pkg, "Impl3").unwrap();
        let ty = TypeExpr::Struct(vec![
            StructField {
                names: vec!["Name".into(), "tag".into()],
                ty: ident("string"),
                embedded: false,
            },
            StructField {
                names: vec!["Item".into()],
                ty: ident("Result3"),
                embedded: false,
            },
        ]);

        let fields = classify_value(&source, 1, "p", &ty).unwrap().into_fields();
        let rendered: Vec<_> = fields
            .iter()
            .map(|f| format!("{} {}", f.name, f.ty))
            .collect();
        assert_eq!(rendered, vec!["Name string", "Item p.Result3"]);
    }

    #[test]
    fn unknown_local_type_is_opaque() {
        let pkg = package();
        let source = SourceImplementation::find(&pkg, "Impl3").unwrap();
        let fields = classify_value(&source, 0, "p", &ident("Ghost")).unwrap();
        assert_eq!(fields, opaque("p.Ghost"));
    }
}
