pub mod classify;
pub mod fields;
pub mod imports;
pub mod model;
pub mod signature;

use crate::config::MergeConfig;
use crate::errors::{MergeError, Result};
use crate::extract::SourceImplementation;
use crate::parse::common::Param;
use classify::{classify_results, classify_value, InvalidReturn, ReturnShape};
use fields::{merge_field, merge_fields, AltSuffixes};
use imports::ImportSet;
use model::{Field, MergedOutput, MergedSource, Method, Variation};
use signature::resolve;

/// Single merge pass over every source implementation.
///
/// Processing order is sources, then methods within a source, then fields
/// within a method; alt suffixes are issued in that order, which keeps the
/// output reproducible.
pub struct Merger<'c> {
    config: &'c MergeConfig,
    alts: AltSuffixes,
}

impl<'c> Merger<'c> {
    pub fn new(config: &'c MergeConfig) -> Self {
        Self {
            config,
            alts: AltSuffixes::new(),
        }
    }

    /// Merge `impls` (one per configured source, same order) into the output model.
    pub fn merge(mut self, impls: &[SourceImplementation<'_>]) -> Result<MergedOutput> {
        if impls.len() != self.config.sources.len() {
            return Err(MergeError::Config(format!(
                "expected {} source implementations, got {}",
                self.config.sources.len(), impls.len()
            )));
        }

        let aliases = self.aliases(impls);

        let mut init_args = Vec::new();
        let mut sources = Vec::with_capacity(impls.len());
        for (i, source) in impls.iter().enumerate() {
            let merged = self.merge_constructor(i, &aliases[i], source, &mut init_args)?;
            sources.push(merged);
        }

        let mut methods = self.collect_methods(impls, &aliases)?;
        for method in &mut methods {
            self.merge_method(method);
        }

        let imports = resolve_imports(impls, &sources, &methods, &init_args);

        Ok(MergedOutput {
            type_name: self.config.output.type_name.clone(),
            package: self.config.output.package.clone(),
            default_tag: self.config.output.default_tag.clone(),
            sources,
            init_args,
            methods,
            imports,
        })
    }

    /// Configured aliases, defaulting to `<packageName>_<index+1>`.
    fn aliases(&self, impls: &[SourceImplementation<'_>]) -> Vec<String> {
        self.config
            .sources
            .iter()
            .zip(impls)
            .enumerate()
            .map(|(i, (source, implementation))| match &source.package.alias {
                Some(alias) if !alias.is_empty() => alias.clone(),
                _ => format!("{}_{}", implementation.package.name, i + 1),
            })
            .collect()
    }

    fn merge_constructor(
        &mut self,
        index: usize,
        alias: &str,
        source: &SourceImplementation<'_>,
        init_args: &mut Vec<Field>,
    ) -> Result<MergedSource> {
        let config = &self.config.sources[index];
        let constructor = source.constructor;

        let unsupported = || MergeError::UnsupportedConstructor {
            constructor: constructor.name.clone(),
            package: source.package.name.clone(),
        };
        let (handle, returns_error) = match classify_results(&constructor.results) {
            Ok(ReturnShape::Value(ty)) => (ty, false),
            Ok(ReturnShape::ValueAndError(ty)) => (ty, true),
            _ => return Err(unsupported()),
        };

        let mut forwarded = expand_params(&constructor.params, index, alias)?;
        for arg in &mut forwarded {
            merge_field(arg, init_args, &mut self.alts);
        }

        Ok(MergedSource {
            type_name: config.type_name.clone(),
            tag: config.tag.clone(),
            alias: alias.to_string(),
            import_path: config.package.import_path.clone(),
            handle_type: resolve(Some(alias), handle)?,
            init_args: forwarded,
            constructor_returns_error: returns_error,
        })
    }

    /// Group every valid method variation under a bucket method by name.
    fn collect_methods(
        &self,
        impls: &[SourceImplementation<'_>],
        aliases: &[String],
    ) -> Result<Vec<Method>> {
        let mut methods: Vec<Method> = Vec::new();

        for (i, source) in impls.iter().enumerate() {
            let alias = aliases[i].as_str();
            let tag = &self.config.sources[i].tag;
            let type_name = &source.type_decl.name;

            for decl in &source.methods {
                let shape = match classify_results(&decl.results) {
                    Ok(shape) => shape,
                    Err(InvalidReturn::SecondNotError) => {
                        tracing::warn!(
                            "expected {}.{}.{} (line {}) to return (<any>, error) - ignoring",
                            alias,
                            type_name,
                            decl.name,
                            decl.line
                        );
                        continue;
                    }
                    Err(InvalidReturn::Arity(n)) => {
                        tracing::warn!(
                            "{}.{}.{} (line {}) returns {} values - ignoring",
                            alias,
                            type_name,
                            decl.name,
                            decl.line,
                            n
                        );
                        continue;
                    }
                };

                let (returned_fields, merge_returned_struct) = match shape.value() {
                    Some(ty) => {
                        let value = classify_value(source, i, alias, ty)?;
                        let flattened = value.is_flattened();
                        (value.into_fields(), flattened)
                    }
                    None => (Vec::new(), false),
                };

                let variation = Variation {
                    name: decl.name.clone(),
                    source_index: i,
                    tag: tag.clone(),
                    args: expand_params(&decl.params, i, alias)?,
                    returned_fields,
                    merge_returned_struct,
                    shape: shape.call_shape(),
                };
                tracing::debug!(
                    "{}.{}.{}: {:?}, {} args, {} returned fields",
                    alias,
                    type_name,
                    decl.name,
                    variation.shape,
                    variation.args.len(),
                    variation.returned_fields.len()
                );

                match methods.iter_mut().find(|m| m.name == decl.name) {
                    Some(method) => method.variations.push(variation),
                    None => {
                        let mut method = Method::new(decl.name.clone());
                        method.variations.push(variation);
                        methods.push(method);
                    }
                }
            }
        }

        Ok(methods)
    }

    /// Union the variations' arguments and returned fields, then collapse the
    /// return shape.
    fn merge_method(&mut self, method: &mut Method) {
        for variation in &mut method.variations {
            merge_fields(&mut variation.args, &mut method.args, &mut self.alts);
            merge_fields(
                &mut variation.returned_fields,
                &mut method.return_type.fields,
                &mut self.alts,
            );
        }

        match method.return_type.fields.as_slice() {
            [] => method.no_return = true,
            [only] => {
                method.single_return = true;
                method.return_type.name = only.ty.clone();
            }
            _ => {}
        }
    }
}

/// Expand grouped parameter names into one field each. Unnamed parameters
/// are named after their position.
fn expand_params(params: &[Param], source_index: usize, alias: &str) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    for param in params {
        let ty = resolve(Some(alias), &param.ty)?;
        if param.names.is_empty() {
            fields.push(Field::new(source_index, format!("arg{}", fields.len()), ty));
            continue;
        }
        for name in &param.names {
            let name = if name == "_" {
                format!("arg{}", fields.len())
            } else {
                name.clone()
            };
            fields.push(Field::new(source_index, name, ty.clone()));
        }
    }
    Ok(fields)
}

/// Collect the imports needed by every merged argument, return field, and
/// constructor argument.
fn resolve_imports(
    impls: &[SourceImplementation<'_>],
    sources: &[MergedSource],
    methods: &[Method],
    init_args: &[Field],
) -> Vec<String> {
    let mut set = ImportSet::new();
    for source in sources {
        set.reserve(format!("{} \"{}\"", source.alias, source.import_path));
    }

    let method_fields = methods
        .iter()
        .flat_map(|m| m.args.iter().chain(&m.return_type.fields));
    for field in method_fields.chain(init_args) {
        set.add_for_signature(&field.ty, &impls[field.source_index].imports);
    }

    set.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeConfig;
    use crate::merge::model::CallShape;
    use crate::parse::common::GoPackage;
    use crate::parse::go::GoFrontend;
    use std::path::{Path, PathBuf};

    fn config(sources: &[(&str, &str)]) -> MergeConfig {
        let mut yaml = String::from("sources:\n");
        for (i, (type_name, tag)) in sources.iter().enumerate() {
            let n = i + 1;
            yaml.push_str(&format!("  - type: {type_name}\n    tag: {tag}\n"));
            yaml.push_str(&format!(
                "    package:\n      importPath: example.com/pkg{n}\n      sourceDir: pkg{n}\n"
            ));
        }
        yaml.push_str("output:\n  type: Merged\n  package: merged\n");
        yaml.push_str("  file: merged.go\n  defaultTag: a\n");
        MergeConfig::from_yaml(&yaml).unwrap()
    }

    fn package(name: &str, source: &str) -> GoPackage {
        let file = GoFrontend::new()
            .parse_file(source.as_bytes(), Path::new(&format!("{name}.go")))
            .unwrap();
        GoPackage {
            name: file.package.clone(),
            dir: PathBuf::from(name),
            files: vec![file],
        }
    }

    /// Package `pkg` declaring `ty`, its fallible constructor, and `methods`.
    fn source(pkg: &str, ty: &str, ctor_params: &str, methods: &str) -> GoPackage {
        let text = format!(
            "package {pkg}\n\ntype {ty} struct{{}}\n\n\
             func New{ty}({ctor_params}) (*{ty}, error) {{ return &{ty}{{}}, nil }}\n\n\
             {methods}\n"
        );
        package(pkg, &text)
    }

    fn merge(config: &MergeConfig, packages: &[GoPackage]) -> MergedOutput {
        let impls: Vec<_> = packages
            .iter()
            .zip(&config.sources)
            .map(|(pkg, s)| SourceImplementation::find(pkg, &s.type_name).unwrap())
            .collect();
        Merger::new(config).merge(&impls).unwrap()
    }

    fn rendered(fields: &[Field]) -> Vec<String> {
        fields
            .iter()
            .map(|f| format!("{} {}", f.name, f.ty))
            .collect()
    }

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn same_signature_merges_into_single_return() {
        let config = config(&[("A", "a"), ("B", "b")]);
        let foo_a = "func (x *A) Foo() (string, error) { return \"a\", nil }";
        let foo_b = "func (x *B) Foo() (string, error) { return \"b\", nil }";
        let packages = [
            source("pkga", "A", "", foo_a),
            source("pkgb", "B", "", foo_b),
        ];
        let output = merge(&config, &packages);

        assert_eq!(output.methods.len(), 1);
        let foo = output.method("Foo").unwrap();
        assert!(foo.single_return);
        assert!(!foo.no_return);
        assert_eq!(foo.return_type.name, "string");
        assert_eq!(foo.variations.len(), 2);
        assert_eq!(foo.variations[0].tag, "a");
        assert_eq!(foo.variations[1].tag, "b");
        assert_eq!(foo.variations[1].shape, CallShape::ValueAndError);
    }

    #[test]
    fn heterogeneous_values_get_wrapper_type() {
        let config = config(&[("A", "a"), ("B", "b")]);
        let bar_a = "func (x *A) Bar() (int, error) { return 0, nil }";
        let bar_b = "func (x *B) Bar() (string, error) { return \"\", nil }";
        let packages = [
            source("pkga", "A", "", bar_a),
            source("pkgb", "B", "", bar_b),
        ];
        let output = merge(&config, &packages);

        let bar = output.method("Bar").unwrap();
        assert!(!bar.single_return);
        assert!(bar.has_wrapper());
        assert_eq!(bar.return_type.name, "BarOutput");
        assert_eq!(
            rendered(&bar.return_type.fields),
            vec!["Value int", "ValueAlt1 string"]
        );
        assert_eq!(bar.variations[1].returned_fields[0].name, "ValueAlt1");
        assert_eq!(bar.variations[1].returned_fields[0].source_name, "Value");
    }

    #[test]
    fn invalid_arity_skips_only_that_variation() {
        let config = config(&[("A", "a"), ("B", "b")]);
        let baz_a = "func (x *A) Baz() (int, int, error) { return 0, 0, nil }";
        let baz_b = "func (x *B) Baz() (int, error) { return 0, nil }";
        let packages = [
            source("pkga", "A", "", baz_a),
            source("pkgb", "B", "", baz_b),
        ];
        let output = merge(&config, &packages);

        let baz = output.method("Baz").unwrap();
        assert_eq!(baz.variations.len(), 1);
        assert_eq!(baz.variations[0].tag, "b");
        assert!(baz.single_return);
        assert_eq!(baz.return_type.name, "int");
    }

    #[test]
    fn error_only_and_void_methods_have_no_return() {
        let config = config(&[("A", "a")]);
        let methods = "func (x *A) Close() error { return nil }\nfunc (x *A) Reset() {}";
        let output = merge(&config, &[source("pkga", "A", "", methods)]);

        let close = output.method("Close").unwrap();
        assert!(close.no_return);
        assert_eq!(close.variations[0].shape, CallShape::OnlyError);
        let reset = output.method("Reset").unwrap();
        assert!(reset.no_return);
        assert_eq!(reset.variations[0].shape, CallShape::NoReturn);
    }

    #[test]
    fn constructor_args_are_unioned_across_sources() {
        let config = config(&[("A", "a"), ("B", "b")]);
        let packages = [
            source("pkga", "A", "url string, retries int", ""),
            source("pkgb", "B", "url string, retries uint", ""),
        ];
        let output = merge(&config, &packages);

        assert_eq!(
            rendered(&output.init_args),
            vec!["url string", "retries int", "retriesAlt1 uint"]
        );
        assert_eq!(
            names(&output.sources[1].init_args),
            vec!["url", "retriesAlt1"]
        );
        assert_eq!(output.sources[1].handle_type, "*pkgb_2.B");
        assert!(output.sources[1].constructor_returns_error);
    }

    #[test]
    fn conflicting_args_forward_renamed_names() {
        let config = config(&[("A", "a"), ("B", "b")]);
        let get_a = "func (x *A) Get(id string) error { return nil }";
        let get_b = "func (x *B) Get(id int, _ bool) error { return nil }";
        let packages = [
            source("pkga", "A", "", get_a),
            source("pkgb", "B", "", get_b),
        ];
        let output = merge(&config, &packages);

        let get = output.method("Get").unwrap();
        assert_eq!(
            rendered(&get.args),
            vec!["id string", "idAlt1 int", "arg1 bool"]
        );
        assert_eq!(names(&get.variations[1].args), vec!["idAlt1", "arg1"]);
    }

    #[test]
    fn renamed_args_never_collide_with_declared_names() {
        let config = config(&[("A", "a"), ("B", "b")]);
        let get_a = "func (a *A) Get(x int, xAlt1 string) error { return nil }";
        let get_b = "func (b *B) Get(x string) error { return nil }";
        let packages = [
            source("pkga", "A", "", get_a),
            source("pkgb", "B", "", get_b),
        ];
        let output = merge(&config, &packages);

        let get = output.method("Get").unwrap();
        assert_eq!(
            rendered(&get.args),
            vec!["x int", "xAlt1 string", "xAlt2 string"]
        );
        assert_eq!(names(&get.variations[1].args), vec!["xAlt2"]);
    }

    #[test]
    fn unnamed_params_are_named_by_position() {
        let config = config(&[("A", "a")]);
        let put = "func (x *A) Put(string, int) error { return nil }";
        let output = merge(&config, &[source("pkga", "A", "", put)]);

        let put = output.method("Put").unwrap();
        assert_eq!(names(&put.args), vec!["arg0", "arg1"]);
    }

    #[test]
    fn imports_follow_external_types() {
        let config = config(&[("A", "a")]);
        let source = r#"package pkga

import (
	"context"
	"math/big"
	biggie "math/big"
	"strings"
)

type A struct{}

func NewA(ctx context.Context) (*A, error) { return &A{}, nil }

func (x *A) Sum(values map[string]*biggie.Int) (*big.Int, error) { return nil, nil }

func (x *A) Join(b strings.Builder) error { return nil }
"#;
        let output = merge(&config, &[package("pkga", source)]);
        assert_eq!(
            output.imports,
            vec![
                "biggie \"math/big\"".to_string(),
                "\"math/big\"".to_string(),
                "\"strings\"".to_string(),
                "\"context\"".to_string(),
            ]
        );
    }

    #[test]
    fn default_alias_uses_package_name_and_position() {
        let config = config(&[("A", "a"), ("B", "b")]);
        let packages = [
            source("pkga", "A", "", ""),
            source("pkgb", "B", "", ""),
        ];
        let output = merge(&config, &packages);
        assert_eq!(output.sources[0].alias, "pkga_1");
        assert_eq!(output.sources[1].alias, "pkgb_2");
    }

    #[test]
    fn constructor_with_three_results_is_rejected() {
        let config = config(&[("A", "a")]);
        let pkg = package(
            "pkga",
            "package pkga\ntype A struct{}\nfunc NewA() (*A, int, error) { return nil, 0, nil }\n",
        );
        let impls = vec![SourceImplementation::find(&pkg, "A").unwrap()];
        let err = Merger::new(&config).merge(&impls).unwrap_err();
        assert!(matches!(err, MergeError::UnsupportedConstructor { .. }));
    }

    #[test]
    fn merging_is_deterministic() {
        let config = config(&[("A", "a"), ("B", "b")]);
        let bar_a = "func (x *A) Bar(v int) (int, error) { return 0, nil }";
        let bar_b = "func (x *B) Bar(v string) (string, error) { return \"\", nil }";
        let packages = [
            source("pkga", "A", "n int", bar_a),
            source("pkgb", "B", "n string", bar_b),
        ];
        assert_eq!(merge(&config, &packages), merge(&config, &packages));
    }
}
