use crate::errors::Result;
use crate::merge::model::{CallShape, Field, MergedOutput, Method, Variation};
use std::io::Write;

pub const GENERATED_HEADER: &str = "// Code generated by gomergetypes. DO NOT EDIT.";

const FMT_IMPORT: &str = "import_fmt \"fmt\"";
const SYNC_IMPORT: &str = "import_sync \"sync\"";

/// Render the merged model to Go source text.
pub fn render(output: &MergedOutput) -> Result<String> {
    let mut buf = Vec::new();
    write_merged(&mut buf, output)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the generated Go file for `output`.
pub fn write_merged<W: Write>(writer: &mut W, output: &MergedOutput) -> Result<()> {
    writeln!(writer, "{GENERATED_HEADER}")?;
    writeln!(writer)?;
    writeln!(writer, "package {}", output.package)?;
    writeln!(writer)?;

    write_imports(writer, output)?;
    write_type(writer, output)?;
    write_constructor(writer, output)?;
    write_selectors(writer, &output.type_name)?;

    for method in &output.methods {
        if method.has_wrapper() {
            write_wrapper(writer, method)?;
        }
        write_dispatcher(writer, &output.type_name, method)?;
    }
    Ok(())
}

/// `import_fmt` is only referenced by error paths; an output with no methods
/// and no fallible constructor would not compile with it.
fn uses_fmt(output: &MergedOutput) -> bool {
    !output.methods.is_empty() || output.sources.iter().any(|s| s.constructor_returns_error)
}

fn write_imports<W: Write>(writer: &mut W, output: &MergedOutput) -> Result<()> {
    writeln!(writer, "import (")?;
    if uses_fmt(output) {
        writeln!(writer, "\t{FMT_IMPORT}")?;
    }
    writeln!(writer, "\t{SYNC_IMPORT}")?;

    writeln!(writer)?;
    for source in &output.sources {
        writeln!(writer, "\t{} \"{}\"", source.alias, source.import_path)?;
    }

    if !output.imports.is_empty() {
        writeln!(writer)?;
        for import in &output.imports {
            writeln!(writer, "\t{import}")?;
        }
    }
    writeln!(writer, ")")?;
    writeln!(writer)?;
    Ok(())
}

fn write_type<W: Write>(writer: &mut W, output: &MergedOutput) -> Result<()> {
    let name = &output.type_name;
    writeln!(
        writer,
        "// {name} is a new type which can multiplex calls to different implementation types."
    )?;
    writeln!(writer, "type {name} struct {{")?;

    let mut rows: Vec<(String, String)> = output
        .sources
        .iter()
        .enumerate()
        .map(|(i, source)| (format!("typ{i}"), source.handle_type.clone()))
        .collect();
    rows.push(("currTag".into(), "string".into()));
    rows.push(("mu".into(), "import_sync.RWMutex".into()));
    rows.push(("unsafe".into(), "bool // default: false".into()));
    write_aligned(writer, "\t", &rows)?;

    writeln!(writer, "}}")?;
    writeln!(writer)?;
    Ok(())
}

fn write_constructor<W: Write>(writer: &mut W, output: &MergedOutput) -> Result<()> {
    let name = &output.type_name;
    let fallible = output.sources.iter().any(|s| s.constructor_returns_error);

    writeln!(writer, "// New{name} creates a new merged type.")?;
    writeln!(
        writer,
        "func New{name}({}) (*{name}, error) {{",
        param_list(&output.init_args)
    )?;
    if fallible {
        writeln!(writer, "\tvar (")?;
        write_aligned(
            writer,
            "\t\t",
            &[
                ("mergedType".into(), name.clone()),
                ("err".into(), "error".into()),
            ],
        )?;
        writeln!(writer, "\t)")?;
    } else {
        writeln!(writer, "\tvar mergedType {name}")?;
    }
    writeln!(
        writer,
        "\tmergedType.currTag = {}",
        go_quote(&output.default_tag)
    )?;
    writeln!(writer)?;

    for (i, source) in output.sources.iter().enumerate() {
        let call = format!(
            "{}.{}({})",
            source.alias, source.constructor(), arg_list(&source.init_args)
        );
        if source.constructor_returns_error {
            writeln!(writer, "\tmergedType.typ{i}, err = {call}")?;
            writeln!(writer, "\tif err != nil {{")?;
            writeln!(
                writer,
                "\t\treturn nil, import_fmt.Errorf(\"failed to initialize {}.{}: %w\", err)",
                source.alias, source.type_name
            )?;
            writeln!(writer, "\t}}")?;
        } else {
            writeln!(writer, "\tmergedType.typ{i} = {call}")?;
        }
    }
    writeln!(writer)?;
    writeln!(writer, "\treturn &mergedType, nil")?;
    writeln!(writer, "}}")?;
    writeln!(writer)?;
    Ok(())
}

fn write_selectors<W: Write>(writer: &mut W, name: &str) -> Result<()> {
    writeln!(writer, "// Use sets the used implementation to given tag.")?;
    writeln!(
        writer,
        "func (merged *{name}) Use(tag string) (changed bool) {{"
    )?;
    writeln!(writer, "\tif !merged.unsafe {{")?;
    writeln!(writer, "\t\tmerged.mu.Lock()")?;
    writeln!(writer, "\t\tdefer merged.mu.Unlock()")?;
    writeln!(writer, "\t}}")?;
    writeln!(writer, "\tchanged = merged.currTag != tag")?;
    writeln!(writer, "\tmerged.currTag = tag")?;
    writeln!(writer, "\treturn")?;
    writeln!(writer, "}}")?;
    writeln!(writer)?;

    writeln!(writer, "// Unsafe disables the mutex.")?;
    writeln!(writer, "func (merged *{name}) Unsafe() {{")?;
    writeln!(writer, "\tmerged.unsafe = true")?;
    writeln!(writer, "}}")?;
    writeln!(writer)?;

    writeln!(writer, "// Safe enables the mutex.")?;
    writeln!(writer, "func (merged *{name}) Safe() {{")?;
    writeln!(writer, "\tmerged.unsafe = false")?;
    writeln!(writer, "}}")?;
    Ok(())
}

fn write_wrapper<W: Write>(writer: &mut W, method: &Method) -> Result<()> {
    let name = &method.return_type.name;
    writeln!(writer)?;
    writeln!(writer, "// {name} is a merged return type.")?;
    writeln!(writer, "type {name} struct {{")?;
    let rows: Vec<(String, String)> = method
        .return_type
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.ty.clone()))
        .collect();
    write_aligned(writer, "\t", &rows)?;
    writeln!(writer, "}}")?;
    Ok(())
}

fn write_dispatcher<W: Write>(writer: &mut W, type_name: &str, method: &Method) -> Result<()> {
    let results = if method.no_return {
        "(err error)".to_string()
    } else if method.single_return {
        format!("(retVal {}, err error)", method.return_type.name)
    } else {
        format!("(retVal *{}, err error)", method.return_type.name)
    };

    writeln!(writer)?;
    writeln!(
        writer,
        "// {} multiplexes to different implementations of the method.",
        method.name
    )?;
    writeln!(
        writer,
        "func (merged *{type_name}) {}({}) {results} {{",
        method.name, param_list(&method.args)
    )?;
    writeln!(writer, "\tif !merged.unsafe {{")?;
    writeln!(writer, "\t\tmerged.mu.RLock()")?;
    writeln!(writer, "\t\tdefer merged.mu.RUnlock()")?;
    writeln!(writer, "\t}}")?;
    writeln!(writer)?;

    if method.has_wrapper() {
        writeln!(writer, "\tretVal = &{}{{}}", method.return_type.name)?;
        writeln!(writer)?;
    }

    for variation in &method.variations {
        write_variation(writer, method, variation)?;
        writeln!(writer)?;
    }

    writeln!(
        writer,
        "\terr = import_fmt.Errorf(\"{type_name}.{} not implemented (tag=%s)\", merged.currTag)",
        method.name
    )?;
    writeln!(writer, "\treturn")?;
    writeln!(writer, "}}")?;
    Ok(())
}

fn write_variation<W: Write>(writer: &mut W, method: &Method, variation: &Variation) -> Result<()> {
    let call = format!(
        "merged.typ{}.{}({})",
        variation.source_index, variation.name, arg_list(&variation.args)
    );
    // A value whose struct had no exported fields has nothing to copy.
    let value = if variation.returned_fields.is_empty() {
        "_"
    } else {
        "val"
    };

    writeln!(
        writer,
        "\tif merged.currTag == {} {{",
        go_quote(&variation.tag)
    )?;
    match variation.shape {
        CallShape::NoReturn => writeln!(writer, "\t\t{call}")?,
        CallShape::OnlyError => writeln!(writer, "\t\terr = {call}")?,
        CallShape::Value if value == "_" => writeln!(writer, "\t\t_ = {call}")?,
        CallShape::Value => writeln!(writer, "\t\tval := {call}")?,
        CallShape::ValueAndError => {
            writeln!(writer, "\t\t{value}, methodErr := {call}")?;
            writeln!(writer, "\t\tif methodErr != nil {{")?;
            writeln!(writer, "\t\t\terr = methodErr")?;
            writeln!(writer, "\t\t\treturn")?;
            writeln!(writer, "\t\t}}")?;
        }
    }

    if method.single_return {
        if let Some(field) = variation.returned_fields.first() {
            writeln!(writer, "\t\tretVal = {}", read_value(variation, field))?;
        }
    } else if method.has_wrapper() {
        for field in &variation.returned_fields {
            writeln!(
                writer,
                "\t\tretVal.{} = {}",
                field.name, read_value(variation, field)
            )?;
        }
    }
    writeln!(writer, "\t\treturn")?;
    writeln!(writer, "\t}}")?;
    Ok(())
}

fn read_value(variation: &Variation, field: &Field) -> String {
    if variation.merge_returned_struct {
        format!("val.{}", field.source_name)
    } else {
        "val".to_string()
    }
}

/// `a string, b int`
fn param_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.name, f.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `a, b...`
fn arg_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| {
            if f.is_variadic() {
                format!("{}...", f.name)
            } else {
                f.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write `name type` rows with the type column aligned the way gofmt does.
fn write_aligned<W: Write>(writer: &mut W, indent: &str, rows: &[(String, String)]) -> Result<()> {
    let width = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, ty) in rows {
        writeln!(writer, "{indent}{name:<width$} {ty}")?;
    }
    Ok(())
}

/// Quote `s` as a Go interpreted string literal.
pub fn go_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                quoted.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
