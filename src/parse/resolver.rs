/// Go exports identifiers that start with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Derive the package name an un-aliased import is referenced by.
///
/// Major-version suffixes (`example.com/mod/v2`) and gopkg.in style
/// `.vN` suffixes (`gopkg.in/yaml.v3`) are skipped.
pub fn import_package_name(import_path: &str) -> &str {
    let mut segments = import_path.rsplit('/');
    let last = segments.next().unwrap_or(import_path);
    let name = if is_major_version(last) {
        segments.next().unwrap_or(last)
    } else {
        last
    };
    match name.rsplit_once(".v") {
        Some((base, version)) if !base.is_empty() && is_digits(version) => base,
        _ => name,
    }
}

fn is_major_version(segment: &str) -> bool {
    segment.strip_prefix('v').is_some_and(is_digits)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Upper-case the first letter of every `_`-separated part and join them:
/// `pkg3_3` becomes `Pkg33`.
pub fn title_case_alias(alias: &str) -> String {
    alias
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
