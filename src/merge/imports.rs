use crate::parse::common::ImportDecl;

/// Package qualifiers referenced by a signature, in order of appearance.
///
/// `map[string]*big.Int` → `["big"]`, `func(a x.A) y.B` → `["x", "y"]`.
pub fn qualifiers(signature: &str) -> Vec<&str> {
    let bytes = signature.as_bytes();
    let mut found: Vec<&str> = Vec::new();
    let mut start = None;

    for (i, &b) in bytes.iter().enumerate() {
        let ident_char = b.is_ascii_alphanumeric() || b == b'_';
        match (start, ident_char) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                // Identifiers directly followed by `.` qualify a type; the
                // `...` of a variadic has no identifier before it.
                if b == b'.' && !bytes[s].is_ascii_digit() {
                    let qualifier = &signature[s..i];
                    if !found.contains(&qualifier) {
                        found.push(qualifier);
                    }
                }
                start = None;
            }
            _ => {}
        }
    }

    found
}

/// Find the import declaration a qualifier refers to.
///
/// Aliases are searched first; un-aliased imports are then matched by the
/// package name derived from their path.
pub fn find_import<'a>(imports: &'a [ImportDecl], qualifier: &str) -> Option<&'a ImportDecl> {
    imports
        .iter()
        .find(|imp| imp.alias.as_deref() == Some(qualifier))
        .or_else(|| {
            imports
                .iter()
                .find(|imp| imp.alias.is_none() && imp.package_name() == qualifier)
        })
}

/// Ordered set of import declarations, deduplicated by exact text.
#[derive(Debug, Default)]
pub struct ImportSet {
    reserved: Vec<String>,
    imports: Vec<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declarations emitted elsewhere in the file; never repeated.
    pub fn reserve(&mut self, declaration: String) {
        if !self.reserved.contains(&declaration) {
            self.reserved.push(declaration);
        }
    }

    pub fn insert(&mut self, declaration: String) -> bool {
        if self.reserved.contains(&declaration) || self.imports.contains(&declaration) {
            return false;
        }
        self.imports.push(declaration);
        true
    }

    /// Add every import referenced by `signature`. Unresolvable qualifiers
    /// are built-ins or source-local and need no import.
    pub fn add_for_signature(&mut self, signature: &str, imports: &[ImportDecl]) {
        for qualifier in qualifiers(signature) {
            if let Some(import) = find_import(imports, qualifier) {
                self.insert(import.declaration());
            }
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.imports
    }
}
