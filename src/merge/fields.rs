use crate::merge::model::Field;

/// Issues `Alt<N>` suffixes for a single merge pass; `N` is never reused.
#[derive(Debug, Default)]
pub struct AltSuffixes {
    issued: usize,
}

impl AltSuffixes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_suffix(&mut self) -> String {
        self.issued += 1;
        format!("Alt{}", self.issued)
    }

    /// Number of suffixes handed out so far.
    pub fn issued(&self) -> usize {
        self.issued
    }
}

/// Outcome of folding one field into an accumulated set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMerge {
    /// Same name and type already present
    Duplicate,
    /// Name clashed with a different type; added under a suffixed name
    Renamed,
    Added,
}

/// Fold `field` into `set`.
///
/// An identical name and type is a duplicate and leaves `set` unchanged. A
/// name already present with a different type gets an alt suffix appended to
/// `field.name` before it is added, so both survive. `field` is updated in
/// place so callers can forward the name it ended up under.
pub fn merge_field(field: &mut Field, set: &mut Vec<Field>, alts: &mut AltSuffixes) -> FieldMerge {
    if set
        .iter()
        .any(|known| known.name == field.name && known.ty == field.ty)
    {
        return FieldMerge::Duplicate;
    }

    let taken = |name: &str| set.iter().any(|known| known.name == name);
    let outcome = if taken(&field.name) {
        // A source may itself declare a name like `xAlt1`; skip suffixes
        // that would collide with it.
        let mut renamed = format!("{}{}", field.name, alts.next_suffix());
        while taken(&renamed) {
            renamed = format!("{}{}", field.name, alts.next_suffix());
        }
        field.name = renamed;
        FieldMerge::Renamed
    } else {
        FieldMerge::Added
    };
    set.push(field.clone());
    outcome
}

/// Fold every field of `from` into `to`, in order.
pub fn merge_fields(from: &mut [Field], to: &mut Vec<Field>, alts: &mut AltSuffixes) {
    for field in from.iter_mut() {
        let outcome = merge_field(field, to, alts);
        if outcome == FieldMerge::Renamed {
            tracing::debug!(
                "field {} of source {} renamed to avoid a type clash",
                field.source_name,
                field.source_index
            );
        }
    }
}
