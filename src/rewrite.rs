use crate::config::RewriteRule;
use crate::errors::{MergeError, Result};
use crate::merge::model::{Field, MergedOutput};
use regex::Regex;

/// Marker in a rule's transform replaced by the captured text.
const CAPTURE_MARKER: &str = "$";

#[derive(Debug)]
struct CompiledRule {
    pattern: Regex,
    transform: String,
}

/// Ordered regex-substitution rules applied to generated identifiers.
#[derive(Debug, Default)]
pub struct Rewriter {
    rules: Vec<CompiledRule>,
}

impl Rewriter {
    pub fn compile(rules: &[RewriteRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern =
                    Regex::new(&rule.pattern).map_err(|source| MergeError::InvalidRewrite {
                        pattern: rule.pattern.clone(),
                        source,
                    })?;
                if pattern.captures_len() != 2 {
                    tracing::warn!(
                        "rewrite pattern '{}' needs exactly one capture group and never applies",
                        rule.pattern
                    );
                }
                Ok(CompiledRule {
                    pattern,
                    transform: rule.transform.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite `input` with the first rule that matches with exactly one
    /// capture group. Unmatched input is returned unchanged.
    pub fn rewrite(&self, input: &str) -> String {
        for rule in &self.rules {
            let Some(caps) = rule.pattern.captures(input) else {
                continue;
            };
            if caps.len() != 2 {
                continue;
            }
            let captured = caps.get(1).map_or("", |m| m.as_str());
            return rule.transform.replace(CAPTURE_MARKER, captured);
        }
        input.to_string()
    }

    /// Rewrite every output-facing name and type in `output`.
    ///
    /// Variation names and flattened source field names refer to the
    /// underlying implementations and are left alone.
    pub fn apply(&self, output: &mut MergedOutput) {
        if self.is_empty() {
            return;
        }

        for field in &mut output.init_args {
            self.rewrite_field(field);
        }
        for source in &mut output.sources {
            for field in &mut source.init_args {
                self.rewrite_field(field);
            }
        }

        for method in &mut output.methods {
            method.name = self.rewrite(&method.name);
            method.return_type.name = self.rewrite(&method.return_type.name);
            for field in method.args.iter_mut().chain(&mut method.return_type.fields) {
                self.rewrite_field(field);
            }
            for variation in &mut method.variations {
                for field in variation
                    .args
                    .iter_mut()
                    .chain(&mut variation.returned_fields)
                {
                    self.rewrite_field(field);
                }
            }
        }
    }

    fn rewrite_field(&self, field: &mut Field) {
        field.name = self.rewrite(&field.name);
        field.ty = self.rewrite(&field.ty);
    }
}
