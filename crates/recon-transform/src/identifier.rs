//! Identifier rewrite rules.
//!
//! Rules are pure functions over the identifier charset (ASCII letters,
//! digits, `.`, `-`, `_`). Anything outside that charset is rejected instead
//! of being rewritten into a corrupted identifier.
//!
//! Prefix and suffix rules are not idempotent: applying `suffix "-27-0-0"`
//! twice appends it twice. Column rewrites guard against that with
//! [`recon_model::RewriteGuard`]; see [`crate::rewrite`].

use recon_model::{IdentifierRule, ReconError, Result};

pub fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_')
}

pub fn validate_identifier(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ReconError::validation("empty identifier"));
    }
    if let Some(bad) = value.chars().find(|ch| !is_identifier_char(*ch)) {
        return Err(ReconError::validation(format!(
            "identifier '{value}' contains unsupported character {bad:?}"
        )));
    }
    Ok(())
}

fn validate_literal(rule: &str, field: &str, value: &str, allow_empty: bool) -> Result<()> {
    if value.is_empty() {
        if allow_empty {
            return Ok(());
        }
        return Err(ReconError::validation(format!(
            "{rule} rule: '{field}' must not be empty"
        )));
    }
    if let Some(bad) = value.chars().find(|ch| !is_identifier_char(*ch)) {
        return Err(ReconError::validation(format!(
            "{rule} rule: '{field}' contains unsupported character {bad:?}"
        )));
    }
    Ok(())
}

/// Checks that a rule's literal parameters stay inside the identifier charset.
pub fn validate_rule(rule: &IdentifierRule) -> Result<()> {
    match rule {
        IdentifierRule::Prefix { value } | IdentifierRule::Suffix { value } => {
            validate_literal(rule.label(), "value", value, false)
        }
        IdentifierRule::Substitute { from, to } => {
            validate_literal(rule.label(), "from", from, false)?;
            validate_literal(rule.label(), "to", to, true)
        }
        IdentifierRule::SplitTake { separator, .. } => {
            validate_literal(rule.label(), "separator", separator, false)
        }
        IdentifierRule::SkipChars { .. } => Ok(()),
        IdentifierRule::Chain { rules } => {
            if rules.is_empty() {
                return Err(ReconError::validation("chain rule has no rules"));
            }
            rules.iter().try_for_each(validate_rule)
        }
    }
}

/// Applies `rule` to `id`.
///
/// # Errors
///
/// Returns a validation error when `id` is empty or outside the identifier
/// charset, when the rule's parameters are invalid, or when the rule cannot
/// produce a non-empty identifier (for example a missing split part).
pub fn transform_identifier(id: &str, rule: &IdentifierRule) -> Result<String> {
    validate_identifier(id)?;
    validate_rule(rule)?;
    let rewritten = apply(id, rule)?;
    if rewritten.is_empty() {
        return Err(ReconError::validation(format!(
            "{} rule turned '{id}' into an empty identifier",
            rule.label()
        )));
    }
    Ok(rewritten)
}

fn apply(id: &str, rule: &IdentifierRule) -> Result<String> {
    match rule {
        IdentifierRule::Prefix { value } => Ok(format!("{value}{id}")),
        IdentifierRule::Suffix { value } => Ok(format!("{id}{value}")),
        IdentifierRule::Substitute { from, to } => {
            let mut out = String::with_capacity(id.len());
            for ch in id.chars() {
                if from.contains(ch) {
                    out.push_str(to);
                } else {
                    out.push(ch);
                }
            }
            Ok(out)
        }
        IdentifierRule::SplitTake { separator, index } => id
            .split(separator.as_str())
            .nth(*index)
            .map(str::to_string)
            .ok_or_else(|| {
                ReconError::validation(format!(
                    "identifier '{id}' has no part {index} when split on '{separator}'"
                ))
            }),
        IdentifierRule::SkipChars { count } => {
            if id.chars().count() <= *count {
                return Err(ReconError::validation(format!(
                    "identifier '{id}' is too short to drop {count} characters"
                )));
            }
            Ok(id.chars().skip(*count).collect())
        }
        IdentifierRule::Chain { rules } => {
            let mut current = id.to_string();
            for inner in rules {
                current = transform_identifier(&current, inner)?;
            }
            Ok(current)
        }
    }
}

/// Whether re-application of `rule` can be detected from its output alone.
pub fn is_detectable(rule: &IdentifierRule) -> bool {
    match rule {
        IdentifierRule::Prefix { .. }
        | IdentifierRule::Suffix { .. }
        | IdentifierRule::Substitute { .. } => true,
        IdentifierRule::SplitTake { .. } | IdentifierRule::SkipChars { .. } => false,
        IdentifierRule::Chain { rules } => rules.iter().all(is_detectable),
    }
}

/// Returns true when `value` already carries the effect of `rule`.
///
/// # Errors
///
/// Rules whose output does not reveal whether they ran (`split_take`,
/// `skip_chars`) cannot be checked and return a validation error.
pub fn is_applied(value: &str, rule: &IdentifierRule) -> Result<bool> {
    match rule {
        IdentifierRule::Prefix { value: prefix } => Ok(value.starts_with(prefix.as_str())),
        IdentifierRule::Suffix { value: suffix } => Ok(value.ends_with(suffix.as_str())),
        IdentifierRule::Substitute { .. } => Ok(apply(value, rule)? == value),
        IdentifierRule::SplitTake { .. } | IdentifierRule::SkipChars { .. } => {
            Err(ReconError::validation(format!(
                "{} rule cannot tell whether it was already applied; use guard from_column",
                rule.label()
            )))
        }
        IdentifierRule::Chain { rules } => {
            for inner in rules {
                if !is_applied(value, inner)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}
