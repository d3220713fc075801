//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse an optional UUID column.
pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|raw| parse_uuid(raw, label)).transpose()
}

/// Reject blank names.
///
/// The name is kept exactly as given: sibling uniqueness compares names
/// byte for byte, so trimming here would change which names collide.
pub(crate) fn ensure_required_name(value: &str, label: &str) -> ResultEngine<()> {
    if value.trim().is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(
            ensure_required_name("   ", "category"),
            Err(EngineError::InvalidName(
                "category name must not be empty".to_string()
            ))
        );
        assert!(ensure_required_name(" Drinks ", "category").is_ok());
    }

    #[test]
    fn optional_text_drops_blank_values() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(
            normalize_optional_text(Some(" BEV ")),
            Some("BEV".to_string())
        );
        assert_eq!(normalize_optional_text(None), None);
    }

    #[test]
    fn parse_uuid_labels_failures() {
        assert_eq!(
            parse_uuid("nope", "category"),
            Err(EngineError::InvalidId("invalid category id".to_string()))
        );
    }
}
