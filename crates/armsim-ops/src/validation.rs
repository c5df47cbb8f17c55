use crate::error::{OpError, OpResult};

/// Reject an empty required parameter.
pub fn require<'a>(field: &str, value: &'a str) -> OpResult<&'a str> {
    if value.is_empty() {
        Err(OpError::InvalidInput(format!("{field} cannot be empty")))
    } else {
        Ok(value)
    }
}

/// Render a key-value label for messages.
pub(crate) fn label_display(label: Option<&str>) -> String {
    match label {
        Some(label) => format!("'{label}'"),
        None => "(no label)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_rejected() {
        assert!(matches!(
            require("subscription", ""),
            Err(OpError::InvalidInput(msg)) if msg.contains("subscription")
        ));
        assert_eq!(require("key", " k ").unwrap(), " k ");
    }

    #[test]
    fn labels_render_distinctly() {
        assert_eq!(label_display(None), "(no label)");
        assert_eq!(label_display(Some("")), "''");
    }
}
