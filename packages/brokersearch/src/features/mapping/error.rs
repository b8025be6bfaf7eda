//! Conversion error

use serde_json::Value;
use thiserror::Error;

/// A present value that a converter could not coerce
///
/// Always fatal: malformed upstream data stops the synchronization instead of
/// silently dropping the field. Legitimately missing output is modelled as
/// `Ok(None)` by the converters and never reaches this type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {field_label}{value} with '{converter}': {reason}")]
pub struct ConversionError {
    /// Converter name (`integer`, `iso_date`, ...)
    pub converter: &'static str,
    /// Source field, filled in by the transformer
    pub field: Option<String>,
    /// Rendering of the offending value (truncated)
    pub value: String,
    pub reason: String,
    field_label: String,
}

const MAX_VALUE_RENDER: usize = 64;

impl ConversionError {
    pub fn new(converter: &'static str, value: &Value, reason: impl Into<String>) -> Self {
        let mut rendered = value.to_string();
        if rendered.len() > MAX_VALUE_RENDER {
            let cut = (0..=MAX_VALUE_RENDER)
                .rev()
                .find(|i| rendered.is_char_boundary(*i))
                .unwrap_or(0);
            rendered.truncate(cut);
            rendered.push('…');
        }
        Self {
            converter,
            field: None,
            value: rendered,
            reason: reason.into(),
            field_label: String::new(),
        }
    }

    /// Attach the source field the value was read from
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.field_label = format!("field '{}' = ", field);
        self.field = Some(field);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::new("integer", &json!("abc"), "not an integer");
        assert_eq!(
            err.to_string(),
            "cannot convert \"abc\" with 'integer': not an integer"
        );

        let err = err.with_field("cycle");
        assert_eq!(err.field.as_deref(), Some("cycle"));
        assert_eq!(
            err.to_string(),
            "cannot convert field 'cycle' = \"abc\" with 'integer': not an integer"
        );
    }

    #[test]
    fn test_conversion_error_truncates_large_values() {
        let big = json!("x".repeat(500));
        let err = ConversionError::new("float", &big, "not a number");
        assert!(err.value.chars().count() <= MAX_VALUE_RENDER + 1);
        assert!(err.value.ends_with('…'));
    }
}
