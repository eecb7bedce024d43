//! Per-field form validation
//!
//! Rules:
//! - date, amountPaid, coinBought: required (non-blank)
//! - coinValue: optional, must parse as a finite number when present

use crate::models::{FormField, Mode, TransactionDraft};
use serde::Serialize;
use std::collections::BTreeMap;

/// Error messages keyed by field. A field with no entry is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(|s| s.as_str())
    }

    pub fn set(&mut self, field: FormField, message: Option<String>) {
        match message {
            Some(message) => {
                self.0.insert(field, message);
            }
            None => {
                self.0.remove(&field);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }
}

/// Validate one raw field value as typed into the form
pub fn validate_field(field: FormField, value: &str) -> Option<String> {
    match field {
        FormField::CoinValue => {
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            match value.parse::<f64>() {
                Ok(v) if v.is_finite() => None,
                _ => Some(format!("{} must be a number!", field)),
            }
        }
        _ if value.trim().is_empty() => Some(format!("{} is required!", field)),
        _ => None,
    }
}

/// Parse a coin value the way `validate_field` accepts it
pub fn parse_coin_value(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Final check before a submit. Returns the offending fields, empty when
/// the draft may be submitted.
///
/// Required fields must be non-blank and carry no error. A coinValue error
/// only blocks in edit mode; in create mode the value is replaced by the
/// price lookup.
pub fn blocking_fields(draft: &TransactionDraft, errors: &FieldErrors, mode: Mode) -> Vec<FormField> {
    let mut fields: Vec<FormField> = FormField::REQUIRED
        .iter()
        .copied()
        .filter(|&field| draft.get(field).trim().is_empty() || errors.get(field).is_some())
        .collect();

    if mode.is_editing() && errors.get(FormField::CoinValue).is_some() {
        fields.push(FormField::CoinValue);
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> TransactionDraft {
        TransactionDraft {
            date: "2024-01-01".to_string(),
            amount_paid: "100".to_string(),
            coin_bought: "bitcoin".to_string(),
            coin_value: None,
        }
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(validate_field(FormField::Date, ""), Some("date is required!".to_string()));
        assert_eq!(validate_field(FormField::AmountPaid, "   "), Some("amountPaid is required!".to_string()));
        assert_eq!(validate_field(FormField::CoinBought, "bitcoin"), None);
    }

    #[test]
    fn test_coin_value_rules() {
        assert_eq!(validate_field(FormField::CoinValue, ""), None);
        assert_eq!(validate_field(FormField::CoinValue, "42000.5"), None);
        assert_eq!(validate_field(FormField::CoinValue, "abc"), Some("coinValue must be a number!".to_string()));
        assert!(validate_field(FormField::CoinValue, "NaN").is_some());
        assert_eq!(parse_coin_value(" 1e3 "), Some(1000.0));
        assert_eq!(parse_coin_value("inf"), None);
    }

    #[test]
    fn test_field_errors_set_and_clear() {
        let mut errors = FieldErrors::new();
        errors.set(FormField::Date, Some("date is required!".to_string()));
        assert_eq!(errors.get(FormField::Date), Some("date is required!"));
        errors.set(FormField::Date, None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_blocking_fields_on_blank_draft() {
        let fields = blocking_fields(&TransactionDraft::default(), &FieldErrors::new(), Mode::Creating);
        assert_eq!(fields, FormField::REQUIRED.to_vec());
    }

    #[test]
    fn test_blocking_fields_respects_recorded_errors() {
        let mut errors = FieldErrors::new();
        errors.set(FormField::AmountPaid, Some("amountPaid is required!".to_string()));
        let fields = blocking_fields(&filled(), &errors, Mode::Creating);
        assert_eq!(fields, vec![FormField::AmountPaid]);
    }

    #[test]
    fn test_coin_value_error_blocks_only_when_editing() {
        let mut errors = FieldErrors::new();
        errors.set(FormField::CoinValue, Some("coinValue must be a number!".to_string()));
        assert!(blocking_fields(&filled(), &errors, Mode::Creating).is_empty());
        assert_eq!(
            blocking_fields(&filled(), &errors, Mode::Editing { index: 0 }),
            vec![FormField::CoinValue]
        );
    }

    #[test]
    fn test_errors_serialize_by_wire_name() {
        let mut errors = FieldErrors::new();
        errors.set(FormField::CoinBought, Some("coinBought is required!".to_string()));
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"coinBought": "coinBought is required!"})
        );
    }
}
