//! Core data models for purchase records

use serde::{Deserialize, Serialize};

/// One recorded purchase. Field names on the wire are camelCase so lists
/// written by the browser version of the app load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Purchase date, as entered (YYYY-MM-DD from the date picker)
    pub date: String,
    /// Amount paid, free-text numeric string
    pub amount_paid: String,
    /// Catalog id of the coin bought (e.g. "bitcoin")
    pub coin_bought: String,
    /// Unit price in the quote currency at creation time
    #[serde(default)]
    pub coin_value: Option<f64>,
}

impl Transaction {
    /// Case-insensitive containment over date, coin and amount.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.date.to_lowercase().contains(needle)
            || self.coin_bought.to_lowercase().contains(needle)
            || self.amount_paid.to_lowercase().contains(needle)
    }

    /// Amount paid as a number, when it parses
    pub fn amount_value(&self) -> Option<f64> {
        self.amount_paid.trim().parse::<f64>().ok()
    }

    /// Coins bought, when both amount and unit price are known
    pub fn quantity(&self) -> Option<f64> {
        match (self.amount_value(), self.coin_value) {
            (Some(amount), Some(price)) if price > 0.0 => Some(amount / price),
            _ => None,
        }
    }
}

/// The transaction being composed or edited in the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub date: String,
    pub amount_paid: String,
    pub coin_bought: String,
    #[serde(default)]
    pub coin_value: Option<f64>,
}

impl TransactionDraft {
    /// Current value of a field, as form text
    pub fn get(&self, field: FormField) -> String {
        match field {
            FormField::Date => self.date.clone(),
            FormField::AmountPaid => self.amount_paid.clone(),
            FormField::CoinBought => self.coin_bought.clone(),
            FormField::CoinValue => self.coin_value.map(|v| v.to_string()).unwrap_or_default(),
        }
    }

    /// Record with the draft's fields, keeping its coin value
    pub fn to_transaction(&self) -> Transaction {
        Transaction {
            date: self.date.clone(),
            amount_paid: self.amount_paid.clone(),
            coin_bought: self.coin_bought.clone(),
            coin_value: self.coin_value,
        }
    }

    /// Record with the draft's fields and a freshly resolved price
    pub fn with_price(&self, coin_value: Option<f64>) -> Transaction {
        Transaction {
            coin_value,
            ..self.to_transaction()
        }
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(tx: &Transaction) -> Self {
        Self {
            date: tx.date.clone(),
            amount_paid: tx.amount_paid.clone(),
            coin_bought: tx.coin_bought.clone(),
            coin_value: tx.coin_value,
        }
    }
}

/// Form fields, named as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Date,
    AmountPaid,
    CoinBought,
    CoinValue,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Date,
        FormField::AmountPaid,
        FormField::CoinBought,
        FormField::CoinValue,
    ];

    pub const REQUIRED: [FormField; 3] = [FormField::Date, FormField::AmountPaid, FormField::CoinBought];

    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Date => "date",
            FormField::AmountPaid => "amountPaid",
            FormField::CoinBought => "coinBought",
            FormField::CoinValue => "coinValue",
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, FormField::CoinValue)
    }
}

impl std::str::FromStr for FormField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(FormField::Date),
            "amountPaid" => Ok(FormField::AmountPaid),
            "coinBought" => Ok(FormField::CoinBought),
            "coinValue" => Ok(FormField::CoinValue),
            _ => Err(format!("Unknown form field: {}", s)),
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operating mode of the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Mode {
    /// Submitting appends a new record
    Creating,
    /// Submitting replaces the record at `index`
    Editing { index: usize },
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Creating
    }
}

impl Mode {
    pub fn is_editing(&self) -> bool {
        matches!(self, Mode::Editing { .. })
    }

    /// Submit button label for this mode
    pub fn submit_label(&self) -> &'static str {
        match self {
            Mode::Creating => "Add transaction",
            Mode::Editing { .. } => "Update transaction",
        }
    }
}

/// A transaction together with its position in the full list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedTransaction {
    pub index: usize,
    #[serde(flatten)]
    pub transaction: Transaction,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            date: "2024-01-01".to_string(),
            amount_paid: "100".to_string(),
            coin_bought: "bitcoin".to_string(),
            coin_value: Some(42000.0),
        }
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2024-01-01",
                "amountPaid": "100",
                "coinBought": "bitcoin",
                "coinValue": 42000.0
            })
        );
    }

    #[test]
    fn test_null_and_missing_coin_value() {
        let tx: Transaction = serde_json::from_str(
            r#"{"date":"2024-01-01","amountPaid":"5","coinBought":"dogecoin","coinValue":null}"#,
        )
        .unwrap();
        assert_eq!(tx.coin_value, None);

        let tx: Transaction =
            serde_json::from_str(r#"{"date":"2024-01-01","amountPaid":"5","coinBought":"dogecoin"}"#).unwrap();
        assert_eq!(tx.coin_value, None);
    }

    #[test]
    fn test_quantity() {
        let tx = sample();
        let qty = tx.quantity().unwrap();
        assert!((qty - 100.0 / 42000.0).abs() < 1e-12);

        let mut tx = sample();
        tx.coin_value = None;
        assert_eq!(tx.quantity(), None);

        let mut tx = sample();
        tx.amount_paid = "a lot".to_string();
        assert_eq!(tx.quantity(), None);
    }

    #[test]
    fn test_draft_round_trip() {
        let tx = sample();
        let draft = TransactionDraft::from(&tx);
        assert_eq!(draft.to_transaction(), tx);
        assert_eq!(draft.with_price(Some(1.0)).coin_value, Some(1.0));
        assert_eq!(draft.get(FormField::CoinValue), "42000");
    }

    #[test]
    fn test_form_field_names() {
        for field in FormField::ALL {
            assert_eq!(field.name().parse::<FormField>().unwrap(), field);
        }
        assert!("amount_paid".parse::<FormField>().is_err());
        assert!(!FormField::CoinValue.is_required());
        assert!(FormField::REQUIRED.iter().all(|f| f.is_required()));
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(Mode::default(), Mode::Creating);
        assert_eq!(Mode::Creating.submit_label(), "Add transaction");
        assert_eq!(Mode::Editing { index: 2 }.submit_label(), "Update transaction");
        assert_eq!(
            serde_json::to_value(Mode::Editing { index: 2 }).unwrap(),
            serde_json::json!({"mode": "editing", "index": 2})
        );
    }
}
