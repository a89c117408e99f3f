use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;

const PREFIX: &str = "ORD-";

/// Human-facing order number of the form `ORD-YYYYMMDD-xxxxxxxx`.
///
/// The date is the day the order was placed and the suffix is eight hex
/// characters of a random UUID. Numbers are unique per order; the repository
/// enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generates a fresh number for an order placed at `placed_at`.
    pub fn generate(placed_at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{PREFIX}{}-{}",
            placed_at.format("%Y%m%d"),
            &suffix[..8]
        ))
    }

    /// Validates a client-supplied order number.
    ///
    /// The hex suffix is folded to lowercase, matching generated numbers.
    pub fn parse(value: &str) -> Result<Self, OrderError> {
        let invalid = || OrderError::InvalidOrderNumber(value.to_string());

        let rest = value.strip_prefix(PREFIX).ok_or_else(invalid)?;
        let (date, suffix) = rest.split_once('-').ok_or_else(invalid)?;

        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;

        if suffix.len() != 8 || !suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        Ok(Self(format!(
            "{PREFIX}{date}-{}",
            suffix.to_ascii_lowercase()
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_generated_numbers_embed_the_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let number = OrderNumber::generate(at);

        assert!(number.as_str().starts_with("ORD-20240309-"));
        assert_eq!(number.as_str().len(), "ORD-20240309-".len() + 8);
        assert_eq!(OrderNumber::parse(number.as_str()).unwrap(), number);
    }

    #[test]
    fn test_generated_numbers_differ() {
        let at = Utc::now();
        assert_ne!(OrderNumber::generate(at), OrderNumber::generate(at));
    }

    #[test]
    fn test_parse_rejects_malformed_numbers() {
        for bad in [
            "",
            "ORD-",
            "ORD-20240309",
            "ORD-2024039-deadbeef",
            "ORD-20241309-deadbeef",
            "ORD-20240309-deadbee",
            "ORD-20240309-deadbeefx",
            "ORD-20240309-zzzzzzzz",
            "XYZ-20240309-deadbeef",
        ] {
            assert!(OrderNumber::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_folds_suffix_case() {
        let upper = OrderNumber::parse("ORD-20240309-DEADBEEF").unwrap();
        let lower = OrderNumber::parse("ORD-20240309-deadbeef").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "ORD-20240309-deadbeef");
    }

    #[test]
    fn test_deserialization_validates() {
        let ok: OrderNumber = serde_json::from_str("\"ORD-20240309-deadbeef\"").unwrap();
        assert_eq!(ok.as_str(), "ORD-20240309-deadbeef");
        assert!(serde_json::from_str::<OrderNumber>("\"nope\"").is_err());
    }
}
