//! Reservation records as seen by the aggregator.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use roost_core::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reservation statuses that count toward revenue.
pub const COUNTED_STATUSES: [&str; 3] = ["new", "modified", "ownerStay"];

/// Channel-specific payout; preferred when present.
const PAYOUT_FIELD: &str = "airbnbExpectedPayoutAmount";
const TOTAL_PRICE_FIELD: &str = "totalPrice";
const ARRIVAL_FIELD: &str = "arrivalDate";
const STATUS_FIELD: &str = "status";

/// One reservation reduced to what revenue bucketing needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRecord {
    pub arrival_date: NaiveDate,
    pub amount: f64,
    pub status: String,
}

impl RevenueRecord {
    pub fn new(arrival_date: NaiveDate, amount: f64, status: impl Into<String>) -> Self {
        Self {
            arrival_date,
            amount,
            status: status.into(),
        }
    }

    /// Whether the status is one that counts toward revenue.
    pub fn is_counted(&self) -> bool {
        COUNTED_STATUSES.contains(&self.status.as_str())
    }

    /// Arrival as an instant: the calendar date at 00:00 UTC.
    pub fn arrival_instant(&self) -> DateTime<Utc> {
        self.arrival_date.and_time(NaiveTime::MIN).and_utc()
    }

    /// Parse a raw reservation object.
    ///
    /// Needs `arrivalDate` (`YYYY-MM-DD`, optionally followed by a time),
    /// `status`, and one of `airbnbExpectedPayoutAmount` / `totalPrice`
    /// as a number or numeric string.
    pub fn from_reservation(value: &Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::InvalidFieldValue {
                field: "reservation".to_string(),
                value: truncate(&value.to_string()),
                reason: "expected an object".to_string(),
            })?;

        let arrival_raw = object
            .get(ARRIVAL_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(ARRIVAL_FIELD))?;
        let arrival_date = parse_arrival(arrival_raw)?;

        let status = object
            .get(STATUS_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(STATUS_FIELD))?;

        let amount = match present(object.get(PAYOUT_FIELD)) {
            Some(payout) => parse_amount(PAYOUT_FIELD, payout)?,
            None => {
                let total = present(object.get(TOTAL_PRICE_FIELD))
                    .ok_or_else(|| missing(TOTAL_PRICE_FIELD))?;
                parse_amount(TOTAL_PRICE_FIELD, total)?
            }
        };

        Ok(Self::new(arrival_date, amount, status))
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn missing(field: &str) -> ValidationError {
    ValidationError::RequiredFieldMissing {
        field: field.to_string(),
    }
}

fn parse_arrival(raw: &str) -> Result<NaiveDate, ValidationError> {
    raw.trim()
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .ok_or_else(|| ValidationError::InvalidFieldValue {
            field: ARRIVAL_FIELD.to_string(),
            value: truncate(raw),
            reason: "expected YYYY-MM-DD".to_string(),
        })
}

fn parse_amount(field: &str, value: &Value) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| ValidationError::InvalidFieldValue {
            field: field.to_string(),
            value: truncate(&value.to_string()),
            reason: "expected a finite number".to_string(),
        })
}

fn truncate(raw: &str) -> String {
    raw.chars().take(64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_payout_preferred_over_total_price() {
        let record = RevenueRecord::from_reservation(&json!({
            "arrivalDate": "2024-06-01",
            "status": "new",
            "airbnbExpectedPayoutAmount": 420.5,
            "totalPrice": 500
        }))
        .unwrap();
        assert_eq!(record.amount, 420.5);
        assert_eq!(record.arrival_date, date(2024, 6, 1));
    }

    #[test]
    fn test_null_payout_falls_back_to_total_price() {
        let record = RevenueRecord::from_reservation(&json!({
            "arrivalDate": "2024-06-01 15:00:00",
            "status": "modified",
            "airbnbExpectedPayoutAmount": null,
            "totalPrice": "310.25"
        }))
        .unwrap();
        assert_eq!(record.amount, 310.25);
        assert!(record.is_counted());
    }

    #[test]
    fn test_missing_amount_is_rejected() {
        let err = RevenueRecord::from_reservation(&json!({
            "arrivalDate": "2024-06-01",
            "status": "new"
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::RequiredFieldMissing {
                field: "totalPrice".to_string()
            }
        );
    }

    #[test]
    fn test_bad_date_and_shape_are_rejected() {
        assert!(RevenueRecord::from_reservation(&json!({
            "arrivalDate": "06/01/2024",
            "status": "new",
            "totalPrice": 1
        }))
        .is_err());
        assert!(RevenueRecord::from_reservation(&json!([1, 2, 3])).is_err());
        assert!(RevenueRecord::from_reservation(&json!({
            "arrivalDate": "2024-06-01",
            "status": "new",
            "totalPrice": {"amount": 1}
        }))
        .is_err());
    }

    #[test]
    fn test_counted_statuses() {
        let d = date(2024, 1, 1);
        assert!(RevenueRecord::new(d, 1.0, "ownerStay").is_counted());
        assert!(!RevenueRecord::new(d, 1.0, "cancelled").is_counted());
        assert!(!RevenueRecord::new(d, 1.0, "inquiry").is_counted());
    }

    #[test]
    fn test_arrival_instant_is_midnight_utc() {
        let record = RevenueRecord::new(date(2024, 2, 29), 0.0, "new");
        assert_eq!(record.arrival_instant().to_rfc3339(), "2024-02-29T00:00:00+00:00");
    }
}
