use insight_core::{Money, RawTransactionRecord, TransactionType};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::error::ImportError;

/// Wire shape of one provider row. Everything except `date` is required.
#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(default)]
    date: Option<String>,
    detail: String,
    #[serde(rename = "type")]
    kind: String,
    amount: Decimal,
    balance: Decimal,
    tag: String,
}

impl WireRecord {
    fn into_record(self, index: usize) -> Result<RawTransactionRecord, ImportError> {
        let kind = TransactionType::from_str(&self.kind)
            .map_err(|reason| ImportError::InvalidRecord { index, reason })?;
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(ImportError::InvalidRecord {
                index,
                reason: format!("negative amount {}", self.amount),
            });
        }
        Ok(RawTransactionRecord {
            date: self.date.filter(|d| !d.trim().is_empty()),
            detail: self.detail,
            kind,
            amount: Money::from_decimal(self.amount),
            balance: Money::from_decimal(self.balance),
            tag: self.tag,
        })
    }
}

/// Decodes the extraction provider's text response into raw records.
///
/// The whole response is rejected if it is not a JSON array or if any element
/// lacks a required field; no partial result is produced.
pub fn parse_records(response: &str) -> Result<Vec<RawTransactionRecord>, ImportError> {
    let value: Value = serde_json::from_str(strip_code_fence(response))?;
    let Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let wire: WireRecord = serde_json::from_value(item).map_err(|e| ImportError::InvalidRecord {
                index,
                reason: e.to_string(),
            })?;
            wire.into_record(index)
        })
        .collect()
}

/// Models sometimes wrap JSON mode output in a Markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
