use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::date;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Withdrawal => write!(f, "withdrawal"),
            TransactionType::Deposit => write!(f, "deposit"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "deposit" => Ok(TransactionType::Deposit),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

/// Session-scoped identifier; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0.simple())
    }
}

/// One row as returned by the extraction provider, before reconciliation.
/// `tag` is the provider's provisional guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransactionRecord {
    pub date: Option<String>,
    pub detail: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Money,
    pub balance: Money,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: Option<String>,
    pub detail: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Money,
    pub balance: Money,
    pub tag: String,
}

impl Transaction {
    /// Consumes a raw record, assigning a fresh id and the final tag.
    pub fn from_record(record: RawTransactionRecord, tag: String) -> Self {
        Transaction {
            id: TransactionId::new(),
            date: record.date,
            detail: record.detail,
            kind: record.kind,
            amount: record.amount,
            balance: record.balance,
            tag,
        }
    }

    pub fn is_withdrawal(&self) -> bool {
        self.kind == TransactionType::Withdrawal
    }

    /// Folds a tax or service-charge line into this transaction: the amount
    /// grows by the fee and the balance becomes the fee line's balance.
    pub fn absorb(&mut self, fee: &RawTransactionRecord) {
        self.amount += fee.amount;
        self.balance = fee.balance;
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(date::parse_statement_date)
    }
}

/// All transactions extracted from one uploaded PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub file_name: String,
    /// SHA-256 hex digest of the source PDF.
    pub digest: String,
    pub transactions: Vec<Transaction>,
}

impl Statement {
    pub fn new(file_name: impl Into<String>, digest: impl Into<String>, transactions: Vec<Transaction>) -> Self {
        Statement {
            file_name: file_name.into(),
            digest: digest.into(),
            transactions,
        }
    }

    /// Earliest parseable transaction date; `None` when no date parses.
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().filter_map(Transaction::parsed_date).min()
    }
}
