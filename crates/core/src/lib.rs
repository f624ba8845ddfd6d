pub mod category;
pub mod date;
pub mod money;
pub mod transaction;

pub use category::Category;
pub use date::parse_statement_date;
pub use money::Money;
pub use transaction::{RawTransactionRecord, Statement, Transaction, TransactionId, TransactionType};
