pub mod error;
pub mod keyword;
pub mod reconcile;
pub mod records;
pub mod rules;

pub use error::ImportError;
pub use keyword::KeywordMatcher;
pub use reconcile::{is_fee_line, reconcile, Reconciler};
pub use records::parse_records;
pub use rules::{builtin_rules, RecurringChargeRule, TagClassifier, TagRule};
