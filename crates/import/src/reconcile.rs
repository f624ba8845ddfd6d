use std::sync::OnceLock;

use insight_core::{RawTransactionRecord, Transaction, TransactionType};
use tracing::debug;

use crate::error::ImportError;
use crate::keyword::KeywordMatcher;
use crate::records::parse_records;
use crate::rules::{fallback_tag, TagClassifier};

fn fee_matcher() -> &'static KeywordMatcher {
    static M: OnceLock<KeywordMatcher> = OnceLock::new();
    M.get_or_init(|| KeywordMatcher::new(["VAT", "SVC CHG"]).expect("fee keywords are escaped"))
}

/// Whether a detail line is a tax or service charge belonging to the
/// withdrawal printed above it.
pub fn is_fee_line(detail: &str) -> bool {
    fee_matcher().is_match(detail)
}

/// Single forward pass turning provider rows into canonical transactions.
pub struct Reconciler<'a> {
    classifier: &'a TagClassifier,
}

impl<'a> Reconciler<'a> {
    pub fn new(classifier: &'a TagClassifier) -> Self {
        Self { classifier }
    }

    /// Order of non-merged rows is preserved. Fee rows are folded into the
    /// nearest earlier withdrawal; with no earlier withdrawal they stand alone.
    /// The recurring charge is attributed to its tag only on its first
    /// occurrence; later look-alikes keep their detail as tag.
    pub fn reconcile(&self, records: Vec<RawTransactionRecord>) -> Vec<Transaction> {
        let mut out: Vec<Transaction> = Vec::with_capacity(records.len());
        let mut recurring_seen = false;

        for record in records {
            if is_fee_line(&record.detail) {
                if let Some(target) = out.iter_mut().rev().find(|t| t.kind == TransactionType::Withdrawal) {
                    debug!(fee = %record.detail, into = %target.detail, amount = %record.amount, "merging fee line");
                    target.absorb(&record);
                    continue;
                }
            }

            let tag = self.tag_for(&record, &mut recurring_seen);
            out.push(Transaction::from_record(record, tag));
        }

        out
    }

    /// Decodes a provider response and reconciles it in one step.
    pub fn reconcile_response(&self, response: &str) -> Result<Vec<Transaction>, ImportError> {
        Ok(self.reconcile(parse_records(response)?))
    }

    fn tag_for(&self, record: &RawTransactionRecord, recurring_seen: &mut bool) -> String {
        if let Some(rule) = self.classifier.find_matching_rule(&record.detail) {
            return rule.tag.clone();
        }
        if self.classifier.is_recurring_charge(record) {
            if *recurring_seen {
                debug!(detail = %record.detail, "repeat recurring charge left untagged");
                return record.detail.clone();
            }
            *recurring_seen = true;
            return self.classifier.recurring_charge().tag.clone();
        }
        fallback_tag(&record.detail, &record.tag)
    }
}

/// Convenience wrapper using the built-in rule table.
pub fn reconcile(records: Vec<RawTransactionRecord>) -> Vec<Transaction> {
    let classifier = TagClassifier::builtin();
    Reconciler::new(&classifier).reconcile(records)
}
