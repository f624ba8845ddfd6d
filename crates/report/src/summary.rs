use std::collections::BTreeMap;

use insight_core::{Category, Money, Transaction, TransactionType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementStats {
    pub total_withdrawals: Money,
    pub total_deposits: Money,
    /// Deposits minus withdrawals; negative when the account shrank.
    pub net_change: Money,
    pub transaction_count: usize,
}

pub fn aggregate(transactions: &[Transaction]) -> StatementStats {
    let (total_withdrawals, total_deposits) =
        transactions
            .iter()
            .fold((Money::zero(), Money::zero()), |(w, d), tx| match tx.kind {
                TransactionType::Withdrawal => (w + tx.amount, d),
                TransactionType::Deposit => (w, d + tx.amount),
            });

    StatementStats {
        total_withdrawals,
        total_deposits,
        net_change: total_deposits - total_withdrawals,
        transaction_count: transactions.len(),
    }
}

/// Spending broken down by category. Only withdrawals are counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    /// Every fixed category, zero when nothing was spent.
    pub per_tag: BTreeMap<Category, Money>,
    pub home_total: Money,
    /// Withdrawals whose tag is outside the fixed list, in statement order.
    pub untagged: Vec<Transaction>,
    pub untagged_total: Money,
}

impl CategorySummary {
    pub fn total(&self, category: Category) -> Money {
        self.per_tag.get(&category).copied().unwrap_or_default()
    }

    pub fn categorized_total(&self) -> Money {
        self.per_tag.values().sum()
    }
}

pub fn summarize(transactions: &[Transaction]) -> CategorySummary {
    let mut per_tag: BTreeMap<Category, Money> =
        Category::ALL.into_iter().map(|c| (c, Money::zero())).collect();
    let mut untagged = Vec::new();
    let mut untagged_total = Money::zero();

    for tx in transactions.iter().filter(|t| t.is_withdrawal()) {
        match Category::from_tag(&tx.tag) {
            Some(category) => *per_tag.entry(category).or_default() += tx.amount,
            None => {
                untagged_total += tx.amount;
                untagged.push(tx.clone());
            }
        }
    }

    let home_total = Category::HOME_AND_LIVING
        .iter()
        .filter_map(|c| per_tag.get(c))
        .sum();

    CategorySummary {
        per_tag,
        home_total,
        untagged,
        untagged_total,
    }
}
