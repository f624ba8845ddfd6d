//! Plain-text views printed by the CLI.

use std::fmt::Write;

use insight_core::{Category, Statement, Transaction};
use insight_report::{CategorySummary, ComparisonReport, StatementStats};

const DETAIL_WIDTH: usize = 36;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(width.saturating_sub(1)).collect();
        s.push('…');
        s
    }
}

pub fn stats(stats: &StatementStats) -> String {
    format!(
        "Withdrawals: {}\nDeposits:    {}\nNet change:  {}\nTransactions: {}\n",
        stats.total_withdrawals, stats.total_deposits, stats.net_change, stats.transaction_count
    )
}

pub fn transactions(txs: &[Transaction]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<w$} {:<10} {:>12} {:>12}  Tag",
        "Date",
        "Detail",
        "Type",
        "Amount",
        "Balance",
        w = DETAIL_WIDTH
    );
    for tx in txs {
        let _ = writeln!(
            out,
            "{:<12} {:<w$} {:<10} {:>12} {:>12}  {}",
            tx.date.as_deref().unwrap_or("-"),
            clip(&tx.detail, DETAIL_WIDTH),
            tx.kind.to_string(),
            tx.amount.to_string(),
            tx.balance.to_string(),
            tx.tag,
            w = DETAIL_WIDTH
        );
    }
    out
}

/// Every category, then the home total and the untagged list.
pub fn categories(summary: &CategorySummary) -> String {
    let mut out = String::new();
    for category in Category::ALL {
        let _ = writeln!(out, "{:<14} {:>12}", category.as_str(), summary.total(category).to_string());
    }
    let _ = writeln!(out, "{:<14} {:>12}", "home & living", summary.home_total.to_string());

    if !summary.untagged.is_empty() {
        let _ = writeln!(
            out,
            "\nUntagged ({}, {}):",
            summary.untagged.len(),
            summary.untagged_total
        );
        for tx in &summary.untagged {
            let _ = writeln!(out, "  {:<w$} {:>12}", clip(&tx.detail, DETAIL_WIDTH), tx.amount.to_string(), w = DETAIL_WIDTH);
        }
    }
    out
}

pub fn statement(stmt: &Statement, st: &StatementStats, summary: &CategorySummary) -> String {
    format!(
        "== {} ==\n{}\n{}\n{}",
        stmt.file_name,
        stats(st),
        transactions(&stmt.transactions),
        categories(summary)
    )
}

/// One line per row with any spending. Rows that are zero everywhere are
/// left out here; the matrix itself always carries every row.
pub fn comparison(report: &ComparisonReport) -> String {
    let matrix = &report.matrix;
    let mut out = String::new();
    let _ = write!(out, "{:<20}", "Category");
    for name in &matrix.file_names {
        let _ = write!(out, " {:>14}", clip(name, 14));
    }
    let _ = writeln!(out);

    for row in matrix.rows_with_spending() {
        let _ = write!(out, "{:<20}", row.label);
        for dp in &row.data_points {
            let _ = write!(out, " {:>14}", dp.amount.to_string());
        }
        if let Some(comment) = report.comments.get(&row.label) {
            let _ = write!(out, "  {comment}");
        }
        let _ = writeln!(out);
    }
    out
}
