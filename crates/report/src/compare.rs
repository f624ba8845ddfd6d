use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;
use insight_core::{Category, Money, Statement};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub const HOME_AND_LIVING_LABEL: &str = "Home & Living Total";
/// Shown when the commenter answered with empty text.
pub const NO_ANALYSIS: &str = "No analysis available.";
/// Shown when the commenter failed.
pub const ANALYSIS_UNAVAILABLE: &str = "Analysis unavailable.";

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Trend comment request failed: {0}")]
    Provider(String),
}

/// Turns one row's per-statement totals into a short sentence.
#[async_trait]
pub trait TrendCommenter: Send + Sync {
    async fn comment(&self, label: &str, points: &[DataPoint]) -> Result<String, CommentError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub file_name: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    /// `None` for the Home & Living composite row.
    pub category: Option<Category>,
    pub data_points: Vec<DataPoint>,
}

impl ComparisonRow {
    pub fn has_spending(&self) -> bool {
        self.data_points.iter().any(|dp| dp.amount.is_positive())
    }

    pub fn is_composite(&self) -> bool {
        self.category.is_none()
    }
}

/// Category × statement withdrawal totals. Columns are in chronological order;
/// all rows are present, including all-zero ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMatrix {
    pub file_names: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonMatrix {
    pub fn row(&self, label: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn rows_with_spending(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(|r| r.has_spending())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub matrix: ComparisonMatrix,
    /// Row label → trend sentence, for rows that were commented on.
    pub comments: BTreeMap<String, String>,
}

/// Oldest statement first, keyed on each statement's earliest parseable date.
/// Statements without any parseable date sort first; ties keep input order.
pub fn sort_chronologically(statements: &[Statement]) -> Vec<&Statement> {
    let mut sorted: Vec<&Statement> = statements.iter().collect();
    sorted.sort_by_key(|s| s.earliest_date());
    sorted
}

fn withdrawal_total(statement: &Statement, include: impl Fn(Category) -> bool) -> Money {
    statement
        .transactions
        .iter()
        .filter(|t| t.is_withdrawal())
        .filter(|t| Category::from_tag(&t.tag).is_some_and(&include))
        .map(|t| t.amount)
        .sum()
}

pub fn compare(statements: &[Statement]) -> ComparisonMatrix {
    let sorted = sort_chronologically(statements);

    let points = |include: &dyn Fn(Category) -> bool| -> Vec<DataPoint> {
        sorted
            .iter()
            .map(|s| DataPoint {
                file_name: s.file_name.clone(),
                amount: withdrawal_total(s, include),
            })
            .collect()
    };

    let mut rows: Vec<ComparisonRow> = Category::ALL
        .into_iter()
        .map(|category| ComparisonRow {
            label: category.to_string(),
            category: Some(category),
            data_points: points(&|c| c == category),
        })
        .collect();

    rows.push(ComparisonRow {
        label: HOME_AND_LIVING_LABEL.to_string(),
        category: None,
        data_points: points(&|c: Category| c.is_home_and_living()),
    });

    ComparisonMatrix {
        file_names: sorted.iter().map(|s| s.file_name.clone()).collect(),
        rows,
    }
}

/// Requests a trend sentence for every row with spending, all at once, and
/// waits for every request to settle. A failed request degrades to
/// [`ANALYSIS_UNAVAILABLE`] for its row only. With fewer than two statements
/// there is no trend to describe and nothing is requested.
pub async fn annotate<C>(matrix: &ComparisonMatrix, commenter: &C) -> BTreeMap<String, String>
where
    C: TrendCommenter + ?Sized,
{
    if matrix.file_names.len() < 2 {
        return BTreeMap::new();
    }

    let requests = matrix.rows_with_spending().map(|row| async move {
        let text = match commenter.comment(&row.label, &row.data_points).await {
            Ok(text) if text.trim().is_empty() => NO_ANALYSIS.to_string(),
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(row = %row.label, error = %e, "trend comment failed");
                ANALYSIS_UNAVAILABLE.to_string()
            }
        };
        (row.label.clone(), text)
    });

    join_all(requests).await.into_iter().collect()
}

pub async fn compare_with_comments<C>(statements: &[Statement], commenter: &C) -> ComparisonReport
where
    C: TrendCommenter + ?Sized,
{
    let matrix = compare(statements);
    let comments = annotate(&matrix, commenter).await;
    ComparisonReport { matrix, comments }
}
