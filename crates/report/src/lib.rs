pub mod compare;
pub mod summary;

pub use compare::{
    annotate, compare, compare_with_comments, sort_chronologically, CommentError, ComparisonMatrix,
    ComparisonReport, ComparisonRow, DataPoint, TrendCommenter, ANALYSIS_UNAVAILABLE,
    HOME_AND_LIVING_LABEL, NO_ANALYSIS,
};
pub use summary::{aggregate, summarize, CategorySummary, StatementStats};
