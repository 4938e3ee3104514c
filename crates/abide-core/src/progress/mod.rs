//! Cumulative progress and monthly goals.

mod aggregator;
mod goals;

pub use aggregator::{monthly_percentage, CumulativeProgress, MonthlyProgress, ProgressAggregator};
pub use goals::{Goals, DEFAULT_TARGET_MINUTES};

use chrono::{Datelike, NaiveDate};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("first of month is always valid")
}

/// Whether two dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
