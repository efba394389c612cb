//! Dashboard reductions over fetched consumption rows.
//!
//! Pure functions only: ranked top-consumer lists, quarterly regional
//! aggregation, the consolidated view's filter/sort/pagination, and the
//! en-IN number formatting every table and chart label uses.

use crate::consumption::ConsumptionRecord;
use std::collections::BTreeMap;

/// The fixed region set charts aggregate over.
pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

/// Rows per page in the consolidated view.
pub const PAGE_SIZE: usize = 10;

/// How many entries the top-consumers chart shows.
pub const TOP_CONSUMERS_LIMIT: usize = 10;

/// One bar of the top-consumers chart.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedConsumer {
    pub customer_name: String,
    pub region: String,
    pub account_manager: String,
    pub consumption: f64,
}

/// Rank customers by total consumption over an inclusive fiscal-month
/// range (indices into [`crate::consumption::FISCAL_MONTHS`]), optionally
/// narrowed to one region, highest first, truncated to `limit`.
#[must_use]
pub fn top_consumers(
    records: &[ConsumptionRecord],
    start_month: usize,
    end_month: usize,
    region: Option<&str>,
    limit: usize,
) -> Vec<RankedConsumer> {
    let mut ranked: Vec<RankedConsumer> = records
        .iter()
        .filter(|record| match region {
            Some(region) => record.region.trim() == region.trim(),
            None => true,
        })
        .map(|record| RankedConsumer {
            customer_name: record.customer_name.clone(),
            region: record.region.clone(),
            account_manager: record.account_manager.clone(),
            consumption: record.range_total(start_month, end_month),
        })
        .collect();
    ranked.sort_by(|a, b| b.consumption.total_cmp(&a.consumption));
    ranked.truncate(limit);
    ranked
}

/// Fiscal quarter (Q1 = April–June).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }

    /// Fiscal-month indices covered by this quarter.
    #[must_use]
    pub fn month_range(&self) -> (usize, usize) {
        match self {
            Self::Q1 => (0, 2),
            Self::Q2 => (3, 5),
            Self::Q3 => (6, 8),
            Self::Q4 => (9, 11),
        }
    }

    /// All quarters, most recent first (the scan order for picking the
    /// default chart quarter).
    #[must_use]
    pub fn newest_first() -> [Quarter; 4] {
        [Self::Q4, Self::Q3, Self::Q2, Self::Q1]
    }
}

/// Total consumption per region for one quarter.
///
/// Regions outside the fixed four are ignored; region strings are trimmed
/// before matching.
#[must_use]
pub fn quarterly_by_region(
    records: &[ConsumptionRecord],
    quarter: Quarter,
) -> BTreeMap<&'static str, f64> {
    let (start, end) = quarter.month_range();
    let mut totals: BTreeMap<&'static str, f64> = BTreeMap::new();
    for record in records {
        let Some(region) = REGIONS.iter().find(|r| **r == record.region.trim()) else {
            continue;
        };
        *totals.entry(region).or_insert(0.0) += record.range_total(start, end);
    }
    totals
}

/// The most recent quarter with any consumption across both streams;
/// falls back to Q1 when every quarter is empty.
#[must_use]
pub fn latest_active_quarter(
    subscription: &[ConsumptionRecord],
    marketplace: &[ConsumptionRecord],
) -> Quarter {
    for quarter in Quarter::newest_first() {
        let total: f64 = quarterly_by_region(subscription, quarter)
            .values()
            .chain(quarterly_by_region(marketplace, quarter).values())
            .sum();
        if total > 0.0 {
            return quarter;
        }
    }
    Quarter::Q1
}

/// Sort order for the consolidated table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Unsorted,
    TotalDesc,
    TotalAsc,
    NameAsc,
    NameDesc,
}

/// The consolidated view's filter inputs.
#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    /// Exact account-manager match; `None` means all.
    pub account_manager: Option<String>,
    /// Exact region match; `None` means all.
    pub region: Option<String>,
    /// Case-insensitive substring of the customer name.
    pub search: String,
    pub sort: SortMode,
}

/// Distinct account managers in first-appearance order.
#[must_use]
pub fn distinct_account_managers(records: &[ConsumptionRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.account_manager.as_str()))
}

/// Distinct regions in first-appearance order.
#[must_use]
pub fn distinct_regions(records: &[ConsumptionRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.region.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

/// Apply the consolidated view's filters and sort.
#[must_use]
pub fn filter_records(records: &[ConsumptionRecord], query: &ListQuery) -> Vec<ConsumptionRecord> {
    let needle = query.search.to_lowercase();
    let mut filtered: Vec<ConsumptionRecord> = records
        .iter()
        .filter(|record| {
            query
                .account_manager
                .as_deref()
                .map_or(true, |am| record.account_manager == am)
                && query
                    .region
                    .as_deref()
                    .map_or(true, |region| record.region == region)
                && record.customer_name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();
    match query.sort {
        SortMode::Unsorted => {}
        SortMode::TotalDesc => filtered.sort_by(|a, b| b.total.total_cmp(&a.total)),
        SortMode::TotalAsc => filtered.sort_by(|a, b| a.total.total_cmp(&b.total)),
        SortMode::NameAsc => filtered.sort_by(|a, b| a.customer_name.cmp(&b.customer_name)),
        SortMode::NameDesc => filtered.sort_by(|a, b| b.customer_name.cmp(&a.customer_name)),
    }
    filtered
}

/// Number of pages at [`PAGE_SIZE`] rows per page.
#[must_use]
pub fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// One page of rows; `page` is 1-based and an out-of-range page is empty.
#[must_use]
pub fn paginate<T>(rows: &[T], page: usize) -> &[T] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1) * PAGE_SIZE;
    if start >= rows.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(rows.len());
    &rows[start..end]
}

/// Month-over-month movement for the flip cards, relative to the current
/// calendar month (0 = January). January has no previous-month pair in the
/// current year.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonthDelta {
    pub previous: f64,
    pub before_previous: f64,
}

impl MonthDelta {
    #[must_use]
    pub fn change(&self) -> f64 {
        self.previous - self.before_previous
    }
}

const CALENDAR_MONTHS: [&str; 12] = [
    "jan", "feb", "march", "april", "may", "june", "july", "aug", "sep", "oct", "nov", "dec",
];

/// Consumption of the previous month and the one before, in calendar
/// order. `None` when `calendar_month` is January (or out of range).
#[must_use]
pub fn month_over_month(record: &ConsumptionRecord, calendar_month: usize) -> Option<MonthDelta> {
    if calendar_month == 0 || calendar_month > 11 {
        return None;
    }
    let previous = record.month_named(CALENDAR_MONTHS[calendar_month - 1])?;
    let before_previous = if calendar_month >= 2 {
        record.month_named(CALENDAR_MONTHS[calendar_month - 2])?
    } else {
        // February: the month before January belongs to the previous sheet.
        0.0
    };
    Some(MonthDelta {
        previous,
        before_previous,
    })
}

/// Format a value with en-IN digit grouping and two fixed decimals,
/// e.g. `1234567.8` becomes `12,34,567.80`.
#[must_use]
pub fn format_inr(value: f64) -> String {
    let negative = value < 0.0;
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = if int_part.len() <= 3 {
        int_part.to_string()
    } else {
        let (head, tail) = int_part.split_at(int_part.len() - 3);
        let mut groups = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    if negative {
        format!("-{grouped}.{frac_part}")
    } else {
        format!("{grouped}.{frac_part}")
    }
}
