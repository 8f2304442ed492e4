//! History view: the displayed subset and ordering of records.
//!
//! Pure derivation, recomputed after every change to records or filters.
//! The store itself is never touched.

use chrono::NaiveDate;
use pricesnap_core::ProductRecord;
use serde::Serialize;

/// Current filter inputs. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    /// UTC calendar day of the record date.
    pub date: Option<NaiveDate>,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Whether `record` passes every active predicate.
    pub fn matches(&self, record: &ProductRecord) -> bool {
        self.matches_search(record) && self.date.map_or(true, |day| record.calendar_day() == day)
    }

    fn matches_search(&self, record: &ProductRecord) -> bool {
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => record.name.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

/// Filter `records` and sort them by date, most recent first.
///
/// The sort is stable: records with equal dates keep their store order.
pub fn derive_view<'a>(records: &'a [ProductRecord], filter: &HistoryFilter) -> Vec<&'a ProductRecord> {
    let mut view: Vec<&ProductRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    view.sort_by(|a, b| b.date.cmp(&a.date));
    view
}

/// Totals shown under the history listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistorySummary {
    pub count: usize,
    pub total: f64,
    pub average: Option<f64>,
}

impl HistorySummary {
    pub fn of(view: &[&ProductRecord]) -> Self {
        let count = view.len();
        let total: f64 = view.iter().map(|r| r.price).sum();
        let average = (count > 0).then(|| total / count as f64);
        Self { count, total, average }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(name: &str, price: f64, y: i32, m: u32, d: u32, h: u32) -> ProductRecord {
        ProductRecord::new(name, price, Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    fn names(view: &[&ProductRecord]) -> Vec<String> {
        view.iter().map(|r| r.name.clone()).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_filters_sorts_most_recent_first() {
        // Store order is insertion order reversed: Bread was added last.
        let records = vec![at("Bread", 3.0, 2024, 1, 2, 10), at("Milk", 2.5, 2024, 1, 1, 10)];
        let view = derive_view(&records, &HistoryFilter::new());
        assert_eq!(names(&view), ["Bread", "Milk"]);
    }

    #[test]
    fn sorts_even_when_store_order_disagrees() {
        let records = vec![
            at("Old", 1.0, 2023, 12, 31, 9),
            at("New", 1.0, 2024, 2, 1, 9),
            at("Mid", 1.0, 2024, 1, 15, 9),
        ];
        let view = derive_view(&records, &HistoryFilter::new());
        assert_eq!(names(&view), ["New", "Mid", "Old"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let records = vec![at("Bread", 3.0, 2024, 1, 2, 10), at("Milk", 2.5, 2024, 1, 1, 10)];
        let view = derive_view(&records, &HistoryFilter::new().with_search("mil"));
        assert_eq!(names(&view), ["Milk"]);

        let view = derive_view(&records, &HistoryFilter::new().with_search("READ"));
        assert_eq!(names(&view), ["Bread"]);
    }

    #[test]
    fn blank_search_does_not_filter() {
        let records = vec![at("Bread", 3.0, 2024, 1, 2, 10), at("Milk", 2.5, 2024, 1, 1, 10)];
        assert_eq!(derive_view(&records, &HistoryFilter::new().with_search("  ")).len(), 2);
    }

    #[test]
    fn date_filter_matches_utc_day() {
        let records = vec![
            at("Late", 1.0, 2024, 1, 1, 23),
            at("Early", 1.0, 2024, 1, 1, 0),
            at("Next", 1.0, 2024, 1, 2, 0),
        ];
        let view = derive_view(&records, &HistoryFilter::new().with_date(day(2024, 1, 1)));
        assert_eq!(names(&view), ["Late", "Early"]);
    }

    #[test]
    fn both_predicates_apply() {
        let records = vec![
            at("Milk", 2.5, 2024, 1, 1, 10),
            at("Milk", 2.6, 2024, 1, 2, 10),
            at("Bread", 3.0, 2024, 1, 1, 11),
        ];
        let filter = HistoryFilter::new().with_search("milk").with_date(day(2024, 1, 1));
        let view = derive_view(&records, &filter);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].price, 2.5);
    }

    #[test]
    fn output_satisfies_filters_and_ordering() {
        let mut records = Vec::new();
        for i in 0..40u32 {
            let name = if i % 3 == 0 { "Oat milk" } else { "Coffee" };
            records.push(at(name, i as f64, 2024, 1 + i % 3, 1 + (i * 7) % 28, i % 24));
        }
        let filters = [
            HistoryFilter::new(),
            HistoryFilter::new().with_search("MILK"),
            HistoryFilter::new().with_date(day(2024, 2, 8)),
            HistoryFilter::new().with_search("cof").with_date(day(2024, 3, 15)),
        ];
        for filter in &filters {
            let view = derive_view(&records, filter);
            assert!(view.iter().all(|r| filter.matches(r)));
            assert!(view.windows(2).all(|w| w[0].date >= w[1].date));
            let expected = records.iter().filter(|r| filter.matches(r)).count();
            assert_eq!(view.len(), expected);
        }
    }

    #[test]
    fn ties_keep_store_order_across_recomputes() {
        let records = vec![
            at("First", 1.0, 2024, 1, 1, 10),
            at("Second", 1.0, 2024, 1, 1, 10),
            at("Third", 1.0, 2024, 1, 1, 10),
        ];
        let a = names(&derive_view(&records, &HistoryFilter::new()));
        let b = names(&derive_view(&records, &HistoryFilter::new()));
        assert_eq!(a, ["First", "Second", "Third"]);
        assert_eq!(a, b);
    }

    #[test]
    fn summary_totals_view() {
        let records = vec![at("Bread", 3.0, 2024, 1, 2, 10), at("Milk", 2.5, 2024, 1, 1, 10)];
        let view = derive_view(&records, &HistoryFilter::new());
        let summary = HistorySummary::of(&view);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total, 5.5);
        assert_eq!(summary.average, Some(2.75));
        assert_eq!(HistorySummary::of(&[]).average, None);
    }
}
