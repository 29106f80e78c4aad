//! crates/newscheck_core/src/derive.rs
//!
//! Pure filter, sort and pagination steps of the history view.

use crate::domain::{FilterState, PageWindow, Record, SortOrder};

/// Case-insensitive substring match over the input text or URL.
/// An empty query matches everything.
pub fn matches_search(record: &Record, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    record.request.input_text.to_lowercase().contains(&query)
        || record
            .request
            .url
            .as_deref()
            .is_some_and(|url| url.to_lowercase().contains(&query))
}

/// Sorts by creation time. Stable, so equal timestamps keep fetch order.
pub fn sort_records(records: &mut [Record], order: SortOrder) {
    match order {
        SortOrder::Newest => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => records.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
}

/// Search, then status, then sort.
pub fn apply_filters(records: &[Record], filters: &FilterState) -> Vec<Record> {
    let query = filters.search.to_lowercase();
    let mut kept: Vec<Record> = records
        .iter()
        .filter(|r| matches_search(r, &query))
        .filter(|r| filters.status.matches(&r.output))
        .cloned()
        .collect();
    sort_records(&mut kept, filters.sort);
    kept
}

/// Pulls the page index back onto the last non-empty page.
pub fn clamp_window(total: usize, window: PageWindow) -> PageWindow {
    let window = PageWindow::new(window.index, window.size);
    if total == 0 {
        return PageWindow::first(window.size);
    }
    let last = (total - 1) / window.size;
    PageWindow::new(window.index.min(last), window.size)
}

pub fn page_slice(records: &[Record], window: PageWindow) -> &[Record] {
    let start = window.index.saturating_mul(window.size).min(records.len());
    let end = start.saturating_add(window.size).min(records.len());
    &records[start..end]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{CheckRequest, Explanation, StatusFilter, Verdict};
    use chrono::{DateTime, Utc};

    pub(crate) fn record(id: &str, text: &str, label: &str, created: Option<i64>) -> Record {
        Record {
            id: Some(id.to_string()),
            created_at: created.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            request: CheckRequest::new(text, None, None),
            output: Verdict::new(label, 0.9),
            explanation: Explanation::default(),
            social_context: Vec::new(),
            model: None,
        }
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn search_is_case_insensitive_over_text_and_url() {
        let mut with_url = record("u", "nothing here", "real", Some(1));
        with_url.request.url = Some("https://News.example/COVID-update".to_string());
        let records = vec![
            record("a", "the COVID story", "fake", Some(2)),
            record("b", "weather report", "real", Some(3)),
            with_url,
        ];
        let filters = FilterState {
            search: "Covid".to_string(),
            ..FilterState::default()
        };

        assert_eq!(ids(&apply_filters(&records, &filters)), vec!["a", "u"]);
    }

    #[test]
    fn empty_search_matches_everything() {
        let records = vec![record("a", "x", "fake", None), record("b", "y", "real", None)];
        assert_eq!(apply_filters(&records, &FilterState::default()).len(), 2);
    }

    #[test]
    fn status_filter_ignores_case() {
        let records = vec![
            record("a", "x", "FAKE", Some(3)),
            record("b", "y", "real", Some(2)),
            record("c", "z", "Fake", Some(1)),
        ];
        let upper = FilterState {
            status: StatusFilter::parse("FAKE"),
            ..FilterState::default()
        };
        let lower = FilterState {
            status: StatusFilter::parse("fake"),
            ..FilterState::default()
        };

        let a = apply_filters(&records, &upper);
        let b = apply_filters(&records, &lower);
        assert_eq!(ids(&a), vec!["a", "c"]);
        assert_eq!(a, b);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let records = vec![
            record("first", "x", "real", Some(100)),
            record("newer", "x", "real", Some(200)),
            record("second", "x", "real", Some(100)),
        ];
        let mut filters = FilterState::default();

        assert_eq!(ids(&apply_filters(&records, &filters)), vec!["newer", "first", "second"]);
        filters.sort = SortOrder::Oldest;
        assert_eq!(ids(&apply_filters(&records, &filters)), vec!["first", "second", "newer"]);
    }

    #[test]
    fn missing_timestamps_sort_as_oldest() {
        let records = vec![
            record("undated", "x", "real", None),
            record("dated", "x", "real", Some(0)),
        ];
        let mut filters = FilterState::default();

        assert_eq!(ids(&apply_filters(&records, &filters)), vec!["dated", "undated"]);
        filters.sort = SortOrder::Oldest;
        assert_eq!(ids(&apply_filters(&records, &filters)), vec!["undated", "dated"]);
    }

    #[test]
    fn window_is_clamped_to_the_last_page() {
        assert_eq!(clamp_window(25, PageWindow::new(7, 10)), PageWindow::new(2, 10));
        assert_eq!(clamp_window(20, PageWindow::new(2, 10)), PageWindow::new(1, 10));
        assert_eq!(clamp_window(0, PageWindow::new(3, 10)), PageWindow::new(0, 10));
        assert_eq!(clamp_window(25, PageWindow::new(1, 10)), PageWindow::new(1, 10));
    }

    #[test]
    fn page_slice_windows_the_list() {
        let records: Vec<Record> = (0..7)
            .map(|i| record(&format!("r{}", i), "x", "real", Some(i)))
            .collect();

        assert_eq!(ids(page_slice(&records, PageWindow::new(1, 3))), vec!["r3", "r4", "r5"]);
        assert_eq!(ids(page_slice(&records, PageWindow::new(2, 3))), vec!["r6"]);
        assert!(page_slice(&records, PageWindow::new(9, 3)).is_empty());
    }
}
