//! On-demand analytics aggregation.
//!
//! A report is built from a single snapshot of a link's click events
//! (newest first, as returned by `Repository::clicks_for_link`), so its
//! totals, buckets and recent window always agree with each other. The
//! cached `links.click_count` is deliberately never consulted here.

use crate::models::{AnalyticsReport, ClickEvent, CountryBucket, DayBucket, RecentClick};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

/// Day series window, in days.
const DAY_WINDOW_DAYS: i64 = 30;
/// Country breakdown is capped to the entries the dashboard renders.
const COUNTRY_CAP: usize = 10;
/// Size of the recent-clicks window.
const RECENT_CAP: usize = 10;

/// Fallback country label for clicks whose geo lookup failed.
const UNKNOWN_COUNTRY: &str = "Unknown";

/// Build the analytics report for one link from its click events.
///
/// `events` must be ordered newest first; `now` anchors the 30-day window.
pub fn build_report(events: &[ClickEvent], now: DateTime<Utc>) -> AnalyticsReport {
    let total_clicks = events.len() as i64;

    let unique_clicks = events
        .iter()
        .map(|e| e.visitor_fingerprint.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len() as i64;

    let conversion_rate = if total_clicks > 0 {
        unique_clicks as f64 / total_clicks as f64 * 100.0
    } else {
        0.0
    };

    let cutoff = now - Duration::days(DAY_WINDOW_DAYS);
    let clicks_by_day = group_and_rank(
        events.iter().filter(|e| e.clicked_at >= cutoff),
        |e| e.clicked_at.date_naive(),
        // Newest day first
        |a, b| b.0.cmp(&a.0),
        usize::MAX,
    )
    .into_iter()
    .map(|(date, count)| DayBucket { date, count })
    .collect();

    let clicks_by_country = group_and_rank(
        events.iter(),
        |e| {
            e.country
                .clone()
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
        },
        // Largest bucket first, country name as tie-break for stable output
        |a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)),
        COUNTRY_CAP,
    )
    .into_iter()
    .map(|(country, count)| CountryBucket { country, count })
    .collect();

    let recent_clicks = events
        .iter()
        .take(RECENT_CAP)
        .map(|e| RecentClick {
            clicked_at: e.clicked_at,
            ip_address: e.ip_address.clone(),
            country: e.country.clone(),
            user_agent: e.user_agent.clone(),
            referer: e.referer.clone(),
        })
        .collect();

    AnalyticsReport {
        total_clicks,
        unique_clicks,
        conversion_rate,
        clicks_by_day,
        clicks_by_country,
        recent_clicks,
    }
}

/// Group items by a dimension key, count each bucket, order and cap the
/// result. Shared by the day and country dimensions; only the key
/// extraction and ordering differ.
fn group_and_rank<T, K, F, C>(
    items: impl Iterator<Item = T>,
    key_of: F,
    ordering: C,
    cap: usize,
) -> Vec<(K, i64)>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
    C: Fn(&(K, i64), &(K, i64)) -> Ordering,
{
    let mut counts: HashMap<K, i64> = HashMap::new();
    for item in items {
        *counts.entry(key_of(&item)).or_insert(0) += 1;
    }

    let mut buckets: Vec<(K, i64)> = counts.into_iter().collect();
    buckets.sort_by(|a, b| ordering(a, b));
    buckets.truncate(cap);
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fingerprint::visitor_fingerprint;
    use chrono::TimeZone;

    fn event(
        id: i64,
        clicked_at: DateTime<Utc>,
        ip: Option<&str>,
        country: Option<&str>,
    ) -> ClickEvent {
        ClickEvent {
            id,
            link_id: 1,
            clicked_at,
            ip_address: ip.map(String::from),
            country: country.map(String::from),
            user_agent: Some("Mozilla/5.0".to_string()),
            referer: None,
            visitor_fingerprint: visitor_fingerprint(ip, Some("Mozilla/5.0")),
        }
    }

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(&[], anchor());
        assert_eq!(report.total_clicks, 0);
        assert_eq!(report.unique_clicks, 0);
        assert_eq!(report.conversion_rate, 0.0);
        assert!(report.clicks_by_day.is_empty());
        assert!(report.clicks_by_country.is_empty());
        assert!(report.recent_clicks.is_empty());
    }

    #[test]
    fn test_totals_uniques_and_conversion() {
        let now = anchor();
        // Three clicks from three distinct visitors
        let events = vec![
            event(3, now, Some("203.0.113.1"), Some("Spain")),
            event(2, now - Duration::hours(1), Some("203.0.113.2"), Some("Spain")),
            event(1, now - Duration::hours(2), Some("203.0.113.3"), Some("France")),
        ];

        let report = build_report(&events, now);
        assert_eq!(report.total_clicks, 3);
        assert_eq!(report.unique_clicks, 3);
        assert_eq!(report.conversion_rate, 100.0);
    }

    #[test]
    fn test_repeat_visitor_counts_once() {
        let now = anchor();
        let events = vec![
            event(4, now, Some("203.0.113.1"), Some("Spain")),
            event(3, now - Duration::minutes(5), Some("203.0.113.1"), Some("Spain")),
            event(2, now - Duration::minutes(9), Some("203.0.113.1"), Some("Spain")),
            event(1, now - Duration::minutes(20), Some("203.0.113.2"), Some("France")),
        ];

        let report = build_report(&events, now);
        assert_eq!(report.total_clicks, 4);
        assert_eq!(report.unique_clicks, 2);
        assert_eq!(report.conversion_rate, 50.0);
    }

    #[test]
    fn test_day_buckets_sum_and_order() {
        let now = anchor();
        let events = vec![
            event(5, now, Some("203.0.113.1"), None),
            event(4, now - Duration::hours(2), Some("203.0.113.2"), None),
            event(3, now - Duration::days(1), Some("203.0.113.3"), None),
            event(2, now - Duration::days(3), Some("203.0.113.4"), None),
            event(1, now - Duration::days(3), Some("203.0.113.5"), None),
        ];

        let report = build_report(&events, now);

        // Sparse: only days that saw clicks appear
        assert_eq!(report.clicks_by_day.len(), 3);
        // Date descending
        assert_eq!(report.clicks_by_day[0].date, now.date_naive());
        assert_eq!(report.clicks_by_day[0].count, 2);
        assert_eq!(report.clicks_by_day[2].count, 2);
        // Within the window, day counts sum to the total
        let sum: i64 = report.clicks_by_day.iter().map(|b| b.count).sum();
        assert_eq!(sum, report.total_clicks);
    }

    #[test]
    fn test_day_window_excludes_old_clicks() {
        let now = anchor();
        let events = vec![
            event(2, now, Some("203.0.113.1"), None),
            event(1, now - Duration::days(45), Some("203.0.113.2"), None),
        ];

        let report = build_report(&events, now);
        assert_eq!(report.total_clicks, 2);
        // The 45-day-old click is outside the 30-day series
        let sum: i64 = report.clicks_by_day.iter().map(|b| b.count).sum();
        assert_eq!(sum, 1);
    }

    #[test]
    fn test_country_buckets_rank_and_unknown() {
        let now = anchor();
        let events = vec![
            event(5, now, Some("203.0.113.1"), Some("Spain")),
            event(4, now, Some("203.0.113.2"), Some("Spain")),
            event(3, now, Some("203.0.113.3"), Some("Spain")),
            event(2, now, Some("203.0.113.4"), Some("France")),
            event(1, now, Some("203.0.113.5"), None),
        ];

        let report = build_report(&events, now);

        assert_eq!(
            report.clicks_by_country[0],
            CountryBucket {
                country: "Spain".to_string(),
                count: 3
            }
        );
        // NULL countries group under the presentation default
        assert!(report
            .clicks_by_country
            .iter()
            .any(|b| b.country == "Unknown" && b.count == 1));
        // Country counts sum to the total
        let sum: i64 = report.clicks_by_country.iter().map(|b| b.count).sum();
        assert_eq!(sum, report.total_clicks);
    }

    #[test]
    fn test_country_cap() {
        let now = anchor();
        let mut events = Vec::new();
        for i in 0..15 {
            let ip = format!("203.0.113.{}", i);
            events.push(event(i as i64, now, Some(&ip), Some(&format!("Country{}", i))));
        }

        let report = build_report(&events, now);
        assert_eq!(report.clicks_by_country.len(), 10);
    }

    #[test]
    fn test_recent_clicks_window() {
        let now = anchor();
        let events: Vec<ClickEvent> = (0..25)
            .map(|i| {
                event(
                    25 - i,
                    now - Duration::minutes(i),
                    Some("203.0.113.1"),
                    Some("Spain"),
                )
            })
            .collect();

        let report = build_report(&events, now);
        assert_eq!(report.recent_clicks.len(), 10);
        // Newest first
        assert_eq!(report.recent_clicks[0].clicked_at, now);
        assert!(report.recent_clicks[0].clicked_at > report.recent_clicks[9].clicked_at);
    }

    #[test]
    fn test_report_is_idempotent() {
        let now = anchor();
        let events = vec![
            event(2, now, Some("203.0.113.1"), Some("Spain")),
            event(1, now - Duration::hours(3), Some("203.0.113.2"), None),
        ];

        let first = build_report(&events, now);
        let second = build_report(&events, now);

        assert_eq!(first.total_clicks, second.total_clicks);
        assert_eq!(first.unique_clicks, second.unique_clicks);
        assert_eq!(first.clicks_by_day, second.clicks_by_day);
        assert_eq!(first.clicks_by_country, second.clicks_by_country);
    }
}
