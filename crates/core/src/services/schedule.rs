//! Slot generation and content assignment.
//!
//! Pure functions turning a date range plus a weekly recurring time
//! pattern into an ordered sequence of posting slots, and pairing a
//! batch of generated content items with those slots.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use contentplan_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Weekly recurring time pattern.
///
/// Each weekday maps to the `HH:MM` times a post should go out on that
/// day. Order within a day does not matter; duplicate times are kept
/// and each produces its own slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklyPattern {
    pub sun: Vec<String>,
    pub mon: Vec<String>,
    pub tue: Vec<String>,
    pub wed: Vec<String>,
    pub thu: Vec<String>,
    pub fri: Vec<String>,
    pub sat: Vec<String>,
}

impl WeeklyPattern {
    /// Parse the pattern into per-weekday time buckets, Sunday first.
    fn parse_buckets(&self) -> AppResult<[Vec<NaiveTime>; 7]> {
        let days = [
            &self.sun, &self.mon, &self.tue, &self.wed, &self.thu, &self.fri, &self.sat,
        ];

        let mut buckets: [Vec<NaiveTime>; 7] = Default::default();
        for (bucket, times) in buckets.iter_mut().zip(days) {
            for raw in times {
                let time = NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| {
                    AppError::Validation(format!("Invalid time of day: {raw} (expected HH:MM)"))
                })?;
                bucket.push(time);
            }
        }

        Ok(buckets)
    }
}

/// A generated content item, as returned by the content generation
/// collaborator. Opaque to the engine beyond its two fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub title: String,
    pub content: String,
}

/// A post draft ready to be materialized under a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub scheduled_at: DateTime<Utc>,
    pub social_media_ids: Vec<String>,
    pub send_reminder: bool,
}

/// Expand a date range and weekly pattern into ordered slot timestamps.
///
/// Every calendar day from `start_date` to `end_date` inclusive
/// contributes one slot per configured time on its weekday. The result
/// is sorted ascending; the sort is stable, so equal timestamps (from
/// duplicate times within a day) keep their insertion order. An empty
/// pattern yields an empty, valid slot list.
pub fn generate_slots(
    start_date: NaiveDate,
    end_date: NaiveDate,
    pattern: &WeeklyPattern,
) -> AppResult<Vec<DateTime<Utc>>> {
    if end_date < start_date {
        return Err(AppError::InvalidRange(format!(
            "end date {end_date} is before start date {start_date}"
        )));
    }

    let buckets = pattern.parse_buckets()?;

    let mut slots = Vec::new();
    let mut day = start_date;
    loop {
        let bucket = &buckets[day.weekday().num_days_from_sunday() as usize];
        for time in bucket {
            slots.push(day.and_time(*time).and_utc());
        }

        if day == end_date {
            break;
        }
        day = day
            .succ_opt()
            .ok_or_else(|| AppError::InvalidRange("date range exceeds calendar".to_string()))?;
    }

    // Vec::sort is stable: ties keep insertion order.
    slots.sort();

    Ok(slots)
}

/// Pair content items with slots positionally.
///
/// Item `i` lands in slot `i`. Surplus items beyond the slot count are
/// dropped silently (deliberate policy: excess generated content is
/// discarded, not queued); surplus slots stay unused. The broadcast
/// `social_media_ids` set is copied onto every draft.
#[must_use]
pub fn assign_content(
    slots: &[DateTime<Utc>],
    items: Vec<ContentItem>,
    social_media_ids: &[String],
) -> Vec<PostDraft> {
    if items.len() > slots.len() {
        tracing::debug!(
            dropped = items.len() - slots.len(),
            "More content items than slots; dropping the surplus"
        );
    }

    items
        .into_iter()
        .zip(slots.iter())
        .map(|(item, slot)| PostDraft {
            title: item.title,
            content: item.content,
            scheduled_at: *slot,
            social_media_ids: social_media_ids.to_vec(),
            send_reminder: false,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        date(y, m, d)
            .and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
            .and_utc()
    }

    fn items(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| ContentItem {
                title: format!("Title {i}"),
                content: format!("Body {i}"),
            })
            .collect()
    }

    #[test]
    fn test_week_with_mixed_pattern() {
        // Mon 2024-01-01 .. Sun 2024-01-07, Mon 09:00 + Wed 09:00/15:00
        let pattern = WeeklyPattern {
            mon: vec!["09:00".to_string()],
            wed: vec!["09:00".to_string(), "15:00".to_string()],
            ..Default::default()
        };

        let slots = generate_slots(date(2024, 1, 1), date(2024, 1, 7), &pattern).unwrap();

        assert_eq!(
            slots,
            vec![
                ts(2024, 1, 1, 9, 0),
                ts(2024, 1, 3, 9, 0),
                ts(2024, 1, 3, 15, 0),
            ]
        );
    }

    #[test]
    fn test_repeated_calls_are_deterministic() {
        let pattern = WeeklyPattern {
            tue: vec!["08:30".to_string(), "20:00".to_string()],
            sat: vec!["11:00".to_string()],
            ..Default::default()
        };

        let a = generate_slots(date(2024, 3, 1), date(2024, 3, 31), &pattern).unwrap();
        let b = generate_slots(date(2024, 3, 1), date(2024, 3, 31), &pattern).unwrap();

        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_single_day_range_matching_weekday() {
        // 2024-01-03 is a Wednesday.
        let pattern = WeeklyPattern {
            wed: vec!["10:00".to_string()],
            ..Default::default()
        };

        let slots = generate_slots(date(2024, 1, 3), date(2024, 1, 3), &pattern).unwrap();
        assert_eq!(slots, vec![ts(2024, 1, 3, 10, 0)]);
    }

    #[test]
    fn test_empty_pattern_yields_no_slots() {
        let slots =
            generate_slots(date(2024, 1, 1), date(2024, 12, 31), &WeeklyPattern::default())
                .unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_duplicate_times_each_yield_a_slot() {
        let pattern = WeeklyPattern {
            mon: vec!["09:00".to_string(), "09:00".to_string()],
            ..Default::default()
        };

        let slots = generate_slots(date(2024, 1, 1), date(2024, 1, 1), &pattern).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0], slots[1]);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = generate_slots(date(2024, 1, 7), date(2024, 1, 1), &WeeklyPattern::default());
        assert!(matches!(result, Err(AppError::InvalidRange(_))));
    }

    #[test]
    fn test_malformed_time_is_rejected() {
        let pattern = WeeklyPattern {
            fri: vec!["25:61".to_string()],
            ..Default::default()
        };

        let result = generate_slots(date(2024, 1, 1), date(2024, 1, 7), &pattern);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_assignment_pairs_positionally() {
        let slots = vec![
            ts(2024, 1, 1, 9, 0),
            ts(2024, 1, 3, 9, 0),
            ts(2024, 1, 3, 15, 0),
            ts(2024, 1, 5, 9, 0),
        ];
        let accounts = vec!["acct1".to_string(), "acct2".to_string()];

        let drafts = assign_content(&slots, items(2), &accounts);

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "Title 0");
        assert_eq!(drafts[0].scheduled_at, slots[0]);
        assert_eq!(drafts[1].scheduled_at, slots[1]);
        // Broadcast account set is copied onto every draft.
        assert_eq!(drafts[0].social_media_ids, accounts);
        assert_eq!(drafts[1].social_media_ids, accounts);
        assert!(!drafts[0].send_reminder);
    }

    #[test]
    fn test_surplus_items_are_dropped() {
        let slots = vec![
            ts(2024, 1, 1, 9, 0),
            ts(2024, 1, 3, 9, 0),
            ts(2024, 1, 3, 15, 0),
        ];

        let drafts = assign_content(&slots, items(5), &[]);

        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[2].title, "Title 2");
    }

    #[test]
    fn test_no_items_yields_no_drafts() {
        let slots = vec![ts(2024, 1, 1, 9, 0)];
        let drafts = assign_content(&slots, vec![], &[]);
        assert!(drafts.is_empty());
    }
}
