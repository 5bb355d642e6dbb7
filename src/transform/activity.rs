//! Created-vs-resolved activity aggregation.
//!
//! Buckets issue lifecycle events by calendar day and emits two parallel,
//! gap-free daily series covering the full observed date range. The
//! renderer zips these series against [`ActivitySeries::date_labels`], so
//! the one-entry-per-day, no-gaps ordering is a hard contract here.

use crate::models::{parse_calendar_date, Issue, IssueStatus};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// Error raised when aggregation cannot produce a series.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// No issue carried a usable timestamp, so the date range is
    /// undefined and there is nothing to walk.
    #[error("no issues with usable timestamps to aggregate")]
    EmptyInput,
}

/// Per-calendar-day counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyBucket {
    /// Open issues created on this day.
    pub created: u64,
    /// Issues resolved on this day.
    pub resolved: u64,
}

/// Why an issue was left out of the buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "value")]
pub enum SkipReason {
    /// The issue has no creation timestamp at all.
    MissingCreatedAt,
    /// The creation timestamp did not parse; the raw value is kept.
    InvalidCreatedAt(String),
    /// A resolved issue without a resolution timestamp; its creation
    /// date still widens the range but nothing is counted.
    MissingResolvedAt,
    /// A resolved issue whose resolution timestamp did not parse.
    InvalidResolvedAt(String),
}

/// Diagnostic record for an issue excluded from the counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Issue id, when the payload had one.
    pub issue_id: Option<String>,
    /// What was wrong with it.
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Daily created/resolved series over an inclusive date range.
///
/// `created[i]` and `resolved[i]` are the counts for `start + i` days;
/// both vectors always have `(end - start).num_days() + 1` entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySeries {
    /// First calendar day covered.
    pub start: NaiveDate,
    /// Last calendar day covered (inclusive).
    pub end: NaiveDate,
    /// Issues created per day (open issues, by creation date).
    pub created: Vec<u64>,
    /// Issues resolved per day (by resolution date).
    pub resolved: Vec<u64>,
    /// Issues excluded from the counts, for diagnostics.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}

impl ActivitySeries {
    /// Number of days covered.
    pub fn len(&self) -> usize {
        self.created.len()
    }

    /// A series always covers at least one day.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// ISO `YYYY-MM-DD` labels, one per day, same length as the series.
    pub fn date_labels(&self) -> Vec<String> {
        self.dates()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect()
    }

    /// Iterate the covered days in chronological order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |d| *d <= self.end)
    }

    /// Running-total view of the same range.
    ///
    /// The per-day counts are what the source data holds; this is the
    /// explicit adaptor for charts that want cumulative lines.
    pub fn cumulative(&self) -> ActivitySeries {
        ActivitySeries {
            start: self.start,
            end: self.end,
            created: running_total(&self.created),
            resolved: running_total(&self.resolved),
            skipped: self.skipped.clone(),
        }
    }
}

fn running_total(daily: &[u64]) -> Vec<u64> {
    let mut total = 0u64;
    daily
        .iter()
        .map(|n| {
            total += n;
            total
        })
        .collect()
}

/// Aggregate issues into a daily [`ActivitySeries`].
///
/// Open issues count toward `created` on their creation date; resolved
/// issues count toward `resolved` on their resolution date. The range
/// spans every dated event seen, creation and resolution alike. Issues
/// with unusable timestamps are collected as [`SkippedRecord`]s and the
/// scan continues.
pub fn aggregate(issues: &[Issue]) -> Result<ActivitySeries, AggregateError> {
    let mut buckets: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();
    let mut skipped: Vec<SkippedRecord> = Vec::new();
    let mut range: Option<(NaiveDate, NaiveDate)> = None;

    for issue in issues {
        let created = match issue.attributes.created_at.as_deref() {
            None => {
                skip(&mut skipped, issue, SkipReason::MissingCreatedAt);
                continue;
            }
            Some(raw) => match parse_calendar_date(raw) {
                Some(date) => date,
                None => {
                    skip(
                        &mut skipped,
                        issue,
                        SkipReason::InvalidCreatedAt(raw.to_string()),
                    );
                    continue;
                }
            },
        };

        observe(&mut range, created);

        match issue.status() {
            IssueStatus::Open => {
                buckets.entry(created).or_default().created += 1;
            }
            IssueStatus::Resolved => {
                let resolved_at = issue
                    .attributes
                    .resolution
                    .as_ref()
                    .and_then(|r| r.resolved_at.as_deref());
                match resolved_at {
                    None => skip(&mut skipped, issue, SkipReason::MissingResolvedAt),
                    Some(raw) => match parse_calendar_date(raw) {
                        Some(date) => {
                            observe(&mut range, date);
                            buckets.entry(date).or_default().resolved += 1;
                        }
                        None => skip(
                            &mut skipped,
                            issue,
                            SkipReason::InvalidResolvedAt(raw.to_string()),
                        ),
                    },
                }
            }
            // Ignored and unknown statuses widen the range but count
            // toward neither series.
            IssueStatus::Ignored | IssueStatus::Other(_) => {}
        }
    }

    let (start, end) = range.ok_or(AggregateError::EmptyInput)?;

    let mut created = Vec::new();
    let mut resolved = Vec::new();
    let mut day = start;
    loop {
        let bucket = buckets.get(&day).copied().unwrap_or_default();
        created.push(bucket.created);
        resolved.push(bucket.resolved);
        if day >= end {
            break;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(ActivitySeries {
        start,
        end,
        created,
        resolved,
        skipped,
    })
}

fn observe(range: &mut Option<(NaiveDate, NaiveDate)>, date: NaiveDate) {
    *range = Some(match *range {
        None => (date, date),
        Some((min, max)) => (min.min(date), max.max(date)),
    });
}

fn skip(skipped: &mut Vec<SkippedRecord>, issue: &Issue, reason: SkipReason) {
    warn!(
        "Skipping issue {}: {:?}",
        issue.id.as_deref().unwrap_or("<no id>"),
        reason
    );
    skipped.push(SkippedRecord {
        issue_id: issue.id.clone(),
        reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueAttributes, Resolution};

    fn open_issue(id: &str, created_at: &str) -> Issue {
        Issue {
            id: Some(id.to_string()),
            attributes: IssueAttributes {
                status: Some("open".to_string()),
                created_at: Some(created_at.to_string()),
                ..Default::default()
            },
        }
    }

    fn resolved_issue(id: &str, created_at: &str, resolved_at: &str) -> Issue {
        Issue {
            id: Some(id.to_string()),
            attributes: IssueAttributes {
                status: Some("resolved".to_string()),
                created_at: Some(created_at.to_string()),
                resolution: Some(Resolution {
                    resolved_at: Some(resolved_at.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_open_and_resolved_scenario() {
        let issues = vec![
            open_issue("a", "2024-01-01T10:00:00Z"),
            resolved_issue("b", "2024-01-01T11:00:00Z", "2024-01-03T09:00:00Z"),
        ];

        let series = aggregate(&issues).unwrap();

        assert_eq!(series.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(series.end, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(series.created, vec![1, 0, 0]);
        assert_eq!(series.resolved, vec![0, 0, 1]);
        assert!(series.skipped.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(aggregate(&[]), Err(AggregateError::EmptyInput));
    }

    #[test]
    fn test_all_skipped_is_empty_input() {
        let issues = vec![
            Issue::default(),
            Issue {
                id: Some("bad".to_string()),
                attributes: IssueAttributes {
                    status: Some("open".to_string()),
                    created_at: Some("garbage".to_string()),
                    ..Default::default()
                },
            },
        ];

        assert_eq!(aggregate(&issues), Err(AggregateError::EmptyInput));
    }

    #[test]
    fn test_length_covers_range_inclusive() {
        let issues = vec![
            open_issue("a", "2024-03-01T00:00:00Z"),
            open_issue("b", "2024-03-20T23:59:59Z"),
        ];

        let series = aggregate(&issues).unwrap();

        let days = (series.end - series.start).num_days() as usize + 1;
        assert_eq!(series.len(), days);
        assert_eq!(series.len(), 20);
        assert_eq!(series.created.len(), series.resolved.len());
    }

    #[test]
    fn test_count_sums_match_inputs() {
        let issues = vec![
            open_issue("a", "2024-01-01T10:00:00Z"),
            open_issue("b", "2024-01-01T12:00:00Z"),
            open_issue("c", "2024-01-05T12:00:00Z"),
            resolved_issue("d", "2024-01-02T10:00:00Z", "2024-01-04T10:00:00Z"),
            resolved_issue("e", "2024-01-02T10:00:00Z", "2024-01-04T11:00:00Z"),
            Issue::default(), // skipped
        ];

        let series = aggregate(&issues).unwrap();

        assert_eq!(series.created.iter().sum::<u64>(), 3);
        assert_eq!(series.resolved.iter().sum::<u64>(), 2);
        assert_eq!(series.skipped.len(), 1);
    }

    #[test]
    fn test_gap_days_are_zero_filled() {
        let issues = vec![
            open_issue("a", "2024-01-01T10:00:00Z"),
            open_issue("b", "2024-01-04T10:00:00Z"),
        ];

        let series = aggregate(&issues).unwrap();

        assert_eq!(series.created, vec![1, 0, 0, 1]);
        assert_eq!(series.resolved, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_resolution_date_widens_range() {
        // Only one creation date, but the resolution lands two days later.
        let issues = vec![resolved_issue(
            "a",
            "2024-01-01T10:00:00Z",
            "2024-01-03T10:00:00Z",
        )];

        let series = aggregate(&issues).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.created, vec![0, 0, 0]);
        assert_eq!(series.resolved, vec![0, 0, 1]);
    }

    #[test]
    fn test_resolved_without_resolution_timestamp_is_recorded() {
        let mut issue = open_issue("a", "2024-01-01T10:00:00Z");
        issue.attributes.status = Some("resolved".to_string());

        let series = aggregate(&[issue]).unwrap();

        // Creation date still anchors the range; nothing is counted.
        assert_eq!(series.len(), 1);
        assert_eq!(series.created, vec![0]);
        assert_eq!(series.resolved, vec![0]);
        assert_eq!(series.skipped.len(), 1);
        assert_eq!(series.skipped[0].reason, SkipReason::MissingResolvedAt);
    }

    #[test]
    fn test_ignored_status_counts_nothing() {
        let mut issue = open_issue("a", "2024-01-02T10:00:00Z");
        issue.attributes.status = Some("ignored".to_string());

        let series = aggregate(&[issue]).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.created, vec![0]);
        assert_eq!(series.resolved, vec![0]);
        assert!(series.skipped.is_empty());
    }

    #[test]
    fn test_date_labels_match_series_length() {
        let issues = vec![
            open_issue("a", "2024-02-27T10:00:00Z"),
            open_issue("b", "2024-03-02T10:00:00Z"),
        ];

        let series = aggregate(&issues).unwrap();
        let labels = series.date_labels();

        assert_eq!(labels.len(), series.len());
        // 2024 is a leap year: Feb 27, 28, 29, Mar 1, Mar 2.
        assert_eq!(
            labels,
            vec![
                "2024-02-27",
                "2024-02-28",
                "2024-02-29",
                "2024-03-01",
                "2024-03-02"
            ]
        );
    }

    #[test]
    fn test_cumulative_is_monotone_and_ends_at_totals() {
        let issues = vec![
            open_issue("a", "2024-01-01T10:00:00Z"),
            open_issue("b", "2024-01-02T10:00:00Z"),
            resolved_issue("c", "2024-01-01T10:00:00Z", "2024-01-03T10:00:00Z"),
        ];

        let daily = aggregate(&issues).unwrap();
        let cumulative = daily.cumulative();

        assert_eq!(cumulative.created, vec![1, 2, 2]);
        assert_eq!(cumulative.resolved, vec![0, 0, 1]);
        assert!(cumulative
            .created
            .windows(2)
            .all(|pair| pair[0] <= pair[1]));
        assert_eq!(
            *cumulative.created.last().unwrap(),
            daily.created.iter().sum::<u64>()
        );
        assert_eq!(cumulative.start, daily.start);
        assert_eq!(cumulative.end, daily.end);
    }

    #[test]
    fn test_single_day_series() {
        let series = aggregate(&[open_issue("a", "2024-06-15T10:00:00Z")]).unwrap();

        assert_eq!(series.start, series.end);
        assert_eq!(series.created, vec![1]);
        assert_eq!(series.resolved, vec![0]);
        assert_eq!(series.date_labels(), vec!["2024-06-15"]);
    }
}
