//! Chart figure payloads.
//!
//! Builds plotly-shaped JSON figures for the two dashboard views: the
//! per-title scatter of issue count against latest update date, and the
//! created-vs-resolved activity lines. The crate only emits the data;
//! rendering belongs to whatever dashboard consumes the JSON.

use crate::transform::{ActivitySeries, FlatRecord};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Column holding the issue title in a flat record.
const TITLE_COLUMN: &str = "title";

/// Column holding the last-update timestamp in a flat record.
const UPDATED_COLUMN: &str = "updated_at";

/// A complete figure: traces plus layout.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    /// The traces to draw.
    pub data: Vec<Trace>,
    /// Titles and axis labels.
    pub layout: Layout,
}

/// One trace of a figure.
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    /// Plot type, always "scatter" (lines and markers are both scatter
    /// traces in plotly terms).
    #[serde(rename = "type")]
    pub trace_type: String,
    /// Draw mode: "markers" or "lines".
    pub mode: String,
    /// X values; ISO date strings.
    pub x: Vec<String>,
    /// Y values; counts.
    pub y: Vec<u64>,
    /// Legend name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Per-point hover labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    /// Marker styling for scatter points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    /// Hover behavior ("text" to show only the label).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoverinfo: Option<String>,
}

/// Marker styling.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    /// Marker size in pixels.
    pub size: u32,
    /// CSS color name or hex.
    pub color: String,
    /// Opacity, 0.0 to 1.0.
    pub opacity: f64,
}

/// Figure layout: title and axis labels.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Figure title.
    pub title: String,
    /// X axis.
    pub xaxis: Axis,
    /// Y axis.
    pub yaxis: Axis,
    /// Hover mode, e.g. "closest".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<String>,
}

/// An axis with a title.
#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    /// Axis label.
    pub title: String,
}

/// One scatter point: a title with its occurrence count and the latest
/// update date across its occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleGroup {
    /// Issue title.
    pub title: String,
    /// Latest `updated_at` value across the group, if any row had one.
    pub latest_updated: Option<String>,
    /// How many rows share this title.
    pub count: u64,
}

/// Group flat records by title: occurrence count plus latest update date.
///
/// Rows without a title column are left out, mirroring how the CSV
/// grouping treated them. ISO timestamps compare lexicographically, so a
/// plain string max picks the latest.
pub fn scatter_by_title(records: &[FlatRecord]) -> Vec<TitleGroup> {
    let mut groups: BTreeMap<String, (Option<String>, u64)> = BTreeMap::new();

    for record in records {
        let title = match record.get(TITLE_COLUMN) {
            Some(value) => value.to_string(),
            None => continue,
        };
        let updated = record.get(UPDATED_COLUMN).map(|value| value.to_string());

        let entry = groups.entry(title).or_insert((None, 0));
        entry.1 += 1;
        if let Some(updated) = updated {
            entry.0 = Some(match entry.0.take() {
                Some(existing) if existing >= updated => existing,
                _ => updated,
            });
        }
    }

    groups
        .into_iter()
        .map(|(title, (latest_updated, count))| TitleGroup {
            title,
            latest_updated,
            count,
        })
        .collect()
}

/// Build the scatter figure from grouped titles.
pub fn scatter_figure(groups: &[TitleGroup]) -> Figure {
    let trace = Trace {
        trace_type: "scatter".to_string(),
        mode: "markers".to_string(),
        x: groups
            .iter()
            .map(|g| g.latest_updated.clone().unwrap_or_default())
            .collect(),
        y: groups.iter().map(|g| g.count).collect(),
        name: None,
        text: groups.iter().map(|g| g.title.clone()).collect(),
        marker: Some(Marker {
            size: 15,
            color: "cornflowerblue".to_string(),
            opacity: 0.7,
        }),
        hoverinfo: Some("text".to_string()),
    };

    Figure {
        data: vec![trace],
        layout: Layout {
            title: "Snyk Issue Distribution by Latest Update Date (Title & Count)".to_string(),
            xaxis: Axis {
                title: "Latest Update Date".to_string(),
            },
            yaxis: Axis {
                title: "Count".to_string(),
            },
            hovermode: Some("closest".to_string()),
        },
    }
}

/// Build the created-vs-resolved line figure.
///
/// `cumulative` switches the traces to running totals via
/// [`ActivitySeries::cumulative`]; the default stays per-day.
pub fn activity_figure(series: &ActivitySeries, cumulative: bool) -> Figure {
    let view;
    let series = if cumulative {
        view = series.cumulative();
        &view
    } else {
        series
    };

    let labels = series.date_labels();
    let line = |name: &str, y: Vec<u64>| Trace {
        trace_type: "scatter".to_string(),
        mode: "lines".to_string(),
        x: labels.clone(),
        y,
        name: Some(name.to_string()),
        text: Vec::new(),
        marker: None,
        hoverinfo: None,
    };

    let (title, y_title) = if cumulative {
        (
            "Cumulative Vulnerability Status (Created vs. Resolved) Over Time",
            "Number of Vulnerabilities (Cumulative)",
        )
    } else {
        (
            "Daily Vulnerability Status (Created vs. Resolved) Over Time",
            "Number of Vulnerabilities",
        )
    };

    Figure {
        data: vec![
            line("Created", series.created.clone()),
            line("Resolved", series.resolved.clone()),
        ],
        layout: Layout {
            title: title.to_string(),
            xaxis: Axis {
                title: "Date".to_string(),
            },
            yaxis: Axis {
                title: y_title.to_string(),
            },
            hovermode: None,
        },
    }
}

/// Serialize a figure as pretty JSON.
pub fn figure_json(figure: &Figure) -> Result<String> {
    serde_json::to_string_pretty(figure).context("Failed to serialize figure")
}

/// Write a figure as JSON to a file path.
pub fn write_figure_file(figure: &Figure, path: &Path) -> Result<()> {
    let json = figure_json(figure)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
