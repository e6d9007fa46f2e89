//! Prometheus text exposition document.
//!
//! Names and label names are checked with `prometheus::core::Desc`. Rendering
//! stays local because `TextEncoder` prints `2.0` as `2` and the artifact
//! needs fixed 2-decimal values.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use prometheus::core::Desc;

/// A document that would not be accepted by a Prometheus scraper.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid metric family {family}: {source}")]
    InvalidFamily {
        family: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("samples of {family} do not share one label set")]
    InconsistentLabels { family: String },

    #[error("duplicate series {family}{{{labels}}}")]
    DuplicateSeries { family: String, labels: String },
}

/// A sample value with its rendering rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    /// Rendered without a decimal point
    Integer(u64),
    /// Rendered with exactly 2 decimals
    Fixed(f64),
}

impl std::fmt::Display for SampleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleValue::Integer(v) => write!(f, "{}", v),
            // Non-finite values would render as NaN/inf, which graph consumers reject
            SampleValue::Fixed(v) if !v.is_finite() => f.write_str("0.00"),
            SampleValue::Fixed(v) => write!(f, "{:.2}", v + 0.0),
        }
    }
}

/// One sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Vec<(String, String)>,
    pub value: SampleValue,
}

/// All samples sharing one metric name.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub samples: Vec<Sample>,
}

/// Ordered metric families plus the document-wide capture timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricDocument {
    families: Vec<MetricFamily>,
    timestamp_ms: Option<i64>,
}

impl MetricDocument {
    /// Create an empty document. Every sample shares `timestamp_ms`.
    pub fn new(timestamp_ms: Option<i64>) -> Self {
        MetricDocument {
            families: Vec::new(),
            timestamp_ms,
        }
    }

    /// Add a sample, creating its family on first use.
    ///
    /// The help text of the first call for a name wins.
    pub fn push(
        &mut self,
        name: &str,
        help: &str,
        labels: &[(&str, &str)],
        value: SampleValue,
    ) -> &mut Self {
        let sample = Sample {
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value,
        };

        match self.families.iter_mut().find(|f| f.name == name) {
            Some(family) => family.samples.push(sample),
            None => self.families.push(MetricFamily {
                name: name.to_string(),
                help: help.to_string(),
                samples: vec![sample],
            }),
        }
        self
    }

    pub fn families(&self) -> &[MetricFamily] {
        &self.families
    }

    pub fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp_ms
    }

    /// Check family names, label names and series uniqueness.
    pub fn validate(&self) -> Result<(), DocumentError> {
        for family in &self.families {
            let label_names: Vec<String> = family
                .samples
                .first()
                .map(|s| s.labels.iter().map(|(k, _)| k.clone()).collect())
                .unwrap_or_default();

            Desc::new(
                family.name.clone(),
                family.help.clone(),
                label_names.clone(),
                HashMap::new(),
            )
            .map_err(|source| DocumentError::InvalidFamily {
                family: family.name.clone(),
                source,
            })?;

            let mut seen = HashSet::new();
            for sample in &family.samples {
                if !sample.labels.iter().map(|(k, _)| k).eq(label_names.iter()) {
                    return Err(DocumentError::InconsistentLabels {
                        family: family.name.clone(),
                    });
                }
                if !seen.insert(&sample.labels) {
                    return Err(DocumentError::DuplicateSeries {
                        family: family.name.clone(),
                        labels: render_labels(&sample.labels),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render the document in Prometheus text format, newline terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let timestamp = self
            .timestamp_ms
            .map(|ts| format!(" {}", ts))
            .unwrap_or_default();

        for family in &self.families {
            let _ = writeln!(out, "# HELP {} {}", family.name, escape_help(&family.help));
            let _ = writeln!(out, "# TYPE {} gauge", family.name);

            for sample in &family.samples {
                out.push_str(&family.name);
                if !sample.labels.is_empty() {
                    let _ = write!(out, "{{{}}}", render_labels(&sample.labels));
                }
                let _ = writeln!(out, " {}{}", sample.value, timestamp);
            }
        }

        out
    }
}

fn render_labels(labels: &[(String, String)]) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, escape_label_value(value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Escape a label value: backslash, double quote and line feed.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escape HELP text: backslash and line feed.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}
