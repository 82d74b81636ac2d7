//! Scalar metrics scraped from the free-text architecture summary report.
//!
//! Values live inside list items such as
//! `<li>Propagation Cost is 12,5% ...</li>`, so the report is read as text
//! rather than as structured markup.

use crate::error::{PipelineError, Result};
use regex::Regex;
use std::path::Path;

pub const DECOUPLING_LEVEL: &str = "Decoupling Level";
pub const PROPAGATION_COST: &str = "Propagation Cost";

/// Returned when the label is present but no numeral precedes the next `%`.
pub const UNPARSABLE_METRIC: f64 = -1.0;

pub fn read_project_metric(path: &Path, metric: &str) -> Result<f64> {
    let html = std::fs::read_to_string(path).map_err(|e| PipelineError::io(e, path))?;
    let value = parse_project_metric(&html, metric)?.ok_or_else(|| PipelineError::MetricNotFound {
        metric: metric.to_string(),
        path: path.to_path_buf(),
    })?;

    if value == UNPARSABLE_METRIC {
        log::warn!("Unreadable value for \"{metric}\" in {}", path.display());
    }
    Ok(value)
}

/// Value of `metric` from the first list item mentioning it, or `None` when
/// no list item mentions it.
pub fn parse_project_metric(html: &str, metric: &str) -> Result<Option<f64>> {
    let value = list_item_texts(html)?
        .iter()
        .find(|text| text.contains(metric))
        .map(|text| numeral_after_label(text, metric).unwrap_or(UNPARSABLE_METRIC));
    Ok(value)
}

fn numeral_after_label(text: &str, metric: &str) -> Option<f64> {
    let start = text.find(metric)? + metric.len();
    let rest = text[start..].trim_start();
    let rest = rest.strip_prefix("is").unwrap_or(rest);
    let end = rest.find('%')?;

    rest[..end].trim().replace(',', ".").parse::<f64>().ok()
}

/// Visible text of every `<li>` element, whitespace collapsed.
pub fn list_item_texts(html: &str) -> Result<Vec<String>> {
    let open = Regex::new(r"(?i)<li\b[^>]*>")?;
    let boundary = Regex::new(r"(?i)</?(?:li|ul|ol)\b")?;
    let tag = Regex::new(r"<[^>]*>")?;

    let items = open
        .find_iter(html)
        .map(|m| {
            let end = boundary
                .find_at(html, m.end())
                .map_or(html.len(), |b| b.start());
            let stripped = tag.replace_all(&html[m.end()..end], "");
            collapse_whitespace(&decode_entities(&stripped))
        })
        .collect();
    Ok(items)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#37;", "%")
        .replace("&percnt;", "%")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
