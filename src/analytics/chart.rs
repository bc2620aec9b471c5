// src/analytics/chart.rs
//! Chart type tags and the numeric series extracted from query results

use serde_json::Value;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Doughnut,
    Radar,
    PolarArea,
    /// Data table only, no chart
    Table,
}

impl ChartType {
    pub const ALL: [ChartType; 7] = [
        Self::Bar,
        Self::Line,
        Self::Pie,
        Self::Doughnut,
        Self::Radar,
        Self::PolarArea,
        Self::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Doughnut => "doughnut",
            Self::Radar => "radar",
            Self::PolarArea => "polarArea",
            Self::Table => "table",
        }
    }

    /// Unknown or missing tags render as a bar chart
    pub fn parse(tag: Option<&str>) -> Self {
        let Some(tag) = tag.map(str::trim) else {
            return Self::Bar;
        };
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
            .unwrap_or_else(|| {
                debug!("Unknown chart type '{}', using bar", tag);
                Self::Bar
            })
    }

    pub fn is_table(&self) -> bool {
        *self == Self::Table
    }

    /// One color per data point rather than per series
    pub fn is_radial(&self) -> bool {
        matches!(self, Self::Pie | Self::Doughnut | Self::PolarArea)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn array<'a>(value: Option<&'a Value>) -> &'a [Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

impl ChartData {
    /// Accepts `{labels, datasets: [{data}]}` as well as
    /// `{datasets: [{labels, data}]}`, and a bare top-level `data` array.
    /// Every series ends up exactly as long as the label list.
    pub fn from_value(value: &Value) -> Self {
        let datasets = array(value.get("datasets"));

        let labels_source = match value.get("labels") {
            Some(labels) if labels.is_array() => Some(labels),
            _ => datasets.first().and_then(|d| d.get("labels")),
        };
        let labels: Vec<String> = array(labels_source).iter().map(label_text).collect();

        let mut series: Vec<Series> = datasets
            .iter()
            .enumerate()
            .map(|(i, dataset)| Series {
                label: dataset
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Series {}", i + 1)),
                data: array(dataset.get("data")).iter().map(number).collect(),
            })
            .collect();

        if series.is_empty() {
            if let Some(data) = value.get("data").filter(|d| d.is_array()) {
                series.push(Series {
                    label: "Series 1".to_string(),
                    data: array(Some(data)).iter().map(number).collect(),
                });
            }
        }

        for s in &mut series {
            s.data.resize(labels.len(), 0.0);
        }

        Self { labels, series }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.series.is_empty()
    }
}

/// Everything a surface needs to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: String,
    pub data: ChartData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chart_type_parse() {
        assert_eq!(ChartType::parse(Some("pie")), ChartType::Pie);
        assert_eq!(ChartType::parse(Some("polarArea")), ChartType::PolarArea);
        assert_eq!(ChartType::parse(Some("TABLE")), ChartType::Table);
        assert_eq!(ChartType::parse(Some("scatter")), ChartType::Bar);
        assert_eq!(ChartType::parse(None), ChartType::Bar);
    }

    #[test]
    fn test_top_level_labels_shape() {
        let data = ChartData::from_value(&json!({
            "labels": ["A", "B"],
            "datasets": [{"label": "Jobs", "data": [3, 7]}]
        }));
        assert_eq!(data.labels, vec!["A", "B"]);
        assert_eq!(data.series[0].label, "Jobs");
        assert_eq!(data.series[0].data, vec![3.0, 7.0]);
    }

    #[test]
    fn test_dataset_labels_shape() {
        let data = ChartData::from_value(&json!({
            "datasets": [{"labels": ["x", 2021, null], "data": ["1.5", 2]}]
        }));
        assert_eq!(data.labels, vec!["x", "2021", ""]);
        assert_eq!(data.series[0].data, vec![1.5, 2.0, 0.0]);
    }

    #[test]
    fn test_series_match_label_count() {
        let data = ChartData::from_value(&json!({
            "labels": ["a", "b"],
            "datasets": [
                {"data": [1, 2, 3, 4]},
                {"data": [true]}
            ]
        }));
        assert_eq!(data.series.len(), 2);
        assert!(data.series.iter().all(|s| s.data.len() == 2));
        assert_eq!(data.series[1].label, "Series 2");
        assert_eq!(data.series[1].data, vec![0.0, 0.0]);
    }

    #[test]
    fn test_missing_data_is_empty() {
        assert!(ChartData::from_value(&Value::Null).is_empty());
        let bare = ChartData::from_value(&json!({"labels": ["a"], "data": [5]}));
        assert_eq!(bare.series[0].data, vec![5.0]);
    }
}
