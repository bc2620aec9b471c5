// src/analytics/mod.rs
//! Natural-language analytics dashboard: one query in, a chart and a data
//! table out.

pub mod chart;
pub mod export;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::core::ApiClient;
use crate::types::response::{
    AnalyticsQueryRequest, AnalyticsQueryResponse, SuggestionsResponse,
};
use crate::types::ValidationWarning;
pub use chart::{ChartData, ChartSpec, ChartType, Series};
pub use export::{export_csv, rows_to_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartHandle(pub u64);

/// Drawing target for charts, the role a canvas plays in a browser
pub trait ChartSurface: Send {
    fn create(&mut self, spec: &ChartSpec) -> Result<ChartHandle>;
    fn destroy(&mut self, handle: ChartHandle);
    fn set_visible(&mut self, visible: bool);
}

#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn query(&self, text: &str) -> Result<Option<AnalyticsQueryResponse>>;
    async fn overview(&self) -> Result<Option<Map<String, Value>>>;
    async fn suggestions(&self) -> Result<Option<Vec<String>>>;
}

#[async_trait]
impl AnalyticsSource for ApiClient {
    async fn query(&self, text: &str) -> Result<Option<AnalyticsQueryResponse>> {
        self.post_json("/analytics/query", &AnalyticsQueryRequest { query: text })
            .await
            .context("Analytics query failed")
    }

    async fn overview(&self) -> Result<Option<Map<String, Value>>> {
        self.get("/analytics/predefined/overview")
            .await
            .context("Failed to load analytics overview")
    }

    async fn suggestions(&self) -> Result<Option<Vec<String>>> {
        let response: Option<SuggestionsResponse> = self
            .get("/analytics/suggestions")
            .await
            .context("Failed to load query suggestions")?;
        Ok(response.map(|r| r.suggestions))
    }
}

/// Rows laid out under the first row's columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn from_rows(rows: &[Map<String, Value>]) -> Self {
        let columns = export::columns(rows);
        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| export::cell_text(row.get(c)))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn render(&self) -> String {
        if self.columns.is_empty() {
            return "No data".to_string();
        }

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = vec![line(&self.columns)];
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        out.extend(self.rows.iter().map(|row| line(row)));
        out.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub query: String,
    pub answer: String,
    pub chart_type: ChartType,
    pub table: TableView,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelState {
    #[default]
    Idle,
    Loaded(QueryResult),
    /// Shown with a retry action for the failed query
    Error { query: String, message: String },
}

pub struct Dashboard<S, C> {
    source: S,
    surface: C,
    chart: Option<ChartHandle>,
    state: PanelState,
    last_rows: Vec<Map<String, Value>>,
    suggestions: Vec<String>,
}

impl<S: AnalyticsSource, C: ChartSurface> Dashboard<S, C> {
    pub fn new(source: S, surface: C) -> Self {
        Self {
            source,
            surface,
            chart: None,
            state: PanelState::Idle,
            last_rows: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn chart(&self) -> Option<ChartHandle> {
        self.chart
    }

    pub fn surface(&self) -> &C {
        &self.surface
    }

    pub fn last_rows(&self) -> &[Map<String, Value>] {
        &self.last_rows
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Run a query and render its result. Network and decoding failures land
    /// in the error panel; `Ok(false)` means the session ended.
    pub async fn submit_query(&mut self, text: &str) -> Result<bool, ValidationWarning> {
        let query = text.trim();
        if query.is_empty() {
            return Err(ValidationWarning::EmptyQuery);
        }

        info!("Submitting analytics query: {}", query);
        self.last_rows.clear();
        match self.source.query(query).await {
            Ok(Some(response)) => {
                if let Err(e) = self.show(query, response) {
                    error!("Failed to render analytics result: {:#}", e);
                    self.state = PanelState::Error {
                        query: query.to_string(),
                        message: format!("{:#}", e),
                    };
                }
                Ok(true)
            }
            Ok(None) => {
                self.state = PanelState::Idle;
                Ok(false)
            }
            Err(e) => {
                error!("{:#}", e);
                self.state = PanelState::Error {
                    query: query.to_string(),
                    message: format!("{:#}", e),
                };
                Ok(true)
            }
        }
    }

    /// Resubmit the query held by the error panel
    pub async fn retry(&mut self) -> Result<bool, ValidationWarning> {
        let PanelState::Error { query, .. } = &self.state else {
            debug!("Nothing to retry");
            return Ok(false);
        };
        let query = query.clone();
        self.submit_query(&query).await
    }

    fn show(&mut self, query: &str, response: AnalyticsQueryResponse) -> Result<()> {
        let chart_type = ChartType::parse(response.chart_type.as_deref());

        if let Some(previous) = self.chart.take() {
            self.surface.destroy(previous);
        }

        if chart_type.is_table() {
            self.surface.set_visible(false);
        } else {
            let data = response
                .chart_data
                .as_ref()
                .map(ChartData::from_value)
                .unwrap_or_default();
            if data.is_empty() {
                warn!("Query returned no chart data for a {} chart", chart_type);
            }
            let spec = ChartSpec {
                chart_type,
                title: query.to_string(),
                data,
            };
            self.surface.set_visible(true);
            self.chart = Some(self.surface.create(&spec)?);
        }

        let table = TableView::from_rows(&response.raw_data);
        self.last_rows = response.raw_data;
        self.state = PanelState::Loaded(QueryResult {
            query: query.to_string(),
            answer: response.answer,
            chart_type,
            table,
        });
        Ok(())
    }

    pub fn export_text(&self) -> Result<String> {
        rows_to_csv(&self.last_rows)
    }

    pub async fn load_overview(&self) -> Result<Option<Map<String, Value>>> {
        self.source.overview().await
    }

    pub async fn load_suggestions(&mut self) -> Result<bool> {
        match self.source.suggestions().await? {
            Some(suggestions) => {
                self.suggestions = suggestions;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Flatten an overview object into "key: value" lines, nested objects indented
pub fn render_overview(overview: &Map<String, Value>) -> Vec<String> {
    fn walk(map: &Map<String, Value>, depth: usize, out: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        for (key, value) in map {
            let label = key.replace('_', " ");
            match value {
                Value::Object(inner) => {
                    out.push(format!("{}{}:", indent, label));
                    walk(inner, depth + 1, out);
                }
                other => out.push(format!(
                    "{}{}: {}",
                    indent,
                    label,
                    export::cell_text(Some(other))
                )),
            }
        }
    }

    let mut out = Vec::new();
    walk(overview, 0, &mut out);
    out
}

/// Horizontal bar rendering for terminals
#[derive(Debug, Default)]
pub struct TextSurface {
    next_id: u64,
    live: Option<ChartHandle>,
    visible: bool,
    output: String,
}

impl TextSurface {
    const WIDTH: usize = 40;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn live(&self) -> Option<ChartHandle> {
        self.live
    }

    pub fn output(&self) -> &str {
        if self.visible {
            &self.output
        } else {
            ""
        }
    }
}

impl ChartSurface for TextSurface {
    fn create(&mut self, spec: &ChartSpec) -> Result<ChartHandle> {
        if let Some(live) = self.live {
            anyhow::bail!("Chart {} is still on the surface", live.0);
        }

        let mut lines = vec![format!("[{}] {}", spec.chart_type, spec.title)];
        let label_width = spec
            .data
            .labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);

        for series in &spec.data.series {
            if spec.data.series.len() > 1 {
                lines.push(format!("{}:", series.label));
            }
            let max = series.data.iter().cloned().fold(0.0_f64, f64::max);
            for (label, value) in spec.data.labels.iter().zip(&series.data) {
                let bar = if max > 0.0 {
                    ((value / max) * Self::WIDTH as f64).round().max(0.0) as usize
                } else {
                    0
                };
                lines.push(format!(
                    "{:<width$} {} {}",
                    label,
                    "#".repeat(bar),
                    value,
                    width = label_width
                ));
            }
        }

        self.next_id += 1;
        let handle = ChartHandle(self.next_id);
        self.live = Some(handle);
        self.output = lines.join("\n");
        Ok(handle)
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if self.live == Some(handle) {
            self.live = None;
            self.output.clear();
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
