//! Result renderer: summary tiles plus a capped table

use ops_desk_types::{CommandResult, Metric, ResultData};
use serde::Serialize;
use serde_json::{Map, Value};

pub const MAX_TABLE_COLUMNS: usize = 4;
pub const MAX_TABLE_ROWS: usize = 5;

/// Normalised view of a `CommandResult`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayModel {
    pub success: bool,
    pub message: String,
    pub tiles: Vec<SummaryTile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableView>,
}

impl DisplayModel {
    /// Nothing to show beyond the message
    pub fn is_message_only(&self) -> bool {
        self.tiles.is_empty() && self.table.is_none()
    }
}

/// Label/value counter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTile {
    pub label: String,
    pub value: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows in the source payload
    pub total_rows: usize,
    /// `"Showing N of M items"` when rows were cut
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

/// Render a result for display.
pub fn render(result: &CommandResult) -> DisplayModel {
    let (tiles, table) = match &result.data {
        Some(data) => (summary_tiles(data), data.results.as_deref().and_then(table_view)),
        None => (Vec::new(), None),
    };

    DisplayModel {
        success: result.success,
        message: result.message.clone(),
        tiles,
        table,
    }
}

/// Tiles in fixed priority: count, total, total_value, then one per status.
fn summary_tiles(data: &ResultData) -> Vec<SummaryTile> {
    let mut tiles = Vec::new();

    let counters = [
        ("Total Items", &data.count),
        ("Total", &data.total),
        ("Total Value", &data.total_value),
    ];
    for (label, value) in counters {
        if let Some(value) = value {
            tiles.push(SummaryTile {
                label: label.to_string(),
                value: value.clone(),
            });
        }
    }

    if let Some(by_status) = &data.by_status {
        for entry in by_status {
            tiles.push(SummaryTile {
                label: humanize(&entry.status),
                value: entry.count.clone(),
            });
        }
    }

    tiles
}

fn table_view(rows: &[Map<String, Value>]) -> Option<TableView> {
    let first = rows.first()?;

    let columns: Vec<String> = first
        .iter()
        .filter(|(_, v)| is_scalar(v))
        .map(|(k, _)| k.clone())
        .take(MAX_TABLE_COLUMNS)
        .collect();
    if columns.is_empty() {
        return None;
    }

    let shown: Vec<Vec<String>> = rows
        .iter()
        .take(MAX_TABLE_ROWS)
        .map(|row| columns.iter().map(|c| cell_text(row.get(c))).collect())
        .collect();

    let footer = (rows.len() > shown.len())
        .then(|| format!("Showing {} of {} items", shown.len(), rows.len()));

    Some(TableView {
        columns,
        rows: shown,
        total_rows: rows.len(),
        footer,
    })
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        // Later rows may disagree with the first row's shape
        Some(other) => other.to_string(),
    }
}

/// "in_stock" → "In Stock"
fn humanize(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
