//! CSV import and export for table records.
//!
//! Export writes one column per field in display order. Import maps CSV
//! columns onto fields through a caller-supplied mapping; unmapped columns
//! are ignored, rows with no mapped non-empty cells count as skipped, and
//! rows whose cells fail coercion count as errored.

use std::collections::HashMap;

use gridbase_postgres::model::{Field, Record};
use gridbase_postgres::types::{FieldOptions, FieldType, FieldValue};
use uuid::Uuid;

/// Tracing target for CSV operations.
const TRACING_TARGET: &str = "gridbase_server::service::csv";

/// Number of sample rows returned by an import preview.
const PREVIEW_ROWS: usize = 10;

/// Error produced when the CSV payload itself is unreadable.
#[derive(Debug, thiserror::Error)]
#[error("CSV payload is malformed: {0}")]
pub struct CsvError(#[from] csv::Error);

/// Outcome counters of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, schemars::JsonSchema)]
pub struct ImportOutcome {
    /// Rows turned into records.
    pub imported: usize,
    /// Rows with no mapped non-empty cells.
    pub skipped: usize,
    /// Rows dropped because a cell failed coercion.
    pub errors: usize,
}

/// A parsed preview of an import payload.
#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
pub struct ImportPreview {
    /// Column names from the header row.
    pub columns: Vec<String>,
    /// Up to the first ten data rows.
    pub rows: Vec<Vec<String>>,
    /// Total number of data rows in the payload.
    pub total_rows: usize,
}

/// Exports records as CSV with one column per field in display order.
pub fn export_records(fields: &[Field], records: &[Record]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header: Vec<&str> = fields.iter().map(|f| f.display_name.as_str()).collect();
    // Writing into a Vec<u8> cannot fail.
    let _ = writer.write_record(&header);

    for record in records {
        let row: Vec<String> = fields
            .iter()
            .map(|field| export_cell(field, record.values.get(field.id.to_string())))
            .collect();
        let _ = writer.write_record(&row);
    }

    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8(bytes).unwrap_or_default()
}

/// Renders a single cell for export.
fn export_cell(field: &Field, value: Option<&serde_json::Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(flag) => flag.to_string(),
        serde_json::Value::Number(number) => format_number(number.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Array(items) => match field.field_type {
            // Link and attachment cells hold ids that mean nothing outside
            // this base; they export empty.
            FieldType::LinkedRecord | FieldType::Attachment => String::new(),
            _ => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        },
        other => other.to_string(),
    }
}

/// Renders a number without a trailing `.0` for integral values.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parses a payload into a bounded preview.
pub fn preview(data: &str) -> Result<ImportPreview, CsvError> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|column| column.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut total_rows = 0;
    for row in reader.records() {
        let row = row?;
        total_rows += 1;
        if rows.len() < PREVIEW_ROWS {
            rows.push(row.iter().map(|cell| cell.to_string()).collect());
        }
    }

    Ok(ImportPreview {
        columns,
        rows,
        total_rows,
    })
}

/// Parses rows into validated record values.
///
/// Returns the importable value maps plus the outcome counters; the caller
/// persists the values through the mutation path.
pub fn import_rows(
    data: &str,
    mappings: &HashMap<String, Uuid>,
    fields: &[Field],
) -> Result<(Vec<serde_json::Map<String, serde_json::Value>>, ImportOutcome), CsvError> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|column| column.to_string())
        .collect();

    // Resolve each mapped column to its position and target field up front.
    let column_targets: Vec<(usize, &Field)> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, column)| {
            let field_id = mappings.get(column)?;
            let field = fields.iter().find(|f| f.id == *field_id)?;
            Some((index, field))
        })
        .collect();

    let mut outcome = ImportOutcome::default();
    let mut imported = Vec::new();

    for row in reader.records() {
        let row = row?;

        let mut values = serde_json::Map::new();
        let mut row_failed = false;

        for (index, field) in &column_targets {
            let cell = row.get(*index).unwrap_or_default().trim();
            if cell.is_empty() {
                continue;
            }

            match coerce_cell(field, cell) {
                Ok(value) => {
                    values.insert(field.id.to_string(), value);
                }
                Err(reason) => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        field = %field.display_name,
                        cell = %cell,
                        reason = %reason,
                        "cell failed import coercion"
                    );
                    row_failed = true;
                    break;
                }
            }
        }

        if row_failed {
            outcome.errors += 1;
        } else if values.is_empty() {
            outcome.skipped += 1;
        } else {
            outcome.imported += 1;
            imported.push(values);
        }
    }

    Ok((imported, outcome))
}

/// Coerces one CSV cell into a validated JSON cell value.
fn coerce_cell(field: &Field, cell: &str) -> Result<serde_json::Value, String> {
    let candidate = match field.field_type {
        FieldType::Text | FieldType::SingleSelect => serde_json::json!(cell),
        FieldType::Number => {
            let number: f64 = cell.parse().map_err(|_| "not a number".to_string())?;
            serde_json::json!(number)
        }
        FieldType::Checkbox => serde_json::json!(coerce_checkbox(cell)?),
        FieldType::Date => serde_json::json!(cell),
        FieldType::MultiSelect => {
            let items: Vec<serde_json::Value> = cell
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| serde_json::json!(item))
                .collect();
            serde_json::Value::Array(items)
        }
        FieldType::LinkedRecord
        | FieldType::Attachment
        | FieldType::Formula
        | FieldType::Rollup
        | FieldType::Lookup => {
            return Err(format!("{} fields cannot be imported", field.field_type));
        }
    };

    let options = FieldOptions::parse(field.field_type, &field.options)
        .map_err(|e| e.to_string())?;
    FieldValue::parse(field.field_type, &options, &candidate)
        .map_err(|e| e.to_string())?
        .map(FieldValue::into_json)
        .ok_or_else(|| "empty cell".to_string())
}

/// Coerces checkbox spellings: true/yes/1/checked and their negations.
fn coerce_checkbox(cell: &str) -> Result<bool, String> {
    match cell.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "checked" | "x" => Ok(true),
        "false" | "no" | "0" | "unchecked" | "" => Ok(false),
        other => Err(format!("`{other}` is not a checkbox value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_field(name: &str, field_type: FieldType) -> Field {
        let now = jiff_diesel::Timestamp::from(jiff::Timestamp::now());
        Field {
            id: Uuid::new_v4(),
            table_id: Uuid::nil(),
            display_name: name.to_string(),
            field_type,
            options: serde_json::json!({}),
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_record(values: serde_json::Value) -> Record {
        let now = jiff_diesel::Timestamp::from(jiff::Timestamp::now());
        Record {
            id: Uuid::new_v4(),
            table_id: Uuid::nil(),
            values,
            row_color: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn export_then_import_round_trips_scalar_types() {
        let name = make_field("Name", FieldType::Text);
        let count = make_field("Count", FieldType::Number);
        let done = make_field("Done", FieldType::Checkbox);
        let due = make_field("Due", FieldType::Date);
        let fields = vec![name.clone(), count.clone(), done.clone(), due.clone()];

        let record = make_record(serde_json::json!({
            name.id.to_string(): "Ana",
            count.id.to_string(): 4.5,
            done.id.to_string(): true,
            due.id.to_string(): "2025-03-14",
        }));

        let csv_text = export_records(&fields, &[record]);

        let mappings: HashMap<String, Uuid> = fields
            .iter()
            .map(|f| (f.display_name.clone(), f.id))
            .collect();
        let (rows, outcome) = import_rows(&csv_text, &mappings, &fields).unwrap();

        assert_eq!(outcome, ImportOutcome { imported: 1, skipped: 0, errors: 0 });
        assert_eq!(rows[0][&name.id.to_string()], serde_json::json!("Ana"));
        assert_eq!(rows[0][&count.id.to_string()], serde_json::json!(4.5));
        assert_eq!(rows[0][&done.id.to_string()], serde_json::json!(true));
        assert_eq!(rows[0][&due.id.to_string()], serde_json::json!("2025-03-14"));
    }

    #[test]
    fn yes_imports_as_true_and_reexports_as_true() {
        let done = make_field("Done", FieldType::Checkbox);
        let fields = vec![done.clone()];

        let csv_text = "Done\nyes\n";
        let mappings = HashMap::from([("Done".to_string(), done.id)]);
        let (rows, outcome) = import_rows(csv_text, &mappings, &fields).unwrap();

        assert_eq!(outcome.imported, 1);
        assert_eq!(rows[0][&done.id.to_string()], serde_json::json!(true));

        let record = make_record(serde_json::Value::Object(rows[0].clone()));
        let exported = export_records(&fields, &[record]);
        assert!(exported.contains("true"));
    }

    #[test]
    fn unmapped_and_empty_rows_are_counted() {
        let name = make_field("Name", FieldType::Text);
        let fields = vec![name.clone()];

        let csv_text = "Name,Ignored\nAna,x\n,y\n";
        let mappings = HashMap::from([("Name".to_string(), name.id)]);
        let (rows, outcome) = import_rows(csv_text, &mappings, &fields).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(outcome, ImportOutcome { imported: 1, skipped: 1, errors: 0 });
    }

    #[test]
    fn bad_cells_count_as_errors() {
        let count = make_field("Count", FieldType::Number);
        let fields = vec![count.clone()];

        let csv_text = "Count\nnot-a-number\n7\n";
        let mappings = HashMap::from([("Count".to_string(), count.id)]);
        let (rows, outcome) = import_rows(csv_text, &mappings, &fields).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(outcome, ImportOutcome { imported: 1, skipped: 0, errors: 1 });
    }

    #[test]
    fn preview_bounds_rows() {
        let mut data = String::from("A,B\n");
        for i in 0..25 {
            data.push_str(&format!("{i},x\n"));
        }

        let preview = preview(&data).unwrap();
        assert_eq!(preview.columns, vec!["A", "B"]);
        assert_eq!(preview.rows.len(), 10);
        assert_eq!(preview.total_rows, 25);
    }
}
