//! Computed-field evaluation: formulas, rollups, and lookups.
//!
//! Computed values are re-derived whenever a record is written. Evaluation
//! walks the table's computed fields in topological dependency order with a
//! deterministic field-id tie-break; reference cycles are rejected when a
//! field is created or its options change, so evaluation never observes
//! one.

mod formula;

use std::collections::HashMap;

pub use formula::{Expr, FormulaError};
use gridbase_postgres::PgConnection;
use gridbase_postgres::model::{Field, Record};
use gridbase_postgres::query::RecordRepository;
use gridbase_postgres::types::{
    FieldOptions, FieldType, LookupOptions, RollupAggregate, RollupOptions,
};
use petgraph::graphmap::DiGraphMap;
use uuid::Uuid;

/// Tracing target for computed-field evaluation.
const TRACING_TARGET: &str = "gridbase_server::service::compute";

/// Error produced by dependency analysis or evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// The field graph contains a reference cycle.
    #[error("computed fields form a reference cycle")]
    Cycle,
    /// A computed field's options failed to decode.
    #[error("field {0} has malformed options: {1}")]
    BadOptions(Uuid, String),
    /// Database access failed while resolving linked records.
    #[error(transparent)]
    Database(#[from] gridbase_postgres::PgError),
}

/// Returns the same-table field ids a field's computed value depends on.
fn dependencies(field: &Field) -> Result<Vec<Uuid>, ComputeError> {
    let options = FieldOptions::parse(field.field_type, &field.options)
        .map_err(|e| ComputeError::BadOptions(field.id, e.to_string()))?;

    match options {
        FieldOptions::Formula(formula) => {
            let expr = Expr::parse(&formula.expression)
                .map_err(|e| ComputeError::BadOptions(field.id, e.to_string()))?;
            Ok(expr.dependencies())
        }
        FieldOptions::Rollup(RollupOptions { linked_field_id, .. })
        | FieldOptions::Lookup(LookupOptions { linked_field_id, .. }) => {
            Ok(vec![linked_field_id])
        }
        _ => Ok(Vec::new()),
    }
}

/// Orders a table's computed fields by dependency, rejecting cycles.
///
/// Called with the table's full field set (including a not-yet-persisted
/// candidate when validating a field mutation). The returned order contains
/// only computed fields.
pub fn evaluation_order(fields: &[Field]) -> Result<Vec<Uuid>, ComputeError> {
    let mut graph: DiGraphMap<Uuid, ()> = DiGraphMap::new();

    for field in fields {
        graph.add_node(field.id);
    }

    for field in fields {
        if !field.field_type.is_computed() {
            continue;
        }
        for dependency in dependencies(field)? {
            // References to unknown fields evaluate to null; only edges
            // between known fields participate in ordering.
            if graph.contains_node(dependency) {
                graph.add_edge(dependency, field.id, ());
            }
        }
    }

    // toposort is not stable between runs; ranking by dependency depth
    // with a field-id tie-break keeps the order deterministic.
    let rank = topo_rank(&graph, fields)?;
    let mut computed: Vec<Uuid> = fields
        .iter()
        .filter(|f| f.field_type.is_computed())
        .map(|f| f.id)
        .collect();
    computed.sort_by_key(|id| (rank.get(id).copied().unwrap_or(0), *id));

    Ok(computed)
}

/// Assigns each field its longest-path depth in the dependency graph.
fn topo_rank(
    graph: &DiGraphMap<Uuid, ()>,
    fields: &[Field],
) -> Result<HashMap<Uuid, usize>, ComputeError> {
    let sorted = petgraph::algo::toposort(graph, None).map_err(|_| ComputeError::Cycle)?;

    let mut rank: HashMap<Uuid, usize> = HashMap::new();
    for node in sorted {
        let depth = graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .filter_map(|dep| rank.get(&dep).map(|r| r + 1))
            .max()
            .unwrap_or(0);
        rank.insert(node, depth);
    }

    // Non-computed fields keep rank zero.
    for field in fields {
        rank.entry(field.id).or_insert(0);
    }

    Ok(rank)
}

/// Validates that a table's field set stays acyclic.
pub fn reject_cycles(fields: &[Field]) -> Result<(), ComputeError> {
    evaluation_order(fields).map(|_| ())
}

/// Re-derives every computed cell of a record's values in place.
///
/// `values` maps field-id strings to JSON cell values, exactly as stored
/// on the record row. Evaluation failures null the affected cell and log
/// rather than failing the surrounding mutation.
pub async fn recompute_record(
    conn: &mut PgConnection,
    fields: &[Field],
    values: &mut serde_json::Map<String, serde_json::Value>,
) -> Result<(), ComputeError> {
    let order = evaluation_order(fields)?;
    if order.is_empty() {
        return Ok(());
    }

    let by_id: HashMap<Uuid, &Field> = fields.iter().map(|f| (f.id, f)).collect();

    for field_id in order {
        let Some(field) = by_id.get(&field_id) else {
            continue;
        };

        let computed = evaluate_field(conn, field, &by_id, values).await;
        let value = match computed {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    field_id = %field_id,
                    error = %err,
                    "computed field evaluation failed, storing null"
                );
                serde_json::Value::Null
            }
        };

        values.insert(field_id.to_string(), value);
    }

    Ok(())
}

async fn evaluate_field(
    conn: &mut PgConnection,
    field: &Field,
    fields_by_id: &HashMap<Uuid, &Field>,
    values: &serde_json::Map<String, serde_json::Value>,
) -> Result<serde_json::Value, ComputeError> {
    let options = FieldOptions::parse(field.field_type, &field.options)
        .map_err(|e| ComputeError::BadOptions(field.id, e.to_string()))?;

    match options {
        FieldOptions::Formula(formula) => {
            let expr = Expr::parse(&formula.expression)
                .map_err(|e| ComputeError::BadOptions(field.id, e.to_string()))?;

            let typed: HashMap<Uuid, serde_json::Value> = values
                .iter()
                .filter_map(|(key, value)| {
                    Uuid::parse_str(key).ok().map(|id| (id, value.clone()))
                })
                .collect();

            Ok(expr
                .evaluate(&typed)
                .unwrap_or(serde_json::Value::Null))
        }
        FieldOptions::Rollup(rollup) => {
            let linked =
                linked_records(conn, &rollup.linked_field_id, fields_by_id, values).await?;
            Ok(aggregate_rollup(&rollup, &linked))
        }
        FieldOptions::Lookup(lookup) => {
            let linked =
                linked_records(conn, &lookup.linked_field_id, fields_by_id, values).await?;
            let projected: Vec<serde_json::Value> = linked
                .iter()
                .filter_map(|record| {
                    record
                        .values
                        .get(lookup.target_field_id.to_string())
                        .cloned()
                })
                .filter(|value| !value.is_null())
                .collect();
            Ok(serde_json::Value::Array(projected))
        }
        _ => Ok(serde_json::Value::Null),
    }
}

/// Loads the records referenced by a linked-record cell.
async fn linked_records(
    conn: &mut PgConnection,
    linked_field_id: &Uuid,
    fields_by_id: &HashMap<Uuid, &Field>,
    values: &serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<Record>, ComputeError> {
    // The traversal field must be a linked-record field on this table.
    let Some(link_field) = fields_by_id.get(linked_field_id) else {
        return Ok(Vec::new());
    };
    if link_field.field_type != FieldType::LinkedRecord {
        return Ok(Vec::new());
    }

    let Some(cell) = values.get(linked_field_id.to_string().as_str()) else {
        return Ok(Vec::new());
    };

    let ids: Vec<Uuid> = cell
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .filter_map(|text| Uuid::parse_str(text).ok())
                .collect()
        })
        .unwrap_or_default();

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(conn.list_records_by_ids(&ids).await?)
}

fn aggregate_rollup(rollup: &RollupOptions, linked: &[Record]) -> serde_json::Value {
    let numbers: Vec<f64> = linked
        .iter()
        .filter_map(|record| record.values.get(rollup.target_field_id.to_string()))
        .filter_map(|value| value.as_f64())
        .collect();

    match rollup.aggregate {
        RollupAggregate::Count => serde_json::json!(linked.len()),
        RollupAggregate::Sum => serde_json::json!(numbers.iter().sum::<f64>()),
        RollupAggregate::Min => numbers
            .iter()
            .copied()
            .fold(None::<f64>, |acc, n| Some(acc.map_or(n, |a| a.min(n))))
            .map_or(serde_json::Value::Null, |n| serde_json::json!(n)),
        RollupAggregate::Max => numbers
            .iter()
            .copied()
            .fold(None::<f64>, |acc, n| Some(acc.map_or(n, |a| a.max(n))))
            .map_or(serde_json::Value::Null, |n| serde_json::json!(n)),
    }
}

#[cfg(test)]
mod tests {
    use gridbase_postgres::model::Field;

    use super::*;

    fn field(id: Uuid, field_type: FieldType, options: serde_json::Value) -> Field {
        let now = jiff_timestamp();
        Field {
            id,
            table_id: Uuid::nil(),
            display_name: "f".to_string(),
            field_type,
            options,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn jiff_timestamp() -> jiff_diesel::Timestamp {
        jiff_diesel::Timestamp::from(jiff::Timestamp::now())
    }

    #[test]
    fn orders_formula_chains() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let fields = vec![
            field(a, FieldType::Number, serde_json::json!({})),
            field(
                b,
                FieldType::Formula,
                serde_json::json!({"expression": format!("{{{a}}} * 2")}),
            ),
            field(
                c,
                FieldType::Formula,
                serde_json::json!({"expression": format!("{{{b}}} + 1")}),
            ),
        ];

        let order = evaluation_order(&fields).unwrap();
        let b_pos = order.iter().position(|id| *id == b).unwrap();
        let c_pos = order.iter().position(|id| *id == c).unwrap();
        assert!(b_pos < c_pos);
    }

    #[test]
    fn rejects_reference_cycles() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let fields = vec![
            field(
                a,
                FieldType::Formula,
                serde_json::json!({"expression": format!("{{{b}}}")}),
            ),
            field(
                b,
                FieldType::Formula,
                serde_json::json!({"expression": format!("{{{a}}}")}),
            ),
        ];

        assert!(matches!(reject_cycles(&fields), Err(ComputeError::Cycle)));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let a = Uuid::new_v4();
        let fields = vec![field(
            a,
            FieldType::Formula,
            serde_json::json!({"expression": format!("{{{a}}} + 1")}),
        )];

        assert!(matches!(reject_cycles(&fields), Err(ComputeError::Cycle)));
    }

    #[test]
    fn rollup_aggregates() {
        let target = Uuid::new_v4();
        let rollup = RollupOptions {
            linked_field_id: Uuid::new_v4(),
            target_field_id: target,
            aggregate: RollupAggregate::Sum,
        };

        let records: Vec<Record> = [3.0, 4.5]
            .iter()
            .map(|n| Record {
                id: Uuid::new_v4(),
                table_id: Uuid::nil(),
                values: serde_json::json!({ target.to_string(): n }),
                row_color: None,
                created_at: jiff_timestamp(),
                updated_at: jiff_timestamp(),
            })
            .collect();

        assert_eq!(aggregate_rollup(&rollup, &records), serde_json::json!(7.5));

        let count = RollupOptions {
            aggregate: RollupAggregate::Count,
            ..rollup
        };
        assert_eq!(aggregate_rollup(&count, &records), serde_json::json!(2));
    }
}
