//! Table/grid transforms.
//!
//! Form-based grid editors hand the host loosely shaped tabular JSON; this
//! module normalizes it into the canonical nested-array JSON the marshaler
//! expects, dispatched by the array's element kind. Pure functions, run once
//! per message; every branch is idempotent on its own canonical output.
//!
//! Malformed JSON surfaces as [`TableError::Parse`] carrying the original
//! parse error — a corrupted grid must reach the caller, never collapse
//! into an empty array.

use serde_json::{Number, Value};
use tracing::warn;

use crate::error::TableError;
use crate::keys;
use crate::marshal::Properties;

/// Parse `raw` and normalize it for the given element kind.
pub fn transform(
    element_kind: &str,
    raw: &str,
    props: &dyn Properties,
    index: i32,
) -> Result<Value, TableError> {
    let rows: Value = serde_json::from_str(raw).map_err(|source| TableError::Parse {
        element_kind: element_kind.to_string(),
        index,
        source,
    })?;
    transform_value(element_kind, rows, props, index)
}

/// Normalize already-parsed rows for the given element kind.
pub fn transform_value(
    element_kind: &str,
    rows: Value,
    props: &dyn Properties,
    index: i32,
) -> Result<Value, TableError> {
    Ok(match element_kind {
        // Row objects are already the canonical shape.
        "record" => rows,
        "float" => coerce_float_leaves(rows),
        "array" => nested_grid(rows, props, index),
        "union" => union_rows(rows),
        _ => simple_rows(rows),
    })
}

// ————————————————————————————————————————————————————————————————————————————
// FLOAT ARRAYS
// ————————————————————————————————————————————————————————————————————————————

/// Coerce every leaf to floating point, whatever its source representation:
/// integer-looking text becomes a float. Unparsable leaves default to 0.0
/// with a warning rather than failing the whole array.
fn coerce_float_leaves(v: Value) -> Value {
    match v {
        Value::Array(xs) => Value::Array(xs.into_iter().map(coerce_float_leaves).collect()),
        Value::Object(m) => Value::Object(
            m.into_iter()
                .map(|(k, v)| (k, coerce_float_leaves(v)))
                .collect(),
        ),
        Value::Number(n) => float_value(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => match s.parse::<f64>() {
            Ok(f) => float_value(f),
            Err(_) => {
                warn!(leaf = %s, "unparsable numeric leaf in float table; defaulting to 0.0");
                float_value(0.0)
            }
        },
        Value::Bool(b) => {
            warn!(leaf = b, "boolean leaf in float table; defaulting to 0.0");
            float_value(0.0)
        }
        Value::Null => Value::Null,
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or_else(|| {
        warn!(leaf = f, "non-finite numeric leaf; defaulting to 0.0");
        Value::from(0.0)
    })
}

// ————————————————————————————————————————————————————————————————————————————
// NESTED (2-D) GRIDS
// ————————————————————————————————————————————————————————————————————————————

/// Two editor shapes reach us for array-of-array parameters:
/// (a) each row is an object carrying an `innerArray` field — flatten it;
/// (b) each row is itself an array of ≥2 cells — coerce cells positionally
///     using the column-type hint from the surrounding property bag.
/// Anything else passes through unchanged.
fn nested_grid(rows: Value, props: &dyn Properties, index: i32) -> Value {
    let rows_vec = match rows {
        Value::Array(v) => v,
        other => return other,
    };

    let all_inner = !rows_vec.is_empty()
        && rows_vec
            .iter()
            .all(|r| r.as_object().is_some_and(|o| o.contains_key("innerArray")));
    if all_inner {
        return Value::Array(
            rows_vec
                .into_iter()
                .map(|row| match row {
                    Value::Object(mut o) => o.remove("innerArray").unwrap_or(Value::Null),
                    other => other,
                })
                .collect(),
        );
    }

    let all_wide = !rows_vec.is_empty()
        && rows_vec
            .iter()
            .all(|r| r.as_array().is_some_and(|cells| cells.len() >= 2));
    if all_wide {
        let hint = props
            .get(&keys::inner_element_type(index))
            .unwrap_or_default();
        return Value::Array(
            rows_vec
                .into_iter()
                .map(|row| match row {
                    Value::Array(cells) => Value::Array(
                        cells.into_iter().map(|c| coerce_cell(c, &hint)).collect(),
                    ),
                    other => other,
                })
                .collect(),
        );
    }

    Value::Array(rows_vec)
}

/// String cells are re-typed by the column hint; already-typed cells pass
/// through (this keeps the reconstruction idempotent).
fn coerce_cell(cell: Value, hint: &str) -> Value {
    let s = match cell {
        Value::String(s) => s,
        other => return other,
    };
    match hint {
        "int" => s.parse::<i64>().map(Value::from).unwrap_or(Value::String(s)),
        "float" | "decimal" => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(s)),
        "boolean" => match () {
            _ if s.eq_ignore_ascii_case("true") => Value::Bool(true),
            _ if s.eq_ignore_ascii_case("false") => Value::Bool(false),
            _ => Value::String(s),
        },
        _ => Value::String(s),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// UNION ARRAYS
// ————————————————————————————————————————————————————————————————————————————

/// Union-array editors emit rows shaped `{type, value}`. Each value is
/// coerced by its row's own type tag; rows with neither key are skipped.
/// Arrays not in `{type, value}` shape (including this function's own
/// output) pass through unchanged.
fn union_rows(rows: Value) -> Value {
    let rows_vec = match rows {
        Value::Array(v) => v,
        other => return other,
    };

    let typed = rows_vec.iter().any(|r| {
        r.as_object()
            .is_some_and(|o| o.contains_key("type") && o.contains_key("value"))
    });
    if !typed {
        return Value::Array(rows_vec);
    }

    let mut out = Vec::with_capacity(rows_vec.len());
    for row in rows_vec {
        let Value::Object(o) = row else { continue };
        let ty = o.get("type").and_then(Value::as_str);
        let (Some(ty), Some(value)) = (ty, o.get("value")) else { continue };
        out.push(union_cell(ty, value));
    }
    Value::Array(out)
}

fn union_cell(ty: &str, value: &Value) -> Value {
    // Already-typed values pass through; string values coerce by the tag.
    // Values that stay strings are emitted as JSON strings, so special
    // characters are escaped by serialization.
    let Value::String(text) = value else { return value.clone() };
    match ty {
        "int" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.clone())),
        "float" | "decimal" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.clone())),
        "boolean" => match () {
            _ if text.eq_ignore_ascii_case("true") => Value::Bool(true),
            _ if text.eq_ignore_ascii_case("false") => Value::Bool(false),
            _ => Value::String(text.clone()),
        },
        _ => Value::String(text.clone()),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SIMPLE ARRAYS
// ————————————————————————————————————————————————————————————————————————————

/// Generic table-to-simple-array rule: single-column grids arrive as flat
/// row objects; collapse each to its first (and in practice only) column
/// value. Non-object rows pass through unchanged.
fn simple_rows(rows: Value) -> Value {
    let rows_vec = match rows {
        Value::Array(v) => v,
        other => return other,
    };
    if rows_vec.is_empty() || !rows_vec.iter().all(|r| matches!(r, Value::Object(_))) {
        return Value::Array(rows_vec);
    }
    Value::Array(
        rows_vec
            .into_iter()
            .map(|row| match row {
                Value::Object(o) => o.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null),
                other => other,
            })
            .collect(),
    )
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
