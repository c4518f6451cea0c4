//! Generation-artifact rendering.
//!
//! Serializes a fully built [`FunctionModel`] into the two coupled
//! artifacts: the flat template property map (the wire contract the
//! marshaler reads back per message) and the declarative UI schema consumed
//! by the visual integration-design tool. Trees are always fully built by
//! the time they reach this module; nothing here mutates them.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::builder::FunctionModel;
use crate::keys;
use crate::node::{ParamNode, Shape};

// ————————————————————————————————————————————————————————————————————————————
// TEMPLATE PROPERTIES
// ————————————————————————————————————————————————————————————————————————————

/// Render the flat property map for one function. Key formats come from
/// [`keys`] and nowhere else; the marshaler re-derives the identical keys at
/// run time.
pub fn template_properties(function: &FunctionModel) -> IndexMap<String, String> {
    let mut props = IndexMap::new();

    props.insert(keys::PATH_PARAM_SIZE.to_string(), function.path_params.len().to_string());
    for (i, p) in function.path_params.iter().enumerate() {
        let i = i as i32;
        props.insert(keys::path_param(i), p.meta.name.clone());
        props.insert(keys::path_param_type(i), p.meta.kind().as_str().to_string());
    }

    for (i, p) in function.params.iter().enumerate() {
        let i = i as i32;
        props.insert(keys::param_name(i), p.meta.name.clone());
        props.insert(keys::param_type(i), p.meta.kind().as_str().to_string());

        match &p.shape {
            Shape::Array { element, is_2d, inner_element, .. } => {
                props.insert(keys::array_element_type(i), element.as_str().to_string());
                if *is_2d {
                    if let Some(inner) = inner_element {
                        props.insert(keys::inner_element_type(i), inner.as_str().to_string());
                    }
                }
            }
            Shape::Union { members } => {
                for m in members {
                    let label = m
                        .meta
                        .display_type
                        .clone()
                        .unwrap_or_else(|| m.meta.kind().as_str().to_string());
                    props.insert(keys::union_member(i, &label), m.meta.name.clone());
                }
            }
            Shape::Scalar | Shape::Record { .. } | Shape::Map { .. } | Shape::Typedesc => {}
        }
    }

    props
}

// ————————————————————————————————————————————————————————————————————————————
// UI SCHEMA
// ————————————————————————————————————————————————————————————————————————————

/// Declarative invocation schema for the visual tool.
pub fn ui_schema(function: &FunctionModel) -> Value {
    let path_elements: Vec<Value> = function.path_params.iter().map(node_schema).collect();
    let elements: Vec<Value> = function.params.iter().map(node_schema).collect();
    json!({
        "name": function.name,
        "documentation": function.doc,
        "returnType": function.return_kind.as_str(),
        "dispatch": function.dispatch_name(),
        "pathParams": path_elements,
        "elements": elements,
    })
}

fn node_schema(node: &ParamNode) -> Value {
    let mut o = json!({
        "name": node.meta.name,
        "type": node.meta.kind().as_str(),
        "required": node.meta.required(),
    });
    if !node.meta.default_value.is_empty() {
        o["defaultValue"] = Value::from(node.meta.default_value.clone());
    }
    if let Some(cond) = &node.meta.visible_when {
        o["enableCondition"] = Value::from(cond.clone());
    }
    if let Some(display) = &node.meta.display_type {
        o["displayType"] = Value::from(display.clone());
    }

    match &node.shape {
        Shape::Scalar => {
            o["inputType"] = Value::from("stringOrExpression");
        }
        Shape::Typedesc => {
            o["inputType"] = Value::from("typeName");
        }
        Shape::Record { record_name, fields, .. } => {
            o["inputType"] = Value::from("form");
            o["recordName"] = Value::from(record_name.clone());
            o["fields"] = Value::Array(fields.iter().map(node_schema).collect());
        }
        Shape::Union { members } => {
            o["inputType"] = Value::from("comboOrExpression");
            o["comboValues"] = Value::Array(
                members
                    .iter()
                    .map(|m| {
                        Value::from(
                            m.meta
                                .display_type
                                .clone()
                                .unwrap_or_else(|| m.meta.kind().as_str().to_string()),
                        )
                    })
                    .collect(),
            );
            o["members"] = Value::Array(members.iter().map(node_schema).collect());
        }
        Shape::Array { element, is_table, is_2d, is_union_array, columns, member_types, inner_element } => {
            o["inputType"] = Value::from(if *is_table { "table" } else { "expression" });
            o["elementType"] = Value::from(element.as_str());
            if *is_2d {
                o["nested"] = Value::from(true);
                if let Some(inner) = inner_element {
                    o["innerElementType"] = Value::from(inner.as_str());
                }
            }
            if *is_union_array {
                o["memberTypes"] =
                    Value::Array(member_types.iter().cloned().map(Value::from).collect());
            }
            if !columns.is_empty() {
                o["columns"] = Value::Array(columns.iter().map(node_schema).collect());
            }
        }
        Shape::Map { value, columns, is_table } => {
            o["inputType"] = Value::from(if *is_table { "table" } else { "expression" });
            o["valueType"] = Value::from(value.as_str());
            if !columns.is_empty() {
                o["columns"] = Value::Array(columns.iter().map(node_schema).collect());
            }
        }
    }

    o
}

// ————————————————————————————————————————————————————————————————————————————
// PACKAGING SEAM
// ————————————————————————————————————————————————————————————————————————————

/// Sink accepting completed artifacts; the packaging collaborator (zipping,
/// resource copying, remote retrieval) lives behind this.
pub trait Sink {
    fn accept(
        &mut self,
        function: &FunctionModel,
        properties: &IndexMap<String, String>,
        schema: &Value,
    ) -> anyhow::Result<()>;
}

/// Connector icon roles, decided purely by byte size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconAssignment<'a> {
    pub small: &'a str,
    pub large: &'a str,
}

/// Classify a two-icon set: the smaller file is "small", the larger is
/// "large", regardless of the order given. Ties keep input order.
pub fn classify_icons<'a>(a: (&'a str, u64), b: (&'a str, u64)) -> IconAssignment<'a> {
    if b.1 < a.1 {
        IconAssignment { small: b.0, large: a.0 }
    } else {
        IconAssignment { small: a.0, large: b.0 }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_function;
    use crate::descriptor::FunctionDesc;
    use serde_json::json;

    fn function(v: serde_json::Value) -> FunctionModel {
        build_function(&serde_json::from_value::<FunctionDesc>(v).unwrap())
    }

    #[test]
    fn property_layout_covers_every_node_kind() {
        let f = function(json!({
            "name": "submit",
            "path": [ "orders", { "name": "orderId", "kind": "int" } ],
            "params": [
                { "name": "count", "type": { "kind": "int" } },
                { "name": "amount", "type": { "kind": "union", "members": [
                    { "kind": "int" }, { "kind": "decimal" }
                ]}},
                { "name": "tags", "type": { "kind": "array", "element": { "kind": "string" } } },
                { "name": "grid", "type": { "kind": "array", "element": {
                    "kind": "array", "element": { "kind": "float" }
                }}}
            ]
        }));
        let props = template_properties(&f);

        assert_eq!(props.get("pathParamSize").map(String::as_str), Some("1"));
        assert_eq!(props.get("pathParam0").map(String::as_str), Some("orderId"));
        assert_eq!(props.get("pathParamType0").map(String::as_str), Some("int"));

        assert_eq!(props.get("param0").map(String::as_str), Some("count"));
        assert_eq!(props.get("paramType0").map(String::as_str), Some("int"));

        assert_eq!(props.get("paramType1").map(String::as_str), Some("union"));
        assert_eq!(props.get("param1UnionInt").map(String::as_str), Some("amountInt"));
        assert_eq!(props.get("param1UnionDecimal").map(String::as_str), Some("amountDecimal"));

        assert_eq!(props.get("arrayElementType2").map(String::as_str), Some("string"));
        assert_eq!(props.get("arrayElementType3").map(String::as_str), Some("array"));
        assert_eq!(props.get("innerArrayElementType3").map(String::as_str), Some("float"));
    }

    #[test]
    fn schema_reports_tables_and_union_combos() {
        let f = function(json!({
            "name": "store",
            "params": [
                { "name": "rows", "type": { "kind": "array", "element": {
                    "kind": "record", "name": "Row",
                    "fields": [ { "name": "a", "type": { "kind": "int" } } ]
                }}},
                { "name": "value", "type": { "kind": "union", "members": [
                    { "kind": "string" }, { "kind": "xml" }
                ]}}
            ]
        }));
        let schema = ui_schema(&f);
        let rows = &schema["elements"][0];
        assert_eq!(rows["inputType"], "table");
        assert_eq!(rows["columns"][0]["name"], "rows.a");
        let value = &schema["elements"][1];
        assert_eq!(value["inputType"], "comboOrExpression");
        assert_eq!(value["comboValues"], json!(["string", "xml"]));
    }

    #[test]
    fn record_valued_map_renders_as_table_with_columns() {
        let f = function(json!({
            "name": "tag",
            "params": [
                { "name": "index", "type": { "kind": "map", "value": {
                    "kind": "record", "name": "Entry",
                    "fields": [ { "name": "label", "type": { "kind": "string" } } ]
                }}},
                { "name": "labels", "type": { "kind": "map", "value": { "kind": "string" } } }
            ]
        }));
        let schema = ui_schema(&f);
        let index = &schema["elements"][0];
        assert_eq!(index["inputType"], "table");
        assert_eq!(index["valueType"], "record");
        assert_eq!(index["columns"][0]["name"], "index.label");
        let labels = &schema["elements"][1];
        assert_eq!(labels["inputType"], "expression");
        assert_eq!(labels["valueType"], "string");
        assert!(labels.get("columns").is_none());
    }

    #[test]
    fn icon_classification_is_order_independent() {
        let a = ("icon-a.png", 1200u64);
        let b = ("icon-b.png", 300u64);
        let ab = classify_icons(a, b);
        let ba = classify_icons(b, a);
        assert_eq!(ab.small, "icon-b.png");
        assert_eq!(ab.large, "icon-a.png");
        assert_eq!(ab, ba);

        // ties keep input order
        let tie = classify_icons(("x.png", 10), ("y.png", 10));
        assert_eq!(tie.small, "x.png");
        assert_eq!(tie.large, "y.png");
    }
}
