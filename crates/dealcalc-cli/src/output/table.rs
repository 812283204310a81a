use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{as_record_array, scalar_text};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    println!("{}", render_table(value));
}

pub fn render_table(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(results)) = map.get("results") {
                results
                    .iter()
                    .map(render_table)
                    .collect::<Vec<_>>()
                    .join("\n\n")
            } else if let Some(result) = map.get("result") {
                render_envelope(result, map)
            } else {
                render_object(map)
            }
        }
        Value::Array(arr) => render_array(arr),
        _ => scalar_text(value),
    }
}

fn render_envelope(result: &Value, envelope: &Map<String, Value>) -> String {
    let mut out = match result {
        Value::Object(res) if is_comparison(res) => render_comparison(res),
        Value::Object(res) => render_object(res),
        other => render_table(other),
    };

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\n\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                out.push_str(&format!("\n  - {w}"));
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\n\nMethodology: {meth}"));
    }

    out
}

/// Field/Value table for scalars, then one sub-table per record array.
fn render_object(map: &Map<String, Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections: Vec<String> = Vec::new();

    for (key, val) in map {
        if let Some(records) = as_record_array(val) {
            sections.push(format!("{key}:\n{}", render_array(records)));
        } else if let Value::Object(nested) = val {
            for (sub_key, sub_val) in nested {
                builder.push_record([format!("{key}.{sub_key}"), scalar_text(sub_val)]);
            }
        } else {
            builder.push_record([key.clone(), scalar_text(val)]);
        }
    }

    let mut out = Table::from(builder).to_string();
    for section in sections {
        out.push_str("\n\n");
        out.push_str(&section);
    }
    out
}

fn render_array(arr: &[Value]) -> String {
    if arr.is_empty() {
        return "(empty)".to_string();
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        Table::from(builder).to_string()
    } else {
        arr.iter().map(scalar_text).collect::<Vec<_>>().join("\n")
    }
}

fn is_comparison(map: &Map<String, Value>) -> bool {
    map.contains_key("rows") && map.contains_key("scenario_ids")
}

/// Section | Metric | Scenario 1 | Scenario 2 ...
fn render_comparison(map: &Map<String, Value>) -> String {
    let ids: Vec<String> = map
        .get("scenario_ids")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().map(|id| format!("Scenario {}", scalar_text(id))).collect())
        .unwrap_or_default();

    let mut builder = Builder::default();
    let mut header = vec!["Section".to_string(), "Metric".to_string()];
    header.extend(ids);
    builder.push_record(header);

    let rows = map.get("rows").and_then(Value::as_array);
    let mut last_section = String::new();
    for row in rows.into_iter().flatten() {
        let section = row.get("section").map(scalar_text).unwrap_or_default();
        let label = if section == last_section {
            String::new()
        } else {
            section.clone()
        };
        last_section = section;

        let mut record = vec![label, row.get("metric").map(scalar_text).unwrap_or_default()];
        if let Some(values) = row.get("values").and_then(Value::as_array) {
            record.extend(values.iter().map(scalar_text));
        }
        builder.push_record(record);
    }

    let mut out = Table::from(builder).to_string();
    if let Some(name) = map.get("project_name").and_then(Value::as_str) {
        out = format!("{name}\n{out}");
    }
    out
}
