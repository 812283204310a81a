use serde_json::Value;

use super::scalar_text;

/// Headline fields, most specific first.
const PRIORITY_KEYS: [&str; 8] = [
    "irr_pct",
    "irr",
    "lp_multiple",
    "exit_price",
    "dscr",
    "monthly_payment",
    "total_cash_flow",
    "annual_debt_service",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", render_minimal(value));
}

/// One line per result. Scenario batches and comparisons print one line per
/// scenario, prefixed with its id.
pub fn render_minimal(value: &Value) -> String {
    if let Some(Value::Array(results)) = value.get("results") {
        return results
            .iter()
            .map(|item| {
                let result = item.get("result").unwrap_or(item);
                match result.get("scenario_id") {
                    Some(id) => format!("{}: {}", scalar_text(id), headline(result)),
                    None => headline(result),
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    let result = value.get("result").unwrap_or(value);

    if let Some(Value::Array(analyses)) = result.get("analyses") {
        return analyses
            .iter()
            .map(|a| {
                let id = a.pointer("/scenario/id").map(scalar_text).unwrap_or_default();
                let irr = a.pointer("/returns/irr_pct").unwrap_or(&Value::Null);
                format!("{id}: {}", or_null(irr))
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    headline(result)
}

fn headline(result: &Value) -> String {
    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return scalar_text(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{key}: {}", or_null(val));
        }
    }

    or_null(result)
}

fn or_null(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => scalar_text(other),
    }
}
