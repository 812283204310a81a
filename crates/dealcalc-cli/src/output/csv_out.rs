use serde_json::{Map, Value};
use std::io;

use super::{as_record_array, scalar_text};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV output failed: {e}");
    }
}

pub fn write_csv<W: io::Write>(writer: W, value: &Value) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(results)) = map.get("results") {
                // One block per scenario, separated by a blank record
                for (i, item) in results.iter().enumerate() {
                    if i > 0 {
                        wtr.write_record([""])?;
                    }
                    let result = item.get("result").unwrap_or(item);
                    write_result(&mut wtr, result)?;
                }
            } else {
                write_result(&mut wtr, map.get("result").unwrap_or(value))?;
            }
        }
        Value::Array(arr) => write_records(&mut wtr, arr)?,
        _ => wtr.write_record([scalar_text(value)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_result<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Value) -> csv::Result<()> {
    match result {
        Value::Object(map) if map.contains_key("rows") && map.contains_key("scenario_ids") => {
            write_comparison(wtr, map)
        }
        Value::Object(map) => write_fields(wtr, map),
        Value::Array(arr) => write_records(wtr, arr),
        other => wtr.write_record([scalar_text(other)]),
    }
}

/// `field,value` rows; record arrays follow as their own header + rows.
fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    let mut tables = Vec::new();
    for (key, val) in map {
        match as_record_array(val) {
            Some(records) => tables.push(records),
            None => wtr.write_record([key.as_str(), &scalar_text(val)])?,
        }
    }
    for records in tables {
        wtr.write_record([""])?;
        write_records(wtr, records)?;
    }
    Ok(())
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([scalar_text(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn write_comparison<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    map: &Map<String, Value>,
) -> csv::Result<()> {
    let mut header = vec!["section".to_string(), "metric".to_string()];
    if let Some(ids) = map.get("scenario_ids").and_then(Value::as_array) {
        header.extend(ids.iter().map(|id| format!("scenario_{}", scalar_text(id))));
    }
    wtr.write_record(&header)?;

    for row in map.get("rows").and_then(Value::as_array).into_iter().flatten() {
        let mut record = vec![
            row.get("section").map(scalar_text).unwrap_or_default(),
            row.get("metric").map(scalar_text).unwrap_or_default(),
        ];
        if let Some(values) = row.get("values").and_then(Value::as_array) {
            record.extend(values.iter().map(scalar_text));
        }
        wtr.write_record(&record)?;
    }
    Ok(())
}
