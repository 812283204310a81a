use colored::Colorize;
use serde_json::Value;

/// Pretty-printed JSON text.
pub fn render_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Pretty-print JSON to stdout.
pub fn print_json(value: &Value) {
    match render_json(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("{}: JSON serialization failed: {e}", "error".red().bold()),
    }
}
