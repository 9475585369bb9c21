use colored::Colorize;
use serde_json::Value;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Render a stored value for display, `-` for null
pub fn format_value(value: &Value, unit: Option<&str>) -> String {
    let text = match value {
        Value::Null => return "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    match unit {
        Some("%") => format!("{text}%"),
        Some(unit) => format!("{text} {unit}"),
        None => text,
    }
}

/// Indentation for a node at `depth` (1-based)
pub fn indent(depth: usize) -> String {
    "  ".repeat(depth.saturating_sub(1))
}

// ============================================================================
// Tests
// ============================================================================
