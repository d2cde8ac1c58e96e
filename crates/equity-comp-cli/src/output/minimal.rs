use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Projection results are arrays of yearly rows; the final row carries
/// the headline number, so that is where the lookup happens. Priority
/// keys are tried in order, then the first field as a fallback.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // The last row of a yearly table is the projection's endpoint
    let target = match result {
        Value::Array(rows) => match rows.last() {
            Some(last) => last,
            None => {
                println!("(empty)");
                return;
            }
        },
        other => other,
    };

    let priority_keys = [
        "net_proceeds_after_cgt",
        "total_compensation",
        "final_value",
        "value",
        "total_value_gbp",
        "shares",
    ];

    if let Value::Object(map) = target {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(target));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
