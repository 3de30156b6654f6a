use serde_json::Value;

/// Splits `event {json}` into an event tag and its payload. A bare event
/// sends an empty object.
pub fn parse_message(line: &str) -> Result<(String, Value), String> {
    let line = line.trim();

    let (event, raw_payload) = match line.split_once(char::is_whitespace) {
        Some((event, rest)) => (event, rest.trim()),
        None => (line, ""),
    };

    if event.is_empty() {
        return Err("Usage: <event> <json>".to_string());
    }

    if raw_payload.is_empty() {
        return Ok((event.to_string(), Value::Object(Default::default())));
    }

    match serde_json::from_str(raw_payload) {
        Ok(payload) => Ok((event.to_string(), payload)),
        Err(e) => Err(format!("Invalid JSON payload: {}", e)),
    }
}
