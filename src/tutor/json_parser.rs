//! Best-effort JSON extraction from model output
//!
//! Models asked for raw JSON still wrap it in code fences or prose often
//! enough that replies are cleaned before parsing: fence markers are
//! stripped, then the first bracketed or braced span is cut out by simple
//! index matching. Single-pass heuristic; the opening bracket is paired with
//! the last close of its kind, with no nesting awareness beyond that.

/// Extract the first JSON array or object span from free-form text
pub fn extract_json_span(text: &str) -> Result<String, String> {
    let cleaned = text.trim().replace("```json", "").replace("```", "");

    let open = match (cleaned.find('['), cleaned.find('{')) {
        (Some(square), Some(curly)) => square.min(curly),
        (Some(square), None) => square,
        (None, Some(curly)) => curly,
        (None, None) => return Err("No JSON structure found in AI response".to_string()),
    };

    let close = if cleaned.as_bytes()[open] == b'[' {
        cleaned.rfind(']')
    } else {
        cleaned.rfind('}')
    };

    match close {
        Some(close) if close > open => Ok(cleaned[open..=close].to_string()),
        _ => Err("No matching closing bracket found in AI response".to_string()),
    }
}
