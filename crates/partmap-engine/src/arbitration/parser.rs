//! Parse arbitrator output into a verdict

use crate::error::ArbitrationError;
use partmap_domain::{ArbitrationRequest, ArbitrationVerdict, Confidence};
use serde_json::Value;

/// Parse an LLM response for `request`
///
/// `best_match` may be a shortlisted key or the exact name or label of a
/// shortlisted candidate; `null`, `""` and `"none"` mean no match.
pub fn parse_verdict(response: &str, request: &ArbitrationRequest) -> Result<ArbitrationVerdict, ArbitrationError> {
    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(&json_str)?;

    let obj = json
        .as_object()
        .ok_or_else(|| ArbitrationError::Malformed("Expected JSON object".to_string()))?;

    let pick = obj
        .get("best_match")
        .ok_or_else(|| ArbitrationError::Malformed("Missing 'best_match'".to_string()))?;

    let pick_key = match pick {
        Value::Null => None,
        Value::String(s) if is_no_match(s) => None,
        Value::String(s) => Some(resolve_pick(s.trim(), request)?),
        other => {
            return Err(ArbitrationError::Malformed(format!(
                "Invalid 'best_match': {}",
                other
            )))
        }
    };

    let confidence = match obj.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ArbitrationError::Malformed("Missing or invalid 'confidence'".to_string()))?;

    let reasoning = obj
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(ArbitrationVerdict {
        pick_key,
        confidence: Confidence::new(confidence),
        reasoning,
    })
}

/// Extract JSON from response, handling markdown code blocks
pub fn extract_json(response: &str) -> Result<String, ArbitrationError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(ArbitrationError::Malformed("Empty code block".to_string()));
        }
        let json_lines = &lines[1..lines.len().saturating_sub(1)];
        Ok(json_lines.join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn is_no_match(pick: &str) -> bool {
    let pick = pick.trim();
    pick.is_empty() || pick.eq_ignore_ascii_case("none") || pick.eq_ignore_ascii_case("null")
}

fn resolve_pick(pick: &str, request: &ArbitrationRequest) -> Result<String, ArbitrationError> {
    if let Some(c) = request.candidates.iter().find(|c| c.key.eq_ignore_ascii_case(pick)) {
        return Ok(c.key.clone());
    }

    // name or label without the location
    request
        .candidates
        .iter()
        .find(|c| {
            let label = c.display_text.split(" | ").next().unwrap_or_default().trim();
            label.eq_ignore_ascii_case(pick) || c.display_text.trim().eq_ignore_ascii_case(pick)
        })
        .map(|c| c.key.clone())
        .ok_or_else(|| ArbitrationError::UnknownPick(pick.to_string()))
}
