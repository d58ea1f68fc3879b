//! Tolerant parsing of completion output.
//!
//! The collaborator is asked for JSON-only output but routinely wraps it in
//! prose or markdown code fences anyway. Parsing therefore strips known
//! wrapper markers first and returns a tagged result instead of an error:
//! a failed parse is a batch-local outcome for the orchestrator to record,
//! never something to throw past it.

use serde::de::DeserializeOwned;

/// Outcome of parsing a completion payload.
#[derive(Debug)]
pub enum Parsed<T> {
    Ok(T),
    Failed { error: String },
}

impl<T> Parsed<T> {
    /// The parsed value, discarding failure detail.
    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Remove markdown code-fence markers the model wraps JSON in.
#[must_use]
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a JSON payload out of completion text.
///
/// Tries the fence-stripped text as-is, then falls back to the widest
/// bracketed slice for payloads wrapped in prose.
#[must_use]
pub fn json_payload<T: DeserializeOwned>(raw: &str) -> Parsed<T> {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str(&cleaned) {
        Ok(value) => Parsed::Ok(value),
        Err(first_err) => {
            for (open, close) in [('[', ']'), ('{', '}')] {
                if let (Some(start), Some(end)) = (cleaned.find(open), cleaned.rfind(close)) {
                    if start < end {
                        if let Ok(value) = serde_json::from_str(&cleaned[start..=end]) {
                            return Parsed::Ok(value);
                        }
                    }
                }
            }
            Parsed::Failed {
                error: first_err.to_string(),
            }
        }
    }
}
