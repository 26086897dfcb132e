//! Cleanup of raw model output before execution.

/// Strips markdown code fences from a model response.
///
/// Trims surrounding whitespace, removes every "```sql" marker and then every
/// remaining "```" marker, and trims again. Nothing else is touched: the
/// result is not checked for being valid SQL.
pub fn sanitize(raw: &str) -> String {
    raw.trim()
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}
