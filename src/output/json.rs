use crate::error::{Error, Result};
use crate::provider::Lookup;

/// Render lookups as pretty-printed JSON.
pub fn lookups_json(lookups: &[Lookup]) -> Result<String> {
    serde_json::to_string_pretty(lookups)
        .map_err(|e| Error::Parse(format!("JSON serialize: {}", e)))
}

/// Print lookups as formatted JSON to stdout.
pub fn print_lookups_json(lookups: &[Lookup]) -> Result<()> {
    println!("{}", lookups_json(lookups)?);
    Ok(())
}
