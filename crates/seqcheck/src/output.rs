#![forbid(unsafe_code)]

use seqcheck_harness::Result;
use serde::Serialize;

/// Print `value` as pretty JSON, or the text rendering otherwise.
pub fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
