//! Human vs `--json` rendering.

use serde::Serialize;
use serde_json::json;

/// Prints `value` as a single newline-terminated JSON document.
pub fn emit_json(value: impl Serialize) {
    println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string()));
}

/// Prints a failure: `{error, detail?}` in JSON mode, a single human line
/// otherwise. Never includes filesystem paths or configured tokens — the
/// caller is responsible for passing an already-redacted `detail`.
pub fn emit_error(json_mode: bool, error: &str, detail: Option<&str>) {
    if json_mode {
        let body = match detail {
            Some(d) => json!({ "error": error, "detail": d }),
            None => json!({ "error": error }),
        };
        eprintln!("{body}");
    } else {
        match detail {
            Some(d) => eprintln!("error: {error}: {d}"),
            None => eprintln!("error: {error}"),
        }
    }
}
