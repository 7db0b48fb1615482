//! Replaying adapters that serve recorded interactions.

pub mod llm;
pub mod repo_host;

pub use llm::ReplayingLlmClient;
pub use repo_host::ReplayingRepoHost;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;

/// Takes the next interaction matching `input` and decodes its output.
///
/// # Panics
///
/// Panics if no matching interaction remains or the output does not decode.
pub(crate) fn replay<T, E>(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
    input: &serde_json::Value,
) -> Result<T, E>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    let output = {
        let mut replayer = replayer.lock().expect("replayer lock poisoned");
        replayer.next_matching(port, method, input).output
    };
    extract_result(&output, &format!("{port}::{method}"))
}

/// Extracts a Result from a cassette output JSON value.
///
/// Expects `{"ok": <value>}` or `{"err": <error>}`.
///
/// # Panics
///
/// Panics if the value is in neither shape or does not decode.
pub(crate) fn extract_result<T, E>(output: &serde_json::Value, context: &str) -> Result<T, E>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    if let Some(err) = output.get("err") {
        let err = serde_json::from_value(err.clone())
            .unwrap_or_else(|e| panic!("{context}: failed to deserialize recorded error: {e}"));
        return Err(err);
    }
    let value = output
        .get("ok")
        .unwrap_or_else(|| panic!("{context}: recorded output has neither ok nor err: {output}"));
    Ok(serde_json::from_value(value.clone())
        .unwrap_or_else(|e| panic!("{context}: failed to deserialize recorded value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ListError;
    use serde_json::json;

    #[test]
    fn extracts_ok_and_typed_err() {
        let ok: Result<Vec<u32>, ListError> = extract_result(&json!({"ok": [1, 2]}), "t");
        assert_eq!(ok, Ok(vec![1, 2]));
        let err: Result<Vec<u32>, ListError> =
            extract_result(&json!({"err": {"Transient": "502"}}), "t");
        assert_eq!(err, Err(ListError::Transient("502".into())));
    }

    #[test]
    #[should_panic(expected = "neither ok nor err")]
    fn bare_output_panics() {
        let _: Result<u32, ListError> = extract_result(&json!(3), "t");
    }
}
