//! Recording adapters that capture interactions to cassettes.

pub mod llm;
pub mod repo_host;

pub use llm::RecordingLlmClient;
pub use repo_host::RecordingRepoHost;

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::warn;

use crate::cassette::recorder::CassetteRecorder;

/// Record a `Result<T, E>` interaction using the ok/err JSON convention.
///
/// Mirror of `replaying::extract_result`:
/// - `Ok(v)` is serialized as `{"ok": v}`
/// - `Err(e)` is serialized as `{"err": e}`, keeping the error variant
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: Serialize,
    I: Serialize,
{
    let encoded = serde_json::to_value(input).and_then(|input| {
        let (key, value) = match result {
            Ok(v) => ("ok", serde_json::to_value(v)?),
            Err(e) => ("err", serde_json::to_value(e)?),
        };
        let mut output = serde_json::Map::new();
        output.insert(key.to_string(), value);
        Ok((input, serde_json::Value::Object(output)))
    });

    match (encoded, recorder.lock()) {
        (Ok((input, output)), Ok(mut guard)) => guard.record(port, method, input, output),
        (Err(e), _) => warn!(port, method, error = %e, "could not encode interaction for cassette"),
        (_, Err(_)) => warn!(port, method, "cassette recorder lock poisoned"),
    }
}
