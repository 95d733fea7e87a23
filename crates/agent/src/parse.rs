//! Pulling structured values out of free-form model replies.

use serde_json::Value;

/// The first JSON object or array embedded in `text`.
///
/// Tries each `{` or `[` in turn and parses the longest value starting
/// there, so prose and code fences around the JSON are ignored.
pub fn first_json_value(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .find_map(|(i, _)| {
            serde_json::Deserializer::from_str(&text[i..])
                .into_iter::<Value>()
                .next()
                .and_then(Result::ok)
        })
}
