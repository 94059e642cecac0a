//! Redaction of credentials embedded in log messages.

/// Keys whose values are masked in `key=value` pairs.
const SENSITIVE_KEYS: [&str; 4] = ["password", "token", "secret", "key"];

/// Replaces the value of any `password=`, `token=`, `secret=` or `key=` pair
/// (case-insensitive) with `***`.
///
/// The value runs until the next whitespace character.
///
/// ```
/// use shared::telemetry::redact;
///
/// assert_eq!(redact("login password=hunter2 ok"), "login password=*** ok");
/// assert_eq!(redact("API_KEY=abc"), "API_KEY=***");
/// ```
#[must_use]
pub fn redact(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    let mut out = String::with_capacity(message.len());
    let mut pos = 0;

    while pos < message.len() {
        let matched = SENSITIVE_KEYS.iter().find_map(|key| {
            let needle_end = pos + key.len();
            (lower[pos..].starts_with(key) && lower.as_bytes().get(needle_end) == Some(&b'='))
                .then_some(needle_end + 1)
        });

        if let Some(value_start) = matched {
            out.push_str(&message[pos..value_start]);
            out.push_str("***");
            pos = message[value_start..]
                .find(char::is_whitespace)
                .map_or(message.len(), |i| value_start + i);
        } else {
            let ch_len = message[pos..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&message[pos..pos + ch_len]);
            pos += ch_len;
        }
    }

    out
}
