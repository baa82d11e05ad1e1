//! Recipient parsing and address hygiene.

use email_address::EmailAddress;

/// Trims, drops any `[ ] < >` characters, trims again.
///
/// Recipients pasted from a contact card often arrive as `<a@b.com>` or
/// with JSON brackets left over from the client.
pub fn sanitize_address(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn is_valid_address(address: &str) -> bool {
    EmailAddress::is_valid(address)
}

/// Flattens the raw `to` form values into individual recipients.
///
/// Each value may be a single address, a JSON array of strings, or a
/// comma-separated list. Blank entries are dropped. Sanitization is left to
/// the caller so bad input can be reported as the user typed it.
pub fn parse_recipient_field(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| {
            let trimmed = value.trim();
            if trimmed.starts_with('[') {
                if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
                    return list;
                }
            }
            trimmed.split(',').map(str::to_string).collect()
        })
        .filter(|r| !r.trim().is_empty())
        .collect()
}

/// Sanitized addresses split into (valid, invalid).
pub fn partition_recipients(raw: &[String]) -> (Vec<String>, Vec<String>) {
    raw.iter()
        .map(|r| sanitize_address(r))
        .partition(|r| is_valid_address(r))
}
