//! Single-field JSON payloads.

use std::collections::BTreeMap;

/// Wrap `value` as `{ field: value }`.
///
/// Pure: the same input always produces the same bytes.
pub fn wrap_param(field: &str, value: &str) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&BTreeMap::from([(field, value)]))
}
