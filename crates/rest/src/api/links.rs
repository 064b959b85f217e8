//! Continuation links for collection pages.

use sensorthings_persistence::types::QueryOptions;
use url::form_urlencoded::byte_serialize;

/// Builds the `@iot.nextLink` for a collection page.
///
/// `request_url` is the absolute collection address without a query string.
/// Returns `None` when the page already reaches the end of the collection.
/// Otherwise the link repeats every original option in order, with `$skip`
/// advanced by the page size.
pub fn build_next_link(total_count: u64, request_url: &str, options: &QueryOptions) -> Option<String> {
    let top = options.top.filter(|top| *top > 0)?;
    let next_skip = options.skip_or_zero().checked_add(top)?;
    if total_count <= u64::from(next_skip) {
        return None;
    }

    let query = options
        .pairs_with_skip(next_skip)
        .iter()
        .map(|(key, value)| format!("{}={}", encode_key(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    Some(format!("{}?{}", request_url, query))
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Option names keep their literal `$`.
fn encode_key(key: &str) -> String {
    encode(key).replace("%24", "$")
}
