//! Hop-by-hop header handling.
//!
//! # Responsibilities
//! - Define the hop-by-hop set shared by both proxy directions
//! - Honour names nominated by the `Connection` header
//! - Copy a header map minus a caller-supplied exclusion list

use axum::http::{header, HeaderMap, HeaderName};

/// Headers meaningful only for a single transport connection.
pub const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Returns true if `name` belongs to the fixed hop-by-hop set.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Extra names listed in the `Connection` header (`Connection: close, x-foo`).
///
/// Those are connection-scoped for this hop only and must be dropped too.
fn connection_nominated(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::try_from(token.trim()).ok())
        .collect()
}

/// Copy `source` into a fresh map, skipping hop-by-hop names, anything the
/// `Connection` header nominated, and every name in `exclude`.
///
/// Repeated headers keep their multiplicity and relative order.
pub fn copy_end_to_end(source: &HeaderMap, exclude: &[HeaderName]) -> HeaderMap {
    let nominated = connection_nominated(source);
    let mut out = HeaderMap::with_capacity(source.len());

    for (name, value) in source.iter() {
        if is_hop_by_hop(name) || exclude.contains(name) || nominated.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_hop_by_hop_names_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("Keep-Alive", HeaderValue::from_static("timeout=5"));
        headers.insert("TE", HeaderValue::from_static("trailers"));
        headers.insert("Trailer", HeaderValue::from_static("x-checksum"));
        headers.insert("Transfer-Encoding", HeaderValue::from_static("chunked"));
        headers.insert("Upgrade", HeaderValue::from_static("websocket"));
        headers.insert("Proxy-Authorization", HeaderValue::from_static("Basic Zm9v"));
        headers.insert("Proxy-Authenticate", HeaderValue::from_static("Basic"));
        headers.insert("Accept", HeaderValue::from_static("text/html"));

        let copied = copy_end_to_end(&headers, &[]);

        for name in HOP_BY_HOP.iter() {
            assert!(!copied.contains_key(name), "{} leaked", name);
        }
        assert_eq!(copied.get("accept").unwrap(), "text/html");
    }

    #[test]
    fn test_connection_nominated_names_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert("Connection", HeaderValue::from_static("close, X-Session-Hint"));
        headers.insert("X-Session-Hint", HeaderValue::from_static("abc"));
        headers.insert("X-Other", HeaderValue::from_static("keep"));

        let copied = copy_end_to_end(&headers, &[]);
        assert!(!copied.contains_key("x-session-hint"));
        assert!(copied.contains_key("x-other"));
    }

    #[test]
    fn test_exclusions_and_multiplicity() {
        let mut headers = HeaderMap::new();
        headers.insert("Host", HeaderValue::from_static("client.example"));
        headers.append("X-Multi", HeaderValue::from_static("one"));
        headers.append("X-Multi", HeaderValue::from_static("two"));

        let copied = copy_end_to_end(&headers, &[header::HOST]);
        assert!(!copied.contains_key(header::HOST));

        let values: Vec<_> = copied.get_all("x-multi").iter().collect();
        assert_eq!(values, vec!["one", "two"]);
    }
}
