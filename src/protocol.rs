//! Wire Protocol Module
//!
//! Fixed-format text responses and the deterministic placeholder compute
//! function the server memoizes. No chunking, no persistent connections:
//! one request in, one response out.

// == Constants ==
/// Largest request the server reads from a connection.
pub const MAX_REQUEST_BYTES: usize = 1024;

// == Response Source ==
/// Whether a response value was freshly computed or served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    CacheHit,
    Computed,
}

// == Compute ==
/// Deterministic placeholder business logic.
///
/// Any pure function of the request would do; this one folds the bytes
/// into a djb2-style digest so tests can reproduce the value exactly.
pub fn compute_value(request: &str) -> String {
    let digest: u32 = request
        .bytes()
        .fold(5381u32, |acc, b| acc.wrapping_mul(33) ^ u32::from(b));
    format!("len={} digest={digest:08x}", request.len())
}

// == Render ==
/// Builds the full response buffer: fixed header block, blank line, body.
///
/// The body embeds the value and is tagged with where it came from.
pub fn render_response(source: ResponseSource, value: &str) -> String {
    let body = match source {
        ResponseSource::CacheHit => format!("Response from cache: {value}"),
        ResponseSource::Computed => format!("Computed: {value}"),
    };
    format!("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n{body}\n")
}
