//! Request path resolution
//!
//! Bundle URLs look like `/<kind prefix>/<version>/<logical path>`. Only the
//!  logical path is meaningful to the registry, so the leading segments are
//!  stripped by counting separators.
//!
//! Generated URLs percent-encode the logical path; request paths are decoded
//!  before resolution so both sides agree on the exact bundle path.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Escaped when a logical path is placed in a URL. `/` is left alone since it
///  separates segments of the logical path too.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Number of leading segments (kind prefix and cache-busting version) in a bundle URL
pub const BUNDLE_PATH_SEGMENTS: usize = 2;

/// Return the part of `raw` that follows the `occurrence`-th `/`.
///
/// A `/` in the first position opens the first segment and is not counted.
///  When `raw` holds fewer separators the input is returned unchanged, so
///  the caller's lookup fails instead of the resolver.
pub fn resolve_after_segments(raw: &str, occurrence: usize) -> &str {
    if occurrence == 0 {
        return raw;
    }
    raw.char_indices()
        .skip(1)
        .filter(|(_, c)| *c == '/')
        .nth(occurrence - 1)
        .map(|(idx, _)| &raw[idx + 1..])
        .unwrap_or(raw)
}

/// Logical bundle path of a bundle request path
pub fn resolve_bundle_path(raw: &str) -> &str {
    resolve_after_segments(raw, BUNDLE_PATH_SEGMENTS)
}

/// Percent-encode a logical path for use in a URL
pub fn encode_path(path: &str) -> Cow<'_, str> {
    utf8_percent_encode(path, PATH_ESCAPES).into()
}

/// Percent-decode a request path as received on the wire. Invalid UTF-8
///  sequences become replacement characters and so never match a bundle.
pub fn decode_request_path(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}
