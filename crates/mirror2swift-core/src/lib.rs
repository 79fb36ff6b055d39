pub mod config;
pub mod enumeration;
pub mod errors;
pub mod mirror_planner;
pub mod orchestrator;
pub mod remote;
pub mod repos;
pub mod transfer_engine;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside one URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
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

/// Normalize a mirror location so relative URIs can be appended directly.
pub fn with_trailing_slash(location: &str) -> String {
    if location.ends_with('/') {
        location.to_string()
    } else {
        format!("{location}/")
    }
}

/// Percent-encode each `/`-separated segment of a decoded URI so it can be
/// appended to a URL base.
pub fn encode_uri_path(uri: &str) -> String {
    uri.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
