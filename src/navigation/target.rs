//! Navigation target normalisation.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use url::Url;

/// Escapes that stay encoded in a decoded pathname: `%`, `/`, `?`, `#`.
const RESERVED: [&[u8]; 4] = [b"25", b"2F", b"3F", b"23"];

/// Reduce a navigation target to the pathname the route table is matched
/// against.
///
/// Absolute URLs are reduced to their path; query and fragment are dropped.
/// The path is percent-decoded (see [`decode_pathname`]) so a target matches
/// the same route however it is encoded. When the application lives under
/// `base`, the base is stripped. Returns `None` for targets outside the base.
pub fn route_path(target: &str, base: &str) -> Option<String> {
    let raw = match Url::parse(target) {
        Ok(url) if !url.cannot_be_a_base() => url.path().to_string(),
        _ => strip_query(target).to_string(),
    };
    let path = decode_pathname(&raw);

    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return Some(path);
    }

    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        // "/application" is not under "/app".
        None
    }
}

/// Percent-decode a pathname, leaving `%25`, `%2F`, `%3F` and `%23` encoded.
///
/// Decoding never introduces a separator, query or fragment, and route
/// patterns match those four characters in their encoded form. Runs that do
/// not decode to UTF-8 are kept as written.
pub fn decode_pathname(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = String::with_capacity(path.len());
    let mut start = 0;
    let mut i = 0;

    while i + 2 < bytes.len() {
        let escape = &bytes[i + 1..i + 3];
        if bytes[i] == b'%' && RESERVED.iter().any(|r| r.eq_ignore_ascii_case(escape)) {
            out.push_str(&decode(&path[start..i]));
            out.push_str(&path[i..i + 3]);
            i += 3;
            start = i;
            continue;
        }
        i += 1;
    }

    out.push_str(&decode(&path[start..]));
    out
}

/// Fully decode a captured parameter value.
pub fn decode_param(value: &str) -> String {
    decode(value).into_owned()
}

fn decode(text: &str) -> Cow<'_, str> {
    percent_decode_str(text)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(text))
}

fn strip_query(target: &str) -> &str {
    let end = target.find(|c| c == '?' || c == '#').unwrap_or(target.len());
    &target[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths() {
        assert_eq!(route_path("/a/b", ""), Some("/a/b".into()));
        assert_eq!(route_path("", ""), Some("".into()));
        assert_eq!(route_path("/a?x=1#top", ""), Some("/a".into()));
    }

    #[test]
    fn test_absolute_urls() {
        assert_eq!(route_path("https://example.com/a/b?q", ""), Some("/a/b".into()));
        assert_eq!(route_path("https://example.com", ""), Some("/".into()));
    }

    #[test]
    fn test_encoding_does_not_change_path() {
        let targets = [
            "/café",
            "/caf%C3%A9",
            "/caf%c3%a9",
            "https://h/café",
            "https://h/caf%C3%A9",
        ];
        for target in targets {
            assert_eq!(route_path(target, ""), Some("/café".into()), "target {}", target);
        }
        assert_eq!(route_path("/a b", ""), route_path("https://h/a b", ""));
        assert_eq!(route_path("https://h/a b", ""), Some("/a b".into()));
    }

    #[test]
    fn test_reserved_escapes_stay_encoded() {
        assert_eq!(decode_pathname("/a%2Fb%2fc"), "/a%2Fb%2fc");
        assert_eq!(decode_pathname("/100%25/x%3Fy%23z"), "/100%25/x%3Fy%23z");
        assert_eq!(decode_pathname("/%C3%A9%2F%C3%A9"), "/é%2Fé");
        assert_eq!(decode_pathname("/bad%FF/%zz"), "/bad%FF/%zz");
        assert_eq!(decode_pathname("/trailing%2"), "/trailing%2");
    }

    #[test]
    fn test_decode_param() {
        assert_eq!(decode_param("x%2Fy"), "x/y");
        assert_eq!(decode_param("caf%C3%A9"), "café");
        assert_eq!(decode_param("plain"), "plain");
    }

    #[test]
    fn test_base_stripping() {
        assert_eq!(route_path("/app/a", "/app"), Some("/a".into()));
        assert_eq!(route_path("/app", "/app"), Some("/".into()));
        assert_eq!(route_path("/app/", "/app/"), Some("/".into()));
        assert_eq!(route_path("https://example.com/app/x", "/app"), Some("/x".into()));
        assert_eq!(route_path("/application", "/app"), None);
        assert_eq!(route_path("/other", "/app"), None);
    }
}
