//! URL validation and filename sanitization helpers.

use thiserror::Error;
use url::Url;

/// Hosts accepted by [`validate_video_url`].
const ALLOWED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
    "www.youtu.be",
];

/// Characters stripped from filenames before storage.
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const MAX_FILENAME_LEN: usize = 100;

/// Why a submitted URL was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL could not be parsed: {0}")]
    Malformed(String),
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("host is not a supported video site: {0}")]
    UnsupportedHost(String),
}

/// Validate that a URL points at a supported video site.
///
/// Accepts http/https URLs whose host is on the allow-list and returns the
/// parsed URL so callers do not re-parse.
pub fn validate_video_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Malformed(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }

    let host = url
        .host_str()
        .ok_or_else(|| UrlError::Malformed("missing host".to_string()))?;
    if !ALLOWED_HOSTS.contains(&host.to_ascii_lowercase().as_str()) {
        return Err(UrlError::UnsupportedHost(host.to_string()));
    }

    Ok(url)
}

/// Extract the 11-character video ID from a supported URL, if present.
///
/// Handles watch, short-link, Shorts, embed and live URL shapes.
pub fn extract_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();

    let candidate = if host.ends_with("youtu.be") {
        url.path_segments()?.next().map(str::to_string)
    } else {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("shorts") | Some("embed") | Some("live") => {
                segments.next().map(str::to_string)
            }
            _ => None,
        }
    }?;

    let is_valid = candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    is_valid.then_some(candidate)
}

/// Sanitize a video title into a safe filename stem.
///
/// Strips filesystem-unsafe characters, collapses whitespace and underscore
/// runs into a single underscore, trims leading/trailing underscores and
/// caps the length.
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect();

    let mut result = String::with_capacity(stripped.len());
    let mut last_was_sep = false;
    for c in stripped.chars() {
        if c.is_whitespace() || c == '_' {
            if !last_was_sep {
                result.push('_');
                last_was_sep = true;
            }
        } else {
            result.push(c);
            last_was_sep = false;
        }
    }

    let truncated: String = result.chars().take(MAX_FILENAME_LEN).collect();
    truncated.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_standard_watch_urls() {
        for raw in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtu.be/dQw4w9WgXcQ",
            "https://www.youtu.be/dQw4w9WgXcQ",
        ] {
            assert!(validate_video_url(raw).is_ok(), "rejected {raw}");
        }
    }

    #[test]
    fn rejects_other_hosts_and_schemes() {
        assert_eq!(
            validate_video_url("https://vimeo.com/12345"),
            Err(UrlError::UnsupportedHost("vimeo.com".to_string()))
        );
        assert_eq!(
            validate_video_url("ftp://youtube.com/watch?v=dQw4w9WgXcQ"),
            Err(UrlError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(matches!(
            validate_video_url("not a url"),
            Err(UrlError::Malformed(_))
        ));
        // Lookalike domains must not pass.
        assert!(matches!(
            validate_video_url("https://evil-youtube.com/watch?v=dQw4w9WgXcQ"),
            Err(UrlError::UnsupportedHost(_))
        ));
    }

    #[test]
    fn extracts_video_id_from_url_shapes() {
        for raw in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?feature=share",
        ] {
            let url = Url::parse(raw).unwrap();
            assert_eq!(extract_video_id(&url).as_deref(), Some("dQw4w9WgXcQ"), "{raw}");
        }
    }

    #[test]
    fn rejects_malformed_video_ids() {
        let url = Url::parse("https://www.youtube.com/watch?v=tooshort").unwrap();
        assert_eq!(extract_video_id(&url), None);
        let url = Url::parse("https://www.youtube.com/playlist?list=PL123").unwrap();
        assert_eq!(extract_video_id(&url), None);
    }

    #[test]
    fn sanitizes_unsafe_characters() {
        assert_eq!(sanitize_filename("My: Video? <Test>"), "My_Video_Test");
        assert_eq!(sanitize_filename("a/b\\c|d*e"), "abcde");
    }

    #[test]
    fn collapses_separator_runs_and_trims() {
        assert_eq!(sanitize_filename("  hello   world  "), "hello_world");
        assert_eq!(sanitize_filename("a___b  _ c"), "a_b_c");
    }

    #[test]
    fn caps_filename_length() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }
}
