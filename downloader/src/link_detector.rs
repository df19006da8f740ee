/// Playlist link detection for operator input.
///
/// Recognises Spotify playlist URLs and pulls out the playlist id.
use once_cell::sync::Lazy;
use regex::Regex;

/// Substring every accepted playlist URL must contain.
pub const PLAYLIST_MARKER: &str = "spotify.com/playlist/";

/// Spotify ids are base-62.
static PLAYLIST_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

/// Full playlist URL up to the next whitespace. The id is not checked here;
/// the resolver rejects malformed ones.
static PLAYLIST_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:open\.)?spotify\.com/playlist/\S*").unwrap()
});

/// Whether the input looks like a playlist link at all.
pub fn is_playlist_url(input: &str) -> bool {
    input.contains(PLAYLIST_MARKER)
}

/// Find the first playlist URL inside a longer piece of text.
pub fn detect_playlist_url(text: &str) -> Option<&str> {
    PLAYLIST_URL_RE.find(text).map(|m| m.as_str())
}

/// Last path segment with the query string stripped.
///
/// `https://open.spotify.com/playlist/ABC123?si=xyz` gives `ABC123`.
pub fn extract_playlist_id(url: &str) -> &str {
    let last = url.rsplit('/').next().unwrap_or(url);
    last.split('?').next().unwrap_or(last)
}

/// Whether a playlist id has the expected shape.
pub fn is_valid_playlist_id(id: &str) -> bool {
    PLAYLIST_ID_RE.is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_strips_query() {
        assert_eq!(
            extract_playlist_id("https://open.spotify.com/playlist/ABC123?si=xyz"),
            "ABC123"
        );
    }

    #[test]
    fn test_extract_plain() {
        assert_eq!(
            extract_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
        assert_eq!(extract_playlist_id("ABC123"), "ABC123");
    }

    #[test]
    fn test_extract_trailing_slash_is_empty() {
        // the last segment is what counts, even when empty
        assert_eq!(extract_playlist_id("https://open.spotify.com/playlist/"), "");
        assert!(!is_valid_playlist_id(""));
    }

    #[test]
    fn test_marker_check() {
        assert!(is_playlist_url("https://open.spotify.com/playlist/ABC123"));
        assert!(is_playlist_url("open.spotify.com/playlist/ABC123?si=1"));
        assert!(!is_playlist_url("https://open.spotify.com/album/ABC123"));
        assert!(!is_playlist_url("https://www.youtube.com/playlist?list=PL123"));
        assert!(!is_playlist_url(""));
    }

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_playlist_id("37i9dQZF1DXcBWIGoYBM5M"));
        assert!(!is_valid_playlist_id("ABC-123"));
        assert!(!is_valid_playlist_id("ABC123?si=xyz"));
    }

    #[test]
    fn test_detect_in_text() {
        let text = "try this one: https://open.spotify.com/playlist/ABC123?si=xyz thanks";
        assert_eq!(
            detect_playlist_url(text),
            Some("https://open.spotify.com/playlist/ABC123?si=xyz")
        );
        assert_eq!(detect_playlist_url("no links here"), None);
    }

    #[test]
    fn test_detect_keeps_whole_id() {
        assert_eq!(
            detect_playlist_url("https://open.spotify.com/playlist/ABC-123"),
            Some("https://open.spotify.com/playlist/ABC-123")
        );
        assert_eq!(
            detect_playlist_url("see spotify.com/playlist/ABC/extra?si=1 now"),
            Some("spotify.com/playlist/ABC/extra?si=1")
        );
    }
}
