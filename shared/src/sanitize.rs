/// Filename sanitizing for downloaded tracks.

/// Characters rejected by at least one common filesystem.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turn an arbitrary "artist - name" string into a safe file stem.
///
/// Drops `<>:"/\|?*`, spells out `&` as "and" and trims the result.
pub fn sanitize_filename(raw: &str) -> String {
    let kept: String = raw.chars().filter(|c| !ILLEGAL_CHARS.contains(c)).collect();
    kept.replace('&', "and").trim().to_string()
}
