// src/utils/url.rs

//! URL helpers for emoji image sources.

use std::sync::OnceLock;

use regex::Regex;

fn codepoint_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_([0-9a-fA-F-]+)").expect("static regex"))
}

/// Derive the space-joined `U+XXXX` codepoints encoded in an image URL.
///
/// Image hosts name files like `grinning-face_1f600.png`; every run of hex
/// digits and dashes that follows an `_` and is itself followed by `_` or
/// `.` contributes its dash-separated parts. Empty parts from stray dashes
/// are kept as a bare `U+`.
///
/// # Examples
/// ```
/// use emoji_atlas::utils::url::unicode_from_url;
///
/// assert_eq!(
///     unicode_from_url("https://cdn.example/120/grinning-face_1f600.png"),
///     "U+1F600"
/// );
/// assert_eq!(
///     unicode_from_url("https://cdn.example/man-technologist_1f468-200d-1f4bb.png"),
///     "U+1F468 U+200D U+1F4BB"
/// );
/// ```
pub fn unicode_from_url(url: &str) -> String {
    let mut tokens = Vec::new();

    for caps in codepoint_run().captures_iter(url) {
        let (Some(whole), Some(run)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // the class excludes '_' and '.', so a greedy run can only be
        // accepted by what directly follows it
        match url[whole.end()..].chars().next() {
            Some('_') | Some('.') => {}
            _ => continue,
        }
        tokens.extend(
            run.as_str()
                .split('-')
                .map(|part| format!("U+{}", part.to_uppercase())),
        );
    }

    tokens.join(" ")
}

/// Whether `url` parses as an absolute http(s) URL.
pub fn is_fetchable(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_codepoint() {
        assert_eq!(
            unicode_from_url("https://em-content.zobj.net/thumbs/120/apple/354/red-heart_2764-fe0f.png"),
            "U+2764 U+FE0F"
        );
    }

    #[test]
    fn test_consecutive_runs_separated_by_underscore() {
        assert_eq!(
            unicode_from_url("https://cdn.example/flag_1f1fa_1f1f8.webp"),
            "U+1F1FA U+1F1F8"
        );
    }

    #[test]
    fn test_run_not_followed_by_separator_is_ignored() {
        assert_eq!(unicode_from_url("https://cdn.example/_abc/face_1f600.png"), "U+1F600");
        assert_eq!(unicode_from_url("https://cdn.example/face.png"), "");
    }

    #[test]
    fn test_non_hex_suffix_is_ignored() {
        assert_eq!(unicode_from_url("https://cdn.example/grinning_smile.png"), "");
    }

    #[test]
    fn test_stray_dash_yields_bare_prefix() {
        assert_eq!(unicode_from_url("https://cdn.example/face_1f600-.png"), "U+1F600 U+");
        assert_eq!(unicode_from_url("https://cdn.example/face_-1f600.png"), "U+ U+1F600");
    }

    #[test]
    fn test_is_fetchable() {
        assert!(is_fetchable("https://cdn.example/a.png"));
        assert!(is_fetchable("http://127.0.0.1:8080/a.png"));
        assert!(!is_fetchable("not a url"));
        assert!(!is_fetchable("ftp://cdn.example/a.png"));
    }
}
