use once_cell::sync::Lazy;
use regex::Regex;

static HEX_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-f0-9]{7,40}").expect("commit sha pattern is valid")
});

/// Pull a commit identifier out of the assistant's free-text reply.
///
/// Best effort only: the assistant answers in prose, so this returns the
/// first run of 7 to 40 hex characters, which may well be something other
/// than a commit hash (a colour, a long number, part of a word).
pub fn extract_commit_sha(text: &str) -> Option<String> {
    HEX_RUN.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_short_sha() {
        let text = "Committed as 3f2a9c1 and pushed to origin/main.";
        assert_eq!(extract_commit_sha(text), Some("3f2a9c1".to_string()));
    }

    #[test]
    fn test_extracts_first_token() {
        let text = "[main 9fceb02] Update hero copy\nprevious head was 1a2b3c4d";
        assert_eq!(extract_commit_sha(text), Some("9fceb02".to_string()));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            extract_commit_sha("sha: ABCDEF12"),
            Some("ABCDEF12".to_string())
        );
    }

    #[test]
    fn test_caps_at_forty_characters() {
        let long = "a".repeat(45);
        assert_eq!(extract_commit_sha(&long).map(|s| s.len()), Some(40));
    }

    #[test]
    fn test_no_token() {
        assert_eq!(extract_commit_sha("Changes pushed, nothing else to report."), None);
        assert_eq!(extract_commit_sha("short abc123 only"), None);
        assert_eq!(extract_commit_sha(""), None);
    }

    #[test]
    fn test_false_positive_on_hex_looking_words() {
        // known limitation of scraping prose
        assert_eq!(
            extract_commit_sha("colour #deadbeef applied"),
            Some("deadbeef".to_string())
        );
    }
}
