//! Heuristic detection of instructional lines in a transcript.

use regex::Regex;
use std::sync::OnceLock;

/// Words that tend to mark an instruction or an emphasised point.
pub const KEY_WORDS: &[&str] = &[
    "important", "key", "step", "first", "second", "third", "next", "finally", "remember", "note",
    "tip", "trick", "essential", "must", "crucial", "critical", "necessary", "vital",
];

fn numbered_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\s*[.:]").expect("Invalid regex"))
}

fn timestamp_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\[\d+:\d{2}\]\s*-\s*\[\d+:\d{2}\]\s*-\s*").expect("Invalid regex")
    })
}

/// The spoken part of a transcript line, without its `[MM:SS] - [MM:SS] - ` prefix.
fn spoken_text(line: &str) -> &str {
    match timestamp_prefix_regex().find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Lines containing a key word (case-insensitive substring match), or whose
/// spoken text opens with a number and `.`/`:` such as `1.` or `2:`.
///
/// Matching lines are returned verbatim, in transcript order.
pub fn extract_key_points(transcript: &str) -> Vec<String> {
    transcript
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| {
            let lower = line.to_lowercase();
            KEY_WORDS.iter().any(|w| lower.contains(w))
                || numbered_regex().is_match(spoken_text(line))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "\
[00:00] - [00:04] - Welcome back to the channel.
[00:04] - [00:09] - The KEY thing is a relaxed grip.
[00:09] - [00:15] - Today it is sunny.
[00:15] - [00:20] - 2: bend your knees.
[00:20] - [00:25] - We scored 3 points.
[00:25] - [00:30] - Finally, follow through.";

    #[test]
    fn test_keyword_and_numbered_lines() {
        let points = extract_key_points(TRANSCRIPT);
        assert_eq!(
            points,
            vec![
                "[00:04] - [00:09] - The KEY thing is a relaxed grip.",
                "[00:15] - [00:20] - 2: bend your knees.",
                "[00:25] - [00:30] - Finally, follow through.",
            ]
        );
    }

    #[test]
    fn test_timestamps_alone_do_not_qualify() {
        assert!(extract_key_points("[00:01] - [00:02] - Hello there.").is_empty());
    }

    #[test]
    fn test_untimed_lines() {
        let points = extract_key_points("1. Preheat the pan\nsalt generously\nRemember to rest it");
        assert_eq!(points, vec!["1. Preheat the pan", "Remember to rest it"]);
    }

    #[test]
    fn test_every_point_is_a_verbatim_substring() {
        for transcript in [TRANSCRIPT, "note\n\n  step  \nnothing", "", "\n\n"] {
            for point in extract_key_points(transcript) {
                assert!(transcript.contains(&point));
            }
        }
    }

    #[test]
    fn test_any_keyword_line_yields_points() {
        for word in KEY_WORDS {
            let transcript = format!("[00:00] - [00:03] - intro\n[00:03] - [00:06] - a {} here", word.to_uppercase());
            assert!(!extract_key_points(&transcript).is_empty(), "{}", word);
        }
    }
}
