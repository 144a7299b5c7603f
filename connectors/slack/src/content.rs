use regex::Regex;

/// Rewrite common Markdown constructs as Slack mrkdwn. The substitutions are
/// a fixed, ordered chain applied to one accumulating string; plain text
/// without markers passes through unchanged. Inline code and code blocks use
/// backticks on both sides, so they need no rule.
pub fn markdown_to_mrkdwn(text: &str) -> String {
    const RULES: [(&str, &str); 15] = [
        (r"\*\*(.*?)\*\*", "*${1}*"),
        (r"__(.*?)__", "*${1}*"),
        (r"\*(.*?)\*", "_${1}_"),
        (r"~~(.*?)~~", "~${1}~"),
        (r"\[(.*?)\]\((.*?)\)", "<${2}|${1}>"),
        (r"(?m)^###### (.*)$", "*${1}*"),
        (r"(?m)^##### (.*)$", "*${1}*"),
        (r"(?m)^#### (.*)$", "*${1}*"),
        (r"(?m)^### (.*)$", "*${1}*"),
        (r"(?m)^## (.*)$", "*${1}*"),
        (r"(?m)^# (.*)$", "*${1}*"),
        (r"(?m)^\* (.*)$", "• ${1}"),
        (r"(?m)^\+ (.*)$", "• ${1}"),
        (r"(?m)^- (.*)$", "• ${1}"),
        (r"(?m)^\d+\. (.*)$", "1. ${1}"),
    ];

    let mut out = text.to_string();
    for (pattern, replacement) in RULES {
        let re = Regex::new(pattern).unwrap();
        out = re.replace_all(&out, replacement).into_owned();
    }
    out
}

/// Cut a long message into chunks for a channel that caps message length.
///
/// Each chunk stays within `chunk_size` bytes, breaking at the last newline
/// inside the window when one exists and falling back to a hard cut
/// otherwise. Chunks concatenate back to the original text exactly.
pub fn split_text(text: &str, chunk_size: usize) -> SplitText<'_> {
    SplitText {
        remaining: text,
        chunk_size,
    }
}

pub struct SplitText<'a> {
    remaining: &'a str,
    chunk_size: usize,
}

impl<'a> Iterator for SplitText<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.remaining.is_empty() {
            return None;
        }
        if self.remaining.len() <= self.chunk_size {
            let rest = self.remaining;
            self.remaining = "";
            return Some(rest);
        }

        let mut end = self.chunk_size;
        while !self.remaining.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // chunk_size is smaller than the first character; emit it whole
            end = self
                .remaining
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(self.remaining.len());
        }

        // A newline at position zero would produce an empty chunk and no
        // progress, so that case falls through to the hard cut.
        let (chunk, rest) = match self.remaining[..end].rfind('\n') {
            Some(pos) if pos > 0 => (&self.remaining[..pos], &self.remaining[pos..]),
            _ => (&self.remaining[..end], &self.remaining[end..]),
        };

        self.remaining = rest;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        let text = "Nothing special here.\nJust two lines of prose.";
        assert_eq!(markdown_to_mrkdwn(text), text);
    }

    #[test]
    fn test_emphasis_collapses_to_slack_italic() {
        // Bold loses a star pair in the first pass, then the single-star
        // pass reads what is left as italic. Same for double underscores.
        assert_eq!(markdown_to_mrkdwn("**Bold** word"), "_Bold_ word");
        assert_eq!(markdown_to_mrkdwn("__strong__ word"), "_strong_ word");
        assert_eq!(markdown_to_mrkdwn("*ital* word"), "_ital_ word");
    }

    #[test]
    fn test_strikethrough_drops_a_tilde() {
        assert_eq!(markdown_to_mrkdwn("~~gone~~"), "~gone~");
    }

    #[test]
    fn test_links_become_angle_pairs() {
        assert_eq!(
            markdown_to_mrkdwn("Click [here](https://example.com/v) now"),
            "Click <https://example.com/v|here> now"
        );
    }

    #[test]
    fn test_headings_become_bold_lines() {
        assert_eq!(
            markdown_to_mrkdwn("# Big day\nbody text\n### Small heading"),
            "*Big day*\nbody text\n*Small heading*"
        );
    }

    #[test]
    fn test_bullet_markers_become_dots() {
        assert_eq!(
            markdown_to_mrkdwn("* one\n+ two\n- three"),
            "• one\n• two\n• three"
        );
    }

    #[test]
    fn test_numbered_lists_flatten_to_slack_style() {
        assert_eq!(
            markdown_to_mrkdwn("1. first\n2. second\n10. tenth"),
            "1. first\n1. second\n1. tenth"
        );
    }

    #[test]
    fn test_short_text_is_a_single_chunk() {
        let chunks: Vec<&str> = split_text("short", 100).collect();
        assert_eq!(chunks, vec!["short"]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert_eq!(split_text("", 100).count(), 0);
    }

    #[test]
    fn test_chunks_concatenate_back_to_the_original() {
        let text = "alpha beta\ngamma delta\nepsilon zeta eta theta\niota";
        let rebuilt: String = split_text(text, 16).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_chunks_stay_within_the_limit() {
        let text = "alpha beta\ngamma delta\nepsilon zeta eta theta\niota";
        for chunk in split_text(text, 16) {
            assert!(chunk.len() <= 16, "{:?} is over the limit", chunk);
        }
    }

    #[test]
    fn test_breaks_prefer_the_last_newline() {
        let chunks: Vec<&str> = split_text("aaaa\nbb\ncccc", 10).collect();
        assert_eq!(chunks, vec!["aaaa\nbb", "\ncccc"]);
    }

    #[test]
    fn test_hard_cut_when_no_newline_fits() {
        let chunks: Vec<&str> = split_text("abcdefghijkl", 5).collect();
        assert_eq!(chunks, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_a_leading_newline_cannot_stall_the_iterator() {
        let chunks: Vec<&str> = split_text("\nabcdefgh", 4).collect();
        assert_eq!(chunks, vec!["\nabc", "defg", "h"]);
    }

    #[test]
    fn test_hard_cuts_respect_char_boundaries() {
        let text = "ééééé";
        let chunks: Vec<&str> = split_text(text, 3).collect();
        assert!(chunks.iter().all(|c| c.len() <= 3));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_a_char_wider_than_the_limit_is_emitted_whole() {
        let chunks: Vec<&str> = split_text("日本", 1).collect();
        assert_eq!(chunks, vec!["日", "本"]);
    }
}
