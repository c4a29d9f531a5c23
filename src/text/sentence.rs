use std::collections::HashSet;
use std::ops::Range;

/// Splits text into sentences.
///
/// Implementations return byte ranges into the input, in order, each trimmed
/// of surrounding whitespace. Whitespace-only input yields no sentences.
pub trait SentenceTokenizer {
    fn sentence_spans(&self, text: &str) -> Vec<Range<usize>>;
}

/// Abbreviations that end in a period without ending a sentence.
///
/// Stored lowercase and without the final period.
const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc", "ltd",
    "co", "corp", "no", "fig", "approx", "dept", "mt", "ave", "gen", "col", "capt", "lt", "sgt",
    "rev", "u.s", "a.m", "p.m",
];

/// Punctuation-driven sentence tokenizer.
///
/// A boundary is placed after a run of `.`, `!`, `?` or `…` (plus any closing
/// quotes or brackets) when whitespace follows and the next visible character
/// is not lowercase. A lone period after a known abbreviation or a
/// single-letter initial is not a boundary. A blank line always is.
///
/// When no boundary is found the whole (trimmed) text is one sentence.
#[derive(Debug, Clone)]
pub struct RuleTokenizer {
    abbreviations: HashSet<String>,
}

impl Default for RuleTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTokenizer {
    pub fn new() -> Self {
        Self {
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Add abbreviations on top of the built-in list.
    ///
    /// Entries are matched case-insensitively; a trailing period is ignored.
    pub fn with_abbreviations<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for abbr in extra {
            let abbr = abbr.as_ref().trim().trim_end_matches('.').to_lowercase();
            if !abbr.is_empty() {
                self.abbreviations.insert(abbr);
            }
        }
        self
    }

    fn is_abbreviation(&self, before: &str) -> bool {
        let word = before
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or("")
            .trim_start_matches(|c: char| matches!(c, '(' | '[' | '"' | '\'' | '“' | '‘'));
        if word.is_empty() {
            return false;
        }

        let mut letters = word.chars();
        let single_initial = matches!(
            (letters.next(), letters.next()),
            (Some(c), None) if c.is_alphabetic() && c.is_uppercase()
        );

        single_initial || self.abbreviations.contains(&word.to_lowercase())
    }
}

impl SentenceTokenizer for RuleTokenizer {
    fn sentence_spans(&self, text: &str) -> Vec<Range<usize>> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let byte_at = |i: usize| chars.get(i).map(|&(b, _)| b).unwrap_or(text.len());

        let mut spans = Vec::new();
        let mut start = 0usize;
        let mut i = 0usize;

        while i < chars.len() {
            let (idx, ch) = chars[i];

            if is_terminator(ch) {
                let mut j = i + 1;
                while j < chars.len() && is_terminator(chars[j].1) {
                    j += 1;
                }
                let lone_period = ch == '.' && j == i + 1;
                while j < chars.len() && is_closer(chars[j].1) {
                    j += 1;
                }

                if j == chars.len() || !chars[j].1.is_whitespace() {
                    i = j;
                    continue;
                }

                let mut k = j;
                while k < chars.len() && chars[k].1.is_whitespace() {
                    k += 1;
                }
                if k == chars.len() {
                    break;
                }

                let next_is_lower = chars[k].1.is_lowercase();
                if next_is_lower || (lone_period && self.is_abbreviation(&text[start..idx])) {
                    i = j;
                    continue;
                }

                push_trimmed(&mut spans, text, start..byte_at(j));
                start = byte_at(k);
                i = k;
                continue;
            }

            if ch == '\n' {
                let mut j = i + 1;
                let mut newlines = 1;
                while j < chars.len() && chars[j].1.is_whitespace() {
                    if chars[j].1 == '\n' {
                        newlines += 1;
                    }
                    j += 1;
                }
                if newlines >= 2 && j < chars.len() {
                    push_trimmed(&mut spans, text, start..idx);
                    start = byte_at(j);
                }
                i = j;
                continue;
            }

            i += 1;
        }

        push_trimmed(&mut spans, text, start..text.len());
        spans
    }
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '…')
}

fn is_closer(ch: char) -> bool {
    matches!(ch, '"' | '\'' | ')' | ']' | '”' | '’' | '»')
}

fn push_trimmed(spans: &mut Vec<Range<usize>>, text: &str, range: Range<usize>) {
    let slice = &text[range.clone()];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    let (start, end) = (range.start + lead, range.end - trail);
    if start < end {
        spans.push(start..end);
    }
}
