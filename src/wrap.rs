//! Line wrapping post-pass.
//!
//! Long lines are broken at the last space inside the budget (or hard at the
//! budget when there is none). Punctuation that would start the next segment
//! is pulled back onto the segment before it. With marker tokens configured,
//! the markers are written where a break would go instead of a newline.

/// Characters that must not start a wrapped segment.
const TRAILING_PUNCTUATION: [char; 5] = ['.', ',', ';', '?', '!'];

/// Wrapping parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapConfig {
    /// Maximum characters per line, markers included. `0` disables wrapping.
    pub limit: usize,
    /// Tokens written at each break, in order. Empty means plain newlines.
    pub markers: Vec<String>,
}

impl WrapConfig {
    pub fn new(limit: usize, markers: Vec<String>) -> Self {
        Self { limit, markers }
    }

    pub fn is_noop(&self) -> bool {
        self.limit == 0
    }

    fn marker_text(&self) -> String {
        self.markers.concat()
    }

    /// Characters available for content on each segment.
    pub fn budget(&self) -> usize {
        let marker_len: usize = self.markers.iter().map(|m| m.chars().count()).sum();
        self.limit.saturating_sub(marker_len).max(1)
    }
}

/// Wrap every line of `text`.
pub fn wrap_text(text: &str, config: &WrapConfig) -> String {
    let mut wrapper = LineWrapper::new(config.clone());
    let mut out = wrapper.push(text);
    out.push_str(&wrapper.finish());
    out
}

/// Incremental wrapper for text that arrives in pieces.
///
/// Only complete lines are wrapped; an unterminated tail (including a lone
/// trailing `\r` that may be the first half of `\r\n`) waits for the next
/// piece or for [`LineWrapper::finish`].
#[derive(Debug)]
pub struct LineWrapper {
    config: WrapConfig,
    markers: String,
    pending: String,
}

impl LineWrapper {
    pub fn new(config: WrapConfig) -> Self {
        let markers = config.marker_text();
        Self {
            config,
            markers,
            pending: String::new(),
        }
    }

    /// Feed more text; returns the wrapped form of every line completed so far.
    pub fn push(&mut self, text: &str) -> String {
        if self.config.is_noop() {
            return text.to_string();
        }

        self.pending.push_str(text);
        let complete = complete_prefix_len(&self.pending);
        if complete == 0 {
            return String::new();
        }

        let rest = self.pending.split_off(complete);
        let lines = std::mem::replace(&mut self.pending, rest);
        self.wrap_lines(&lines)
    }

    /// Wrap whatever is still pending.
    pub fn finish(mut self) -> String {
        let lines = std::mem::take(&mut self.pending);
        self.wrap_lines(&lines)
    }

    fn wrap_lines(&self, text: &str) -> String {
        let budget = self.config.budget();
        let mut out = String::with_capacity(text.len() + text.len() / 8);
        for (content, ending) in split_lines(text) {
            wrap_line(content, ending, budget, &self.markers, &mut out);
        }
        out
    }
}

/// Byte length of the prefix of `s` that ends in a complete line terminator.
fn complete_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut end = bytes.len();
    if end > 0 && bytes[end - 1] == b'\r' {
        end -= 1;
    }
    bytes[..end]
        .iter()
        .rposition(|&b| b == b'\n' || b == b'\r')
        .map_or(0, |i| i + 1)
}

/// Split into `(content, terminator)` pairs; `\r\n`, `\n` and `\r` all end a line.
pub(crate) fn split_lines(text: &str) -> Vec<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push((&text[start..i], &text[i..i + 1]));
                i += 1;
                start = i;
            }
            b'\r' => {
                let end = if bytes.get(i + 1) == Some(&b'\n') { i + 2 } else { i + 1 };
                lines.push((&text[start..i], &text[i..end]));
                i = end;
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push((&text[start..], ""));
    }
    lines
}

/// Where one segment ends and the remainder begins.
struct Break {
    /// Chars of `current` emitted before pulled punctuation (trailing spaces dropped).
    part_len: usize,
    /// Index of the first pulled punctuation char.
    pull_start: usize,
    /// Number of punctuation chars pulled onto the segment.
    pull_len: usize,
}

impl Break {
    fn emitted_len(&self) -> usize {
        self.part_len + self.pull_len
    }
}

fn wrap_line(content: &str, ending: &str, budget: usize, markers: &str, out: &mut String) {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= budget {
        out.push_str(content);
        out.push_str(ending);
        return;
    }

    let mut current: &[char] = &chars;
    while current.len() > budget {
        let brk = choose_break(current, budget);
        out.extend(&current[..brk.part_len]);
        out.extend(&current[brk.pull_start..brk.pull_start + brk.pull_len]);
        if markers.is_empty() {
            out.push('\n');
        } else {
            out.push_str(markers);
        }

        let rest = &current[brk.pull_start + brk.pull_len..];
        current = &rest[leading_whitespace(rest)..];
    }

    out.extend(current);
    out.push_str(markers);
    out.push_str(ending);
}

fn choose_break(current: &[char], budget: usize) -> Break {
    let spaces = (1..=budget).rev().filter(|&i| current[i] == ' ');
    let hard = (1..=budget).rev();

    for split in spaces.chain(hard) {
        let brk = break_at(current, split, usize::MAX);
        if brk.part_len > 0 && brk.emitted_len() <= budget {
            return brk;
        }
    }

    // Nothing fits with its punctuation: break hard and pull only what fits.
    let part_len = budget - trailing_whitespace(&current[..budget]);
    break_at(current, budget, budget - part_len)
}

fn break_at(current: &[char], split: usize, max_pull: usize) -> Break {
    let part_len = split - trailing_whitespace(&current[..split]);
    let pull_start = split + leading_whitespace(&current[split..]);
    let pull_len = current[pull_start..]
        .iter()
        .take_while(|c| TRAILING_PUNCTUATION.contains(*c))
        .count()
        .min(max_pull);
    Break {
        part_len,
        pull_start,
        pull_len,
    }
}

fn leading_whitespace(chars: &[char]) -> usize {
    chars.iter().take_while(|c| c.is_whitespace()).count()
}

fn trailing_whitespace(chars: &[char]) -> usize {
    chars.iter().rev().take_while(|c| c.is_whitespace()).count()
}
