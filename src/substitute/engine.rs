use super::matcher::{select_matcher_with, Matcher, MatcherBuilder, Strategy};
use crate::dictionary::TranslationMap;
use crate::errors::EngineError;
use crate::progress::{PhaseProgress, Reporter};
use crate::wrap::{LineWrapper, WrapConfig};

/// Bytes of content matched per step.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionOptions {
    /// Chunk size in bytes; rounded up to a character boundary.
    pub chunk_size: usize,
    /// Rewrap the output when set and not a no-op.
    pub wrap: Option<WrapConfig>,
    /// Strategy tried first.
    pub strategy: Strategy,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            wrap: None,
            strategy: Strategy::default(),
        }
    }
}

/// A configured substitution over one [`TranslationMap`].
///
/// Content is processed chunk by chunk. Each chunk is searched in a window
/// extended by `longest key - 1` bytes and only matches starting inside the
/// chunk are taken, so a key straddling a chunk boundary is still found and
/// the output equals a single pass over the whole content.
pub struct Substitution<'m> {
    keys: Vec<&'m str>,
    values: Vec<&'m str>,
    max_key_len: usize,
    options: SubstitutionOptions,
}

impl<'m> Substitution<'m> {
    pub fn new(map: &'m TranslationMap, options: SubstitutionOptions) -> Self {
        let keys = map.keys_by_length();
        let values = keys.iter().map(|k| map.get(k).unwrap_or(*k)).collect();
        let max_key_len = keys.first().map_or(0, |k| k.len());
        Self {
            keys,
            values,
            max_key_len,
            options,
        }
    }

    pub fn run(&self, content: &str, reporter: &dyn Reporter) -> Result<String, EngineError> {
        self.run_with(content, reporter, &Strategy::build)
    }

    /// [`run`](Self::run) with a custom matcher builder. The fallback strategy
    /// is built at most once, either up front or when a search fails.
    pub fn run_with(
        &self,
        content: &str,
        reporter: &dyn Reporter,
        build: &MatcherBuilder,
    ) -> Result<String, EngineError> {
        let (mut strategy, mut matcher) =
            select_matcher_with(&self.keys, self.options.strategy, build)?;
        let mut failed_over = strategy != self.options.strategy;
        log::debug!(
            "substituting {} key(s) over {} bytes with the {} matcher",
            self.keys.len(),
            content.len(),
            matcher.name()
        );

        let total = content.len();
        let chunk_size = self.options.chunk_size.max(1);
        let overlap = self.max_key_len.saturating_sub(1);
        let mut wrapper = self
            .options
            .wrap
            .clone()
            .filter(|w| !w.is_noop())
            .map(LineWrapper::new);

        let mut progress = PhaseProgress::new(reporter, total as u64);
        let mut out = String::with_capacity(total);
        let mut replacements = 0usize;
        let mut pos = 0;

        while pos < total {
            let chunk_end = ceil_char_boundary(content, pos.saturating_add(chunk_size));
            let window_end = ceil_char_boundary(content, chunk_end.saturating_add(overlap));
            let window = &content[pos..window_end];
            let limit = chunk_end - pos;

            let matches = match matcher.find_all(window) {
                Ok(matches) => matches,
                Err(err) if !failed_over => {
                    log::warn!("{err}; retrying chunk at byte {pos} with fallback matcher");
                    failed_over = true;
                    strategy = strategy.fallback();
                    matcher = build(strategy, &self.keys)?;
                    matcher.find_all(window)?
                }
                Err(err) => return Err(err.into()),
            };

            let mut replaced = String::with_capacity(window.len());
            let mut cursor = 0;
            for m in matches.iter().take_while(|m| m.start < limit) {
                replaced.push_str(&window[cursor..m.start]);
                replaced.push_str(self.values[m.key]);
                cursor = m.end;
                replacements += 1;
            }
            // A match may run past the chunk; the next chunk starts after it
            let consumed = cursor.max(limit);
            replaced.push_str(&window[cursor..consumed]);
            pos += consumed;

            match wrapper.as_mut() {
                Some(w) => out.push_str(&w.push(&replaced)),
                None => out.push_str(&replaced),
            }
            progress.advance_to(pos as u64);
        }

        if let Some(w) = wrapper {
            out.push_str(&w.finish());
        }
        progress.finish();

        log::info!(
            "{replacements} replacement(s) made with the {} matcher",
            matcher.name()
        );
        Ok(out)
    }
}

/// Substitute `content` with default chunking and the given wrap settings.
pub fn substitute(
    content: &str,
    map: &TranslationMap,
    wrap: Option<WrapConfig>,
    reporter: &dyn Reporter,
) -> Result<String, EngineError> {
    let options = SubstitutionOptions {
        wrap,
        ..SubstitutionOptions::default()
    };
    Substitution::new(map, options).run(content, reporter)
}

fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
