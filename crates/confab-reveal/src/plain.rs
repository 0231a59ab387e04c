use crate::token::split_preserving_whitespace;

/// Cursor over the token stream of one plain-text reveal.
///
/// Each call to [`PlainJob::next_batch`] yields the next run of tokens to
/// append. The cursor never passes the end of the token list.
#[derive(Debug)]
pub struct PlainJob {
    tokens: Vec<String>,
    cursor: usize,
    tokens_per_tick: usize,
}

impl PlainJob {
    pub fn new(text: &str, tokens_per_tick: usize) -> Self {
        Self {
            tokens: split_preserving_whitespace(text),
            cursor: 0,
            tokens_per_tick: tokens_per_tick.max(1),
        }
    }

    /// The next batch of tokens joined into one string, or `None` when the
    /// text is exhausted.
    pub fn next_batch(&mut self) -> Option<String> {
        if self.is_finished() {
            return None;
        }
        let end = (self.cursor + self.tokens_per_tick).min(self.tokens.len());
        let batch = self.tokens[self.cursor..end].concat();
        self.cursor = end;
        Some(batch)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Number of ticks this job will take from its current position.
    pub fn remaining_ticks(&self) -> usize {
        let remaining = self.tokens.len() - self.cursor;
        remaining.div_ceil(self.tokens_per_tick)
    }
}
