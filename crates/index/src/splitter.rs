//! Sentence-aware chunking.
//!
//! Text is cut into sentences (terminal punctuation followed by whitespace,
//! or a blank line), then sentences are packed greedily into chunks of at
//! most `chunk_size` whitespace tokens. Consecutive chunks share whole
//! trailing sentences worth up to `chunk_overlap` tokens. Every chunk
//! records its byte span in the source text.

use serde::{Deserialize, Serialize};
use zonewatch_core::zone::ZoneId;

/// One chunk (node) of a zone document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub zone_id: ZoneId,
    pub index: usize,
    pub text: String,
    /// Byte offset of the first byte in the source text
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSplitter {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// A sentence (or sentence piece) with its span and token count.
#[derive(Debug, Clone, Copy)]
struct Unit {
    start: usize,
    end: usize,
    tokens: usize,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
        }
    }
}

impl SentenceSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    pub fn split(&self, zone_id: &ZoneId, text: &str) -> Vec<Chunk> {
        let units: Vec<Unit> = sentence_spans(text)
            .into_iter()
            .flat_map(|(start, end)| self.fit_sentence(text, start, end))
            .collect();

        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut current: Vec<Unit> = Vec::new();
        let mut current_tokens = 0;

        for unit in units {
            if current_tokens + unit.tokens > self.chunk_size && !current.is_empty() {
                spans.push((current[0].start, current[current.len() - 1].end));
                current = self.carry_overlap(&current);
                current_tokens = current.iter().map(|u| u.tokens).sum();
                // Make room for the new unit by dropping carried sentences
                while current_tokens + unit.tokens > self.chunk_size && !current.is_empty() {
                    current_tokens -= current.remove(0).tokens;
                }
            }
            current_tokens += unit.tokens;
            current.push(unit);
        }
        if !current.is_empty() {
            spans.push((current[0].start, current[current.len() - 1].end));
        }

        spans
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| Chunk {
                id: format!("{zone_id}-{index}"),
                zone_id: zone_id.clone(),
                index,
                text: text[start..end].to_string(),
                start,
                end,
            })
            .collect()
    }

    /// Trailing whole units of a finished chunk that fit in the overlap budget.
    fn carry_overlap(&self, chunk: &[Unit]) -> Vec<Unit> {
        let mut carried = Vec::new();
        let mut tokens = 0;
        // Never carry the whole chunk, or the next one would repeat it
        for unit in chunk.iter().skip(1).rev() {
            if tokens + unit.tokens > self.chunk_overlap {
                break;
            }
            tokens += unit.tokens;
            carried.insert(0, *unit);
        }
        carried
    }

    /// Split an over-long sentence on token boundaries.
    fn fit_sentence(&self, text: &str, start: usize, end: usize) -> Vec<Unit> {
        let tokens = token_spans(&text[start..end]);
        if tokens.len() <= self.chunk_size {
            return vec![Unit {
                start,
                end,
                tokens: tokens.len(),
            }];
        }
        tokens
            .chunks(self.chunk_size)
            .map(|piece| Unit {
                start: start + piece[0].0,
                end: start + piece[piece.len() - 1].1,
                tokens: piece.len(),
            })
            .collect()
    }
}

/// Byte spans of sentences, trimmed of surrounding whitespace.
fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if start.is_none() {
            if c.is_whitespace() {
                continue;
            }
            start = Some(i);
        }

        let next = chars.peek().map(|(_, n)| *n);
        let ends_sentence = matches!(c, '.' | '!' | '?') && next.is_none_or(char::is_whitespace);
        let blank_line = c == '\n' && text[i + 1..].trim_start_matches([' ', '\t', '\r']).starts_with('\n');

        if ends_sentence || blank_line {
            if let Some(s) = start.take() {
                let end = if blank_line { i } else { i + c.len_utf8() };
                push_trimmed(text, s, end, &mut spans);
            }
        }
    }
    if let Some(s) = start {
        push_trimmed(text, s, text.len(), &mut spans);
    }
    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    let slice = &text[start..end];
    let trimmed = slice.trim_end();
    if !trimmed.trim_start().is_empty() {
        spans.push((start, start + trimmed.len()));
    }
}

/// Byte spans of whitespace-separated tokens.
fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}
