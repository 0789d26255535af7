use std::path::Path;

use anyhow::Result;
use whisper_rs::WhisperContext;

use crate::engine::Engine;
use crate::segments::Segment;
use crate::wav::get_samples_from_wav;

/// Marks that end a sentence (Latin and CJK).
const TERMINALS: [char; 7] = ['.', '!', '?', '…', '。', '！', '？'];

/// Characters that may trail a terminal mark without reopening the sentence.
const CLOSERS: [char; 8] = ['"', '\'', ')', ']', '”', '’', '」', '』'];

/// Engine variant that regroups whisper segments into sentence-shaped cues.
///
/// Raw whisper segments break on acoustic pauses, which often lands
/// mid-sentence. This variant merges segments until terminal punctuation
/// closes the cue and splits segments that carry several sentences, with
/// time allocated proportionally by character count.
pub struct StableEngine {
    ctx: WhisperContext,
}

impl StableEngine {
    pub fn new(ctx: WhisperContext) -> Self {
        Self { ctx }
    }
}

impl Engine for StableEngine {
    fn detect_language(&self, path: &Path) -> Result<String> {
        super::detect_language_from_file(&self.ctx, path)
    }

    fn transcribe(&self, path: &Path, language: &str) -> Result<Vec<Segment>> {
        let (samples, _spec) = get_samples_from_wav(path)?;
        let state = super::run_full(
            &self.ctx,
            super::transcription_params(language, false),
            &samples,
        )?;
        let segments = super::collect_segments(&state, language)?;
        Ok(regroup_sentences(segments))
    }
}

/// Regroup raw segments into sentence-shaped cues.
pub(crate) fn regroup_sentences(segments: Vec<Segment>) -> Vec<Segment> {
    let mut pieces = Vec::new();
    for segment in segments {
        pieces.extend(split_sentences(segment));
    }
    merge_incomplete(pieces)
}

/// Split a segment into one piece per sentence, keeping the total span.
///
/// Interior boundaries are placed proportionally by character count; the
/// first piece keeps the segment's start and the last keeps its end.
fn split_sentences(segment: Segment) -> Vec<Segment> {
    let pieces = split_text(&segment.text);
    let total_chars: usize = pieces.iter().map(|p| p.chars().count()).sum();
    if total_chars == 0 {
        // Whitespace-only segments produce no cue.
        return Vec::new();
    }

    let count = pieces.len();
    let duration = (segment.end_seconds - segment.start_seconds).max(0.0);
    let mut out = Vec::with_capacity(count);
    let mut cursor = segment.start_seconds;
    let mut consumed = 0usize;

    for (idx, text) in pieces.into_iter().enumerate() {
        consumed += text.chars().count();
        let end = if idx + 1 == count {
            segment.end_seconds
        } else {
            segment.start_seconds + duration * consumed as f32 / total_chars as f32
        };

        out.push(Segment {
            start_seconds: cursor,
            end_seconds: end,
            text,
            language_code: segment.language_code.clone(),
        });
        cursor = end;
    }

    out
}

/// Split text after each terminal mark (and its trailing closers).
fn split_text(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut terminal_seen = false;

    for ch in text.chars() {
        if terminal_seen
            && !ch.is_whitespace()
            && !TERMINALS.contains(&ch)
            && !CLOSERS.contains(&ch)
        {
            push_piece(&mut pieces, &mut current);
            terminal_seen = false;
        }

        current.push(ch);
        if TERMINALS.contains(&ch) {
            terminal_seen = true;
        }
    }
    push_piece(&mut pieces, &mut current);

    pieces
}

fn push_piece(pieces: &mut Vec<String>, current: &mut String) {
    let piece = std::mem::take(current);
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_owned());
    }
}

/// Merge each cue that ends mid-sentence with the pieces that follow it,
/// until a terminal mark closes the cue. A trailing unterminated cue is kept.
fn merge_incomplete(pieces: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for piece in pieces {
        match out.last_mut() {
            Some(open) if !ends_sentence(&open.text) => {
                open.text.push(' ');
                open.text.push_str(&piece.text);
                open.end_seconds = piece.end_seconds;
            }
            _ => out.push(piece),
        }
    }
    out
}

fn ends_sentence(text: &str) -> bool {
    for ch in text.chars().rev() {
        if CLOSERS.contains(&ch) || ch.is_whitespace() {
            continue;
        }
        return TERMINALS.contains(&ch);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f32, end: f32, text: &str) -> Segment {
        Segment {
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
            language_code: "en".to_string(),
        }
    }

    fn close_to(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn merges_sentence_split_across_segments() {
        let out = regroup_sentences(vec![
            seg(0.0, 1.0, " This is"),
            seg(1.0, 2.0, " a sentence."),
        ]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "This is a sentence.");
        assert_eq!(out[0].start_seconds, 0.0);
        assert_eq!(out[0].end_seconds, 2.0);
    }

    #[test]
    fn splits_multi_sentence_segment_proportionally() {
        let out = regroup_sentences(vec![seg(0.0, 4.0, "One. Two.")]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "One.");
        assert_eq!(out[1].text, "Two.");
        // Both sentences are four characters, so the boundary sits midway.
        assert!(close_to(out[0].end_seconds, 2.0));
        assert!(close_to(out[1].start_seconds, 2.0));
        assert_eq!(out[1].end_seconds, 4.0);
    }

    #[test]
    fn split_weights_by_character_count() {
        let out = regroup_sentences(vec![seg(0.0, 8.0, "Hi. A much longer one.")]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "Hi.");
        // "Hi." carries 3 of the 21 trimmed characters.
        assert!(close_to(out[0].end_seconds, 8.0 * 3.0 / 21.0));
    }

    #[test]
    fn cjk_terminals_close_sentences() {
        let out = regroup_sentences(vec![seg(0.0, 1.0, "你好。"), seg(1.0, 2.0, "世界。")]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "你好。");
        assert_eq!(out[1].text, "世界。");
    }

    #[test]
    fn closing_quote_does_not_reopen_sentence() {
        let out = regroup_sentences(vec![
            seg(0.0, 2.0, "He said \"stop.\""),
            seg(2.0, 3.0, " Then left."),
        ]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "He said \"stop.\"");
        assert_eq!(out[1].text, "Then left.");
    }

    #[test]
    fn trailing_unterminated_cue_is_kept() {
        let out = regroup_sentences(vec![seg(0.0, 1.0, "Done."), seg(1.0, 2.0, " and then")]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[1].text, "and then");
        assert_eq!(out[1].end_seconds, 2.0);
    }

    #[test]
    fn whitespace_only_segments_are_dropped() {
        let out = regroup_sentences(vec![seg(0.0, 1.0, "  "), seg(1.0, 2.0, "Fine.")]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "Fine.");
    }

    #[test]
    fn ellipsis_counts_as_a_terminal() {
        let out = regroup_sentences(vec![seg(0.0, 2.0, "Wait... go on.")]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "Wait...");
        assert_eq!(out[1].text, "go on.");
    }

    #[test]
    fn empty_input_yields_no_cues() {
        assert!(regroup_sentences(Vec::new()).is_empty());
    }
}
