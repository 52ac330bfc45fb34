//! Incremental sentence segmentation over a growing text buffer.
//!
//! Boundaries follow Unicode sentence segmentation (UAX #29). Trailing
//! whitespace stays attached to the sentence it follows, so concatenating
//! every emitted sentence and the final remainder reproduces the input.

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Default)]
pub struct SentenceBuffer {
    buffer: String,
}

impl SentenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and take every sentence that is now complete.
    ///
    /// The last segment is always held back: it may still grow. Segments
    /// that are only whitespace are folded into the sentence that follows.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);

        let bounds: Vec<(usize, usize, bool)> = self
            .buffer
            .split_sentence_bound_indices()
            .map(|(start, segment)| (start, start + segment.len(), segment.trim().is_empty()))
            .collect();
        if bounds.len() <= 1 {
            return Vec::new();
        }

        let mut sentences = Vec::new();
        let mut emitted = 0;
        for &(_, end, blank) in &bounds[..bounds.len() - 1] {
            if blank {
                continue;
            }
            sentences.push(self.buffer[emitted..end].to_string());
            emitted = end;
        }
        self.buffer.replace_range(..emitted, "");
        sentences
    }

    /// Consume the buffer, returning whatever is left.
    pub fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fragments: &[&str]) -> (Vec<String>, String) {
        let mut buffer = SentenceBuffer::new();
        let mut sentences = Vec::new();
        for fragment in fragments {
            sentences.extend(buffer.push(fragment));
        }
        (sentences, buffer.finish())
    }

    #[test]
    fn test_single_sentence_is_held_until_next_begins() {
        let mut buffer = SentenceBuffer::new();
        assert!(buffer.push("Hello").is_empty());
        assert!(buffer.push(" world.").is_empty());
        assert_eq!(buffer.push(" How"), vec!["Hello world. ".to_string()]);
        assert_eq!(buffer.finish(), "How");
    }

    #[test]
    fn test_no_break_before_lowercase_continuation() {
        // A period followed by a lowercase word is not a sentence end.
        let (sentences, rest) = run(&["Halfway. ", "there"]);
        assert!(sentences.is_empty());
        assert_eq!(rest, "Halfway. there");

        let (sentences, rest) = run(&["Halfway. ", "There"]);
        assert_eq!(sentences, vec!["Halfway. "]);
        assert_eq!(rest, "There");
    }

    #[test]
    fn test_flush_returns_unterminated_tail() {
        let (sentences, rest) = run(&["Hello", " world.", " How are", " you?", " Fine"]);
        assert_eq!(sentences, vec!["Hello world. ", "How are you? "]);
        assert_eq!(rest, "Fine");
    }

    #[test]
    fn test_multiple_sentences_in_one_fragment() {
        let (sentences, rest) = run(&["Hi there. How are you? I am", " fine."]);
        assert_eq!(sentences, vec!["Hi there. ", "How are you? "]);
        assert_eq!(rest, "I am fine.");
    }

    #[test]
    fn test_cjk_terminators() {
        let (sentences, rest) = run(&["你好。", "我很好"]);
        assert_eq!(sentences, vec!["你好。"]);
        assert_eq!(rest, "我很好");
    }

    #[test]
    fn test_concatenation_is_lossless() {
        let inputs: [&[&str]; 5] = [
            &["One. Two. Three."],
            &["O", "ne", ". ", "Two", "! Th", "ree?", " "],
            &["\n\nLeading blank lines. ", "Then text"],
            &["No terminator at all"],
            &["", "Empty fragments. ", "", "Are fine."],
        ];
        for fragments in inputs {
            let (sentences, rest) = run(fragments);
            let joined: String = sentences.concat() + &rest;
            assert_eq!(joined, fragments.concat(), "fragments: {fragments:?}");
        }
    }

    #[test]
    fn test_blank_segments_are_not_emitted_alone() {
        let (sentences, _) = run(&["\n\nFirst line.\n\n", "Second line."]);
        assert!(sentences.iter().all(|s| !s.trim().is_empty()));
    }
}
