//! Streaming `<think>…</think>` extractor (spec §4.12, step 3c), active only
//! for the remainder of a turn in which no native `thinking` event has been
//! seen. Grounded on
//! `vtcode-core::llm::providers::shared::tag_sanitizer::TagStreamSanitizer`,
//! narrowed to the single tag pair the spec names.

const OPEN_TAG: &str = "<think>";
const CLOSE_TAG: &str = "</think>";

#[derive(Debug, Clone, PartialEq)]
pub enum ThinkEvent {
    Display(String),
    Reasoning(String),
}

/// Stateful, chunk-at-a-time parser: text outside `<think>` tags is
/// `Display`, text inside is `Reasoning`. Tags split across chunk
/// boundaries are buffered until they resolve.
#[derive(Debug, Default)]
pub struct ThinkTagParser {
    in_reasoning: bool,
    partial_tag: String,
}

impl ThinkTagParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_chunk(&mut self, chunk: &str) -> Vec<ThinkEvent> {
        let mut events = Vec::new();
        let mut pos = 0usize;
        let combined = format!("{}{}", self.partial_tag, chunk);
        self.partial_tag.clear();

        loop {
            if !self.in_reasoning {
                let Some(open_at) = combined[pos..].find(OPEN_TAG) else {
                    if let Some(bracket) = combined[pos..].rfind('<') {
                        let absolute = pos + bracket;
                        let candidate = &combined[absolute..];
                        if OPEN_TAG.starts_with(candidate) {
                            if absolute > pos {
                                events.push(ThinkEvent::Display(combined[pos..absolute].to_string()));
                            }
                            self.partial_tag = candidate.to_string();
                            return events;
                        }
                    }
                    if pos < combined.len() {
                        events.push(ThinkEvent::Display(combined[pos..].to_string()));
                    }
                    return events;
                };

                let absolute = pos + open_at;
                if absolute > pos {
                    events.push(ThinkEvent::Display(combined[pos..absolute].to_string()));
                }
                self.in_reasoning = true;
                pos = absolute + OPEN_TAG.len();
            } else {
                let Some(close_at) = combined[pos..].find(CLOSE_TAG) else {
                    if let Some(bracket) = combined[pos..].rfind('<') {
                        let absolute = pos + bracket;
                        let candidate = &combined[absolute..];
                        if CLOSE_TAG.starts_with(candidate) {
                            if absolute > pos {
                                events.push(ThinkEvent::Reasoning(combined[pos..absolute].to_string()));
                            }
                            self.partial_tag = candidate.to_string();
                            return events;
                        }
                    }
                    if pos < combined.len() {
                        events.push(ThinkEvent::Reasoning(combined[pos..].to_string()));
                    }
                    return events;
                };

                let absolute = pos + close_at;
                if absolute > pos {
                    events.push(ThinkEvent::Reasoning(combined[pos..absolute].to_string()));
                }
                self.in_reasoning = false;
                pos = absolute + CLOSE_TAG.len();
            }

            if pos >= combined.len() {
                return events;
            }
        }
    }

    pub fn finalize(self) -> Option<ThinkEvent> {
        if self.partial_tag.is_empty() {
            return None;
        }
        Some(if self.in_reasoning { ThinkEvent::Reasoning(self.partial_tag) } else { ThinkEvent::Display(self.partial_tag) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_complete_think_block_in_one_chunk() {
        let mut parser = ThinkTagParser::new();
        let events = parser.process_chunk("Hello <think>reasoning</think> world");
        assert_eq!(
            events,
            vec![
                ThinkEvent::Display("Hello ".to_string()),
                ThinkEvent::Reasoning("reasoning".to_string()),
                ThinkEvent::Display(" world".to_string()),
            ]
        );
    }

    #[test]
    fn handles_tags_split_across_chunk_boundaries() {
        let mut parser = ThinkTagParser::new();
        assert_eq!(parser.process_chunk("Hello <thi"), vec![ThinkEvent::Display("Hello ".to_string())]);
        assert_eq!(parser.process_chunk("nk>reason"), vec![ThinkEvent::Reasoning("reason".to_string())]);
        assert_eq!(parser.process_chunk("ing</thi"), vec![ThinkEvent::Reasoning("ing".to_string())]);
        assert_eq!(parser.process_chunk("nk> after"), vec![ThinkEvent::Display(" after".to_string())]);
    }

    #[test]
    fn text_with_no_tags_passes_through_untouched() {
        let mut parser = ThinkTagParser::new();
        assert_eq!(parser.process_chunk("plain text"), vec![ThinkEvent::Display("plain text".to_string())]);
    }
}
