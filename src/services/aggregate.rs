//! Groups term records into per-concept embedding input text.

use crate::models::{ConceptText, TERM_SEPARATOR, TermRecord};
use crate::utils::text::truncate_chars;

/// Incremental group-by over a concept-ordered row scan.
///
/// Feed rows ordered by `concept_id`; whenever the concept changes, the
/// previous group is emitted as a [`ConceptText`]. Within a group, duplicate
/// names are dropped (first occurrence wins), the survivors are joined with
/// `"; "` and the result truncated to a prefix of `max_chars` characters.
/// The `standard_concept_id` carried is the first seen for the group.
pub struct TermAggregator {
    max_chars: usize,
    current: Option<Group>,
}

struct Group {
    concept_id: i32,
    standard_concept_id: i32,
    names: Vec<String>,
}

impl TermAggregator {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            current: None,
        }
    }

    /// Push the next row; returns the completed previous group, if any.
    pub fn push(&mut self, record: TermRecord) -> Option<ConceptText> {
        if let Some(group) = self.current.as_mut() {
            if group.concept_id == record.concept_id {
                if !group.names.contains(&record.concept_name) {
                    group.names.push(record.concept_name);
                }
                return None;
            }
        }

        let finished = self.emit();
        self.current = Some(Group {
            concept_id: record.concept_id,
            standard_concept_id: record.standard_concept_id,
            names: vec![record.concept_name],
        });
        finished
    }

    /// Emit the final group after the scan is exhausted.
    pub fn finish(&mut self) -> Option<ConceptText> {
        self.emit()
    }

    fn emit(&mut self) -> Option<ConceptText> {
        let group = self.current.take()?;
        let joined = group.names.join(TERM_SEPARATOR);
        Some(ConceptText {
            concept_id: group.concept_id,
            standard_concept_id: group.standard_concept_id,
            text: truncate_chars(&joined, self.max_chars).to_string(),
        })
    }
}
