//! Section tracker — ordered section bookkeeping.
//!
//! Owns the selection of the next section requiring research and the
//! copy-on-write application of written content. The input sequence is
//! never mutated.

use crate::types::Section;

/// Tracks section completion across the run.
pub struct SectionTracker;

impl SectionTracker {
    /// Index of the first incomplete section, or `None` if all are done.
    pub fn next_researchable_section(sections: &[Section]) -> Option<usize> {
        sections.iter().position(|s| !s.completed)
    }

    /// Return a new sequence with the section at `index` carrying `content`
    /// and marked completed; all other elements are unchanged.
    ///
    /// An out-of-range index returns a plain copy of the input.
    pub fn apply_written_content(
        sections: &[Section],
        index: usize,
        content: impl Into<String>,
    ) -> Vec<Section> {
        let mut updated = sections.to_vec();
        if let Some(section) = updated.get_mut(index) {
            section.content = content.into();
            section.completed = true;
        }
        updated
    }
}
