// =============================================================================
// PROMPT ASSEMBLY MODULE
// =============================================================================
//
// Builds the single instruction string sent to the feedback generator from
// three pieces of context:
// 1. The entry being submitted right now
// 2. The last few prior entries (history), excluding the submission date
// 3. Reference documents pulled from an external folder
//
// Everything here is deterministic string assembly, which keeps the whole
// prompt testable without a network.

use crate::core::diary::DiaryRecord;
use crate::core::reference::ReferenceDocument;

/// Rendered when the diary has no prior entries to show.
pub const NO_HISTORY: &str = "(no previous entries yet)";

/// Rendered when the reference folder is empty or not configured.
pub const NO_FILES: &str = "(no reference files)";

/// How many prior entries the history section carries at most.
pub const HISTORY_LIMIT: usize = 5;

/// Default persona for the feedback request, carried over from the original
/// tool: a supportive conversation partner that reflects rather than judges.
pub const DEFAULT_PERSONA: &str = "You are a trusted conversation partner who helps \
the user organize their thinking. Respond to the diary entry below with positive, \
objective feedback, practical advice, and the occasional thought-provoking question.";

/// Renders the last `max_count` entries (in store order) whose date differs
/// from `exclude_date` as date/diary blocks.
pub fn build_history(records: &[DiaryRecord], exclude_date: &str, max_count: usize) -> String {
    let selected: Vec<&DiaryRecord> = records
        .iter()
        .filter(|r| r.date != exclude_date)
        .collect();

    // Last N in store order, oldest of the window first.
    let window = &selected[selected.len().saturating_sub(max_count)..];

    if window.is_empty() {
        return NO_HISTORY.to_string();
    }

    window
        .iter()
        .map(|r| format!("[{}]\n{}", r.date, r.diary))
        .collect::<Vec<String>>()
        .join("\n\n")
}

/// Concatenates reference documents into labeled blocks.
///
/// Documents with unsupported types still appear here: the folder client
/// substitutes a placeholder content string, so nothing is silently dropped.
pub fn build_reference_context(documents: &[ReferenceDocument]) -> String {
    if documents.is_empty() {
        return NO_FILES.to_string();
    }

    documents
        .iter()
        .map(|d| format!("--- {} ---\n{}", d.name, d.content))
        .collect::<Vec<String>>()
        .join("\n\n")
}

/// Combines persona, today's entry, history, and reference notes into the
/// final instruction string.
pub fn compose_prompt(persona: &str, diary: &str, history: &str, reference: &str) -> String {
    format!(
        "{persona}\n\n\
        ## Today's diary entry\n{diary}\n\n\
        ## Recent entries\n{history}\n\n\
        ## Reference notes\n{reference}\n\n\
        Keep the response to roughly 150 words, structured as:\n\
        1. An objective recap of what happened.\n\
        2. Actionable suggestions (leave this part out if none genuinely apply).\n"
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, diary: &str) -> DiaryRecord {
        DiaryRecord {
            date: date.to_string(),
            diary: diary.to_string(),
            feedback: String::new(),
        }
    }

    fn doc(name: &str, content: &str) -> ReferenceDocument {
        ReferenceDocument {
            name: name.to_string(),
            mime_type: "text/plain".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn history_excludes_the_submission_date() {
        let records = vec![
            record("2024-01-01", "one"),
            record("2024-01-02", "two"),
            record("2024-01-03", "three"),
        ];

        let history = build_history(&records, "2024-01-02", HISTORY_LIMIT);

        assert!(!history.contains("2024-01-02"));
        assert!(history.contains("[2024-01-01]\none"));
        assert!(history.contains("[2024-01-03]\nthree"));
    }

    #[test]
    fn history_is_capped_at_max_count() {
        let records: Vec<DiaryRecord> = (1..=9)
            .map(|d| record(&format!("2024-01-{:02}", d), &format!("entry {d}")))
            .collect();

        let history = build_history(&records, "2024-01-09", 5);

        // Last five surviving entries: 04..08.
        for d in 4..=8 {
            assert!(history.contains(&format!("2024-01-{:02}", d)));
        }
        assert!(!history.contains("2024-01-03"));
        assert!(!history.contains("2024-01-09"));
    }

    #[test]
    fn empty_history_renders_the_sentinel() {
        assert_eq!(build_history(&[], "2024-01-01", 5), NO_HISTORY);

        // A store holding only today's entry has nothing to show either.
        let only_today = vec![record("2024-01-01", "today")];
        assert_eq!(build_history(&only_today, "2024-01-01", 5), NO_HISTORY);
    }

    #[test]
    fn empty_document_list_renders_the_sentinel() {
        let text = build_reference_context(&[]);
        assert_eq!(text, NO_FILES);
        assert!(!text.is_empty());
    }

    #[test]
    fn documents_are_labeled_and_delimited() {
        let docs = vec![doc("goals.txt", "ship it"), doc("notes", "remember this")];

        let text = build_reference_context(&docs);

        assert!(text.contains("--- goals.txt ---\nship it"));
        assert!(text.contains("--- notes ---\nremember this"));
    }

    #[test]
    fn placeholder_content_survives_assembly() {
        let docs = vec![ReferenceDocument {
            name: "photo.png".to_string(),
            mime_type: "image/png".to_string(),
            content: "(unsupported file type: image/png)".to_string(),
        }];

        let text = build_reference_context(&docs);
        assert!(text.contains("photo.png"));
        assert!(text.contains("(unsupported file type: image/png)"));
    }

    #[test]
    fn composed_prompt_is_deterministic_and_complete() {
        let a = compose_prompt(DEFAULT_PERSONA, "wrote rust", "[2024-01-01]\nran", NO_FILES);
        let b = compose_prompt(DEFAULT_PERSONA, "wrote rust", "[2024-01-01]\nran", NO_FILES);

        assert_eq!(a, b);
        assert!(a.contains(DEFAULT_PERSONA));
        assert!(a.contains("wrote rust"));
        assert!(a.contains("[2024-01-01]\nran"));
        assert!(a.contains(NO_FILES));
        assert!(a.contains("150 words"));
    }
}
