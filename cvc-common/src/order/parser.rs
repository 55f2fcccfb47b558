//! Order of worship parsing
//!
//! Turns the raw text a pastor types (one element per line) into an ordered
//! element list. Lines that exactly match an element already stored for the
//! date keep that element's identity and attached data; every other line is
//! classified and given a fresh, deterministic id.

use serde::Serialize;
use std::collections::HashSet;

use super::classifier::{classify, classify_fuzzy, FuzzyClassification};
use super::element::ServiceElement;

/// Non-blank, trimmed lines in their original order
pub fn order_lines(raw_text: &str) -> Vec<&str> {
    raw_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parse raw order-of-worship text into elements
///
/// One element per non-blank line, in line order. A line whose trimmed,
/// case-folded text equals an existing element's content reuses that
/// element's id, type, selection and reference (each existing element at most
/// once); its content is refreshed to the new line text.
pub fn parse_order(date: &str, raw_text: &str, existing: &[ServiceElement]) -> Vec<ServiceElement> {
    let lines = order_lines(raw_text);
    let mut claimed = vec![false; existing.len()];
    let mut used_ids: HashSet<String> = HashSet::new();

    // Reuse pass: settle every kept identity before minting new ids, so a
    // fresh id never takes one that a later line is about to reuse.
    let mut slots: Vec<(Option<ServiceElement>, bool)> = Vec::with_capacity(lines.len());
    for line in &lines {
        let key = line.to_lowercase();
        let found = existing.iter().enumerate().find(|(i, e)| {
            !claimed[*i] && e.has_content() && e.content.trim().to_lowercase() == key
        });

        match found {
            Some((i, prior)) => {
                claimed[i] = true;
                let keep_id = !prior.id.is_empty() && used_ids.insert(prior.id.clone());
                slots.push((
                    Some(ServiceElement {
                        id: prior.id.clone(),
                        content: line.to_string(),
                        required: prior.required,
                        kind: prior.kind.clone(),
                    }),
                    keep_id,
                ));
            }
            None => slots.push((None, false)),
        }
    }

    let mut reused = 0usize;
    let elements: Vec<ServiceElement> = lines
        .iter()
        .zip(slots)
        .map(|(line, slot)| match slot {
            (Some(element), true) => {
                reused += 1;
                element
            }
            (Some(mut element), false) => {
                element.id = unique_id(
                    element_id(date, element.element_type().as_str(), line),
                    &mut used_ids,
                );
                element
            }
            (None, _) => {
                let element_type = classify(line);
                let id = unique_id(element_id(date, element_type.as_str(), line), &mut used_ids);
                ServiceElement::new(id, *line, element_type)
            }
        })
        .collect();

    tracing::debug!(
        date = %date,
        elements = elements.len(),
        reused,
        "Parsed order of worship"
    );

    elements
}

/// Deterministic id from date, type and content (alphanumerics only)
pub fn element_id(date: &str, element_type: &str, content: &str) -> String {
    format!(
        "{}-{}-{}",
        sanitize(date),
        element_type,
        sanitize(content).to_lowercase()
    )
}

fn sanitize(text: &str) -> String {
    text.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Append `-1`, `-2`, ... until the id is unused, then claim it
fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// One line of a free-form custom service under review
#[derive(Debug, Clone, Serialize)]
pub struct ImportLine {
    pub content: String,
    #[serde(flatten)]
    pub classification: FuzzyClassification,
}

/// Classify every line of a custom service for human review
pub fn import_order(raw_text: &str) -> Vec<ImportLine> {
    order_lines(raw_text)
        .into_iter()
        .map(|line| ImportLine {
            content: line.to_string(),
            classification: classify_fuzzy(line),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::element::{ElementType, SongSelection};

    const DATE: &str = "10/19/26";

    #[test]
    fn test_one_element_per_non_blank_line() {
        let text = "Prelude\n\n  Opening Hymn:  \r\n\t\nFirst Reading:\nBlessing\n";
        let elements = parse_order(DATE, text, &[]);

        let contents: Vec<&str> = elements.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["Prelude", "Opening Hymn:", "First Reading:", "Blessing"]);
    }

    #[test]
    fn test_fresh_elements() {
        let elements = parse_order(DATE, "Opening Hymn:\nGospel:\nBlessing", &[]);

        assert_eq!(elements[0].element_type(), ElementType::SongHymn);
        assert!(elements[0].selection().is_none());
        assert!(elements[0].required);

        assert_eq!(elements[1].element_type(), ElementType::Reading);
        assert_eq!(elements[1].reference(), Some(""));

        assert_eq!(elements[2].element_type(), ElementType::Liturgy);
        assert!(!elements[2].required);
    }

    #[test]
    fn test_ids_are_deterministic() {
        let first = parse_order(DATE, "Opening Hymn:\nBlessing", &[]);
        let second = parse_order(DATE, "Opening Hymn:\nBlessing", &[]);
        assert_eq!(first, second);
        assert_eq!(first[0].id, "101926-song_hymn-openinghymn");
        assert_eq!(first[1].id, "101926-liturgy-blessing");
    }

    #[test]
    fn test_colliding_ids_get_suffixes() {
        let elements = parse_order(DATE, "Hymn:\nHymn:\nHYMN:", &[]);
        let ids: Vec<&str> = elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["101926-song_hymn-hymn", "101926-song_hymn-hymn-1", "101926-song_hymn-hymn-2"]
        );
    }

    #[test]
    fn test_reparse_keeps_identity_and_data() {
        let text = "Opening Hymn:\nFirst Reading:\nBlessing";
        let mut first = parse_order(DATE, text, &[]);
        first[0].set_selection(Some(SongSelection::hymn("Holy, Holy, Holy", Some("138"), None)));
        first[1].set_reference("Isaiah 6:1-8");

        let second = parse_order(DATE, text, &first);
        assert_eq!(second, first);
    }

    #[test]
    fn test_exact_match_is_case_insensitive_and_refreshes_content() {
        let mut prior = parse_order(DATE, "Opening Hymn:", &[]);
        prior[0].set_selection(Some(SongSelection::hymn("Lift High the Cross", None, None)));

        let next = parse_order(DATE, "  OPENING HYMN:", &prior);
        assert_eq!(next[0].id, prior[0].id);
        assert_eq!(next[0].content, "OPENING HYMN:");
        assert_eq!(next[0].chosen_song().unwrap().title, "Lift High the Cross");
    }

    #[test]
    fn test_existing_element_reused_once() {
        let prior = parse_order(DATE, "Hymn:", &[]);
        let next = parse_order(DATE, "Hymn:\nHymn:", &prior);

        assert_eq!(next[0].id, prior[0].id);
        assert_ne!(next[1].id, next[0].id);
    }

    #[test]
    fn test_fresh_id_avoids_reused_id_later_in_list() {
        // Stored element carries the id a fresh "Hymn:" would derive
        let mut stored = ServiceElement::new("101926-song_hymn-hymn", "Hymn: Old", ElementType::SongHymn);
        stored.set_selection(Some(SongSelection::hymn("Old", None, None)));

        let next = parse_order(DATE, "Hymn:\nHymn: Old", &[stored]);
        assert_eq!(next[1].id, "101926-song_hymn-hymn");
        assert_eq!(next[0].id, "101926-song_hymn-hymn-1");
    }

    #[test]
    fn test_duplicate_stored_ids_do_not_leak() {
        let a = ServiceElement::new("dup", "Prelude", ElementType::Liturgy);
        let b = ServiceElement::new("dup", "Postlude", ElementType::Liturgy);

        let next = parse_order(DATE, "Prelude\nPostlude", &[a, b]);
        assert_eq!(next[0].id, "dup");
        assert_ne!(next[1].id, "dup");
    }

    #[test]
    fn test_blank_existing_content_never_matches() {
        let blank = ServiceElement::new("blank", "", ElementType::SongHymn);
        let next = parse_order(DATE, "Blessing", &[blank]);
        assert_eq!(next[0].element_type(), ElementType::Liturgy);
        assert_ne!(next[0].id, "blank");
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_order(DATE, "", &[]).is_empty());
        assert!(parse_order(DATE, "\n  \n", &[]).is_empty());
    }

    #[test]
    fn test_import_order() {
        let lines = import_order("Prelude\nKyre\n\nSermon: Grace");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].classification.suggestion.is_none());
        assert!(lines[1].classification.suggestion.is_some());
        assert_eq!(lines[2].classification.element_type, ElementType::Message);
    }
}
