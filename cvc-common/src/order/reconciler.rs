//! Reconciliation of an edited order of worship against stored work
//!
//! Every pastor save replaces the whole element list for a date. Before that
//! happens the freshly parsed list is merged with the list currently stored,
//! so that song picks and reading references recorded by other volunteers
//! survive when their slot still exists in the new order.
//!
//! Slot correspondence:
//! - a new element that already carries a stored element's id and data (the
//!   parser kept it because its line was unchanged) stays as it is and claims
//!   that stored element
//! - songs match by label prefix first ("Opening Hymn"), then by position
//!   among song elements for slots that were renamed
//! - readings and messages match by label prefix only
//!
//! Each stored element feeds at most one new element. Among stored elements
//! sharing a prefix the first unclaimed one in stored order wins. The output
//! always has the same length and order as the new list.

use serde::Serialize;
use std::collections::HashSet;

use super::element::ServiceElement;

/// What reconciliation carried over, for logging and API responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Song picks the parser already kept with their slot id
    pub songs_by_identity: usize,
    /// Song picks matched by identical label prefix
    pub songs_by_prefix: usize,
    /// Song picks matched by ordinal position among song elements
    pub songs_by_position: usize,
    /// Reading/sermon references copied into empty new slots
    pub references_restored: usize,
}

impl ReconcileReport {
    pub fn songs_kept(&self) -> usize {
        self.songs_by_identity + self.songs_by_prefix + self.songs_by_position
    }
}

/// Merge stored song picks and references into a new element list
pub fn reconcile(new_elements: &[ServiceElement], prior: &[ServiceElement]) -> Vec<ServiceElement> {
    reconcile_with_report(new_elements, prior).0
}

/// [`reconcile`], also reporting what was carried over
pub fn reconcile_with_report(
    new_elements: &[ServiceElement],
    prior: &[ServiceElement],
) -> (Vec<ServiceElement>, ReconcileReport) {
    let prior_songs: Vec<&ServiceElement> = prior
        .iter()
        .filter(|e| e.element_type().is_song() && e.has_content() && e.chosen_song().is_some())
        .collect();
    let prior_readings: Vec<&ServiceElement> = prior
        .iter()
        .filter(|e| {
            e.element_type().accepts_reference() && e.has_content() && e.filled_reference().is_some()
        })
        .collect();

    let mut report = ReconcileReport::default();
    let song_matches = match_songs(new_elements, &prior_songs, &mut report);

    // Readings the parser kept hold their own stored element
    let kept_readings: Vec<bool> = new_elements
        .iter()
        .map(|e| e.filled_reference().is_some() && prior_readings.iter().any(|r| r.id == e.id))
        .collect();
    let mut reading_claimed: Vec<bool> = prior_readings
        .iter()
        .map(|r| {
            new_elements
                .iter()
                .zip(&kept_readings)
                .any(|(e, kept)| *kept && e.id == r.id)
        })
        .collect();
    let mut taken_ids: HashSet<&str> = new_elements.iter().map(|e| e.id.as_str()).collect();

    let merged = new_elements
        .iter()
        .zip(song_matches)
        .zip(kept_readings)
        .map(|((element, song_match), kept_reading)| {
            let element_type = element.element_type();
            let mut merged = element.clone();

            if element_type.is_song() {
                if let Some(source) = song_match.map(|j| prior_songs[j]) {
                    if let Some(selection) = source.chosen_song() {
                        merged.content = format!("{}: {}", element.label(), selection.formatted_detail());
                        merged.set_selection(Some(selection.clone()));
                    }
                    if !source.id.is_empty() && taken_ids.insert(source.id.as_str()) {
                        merged.id = source.id.clone();
                    }
                }
            } else if element_type.accepts_reference() && element.has_content() && !kept_reading {
                let prefix = element.slot_prefix();
                let found = prior_readings
                    .iter()
                    .enumerate()
                    .find(|(j, r)| !reading_claimed[*j] && r.slot_prefix() == prefix)
                    .map(|(j, r)| (j, *r));

                if let Some((j, source)) = found {
                    reading_claimed[j] = true;
                    // A reference typed into the new order wins
                    if element.filled_reference().is_none() {
                        if let Some(reference) = source.filled_reference() {
                            merged.set_reference(reference);
                            report.references_restored += 1;
                        }
                    }
                }
            }

            merged
        })
        .collect();

    tracing::debug!(
        songs_by_identity = report.songs_by_identity,
        songs_by_prefix = report.songs_by_prefix,
        songs_by_position = report.songs_by_position,
        references_restored = report.references_restored,
        "Reconciled order of worship"
    );

    (merged, report)
}

/// For each new element, the index into `prior_songs` it inherits from
///
/// Elements that already hold a song pick are never re-matched; they claim
/// the stored element with their own id. Prefix matches are settled for the
/// whole list before any positional fallback, so a renamed slot never takes a
/// pick whose label still exists.
fn match_songs(
    new_elements: &[ServiceElement],
    prior_songs: &[&ServiceElement],
    report: &mut ReconcileReport,
) -> Vec<Option<usize>> {
    let mut matches: Vec<Option<usize>> = vec![None; new_elements.len()];
    let mut claimed = vec![false; prior_songs.len()];
    let kept: Vec<bool> = new_elements
        .iter()
        .map(|e| e.element_type().is_song() && e.chosen_song().is_some())
        .collect();

    for (element, _) in new_elements.iter().zip(&kept).filter(|(_, k)| **k) {
        if let Some(j) = prior_songs.iter().position(|p| p.id == element.id) {
            claimed[j] = true;
            report.songs_by_identity += 1;
        }
    }

    for (i, element) in new_elements.iter().enumerate() {
        if kept[i] || !element.element_type().is_song() || !element.has_content() {
            continue;
        }
        let prefix = element.slot_prefix();
        if let Some(j) = (0..prior_songs.len())
            .find(|&j| !claimed[j] && prior_songs[j].slot_prefix() == prefix)
        {
            claimed[j] = true;
            matches[i] = Some(j);
            report.songs_by_prefix += 1;
        }
    }

    let song_positions = new_elements
        .iter()
        .enumerate()
        .filter(|(_, e)| e.element_type().is_song())
        .map(|(i, _)| i);

    for (ordinal, i) in song_positions.enumerate() {
        if kept[i] || matches[i].is_some() || !new_elements[i].has_content() {
            continue;
        }
        if ordinal < prior_songs.len() && !claimed[ordinal] {
            claimed[ordinal] = true;
            matches[i] = Some(ordinal);
            report.songs_by_position += 1;
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::element::{ElementType, SongSelection};

    fn song(id: &str, content: &str, title: &str) -> ServiceElement {
        let mut e = ServiceElement::new(id, content, ElementType::SongHymn);
        e.set_selection(Some(SongSelection::hymn(title, None, None)));
        e
    }

    fn reading(id: &str, content: &str, reference: &str) -> ServiceElement {
        let mut e = ServiceElement::new(id, content, ElementType::Reading);
        e.set_reference(reference);
        e
    }

    #[test]
    fn test_prefix_match_keeps_selection_and_id() {
        let prior = vec![song("old", "Opening Hymn: Holy God", "Holy God")];
        let new = vec![ServiceElement::new("new", "opening hymn:", ElementType::SongHymn)];

        let merged = reconcile(&new, &prior);
        assert_eq!(merged[0].chosen_song().unwrap().title, "Holy God");
        assert_eq!(merged[0].content, "opening hymn: Holy God");
        assert_eq!(merged[0].id, "old");
    }

    #[test]
    fn test_positional_fallback_after_rename() {
        let prior = vec![
            song("a", "Opening Hymn: A", "A"),
            song("b", "Hymn of the Day: B", "B"),
        ];
        let new = vec![
            ServiceElement::new("n1", "Opening Hymn:", ElementType::SongHymn),
            ServiceElement::new("n2", "Sermon Hymn:", ElementType::SongHymn),
        ];

        let (merged, report) = reconcile_with_report(&new, &prior);
        assert_eq!(merged[1].chosen_song().unwrap().title, "B");
        assert_eq!(merged[1].content, "Sermon Hymn: B");
        assert_eq!(report.songs_by_prefix, 1);
        assert_eq!(report.songs_by_position, 1);
    }

    #[test]
    fn test_position_does_not_steal_prefix_match() {
        // The renamed slot comes first, but "Opening Hymn" still exists later
        let prior = vec![song("a", "Opening Hymn: A", "A")];
        let new = vec![
            ServiceElement::new("n1", "Gathering Hymn:", ElementType::SongHymn),
            ServiceElement::new("n2", "Opening Hymn:", ElementType::SongHymn),
        ];

        let merged = reconcile(&new, &prior);
        assert!(merged[0].selection().is_none());
        assert_eq!(merged[1].chosen_song().unwrap().title, "A");
    }

    #[test]
    fn test_duplicate_prefixes_claim_in_scan_order() {
        let prior = vec![song("a", "Hymn: A", "A"), song("b", "Hymn: B", "B")];
        let new = vec![
            ServiceElement::new("n1", "Hymn:", ElementType::SongHymn),
            ServiceElement::new("n2", "Hymn:", ElementType::SongHymn),
        ];

        let merged = reconcile(&new, &prior);
        assert_eq!(merged[0].chosen_song().unwrap().title, "A");
        assert_eq!(merged[1].chosen_song().unwrap().title, "B");
    }

    #[test]
    fn test_no_match_leaves_slot_awaiting_selection() {
        let prior = vec![song("a", "Opening Hymn: A", "A")];
        let new = vec![
            ServiceElement::new("n1", "Opening Hymn:", ElementType::SongHymn),
            ServiceElement::new("n2", "Sending Song:", ElementType::SongHymn),
        ];

        let merged = reconcile(&new, &prior);
        assert!(merged[1].selection().is_none());
        assert_eq!(merged[1].content, "Sending Song:");
    }

    #[test]
    fn test_prior_songs_without_title_are_ignored() {
        let mut blank = ServiceElement::new("a", "Opening Hymn:", ElementType::SongHymn);
        blank.set_selection(Some(SongSelection::hymn("", None, None)));
        let new = vec![ServiceElement::new("n1", "Opening Hymn:", ElementType::SongHymn)];

        let merged = reconcile(&new, &[blank]);
        assert!(merged[0].selection().is_none());
        assert_eq!(merged[0].id, "n1");
    }

    #[test]
    fn test_reference_restored_into_empty_slot() {
        let prior = vec![reading("r", "First Reading:", "Isaiah 6:1-8")];
        let new = vec![ServiceElement::new("n", "First Reading:", ElementType::Reading)];

        let (merged, report) = reconcile_with_report(&new, &prior);
        assert_eq!(merged[0].reference(), Some("Isaiah 6:1-8"));
        assert_eq!(report.references_restored, 1);
    }

    #[test]
    fn test_explicit_reference_not_overwritten() {
        let prior = vec![reading("r", "Gospel:", "John 3:16")];
        let new = vec![reading("n", "Gospel: Mark 1", "Mark 1:1-8")];

        let merged = reconcile(&new, &prior);
        assert_eq!(merged[0].reference(), Some("Mark 1:1-8"));
    }

    #[test]
    fn test_message_reference_restored() {
        let mut sermon = ServiceElement::new("m", "Sermon:", ElementType::Message);
        sermon.set_reference("Living Water");
        let new = vec![ServiceElement::new("n", "Sermon:", ElementType::Message)];

        let merged = reconcile(&new, &[sermon]);
        assert_eq!(merged[0].reference(), Some("Living Water"));
    }

    #[test]
    fn test_no_cross_type_leakage() {
        let prior = vec![
            song("s", "Gospel: Song", "Gospel Song"),
            reading("r", "Opening Hymn:", "Psalm 100"),
        ];
        let new = vec![
            ServiceElement::new("n1", "Gospel:", ElementType::Reading),
            ServiceElement::new("n2", "Opening Hymn:", ElementType::SongHymn),
        ];

        let merged = reconcile(&new, &prior);
        assert!(merged[0].selection().is_none());
        assert_eq!(merged[0].reference(), Some(""));
        assert!(merged[1].reference().is_none());
        // Song slot still falls back to the only stored song by position
        assert_eq!(merged[1].chosen_song().unwrap().title, "Gospel Song");
    }

    #[test]
    fn test_blank_content_passes_through() {
        let prior = vec![song("a", "Opening Hymn: A", "A")];
        let new = vec![ServiceElement::new("n1", "", ElementType::SongHymn)];

        let merged = reconcile(&new, &prior);
        assert_eq!(merged, new);
    }

    #[test]
    fn test_adopted_id_stays_unique() {
        // Stored song's id is already used by another element of the new list
        let prior = vec![song("taken", "Opening Hymn: A", "A")];
        let new = vec![
            ServiceElement::new("taken", "Prelude", ElementType::Liturgy),
            ServiceElement::new("n2", "Opening Hymn:", ElementType::SongHymn),
        ];

        let merged = reconcile(&new, &prior);
        assert_eq!(merged[1].id, "n2");
        assert_eq!(merged[1].chosen_song().unwrap().title, "A");
    }

    #[test]
    fn test_liturgy_passes_through() {
        let prior = vec![song("a", "Kyrie: A", "A")];
        let new = vec![
            ServiceElement::new("k", "Kyrie", ElementType::LiturgicalSong),
            ServiceElement::new("b", "Blessing", ElementType::Liturgy),
        ];
        assert_eq!(reconcile(&new, &prior), new);
    }

    #[test]
    fn test_contemporary_detail() {
        let mut prior = ServiceElement::new("a", "Song:", ElementType::SongContemporary);
        prior.set_selection(Some(SongSelection::contemporary("Way Maker", Some("Sinach"))));
        let new = vec![ServiceElement::new("n", "Song:", ElementType::SongHymn)];

        let merged = reconcile(&new, &[prior]);
        assert_eq!(merged[0].content, "Song: Way Maker - Sinach");
        assert_eq!(merged[0].element_type(), ElementType::SongHymn);
    }

    #[test]
    fn test_kept_song_is_not_rematched() {
        let prior = vec![song("b", "Hymn: B", "B"), song("a", "Hymn: A", "A")];
        // Lines swapped; the parser kept both ids with their own picks
        let new = vec![song("a", "Hymn: A", "A"), song("b", "Hymn: B", "B")];

        let (merged, report) = reconcile_with_report(&new, &prior);
        assert_eq!(merged, new);
        assert_eq!(report.songs_by_identity, 2);
        assert_eq!(report.songs_by_prefix, 0);
        assert_eq!(report.songs_by_position, 0);
    }

    #[test]
    fn test_kept_song_claims_its_stored_element() {
        let prior = vec![song("a", "Opening Hymn: A", "A")];
        let new = vec![
            ServiceElement::new("n1", "Gathering Hymn:", ElementType::SongHymn),
            song("a", "Opening Hymn: A", "A"),
        ];

        let merged = reconcile(&new, &prior);
        assert!(merged[0].selection().is_none(), "stored pick already kept by its own slot");
        assert_eq!(merged[1].chosen_song().unwrap().title, "A");
    }

    #[test]
    fn test_blank_prior_elements_are_ignored() {
        let blank_song = song("s", "", "X");
        let blank_reading = reading("r", "  ", "John 1");
        let new = vec![
            ServiceElement::new("n1", "Renamed Hymn:", ElementType::SongHymn),
            ServiceElement::new("n2", "Gospel:", ElementType::Reading),
        ];

        let (merged, report) = reconcile_with_report(&new, &[blank_song, blank_reading]);
        assert!(merged[0].selection().is_none());
        assert_eq!(merged[1].reference(), Some(""));
        assert_eq!(report.songs_kept(), 0);
    }

    #[test]
    fn test_kept_reading_claims_its_stored_element() {
        let prior = vec![
            reading("r2", "Reading: Second", "Romans 8"),
            reading("r1", "Reading: First", "Isaiah 6"),
        ];
        // r1 was kept by the parser; the new slot must not take r1's reference
        let new = vec![
            reading("r1", "Reading: First", "Isaiah 6"),
            ServiceElement::new("n", "Reading:", ElementType::Reading),
        ];

        let merged = reconcile(&new, &prior);
        assert_eq!(merged[0].reference(), Some("Isaiah 6"));
        assert_eq!(merged[1].reference(), Some("Romans 8"));
    }
}
