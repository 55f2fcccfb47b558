//! Line classification
//!
//! Decides the liturgical element type of one line of an order of worship.
//!
//! [`classify`] is the authoritative rule set used whenever an order is parsed:
//! case-insensitive substring markers checked in a fixed priority order, first
//! hit wins. [`classify_fuzzy`] is the looser variant used while importing a
//! free-form custom service, where a person reviews every line; it compares the
//! line against per-category vocabularies and proposes corrections for near
//! misses ("Kyre", "Firts Reading:").

use serde::Serialize;

use super::element::ElementType;

const SONG_MARKERS: &[&str] = &[
    "hymn:",
    "hymn of the day",
    "opening hymn",
    "sending song",
    "anthem:",
    "song:",
];

const READING_MARKERS: &[&str] = &["reading:", "lesson:", "psalm:", "gospel:"];

const MESSAGE_MARKERS: &[&str] = &["sermon:", "message:"];

const LITURGICAL_SONG_MARKERS: &[&str] = &[
    "kyrie",
    "alleluia",
    "create in me",
    "lamb of god",
    "this is the feast",
    "glory to god",
    "change my heart",
];

/// Similarity a single-word line must exceed to earn a suggestion
pub const SINGLE_WORD_THRESHOLD: f64 = 0.6;

/// Similarity a multi-word line must exceed to earn a suggestion
pub const MULTI_WORD_THRESHOLD: f64 = 0.8;

/// Classify one line of an order of worship
///
/// Priority order:
/// 1. "children" together with "message" is liturgy (Children's Message)
/// 2. song markers
/// 3. reading markers
/// 4. sermon/message markers
/// 5. liturgical song vocabulary
/// 6. liturgy
pub fn classify(line: &str) -> ElementType {
    let lower = line.to_lowercase();

    if is_childrens_message(&lower) {
        return ElementType::Liturgy;
    }
    if contains_any(&lower, SONG_MARKERS) {
        return ElementType::SongHymn;
    }
    if contains_any(&lower, READING_MARKERS) {
        return ElementType::Reading;
    }
    if contains_any(&lower, MESSAGE_MARKERS) {
        return ElementType::Message;
    }
    if contains_any(&lower, LITURGICAL_SONG_MARKERS) {
        return ElementType::LiturgicalSong;
    }
    ElementType::Liturgy
}

fn is_childrens_message(lower: &str) -> bool {
    lower.contains("children") && lower.contains("message")
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Curated vocabulary per category for import-time matching
const VOCABULARY: &[(ElementType, &[&str])] = &[
    (
        ElementType::SongHymn,
        &[
            "opening hymn",
            "gathering hymn",
            "hymn of the day",
            "sermon hymn",
            "offertory hymn",
            "communion hymn",
            "closing hymn",
            "sending song",
            "hymn",
            "anthem",
            "song",
        ],
    ),
    (
        ElementType::Reading,
        &[
            "first reading",
            "second reading",
            "old testament reading",
            "epistle",
            "gospel",
            "psalm",
            "lesson",
        ],
    ),
    (ElementType::Message, &["sermon", "message", "homily"]),
    (
        ElementType::LiturgicalSong,
        &[
            "kyrie",
            "alleluia",
            "gospel acclamation",
            "create in me",
            "lamb of god",
            "this is the feast",
            "glory to god",
            "change my heart",
            "sanctus",
            "nunc dimittis",
        ],
    ),
    (
        ElementType::Liturgy,
        &[
            "prelude",
            "welcome",
            "announcements",
            "confession and forgiveness",
            "prayer of the day",
            "children's message",
            "apostles' creed",
            "nicene creed",
            "prayers of intercession",
            "sharing of the peace",
            "offering",
            "great thanksgiving",
            "words of institution",
            "lord's prayer",
            "communion",
            "blessing",
            "dismissal",
            "postlude",
        ],
    ),
];

/// Proposed correction for a line that nearly matches a known term
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// Vocabulary term the line resembles
    pub term: String,
    /// Category of that term
    pub element_type: ElementType,
    /// Normalized Levenshtein similarity (0.0-1.0)
    pub score: f64,
}

/// Result of import-time classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyClassification {
    pub element_type: ElementType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

/// Classify a line for human-assisted import
///
/// A vocabulary term found verbatim in the line settles the category (the
/// longest such term wins, so "Gospel Acclamation" beats "Gospel"). Otherwise
/// the strict [`classify`] result stands and the closest vocabulary term is
/// attached as a suggestion when its similarity clears the threshold for the
/// line's word count.
pub fn classify_fuzzy(line: &str) -> FuzzyClassification {
    let candidate = line.trim().trim_end_matches(':').trim().to_lowercase();

    let mut contained: Option<(ElementType, &str)> = None;
    let mut best: Option<Suggestion> = None;

    for (element_type, terms) in VOCABULARY {
        for term in terms.iter() {
            if candidate.contains(term) {
                if contained.map_or(true, |(_, t)| term.len() > t.len()) {
                    contained = Some((*element_type, *term));
                }
                continue;
            }

            let score = strsim::normalized_levenshtein(&candidate, term);
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Suggestion {
                    term: term.to_string(),
                    element_type: *element_type,
                    score,
                });
            }
        }
    }

    if let Some((element_type, _)) = contained {
        return FuzzyClassification {
            element_type,
            suggestion: None,
        };
    }

    let threshold = if candidate.split_whitespace().count() > 1 {
        MULTI_WORD_THRESHOLD
    } else {
        SINGLE_WORD_THRESHOLD
    };

    let suggestion = best.filter(|s| s.score > threshold);
    if let Some(s) = &suggestion {
        tracing::debug!(
            line = %line,
            term = %s.term,
            score = s.score,
            "Near-miss vocabulary match"
        );
    }

    FuzzyClassification {
        element_type: classify(line),
        suggestion,
    }
}
