//! Service element model
//!
//! One line of an order of worship. The element's `type` decides which
//! optional data it may carry: songs carry a `selection`, readings and
//! messages carry a `reference`, everything else carries nothing. The
//! [`ElementKind`] union makes that a property of the type rather than a
//! convention, so a reading can never hold a song pick and vice versa.
//!
//! On the wire (and in the database) an element is a flat JSON object:
//!
//! ```text
//! {"id":"...","type":"song_hymn","content":"Opening Hymn:","required":true,"selection":{...}}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Liturgical element type, as stored in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Liturgy,
    SongHymn,
    SongContemporary,
    LiturgicalSong,
    Reading,
    Message,
}

impl ElementType {
    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Liturgy => "liturgy",
            ElementType::SongHymn => "song_hymn",
            ElementType::SongContemporary => "song_contemporary",
            ElementType::LiturgicalSong => "liturgical_song",
            ElementType::Reading => "reading",
            ElementType::Message => "message",
        }
    }

    /// Song slots receive a worship-team selection
    pub fn is_song(&self) -> bool {
        matches!(self, ElementType::SongHymn | ElementType::SongContemporary)
    }

    /// Reading and sermon slots receive a free-text reference
    pub fn accepts_reference(&self) -> bool {
        matches!(self, ElementType::Reading | ElementType::Message)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a chosen song comes from a hymnal or is a contemporary piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongKind {
    Hymn,
    Contemporary,
}

/// Concrete song chosen by the worship team for a song slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSelection {
    #[serde(rename = "type")]
    pub kind: SongKind,

    #[serde(default, deserialize_with = "string_or_null")]
    pub title: String,

    /// Hymn number within its hymnal (kept as text: "138", "721b")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    /// Hymnal name, stored lower-case (e.g. "cranberry")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hymnal: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_music: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SongSelection {
    /// Hymn pick with number and hymnal
    pub fn hymn(title: &str, number: Option<&str>, hymnal: Option<&str>) -> Self {
        Self {
            kind: SongKind::Hymn,
            title: title.to_string(),
            number: number.map(str::to_string),
            hymnal: hymnal.map(str::to_string),
            author: None,
            sheet_music: None,
            youtube: None,
            notes: None,
        }
    }

    /// Contemporary pick with optional author
    pub fn contemporary(title: &str, author: Option<&str>) -> Self {
        Self {
            kind: SongKind::Contemporary,
            title: title.to_string(),
            number: None,
            hymnal: None,
            author: author.map(str::to_string),
            sheet_music: None,
            youtube: None,
            notes: None,
        }
    }

    /// A selection only counts once a title has been filled in
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Display text placed after the slot label
    ///
    /// Hymns: `"<title> #<number> (<Hymnal>)"`, contemporary songs:
    /// `"<title> - <author>"`. Absent parts are left out.
    pub fn formatted_detail(&self) -> String {
        let mut detail = self.title.trim().to_string();
        match self.kind {
            SongKind::Hymn => {
                if let Some(number) = non_blank(&self.number) {
                    detail.push_str(&format!(" #{}", number));
                }
                if let Some(hymnal) = non_blank(&self.hymnal) {
                    detail.push_str(&format!(" ({})", capitalize(hymnal)));
                }
            }
            SongKind::Contemporary => {
                if let Some(author) = non_blank(&self.author) {
                    detail.push_str(&format!(" - {}", author));
                }
            }
        }
        detail
    }
}

/// Type-specific payload of an element, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Liturgy,
    LiturgicalSong,
    SongHymn {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection: Option<SongSelection>,
    },
    SongContemporary {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection: Option<SongSelection>,
    },
    Reading {
        #[serde(default, deserialize_with = "string_or_null")]
        reference: String,
    },
    Message {
        #[serde(default, deserialize_with = "string_or_null")]
        reference: String,
    },
}

impl ElementKind {
    /// Payload-free kind for a freshly classified line
    pub fn empty(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Liturgy => ElementKind::Liturgy,
            ElementType::LiturgicalSong => ElementKind::LiturgicalSong,
            ElementType::SongHymn => ElementKind::SongHymn { selection: None },
            ElementType::SongContemporary => ElementKind::SongContemporary { selection: None },
            ElementType::Reading => ElementKind::Reading {
                reference: String::new(),
            },
            ElementType::Message => ElementKind::Message {
                reference: String::new(),
            },
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Liturgy => ElementType::Liturgy,
            ElementKind::LiturgicalSong => ElementType::LiturgicalSong,
            ElementKind::SongHymn { .. } => ElementType::SongHymn,
            ElementKind::SongContemporary { .. } => ElementType::SongContemporary,
            ElementKind::Reading { .. } => ElementType::Reading,
            ElementKind::Message { .. } => ElementType::Message,
        }
    }
}

/// One line of an order of worship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceElement {
    /// Unique within one service document; correlates a slot across edits
    #[serde(default, deserialize_with = "string_or_null")]
    pub id: String,

    /// `"<Label>: <detail>"` or a bare label such as `"Blessing"`
    #[serde(default, deserialize_with = "string_or_null")]
    pub content: String,

    /// Must be completed before the service is ready
    #[serde(default)]
    pub required: bool,

    #[serde(flatten)]
    pub kind: ElementKind,
}

impl ServiceElement {
    /// Build an element with no attached data; everything but liturgy is required
    pub fn new(id: impl Into<String>, content: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            required: element_type != ElementType::Liturgy,
            kind: ElementKind::empty(element_type),
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Elements with blank content are never matched against anything
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Text before the first `:`, trimmed; whole trimmed content without a colon
    pub fn label(&self) -> &str {
        let content = self.content.trim();
        match content.find(':') {
            Some(pos) => content[..pos].trim(),
            None => content,
        }
    }

    /// Case-insensitive slot identity used by reconciliation
    pub fn slot_prefix(&self) -> String {
        self.label().to_lowercase()
    }

    pub fn selection(&self) -> Option<&SongSelection> {
        match &self.kind {
            ElementKind::SongHymn { selection } | ElementKind::SongContemporary { selection } => {
                selection.as_ref()
            }
            _ => None,
        }
    }

    /// Selection that has a title (an actual chosen song)
    pub fn chosen_song(&self) -> Option<&SongSelection> {
        self.selection().filter(|s| s.has_title())
    }

    pub fn reference(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Reading { reference } | ElementKind::Message { reference } => {
                Some(reference.as_str())
            }
            _ => None,
        }
    }

    /// Reference that has been filled in
    pub fn filled_reference(&self) -> Option<&str> {
        self.reference().filter(|r| !r.trim().is_empty())
    }

    /// Attach or clear a song pick; returns false when this is not a song slot
    pub fn set_selection(&mut self, value: Option<SongSelection>) -> bool {
        match &mut self.kind {
            ElementKind::SongHymn { selection } | ElementKind::SongContemporary { selection } => {
                *selection = value;
                true
            }
            _ => false,
        }
    }

    /// Set the reference; returns false when this is not a reading or message
    pub fn set_reference(&mut self, value: &str) -> bool {
        match &mut self.kind {
            ElementKind::Reading { reference } | ElementKind::Message { reference } => {
                *reference = value.to_string();
                true
            }
            _ => false,
        }
    }

    /// Whether the slot has what it needs before the service is presented
    pub fn is_complete(&self) -> bool {
        match &self.kind {
            ElementKind::Liturgy | ElementKind::LiturgicalSong => true,
            ElementKind::SongHymn { .. } | ElementKind::SongContemporary { .. } => {
                self.chosen_song().is_some()
            }
            ElementKind::Reading { .. } | ElementKind::Message { .. } => {
                self.filled_reference().is_some()
            }
        }
    }
}

/// Upper-case the first character, leave the rest alone
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Loosely-typed clients send `null` for text fields they never filled in
fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
