//! Service documents
//!
//! One document per service date: the service type, the raw order-of-worship
//! text last used to derive the elements, and the ordered element list.
//! Documents are created by the first pastor save for a date and are never
//! removed; deleting a service clears it back to an empty document under the
//! same date.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use super::element::{ServiceElement, SongSelection};
use crate::time::ServiceDate;
use crate::{Error, Result};

/// Service type identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ServiceType {
    /// Cleared document (empty string on the wire)
    #[default]
    Unset,
    NoCommunion,
    Communion,
    CommunionPotluck,
    /// Id of a stored custom service
    Custom(String),
}

impl ServiceType {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" => ServiceType::Unset,
            "no_communion" => ServiceType::NoCommunion,
            "communion" => ServiceType::Communion,
            "communion_potluck" => ServiceType::CommunionPotluck,
            other => ServiceType::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServiceType::Unset => "",
            ServiceType::NoCommunion => "no_communion",
            ServiceType::Communion => "communion",
            ServiceType::CommunionPotluck => "communion_potluck",
            ServiceType::Custom(id) => id,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, ServiceType::Unset)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ServiceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServiceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| ServiceType::parse(&s)).unwrap_or_default())
    }
}

/// Stored order of worship for one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDocument {
    pub date: ServiceDate,

    #[serde(rename = "type", default)]
    pub service_type: ServiceType,

    /// Raw text the elements were last derived from
    #[serde(default)]
    pub content: String,

    /// Display and presentation order
    #[serde(default)]
    pub elements: Vec<ServiceElement>,
}

/// Completion state of the required elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub required: usize,
    pub completed: usize,
    /// Ids of required elements still waiting for a song or reference
    pub pending: Vec<String>,
    pub ready: bool,
}

impl ServiceDocument {
    pub fn new(
        date: ServiceDate,
        service_type: ServiceType,
        content: impl Into<String>,
        elements: Vec<ServiceElement>,
    ) -> Self {
        Self {
            date,
            service_type,
            content: content.into(),
            elements,
        }
    }

    /// Empty document kept alive under its date
    pub fn cleared(date: ServiceDate) -> Self {
        Self::new(date, ServiceType::Unset, "", Vec::new())
    }

    pub fn is_cleared(&self) -> bool {
        self.service_type.is_unset() && self.content.trim().is_empty() && self.elements.is_empty()
    }

    pub fn element(&self, id: &str) -> Option<&ServiceElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// First id that appears more than once
    pub fn find_duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.elements
            .iter()
            .map(|e| e.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    pub fn readiness(&self) -> Readiness {
        let required: Vec<&ServiceElement> = self.elements.iter().filter(|e| e.required).collect();
        let pending: Vec<String> = required
            .iter()
            .filter(|e| !e.is_complete())
            .map(|e| e.id.clone())
            .collect();

        Readiness {
            required: required.len(),
            completed: required.len() - pending.len(),
            ready: pending.is_empty(),
            pending,
        }
    }

    /// Record (or clear) the worship team's song pick for one element
    ///
    /// Content becomes `"<label>: <detail>"`, or `"<label>:"` when cleared.
    pub fn apply_selection(
        &mut self,
        id: &str,
        selection: Option<SongSelection>,
    ) -> Result<&ServiceElement> {
        let element = self.element_mut(id)?;
        if !element.element_type().is_song() {
            return Err(Error::InvalidInput(format!(
                "Element {} is a {}, not a song",
                id,
                element.element_type()
            )));
        }

        let label = element.label().to_string();
        element.content = match &selection {
            Some(s) if s.has_title() => format!("{}: {}", label, s.formatted_detail()),
            _ => format!("{}:", label),
        };
        element.set_selection(selection);
        Ok(element)
    }

    /// Record a scripture reference or sermon title for one element
    pub fn apply_reference(&mut self, id: &str, reference: &str) -> Result<&ServiceElement> {
        let element = self.element_mut(id)?;
        if !element.set_reference(reference.trim()) {
            return Err(Error::InvalidInput(format!(
                "Element {} is a {}, which takes no reference",
                id,
                element.element_type()
            )));
        }
        Ok(element)
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut ServiceElement> {
        let date = self.date;
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("Element {} in service {}", id, date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::element::ElementType;
    use serde_json::json;

    fn date() -> ServiceDate {
        ServiceDate::parse("10/19/26").unwrap()
    }

    fn sample() -> ServiceDocument {
        ServiceDocument::new(
            date(),
            ServiceType::NoCommunion,
            "Prelude\nOpening Hymn:\nGospel:",
            vec![
                ServiceElement::new("p", "Prelude", ElementType::Liturgy),
                ServiceElement::new("h", "Opening Hymn:", ElementType::SongHymn),
                ServiceElement::new("g", "Gospel:", ElementType::Reading),
            ],
        )
    }

    #[test]
    fn test_service_type_strings() {
        for (raw, expected) in [
            ("", ServiceType::Unset),
            ("no_communion", ServiceType::NoCommunion),
            ("communion", ServiceType::Communion),
            ("communion_potluck", ServiceType::CommunionPotluck),
            ("easter-vigil", ServiceType::Custom("easter-vigil".to_string())),
        ] {
            let parsed = ServiceType::parse(raw);
            assert_eq!(parsed, expected);
            assert_eq!(parsed.as_str(), raw);
        }
    }

    #[test]
    fn test_document_wire_shape() {
        let doc = sample();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["date"], "10/19/26");
        assert_eq!(value["type"], "no_communion");
        assert_eq!(value["elements"][1]["type"], "song_hymn");

        let back: ServiceDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_null_type_reads_as_unset() {
        let doc: ServiceDocument =
            serde_json::from_value(json!({"date": "1/4/26", "type": null})).unwrap();
        assert!(doc.is_cleared());
    }

    #[test]
    fn test_readiness() {
        let mut doc = sample();
        let readiness = doc.readiness();
        assert_eq!(readiness.required, 2);
        assert_eq!(readiness.completed, 0);
        assert_eq!(readiness.pending, vec!["h", "g"]);
        assert!(!readiness.ready);

        doc.apply_selection("h", Some(SongSelection::hymn("Holy, Holy, Holy", Some("138"), Some("cranberry"))))
            .unwrap();
        doc.apply_reference("g", "John 3:16").unwrap();
        assert!(doc.readiness().ready);
    }

    #[test]
    fn test_apply_selection_rewrites_content() {
        let mut doc = sample();
        let element = doc
            .apply_selection("h", Some(SongSelection::hymn("Holy, Holy, Holy", Some("138"), Some("cranberry"))))
            .unwrap();
        assert_eq!(element.content, "Opening Hymn: Holy, Holy, Holy #138 (Cranberry)");

        let cleared = doc.apply_selection("h", None).unwrap();
        assert_eq!(cleared.content, "Opening Hymn:");
        assert!(cleared.selection().is_none());
    }

    #[test]
    fn test_apply_selection_rejects_non_songs() {
        let mut doc = sample();
        let err = doc
            .apply_selection("g", Some(SongSelection::hymn("x", None, None)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(doc.element("g").unwrap().selection().is_none());

        assert!(matches!(
            doc.apply_selection("missing", None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_apply_reference_rejects_songs() {
        let mut doc = sample();
        assert!(matches!(
            doc.apply_reference("h", "Psalm 23"),
            Err(Error::InvalidInput(_))
        ));
        let element = doc.apply_reference("g", "  Mark 1:1-8 ").unwrap();
        assert_eq!(element.reference(), Some("Mark 1:1-8"));
    }

    #[test]
    fn test_find_duplicate_id() {
        let mut doc = sample();
        assert_eq!(doc.find_duplicate_id(), None);
        doc.elements.push(ServiceElement::new("h", "Sending Song:", ElementType::SongHymn));
        assert_eq!(doc.find_duplicate_id(), Some("h"));
    }

    #[test]
    fn test_cleared() {
        let doc = ServiceDocument::cleared(date());
        assert!(doc.is_cleared());
        assert_eq!(doc.date, date());
        assert!(!sample().is_cleared());
    }
}
