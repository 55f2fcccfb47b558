//! Service-date keys
//!
//! Service documents are keyed by the calendar date of the service written
//! `M/D/YY` (no zero padding, two-digit year in the 2000s). URLs cannot carry
//! `/` in a path segment, so `M-D-YY` is accepted as an equivalent spelling.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Calendar date of a service, displayed as `M/D/YY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceDate(NaiveDate);

impl ServiceDate {
    /// Parse `M/D/YY` or `M-D-YY`
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidInput(format!("Invalid service date '{}', expected M/D/YY", s));

        let parts: Vec<&str> = s.trim().split(|c| c == '/' || c == '-').collect();
        let [month, day, year] = parts.as_slice() else {
            return Err(invalid());
        };

        if !(1..=2).contains(&month.len()) || !(1..=2).contains(&day.len()) || year.len() != 2 {
            return Err(invalid());
        }
        let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if !all_digits(month) || !all_digits(day) || !all_digits(year) {
            return Err(invalid());
        }

        let month: u32 = month.parse().map_err(|_| invalid())?;
        let day: u32 = day.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        NaiveDate::from_ymd_opt(2000 + year, month, day)
            .map(ServiceDate)
            .ok_or_else(invalid)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        ServiceDate(date)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// Storage key (`M/D/YY`)
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// URL-safe spelling (`M-D-YY`)
    pub fn slug(&self) -> String {
        self.key().replace('/', "-")
    }
}

impl fmt::Display for ServiceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{:02}", self.0.month(), self.0.day(), self.0.year() % 100)
    }
}

impl FromStr for ServiceDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ServiceDate::parse(s)
    }
}

impl Serialize for ServiceDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for ServiceDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ServiceDate::parse(&raw).map_err(serde::de::Error::custom)
    }
}
