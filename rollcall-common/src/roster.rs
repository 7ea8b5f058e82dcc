//! Roster of expected attendees
//!
//! The roster is the ground truth every uploaded sheet is matched against.
//! Entry order is display order and is preserved in every response.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One expected attendee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Roll number shown on the sheet
    #[serde(rename = "roll_no")]
    pub identifier: String,
    /// Full display name ("Given Surname")
    #[serde(rename = "name")]
    pub full_name: String,
}

impl RosterEntry {
    pub fn new(identifier: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            full_name: full_name.into(),
        }
    }

    /// Last whitespace-delimited token of the full name
    pub fn surname(&self) -> &str {
        self.full_name.split_whitespace().last().unwrap_or("")
    }
}

/// Ordered, validated list of roster entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Build a roster, rejecting empty lists, blank names and duplicate roll numbers
    pub fn new(entries: Vec<RosterEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::InvalidInput("Roster must contain at least one entry".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.identifier.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "Roster entry '{}' has an empty roll number",
                    entry.full_name
                )));
            }
            if entry.surname().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "Roster entry {} has a blank name",
                    entry.identifier
                )));
            }
            if !seen.insert(entry.identifier.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate roll number in roster: {}",
                    entry.identifier
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RosterEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }
}

impl Default for Roster {
    /// Built-in class list used when no `[[roster]]` table is configured
    fn default() -> Self {
        let entries = [
            ("2301", "Priya Sharma"),
            ("2302", "Rohit Patil"),
            ("2303", "Anjali Mehta"),
            ("2304", "Vikram Singh"),
            ("2305", "Sneha Kadam"),
            ("2306", "Kunal Desai"),
            ("2307", "Rani Iyer"),
        ]
        .into_iter()
        .map(|(roll_no, name)| RosterEntry::new(roll_no, name))
        .collect();

        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a RosterEntry;
    type IntoIter = std::slice::Iter<'a, RosterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
