//! Attendance simulation over raw OCR text
//!
//! There is no table or cell detection: each roster entry is classified by
//! searching the whole OCR text. The [`Classifier`] trait is the seam where a
//! real structured extractor would plug in.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rollcall_common::{AttendanceRecord, AttendanceStatus, Roster, RosterEntry, Summary};
use serde::Serialize;

/// Standalone `X`, `x` or `.` anywhere on the sheet
static SUSPICIOUS_MARK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(X|x|\.)\b").expect("suspicious mark pattern is valid"));

const NOTES_ABSENT: &str = "No signature detected.";
const NOTES_SUSPICIOUS: &str = "Suspicious mark detected; requires manual signature comparison.";
const NOTES_DUPLICATE: &str = "Duplicate signature/entry detected on sheet.";
const NOTES_PRESENT: &str = "Signature/mark detected and validated.";

/// Outcome for one roster entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: AttendanceStatus,
    pub anomaly_flag: bool,
    pub notes: String,
}

impl Classification {
    fn new(status: AttendanceStatus, anomaly_flag: bool, notes: &str) -> Self {
        Self {
            status,
            anomaly_flag,
            notes: notes.to_string(),
        }
    }
}

/// Decides status, anomaly flag and notes for one entry from the sheet text
pub trait Classifier: Send + Sync {
    fn classify(&self, raw_text: &str, entry: &RosterEntry) -> Classification;
}

/// Text-search heuristics standing in for real signature analysis
///
/// Rules, first match wins once the surname is found:
/// 1. any suspicious mark on the sheet → "Proxy?" (anomaly)
/// 2. the duplicate-checked surname appears more than once → Signed (anomaly)
/// 3. otherwise → Present
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    duplicate_check_surname: String,
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self::with_duplicate_check("Desai")
    }

    /// Run the duplicate-entry rule for a different surname
    pub fn with_duplicate_check(surname: impl Into<String>) -> Self {
        Self {
            duplicate_check_surname: surname.into(),
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for HeuristicClassifier {
    fn classify(&self, raw_text: &str, entry: &RosterEntry) -> Classification {
        let surname = entry.surname();

        if !contains_ignore_case(raw_text, surname) {
            return Classification::new(AttendanceStatus::Absent, false, NOTES_ABSENT);
        }

        // Scans the whole sheet, not the entry's row
        if SUSPICIOUS_MARK_RE.is_match(raw_text) {
            return Classification::new(AttendanceStatus::SuspectedProxy, true, NOTES_SUSPICIOUS);
        }

        if surname == self.duplicate_check_surname && raw_text.matches(surname).count() > 1 {
            return Classification::new(AttendanceStatus::Signed, true, NOTES_DUPLICATE);
        }

        Classification::new(AttendanceStatus::Present, false, NOTES_PRESENT)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Records and summary for one sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationResult {
    pub records: Vec<AttendanceRecord>,
    pub summary: Summary,
}

/// Maps OCR text onto the roster
pub struct AttendanceSimulator {
    classifier: Box<dyn Classifier>,
    subject: String,
}

impl AttendanceSimulator {
    pub fn new(classifier: Box<dyn Classifier>, subject: impl Into<String>) -> Self {
        Self {
            classifier,
            subject: subject.into(),
        }
    }

    pub fn heuristic(subject: impl Into<String>) -> Self {
        Self::new(Box::new(HeuristicClassifier::new()), subject)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// One record per roster entry, in roster order
    pub fn simulate(&self, raw_text: &str, roster: &Roster, date: NaiveDate) -> SimulationResult {
        let records: Vec<AttendanceRecord> = roster
            .iter()
            .map(|entry| {
                let c = self.classifier.classify(raw_text, entry);
                AttendanceRecord::for_entry(entry, c.status, c.anomaly_flag, c.notes)
            })
            .collect();

        let summary = Summary::from_records(self.subject.clone(), date, &records);

        SimulationResult { records, summary }
    }

    /// [`simulate`](Self::simulate) stamped with today's local date
    pub fn simulate_today(&self, raw_text: &str, roster: &Roster) -> SimulationResult {
        self.simulate(raw_text, roster, chrono::Local::now().date_naive())
    }
}
