//! Attendance records and summaries
//!
//! Field names follow the JSON wire format consumed by the upload page:
//! records serialize as `{roll_no, name, status, anomaly_flag, notes}` and
//! summaries as `{subject, date, total_students, present, anomalies_flagged}`.

use crate::roster::RosterEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `anomalies_flagged` value reported when a request failed outright
pub const SENTINEL_ANOMALIES: u32 = 100;

/// Attendance status derived for one roster entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Absent,
    Present,
    Signed,
    /// Signature found next to a suspicious mark
    #[serde(rename = "Proxy?")]
    SuspectedProxy,
    /// Only used by the failure record
    #[serde(rename = "FAILED")]
    Failed,
}

impl AttendanceStatus {
    /// Present and Signed both count toward the present total
    pub fn counts_as_present(self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Signed)
    }
}

/// Per-student result for one uploaded sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "roll_no")]
    pub identifier: String,
    #[serde(rename = "name")]
    pub full_name: String,
    pub status: AttendanceStatus,
    pub anomaly_flag: bool,
    pub notes: String,
}

impl AttendanceRecord {
    pub fn for_entry(
        entry: &RosterEntry,
        status: AttendanceStatus,
        anomaly_flag: bool,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            identifier: entry.identifier.clone(),
            full_name: entry.full_name.clone(),
            status,
            anomaly_flag,
            notes: notes.into(),
        }
    }

    /// Placeholder record returned when extraction failed for the whole sheet
    pub fn system_error(notes: impl Into<String>) -> Self {
        Self {
            identifier: "ERROR".to_string(),
            full_name: "System Error".to_string(),
            status: AttendanceStatus::Failed,
            anomaly_flag: true,
            notes: notes.into(),
        }
    }
}

/// Aggregate counts for one uploaded sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub subject: String,
    /// Serialized as YYYY-MM-DD
    pub date: NaiveDate,
    pub total_students: usize,
    #[serde(rename = "present")]
    pub present_count: usize,
    pub anomalies_flagged: usize,
}

impl Summary {
    /// Derive counts from the produced records
    pub fn from_records(subject: impl Into<String>, date: NaiveDate, records: &[AttendanceRecord]) -> Self {
        Self {
            subject: subject.into(),
            date,
            total_students: records.len(),
            present_count: records
                .iter()
                .filter(|r| r.status.counts_as_present())
                .count(),
            anomalies_flagged: records.iter().filter(|r| r.anomaly_flag).count(),
        }
    }
}

/// Summary shape sent with a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub anomalies_flagged: u32,
}

impl Default for FailureSummary {
    fn default() -> Self {
        Self {
            anomalies_flagged: SENTINEL_ANOMALIES,
        }
    }
}
