//! # Rollcall Common Library
//!
//! Shared code for the rollcall attendance service including:
//! - Roster definition (expected attendees, display order)
//! - Attendance record and summary types (JSON wire shapes)
//! - Bootstrap configuration loading
//! - Common error types

pub mod attendance;
pub mod config;
pub mod error;
pub mod roster;

pub use attendance::{AttendanceRecord, AttendanceStatus, FailureSummary, Summary};
pub use error::{Error, Result};
pub use roster::{Roster, RosterEntry};
