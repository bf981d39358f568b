//! Required-field checks for program submissions.
//!
//! Which fields a submission needs depends on its `programType`. The rules
//! are declared as [RequiredFields] tables so both program collections run
//! the same check with their own table.

use serde_json::Value;
use thiserror::Error;

use crate::{numerals::normalize_digits, ProgramDraft, ProgramType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("orderIndex must be an integer")]
    InvalidOrderIndex,
    #[error("serial must be a string or a number")]
    InvalidSerial,
    #[error("programDetails is required")]
    ProgramDetailsRequired,
    #[error("Day and Shift are required")]
    MissingSchedule,
}

/// A field of a program submission, named as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ProgramType,
    OrderIndex,
    Serial,
    BroadcastTime,
    ProgramDetails,
    Day,
    Shift,
    Period,
    Artist,
}

impl Field {
    pub const fn name(self) -> &'static str {
        match self {
            Self::ProgramType => "programType",
            Self::OrderIndex => "orderIndex",
            Self::Serial => "serial",
            Self::BroadcastTime => "broadcastTime",
            Self::ProgramDetails => "programDetails",
            Self::Day => "day",
            Self::Shift => "shift",
            Self::Period => "period",
            Self::Artist => "artist",
        }
    }
}

/// Declares which fields must be present, per program type
#[derive(Debug, Clone, Copy)]
pub struct RequiredFields {
    /// Required regardless of type
    pub always: &'static [Field],
    /// Additionally required for songs
    pub song: &'static [Field],
    /// Additionally required for every other type
    pub other: &'static [Field],
}

impl RequiredFields {
    fn for_type(&self, program_type: &ProgramType) -> impl Iterator<Item = Field> + '_ {
        let specific = if program_type.is_song() {
            self.song
        } else {
            self.other
        };

        self.always.iter().chain(specific).copied()
    }
}

/// Rules for regular, scheduled programs
pub const PROGRAM_FIELDS: RequiredFields = RequiredFields {
    always: &[Field::ProgramType, Field::OrderIndex],
    song: &[Field::Artist],
    other: &[
        Field::Serial,
        Field::BroadcastTime,
        Field::ProgramDetails,
        Field::Day,
        Field::Shift,
        Field::Period,
    ],
};

/// Rules for special programs, which only need a type and a position
pub const SPECIAL_FIELDS: RequiredFields = RequiredFields {
    always: &[Field::ProgramType, Field::OrderIndex],
    song: &[],
    other: &[],
};

/// Returns the fields the table requires that the draft leaves out
pub fn missing_fields(draft: &ProgramDraft, rules: &RequiredFields) -> Vec<Field> {
    rules
        .for_type(&draft.program_type())
        .filter(|field| !draft.has(*field))
        .collect()
}

pub fn validate(draft: &ProgramDraft, rules: &RequiredFields) -> Result<(), ValidationError> {
    let missing = missing_fields(draft, rules);

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(
            missing.into_iter().map(Field::name).collect(),
        ))
    }
}

/// Reads an `orderIndex` from an integer or an integer string.
/// Anything else is rejected rather than defaulted.
pub fn coerce_order_index(value: &Value) -> Result<i64, ValidationError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| is_whole_i64(*f)).map(|f| f as i64))
            .ok_or(ValidationError::InvalidOrderIndex),
        Value::String(s) => normalize_digits(s.trim())
            .parse()
            .map_err(|_| ValidationError::InvalidOrderIndex),
        _ => Err(ValidationError::InvalidOrderIndex),
    }
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive
fn is_whole_i64(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Turns a submitted serial into its stored text form
pub fn serial_text(value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(normalize_digits(&s)),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(ValidationError::InvalidSerial),
    }
}
