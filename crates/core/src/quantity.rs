//! Dosing units, frequencies and the total quantity rule.
//!
//! The quantity to dispense is derived from what the prescriber enters:
//! `dose × doses per day × duration in days`, rounded up to a whole unit. A frequency of
//! "Immediately" is a single administration, so its total is the dose itself.

use crate::constants::{IMMEDIATE_FREQUENCY_NAME, STANDARD_FREQUENCIES};
use consult_types::ConceptId;
use serde::{Deserialize, Serialize};

/// Unit of a medication duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Minutes,
    Hours,
    #[default]
    Days,
    Weeks,
    Months,
    Years,
}

impl DurationUnit {
    /// Number of days one unit represents.
    pub fn days_multiplier(&self) -> f64 {
        match self {
            DurationUnit::Minutes => 1.0 / 1440.0,
            DurationUnit::Hours => 1.0 / 24.0,
            DurationUnit::Days => 1.0,
            DurationUnit::Weeks => 7.0,
            DurationUnit::Months => 30.0,
            DurationUnit::Years => 365.0,
        }
    }

    /// UCUM code used for `Timing.repeat.durationUnit`.
    pub fn ucum(&self) -> &'static str {
        match self {
            DurationUnit::Minutes => "min",
            DurationUnit::Hours => "h",
            DurationUnit::Days => "d",
            DurationUnit::Weeks => "wk",
            DurationUnit::Months => "mo",
            DurationUnit::Years => "a",
        }
    }

    /// Parses a unit name, accepting singular/plural forms and UCUM codes.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "min" | "minute" | "minutes" | "minute(s)" => Some(Self::Minutes),
            "h" | "hour" | "hours" | "hour(s)" => Some(Self::Hours),
            "d" | "day" | "days" | "day(s)" => Some(Self::Days),
            "wk" | "week" | "weeks" | "week(s)" => Some(Self::Weeks),
            "mo" | "month" | "months" | "month(s)" => Some(Self::Months),
            "a" | "year" | "years" | "year(s)" => Some(Self::Years),
            _ => None,
        }
    }
}

/// A dosing frequency as offered by the order form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub concept: ConceptId,
    pub name: String,
    /// Doses per day. Ignored for immediate frequencies.
    pub per_day: f64,
    #[serde(default)]
    pub immediate: bool,
}

impl Frequency {
    pub fn per_day(concept: ConceptId, name: impl Into<String>, per_day: f64) -> Self {
        Self {
            concept,
            name: name.into(),
            per_day,
            immediate: false,
        }
    }

    /// The single-administration frequency.
    pub fn immediately(concept: ConceptId) -> Self {
        Self {
            concept,
            name: IMMEDIATE_FREQUENCY_NAME.to_owned(),
            per_day: 1.0,
            immediate: true,
        }
    }

    /// Looks up a frequency in [`STANDARD_FREQUENCIES`] by name (case-insensitive).
    ///
    /// "Immediately" resolves to an immediate frequency.
    pub fn standard(concept: ConceptId, name: &str) -> Option<Self> {
        let wanted = name.trim();
        if wanted.eq_ignore_ascii_case(IMMEDIATE_FREQUENCY_NAME) {
            return Some(Self::immediately(concept));
        }
        STANDARD_FREQUENCIES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(wanted))
            .map(|(n, per_day)| Self::per_day(concept, *n, *per_day))
    }
}

/// Applies the total quantity rule.
///
/// Returns `dose` unchanged for an immediate frequency; otherwise
/// `ceil(dose × frequency.per_day × duration × unit.days_multiplier())`. Non-finite or
/// negative inputs yield zero.
pub fn total_quantity(dose: f64, frequency: &Frequency, duration: f64, unit: DurationUnit) -> f64 {
    if !dose.is_finite() || dose <= 0.0 {
        return 0.0;
    }
    if frequency.immediate {
        return dose;
    }
    let raw = dose * frequency.per_day * duration * unit.days_multiplier();
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    // Guard against float noise such as 3 × (1/3) × 7 = 7.000000000000001.
    let rounded = (raw * 1e9).round() / 1e9;
    rounded.ceil()
}
