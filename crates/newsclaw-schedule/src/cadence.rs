//! Delivery cadence parser and eligibility rules.
//! Wire format: `weekly:<day-name>`, `biweekly:<day-name>`,
//! `monthly:<comma-separated day numbers>`, case-insensitive.
//! A theme without a cadence delivers every day.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use thiserror::Error;

/// Forward-scan window for `next_delivery_date` — covers two months.
const SCAN_WINDOW_DAYS: u64 = 62;

/// A parsed delivery cadence.
#[derive(Debug, Clone, PartialEq)]
pub enum Cadence {
    /// Every week on the given weekday.
    Weekly(Weekday),
    /// Every other week on the given weekday, anchored to the actual last
    /// delivery rather than calendar-week parity.
    Biweekly(Weekday),
    /// On the given days of each month (1-31).
    Monthly(Vec<u32>),
}

/// Cadence string parse failure. Malformed input is never coerced; callers
/// fail closed on any of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CadenceError {
    #[error("expected '<kind>:<value>', got '{0}'")]
    Syntax(String),

    #[error("unknown cadence kind '{0}'")]
    UnknownKind(String),

    #[error("unknown day name '{0}'")]
    UnknownDay(String),

    #[error("invalid day of month '{0}' (need 1-31)")]
    InvalidDayOfMonth(String),
}

/// Parse a cadence string. Case-insensitive on the kind and day-name tokens.
/// For `monthly`, one bad entry invalidates the whole spec.
pub fn parse_cadence(spec: &str) -> Result<Cadence, CadenceError> {
    let lowered = spec.to_lowercase();
    let parts: Vec<&str> = lowered.split(':').collect();
    if parts.len() != 2 {
        return Err(CadenceError::Syntax(spec.to_string()));
    }
    let (kind, value) = (parts[0].trim(), parts[1]);

    match kind {
        "weekly" => Ok(Cadence::Weekly(parse_day_name(value.trim())?)),
        "biweekly" => Ok(Cadence::Biweekly(parse_day_name(value.trim())?)),
        "monthly" => {
            let mut days = Vec::new();
            for entry in value.split(',') {
                let entry = entry.trim();
                let day: u32 = entry
                    .parse()
                    .map_err(|_| CadenceError::InvalidDayOfMonth(entry.to_string()))?;
                if !(1..=31).contains(&day) {
                    return Err(CadenceError::InvalidDayOfMonth(entry.to_string()));
                }
                days.push(day);
            }
            Ok(Cadence::Monthly(days))
        }
        other => Err(CadenceError::UnknownKind(other.to_string())),
    }
}

fn parse_day_name(name: &str) -> Result<Weekday, CadenceError> {
    match name {
        "sunday" => Ok(Weekday::Sun),
        "monday" => Ok(Weekday::Mon),
        "tuesday" => Ok(Weekday::Tue),
        "wednesday" => Ok(Weekday::Wed),
        "thursday" => Ok(Weekday::Thu),
        "friday" => Ok(Weekday::Fri),
        "saturday" => Ok(Weekday::Sat),
        other => Err(CadenceError::UnknownDay(other.to_string())),
    }
}

impl Cadence {
    /// Does this cadence fire on `target`?
    ///
    /// Biweekly needs the last delivery as an anchor: with none, the first
    /// matching weekday fires; otherwise at least two whole weeks must have
    /// elapsed. Anchoring to the actual delivery means a missed week
    /// self-corrects instead of drifting off-phase.
    pub fn matches(&self, target: NaiveDate, last_delivered: Option<DateTime<Utc>>) -> bool {
        match self {
            Cadence::Weekly(day) => target.weekday() == *day,
            Cadence::Biweekly(day) => {
                if target.weekday() != *day {
                    return false;
                }
                match last_delivered {
                    None => true,
                    Some(last) => {
                        let whole_weeks =
                            (target - last.date_naive()).num_days().div_euclid(7);
                        whole_weeks >= 2
                    }
                }
            }
            Cadence::Monthly(days) => days.contains(&target.day()),
        }
    }
}

/// Should a theme with this raw cadence string deliver on `target`?
/// Absent cadence → always. Unparsable cadence → never (fail closed, warn).
pub fn should_deliver_on(
    schedule: Option<&str>,
    target: NaiveDate,
    last_delivered: Option<DateTime<Utc>>,
) -> bool {
    let Some(spec) = schedule else {
        return true;
    };
    match parse_cadence(spec) {
        Ok(cadence) => cadence.matches(target, last_delivered),
        Err(e) => {
            tracing::warn!("⚠️ Invalid cadence '{spec}': {e}");
            false
        }
    }
}

/// Next eligible date at or after `from`, scanning day by day up to 62 days.
/// Absent cadence → `from` (today qualifies). Unparsable cadence, or no match
/// in the window → `None`.
pub fn next_delivery_date(
    schedule: Option<&str>,
    from: NaiveDate,
    last_delivered: Option<DateTime<Utc>>,
) -> Option<NaiveDate> {
    let Some(spec) = schedule else {
        return Some(from);
    };
    let cadence = parse_cadence(spec).ok()?;

    for offset in 0..SCAN_WINDOW_DAYS {
        let candidate = from.checked_add_days(Days::new(offset))?;
        if cadence.matches(candidate, last_delivered) {
            return Some(candidate);
        }
    }
    None
}
