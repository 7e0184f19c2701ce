//! Date-derived prompt variables.
//!
//! Templates may embed `{{period}}`, `{{today}}`, and `{{days}}`; all three
//! derive from the last delivery timestamp and the current time. Unknown
//! placeholders are left verbatim.

use chrono::{DateTime, Datelike, Duration, Utc};

/// Variables available for prompt expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptVariables {
    /// `"YYYY年M月D日からYYYY年M月D日まで"`, from the anchor to now.
    pub period: String,
    /// `"YYYY年M月D日"`, today.
    pub today: String,
    /// Days since the anchor, rounded to the nearest whole day.
    pub days: String,
}

/// Japanese long date form, unpadded month and day.
fn format_date_jp(date: DateTime<Utc>) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// Derive prompt variables. The anchor is the last delivery, or seven days
/// before `now` when the theme has never delivered.
pub fn prompt_variables(
    last_delivered: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> PromptVariables {
    let anchor = last_delivered.unwrap_or(now - Duration::days(7));
    let today = format_date_jp(now);
    let period = format!("{}から{}まで", format_date_jp(anchor), today);
    let days = ((now - anchor).num_seconds() as f64 / 86_400.0).round() as i64;

    PromptVariables {
        period,
        today,
        days: days.to_string(),
    }
}

/// Expand the three known placeholders in a prompt template.
pub fn expand_prompt(
    template: &str,
    last_delivered: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    let vars = prompt_variables(last_delivered, now);
    template
        .replace("{{period}}", &vars.period)
        .replace("{{today}}", &vars.today)
        .replace("{{days}}", &vars.days)
}
