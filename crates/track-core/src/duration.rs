use chrono::Duration;
use regex::Regex;

/// Parse a human duration shorthand: `"2h30m"`, `"90m"`, `"1d2h"`, `"45s"`.
/// A bare number is minutes. Returns `None` for anything else.
pub fn parse(input: &str) -> Option<Duration> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(minutes) = trimmed.parse::<i64>() {
        return Duration::try_minutes(minutes);
    }
    let re = Regex::new(r"^(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("regex");
    let caps = re.captures(&trimmed)?;
    if (1..=4).all(|idx| caps.get(idx).is_none()) {
        return None;
    }
    let part = |idx: usize| -> Option<i64> {
        match caps.get(idx) {
            None => Some(0),
            Some(m) => m.as_str().parse().ok(),
        }
    };
    Duration::try_days(part(1)?)?
        .checked_add(&Duration::try_hours(part(2)?)?)?
        .checked_add(&Duration::try_minutes(part(3)?)?)?
        .checked_add(&Duration::try_seconds(part(4)?)?)
}

/// Render a millisecond total as whole hours and minutes: `"1 hour
/// 30 minutes"`, `"2 minutes"`. Hours are omitted when zero; minutes are
/// always shown when there is no hour part, so zero renders as
/// `"0 minutes"`.
pub fn format_ms(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let mut parts = Vec::new();
    if hours != 0 {
        parts.push(format!("{} hour{}", hours, plural(hours)));
    }
    if minutes != 0 || hours == 0 {
        parts.push(format!("{} minute{}", minutes, plural(minutes)));
    }
    parts.join(" ")
}

fn plural(value: i64) -> &'static str {
    if value == 1 {
        ""
    } else {
        "s"
    }
}
