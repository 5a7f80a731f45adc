use time::macros::format_description;
use time::Date;

pub fn parse_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_date(day: Date) -> String {
    day.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| day.to_string())
}

/// First of `today`'s month through `today` — the default window for
/// conversational queries when the caller names no range.
pub fn month_to_date(today: Date) -> (Date, Date) {
    let first = Date::from_calendar_date(today.year(), today.month(), 1).unwrap_or(today);
    (first, today)
}

/// The `days`-day window ending at `today` inclusive.
pub fn trailing_window(today: Date, days: u16) -> (Date, Date) {
    let span = i64::from(days.max(1)) - 1;
    let start = today
        .checked_sub(time::Duration::days(span))
        .unwrap_or(today);
    (start, today)
}
