//! pt-BR display formatting for dates and timestamps.

use crate::constants::EMPTY_VALUE;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

const MONTHS: [&str; 12] = [
    "jan.", "fev.", "mar.", "abr.", "mai.", "jun.", "jul.", "ago.", "set.", "out.", "nov.", "dez.",
];

fn month_abbrev(month: u32) -> &'static str {
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// `12 de mar. de 2024`
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{:02} de {} de {}",
        date.day(),
        month_abbrev(date.month()),
        date.year()
    )
}

/// Like [`format_date`], with `—` for a missing date.
pub fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_else(|| EMPTY_VALUE.to_string())
}

/// `12 de mar. de 2024, 09:05` (UTC)
pub fn format_datetime(value: DateTime<Utc>) -> String {
    format!(
        "{}, {:02}:{:02}",
        format_date(value.date_naive()),
        value.hour(),
        value.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_dates_in_portuguese() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        assert_eq!(format_date(d), "08 de mar. de 2024");
        assert_eq!(format_optional_date(None), "—");

        let ts = Utc.with_ymd_and_hms(2023, 12, 1, 9, 5, 0).unwrap();
        assert_eq!(format_datetime(ts), "01 de dez. de 2023, 09:05");
    }
}
