//! Parsing of client supplied dates and the calendar windows used to filter
//! transactions.

use time::{
    Date, Month, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::BorrowedFormatItem, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::Error;

/// Date only format accepted from clients, e.g. "2024-03-01".
const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a date sent by a client.
///
/// Accepts either an RFC 3339 timestamp, which is converted to UTC, or a plain
/// calendar date, which is taken to be midnight UTC.
///
/// # Errors
/// Returns [Error::InvalidDate] if `raw` matches neither format.
pub fn parse_client_date(raw: &str) -> Result<OffsetDateTime, Error> {
    let raw = raw.trim();

    if let Ok(date_time) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(date_time.to_offset(UtcOffset::UTC));
    }

    Date::parse(raw, DATE_FORMAT)
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| Error::InvalidDate(raw.to_owned()))
}

/// A half-open range of time `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// The first instant in the window.
    pub start: OffsetDateTime,
    /// The first instant after the window.
    pub end: OffsetDateTime,
}

impl DateWindow {
    /// The calendar month `zero_based_month` (0 = January) of `year` in UTC.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `zero_based_month` is outside 0-11, or
    /// [Error::InvalidYear] if the month cannot be represented.
    pub fn month(year: i32, zero_based_month: i32) -> Result<Self, Error> {
        let month = u8::try_from(zero_based_month)
            .ok()
            .filter(|month| *month < 12)
            .and_then(|month| Month::try_from(month + 1).ok())
            .ok_or(Error::InvalidMonth)?;

        let start = first_instant(year, month)?;
        let end = match month {
            Month::December => window_end(year.checked_add(1), Month::January),
            month => window_end(Some(year), month.next()),
        };

        Ok(Self { start, end })
    }

    /// The calendar year `year` in UTC.
    ///
    /// # Errors
    /// Returns [Error::InvalidYear] if the year cannot be represented.
    pub fn year(year: i32) -> Result<Self, Error> {
        Ok(Self {
            start: first_instant(year, Month::January)?,
            end: window_end(year.checked_add(1), Month::January),
        })
    }
}

fn first_instant(year: i32, month: Month) -> Result<OffsetDateTime, Error> {
    Date::from_calendar_date(year, month, 1)
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| Error::InvalidYear(year))
}

/// The first instant of `month` in `year`, or the last representable instant
/// if that month is past the supported calendar range.
fn window_end(year: Option<i32>, month: Month) -> OffsetDateTime {
    year.and_then(|year| Date::from_calendar_date(year, month, 1).ok())
        .map_or(PrimitiveDateTime::MAX.assume_utc(), |date| {
            date.midnight().assume_utc()
        })
}
