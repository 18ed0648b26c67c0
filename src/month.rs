//! Month parameter parsing and the fixed-year date ranges used by the chart
//! queries.

use time::{Date, Month};

use crate::Error;

/// The year the chart endpoints report on.
pub(crate) const CHART_YEAR: i32 = 2023;

/// Convert a month number from a query parameter into a typed month.
///
/// # Errors
/// Returns [Error::MonthOutOfRange] if `month` is not in 1-12.
pub(crate) fn parse_month_number(month: u8) -> Result<Month, Error> {
    Month::try_from(month).map_err(|_| Error::MonthOutOfRange(month))
}

/// Parse the `month` parameter of the chart endpoints.
///
/// Accepts full English month names, three letter abbreviations, and month
/// numbers, all case-insensitively: "March", "march", "MAR", and "3" all
/// parse as [Month::March]. The other endpoints take month numbers only, so
/// number form is what they pass along when composing chart data.
///
/// # Errors
/// Returns [Error::InvalidChartMonth] if `text` is none of the above.
pub(crate) fn parse_chart_month(text: &str) -> Result<Month, Error> {
    let normalized = text.trim().to_ascii_lowercase();

    let month = match normalized.as_str() {
        "january" | "jan" => Month::January,
        "february" | "feb" => Month::February,
        "march" | "mar" => Month::March,
        "april" | "apr" => Month::April,
        "may" => Month::May,
        "june" | "jun" => Month::June,
        "july" | "jul" => Month::July,
        "august" | "aug" => Month::August,
        "september" | "sep" => Month::September,
        "october" | "oct" => Month::October,
        "november" | "nov" => Month::November,
        "december" | "dec" => Month::December,
        _ => normalized
            .parse::<u8>()
            .ok()
            .and_then(|number| Month::try_from(number).ok())
            .ok_or_else(|| Error::InvalidChartMonth(text.to_string()))?,
    };

    Ok(month)
}

/// The date range of one calendar month of [CHART_YEAR].
///
/// `end` is exclusive: the first day of the following month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChartMonthRange {
    /// The first day of the month.
    pub start: Date,
    /// The first day of the next month.
    pub end: Date,
}

/// Compute the [CHART_YEAR] date range for `month`.
pub(crate) fn chart_month_range(month: Month) -> ChartMonthRange {
    let end_year = if month == Month::December {
        CHART_YEAR + 1
    } else {
        CHART_YEAR
    };

    ChartMonthRange {
        start: Date::from_calendar_date(CHART_YEAR, month, 1).expect("invalid month start date"),
        end: Date::from_calendar_date(end_year, month.next(), 1).expect("invalid month end date"),
    }
}
