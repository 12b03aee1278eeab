//! Value formatting for the summary artifact and the grouped view.

/// Format an encoded year-month (`year * 100 + month`) as `YYYY-MM`.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_year_month;
///
/// assert_eq!(format_year_month(202403), "2024-03");
/// assert_eq!(format_year_month(202512), "2025-12");
/// ```
pub fn format_year_month(year_month: u32) -> String {
    format!("{:04}-{:02}", year_month / 100, year_month % 100)
}

/// Parse a `YYYY-MM` string back into the `year * 100 + month` encoding.
///
/// Returns `None` when the shape or the month range is wrong.
///
/// # Examples
///
/// ```
/// use report_core::formatting::parse_year_month;
///
/// assert_eq!(parse_year_month("2024-03"), Some(202403));
/// assert_eq!(parse_year_month("2024-13"), None);
/// assert_eq!(parse_year_month("202403"), None);
/// ```
pub fn parse_year_month(text: &str) -> Option<u32> {
    let (year_str, month_str) = text.split_once('-')?;
    if year_str.len() != 4 || month_str.len() != 2 {
        return None;
    }
    let year: u32 = year_str.parse().ok()?;
    let month: u32 = month_str.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(year * 100 + month)
}

/// Format a statistic value to the two decimal places used by the summary
/// artifact.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_stat;
///
/// assert_eq!(format_stat(25.0), "25.00");
/// assert_eq!(format_stat(19.456), "19.46");
/// ```
pub fn format_stat(value: f64) -> String {
    format!("{:.2}", value)
}
