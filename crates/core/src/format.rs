//! Display formatting helpers for paper metadata

use chrono::NaiveDate;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y"];

/// Join up to `max_display` author names, collapsing the rest into an
/// "et al." suffix with the hidden count.
pub fn format_authors(authors: &[String], max_display: usize) -> String {
    if authors.is_empty() {
        return String::new();
    }

    if authors.len() <= max_display {
        authors.join(", ")
    } else {
        format!(
            "{} et al. (+{})",
            authors[..max_display].join(", "),
            authors.len() - max_display
        )
    }
}

/// Normalize a date string to "Month DD, YYYY". Unparseable input is
/// returned unchanged.
pub fn format_date(date_str: &str) -> String {
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, fmt) {
            return date.format("%B %d, %Y").to_string();
        }
    }
    date_str.to_string()
}
