//! Text rendering for drawn shapes.

/// Formats a length with two decimals (e.g., "3.00").
#[must_use]
pub fn format_length(value: f64) -> String {
    format!("{value:.2}")
}

/// Formats an area with two decimals and a unit suffix.
#[must_use]
pub fn format_area(value: f64) -> String {
    format!("{} sq units", format_length(value))
}

/// One line describing a drawn shape.
#[must_use]
pub fn draw_line(color: &str, shape: &str, dimensions: &[(&str, f64)], area: f64) -> String {
    let dims = dimensions
        .iter()
        .map(|(name, value)| format!("{name} {}", format_length(*value)))
        .collect::<Vec<_>>()
        .join(" and ");
    format!("Drawing a {color} {shape} of {dims} ({})", format_area(area))
}
