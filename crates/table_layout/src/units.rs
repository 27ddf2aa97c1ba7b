//! Points and pixels

/// Convert points to CSS pixels (96 px per 72 pt)
pub fn points_to_pixels(points: f64) -> f64 {
    points * 4.0 / 3.0
}

/// Convert CSS pixels to points
pub fn pixels_to_points(pixels: f64) -> f64 {
    pixels * 3.0 / 4.0
}

/// Render a point value as an attribute string such as `"300pt"`,
/// rounded to two decimals
pub fn format_points(points: f64) -> String {
    let rounded = (points * 100.0).round() / 100.0;
    format!("{}pt", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        assert_eq!(points_to_pixels(75.0), 100.0);
        assert_eq!(pixels_to_points(624.0), 468.0);
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(300.0), "300pt");
        assert_eq!(format_points(155.999), "156pt");
        assert_eq!(format_points(100.0 / 3.0), "33.33pt");
    }
}
