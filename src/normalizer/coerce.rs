//! Best-effort numeric coercion of sensor readings.

use crate::constants::MISSING_VALUE_MARKERS;

/// Coerce a cell to a finite number; anything else is missing
pub fn coerce_numeric(cell: Option<&str>) -> Option<f64> {
    let text = cell?.trim().trim_matches('"').trim();
    if MISSING_VALUE_MARKERS.contains(&text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values() {
        assert_eq!(coerce_numeric(Some("12.5")), Some(12.5));
        assert_eq!(coerce_numeric(Some(" -3 ")), Some(-3.0));
        assert_eq!(coerce_numeric(Some("\"7\"")), Some(7.0));
        assert_eq!(coerce_numeric(Some("1e3")), Some(1000.0));
    }

    #[test]
    fn test_sensor_dropouts_become_missing() {
        assert_eq!(coerce_numeric(None), None);
        assert_eq!(coerce_numeric(Some("")), None);
        assert_eq!(coerce_numeric(Some("NAN")), None);
        assert_eq!(coerce_numeric(Some("NA")), None);
        assert_eq!(coerce_numeric(Some("inf")), None);
        assert_eq!(coerce_numeric(Some("W/m2")), None);
    }
}
