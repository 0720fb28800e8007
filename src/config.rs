//! Application constants and defaults.

pub const APP_NAME: &str = "Clinicore";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Clinic hours as fractional 24h clock values. Bookings must start at
/// or after opening and strictly before closing.
pub const CLINIC_OPENING_HOUR: f64 = 8.0;
pub const CLINIC_CLOSING_HOUR: f64 = 20.0;

/// Default appointment length in hours.
pub const DEFAULT_APPOINTMENT_DURATION: f64 = 1.0;
/// Emergency slots are half-length.
pub const EMERGENCY_APPOINTMENT_DURATION: f64 = 0.5;

pub fn default_log_filter() -> String {
    std::env::var("CLINICORE_LOG").unwrap_or_else(|_| "info".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clinic_hours_span_twelve_hours() {
        assert_eq!(CLINIC_CLOSING_HOUR - CLINIC_OPENING_HOUR, 12.0);
    }

    #[test]
    fn emergency_slots_are_shorter() {
        assert!(EMERGENCY_APPOINTMENT_DURATION < DEFAULT_APPOINTMENT_DURATION);
    }

    #[test]
    fn default_filter_is_info() {
        assert_eq!(default_log_filter(), "info");
    }
}
