//! Builds the human-readable notification message for an alert.

use crate::core::AlertRecord;

/// Renders the single SMS body sent to every contact of a device: device
/// id, reason, location, and the server receipt time.
pub fn sms_body(record: &AlertRecord) -> String {
    let reason = record.alert.reason.as_deref().unwrap_or("UNKNOWN");
    let location = match (record.alert.lat, record.alert.lon) {
        (Some(lat), Some(lon)) => format!("{}, {}", lat, lon),
        _ => "no GPS fix".to_string(),
    };
    format!(
        "CLIPWATCH ALERT\nDevice: {}\nReason: {}\nLocation: {}\nTime: {}",
        record.alert.device_id,
        reason,
        location,
        record.server_ts.to_rfc3339(),
    )
}
