// Verisure API data-transfer types
//
// Shapes of the overview snapshot and the smart-plug command. Fields use
// `#[serde(default)]` throughout: the API omits fields an installation has
// no hardware for, and unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Overview ─────────────────────────────────────────────────────────

/// Installation state snapshot from `GET /installation/{giid}/overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Overview {
    pub account_permissions: AccountPermissions,
    pub arm_state: ArmState,
    pub armstate_compatible: bool,
    pub control_plugs: Vec<ControlPlug>,
    pub smart_plugs: Vec<SmartPlug>,
    pub door_lock_status_list: Vec<serde_json::Value>,
    pub total_sms_count: i64,
    pub climate_values: Vec<ClimateValue>,
    pub installation_error_list: Vec<serde_json::Value>,
    pub pending_changes: i64,
    pub ethernet_mode_active: bool,
    pub ethernet_connected_now: bool,
    pub heat_pumps: Vec<serde_json::Value>,
    pub smart_cameras: Vec<serde_json::Value>,
    pub latest_ethernet_status: LatestEthernetStatus,
    pub customer_image_cameras: Vec<serde_json::Value>,
    pub battery_process: BatteryProcess,
    pub user_tracking: UserTracking,
    pub event_counts: Vec<serde_json::Value>,
    pub door_window: DoorWindow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountPermissions {
    pub account_permissions_hash: String,
}

/// Alarm arm state. `status_type` is e.g. `DISARMED`, `ARMED_HOME`, `ARMED_AWAY`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArmState {
    pub status_type: String,
    pub date: Option<DateTime<Utc>>,
    pub changed_via: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlPlug {
    pub device_id: String,
    pub device_label: String,
    pub area: String,
    pub profile: String,
    pub current_state: String,
    pub pending_state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmartPlug {
    pub icon: String,
    pub is_hazardous: bool,
    pub device_label: String,
    pub area: String,
    pub current_state: String,
    pub pending_state: String,
}

/// Temperature (and, for some sensors, humidity) reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClimateValue {
    pub device_label: String,
    pub device_area: String,
    pub device_type: String,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LatestEthernetStatus {
    pub latest_ethernet_test_result: bool,
    pub test_date: Option<DateTime<Utc>>,
    pub protected_area: String,
    pub device_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryProcess {
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserTracking {
    pub installation_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoorWindow {
    pub report_state: bool,
    pub door_window_device: Vec<DoorWindowDevice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoorWindowDevice {
    pub device_label: String,
    pub area: String,
    /// `OPEN` or `CLOSE`.
    pub state: String,
    pub wired: bool,
    pub report_time: Option<DateTime<Utc>>,
}

// ── Commands ─────────────────────────────────────────────────────────

/// Desired on/off state for one smart plug, by device label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartPlugState {
    pub device_label: String,
    pub state: bool,
}

impl SmartPlugState {
    pub fn new(device_label: impl Into<String>, state: bool) -> Self {
        Self {
            device_label: device_label.into(),
            state,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn smart_plug_state_wire_shape() {
        let body = serde_json::to_value([
            SmartPlugState::new("X", true),
            SmartPlugState::new("Y", false),
        ])
        .unwrap();
        assert_eq!(
            body,
            json!([
                { "deviceLabel": "X", "state": true },
                { "deviceLabel": "Y", "state": false },
            ])
        );
    }

    #[test]
    fn sparse_overview_defaults_missing_sections() {
        let overview: Overview = serde_json::from_value(json!({
            "armState": { "statusType": "ARMED_AWAY" },
            "someFutureField": { "nested": true }
        }))
        .unwrap();

        assert_eq!(overview.arm_state.status_type, "ARMED_AWAY");
        assert_eq!(overview.arm_state.date, None);
        assert!(overview.smart_plugs.is_empty());
        assert_eq!(overview.door_window, DoorWindow::default());
    }

    #[test]
    fn climate_humidity_is_optional() {
        let value: ClimateValue = serde_json::from_value(json!({
            "deviceLabel": "2BA4 7LCT",
            "deviceArea": "Hall",
            "deviceType": "SMOKE3",
            "temperature": 21.3,
            "time": "2019-03-02T10:11:12.000Z"
        }))
        .unwrap();
        assert_eq!(value.humidity, None);
        assert!((value.temperature - 21.3).abs() < f64::EPSILON);
        assert!(value.time.is_some());
    }
}
