//! Coarse device/environment attributes.
//!
//! Read fresh from the environment on each call. Absent attributes fall back
//! to `"unknown"` for strings and `0` for numbers.

use serde::{Deserialize, Serialize};

use crate::config::DEVICE_DELIMITER;

/// Default for string attributes the environment does not expose.
pub const UNKNOWN: &str = "unknown";

/// Fixed-shape device record. Field order is the order of the device string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub platform: String,
    pub user_agent: String,
    pub screen_width: f64,
    pub screen_height: f64,
    pub pixel_ratio: f64,
    pub device_memory: f64,
    pub color_depth: f64,
    pub hardware_concurrency: f64,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            platform: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
            screen_width: 0.0,
            screen_height: 0.0,
            pixel_ratio: 0.0,
            device_memory: 0.0,
            color_depth: 0.0,
            hardware_concurrency: 0.0,
        }
    }
}

impl DeviceDescriptor {
    /// Join all eight attributes with `"::"` in their fixed order.
    ///
    /// Numbers render the way JS would stringify them (`1920`, `1.25`, `0`).
    pub fn to_device_string(&self) -> String {
        [
            self.platform.clone(),
            self.user_agent.clone(),
            js_number(self.screen_width),
            js_number(self.screen_height),
            js_number(self.pixel_ratio),
            js_number(self.device_memory),
            js_number(self.color_depth),
            js_number(self.hardware_concurrency),
        ]
        .join(DEVICE_DELIMITER)
    }
}

/// Build a string attribute, substituting the default when missing or empty.
pub fn string_or_unknown(value: Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => UNKNOWN.to_string(),
    }
}

/// Build a numeric attribute, substituting `0` when missing or not finite.
pub fn number_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn js_number(value: f64) -> String {
    if value == 0.0 {
        // Covers -0, which JS also prints as "0".
        "0".to_string()
    } else {
        value.to_string()
    }
}
