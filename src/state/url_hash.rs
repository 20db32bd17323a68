//! Camera state in the URL fragment.
//!
//! Encodes the camera as `#zoom/lat/lng/bearing/pitch` so reloading restores
//! the view and links can be shared. Bearing is omitted when both bearing and
//! pitch are zero, pitch when it is zero.

use crate::map::Camera;
use std::f64::consts::{LN_10, LN_2};

/// Decimal places for the center at `zoom`; roughly one pixel of precision.
fn center_precision(zoom: f64) -> i32 {
    ((zoom * LN_2 + (512.0_f64 / 360.0 / 0.5).ln()) / LN_10)
        .ceil()
        .max(0.0) as i32
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let m = 10f64.powi(decimals);
    // Adding zero turns a negative zero into zero.
    (value * m).round() / m + 0.0
}

/// Formats `camera` as a URL fragment, including the leading `#`.
pub fn format_hash(camera: &Camera) -> String {
    let zoom = round_to(camera.zoom, 2);
    let precision = center_precision(zoom);
    let lat = round_to(camera.lat(), precision);
    let lng = round_to(camera.lon(), precision);

    let mut hash = format!("#{}/{}/{}", zoom, lat, lng);
    if camera.bearing != 0.0 || camera.pitch != 0.0 {
        hash.push_str(&format!("/{}", round_to(camera.bearing, 1)));
    }
    if camera.pitch != 0.0 {
        hash.push_str(&format!("/{}", camera.pitch.round() + 0.0));
    }
    hash
}

/// Parses a fragment produced by [`format_hash`]. The leading `#` is optional.
///
/// Returns `None` unless the fragment has three to five numeric parts.
pub fn parse_hash(fragment: &str) -> Option<Camera> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let parts: Vec<f64> = fragment
        .split('/')
        .map(|part| part.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<_>>()?;

    if !(3..=5).contains(&parts.len()) {
        return None;
    }

    let mut camera = Camera::new(parts[2], parts[1], parts[0]);
    camera.bearing = parts.get(3).copied().unwrap_or(0.0);
    camera.pitch = parts.get(4).copied().unwrap_or(0.0);
    Some(camera)
}

/// Reads the fragment of the current page URL.
#[cfg(target_arch = "wasm32")]
pub fn read_from_location() -> Option<String> {
    let hash = web_sys::window()?.location().hash().ok()?;
    (!hash.is_empty()).then_some(hash)
}

/// No-op stub for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn read_from_location() -> Option<String> {
    None
}

/// Replaces the fragment of the current page URL without adding a history entry.
#[cfg(target_arch = "wasm32")]
pub fn replace_in_location(hash: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(history) = window.history() else {
        return;
    };
    if let Err(e) = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(hash)) {
        log::warn!("Failed to update URL fragment: {:?}", e);
    }
}

/// No-op stub for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn replace_in_location(_hash: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_initial_camera() {
        assert_eq!(format_hash(&Camera::default()), "#16.23/35.661738/139.744935/0/73");
    }

    #[test]
    fn test_format_omits_zero_bearing_and_pitch() {
        let camera = Camera::new(139.7, 35.6, 12.0);
        assert_eq!(format_hash(&camera), "#12/35.6/139.7");

        let mut rotated = camera.clone();
        rotated.bearing = -12.34;
        assert_eq!(format_hash(&rotated), "#12/35.6/139.7/-12.3");
    }

    #[test]
    fn test_precision_follows_zoom() {
        let camera = Camera::new(139.744935, 35.661738, 2.0);
        // two decimals at zoom 2
        assert_eq!(format_hash(&camera), "#2/35.66/139.74");
    }

    #[test]
    fn test_parse_hash() {
        let camera = parse_hash("#16.23/35.661738/139.744935/0/73").unwrap();
        assert_eq!(camera, Camera::default());

        let camera = parse_hash("10/35/139").unwrap();
        assert_eq!((camera.zoom, camera.lat(), camera.lon()), (10.0, 35.0, 139.0));
        assert_eq!((camera.bearing, camera.pitch), (0.0, 0.0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "#", "#10/35", "#10/35/abc", "#1/2/3/4/5/6", "#NaN/1/2", "map=10/35/139"] {
            assert!(parse_hash(bad).is_none(), "accepted {:?}", bad);
        }
    }
}
