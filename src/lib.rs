//! # canvas-sentinel
//!
//! Lightweight canvas/device fingerprinting that refuses to fingerprint a
//! page whose canvas primitives have been intercepted.
//!
//! ## Architecture
//!
//! ```text
//! module load ──► protection::install_protection   (lock getImageData, guard defineProperty)
//!
//! getFingerprint() / getFingerprintString()
//!   ↓
//! detector::detect        live getImageData source → Passed | Tampered
//!   ↓ Passed                                         ↓ Tampered
//! scene::render → sampling::downsample            "tampered"
//!   ↓
//! { downsampledCanvasFP, deviceString? }
//! ```
//!
//! ## Usage
//!
//! ```javascript
//! import init, { getFingerprint, getFingerprintString } from './pkg/canvas_sentinel.js';
//! await init();
//! const fp = await getFingerprint();          // "tampered" | { downsampledCanvasFP }
//! const full = await getFingerprintString();  // "tampered" | { downsampledCanvasFP, deviceString }
//! ```
//!
//! ## Limitations
//!
//! Detection reads `Function.prototype.toString` output, which a careful
//! interceptor can make look native. Expect false negatives.

use wasm_bindgen::prelude::*;

pub mod browser;
pub mod config;
pub mod detector;
pub mod device;
mod error;
pub mod generator;
pub mod host;
pub mod js_helpers;
pub mod protection;
pub mod sampling;
pub mod scene;

pub use browser::{BrowserHost, CanvasSurface};
pub use config::{FingerprintOptions, Primitive};
pub use detector::{DetectionResult, Verdict};
pub use device::DeviceDescriptor;
pub use error::{ErrorCode, FingerprintError, Result};
pub use generator::{CanvasFingerprint, FingerprintOutcome, Fingerprinter, TAMPERED_SENTINEL};
pub use host::FingerprintHost;
pub use protection::{install_protection, ProtectionContext, ProtectionReport};

/// Module initialization: logging, then canvas protection.
///
/// Protection covers every primitive either entry point relies on, so both
/// variants are locked down before any page script can run after us.
#[wasm_bindgen(start)]
pub fn init() {
    // A second init (e.g. module re-instantiated) keeps the existing logger.
    let _ = console_log::init_with_level(log::Level::Info);

    if let Err(e) = protection::install_protection(&FingerprintOptions::extended()) {
        log::error!("Canvas protection not installed: {}", e);
    }
}

async fn run(options: FingerprintOptions) -> std::result::Result<JsValue, JsValue> {
    protection::install_protection(&options)?;
    Fingerprinter::new(BrowserHost::new(), options)
        .fingerprint()
        .await?
        .into_js()
}

/// `"tampered"` or `{ downsampledCanvasFP: number[] }`.
#[wasm_bindgen(js_name = getFingerprint)]
pub async fn get_fingerprint() -> std::result::Result<JsValue, JsValue> {
    run(FingerprintOptions::basic()).await
}

/// `"tampered"` or `{ downsampledCanvasFP: number[], deviceString: string }`.
#[wasm_bindgen(js_name = getFingerprintString)]
pub async fn get_fingerprint_string() -> std::result::Result<JsValue, JsValue> {
    run(FingerprintOptions::extended()).await
}

/// Unified entry point:
/// ```javascript
/// await getFingerprintWithOptions({ includeDeviceInfo: true, lockAdditionalPrimitives: ["toDataURL"] });
/// ```
#[wasm_bindgen(js_name = getFingerprintWithOptions)]
pub async fn get_fingerprint_with_options(options: JsValue) -> std::result::Result<JsValue, JsValue> {
    let options: FingerprintOptions = if options.is_undefined() || options.is_null() {
        FingerprintOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed fingerprint options: {}", e);
            FingerprintOptions::default()
        })
    };
    run(options).await
}

/// `"tampered"` or `"not tampered"` for the live `getImageData`.
#[wasm_bindgen(js_name = detectCanvasTampering)]
pub fn detect_canvas_tampering() -> String {
    detector::detect(&BrowserHost::new()).label().to_string()
}

/// Full detector diagnostics for the live `getImageData`.
#[wasm_bindgen(js_name = inspectCanvasPrimitive)]
pub fn inspect_canvas_primitive() -> std::result::Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(&detector::detect(&BrowserHost::new()))?)
}

/// Attempt counter and lock status of the installed protection.
#[wasm_bindgen(js_name = getProtectionReport)]
pub fn get_protection_report() -> std::result::Result<JsValue, JsValue> {
    let report = protection::installed()
        .map(|ctx| ctx.report())
        .unwrap_or_default();
    Ok(serde_wasm_bindgen::to_value(&report)?)
}
