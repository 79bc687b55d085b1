//! The fingerprint pipeline: detect, draw, read back, downsample.

use serde::Serialize;
use wasm_bindgen::JsValue;

use crate::config::{FingerprintOptions, SAMPLE_STRIDE, SURFACE_HEIGHT, SURFACE_WIDTH};
use crate::detector;
use crate::error::Result;
use crate::host::FingerprintHost;
use crate::sampling;
use crate::scene;

/// Sentinel returned in place of a fingerprint when tampering is detected.
pub const TAMPERED_SENTINEL: &str = "tampered";

/// The fingerprint payload handed to JS.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasFingerprint {
    #[serde(rename = "downsampledCanvasFP")]
    pub downsampled_canvas_fp: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FingerprintOutcome {
    /// The detector did not pass the live primitive. No drawing happened.
    Tampered,
    Fingerprint(CanvasFingerprint),
}

impl FingerprintOutcome {
    /// `"tampered"` or the payload object.
    pub fn into_js(self) -> std::result::Result<JsValue, JsValue> {
        match self {
            FingerprintOutcome::Tampered => Ok(JsValue::from_str(TAMPERED_SENTINEL)),
            FingerprintOutcome::Fingerprint(fp) => Ok(serde_wasm_bindgen::to_value(&fp)?),
        }
    }
}

/// One generator for both the basic and the device-enriched variant.
pub struct Fingerprinter<H> {
    host: H,
    options: FingerprintOptions,
}

impl<H: FingerprintHost> Fingerprinter<H> {
    pub fn new(host: H, options: FingerprintOptions) -> Self {
        Self { host, options }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Awaitable form of [`Self::generate`]. Never actually suspends.
    pub async fn fingerprint(&self) -> Result<FingerprintOutcome> {
        self.generate()
    }

    /// Run the pipeline once. Tampering yields [`FingerprintOutcome::Tampered`];
    /// rendering failures are returned as errors.
    pub fn generate(&self) -> Result<FingerprintOutcome> {
        let detection = detector::detect(&self.host);
        if !detection.passed() {
            log::info!(
                "Canvas primitive looks tampered (native={}, wrapper={})",
                detection.is_native,
                detection.has_wrapper_patterns
            );
            return Ok(FingerprintOutcome::Tampered);
        }

        let mut surface = self.host.create_surface(SURFACE_WIDTH, SURFACE_HEIGHT)?;
        let pixels = scene::render(&mut surface)?;
        let downsampled_canvas_fp = sampling::downsample(&pixels, SAMPLE_STRIDE);

        let device_string = self
            .options
            .include_device_info
            .then(|| self.host.device_descriptor().to_device_string());

        Ok(FingerprintOutcome::Fingerprint(CanvasFingerprint {
            downsampled_canvas_fp,
            device_string,
        }))
    }
}
