//! Fingerprint configuration and the fixed constants of the pipeline.
//!
//! Changing any of the surface, stride or scene constants changes the
//! distribution of every fingerprint produced, so they travel together with
//! [`crate::scene::SCENE_VERSION`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canvas width in CSS pixels.
pub const SURFACE_WIDTH: u32 = 200;
/// Canvas height in CSS pixels.
pub const SURFACE_HEIGHT: u32 = 200;
/// Every `SAMPLE_STRIDE`-th channel value is kept when downsampling.
pub const SAMPLE_STRIDE: usize = 100;
/// Separator used to join device attributes.
pub const DEVICE_DELIMITER: &str = "::";

/// A platform function whose output is usable for fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    #[serde(rename = "getImageData")]
    GetImageData,
    #[serde(rename = "toBlob")]
    ToBlob,
    #[serde(rename = "toDataURL")]
    ToDataUrl,
}

impl Primitive {
    /// The primitive the tamper detector inspects and the installer always locks.
    pub const PRIMARY: Primitive = Primitive::GetImageData;

    /// Name of the global constructor whose prototype owns the primitive.
    pub fn owner(self) -> &'static str {
        match self {
            Primitive::GetImageData => "CanvasRenderingContext2D",
            Primitive::ToBlob | Primitive::ToDataUrl => "HTMLCanvasElement",
        }
    }

    /// Property name on the owning prototype.
    pub fn property(self) -> &'static str {
        match self {
            Primitive::GetImageData => "getImageData",
            Primitive::ToBlob => "toBlob",
            Primitive::ToDataUrl => "toDataURL",
        }
    }

    /// Leading token of the function's source when it is the native implementation.
    pub fn native_signature(self) -> String {
        format!("function {}()", self.property())
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.prototype.{}", self.owner(), self.property())
    }
}

/// Options shared by every public entry point.
///
/// Deserialized from a JS object; unknown or malformed input falls back to
/// the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FingerprintOptions {
    /// Attach the `"::"`-joined device descriptor to the result.
    pub include_device_info: bool,
    /// Primitives locked and guarded in addition to [`Primitive::PRIMARY`].
    pub lock_additional_primitives: Vec<Primitive>,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            include_device_info: false,
            lock_additional_primitives: Vec::new(),
        }
    }
}

impl FingerprintOptions {
    /// `getFingerprint()`: canvas sample only.
    pub fn basic() -> Self {
        Self::default()
    }

    /// `getFingerprintString()`: canvas sample plus device string, with
    /// `toBlob` locked as well.
    pub fn extended() -> Self {
        Self {
            include_device_info: true,
            lock_additional_primitives: vec![Primitive::ToBlob],
        }
    }

    /// All primitives to lock, primary first, without duplicates.
    pub fn locked_primitives(&self) -> Vec<Primitive> {
        let mut primitives = vec![Primitive::PRIMARY];
        for p in &self.lock_additional_primitives {
            if !primitives.contains(p) {
                primitives.push(*p);
            }
        }
        primitives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_is_get_image_data() {
        assert_eq!(Primitive::PRIMARY.owner(), "CanvasRenderingContext2D");
        assert_eq!(Primitive::PRIMARY.property(), "getImageData");
        assert_eq!(Primitive::PRIMARY.native_signature(), "function getImageData()");
    }

    #[test]
    fn test_locked_primitives_dedup() {
        let options = FingerprintOptions {
            include_device_info: false,
            lock_additional_primitives: vec![
                Primitive::ToBlob,
                Primitive::GetImageData,
                Primitive::ToBlob,
            ],
        };
        assert_eq!(
            options.locked_primitives(),
            vec![Primitive::GetImageData, Primitive::ToBlob]
        );
        assert_eq!(FingerprintOptions::basic().locked_primitives(), vec![Primitive::GetImageData]);
    }

    #[test]
    fn test_options_deserialize_camel_case_with_defaults() {
        let options: FingerprintOptions =
            serde_json::from_str(r#"{ "lockAdditionalPrimitives": ["toDataURL"] }"#).unwrap();
        assert!(!options.include_device_info);
        assert_eq!(options.lock_additional_primitives, vec![Primitive::ToDataUrl]);

        let options: FingerprintOptions =
            serde_json::from_str(r#"{ "includeDeviceInfo": true }"#).unwrap();
        assert!(options.include_device_info);
        assert!(options.lock_additional_primitives.is_empty());
    }
}
