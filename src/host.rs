//! The environment seam between the pipeline and the browser.

use crate::config::Primitive;
use crate::device::DeviceDescriptor;
use crate::error::Result;
use crate::scene::DrawingSurface;

/// Everything the pipeline needs from its environment.
///
/// [`crate::browser::BrowserHost`] is the real implementation; tests supply
/// in-memory ones.
pub trait FingerprintHost {
    type Surface: DrawingSurface;

    /// Source text of the primitive's *current* binding on its prototype.
    fn primitive_source(&self, primitive: Primitive) -> Result<String>;

    /// A fresh drawing surface of the given size.
    fn create_surface(&self, width: u32, height: u32) -> Result<Self::Surface>;

    /// Device attributes, read now. Missing values use their defaults.
    fn device_descriptor(&self) -> DeviceDescriptor;
}
