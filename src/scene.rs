//! The deterministic drawing stimulus.
//!
//! The operation list below is part of the fingerprint contract: fonts,
//! colors and coordinates all shape the pixel distribution. Bump
//! [`SCENE_VERSION`] whenever it changes.

use crate::error::Result;

/// Version of [`SCENE`].
pub const SCENE_VERSION: u32 = 1;

/// One drawing operation on a 2D context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOp {
    TextBaseline(&'static str),
    Font(&'static str),
    FillStyle(&'static str),
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    FillText { text: &'static str, x: f64, y: f64 },
}

/// Orange box with blue text overlapping it. Anti-aliasing and font
/// rasterization of the text are what vary across devices.
pub const SCENE: &[DrawOp] = &[
    DrawOp::TextBaseline("top"),
    DrawOp::Font("14px Arial"),
    DrawOp::FillStyle("#f60"),
    DrawOp::FillRect { x: 100.0, y: 1.0, w: 62.0, h: 20.0 },
    DrawOp::FillStyle("#069"),
    DrawOp::FillText { text: "fingerprint-test", x: 2.0, y: 15.0 },
];

/// A 2D drawing surface of fixed size.
pub trait DrawingSurface {
    /// Apply one drawing operation.
    fn apply(&mut self, op: &DrawOp) -> Result<()>;

    /// Read back the RGBA buffer of the whole surface
    /// (`width * height * 4` bytes).
    fn pixels(&self) -> Result<Vec<u8>>;
}

/// Draw [`SCENE`] and return the raw pixel buffer.
pub fn render<S: DrawingSurface>(surface: &mut S) -> Result<Vec<u8>> {
    for op in SCENE {
        surface.apply(op)?;
    }
    surface.pixels()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FingerprintError;

    #[derive(Default)]
    struct Recorder {
        ops: Vec<DrawOp>,
        fail_readback: bool,
    }

    impl DrawingSurface for Recorder {
        fn apply(&mut self, op: &DrawOp) -> Result<()> {
            self.ops.push(*op);
            Ok(())
        }

        fn pixels(&self) -> Result<Vec<u8>> {
            if self.fail_readback {
                return Err(FingerprintError::RenderingUnavailable("tainted".into()));
            }
            Ok(vec![0; 16])
        }
    }

    #[test]
    fn test_render_applies_scene_in_order() {
        let mut surface = Recorder::default();
        let pixels = render(&mut surface).unwrap();

        assert_eq!(pixels.len(), 16);
        assert_eq!(surface.ops, SCENE.to_vec());
        assert_eq!(surface.ops[0], DrawOp::TextBaseline("top"));
        assert!(matches!(
            surface.ops[5],
            DrawOp::FillText { text: "fingerprint-test", .. }
        ));
    }

    #[test]
    fn test_render_propagates_readback_failure() {
        let mut surface = Recorder {
            fail_readback: true,
            ..Default::default()
        };
        assert!(matches!(
            render(&mut surface),
            Err(FingerprintError::RenderingUnavailable(_))
        ));
    }
}
