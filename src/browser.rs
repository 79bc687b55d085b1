//! Browser implementation of [`FingerprintHost`] on top of web-sys.

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Navigator, Screen, Window};

use crate::config::Primitive;
use crate::device::{number_or_zero, string_or_unknown, DeviceDescriptor};
use crate::error::{describe_js, FingerprintError, Result};
use crate::host::FingerprintHost;
use crate::js_helpers;
use crate::scene::{DrawOp, DrawingSurface};

/// Reads the live page through `window`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHost;

impl BrowserHost {
    pub fn new() -> Self {
        Self
    }
}

impl FingerprintHost for BrowserHost {
    type Surface = CanvasSurface;

    fn primitive_source(&self, primitive: Primitive) -> Result<String> {
        let env = |e: JsValue| FingerprintError::Environment(describe_js(&e));

        let proto = js_helpers::get_prototype(primitive.owner()).map_err(env)?;
        if proto.is_undefined() || proto.is_null() {
            return Err(FingerprintError::Environment(format!(
                "{} is not available",
                primitive.owner()
            )));
        }
        let live = Reflect::get(&proto, &JsValue::from_str(primitive.property())).map_err(env)?;
        if !live.is_function() {
            return Err(FingerprintError::Environment(format!(
                "{} is not a function",
                primitive
            )));
        }
        js_helpers::function_source(&live).map_err(env)
    }

    fn create_surface(&self, width: u32, height: u32) -> Result<CanvasSurface> {
        CanvasSurface::new(width, height)
    }

    fn device_descriptor(&self) -> DeviceDescriptor {
        let window = web_sys::window();
        let navigator = window.as_ref().map(Window::navigator);
        let screen = window.as_ref().and_then(|w| w.screen().ok());

        DeviceDescriptor {
            platform: string_or_unknown(navigator.as_ref().and_then(|n| n.platform().ok())),
            user_agent: string_or_unknown(navigator.as_ref().and_then(|n| n.user_agent().ok())),
            screen_width: number_or_zero(screen.as_ref().and_then(|s| s.width().ok()).map(f64::from)),
            screen_height: number_or_zero(
                screen.as_ref().and_then(|s| s.height().ok()).map(f64::from),
            ),
            pixel_ratio: number_or_zero(window.as_ref().map(Window::device_pixel_ratio)),
            device_memory: number_or_zero(navigator.as_ref().and_then(device_memory)),
            color_depth: number_or_zero(screen.as_ref().and_then(color_depth)),
            hardware_concurrency: number_or_zero(
                navigator.as_ref().map(Navigator::hardware_concurrency),
            ),
        }
    }
}

/// `navigator.deviceMemory` is Chromium-only and absent from web-sys.
fn device_memory(navigator: &Navigator) -> Option<f64> {
    Reflect::get(navigator, &JsValue::from_str("deviceMemory"))
        .ok()
        .and_then(|v| v.as_f64())
}

fn color_depth(screen: &Screen) -> Option<f64> {
    screen.color_depth().ok().map(f64::from)
}

/// An off-DOM `<canvas>` with its 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| FingerprintError::RenderingUnavailable("no document".into()))?;

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| FingerprintError::rendering("createElement", e))?
            .dyn_into()
            .map_err(|_| FingerprintError::RenderingUnavailable("element is not a canvas".into()))?;
        canvas.set_width(width);
        canvas.set_height(height);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| FingerprintError::rendering("getContext", e))?
            .ok_or_else(|| FingerprintError::RenderingUnavailable("2d context unavailable".into()))?
            .dyn_into()
            .map_err(|_| {
                FingerprintError::RenderingUnavailable("not a CanvasRenderingContext2D".into())
            })?;

        Ok(Self { canvas, ctx })
    }
}

impl DrawingSurface for CanvasSurface {
    fn apply(&mut self, op: &DrawOp) -> Result<()> {
        match *op {
            DrawOp::TextBaseline(baseline) => self.ctx.set_text_baseline(baseline),
            DrawOp::Font(font) => self.ctx.set_font(font),
            DrawOp::FillStyle(color) => {
                Reflect::set(&self.ctx, &JsValue::from_str("fillStyle"), &JsValue::from_str(color))
                    .map_err(|e| FingerprintError::rendering("fillStyle", e))?;
            }
            DrawOp::FillRect { x, y, w, h } => self.ctx.fill_rect(x, y, w, h),
            DrawOp::FillText { text, x, y } => self
                .ctx
                .fill_text(text, x, y)
                .map_err(|e| FingerprintError::rendering("fillText", e))?,
        }
        Ok(())
    }

    fn pixels(&self) -> Result<Vec<u8>> {
        let width = f64::from(self.canvas.width());
        let height = f64::from(self.canvas.height());
        let image = self
            .ctx
            .get_image_data(0.0, 0.0, width, height)
            .map_err(|e| FingerprintError::rendering("getImageData", e))?;
        Ok(image.data().0)
    }
}
