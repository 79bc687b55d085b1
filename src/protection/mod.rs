//! Canvas primitive lock-down.
//!
//! Installing protection does three things, once per thread:
//!
//! 1. Captures the current value of each configured primitive.
//! 2. Re-defines it on its prototype as `writable: false, configurable: false`.
//! 3. Replaces `Object.defineProperty` with a guard that swallows any
//!    redefinition of a protected primitive and forwards everything else.
//!
//! Step 2 failing (already frozen, hostile page) is recorded and logged but
//! does not stop step 3.
//!
//! Callers that want the attempt counter hold on to the returned
//! [`ProtectionContext`]; [`installed`] hands out the same instance.

pub mod guard;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::{FingerprintOptions, Primitive};
use crate::error::{describe_js, FingerprintError, Result};
use crate::js_helpers;
pub use guard::{Interception, RedefinitionGuard};

thread_local! {
    static INSTALLED: RefCell<Option<Rc<ProtectionContext>>> = const { RefCell::new(None) };
}

/// Install protection for the primitives named by `options`, or extend the
/// already-installed context with any that are not yet covered.
///
/// Calling this repeatedly never re-wraps `Object.defineProperty` and never
/// re-locks a primitive that is already locked.
pub fn install_protection(options: &FingerprintOptions) -> Result<Rc<ProtectionContext>> {
    let primitives = options.locked_primitives();
    if let Some(ctx) = installed() {
        ctx.lock(&primitives);
        return Ok(ctx);
    }

    let ctx = ProtectionContext::install(&primitives)?;
    INSTALLED.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&ctx)));
    Ok(ctx)
}

/// The protection context installed on this thread, if any.
pub fn installed() -> Option<Rc<ProtectionContext>> {
    INSTALLED.with(|slot| slot.borrow().clone())
}

/// State owned by an installed guard.
pub struct ProtectionContext {
    /// `Object.defineProperty` as it was before the guard replaced it.
    define_property: Function,
    guard: Rc<RedefinitionGuard<JsValue>>,
    originals: RefCell<Vec<(Primitive, JsValue)>>,
    lock_failures: RefCell<Vec<FingerprintError>>,
}

impl ProtectionContext {
    /// Build a fresh context and hook `Object.defineProperty`.
    ///
    /// Only reached through [`install_protection`]; calling this twice
    /// stacks two guards.
    pub(crate) fn install(primitives: &[Primitive]) -> Result<Rc<Self>> {
        let define_property = js_helpers::object_define_property()
            .map_err(|e| FingerprintError::Environment(describe_js(&e)))?;

        let ctx = Rc::new(Self {
            define_property,
            guard: Rc::new(RedefinitionGuard::new()),
            originals: RefCell::new(Vec::new()),
            lock_failures: RefCell::new(Vec::new()),
        });

        ctx.lock(primitives);
        ctx.hook_define_property()?;

        log::info!(
            "Canvas protection installed ({} primitive(s) guarded, {} lock failure(s))",
            ctx.guard.protected_count(),
            ctx.lock_failures.borrow().len()
        );
        Ok(ctx)
    }

    /// Capture, freeze and guard each primitive not already covered.
    pub fn lock(&self, primitives: &[Primitive]) {
        for &primitive in primitives {
            if self.original(primitive).is_some() {
                continue;
            }
            if let Err(err) = self.lock_one(primitive) {
                log::warn!("{}", err);
                self.lock_failures.borrow_mut().push(err);
            }
        }
    }

    fn lock_one(&self, primitive: Primitive) -> Result<()> {
        let failure = |reason: String| FingerprintError::GuardInstallation { primitive, reason };

        let proto = js_helpers::get_prototype(primitive.owner())
            .map_err(|e| failure(describe_js(&e)))?;
        if proto.is_undefined() || proto.is_null() {
            return Err(failure(format!("{} is not available", primitive.owner())));
        }
        let original = Reflect::get(&proto, &JsValue::from_str(primitive.property()))
            .map_err(|e| failure(describe_js(&e)))?;

        // Guarded before the freeze so a failed freeze still leaves the
        // redefinition path covered.
        self.guard.protect(proto.clone(), primitive.property());
        self.originals.borrow_mut().push((primitive, original.clone()));

        js_helpers::define_locked(&self.define_property, &proto, primitive.property(), &original)
            .map_err(|e| failure(describe_js(&e)))?;
        log::debug!("Locked {}", primitive);
        Ok(())
    }

    fn hook_define_property(&self) -> Result<()> {
        let env = |e: JsValue| FingerprintError::Environment(describe_js(&e));
        let object = js_helpers::get_global("Object").map_err(env)?;

        let guard = Rc::clone(&self.guard);
        let original = self.define_property.clone();
        let this_object = object.clone();
        // `Fn`, not `FnMut`: a page's Proxy `defineProperty` trap may call
        // back into the hook while it is still running.
        let hook = Closure::wrap(Box::new(
            move |obj: JsValue, prop: JsValue, descriptor: JsValue| -> std::result::Result<JsValue, JsValue> {
                if let Some(key) = js_helpers::to_property_key(&prop) {
                    if guard.intercept(&obj, &key) == Interception::Blocked {
                        log::warn!(
                            "Blocked redefinition of canvas primitive {} (attempt {})",
                            key,
                            guard.attempts()
                        );
                        return Ok(obj);
                    }
                }
                Reflect::apply(&original, &this_object, &Array::of3(&obj, &prop, &descriptor))
            },
        )
            as Box<dyn Fn(JsValue, JsValue, JsValue) -> std::result::Result<JsValue, JsValue>>);

        let replaced = Reflect::set(&object, &JsValue::from_str("defineProperty"), hook.as_ref())
            .map_err(env)?;
        if !replaced {
            return Err(FingerprintError::Environment(
                "Object.defineProperty is not writable".into(),
            ));
        }
        hook.forget();
        Ok(())
    }

    /// The reference captured for `primitive` at lock time.
    pub fn original(&self, primitive: Primitive) -> Option<JsValue> {
        self.originals
            .borrow()
            .iter()
            .find(|(p, _)| *p == primitive)
            .map(|(_, v)| v.clone())
    }

    /// Blocked redefinition attempts since installation.
    pub fn redefinition_attempts(&self) -> u64 {
        self.guard.attempts()
    }

    /// Primitives whose redefinition is guarded.
    pub fn guarded_primitives(&self) -> Vec<Primitive> {
        self.originals.borrow().iter().map(|(p, _)| *p).collect()
    }

    /// Freeze failures recorded during installation.
    pub fn lock_failures(&self) -> Vec<FingerprintError> {
        self.lock_failures.borrow().clone()
    }

    pub fn report(&self) -> ProtectionReport {
        ProtectionReport {
            installed: true,
            redefinition_attempts: self.redefinition_attempts(),
            locked_primitives: self
                .guarded_primitives()
                .iter()
                .map(|p| p.property())
                .collect(),
            lock_failures: self.lock_failures().iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Diagnostics snapshot exposed to JS.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionReport {
    pub installed: bool,
    pub redefinition_attempts: u64,
    pub locked_primitives: Vec<&'static str>,
    pub lock_failures: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_with_js_field_names() {
        let report = ProtectionReport {
            installed: true,
            redefinition_attempts: 3,
            locked_primitives: vec!["getImageData", "toBlob"],
            lock_failures: vec!["frozen".into()],
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"installed":true,"redefinitionAttempts":3,"lockedPrimitives":["getImageData","toBlob"],"lockFailures":["frozen"]}"#
        );

        assert_eq!(
            serde_json::to_string(&ProtectionReport::default()).unwrap(),
            r#"{"installed":false,"redefinitionAttempts":0,"lockedPrimitives":[],"lockFailures":[]}"#
        );
    }
}
