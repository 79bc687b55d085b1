//! Reflect utility wrappers for reaching prototypes and property descriptors.

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Get a global constructor's prototype (e.g., "HTMLCanvasElement" → HTMLCanvasElement.prototype).
pub fn get_prototype(constructor_name: &str) -> Result<JsValue, JsValue> {
    let global = js_sys::global();
    let ctor = Reflect::get(&global, &JsValue::from_str(constructor_name))?;
    Reflect::get(&ctor, &JsValue::from_str("prototype"))
}

/// Get a property from the global scope.
pub fn get_global(prop: &str) -> Result<JsValue, JsValue> {
    Reflect::get(&js_sys::global(), &JsValue::from_str(prop))
}

/// The current `Object.defineProperty`.
pub fn object_define_property() -> Result<Function, JsValue> {
    let object = get_global("Object")?;
    Reflect::get(&object, &JsValue::from_str("defineProperty"))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("Object.defineProperty not found"))
}

/// Re-assign `value` onto `obj[prop]` as a non-writable, non-configurable
/// data property, through the given `defineProperty` implementation.
pub fn define_locked(
    define_property: &Function,
    obj: &JsValue,
    prop: &str,
    value: &JsValue,
) -> Result<(), JsValue> {
    let descriptor = Object::new();
    Reflect::set(&descriptor, &JsValue::from_str("value"), value)?;
    Reflect::set(&descriptor, &JsValue::from_str("writable"), &JsValue::FALSE)?;
    Reflect::set(&descriptor, &JsValue::from_str("configurable"), &JsValue::FALSE)?;

    let object = get_global("Object")?;
    let args = Array::of3(obj, &JsValue::from_str(prop), &descriptor);
    Reflect::apply(define_property, &object, &args)?;
    Ok(())
}

/// Coerce a property key the way `defineProperty` would. Symbols yield `None`.
pub fn to_property_key(key: &JsValue) -> Option<String> {
    if let Some(s) = key.as_string() {
        return Some(s);
    }
    if key.is_symbol() {
        return None;
    }
    let string_fn: Function = get_global("String").ok()?.dyn_into().ok()?;
    Reflect::apply(&string_fn, &JsValue::UNDEFINED, &Array::of1(key))
        .ok()?
        .as_string()
}

/// Source text of a function, via its own `toString`.
///
/// Goes through whatever `toString` the function currently resolves to,
/// and returns an error instead of trapping if that throws.
pub fn function_source(func: &JsValue) -> Result<String, JsValue> {
    let to_string: Function = Reflect::get(func, &JsValue::from_str("toString"))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("toString is not callable"))?;
    Reflect::apply(&to_string, func, &Array::new())?
        .as_string()
        .ok_or_else(|| JsValue::from_str("toString did not return a string"))
}
