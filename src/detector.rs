//! Tamper detection by function source inspection.
//!
//! The live binding of a primitive is stringified and matched against two
//! rule tables: one recognizing the native implementation, one recognizing
//! call-forwarding shims. This is a heuristic. An interceptor that keeps a
//! native-looking `toString()` (a WASM closure, a `Proxy` around the original,
//! a patched `Function.prototype.toString`) is not caught.
//!
//! Anything that cannot be read or stringified fails closed as
//! [`Verdict::Tampered`].

use serde::{Serialize, Serializer};

use crate::config::Primitive;
use crate::host::FingerprintHost;

/// Version of the rule tables below. Bump when adding or removing rules.
pub const RULESET_VERSION: u32 = 1;

/// Marker engines put in the source text of built-in functions.
pub const NATIVE_CODE_MARKER: &str = "[native code]";

/// How a rule looks at the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Source contains the token anywhere.
    Contains(&'static str),
    /// Trimmed source begins with `function <property>()`.
    NativeSignature,
}

/// A named predicate over a primitive's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    pub pattern: Pattern,
}

impl Rule {
    pub fn matches(&self, primitive: Primitive, source: &str) -> bool {
        match self.pattern {
            Pattern::Contains(token) => source.contains(token),
            Pattern::NativeSignature => source.trim().starts_with(&primitive.native_signature()),
        }
    }
}

/// Any match marks the source as native.
pub const NATIVE_RULES: &[Rule] = &[
    Rule {
        name: "native-code-marker",
        pattern: Pattern::Contains(NATIVE_CODE_MARKER),
    },
    Rule {
        name: "native-signature",
        pattern: Pattern::NativeSignature,
    },
];

/// Any match marks the source as a wrapping shim.
pub const WRAPPER_RULES: &[Rule] = &[
    Rule {
        name: "orig-apply",
        pattern: Pattern::Contains("orig.apply"),
    },
    Rule {
        name: "original-apply",
        pattern: Pattern::Contains("original.apply"),
    },
    Rule {
        name: "return-orig",
        pattern: Pattern::Contains("return orig"),
    },
];

/// Diagnostic only, never part of the verdict: generic `apply`/`call`
/// shows up in too many legitimate polyfills.
pub const FORWARDING_RULES: &[Rule] = &[
    Rule {
        name: "apply-call",
        pattern: Pattern::Contains(".apply("),
    },
    Rule {
        name: "call-call",
        pattern: Pattern::Contains(".call("),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Tampered,
}

/// Outcome of one inspection. Produced fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    #[serde(rename = "passed", serialize_with = "serialize_passed")]
    pub verdict: Verdict,
    pub is_native: bool,
    pub has_wrapper_patterns: bool,
    pub has_forwarding_call: bool,
    pub matched_rules: Vec<&'static str>,
    pub function_string: String,
}

fn serialize_passed<S: Serializer>(verdict: &Verdict, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(*verdict == Verdict::Passed)
}

impl DetectionResult {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    /// The string form used by `detectCanvasTampering()`.
    pub fn label(&self) -> &'static str {
        match self.verdict {
            Verdict::Passed => "not tampered",
            Verdict::Tampered => "tampered",
        }
    }
}

fn matching(rules: &[Rule], primitive: Primitive, source: &str) -> Vec<&'static str> {
    rules
        .iter()
        .filter(|rule| rule.matches(primitive, source))
        .map(|rule| rule.name)
        .collect()
}

/// Classify the source text of `primitive`.
pub fn inspect_source(primitive: Primitive, source: &str) -> DetectionResult {
    let native = matching(NATIVE_RULES, primitive, source);
    let wrapper = matching(WRAPPER_RULES, primitive, source);
    let forwarding = matching(FORWARDING_RULES, primitive, source);

    let is_native = !native.is_empty();
    let has_wrapper_patterns = !wrapper.is_empty();
    let verdict = if is_native && !has_wrapper_patterns {
        Verdict::Passed
    } else {
        Verdict::Tampered
    };

    DetectionResult {
        verdict,
        is_native,
        has_wrapper_patterns,
        has_forwarding_call: !forwarding.is_empty(),
        matched_rules: native.into_iter().chain(wrapper).chain(forwarding).collect(),
        function_string: source.to_string(),
    }
}

/// Inspect the *live* binding of the primary primitive.
///
/// Reads through the host on every call rather than using the reference
/// captured at install time, so a swap that bypasses the defineProperty
/// guard (prototype replacement, for instance) is still seen.
pub fn detect<H: FingerprintHost + ?Sized>(host: &H) -> DetectionResult {
    let primitive = Primitive::PRIMARY;
    let result = match host.primitive_source(primitive) {
        Ok(source) => inspect_source(primitive, &source),
        Err(err) => {
            log::warn!("Could not read {}: {}", primitive, err);
            DetectionResult {
                verdict: Verdict::Tampered,
                is_native: false,
                has_wrapper_patterns: false,
                has_forwarding_call: false,
                matched_rules: Vec::new(),
                function_string: String::new(),
            }
        }
    };
    log::debug!(
        "{} inspected: {:?} (rules v{}, matched {:?})",
        primitive,
        result.verdict,
        RULESET_VERSION,
        result.matched_rules
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_NATIVE: &str = "function getImageData() { [native code] }";

    #[test]
    fn test_marker_alone_passes() {
        let result = inspect_source(Primitive::GetImageData, NATIVE_CODE_MARKER);
        assert_eq!(result.verdict, Verdict::Passed);
        assert!(result.is_native);
        assert!(!result.has_wrapper_patterns);
        assert_eq!(result.label(), "not tampered");
    }

    #[test]
    fn test_engine_native_text_passes() {
        let result = inspect_source(Primitive::GetImageData, CHROME_NATIVE);
        assert!(result.passed());
        assert_eq!(result.matched_rules, vec!["native-code-marker", "native-signature"]);
        assert_eq!(result.function_string, CHROME_NATIVE);

        let firefox = "\nfunction getImageData() {\n    [native code]\n}\n";
        assert!(inspect_source(Primitive::GetImageData, firefox).passed());
    }

    #[test]
    fn test_wrapper_pattern_overrides_native_flag() {
        let shim = "function getImageData() { [native code] } original.apply(this, arguments)";
        let result = inspect_source(Primitive::GetImageData, shim);
        assert!(result.is_native);
        assert!(result.has_wrapper_patterns);
        assert!(result.has_forwarding_call);
        assert_eq!(result.verdict, Verdict::Tampered);
        assert_eq!(result.label(), "tampered");
    }

    #[test]
    fn test_each_wrapper_rule_trips() {
        for source in [
            "function(){ const r = orig.apply(this, arguments); noise(r); return r; }",
            "function(){ return original.apply(this, arguments) }",
            "function(...a){ return orig(...a) }",
        ] {
            let result = inspect_source(Primitive::GetImageData, source);
            assert!(result.has_wrapper_patterns, "{}", source);
            assert_eq!(result.verdict, Verdict::Tampered);
        }
    }

    #[test]
    fn test_restricted_runtime_without_marker_fails_closed() {
        let result = inspect_source(Primitive::GetImageData, "function () { }");
        assert!(!result.is_native);
        assert_eq!(result.verdict, Verdict::Tampered);

        let result = inspect_source(Primitive::GetImageData, "");
        assert_eq!(result.verdict, Verdict::Tampered);
    }

    #[test]
    fn test_signature_prefix_is_per_primitive() {
        let source = "function toBlob() { }";
        assert!(inspect_source(Primitive::ToBlob, source).is_native);
        assert!(!inspect_source(Primitive::GetImageData, source).is_native);
    }

    #[test]
    fn test_result_serializes_passed_flag() {
        let clean = serde_json::to_value(inspect_source(Primitive::GetImageData, NATIVE_CODE_MARKER))
            .unwrap();
        assert_eq!(clean["passed"], serde_json::Value::Bool(true));
        assert_eq!(clean["isNative"], serde_json::Value::Bool(true));
        assert_eq!(clean["hasWrapperPatterns"], serde_json::Value::Bool(false));
        assert_eq!(clean["functionString"], NATIVE_CODE_MARKER);
        assert!(clean.get("verdict").is_none());

        let shim = serde_json::to_value(inspect_source(
            Primitive::GetImageData,
            "function () { return orig.apply(this, arguments) }",
        ))
        .unwrap();
        assert_eq!(shim["passed"], serde_json::Value::Bool(false));
        assert_eq!(shim["hasWrapperPatterns"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_forwarding_call_is_diagnostic_only() {
        let source = "function getImageData() { [native code] } // f.call(x)";
        let result = inspect_source(Primitive::GetImageData, source);
        assert!(result.has_forwarding_call);
        assert!(result.passed());
    }
}
