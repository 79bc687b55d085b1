//! Decision logic of the `Object.defineProperty` guard.
//!
//! Kept free of JS types so it can be exercised natively: the owner key is
//! generic. In the browser it is the prototype object itself, compared with
//! `===`.

use std::cell::{Cell, RefCell};

/// What the guard does with one redefinition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// Targets a protected primitive: swallowed, counter bumped.
    Blocked,
    /// Anything else: handed to the original implementation untouched.
    Forward,
}

/// Protected (owner, property) pairs plus the blocked-attempt counter.
#[derive(Debug)]
pub struct RedefinitionGuard<K> {
    protected: RefCell<Vec<(K, &'static str)>>,
    attempts: Cell<u64>,
}

impl<K> Default for RedefinitionGuard<K> {
    fn default() -> Self {
        Self {
            protected: RefCell::new(Vec::new()),
            attempts: Cell::new(0),
        }
    }
}

impl<K: PartialEq> RedefinitionGuard<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start guarding `owner[property]`. Re-adding a pair is a no-op.
    pub fn protect(&self, owner: K, property: &'static str) {
        if self.is_protected(&owner, property) {
            return;
        }
        self.protected.borrow_mut().push((owner, property));
    }

    pub fn is_protected(&self, owner: &K, property: &str) -> bool {
        self.protected
            .borrow()
            .iter()
            .any(|(o, p)| o == owner && *p == property)
    }

    /// Classify one call. Only the protected pairs are blocked; the owner
    /// must match exactly, so the same name on another object passes.
    pub fn intercept(&self, owner: &K, property: &str) -> Interception {
        if self.is_protected(owner, property) {
            self.attempts.set(self.attempts.get().saturating_add(1));
            Interception::Blocked
        } else {
            Interception::Forward
        }
    }

    /// Number of blocked redefinition attempts so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.get()
    }

    pub fn protected_count(&self) -> usize {
        self.protected.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_guard() -> RedefinitionGuard<&'static str> {
        let guard = RedefinitionGuard::new();
        guard.protect("CanvasRenderingContext2D.prototype", "getImageData");
        guard
    }

    #[test]
    fn test_blocks_targeted_redefinition_and_counts_each_attempt() {
        let guard = canvas_guard();
        for expected in 1..=3 {
            assert_eq!(
                guard.intercept(&"CanvasRenderingContext2D.prototype", "getImageData"),
                Interception::Blocked
            );
            assert_eq!(guard.attempts(), expected);
        }
    }

    #[test]
    fn test_forwards_unrelated_redefinitions() {
        let guard = canvas_guard();
        assert_eq!(
            guard.intercept(&"CanvasRenderingContext2D.prototype", "fillText"),
            Interception::Forward
        );
        assert_eq!(
            guard.intercept(&"SomeOtherObject", "getImageData"),
            Interception::Forward
        );
        assert_eq!(guard.intercept(&"window", "foo"), Interception::Forward);
        assert_eq!(guard.attempts(), 0);
    }

    #[test]
    fn test_protect_is_idempotent() {
        let guard = canvas_guard();
        guard.protect("CanvasRenderingContext2D.prototype", "getImageData");
        assert_eq!(guard.protected_count(), 1);

        guard.protect("HTMLCanvasElement.prototype", "toBlob");
        assert_eq!(guard.protected_count(), 2);
        assert_eq!(
            guard.intercept(&"HTMLCanvasElement.prototype", "toBlob"),
            Interception::Blocked
        );
    }
}
