//! The shared tooltip overlay.
//!
//! Only one chart may show a tooltip at a time. Ownership is a guard value: acquiring
//! displaces whoever held the overlay, and dropping the guard hides the tooltip unless
//! someone else has taken it over in the meantime.

use std::cell::RefCell;
use std::rc::Rc;

/// Tooltip contents anchored at a pixel position inside the owner's chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub owner: String,
    pub lines: Vec<String>,
    pub anchor: (f64, f64),
}

#[derive(Debug, Default)]
struct OverlayState {
    next_token: u64,
    shown: Option<(u64, Tooltip)>,
}

/// Handle to the single overlay. Clones share the same overlay.
#[derive(Clone, Debug, Default)]
pub struct TooltipOverlay {
    state: Rc<RefCell<OverlayState>>,
}

impl TooltipOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `tooltip`, displacing the current owner.
    pub fn acquire(&self, tooltip: Tooltip) -> OverlayGuard {
        let mut state = self.state.borrow_mut();
        state.next_token += 1;
        let token = state.next_token;
        if let Some((_, previous)) = state.shown.replace((token, tooltip)) {
            tracing::trace!(owner = %previous.owner, "tooltip displaced");
        }
        OverlayGuard {
            overlay: self.clone(),
            token,
        }
    }

    /// The tooltip currently visible, if any.
    pub fn visible(&self) -> Option<Tooltip> {
        self.state.borrow().shown.as_ref().map(|(_, t)| t.clone())
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().shown.is_some()
    }
}

/// Ownership of the overlay. Hides the tooltip on drop if still the owner.
#[derive(Debug)]
pub struct OverlayGuard {
    overlay: TooltipOverlay,
    token: u64,
}

impl OverlayGuard {
    pub fn is_current(&self) -> bool {
        matches!(self.overlay.state.borrow().shown, Some((t, _)) if t == self.token)
    }

    /// Replace the tooltip text; no-op once displaced.
    pub fn update(&self, lines: Vec<String>, anchor: (f64, f64)) -> bool {
        let mut state = self.overlay.state.borrow_mut();
        match state.shown.as_mut() {
            Some((t, tooltip)) if *t == self.token => {
                tooltip.lines = lines;
                tooltip.anchor = anchor;
                true
            }
            _ => false,
        }
    }

    pub fn release(self) {}
}

impl Drop for OverlayGuard {
    fn drop(&mut self) {
        let mut state = self.overlay.state.borrow_mut();
        if matches!(state.shown, Some((t, _)) if t == self.token) {
            state.shown = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tip(owner: &str) -> Tooltip {
        Tooltip {
            owner: owner.to_string(),
            lines: vec![owner.to_string()],
            anchor: (0.0, 0.0),
        }
    }

    #[test]
    fn release_hides() {
        let overlay = TooltipOverlay::new();
        let guard = overlay.acquire(tip("trend"));
        assert!(overlay.is_visible());
        guard.release();
        assert!(!overlay.is_visible());
    }

    #[test]
    fn new_owner_displaces_old() {
        let overlay = TooltipOverlay::new();
        let first = overlay.acquire(tip("trend"));
        let second = overlay.acquire(tip("stages"));
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(!first.update(vec!["late".into()], (1.0, 1.0)));
        drop(first);
        assert_eq!(overlay.visible().map(|t| t.owner), Some("stages".to_string()));
        drop(second);
        assert!(overlay.visible().is_none());
    }
}
