// Pointer tracking: samples pointer position and modifier keys while a drag is live.

use crate::config::CopyToggle;
use crate::geometry::Point;

/// Modifier keys held during a pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    /// Cmd on macOS, Super/Windows elsewhere.
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::NONE
        }
    }

    /// Whether the configured copy/move inversion key is held.
    pub fn copy_toggle_held(&self, toggle: CopyToggle) -> bool {
        match toggle {
            CopyToggle::Ctrl => self.ctrl,
            CopyToggle::Meta => self.meta,
            CopyToggle::Either => self.ctrl || self.meta,
        }
    }
}

/// One pointer reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub position: Point,
    pub modifiers: Modifiers,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self {
            position: Point::new(x, y),
            modifiers,
        }
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, Modifiers::NONE)
    }
}

/// Read-side channel for the live pointer. Holds no business logic.
#[derive(Debug, Default)]
pub struct PointerTracker {
    tracking: bool,
    origin: Point,
    last: PointerSample,
    samples: u64,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking from the drag-start sample.
    pub fn begin(&mut self, sample: PointerSample) {
        self.tracking = true;
        self.origin = sample.position;
        self.last = sample;
        self.samples = 1;
    }

    /// Record a new sample. Ignored while not tracking.
    pub fn sample(&mut self, sample: PointerSample) {
        if !self.tracking {
            return;
        }
        self.last = sample;
        self.samples += 1;
    }

    /// Refresh modifier state only (key down/up without pointer movement).
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        if self.tracking {
            self.last.modifiers = modifiers;
        }
    }

    /// Stop tracking. The last sample stays readable.
    pub fn end(&mut self) {
        self.tracking = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn position(&self) -> Point {
        self.last.position
    }

    pub fn modifiers(&self) -> Modifiers {
        self.last.modifiers
    }

    pub fn last(&self) -> PointerSample {
        self.last
    }

    /// Number of samples recorded in the current (or last) tracking run.
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Displacement of the last sample from the drag origin.
    pub fn delta(&self) -> (f32, f32) {
        (
            self.last.position.x - self.origin.x,
            self.last.position.y - self.origin.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tracker_is_idle() {
        let tracker = PointerTracker::new();
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.sample_count(), 0);
    }

    #[test]
    fn samples_ignored_when_not_tracking() {
        let mut tracker = PointerTracker::new();
        tracker.sample(PointerSample::at(50.0, 50.0));
        assert_eq!(tracker.position(), Point::default());
        assert_eq!(tracker.sample_count(), 0);
    }

    #[test]
    fn begin_then_sample_updates_position_and_delta() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerSample::at(10.0, 20.0));
        tracker.sample(PointerSample::at(15.0, 60.0));
        assert_eq!(tracker.position(), Point::new(15.0, 60.0));
        assert_eq!(tracker.delta(), (5.0, 40.0));
        assert_eq!(tracker.sample_count(), 2);
    }

    #[test]
    fn modifier_only_update_keeps_position() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerSample::at(10.0, 20.0));
        tracker.set_modifiers(Modifiers::ctrl());
        assert!(tracker.modifiers().ctrl);
        assert_eq!(tracker.position(), Point::new(10.0, 20.0));
    }

    #[test]
    fn end_stops_tracking() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerSample::at(0.0, 0.0));
        tracker.end();
        tracker.sample(PointerSample::at(99.0, 99.0));
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.position(), Point::new(0.0, 0.0));
    }

    // ── Copy toggle ─────────────────────────────────────────────────

    #[test]
    fn copy_toggle_either_accepts_ctrl_or_meta() {
        assert!(Modifiers::ctrl().copy_toggle_held(CopyToggle::Either));
        assert!(Modifiers::meta().copy_toggle_held(CopyToggle::Either));
        assert!(!Modifiers::NONE.copy_toggle_held(CopyToggle::Either));
    }

    #[test]
    fn copy_toggle_ctrl_ignores_meta() {
        assert!(!Modifiers::meta().copy_toggle_held(CopyToggle::Ctrl));
        assert!(Modifiers::ctrl().copy_toggle_held(CopyToggle::Ctrl));
    }
}
