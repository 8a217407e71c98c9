// Edge auto-scroll: while a drag is live, scrolls the container whose top or
// bottom edge the pointer is near, faster the closer it gets.

use std::time::Instant;

use serde::Serialize;

use crate::config::AutoScrollConfig;
use crate::geometry::{Point, Rect};
use crate::model::PanelId;

/// Longest frame gap honoured by one tick. A stalled host must not produce a jump.
const MAX_FRAME_SECS: f32 = 0.1;

/// A candidate scroll container for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollContainer {
    pub panel: PanelId,
    pub bounds: Rect,
}

/// Scroll to apply this frame. Positive `delta` scrolls down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollStep {
    pub panel: PanelId,
    pub delta: f32,
}

/// Frame-driven auto-scroller, explicitly started and stopped with the drag session.
#[derive(Debug)]
pub struct EdgeAutoScroller {
    config: AutoScrollConfig,
    /// Time of the previous frame while running.
    last_frame: Option<Instant>,
    frames: u64,
}

impl EdgeAutoScroller {
    pub fn new(config: AutoScrollConfig) -> Self {
        Self {
            config,
            last_frame: None,
            frames: 0,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.last_frame = Some(now);
        self.frames = 0;
    }

    pub fn stop(&mut self) {
        if self.last_frame.take().is_some() {
            log::debug!("Auto-scroll stopped after {} frame(s)", self.frames);
        }
    }

    pub fn is_running(&self) -> bool {
        self.last_frame.is_some()
    }

    /// Frames ticked since the last start.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Signed speed in px/s for `pointer` against `bounds`. Zero outside the
    /// edge zones. Negative scrolls up.
    pub fn edge_speed(&self, pointer: Point, bounds: Rect) -> f32 {
        let edge = self.config.edge_size;
        if edge <= 0.0 || !bounds.spans_x(pointer.x) {
            return 0.0;
        }
        if pointer.y < bounds.top() - edge || pointer.y >= bounds.bottom() + edge {
            return 0.0;
        }

        // Short containers split the zone so the two edges never overlap.
        let zone = edge.min(bounds.height / 2.0);
        let from_top = pointer.y - bounds.top();
        let from_bottom = bounds.bottom() - pointer.y;
        if from_top < zone {
            -self.ramp(from_top, zone)
        } else if from_bottom <= zone {
            self.ramp(from_bottom, zone)
        } else {
            0.0
        }
    }

    /// Linear ramp from `min_speed` at the inner zone boundary to `max_speed`
    /// at the edge. Past the edge the speed stays at max.
    fn ramp(&self, distance: f32, zone: f32) -> f32 {
        let closeness = 1.0 - (distance.max(0.0) / zone).min(1.0);
        self.config.min_speed + (self.config.max_speed - self.config.min_speed) * closeness
    }

    /// Advance one frame. Containers are tested topmost first; the first one
    /// with a non-zero edge speed scrolls. Returns `None` when stopped.
    pub fn tick(
        &mut self,
        now: Instant,
        pointer: Point,
        containers: &[ScrollContainer],
    ) -> Option<ScrollStep> {
        let last = self.last_frame?;
        let dt = now
            .saturating_duration_since(last)
            .as_secs_f32()
            .min(MAX_FRAME_SECS);
        self.last_frame = Some(now);
        self.frames += 1;

        containers.iter().find_map(|container| {
            let speed = self.edge_speed(pointer, container.bounds);
            let delta = speed * dt;
            (delta != 0.0).then(|| ScrollStep {
                panel: container.panel.clone(),
                delta,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scroller() -> EdgeAutoScroller {
        EdgeAutoScroller::new(AutoScrollConfig {
            edge_size: 50.0,
            max_speed: 1000.0,
            min_speed: 100.0,
        })
    }

    fn container() -> ScrollContainer {
        ScrollContainer {
            panel: PanelId::new("a"),
            bounds: Rect::new(0.0, 100.0, 300.0, 400.0),
        }
    }

    // ── Edge speed ──────────────────────────────────────────────────

    #[test]
    fn middle_of_container_does_not_scroll() {
        let s = scroller();
        assert_eq!(s.edge_speed(Point::new(10.0, 300.0), container().bounds), 0.0);
    }

    #[test]
    fn top_edge_scrolls_up_faster_when_closer() {
        let s = scroller();
        let b = container().bounds;
        let far = s.edge_speed(Point::new(10.0, 140.0), b);
        let near = s.edge_speed(Point::new(10.0, 105.0), b);
        assert!(far < 0.0);
        assert!(near < far);
    }

    #[test]
    fn bottom_edge_scrolls_down() {
        let s = scroller();
        let speed = s.edge_speed(Point::new(10.0, 480.0), container().bounds);
        assert!(speed > 100.0 && speed < 1000.0);
    }

    #[test]
    fn past_the_edge_runs_at_max_speed() {
        let s = scroller();
        assert_eq!(s.edge_speed(Point::new(10.0, 80.0), container().bounds), -1000.0);
        assert_eq!(s.edge_speed(Point::new(10.0, 520.0), container().bounds), 1000.0);
    }

    #[test]
    fn far_outside_or_beside_does_not_scroll() {
        let s = scroller();
        assert_eq!(s.edge_speed(Point::new(10.0, 20.0), container().bounds), 0.0);
        assert_eq!(s.edge_speed(Point::new(400.0, 105.0), container().bounds), 0.0);
    }

    #[test]
    fn zone_boundary_runs_at_min_speed() {
        let s = scroller();
        assert_eq!(s.edge_speed(Point::new(10.0, 450.0), container().bounds), 100.0);
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    #[test]
    fn stopped_scroller_never_scrolls() {
        let mut s = scroller();
        let now = Instant::now();
        assert!(s.tick(now, Point::new(10.0, 105.0), &[container()]).is_none());
    }

    #[test]
    fn tick_scales_by_frame_time() {
        let mut s = scroller();
        let t0 = Instant::now();
        s.start(t0);
        let step = s
            .tick(t0 + Duration::from_millis(50), Point::new(10.0, 520.0), &[container()])
            .unwrap();
        assert_eq!(step.panel, PanelId::new("a"));
        assert!((step.delta - 50.0).abs() < 0.01);
        assert_eq!(s.frames(), 1);
    }

    #[test]
    fn long_frame_gap_is_capped() {
        let mut s = scroller();
        let t0 = Instant::now();
        s.start(t0);
        let step = s
            .tick(t0 + Duration::from_secs(5), Point::new(10.0, 520.0), &[container()])
            .unwrap();
        assert!((step.delta - 100.0).abs() < 0.01);
    }

    #[test]
    fn stationary_pointer_keeps_scrolling() {
        let mut s = scroller();
        let t0 = Instant::now();
        s.start(t0);
        let p = Point::new(10.0, 105.0);
        for i in 1..=3 {
            let step = s.tick(t0 + Duration::from_millis(16 * i), p, &[container()]);
            assert!(step.is_some_and(|st| st.delta < 0.0));
        }
    }

    #[test]
    fn stop_ends_the_loop() {
        let mut s = scroller();
        let t0 = Instant::now();
        s.start(t0);
        s.stop();
        assert!(!s.is_running());
        assert!(s
            .tick(t0 + Duration::from_millis(16), Point::new(10.0, 105.0), &[container()])
            .is_none());
    }

    #[test]
    fn first_matching_container_wins() {
        let mut s = scroller();
        let t0 = Instant::now();
        s.start(t0);
        let other = ScrollContainer {
            panel: PanelId::new("b"),
            bounds: Rect::new(0.0, 100.0, 300.0, 400.0),
        };
        let step = s
            .tick(t0 + Duration::from_millis(16), Point::new(10.0, 105.0), &[other, container()])
            .unwrap();
        assert_eq!(step.panel, PanelId::new("b"));
    }
}
