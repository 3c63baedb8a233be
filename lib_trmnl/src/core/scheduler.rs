//! # View Scheduler
//!
//! Owns the ordered view catalogue and the rotation state. Rotation decides
//! which view's raster is device-facing; it is timed independently of the
//! full re-render interval.
//!
//! Every time-dependent method has an `_at` variant taking the current
//! instant, so the state machine can be driven with simulated time.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::configs::config_app::ViewDescriptor;

/// Time a view stays device-facing before the next one takes over.
pub const ROTATION_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone)]
pub struct RotationState {
    /// Index of the device-facing view.
    pub current_index: usize,
    /// Monotonic time of the last rotation (or of start-up).
    pub last_rotation: Instant,
    /// Wall-clock twin of `last_rotation`, for reporting.
    pub rotated_at: DateTime<Local>,
}

impl RotationState {
    fn reset(now: Instant) -> Self {
        Self {
            current_index: 0,
            last_rotation: now,
            rotated_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewScheduler {
    /// The static catalogue, used to re-initialise an emptied list.
    configured: Vec<ViewDescriptor>,
    views: Vec<ViewDescriptor>,
    state: RotationState,
}

impl ViewScheduler {
    /// Starts at index 0 with the rotation clock set to now.
    pub fn new(views: Vec<ViewDescriptor>) -> Self {
        Self::new_at(views, Instant::now())
    }

    pub fn new_at(views: Vec<ViewDescriptor>, now: Instant) -> Self {
        Self {
            configured: views.clone(),
            views,
            state: RotationState::reset(now),
        }
    }

    pub fn views(&self) -> &[ViewDescriptor] {
        &self.views
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    /// Replaces the catalogue and restarts rotation from the first view.
    pub fn reload(&mut self, views: Vec<ViewDescriptor>) {
        self.configured = views.clone();
        self.views = views;
        self.state = RotationState::reset(Instant::now());
        log::info!("View catalogue reloaded: {} view(s)", self.views.len());
    }

    /// Empties the working list; the next lookup restores it from the catalogue.
    pub fn clear(&mut self) {
        self.views.clear();
    }

    pub fn should_rotate(&self) -> bool {
        self.should_rotate_at(Instant::now())
    }

    /// True with two or more views once [`ROTATION_INTERVAL`] has elapsed.
    pub fn should_rotate_at(&self, now: Instant) -> bool {
        self.views.len() > 1
            && now.saturating_duration_since(self.state.last_rotation) >= ROTATION_INTERVAL
    }

    pub fn rotate(&mut self) -> bool {
        self.rotate_at(Instant::now())
    }

    /// Advances to the next view, wrapping around. A no-op with fewer than
    /// two views. Returns whether the index moved.
    pub fn rotate_at(&mut self, now: Instant) -> bool {
        if self.views.len() <= 1 {
            return false;
        }
        self.state.current_index = (self.state.current_index + 1) % self.views.len();
        self.state.last_rotation = now;
        self.state.rotated_at = Local::now();
        log::info!(
            "Rotated to view: {} (index {})",
            self.views[self.state.current_index].name,
            self.state.current_index
        );
        true
    }

    /// The device-facing view, or `None` when no view exists at all.
    pub fn current_view(&mut self) -> Option<ViewDescriptor> {
        if self.views.is_empty() {
            self.views = self.configured.clone();
            self.state.current_index = 0;
        }
        self.views.get(self.state.current_index).cloned()
    }

    pub fn find(&self, name: &str) -> Option<&ViewDescriptor> {
        self.views.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views(names: &[&str]) -> Vec<ViewDescriptor> {
        names
            .iter()
            .map(|n| ViewDescriptor::new(*n, format!("{n}.html"), format!("{n}.json")))
            .collect()
    }

    #[test]
    fn single_view_never_rotates() {
        let t0 = Instant::now();
        let mut s = ViewScheduler::new_at(views(&["only"]), t0);
        let later = t0 + ROTATION_INTERVAL * 10;
        assert!(!s.should_rotate_at(later));
        assert!(!s.rotate_at(later));
        assert_eq!(s.state().current_index, 0);
    }

    #[test]
    fn rotation_waits_for_full_interval() {
        let t0 = Instant::now();
        let mut s = ViewScheduler::new_at(views(&["a", "b"]), t0);
        assert!(!s.should_rotate_at(t0));
        assert!(!s.should_rotate_at(t0 + ROTATION_INTERVAL - Duration::from_secs(1)));
        assert!(s.should_rotate_at(t0 + ROTATION_INTERVAL));

        let t1 = t0 + ROTATION_INTERVAL;
        assert!(s.rotate_at(t1));
        assert!(!s.should_rotate_at(t1));
        assert!(!s.should_rotate_at(t1 + Duration::from_secs(14 * 60)));
        assert!(s.should_rotate_at(t1 + Duration::from_secs(15 * 60)));
    }

    #[test]
    fn rotation_wraps_around() {
        let t0 = Instant::now();
        let mut s = ViewScheduler::new_at(views(&["a", "b", "c"]), t0);
        let order: Vec<String> = (0..4)
            .map(|_| {
                s.rotate_at(t0);
                s.current_view().unwrap().name
            })
            .collect();
        assert_eq!(order, vec!["b", "c", "a", "b"]);
    }

    #[test]
    fn emptied_list_is_restored_from_catalogue() {
        let mut s = ViewScheduler::new(views(&["a", "b"]));
        s.rotate_at(Instant::now());
        s.clear();
        assert_eq!(s.current_view().unwrap().name, "a");
        assert_eq!(s.views().len(), 2);
    }

    #[test]
    fn no_views_means_no_current_view() {
        let mut s = ViewScheduler::new(Vec::new());
        assert!(s.current_view().is_none());
        assert!(!s.rotate());
    }

    #[test]
    fn reload_restarts_rotation() {
        let mut s = ViewScheduler::new(views(&["a", "b"]));
        s.rotate();
        s.reload(views(&["x", "y", "z"]));
        assert_eq!(s.state().current_index, 0);
        assert_eq!(s.current_view().unwrap().name, "x");
        assert!(s.find("z").is_some());
    }
}
