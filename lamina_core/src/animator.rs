// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node property animators.
//!
//! A node declares its animated properties once, in
//! [`Node::register`](crate::tree::Node::register), by inserting named
//! [`Animator`]s into an [`AnimatorRegistry`]. The registry is mounted and
//! unmounted together with its node and advanced by the animate step of the
//! process pass. Animators only touch presentation state from inside that
//! step; anything they need afterwards is requested through the flags
//! returned by [`AnimatorRegistry::update_all`].
//!
//! [`Tween`] is the stock animator: a target state, a current value, and an
//! optional eased [`Transition`] between them.

use core::any::Any;
use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use kurbo::{Point, Rect, Size, Vec2};

use crate::flags::NodeFlags;
use crate::time::{Duration, HostTime};

/// Outcome of advancing one animator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimatorUpdate {
    /// The presented value changed.
    pub changed: bool,
    /// The animator needs another animate step.
    pub animating: bool,
}

/// A named, time-driven property of a node.
pub trait Animator: Any {
    /// Called when the owning node mounts.
    fn mount(&mut self) {}

    /// Called when the owning node unmounts.
    fn unmount(&mut self) {}

    /// Advances to `time`.
    ///
    /// Repeated calls with the same `time` must not advance further.
    fn update(&mut self, time: HostTime) -> AnimatorUpdate;

    /// Whether a transition is in flight.
    fn is_animating(&self) -> bool;

    /// Needs bits requested on the owning node when the value changes.
    fn update_flags(&self) -> NodeFlags {
        NodeFlags::NEEDS_RENDER
    }
}

/// Name-to-animator map owned by a node.
#[derive(Default)]
pub struct AnimatorRegistry {
    animators: BTreeMap<&'static str, Box<dyn Animator>>,
    mounted: bool,
}

impl fmt::Debug for AnimatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorRegistry")
            .field("names", &self.animators.keys().collect::<Vec<_>>())
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl AnimatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `animator` under `name`.
    ///
    /// If the registry is already mounted the animator is mounted too.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn register(&mut self, name: &'static str, mut animator: impl Animator) {
        assert!(
            !self.animators.contains_key(name),
            "animator `{name}` registered twice"
        );
        if self.mounted {
            animator.mount();
        }
        self.animators.insert(name, Box::new(animator));
    }

    /// Whether an animator is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.animators.contains_key(name)
    }

    /// Returns the number of registered animators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.animators.len()
    }

    /// Whether no animators are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }

    /// Registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.animators.keys().copied()
    }

    /// Returns the animator under `name` if it is an `A`.
    #[must_use]
    pub fn get<A: Animator>(&self, name: &str) -> Option<&A> {
        let animator: &dyn Any = &**self.animators.get(name)?;
        animator.downcast_ref()
    }

    /// Returns the animator under `name` mutably if it is an `A`.
    pub fn get_mut<A: Animator>(&mut self, name: &str) -> Option<&mut A> {
        let animator: &mut dyn Any = &mut **self.animators.get_mut(name)?;
        animator.downcast_mut()
    }

    /// Whether any animator has a transition in flight.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animators.values().any(|a| a.is_animating())
    }

    /// Whether the registry is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Mounts every animator.
    pub fn mount_all(&mut self) {
        debug_assert!(!self.mounted, "animator registry mounted twice");
        for animator in self.animators.values_mut() {
            animator.mount();
        }
        self.mounted = true;
    }

    /// Unmounts every animator.
    pub fn unmount_all(&mut self) {
        debug_assert!(self.mounted, "animator registry unmounted twice");
        for animator in self.animators.values_mut() {
            animator.unmount();
        }
        self.mounted = false;
    }

    /// Advances every animator to `time`.
    ///
    /// Returns the needs bits the owning node should request: the
    /// [`update_flags`](Animator::update_flags) of every changed animator,
    /// plus [`NEEDS_ANIMATE`](NodeFlags::NEEDS_ANIMATE) while any animator is
    /// still in flight.
    pub fn update_all(&mut self, time: HostTime) -> NodeFlags {
        let mut requested = NodeFlags::empty();
        for animator in self.animators.values_mut() {
            let update = animator.update(time);
            if update.changed {
                requested |= animator.update_flags();
            }
            if update.animating {
                requested |= NodeFlags::NEEDS_ANIMATE;
            }
        }
        requested
    }
}

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Easing curves mapping normalized progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ease {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
}

impl Ease {
    /// Applies the curve to progress `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// How a [`Tween`] moves from its current value to a new state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Length of the transition in host ticks.
    pub duration: Duration,
    /// Easing curve.
    pub ease: Ease,
}

impl Transition {
    /// A transition of `duration` with the given curve.
    #[must_use]
    pub const fn new(duration: Duration, ease: Ease) -> Self {
        Self { duration, ease }
    }
}

/// Values a [`Tween`] can blend between.
pub trait Interpolate: Copy + PartialEq + 'static {
    /// Blends from `self` toward `to` by `t` in `[0, 1]`.
    #[must_use]
    fn interpolate(self, to: Self, t: f64) -> Self;
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "blend factor only needs f32 precision for f32 values"
)]
impl Interpolate for f32 {
    fn interpolate(self, to: Self, t: f64) -> Self {
        self + (to - self) * t as Self
    }
}

impl Interpolate for f64 {
    fn interpolate(self, to: Self, t: f64) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for Point {
    fn interpolate(self, to: Self, t: f64) -> Self {
        Self::new(self.x.interpolate(to.x, t), self.y.interpolate(to.y, t))
    }
}

impl Interpolate for Vec2 {
    fn interpolate(self, to: Self, t: f64) -> Self {
        Self::new(self.x.interpolate(to.x, t), self.y.interpolate(to.y, t))
    }
}

impl Interpolate for Size {
    fn interpolate(self, to: Self, t: f64) -> Self {
        Self::new(
            self.width.interpolate(to.width, t),
            self.height.interpolate(to.height, t),
        )
    }
}

impl Interpolate for Rect {
    fn interpolate(self, to: Self, t: f64) -> Self {
        Self::new(
            self.x0.interpolate(to.x0, t),
            self.y0.interpolate(to.y0, t),
            self.x1.interpolate(to.x1, t),
            self.y1.interpolate(to.y1, t),
        )
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// An animator that eases its value toward a target state.
///
/// `None` is a legitimate state: it means "no value", and is what a failed
/// [`set_state_from_str`](Self::set_state_from_str) leaves behind.
#[derive(Clone, Debug)]
pub struct Tween<T> {
    value: Option<T>,
    state: Option<T>,
    from: Option<T>,
    transition: Option<Transition>,
    start: Option<HostTime>,
    last_time: Option<HostTime>,
    dirty: bool,
    update_flags: NodeFlags,
}

impl<T: Interpolate> Tween<T> {
    /// A tween that starts at `value` with no transition in flight.
    #[must_use]
    pub fn new(value: Option<T>) -> Self {
        Self {
            value,
            state: value,
            from: None,
            transition: None,
            start: None,
            last_time: None,
            dirty: false,
            update_flags: NodeFlags::NEEDS_RENDER,
        }
    }

    /// Overrides the needs bits requested when the value changes.
    #[must_use]
    pub fn with_update_flags(mut self, flags: NodeFlags) -> Self {
        self.update_flags = flags & NodeFlags::UPDATE_MASK;
        self
    }

    /// The presented value.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.value
    }

    /// The target state.
    #[must_use]
    pub fn state(&self) -> Option<T> {
        self.state
    }

    /// Sets a new target state.
    ///
    /// With a transition, the value eases from its current value starting at
    /// the next update. Without one (or when either end is `None`), the value
    /// snaps to the state at the next update.
    pub fn set_state(&mut self, state: Option<T>, transition: Option<Transition>) {
        if state == self.state && self.transition.is_none() {
            return;
        }
        self.state = state;
        self.start = None;
        self.last_time = None;
        match (self.value, state, transition) {
            (Some(from), Some(_), Some(transition)) => {
                self.from = Some(from);
                self.transition = Some(transition);
            }
            _ => {
                self.from = None;
                self.transition = None;
            }
        }
        self.dirty = true;
    }
}

impl<T: Interpolate + FromStr> Tween<T> {
    /// Parses `input` and sets it as the new state.
    ///
    /// A malformed input degrades to a `None` state rather than failing.
    pub fn set_state_from_str(&mut self, input: &str, transition: Option<Transition>) {
        let state = match input.trim().parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(input, "unparsable animator state; clearing value");
                None
            }
        };
        self.set_state(state, transition);
    }
}

impl<T: Interpolate> Animator for Tween<T> {
    fn update(&mut self, time: HostTime) -> AnimatorUpdate {
        if self.last_time == Some(time) {
            return AnimatorUpdate {
                changed: false,
                animating: self.transition.is_some(),
            };
        }
        self.last_time = Some(time);

        let mut changed = core::mem::take(&mut self.dirty);
        let Some(transition) = self.transition else {
            if self.value != self.state {
                self.value = self.state;
                changed = true;
            }
            return AnimatorUpdate {
                changed,
                animating: false,
            };
        };

        let start = *self.start.get_or_insert(time);
        let elapsed = time.saturating_duration_since(start);
        let progress = if transition.duration == Duration::ZERO {
            1.0
        } else {
            elapsed.ticks() as f64 / transition.duration.ticks() as f64
        };

        if progress >= 1.0 {
            self.value = self.state;
            self.from = None;
            self.transition = None;
            self.start = None;
        } else if let (Some(from), Some(to)) = (self.from, self.state) {
            self.value = Some(from.interpolate(to, transition.ease.apply(progress)));
        }
        AnimatorUpdate {
            changed: true,
            animating: self.transition.is_some(),
        }
    }

    fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    fn update_flags(&self) -> NodeFlags {
        self.update_flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    fn fade() -> Transition {
        Transition::new(Duration(100 * MS), Ease::Linear)
    }

    #[test]
    fn ease_endpoints_are_fixed() {
        for ease in [
            Ease::Linear,
            Ease::InQuad,
            Ease::OutQuad,
            Ease::InOutQuad,
            Ease::InCubic,
            Ease::OutCubic,
            Ease::InOutCubic,
        ] {
            assert!(ease.apply(0.0).abs() < 1e-12, "{ease:?} at 0");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?} at 1");
        }
        assert!((Ease::InOutCubic.apply(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(Ease::Linear.apply(2.0), 1.0);
    }

    #[test]
    fn tween_eases_toward_state() {
        let mut tween = Tween::new(Some(0.0_f64));
        tween.set_state(Some(10.0), Some(fade()));

        let first = tween.update(HostTime(0));
        assert_eq!(
            first,
            AnimatorUpdate {
                changed: true,
                animating: true
            }
        );
        assert_eq!(tween.value(), Some(0.0));

        tween.update(HostTime(50 * MS));
        assert_eq!(tween.value(), Some(5.0));

        let last = tween.update(HostTime(100 * MS));
        assert!(!last.animating, "transition completes at its duration");
        assert_eq!(tween.value(), Some(10.0));
        assert!(!tween.is_animating());
    }

    #[test]
    fn tween_update_is_idempotent_per_time() {
        let mut tween = Tween::new(Some(0.0_f32));
        tween.set_state(Some(1.0), Some(fade()));
        tween.update(HostTime(0));
        tween.update(HostTime(40 * MS));
        let value = tween.value();
        let again = tween.update(HostTime(40 * MS));
        assert!(!again.changed);
        assert!(again.animating);
        assert_eq!(tween.value(), value);
    }

    #[test]
    fn tween_without_transition_snaps() {
        let mut tween = Tween::new(Some(Point::ORIGIN));
        tween.set_state(Some(Point::new(3.0, 4.0)), None);
        let update = tween.update(HostTime(7));
        assert!(update.changed);
        assert!(!update.animating);
        assert_eq!(tween.value(), Some(Point::new(3.0, 4.0)));
    }

    #[test]
    fn malformed_state_degrades_to_none() {
        let mut tween = Tween::new(Some(1.0_f64));
        tween.set_state_from_str("not-a-number", Some(fade()));
        assert_eq!(tween.state(), None);
        let update = tween.update(HostTime(0));
        assert!(update.changed);
        assert!(!update.animating, "no transition toward a missing value");
        assert_eq!(tween.value(), None);

        tween.set_state_from_str(" 2.5 ", None);
        tween.update(HostTime(1));
        assert_eq!(tween.value(), Some(2.5));
    }

    #[test]
    fn rect_and_size_interpolate_componentwise() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(a.interpolate(b, 0.5), Rect::new(5.0, 10.0, 20.0, 25.0));
        assert_eq!(
            Size::new(2.0, 4.0).interpolate(Size::new(4.0, 8.0), 0.5),
            Size::new(3.0, 6.0)
        );
        assert_eq!(Vec2::ZERO.interpolate(Vec2::new(2.0, 2.0), 0.25), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn registry_reports_requested_flags() {
        let mut registry = AnimatorRegistry::new();
        registry.register("opacity", Tween::new(Some(1.0_f64)));
        registry.register(
            "frame",
            Tween::new(Some(Rect::ZERO)).with_update_flags(NodeFlags::NEEDS_LAYOUT),
        );
        registry.mount_all();

        registry
            .get_mut::<Tween<f64>>("opacity")
            .unwrap()
            .set_state(Some(0.0), Some(fade()));
        let requested = registry.update_all(HostTime(0));
        assert_eq!(requested, NodeFlags::NEEDS_RENDER | NodeFlags::NEEDS_ANIMATE);

        registry
            .get_mut::<Tween<Rect>>("frame")
            .unwrap()
            .set_state(Some(Rect::new(0.0, 0.0, 1.0, 1.0)), None);
        let requested = registry.update_all(HostTime(200 * MS));
        assert_eq!(requested, NodeFlags::NEEDS_RENDER | NodeFlags::NEEDS_LAYOUT);
        assert!(!registry.is_animating());
    }

    #[test]
    fn registry_downcast_checks_the_type() {
        let mut registry = AnimatorRegistry::new();
        registry.register("x", Tween::new(Some(1.0_f64)));
        assert!(registry.get::<Tween<f64>>("x").is_some());
        assert!(registry.get::<Tween<f32>>("x").is_none());
        assert!(registry.get::<Tween<f64>>("y").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), ["x"]);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_names_panic() {
        let mut registry = AnimatorRegistry::new();
        registry.register("x", Tween::new(Some(1.0_f64)));
        registry.register("x", Tween::new(Some(2.0_f64)));
    }
}
