// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ambient environment handed to every hook.

use kurbo::{Insets, Size};

use crate::time::HostTime;

/// Screen orientation, derived from the viewport's aspect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// The visible area roots are laid out into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Size in logical pixels.
    pub size: Size,
    /// Insets that content should avoid (notches, system bars).
    pub safe_area: Insets,
    /// Orientation.
    pub orientation: Orientation,
    /// Physical pixels per logical pixel.
    pub pixel_ratio: f64,
}

impl Viewport {
    /// A viewport of `size` at 1x with no safe-area insets.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            safe_area: Insets::ZERO,
            orientation: Self::orientation_of(size),
            pixel_ratio: 1.0,
        }
    }

    /// Sets the pixel ratio.
    #[must_use]
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Sets the safe-area insets.
    #[must_use]
    pub fn with_safe_area(mut self, safe_area: Insets) -> Self {
        self.safe_area = safe_area;
        self
    }

    /// Orientation implied by a size. Square counts as portrait.
    #[must_use]
    pub fn orientation_of(size: Size) -> Orientation {
        if size.width > size.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Size::ZERO)
    }
}

/// Context record refreshed by the update manager before each pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateContext {
    /// Host time at which the current pass started.
    pub update_time: HostTime,
    /// Current viewport.
    pub viewport: Viewport,
    /// Whether the host environment is visible.
    pub visible: bool,
}
