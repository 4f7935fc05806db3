// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node lifecycle and dirty-state flags.
//!
//! Every node carries a single [`NodeFlags`] word that is the source of truth
//! for its lifecycle and update state. The bits fall into three groups:
//!
//! - **Lifecycle** — [`MOUNTED`](NodeFlags::MOUNTED),
//!   [`POWERED`](NodeFlags::POWERED), [`CULLED`](NodeFlags::CULLED) and
//!   [`HIDDEN`](NodeFlags::HIDDEN). These persist until explicitly toggled.
//! - **Transient** — [`TRAVERSING`](NodeFlags::TRAVERSING),
//!   [`PROCESSING`](NodeFlags::PROCESSING),
//!   [`DISPLAYING`](NodeFlags::DISPLAYING) and friends. They are set on entry
//!   to a cascade step and released on exit, including the error path.
//! - **Needs** — the per-step request bits grouped by
//!   [`PROCESS_MASK`](NodeFlags::PROCESS_MASK) and
//!   [`DISPLAY_MASK`](NodeFlags::DISPLAY_MASK), plus the two aggregates
//!   [`NEEDS_PROCESS`](NodeFlags::NEEDS_PROCESS) and
//!   [`NEEDS_DISPLAY`](NodeFlags::NEEDS_DISPLAY) that ancestors carry so a
//!   pass can find work without scanning the whole tree.
//!
//! Call sites should prefer the named accessors over raw bit tests.

bitflags::bitflags! {
    /// Lifecycle, transient, and dirty state for a node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        /// The node is attached to a mounted tree.
        const MOUNTED       = 1 << 0;
        /// The node is active for animation and rendering.
        const POWERED       = 1 << 1;
        /// The node and its subtree are excluded from display and hit testing.
        const CULLED        = 1 << 2;
        /// Like [`CULLED`](Self::CULLED), but a plain property rather than a
        /// guarded lifecycle axis.
        const HIDDEN        = 1 << 3;

        /// A cascade is currently visiting this node or its subtree.
        const TRAVERSING    = 1 << 4;
        /// A process pass is currently running on this node.
        const PROCESSING    = 1 << 5;
        /// A display pass is currently running on this node.
        const DISPLAYING    = 1 << 6;
        /// Animators are being advanced.
        const ANIMATING     = 1 << 7;
        /// Constraint variables are being refreshed from the solver.
        const CONSTRAINING  = 1 << 8;
        /// The node is scheduled for detachment at the parent's next safe point.
        const REMOVING      = 1 << 9;
        /// The node is a root taking part in an immediate update.
        const IMMEDIATE     = 1 << 10;

        /// Size-dependent state must be recomputed.
        const NEEDS_RESIZE    = 1 << 12;
        /// Scroll-dependent state must be recomputed.
        const NEEDS_SCROLL    = 1 << 13;
        /// Inherited logical state (theme, mood) changed.
        const NEEDS_CHANGE    = 1 << 14;
        /// Animators must be advanced.
        const NEEDS_ANIMATE   = 1 << 15;
        /// Some node at or below this one needs a process pass.
        const NEEDS_PROCESS   = 1 << 16;

        /// Layout must be recomputed.
        const NEEDS_LAYOUT    = 1 << 20;
        /// Content must be redrawn.
        const NEEDS_RENDER    = 1 << 21;
        /// Rendered content must be recomposited.
        const NEEDS_COMPOSITE = 1 << 22;
        /// Some node at or below this one needs a display pass.
        const NEEDS_DISPLAY   = 1 << 23;

        /// Logical-state steps handled by the process pass.
        const PROCESS_MASK = Self::NEEDS_RESIZE.bits()
            | Self::NEEDS_SCROLL.bits()
            | Self::NEEDS_CHANGE.bits()
            | Self::NEEDS_ANIMATE.bits();
        /// Visual-output steps handled by the display pass.
        const DISPLAY_MASK = Self::NEEDS_LAYOUT.bits()
            | Self::NEEDS_RENDER.bits()
            | Self::NEEDS_COMPOSITE.bits();
        /// Every bit a pass can consume.
        const UPDATE_MASK = Self::PROCESS_MASK.bits()
            | Self::NEEDS_PROCESS.bits()
            | Self::DISPLAY_MASK.bits()
            | Self::NEEDS_DISPLAY.bits();
        /// Bits that must never outlive the cascade step that set them.
        const TRANSIENT_MASK = Self::TRAVERSING.bits()
            | Self::PROCESSING.bits()
            | Self::DISPLAYING.bits()
            | Self::ANIMATING.bits()
            | Self::CONSTRAINING.bits();
    }
}

impl NodeFlags {
    /// Process steps in the order their `will*`/`on*` hooks run.
    pub const PROCESS_STEPS: [Self; 4] = [
        Self::NEEDS_RESIZE,
        Self::NEEDS_SCROLL,
        Self::NEEDS_CHANGE,
        Self::NEEDS_ANIMATE,
    ];

    /// Display steps in the order their `will*`/`on*` hooks run.
    pub const DISPLAY_STEPS: [Self; 3] = [
        Self::NEEDS_LAYOUT,
        Self::NEEDS_RENDER,
        Self::NEEDS_COMPOSITE,
    ];

    /// Returns the aggregate bits an ancestor must carry for `self` to be
    /// found by the next pass.
    #[must_use]
    pub fn ancestor_bits(self) -> Self {
        let mut bits = Self::empty();
        if self.intersects(Self::PROCESS_MASK | Self::NEEDS_PROCESS) {
            bits |= Self::NEEDS_PROCESS;
        }
        if self.intersects(Self::DISPLAY_MASK | Self::NEEDS_DISPLAY) {
            bits |= Self::NEEDS_DISPLAY;
        }
        bits
    }

    /// Whether the node is mounted.
    #[inline]
    #[must_use]
    pub fn is_mounted(self) -> bool {
        self.contains(Self::MOUNTED)
    }

    /// Whether the node is powered.
    #[inline]
    #[must_use]
    pub fn is_powered(self) -> bool {
        self.contains(Self::POWERED)
    }

    /// Whether the node itself is culled.
    #[inline]
    #[must_use]
    pub fn is_culled(self) -> bool {
        self.contains(Self::CULLED)
    }

    /// Whether the node itself is hidden.
    #[inline]
    #[must_use]
    pub fn is_hidden(self) -> bool {
        self.contains(Self::HIDDEN)
    }

    /// Whether the node is skipped by display passes and hit testing.
    #[inline]
    #[must_use]
    pub fn is_invisible(self) -> bool {
        self.intersects(Self::CULLED | Self::HIDDEN)
    }

    /// Whether a cascade is currently inside this node.
    #[inline]
    #[must_use]
    pub fn is_traversing(self) -> bool {
        self.contains(Self::TRAVERSING)
    }

    /// Whether the node is both mounted and powered, and may be visited by a pass.
    #[inline]
    #[must_use]
    pub fn is_traversable(self) -> bool {
        self.contains(Self::MOUNTED | Self::POWERED)
    }

    /// Whether a process or display pass is running on this node.
    #[inline]
    #[must_use]
    pub fn is_updating(self) -> bool {
        self.intersects(Self::PROCESSING | Self::DISPLAYING)
    }

    /// Whether the node is scheduled for detachment.
    #[inline]
    #[must_use]
    pub fn is_removing(self) -> bool {
        self.contains(Self::REMOVING)
    }

    /// Whether this node or a descendant has process work.
    #[inline]
    #[must_use]
    pub fn needs_process(self) -> bool {
        self.intersects(Self::PROCESS_MASK | Self::NEEDS_PROCESS)
    }

    /// Whether this node or a descendant has display work.
    #[inline]
    #[must_use]
    pub fn needs_display(self) -> bool {
        self.intersects(Self::DISPLAY_MASK | Self::NEEDS_DISPLAY)
    }

    /// Whether any pass has work here.
    #[inline]
    #[must_use]
    pub fn needs_update(self) -> bool {
        self.intersects(Self::UPDATE_MASK)
    }

    /// Whether the node's own layout is stale.
    #[inline]
    #[must_use]
    pub fn needs_layout(self) -> bool {
        self.contains(Self::NEEDS_LAYOUT)
    }

    /// Whether the node's own content is stale.
    #[inline]
    #[must_use]
    pub fn needs_render(self) -> bool {
        self.contains(Self::NEEDS_RENDER)
    }

    /// Whether the node's animators must advance.
    #[inline]
    #[must_use]
    pub fn needs_animate(self) -> bool {
        self.contains(Self::NEEDS_ANIMATE)
    }
}
