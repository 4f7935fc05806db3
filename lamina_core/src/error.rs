// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by node hooks during a cascade.
//!
//! Lifecycle misuse (mounting twice, stale handles, removing a node that is
//! not a child) is a programming error and panics at the call site. The
//! errors here are the recoverable kind: a hook reported failure, the
//! cascade released its transient flags, and the failure propagates to the
//! caller (or, inside a scheduler pass, is isolated to its root).

use std::borrow::Cow;

use crate::tree::NodeId;

/// Result type returned by node hooks.
pub type HookResult = Result<(), CascadeError>;

/// Which hook or cascade step failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Mount or unmount.
    Mount,
    /// Power or unpower.
    Power,
    /// Cull or uncull.
    Cull,
    /// A process pass hook.
    Process,
    /// A display pass hook.
    Display,
}

/// A failure raised while cascading through a node.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CascadeError {
    /// A lifecycle or pass hook failed.
    #[error("{phase:?} hook failed on {node:?}: {message}")]
    Hook {
        /// The node whose hook failed, if known.
        node: Option<NodeId>,
        /// The phase that was running.
        phase: Phase,
        /// Human-readable description.
        message: Cow<'static, str>,
    },

    /// The layout solver rejected a constraint or variable owned by a node.
    #[error("layout solver rejected an entry of {node:?}: {message}")]
    Solver {
        /// The owning node.
        node: NodeId,
        /// The solver's description of the failure.
        message: Cow<'static, str>,
    },
}

impl CascadeError {
    /// Creates a hook failure for the given phase.
    ///
    /// The node is filled in by the cascade when the error crosses it.
    pub fn hook(phase: Phase, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Hook {
            node: None,
            phase,
            message: message.into(),
        }
    }

    /// Returns the node the failure is attributed to.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Hook { node, .. } => *node,
            Self::Solver { node, .. } => Some(*node),
        }
    }

    /// Attributes an anonymous hook failure to `id`.
    #[must_use]
    pub(crate) fn at(mut self, id: NodeId) -> Self {
        if let Self::Hook { node, .. } = &mut self
            && node.is_none()
        {
            *node = Some(id);
        }
        self
    }
}
