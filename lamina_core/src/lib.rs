// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree, lifecycle cascade, and adaptive update scheduling for retained
//! scene graphs.
//!
//! `lamina_core` keeps a tree of nodes whose behaviour is supplied by the
//! embedder, and decides when the logical and visual state of that tree is
//! brought up to date. Nodes are stored in struct-of-arrays layout with
//! generational index handles.
//!
//! # Architecture
//!
//! Work flows from invalidation, through the scheduler, to per-node hooks:
//!
//! ```text
//!   require_update(id, NEEDS_*) ──► flags on node + aggregates on ancestors
//!                                           │
//!                 ┌─────────────────────────┘
//!                 ▼
//!   UpdateManager ──► Host::set_timer ──► Trigger::Process
//!                                           │
//!                 ┌─────────────────────────┘
//!                 ▼
//!   cascade_process (resize, scroll, change, animate)
//!                 │ display work left?
//!                 ▼
//!   Host::request_frame ──► Trigger::Display ──► cascade_display
//!                                (layout, render, composite) ──► Renderer
//! ```
//!
//! **[`flags`]**: The per-node [`NodeFlags`](flags::NodeFlags) word. Lifecycle
//! bits, transient in-progress bits, and the needs bits passes consume.
//!
//! **[`tree`]**: The [`NodeTree`](tree::NodeTree) arena, the
//! [`Node`](tree::Node) hook trait, lifecycle operations (mount, power,
//! cull), and the process and display cascades.
//!
//! **[`manager`]**: The [`UpdateManager`](manager::UpdateManager), which
//! arms at most one host trigger at a time and adapts the process delay to
//! measured pass cost.
//!
//! **[`host`]**: The [`Host`](host::Host) contract (clock, timer, frame
//! callback) and the deterministic [`ManualHost`](host::ManualHost).
//!
//! **[`animator`]**: Per-node named animators advanced by the animate step,
//! with the stock eased [`Tween`](animator::Tween).
//!
//! **[`constraint`]**: Per-node constraints and variables, activated against
//! an external [`LayoutSolver`](constraint::LayoutSolver) while mounted.
//!
//! **[`env`]**: The [`UpdateContext`](env::UpdateContext) and
//! [`Viewport`](env::Viewport) every hook can read.
//!
//! **[`render`]**: The [`Renderer`](render::Renderer) trait display passes
//! draw through.
//!
//! **[`error`]**: [`CascadeError`](error::CascadeError), returned by hooks.
//!
//! **[`time`]**: Host ticks, durations, and timebases.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! update-loop instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod animator;
pub mod constraint;
pub mod env;
pub mod error;
pub mod flags;
pub mod host;
pub mod manager;
pub mod render;
pub mod time;
pub mod trace;
pub mod tree;
