//! Async Learning Queue (C8)
//!
//! `remember` calls return as soon as a learning task is queued — the
//! actual extraction and storage happen on a small worker pool so the
//! caller's prompt latency never pays for it (§4.8). Bounded depth with a
//! priority-aware drop policy means a burst of traffic degrades by losing
//! the least valuable pending work, not by blocking or OOMing.

mod task;
mod worker;

pub use task::{LearnTask, TaskPriority, TaskStatus};
pub use worker::{AsyncLearningQueue, TaskHandler};
