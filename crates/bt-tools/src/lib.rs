//! Tooling primitives for behavior trees.
//!
//! Engine-agnostic and lightweight: recorded trace events and blackboard
//! change logs that editors and tests can inspect after the fact.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod changes;
pub mod trace;

pub use changes::{ChangeLog, SharedChangeLog};
pub use trace::{NullTraceSink, SharedTraceSink, TraceEvent, TraceLog, TraceSink, VecTraceSink};
