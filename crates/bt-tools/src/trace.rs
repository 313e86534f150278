use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A small, allocation-friendly trace event.
///
/// Plain data so it can be recorded during simulation and rendered later by
/// tooling. `node` is the instance name of the node the event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub tag: Cow<'static, str>,
    pub node: Cow<'static, str>,
    pub a: u64,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            tag: tag.into(),
            node: Cow::Borrowed(""),
            a: 0,
        }
    }

    pub fn with_node(mut self, node: impl Into<Cow<'static, str>>) -> Self {
        self.node = node.into();
        self
    }

    pub fn with_a(mut self, a: u64) -> Self {
        self.a = a;
        self
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Sink whose events stay readable after it was handed to a tree.
#[derive(Debug, Clone, Default)]
pub struct SharedTraceSink(Rc<RefCell<TraceLog>>);

impl SharedTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.0.borrow().events.clone()
    }

    /// Tags in emission order, handy for asserting on lifecycle sequences.
    pub fn tags(&self) -> Vec<String> {
        self.0
            .borrow()
            .events
            .iter()
            .map(|e| e.tag.to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().events.clear();
    }
}

impl TraceSink for SharedTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.0.borrow_mut().push(event);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}
