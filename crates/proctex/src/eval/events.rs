//! Event types and sinks for observing evaluation passes.
//!
//! A pass started through [`crate::eval::runtime::TextureRuntime`] emits [`EvalEvent`]s to
//! an [`EventSink`]. Sinks can collect events ([`VecSink`]), forward them to a closure
//! ([`FnSink`]), or drop them (`()`).
use crate::eval::runtime::PassReport;
use crate::texgraph::{NodeId, NodeKind};

/// Events emitted while evaluating a graph.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum EvalEvent {
    /// Emitted before the first node of a pass is evaluated.
    PassStarted {
        /// Side length of every buffer produced by this pass.
        resolution: u32,
        /// Number of nodes in the evaluation order.
        scheduled: usize,
    },

    /// Emitted after a node's buffer was written.
    NodeEvaluated {
        id: NodeId,
        /// `None` for node types the catalog does not know.
        kind: Option<NodeKind>,
    },

    /// Emitted when nodes were left out of the pass because they sit on or behind a cycle.
    NodesSkipped { ids: Vec<NodeId> },

    /// Emitted when the pass is over.
    PassFinished { report: PassReport },
}

/// Discriminant of [`EvalEvent`], used for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvalEventKind {
    PassStarted,
    NodeEvaluated,
    NodesSkipped,
    PassFinished,
}

impl EvalEvent {
    pub fn kind(&self) -> EvalEventKind {
        match self {
            EvalEvent::PassStarted { .. } => EvalEventKind::PassStarted,
            EvalEvent::NodeEvaluated { .. } => EvalEventKind::NodeEvaluated,
            EvalEvent::NodesSkipped { .. } => EvalEventKind::NodesSkipped,
            EvalEvent::PassFinished { .. } => EvalEventKind::PassFinished,
        }
    }
}

/// A generic event sink that accepts [`EvalEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: EvalEvent);

    /// Whether the sink cares about events of `kind`. Emitters skip building events
    /// nobody wants.
    #[inline]
    fn wants(&self, _kind: EvalEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: EvalEvent) {}

    #[inline]
    fn wants(&self, _kind: EvalEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(EvalEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(EvalEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(EvalEvent),
{
    #[inline]
    fn send(&mut self, event: EvalEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<EvalEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<EvalEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[EvalEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Ids from every [`EvalEvent::NodeEvaluated`], in emission order.
    pub fn evaluated_nodes(&self) -> Vec<NodeId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EvalEvent::NodeEvaluated { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: EvalEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::new();
        assert!(sink.is_empty());
        sink.send(EvalEvent::NodeEvaluated {
            id: 4,
            kind: Some(NodeKind::Invert),
        });
        sink.send(EvalEvent::NodesSkipped { ids: vec![1, 2] });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.evaluated_nodes(), vec![4]);
        assert_eq!(sink.as_slice()[1].kind(), EvalEventKind::NodesSkipped);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(EvalEvent::NodesSkipped { ids: Vec::new() });
        assert!(sink.wants(EvalEventKind::NodeEvaluated));
        drop(sink);
        assert_eq!(count, 1);
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!().wants(EvalEventKind::PassFinished));
    }
}
