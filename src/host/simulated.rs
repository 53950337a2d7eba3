use super::{AudioGraphHost, HostClock, NodeId, NodeKind, ParamName};
use petgraph::stable_graph::StableDiGraph;
use std::collections::HashMap;

/// A call to `start_buffer`, recorded so tests can assert the exact
/// `offset`/`duration` a clip was started with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartCall {
    pub node: NodeId,
    pub context_time: f64,
    pub offset: f64,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopCall {
    pub node: NodeId,
    pub at: f64,
}

/// Reference/test implementation of `AudioGraphHost` with no real audio
/// device. Keeps a `StableDiGraph` for wiring and a settable logical clock
/// so tests can drive time deterministically instead of waiting on a real
/// device callback.
pub struct SimulatedHost {
    graph: StableDiGraph<NodeKind, ()>,
    params: HashMap<(NodeId, ParamName), f64>,
    buffers: HashMap<NodeId, Vec<f32>>,
    clock: HostClock,
    sample_rate: f64,
    suspended: bool,
    closed: bool,
    pub start_calls: Vec<StartCall>,
    pub stop_calls: Vec<StopCall>,
}

impl SimulatedHost {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            graph: StableDiGraph::new(),
            params: HashMap::new(),
            buffers: HashMap::new(),
            clock: HostClock::new(0.0),
            sample_rate,
            suspended: true,
            closed: false,
            start_calls: Vec::new(),
            stop_calls: Vec::new(),
        }
    }

    pub fn buffer_samples(&self, node: NodeId) -> Option<&[f32]> {
        self.buffers.get(&node).map(|v| v.as_slice())
    }

    /// Advances the logical clock; the only way `current_time()` changes in
    /// this implementation, since there is no real audio callback.
    pub fn advance(&mut self, delta_seconds: f64) {
        self.clock.advance(delta_seconds);
    }

    pub fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.graph.node_weight(node.0).copied()
    }

    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.graph.contains_edge(from.0, to.0)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

impl AudioGraphHost for SimulatedHost {
    fn current_time(&self) -> f64 {
        self.clock.get()
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn create_node(&mut self, kind: NodeKind) -> NodeId {
        NodeId(self.graph.add_node(kind))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) {
        if !self.graph.contains_edge(from.0, to.0) {
            self.graph.add_edge(from.0, to.0, ());
        }
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) {
        if let Some(edge) = self.graph.find_edge(from.0, to.0) {
            self.graph.remove_edge(edge);
        }
    }

    fn disconnect_all(&mut self, node: NodeId) {
        let incoming: Vec<_> = self
            .graph
            .edges_directed(node.0, petgraph::Direction::Incoming)
            .map(|e| e.id())
            .collect();
        let outgoing: Vec<_> = self
            .graph
            .edges_directed(node.0, petgraph::Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        for edge in incoming.into_iter().chain(outgoing) {
            self.graph.remove_edge(edge);
        }
    }

    fn dispose(&mut self, node: NodeId) {
        self.graph.remove_node(node.0);
        self.params.retain(|(n, _), _| *n != node);
        self.buffers.remove(&node);
    }

    fn set_param(&mut self, node: NodeId, param: ParamName, value: f64) {
        self.params.insert((node, param), value);
    }

    fn get_param(&self, node: NodeId, param: ParamName) -> f64 {
        *self.params.get(&(node, param)).unwrap_or(&0.0)
    }

    fn load_buffer(&mut self, node: NodeId, samples: &[f32]) {
        self.buffers.insert(node, samples.to_vec());
    }

    fn start_buffer(
        &mut self,
        node: NodeId,
        context_time: f64,
        offset: f64,
        duration: Option<f64>,
    ) {
        self.start_calls.push(StartCall {
            node,
            context_time,
            offset,
            duration,
        });
    }

    fn stop(&mut self, node: NodeId, at: f64) {
        self.stop_calls.push(StopCall { node, at });
    }

    fn resume(&mut self) -> bool {
        self.suspended = false;
        true
    }

    fn suspend(&mut self) -> bool {
        self.suspended = true;
        true
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_removes_node_and_params() {
        let mut host = SimulatedHost::new(48_000.0);
        let gain = host.create_node(NodeKind::Gain);
        host.set_param(gain, "gain", 0.5);
        host.dispose(gain);
        assert_eq!(host.node_count(), 0);
        assert_eq!(host.get_param(gain, "gain"), 0.0);
    }

    #[test]
    fn connect_is_idempotent() {
        let mut host = SimulatedHost::new(48_000.0);
        let a = host.create_node(NodeKind::Gain);
        let b = host.create_node(NodeKind::Pan);
        host.connect(a, b);
        host.connect(a, b);
        assert!(host.is_connected(a, b));
    }

    #[test]
    fn clock_advances_deterministically() {
        let mut host = SimulatedHost::new(48_000.0);
        assert_eq!(host.current_time(), 0.0);
        host.advance(1.5);
        assert_eq!(host.current_time(), 1.5);
    }
}
