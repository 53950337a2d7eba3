use super::effect_trait::Effect;
use super::kind::EffectKind;
use crate::error::{EngineError, EngineResult};
use crate::host::{AudioGraphHost, NodeId, NodeKind};
use crate::ids::{EffectId, IdGenerator};

struct Entry {
    id: EffectId,
    effect: Box<dyn Effect>,
}

/// Ordered list of effects wired in series with an input/output terminal.
///
/// Invariants upheld by `rewire`:
/// (a) empty chain: `input -> level -> output`;
/// (b) non-empty: `input -> effects[0] -> ... -> effects[n-1] -> level ->
///     output`, in list order;
/// (c) the external output terminal (`output`) is never disconnected —
///     only edges this chain created itself (tracked in `internal_edges`)
///     are torn down and re-created on every rewire.
pub struct EffectChain {
    entries: Vec<Entry>,
    input: NodeId,
    output: NodeId,
    level_node: NodeId,
    level: f64,
    internal_edges: Vec<(NodeId, NodeId)>,
}

impl EffectChain {
    pub fn new(host: &mut dyn AudioGraphHost) -> Self {
        let input = host.create_node(NodeKind::Gain);
        let output = host.create_node(NodeKind::Gain);
        let level_node = host.create_node(NodeKind::Gain);
        host.set_param(input, "gain", 1.0);
        host.set_param(output, "gain", 1.0);
        host.set_param(level_node, "gain", 1.0);

        let mut chain = Self {
            entries: Vec::new(),
            input,
            output,
            level_node,
            level: 1.0,
            internal_edges: Vec::new(),
        };
        chain.rewire(host);
        chain
    }

    pub fn input_node(&self) -> NodeId {
        self.input
    }

    /// The external output terminal. Stable for the chain's lifetime;
    /// whatever the track connected this to stays connected across every
    /// add/remove/move.
    pub fn output_node(&self) -> NodeId {
        self.output
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn effect_ids(&self) -> Vec<EffectId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn get(&self, id: EffectId) -> Option<&dyn Effect> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.effect.as_ref())
    }

    pub fn get_mut(&mut self, id: EffectId) -> Option<&mut (dyn Effect + 'static)> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e.effect.as_mut())
    }

    pub fn create_effect(
        &mut self,
        host: &mut dyn AudioGraphHost,
        ids: &IdGenerator,
        kind: EffectKind,
        index: Option<usize>,
    ) -> EffectId {
        let effect = kind.instantiate(host);
        let id = ids.next_effect_id();
        self.insert(host, id, effect, index);
        id
    }

    fn insert(
        &mut self,
        host: &mut dyn AudioGraphHost,
        id: EffectId,
        effect: Box<dyn Effect>,
        index: Option<usize>,
    ) {
        let at = index.unwrap_or(self.entries.len()).min(self.entries.len());
        log::debug!("chain inserting effect {} at index {}", id, at);
        self.entries.insert(at, Entry { id, effect });
        self.rewire(host);
    }

    pub fn remove_effect(
        &mut self,
        host: &mut dyn AudioGraphHost,
        id: EffectId,
    ) -> EngineResult<()> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EngineError::configuration(format!("unknown effect id {id}")))?;
        let mut removed = self.entries.remove(pos);
        removed.effect.dispose(host);
        log::debug!("chain removed effect {}", id);
        self.rewire(host);
        Ok(())
    }

    pub fn move_effect(
        &mut self,
        host: &mut dyn AudioGraphHost,
        id: EffectId,
        new_index: usize,
    ) -> EngineResult<()> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EngineError::configuration(format!("unknown effect id {id}")))?;
        let entry = self.entries.remove(pos);
        let at = new_index.min(self.entries.len());
        self.entries.insert(at, entry);
        log::debug!("chain moved effect {} to index {}", id, at);
        self.rewire(host);
        Ok(())
    }

    pub fn set_chain_level(&mut self, host: &mut dyn AudioGraphHost, amount: f64) {
        self.level = amount.max(0.0);
        host.set_param(self.level_node, "gain", self.level);
    }

    pub fn chain_level(&self) -> f64 {
        self.level
    }

    /// Tears down only the edges this chain created (`internal_edges`) and
    /// recreates them from scratch following the current entry order. The
    /// `output` node's downstream connection, made by whoever owns this
    /// chain, is never touched.
    fn rewire(&mut self, host: &mut dyn AudioGraphHost) {
        log::trace!("rewiring chain of {} effect(s)", self.entries.len());
        for (from, to) in self.internal_edges.drain(..) {
            host.disconnect(from, to);
        }

        let mut cursor = self.input;
        for entry in &self.entries {
            let entry_in = entry.effect.input_node();
            let entry_out = entry.effect.output_node();
            host.connect(cursor, entry_in);
            self.internal_edges.push((cursor, entry_in));
            cursor = entry_out;
        }
        host.connect(cursor, self.level_node);
        self.internal_edges.push((cursor, self.level_node));
        host.connect(self.level_node, self.output);
        self.internal_edges.push((self.level_node, self.output));
    }

    pub fn dispose(&mut self, host: &mut dyn AudioGraphHost) {
        for (from, to) in self.internal_edges.drain(..) {
            host.disconnect(from, to);
        }
        for entry in &mut self.entries {
            entry.effect.dispose(host);
        }
        self.entries.clear();
        host.dispose(self.input);
        host.dispose(self.output);
        host.dispose(self.level_node);
    }

    /// `{id, level, effects: [{id, type, enabled, parameters}]}`.
    pub fn serialize_state(&self) -> serde_json::Value {
        let effects: Vec<serde_json::Value> = self
            .entries
            .iter()
            .map(|entry| {
                let params: serde_json::Map<String, serde_json::Value> = entry
                    .effect
                    .params()
                    .iter()
                    .map(|p| {
                        (
                            p.id.to_string(),
                            serde_json::json!(entry.effect.get_parameter(p.id)),
                        )
                    })
                    .collect();
                serde_json::json!({
                    "id": entry.id.value(),
                    "type": entry.effect.kind_name(),
                    "enabled": entry.effect.is_enabled(),
                    "parameters": params,
                })
            })
            .collect();
        serde_json::json!({
            "level": self.level,
            "effects": effects,
        })
    }

    /// Restores a chain from `serialize_state`'s output: disposes the
    /// current entries and recreates each in order, preserving parameter
    /// values exactly. Effect ids are regenerated rather than restored.
    pub fn set_state(
        &mut self,
        host: &mut dyn AudioGraphHost,
        ids: &IdGenerator,
        state: &serde_json::Value,
    ) -> EngineResult<()> {
        for entry in self.entries.drain(..) {
            let mut entry = entry;
            entry.effect.dispose(host);
        }
        self.internal_edges.clear();

        if let Some(level) = state.get("level").and_then(|v| v.as_f64()) {
            self.set_chain_level(host, level);
        }

        let effects = state
            .get("effects")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        for entry in effects {
            let type_name = entry
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| EngineError::configuration("effect state missing type"))?;
            let kind = EffectKind::from_name(type_name)
                .ok_or_else(|| EngineError::configuration(format!("unsupported effect type {type_name}")))?;
            let mut effect = kind.instantiate(host);

            if let Some(params) = entry.get("parameters").and_then(|v| v.as_object()) {
                for (name, value) in params {
                    if let Some(v) = value.as_f64() {
                        effect.set_parameter(host, name, v);
                    }
                }
            }
            if let Some(enabled) = entry.get("enabled").and_then(|v| v.as_bool()) {
                effect.set_enabled(host, enabled);
            }

            let id = ids.next_effect_id();
            self.entries.push(Entry { id, effect });
        }
        self.rewire(host);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedHost;

    #[test]
    fn empty_chain_connects_input_to_output_directly() {
        let mut host = SimulatedHost::new(48_000.0);
        let chain = EffectChain::new(&mut host);
        assert!(host.is_connected(chain.input_node(), chain.level_node));
        assert!(host.is_connected(chain.level_node, chain.output_node()));
    }

    #[test]
    fn add_remove_move_preserves_output_terminal() {
        let mut host = SimulatedHost::new(48_000.0);
        let ids = IdGenerator::new();
        let mut chain = EffectChain::new(&mut host);
        let downstream = host.create_node(NodeKind::Gain);
        host.connect(chain.output_node(), downstream);

        let a = chain.create_effect(&mut host, &ids, EffectKind::Delay, None);
        let _b = chain.create_effect(&mut host, &ids, EffectKind::Eq, None);
        chain.move_effect(&mut host, a, 1).unwrap();
        chain.remove_effect(&mut host, a).unwrap();

        assert!(host.is_connected(chain.output_node(), downstream));
    }

    #[test]
    fn state_round_trip_preserves_order_and_params() {
        let mut host = SimulatedHost::new(48_000.0);
        let ids = IdGenerator::new();
        let mut chain = EffectChain::new(&mut host);
        chain.create_effect(&mut host, &ids, EffectKind::Reverb, None);
        let delay_id = chain.create_effect(&mut host, &ids, EffectKind::Delay, None);
        chain
            .get_mut(delay_id)
            .unwrap()
            .set_parameter(&mut host, "feedback", 0.6);

        let state = chain.serialize_state();
        chain.set_state(&mut host, &ids, &state).unwrap();
        let round_tripped = chain.serialize_state();

        assert_eq!(state["effects"], round_tripped["effects"]);
        assert_eq!(state["level"], round_tripped["level"]);
    }
}
