//! Replays recorded interactions from a cassette.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays interactions from a loaded cassette, serving them per
/// port/method pair.
pub struct CassetteReplayer {
    /// Per port+method queue of unconsumed interactions (in order).
    queues: HashMap<PortMethodKey, VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push_back(interaction.clone());
        }
        Self { queues }
    }

    /// Return the first unconsumed interaction for the port and method whose
    /// recorded input equals `input`. A recorded `null` input matches anything.
    ///
    /// Concurrent callers may reach the port in any order, so matching by
    /// input keeps replay deterministic.
    ///
    /// # Panics
    ///
    /// Panics if no remaining interaction matches, listing the inputs that
    /// are still available.
    pub fn next_matching(
        &mut self,
        port: &str,
        method: &str,
        input: &serde_json::Value,
    ) -> Interaction {
        let queue = self.queue(port, method);
        let position = queue.iter().position(|i| i.input.is_null() || i.input == *input);
        if let Some(interaction) = position.and_then(|p| queue.remove(p)) {
            return interaction;
        }
        let remaining: Vec<String> = queue.iter().map(|i| i.input.to_string()).collect();
        panic!(
            "Cassette exhausted: no interaction for port={port:?} method={method:?} \
             input={input}. Remaining inputs: [{}]",
            remaining.join(", ")
        );
    }

    fn queue(&mut self, port: &str, method: &str) -> &mut VecDeque<Interaction> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };
        if !self.queues.contains_key(&key) {
            let available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            panic!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            );
        }
        self.queues.entry(key).or_default()
    }
}
