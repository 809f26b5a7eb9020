//! Environment references
//!
//! `${name[,options]}` tokens read live values owned by the host, typically
//! the cached payload of another message-bus topic.

use rustc_hash::FxHashMap;
use tracing::debug;

/// Named-value lookup the host grants the engine
pub trait EnvResolver {
    /// Current value for `name`
    ///
    /// `options` carries the text after the last comma of the reference,
    /// when present; its meaning is up to the host.
    fn resolve(&mut self, name: &str, options: Option<&str>) -> f64;
}

/// In-memory topic/value table
///
/// For hosts that cache bus payloads locally, and for tests. Unknown names
/// read as 0.0.
#[derive(Debug, Default)]
pub struct TopicTable {
    values: FxHashMap<String, f64>,
}

impl TopicTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest value for a topic
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Forget a topic, e.g. after a retained-message clear
    pub fn remove(&mut self, name: &str) {
        self.values.remove(name);
    }
}

impl EnvResolver for TopicTable {
    fn resolve(&mut self, name: &str, _options: Option<&str>) -> f64 {
        match self.values.get(name) {
            Some(value) => *value,
            None => {
                debug!(topic = name, "topic not found");
                0.0
            },
        }
    }
}

/// Resolver that knows nothing; every reference reads as 0.0
pub struct NullEnv;

impl EnvResolver for NullEnv {
    fn resolve(&mut self, _name: &str, _options: Option<&str>) -> f64 {
        0.0
    }
}
