//! Compiled programs
//!
//! A program owns its nodes for its whole life. Rerun requests are surfaced
//! to the host as return values instead of stored callbacks, so tearing a
//! program down only requires cancelling its pending timers — after
//! [`Program::cancel_timers`] no callback can fire into a dead chain.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::ops::Op;
use crate::timer::{TimerKey, TimerService};

/// Process-unique identity of one compiled program
///
/// Namespaces the program's timer keys so a single host scheduler can serve
/// many rules at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainToken(u64);

static NEXT_CHAIN: AtomicU64 = AtomicU64::new(1);

impl ChainToken {
    pub(crate) fn next() -> Self {
        Self(NEXT_CHAIN.fetch_add(1, Ordering::Relaxed))
    }
}

/// One compiled operation plus its timer slot
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) op: Op,
    /// Whether a one-shot timer is outstanding for this node
    pub(crate) timer_pending: bool,
}

impl Node {
    pub(crate) fn new(op: Op) -> Self {
        Self {
            op,
            timer_pending: false,
        }
    }
}

/// An executable chain of operations compiled from one formula
///
/// Latched operator state persists across evaluation passes of the same
/// program and is reset only by re-compiling the formula.
#[derive(Debug)]
pub struct Program {
    token: ChainToken,
    pub(crate) nodes: Vec<Node>,
}

impl Program {
    pub(crate) fn new(nodes: Vec<Node>) -> Self {
        Self {
            token: ChainToken::next(),
            nodes,
        }
    }

    /// Identity carried by this program's timer keys
    pub fn token(&self) -> ChainToken {
        self.token
    }

    /// Number of compiled nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handle a fired timer for `node`.
    ///
    /// Completes the armed transition of a delay/pulse latch, or is a plain
    /// wakeup tick for the time-source operators. Returns whether the chain
    /// should be re-evaluated so the new output is observed and republished.
    pub fn on_timer(&mut self, node: u32) -> bool {
        let Some(n) = self.nodes.get_mut(node as usize) else {
            warn!(node, "timer fired for unknown node");
            return false;
        };
        let opname = n.op.name();
        n.timer_pending = false;
        match &mut n.op {
            Op::OnDelay(latch) | Op::OffDelay(latch) | Op::Pulse(latch) => {
                latch.output = !latch.output;
                true
            },
            Op::TimeOfDay | Op::DayOfWeek => true,
            _ => {
                warn!(node, op = opname, "timer fired for stateless node");
                false
            },
        }
    }

    /// Cancel every pending node timer.
    ///
    /// Must run before the program is dropped; the host does this when a
    /// rule is replaced or removed.
    pub fn cancel_timers(&mut self, timers: &mut dyn TimerService) {
        let chain = self.token;
        for (idx, node) in self.nodes.iter_mut().enumerate() {
            if node.timer_pending {
                timers.cancel(TimerKey {
                    chain,
                    node: idx as u32,
                });
                node.timer_pending = false;
            }
        }
    }

    /// Whether any node references the environment name `name`
    pub fn references(&self, name: &str) -> bool {
        self.referenced_topics().any(|topic| topic == name)
    }

    /// Environment names referenced by this program, in node order
    ///
    /// Hosts use this to maintain subscription refcounts per topic.
    pub fn referenced_topics(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match &node.op {
            Op::Env { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        // a pending timer here means the host skipped cancel_timers and the
        // scheduler still holds a key into this dead chain
        if self.nodes.iter().any(|node| node.timer_pending) {
            warn!(token = ?self.token, "program dropped with pending timers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile;

    #[test]
    fn test_referenced_topics() {
        let program = compile("${a/b} ${c,opts} + ${a/b} *").unwrap();

        let topics: Vec<&str> = program.referenced_topics().collect();
        assert_eq!(topics, vec!["a/b", "c", "a/b"]);
        assert!(program.references("c"));
        assert!(!program.references("opts"));
    }

    #[test]
    fn test_timer_for_unknown_node_is_ignored() {
        let mut program = compile("1 2 +").unwrap();
        assert!(!program.on_timer(17));
        // pure nodes never own a timer either
        assert!(!program.on_timer(2));
    }
}
