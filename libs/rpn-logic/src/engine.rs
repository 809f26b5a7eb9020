//! Execution engine
//!
//! Walks a compiled program against a stack, strictly left to right, once
//! per pass. The first underflow aborts the pass; everything earlier nodes
//! did — stack effects, cookie updates, scheduled timers — stands.

use crate::env::EnvResolver;
use crate::error::Result;
use crate::program::Program;
use crate::stack::Stack;
use crate::timer::{Clock, TimerKey, TimerService};

/// Collaborator borrows one evaluation pass runs against
pub struct RunContext<'a> {
    /// One-shot timer scheduling for the temporal operators
    pub timers: &'a mut dyn TimerService,
    /// Live named-value lookup for `${...}` references
    pub env: &'a mut dyn EnvResolver,
    /// Wall clock for the time-source operators
    pub clock: &'a dyn Clock,
}

/// Run one evaluation pass of `program` against `stack`.
///
/// On success the stack holds the chain's result, conventionally its top
/// value; the caller owns interpreting and clearing it before the next
/// pass. On underflow the stack is left exactly as the last successful node
/// left it.
pub fn run(program: &mut Program, stack: &mut Stack, ctx: &mut RunContext<'_>) -> Result<()> {
    let chain = program.token();
    for (idx, node) in program.nodes.iter_mut().enumerate() {
        let key = TimerKey {
            chain,
            node: idx as u32,
        };
        node.apply(stack, ctx, key)?;
    }
    Ok(())
}

/// Reset the stack, run one pass and hand back the top of the stack.
///
/// Matches the publish loop of a typical host daemon; `None` means the pass
/// left nothing to publish.
pub fn evaluate(
    program: &mut Program,
    stack: &mut Stack,
    ctx: &mut RunContext<'_>,
) -> Result<Option<f64>> {
    stack.reset();
    run(program, stack, ctx)?;
    Ok(stack.top())
}
