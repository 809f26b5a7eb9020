//! Operation library
//!
//! The fixed catalogue of stack transformers a formula can compile to:
//!
//! - Pure operators: arithmetic, bitwise, boolean, comparison, stack
//!   shuffling, `limit`/`inrange`
//! - Temporal operators: `ondelay`/`offdelay`/`pulse` latches driven by
//!   one-shot timers, `edge`/`rising`/`falling` change detectors
//! - Time sources: `timeofday`/`dayofweek`, self-rescheduling at the next
//!   minute boundary
//!
//! Bitwise, boolean and edge-detecting operators truncate their operands to
//! integers; comparisons and arithmetic stay in f64. Every operator checks
//! its arity before touching the stack, so an underflow aborts the pass with
//! the stack exactly as the previous node left it.

use chrono::{Datelike, Timelike};

use crate::engine::RunContext;
use crate::error::{Result, RpnError};
use crate::program::Node;
use crate::stack::Stack;
use crate::timer::TimerKey;

/// Latched state of the delay/pulse operators
///
/// `input` mirrors the last seen input level; `output` is the published bit,
/// changed only on input transitions and timer fires.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DelayLatch {
    pub(crate) input: bool,
    pub(crate) output: bool,
}

/// One compiled operation, tagged with its persistent state
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Op {
    /// Push a literal
    Const(f64),
    /// Push a host-resolved value
    Env {
        name: String,
        options: Option<String>,
    },

    Add,
    Sub,
    Mul,
    Div,
    Pow,

    BitAnd,
    BitOr,
    BitXor,
    BitNot,

    And,
    Or,
    Not,

    Lt,
    Gt,

    Dup,
    Swap,

    Limit,
    InRange,

    OnDelay(DelayLatch),
    OffDelay(DelayLatch),
    Pulse(DelayLatch),

    /// Change detector; the register keeps the truncated last input
    Edge { last: i64 },
    Rising { last: i64 },
    Falling { last: i64 },

    TimeOfDay,
    DayOfWeek,
}

/// Operator keyword table; exact match only
pub(crate) fn lookup(token: &str) -> Option<Op> {
    let op = match token {
        "+" => Op::Add,
        "-" => Op::Sub,
        "*" => Op::Mul,
        "/" => Op::Div,
        "**" => Op::Pow,

        "&" => Op::BitAnd,
        "|" => Op::BitOr,
        "^" => Op::BitXor,
        "~" => Op::BitNot,

        "&&" => Op::And,
        "||" => Op::Or,
        "!" => Op::Not,

        "<" => Op::Lt,
        ">" => Op::Gt,

        "dup" => Op::Dup,
        "swap" => Op::Swap,

        "limit" => Op::Limit,
        "inrange" => Op::InRange,

        "ondelay" => Op::OnDelay(DelayLatch::default()),
        "offdelay" => Op::OffDelay(DelayLatch::default()),
        "pulse" => Op::Pulse(DelayLatch::default()),

        "edge" | "changed" => Op::Edge { last: 0 },
        "rising" | "pushed" => Op::Rising { last: 0 },
        "falling" => Op::Falling { last: 0 },

        "timeofday" => Op::TimeOfDay,
        "dayofweek" => Op::DayOfWeek,

        _ => return None,
    };
    Some(op)
}

impl Op {
    /// Canonical keyword, used in diagnostics
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Op::Const(_) => "const",
            Op::Env { .. } => "env",
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Pow => "**",
            Op::BitAnd => "&",
            Op::BitOr => "|",
            Op::BitXor => "^",
            Op::BitNot => "~",
            Op::And => "&&",
            Op::Or => "||",
            Op::Not => "!",
            Op::Lt => "<",
            Op::Gt => ">",
            Op::Dup => "dup",
            Op::Swap => "swap",
            Op::Limit => "limit",
            Op::InRange => "inrange",
            Op::OnDelay(_) => "ondelay",
            Op::OffDelay(_) => "offdelay",
            Op::Pulse(_) => "pulse",
            Op::Edge { .. } => "edge",
            Op::Rising { .. } => "rising",
            Op::Falling { .. } => "falling",
            Op::TimeOfDay => "timeofday",
            Op::DayOfWeek => "dayofweek",
        }
    }
}

fn truthy(value: f64) -> bool {
    value as i64 != 0
}

fn bool_f(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Delay until the next minute boundary, clamped into (0, 60]
fn next_minute(second: u32) -> f64 {
    let next = 60 - i64::from(second);
    if next <= 0 || next > 60 {
        60.0
    } else {
        next as f64
    }
}

impl Node {
    /// Apply this node's operation to the stack.
    ///
    /// Underflow leaves the stack untouched and aborts the pass; cookie
    /// updates already made by earlier nodes stand.
    pub(crate) fn apply(
        &mut self,
        stack: &mut Stack,
        ctx: &mut RunContext<'_>,
        key: TimerKey,
    ) -> Result<()> {
        let opname = self.op.name();
        let underflow = || RpnError::underflow(opname, key.node as usize);

        match &mut self.op {
            Op::Const(value) => stack.push(*value),
            Op::Env { name, options } => {
                let value = ctx.env.resolve(name, options.as_deref());
                stack.push(value);
            },

            Op::Add => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(a + b);
            },
            Op::Sub => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(a - b);
            },
            Op::Mul => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(a * b);
            },
            Op::Div => {
                // division by zero follows IEEE float semantics
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(a / b);
            },
            Op::Pow => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(a.powf(b));
            },

            Op::BitAnd => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(((a as i64) & (b as i64)) as f64);
            },
            Op::BitOr => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(((a as i64) | (b as i64)) as f64);
            },
            Op::BitXor => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(((a as i64) ^ (b as i64)) as f64);
            },
            Op::BitNot => {
                let a = stack.pop().ok_or_else(underflow)?;
                stack.push(!(a as i64) as f64);
            },

            Op::And => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(bool_f(truthy(a) && truthy(b)));
            },
            Op::Or => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(bool_f(truthy(a) || truthy(b)));
            },
            Op::Not => {
                let a = stack.pop().ok_or_else(underflow)?;
                stack.push(bool_f(!truthy(a)));
            },

            Op::Lt => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(bool_f(a < b));
            },
            Op::Gt => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(bool_f(a > b));
            },

            Op::Dup => {
                let a = stack.top().ok_or_else(underflow)?;
                stack.push(a);
            },
            Op::Swap => {
                let (a, b) = stack.pop2().ok_or_else(underflow)?;
                stack.push(b);
                stack.push(a);
            },

            Op::Limit => {
                let (x, lo, hi) = stack.pop3().ok_or_else(underflow)?;
                let clamped = if x < lo {
                    lo
                } else if x > hi {
                    hi
                } else {
                    x
                };
                stack.push(clamped);
            },
            Op::InRange => {
                let (x, lo, hi) = stack.pop3().ok_or_else(underflow)?;
                let hit = if lo <= hi {
                    x >= lo && x <= hi
                } else {
                    // wrap range, e.g. night hours 22..3
                    x >= lo || x <= hi
                };
                stack.push(bool_f(hit));
            },

            Op::OnDelay(latch) => {
                let (input, delay) = stack.pop2().ok_or_else(underflow)?;
                let inval = truthy(input);
                if inval && !latch.input {
                    // rising edge: arm the delay, output follows on fire
                    ctx.timers.schedule_once(key, delay);
                    self.timer_pending = true;
                } else if !inval && latch.input {
                    // falling edge: disarm and force low
                    ctx.timers.cancel(key);
                    self.timer_pending = false;
                    latch.output = false;
                }
                latch.input = inval;
                stack.push(bool_f(latch.output));
            },
            Op::OffDelay(latch) => {
                let (input, delay) = stack.pop2().ok_or_else(underflow)?;
                let inval = truthy(input);
                if !inval && latch.input {
                    // falling edge: arm the delay, output drops on fire
                    ctx.timers.schedule_once(key, delay);
                    self.timer_pending = true;
                } else if inval && !latch.input {
                    // rising edge: disarm and force high
                    ctx.timers.cancel(key);
                    self.timer_pending = false;
                    latch.output = true;
                }
                latch.input = inval;
                stack.push(bool_f(latch.output));
            },
            Op::Pulse(latch) => {
                let (input, delay) = stack.pop2().ok_or_else(underflow)?;
                let inval = truthy(input);
                if inval && !latch.input {
                    // rising edge: go high now, clear after the delay
                    ctx.timers.schedule_once(key, delay);
                    self.timer_pending = true;
                    latch.output = true;
                } else if !inval && latch.input {
                    // falling edge: disarm; the output stays latched until
                    // the next trigger completes
                    ctx.timers.cancel(key);
                    self.timer_pending = false;
                }
                latch.input = inval;
                stack.push(bool_f(latch.output));
            },

            Op::Edge { last } => {
                let inval = stack.pop().ok_or_else(underflow)? as i64;
                stack.push(bool_f(inval != *last));
                *last = inval;
            },
            Op::Rising { last } => {
                let inval = stack.pop().ok_or_else(underflow)? as i64;
                stack.push(bool_f(inval != 0 && *last == 0));
                *last = inval;
            },
            Op::Falling { last } => {
                let inval = stack.pop().ok_or_else(underflow)? as i64;
                stack.push(bool_f(inval == 0 && *last != 0));
                *last = inval;
            },

            Op::TimeOfDay => {
                let now = ctx.clock.now();
                stack.push(
                    f64::from(now.hour())
                        + f64::from(now.minute()) / 60.0
                        + f64::from(now.second()) / 3600.0,
                );
                // stay fresh at minute granularity without polling
                ctx.timers.schedule_once(key, next_minute(now.second()));
                self.timer_pending = true;
            },
            Op::DayOfWeek => {
                let now = ctx.clock.now();
                stack.push(f64::from(now.weekday().number_from_monday()));
                ctx.timers.schedule_once(key, next_minute(now.second()));
                self.timer_pending = true;
            },
        }
        Ok(())
    }
}
