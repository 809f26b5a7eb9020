//! rpn-logic - Reverse-Polish rule evaluation engine
//!
//! Compiles a small postfix formula language into executable programs and
//! evaluates them against a numeric stack. Host daemons feed the engine
//! live topic values through an [`EnvResolver`]; stateful operators latch
//! state across passes (edge detectors, delay timers, time sources) and ask
//! the host, through the timer integration, to re-run the owning chain when
//! that state is due to change.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Parser  │────▶│   Program    │────▶│    Stack     │
//! │ (tokens) │     │ (node chain) │     │ (f64 values) │
//! └──────────┘     └──────┬───────┘     └──────────────┘
//!                         │
//!              ┌──────────┴──────────┐
//!              ▼                     ▼
//!       ┌──────────────┐     ┌──────────────┐
//!       │ TimerService │     │ EnvResolver  │
//!       │ (ondelay …)  │     │ (${topic})   │
//!       └──────────────┘     └──────────────┘
//! ```
//!
//! The model is single-threaded and cooperative: the engine never spawns
//! tasks and no operation blocks. A pass runs to completion or to the first
//! stack underflow; reruns requested by timers come back to the host as
//! return values of [`Program::on_timer`], never as nested evaluation.
//!
//! # Example
//!
//! ```rust
//! use rpn_logic::{compile, run, RunContext, Stack, SystemClock, TimerQueue, TopicTable};
//!
//! let mut program = compile("${sensors/temp} 18 21 inrange").unwrap();
//! let mut stack = Stack::new();
//! let mut timers = TimerQueue::new();
//! let mut env = TopicTable::new();
//! env.set("sensors/temp", 19.5);
//!
//! let mut ctx = RunContext {
//!     timers: &mut timers,
//!     env: &mut env,
//!     clock: &SystemClock,
//! };
//! run(&mut program, &mut stack, &mut ctx).unwrap();
//! assert_eq!(stack.top(), Some(1.0));
//! ```

mod engine;
mod env;
mod error;
mod ops;
mod parser;
mod program;
mod stack;
mod timer;

// Re-export public API
pub use engine::{evaluate, run, RunContext};
pub use env::{EnvResolver, NullEnv, TopicTable};
pub use error::{Result, RpnError};
pub use parser::compile;
pub use program::{ChainToken, Program};
pub use stack::Stack;
pub use timer::{Clock, FixedClock, SystemClock, TimerKey, TimerQueue, TimerService};
