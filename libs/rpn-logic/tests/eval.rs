//! Evaluation tests for the pure operator set
//!
//! Each case compiles a formula and runs a single pass against a fresh
//! stack; no timers or wall-clock time are involved.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use rpn_logic::{
    compile, evaluate, run, EnvResolver, NullEnv, Result, RpnError, RunContext, Stack, SystemClock,
    TimerQueue,
};

/// Run one pass and return the full stack contents, bottom first
fn eval(formula: &str) -> Result<Vec<f64>> {
    let mut stack = Stack::new();
    run_onto(formula, &mut stack)?;
    Ok(stack.values().to_vec())
}

/// Run one pass against a caller-provided (possibly pre-loaded) stack
fn run_onto(formula: &str, stack: &mut Stack) -> Result<()> {
    let mut program = compile(formula)?;
    let mut timers = TimerQueue::new();
    let mut env = NullEnv;
    let mut ctx = RunContext {
        timers: &mut timers,
        env: &mut env,
        clock: &SystemClock,
    };
    run(&mut program, stack, &mut ctx)
}

#[test]
fn test_addition() {
    assert_eq!(eval("1 2 +").unwrap(), vec![3.0]);
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval("7 2 -").unwrap(), vec![5.0]);
    assert_eq!(eval("3 4 *").unwrap(), vec![12.0]);
    assert_eq!(eval("10 4 /").unwrap(), vec![2.5]);
    assert_eq!(eval("2 10 **").unwrap(), vec![1024.0]);
}

#[test]
fn test_division_by_zero_is_not_an_error() {
    let result = eval("1 0 /").unwrap();
    assert!(result[0].is_infinite());
}

#[test]
fn test_bitwise() {
    assert_eq!(eval("6 3 &").unwrap(), vec![2.0]);
    assert_eq!(eval("6 3 |").unwrap(), vec![7.0]);
    assert_eq!(eval("6 3 ^").unwrap(), vec![5.0]);
    assert_eq!(eval("5 ~").unwrap(), vec![-6.0]);
    // operands are truncated before the bit operation
    assert_eq!(eval("6.9 3.2 &").unwrap(), vec![2.0]);
}

#[test]
fn test_boolean() {
    assert_eq!(eval("2 0 &&").unwrap(), vec![0.0]);
    assert_eq!(eval("2 3 &&").unwrap(), vec![1.0]);
    assert_eq!(eval("2 0 ||").unwrap(), vec![1.0]);
    assert_eq!(eval("0 0 ||").unwrap(), vec![0.0]);
    assert_eq!(eval("0 !").unwrap(), vec![1.0]);
    assert_eq!(eval("7 !").unwrap(), vec![0.0]);
    // sub-integer magnitudes truncate to false
    assert_eq!(eval("0.9 !").unwrap(), vec![1.0]);
}

#[test]
fn test_comparison() {
    assert_eq!(eval("1 2 <").unwrap(), vec![1.0]);
    assert_eq!(eval("1 2 >").unwrap(), vec![0.0]);
    assert_eq!(eval("2.5 2.4 >").unwrap(), vec![1.0]);
}

#[test]
fn test_dup_on_reused_stack() {
    let mut stack = Stack::new();
    stack.push(5.0);
    run_onto("dup", &mut stack).unwrap();
    assert_eq!(stack.values(), &[5.0, 5.0]);
}

#[test]
fn test_swap() {
    assert_eq!(eval("1 2 swap").unwrap(), vec![2.0, 1.0]);
}

#[test]
fn test_limit() {
    assert_eq!(eval("3 1 5 limit").unwrap(), vec![3.0]);
    assert_eq!(eval("7 1 5 limit").unwrap(), vec![5.0]);
    assert_eq!(eval("-2 1 5 limit").unwrap(), vec![1.0]);
}

#[test]
fn test_limit_underflow_does_not_clamp() {
    let err = eval("2 5 limit").unwrap_err();
    assert_eq!(
        err,
        RpnError::StackUnderflow {
            op: "limit",
            position: 2
        }
    );
}

#[test]
fn test_inrange_regular() {
    assert_eq!(eval("3 1 5 inrange").unwrap(), vec![1.0]);
    assert_eq!(eval("7 1 5 inrange").unwrap(), vec![0.0]);
    assert_eq!(eval("5 1 5 inrange").unwrap(), vec![1.0]);
    // equal bounds form a one-value interval
    assert_eq!(eval("4 4 4 inrange").unwrap(), vec![1.0]);
    assert_eq!(eval("5 4 4 inrange").unwrap(), vec![0.0]);
}

#[test]
fn test_inrange_wrapped() {
    // night-hours style range 22..3
    assert_eq!(eval("23 22 3 inrange").unwrap(), vec![1.0]);
    assert_eq!(eval("2 22 3 inrange").unwrap(), vec![1.0]);
    assert_eq!(eval("12 22 3 inrange").unwrap(), vec![0.0]);
}

#[test]
fn test_underflow_on_empty_stack() {
    let mut stack = Stack::new();
    let err = run_onto("+", &mut stack).unwrap_err();
    assert_eq!(
        err,
        RpnError::StackUnderflow {
            op: "+",
            position: 0
        }
    );
    // the stack is left unchanged
    assert!(stack.is_empty());
}

#[test]
fn test_underflow_mid_chain_keeps_earlier_results() {
    let mut stack = Stack::new();
    let err = run_onto("1 2 + *", &mut stack).unwrap_err();
    assert_eq!(
        err,
        RpnError::StackUnderflow {
            op: "*",
            position: 3
        }
    );
    // left exactly as the last successful node left it
    assert_eq!(stack.values(), &[3.0]);
}

#[test]
fn test_clock_suffix_literal_in_formula() {
    assert_eq!(eval("2:30 2 *").unwrap(), vec![5.0]);
}

#[test]
fn test_evaluate_returns_top_of_stack() {
    let mut program = compile("1 2 + 10").unwrap();
    let mut stack = Stack::new();
    stack.push(99.0); // stale contents from an earlier pass
    let mut timers = TimerQueue::new();
    let mut env = NullEnv;
    let mut ctx = RunContext {
        timers: &mut timers,
        env: &mut env,
        clock: &SystemClock,
    };

    assert_eq!(evaluate(&mut program, &mut stack, &mut ctx).unwrap(), Some(10.0));
    assert_eq!(stack.values(), &[3.0, 10.0]);

    let mut empty = compile("").unwrap();
    assert_eq!(evaluate(&mut empty, &mut stack, &mut ctx).unwrap(), None);
}

/// Resolver that records every lookup it serves
#[derive(Default)]
struct RecordingEnv {
    calls: Vec<(String, Option<String>)>,
    value: f64,
}

impl EnvResolver for RecordingEnv {
    fn resolve(&mut self, name: &str, options: Option<&str>) -> f64 {
        self.calls
            .push((name.to_string(), options.map(str::to_string)));
        self.value
    }
}

#[test]
fn test_env_reference_passes_name_and_options() {
    let mut program = compile("${sensorA,opt1} ${sensorA} +").unwrap();
    let mut stack = Stack::new();
    let mut timers = TimerQueue::new();
    let mut env = RecordingEnv {
        value: 1.5,
        ..Default::default()
    };
    let mut ctx = RunContext {
        timers: &mut timers,
        env: &mut env,
        clock: &SystemClock,
    };
    run(&mut program, &mut stack, &mut ctx).unwrap();

    assert_eq!(stack.values(), &[3.0]);
    assert_eq!(
        env.calls,
        vec![
            ("sensorA".to_string(), Some("opt1".to_string())),
            ("sensorA".to_string(), None),
        ]
    );
}

#[test]
fn test_unknown_token_yields_no_program() {
    let err = compile("1 2 snork +").unwrap_err();
    assert_eq!(
        err,
        RpnError::UnknownToken {
            token: "snork".into()
        }
    );
}
