//! Amplifier chains, where each stage's output feeds the next stage's input
use anyhow::{anyhow, ensure, Context, Result};
use itertools::Itertools;
use log::{debug, trace};
use vm::{Buffer, Program, Value};

/// How the stages of an amplifier chain are connected
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wiring {
    /// Each stage runs once, from first to last
    Serial,
    /// The last stage's output loops back into the first stage
    Feedback,
}

/// Runs a serial chain, returning the last stage's final output
///
/// Every stage is a fresh fork of `program`, fed its phase setting followed by
/// the previous stage's signal (or `input`, for the first stage).
pub fn run_chain(
    program: &Program,
    phases: &[Value],
    input: Value,
) -> Result<Value> {
    ensure!(!phases.is_empty(), "no phase settings given");
    let mut signal = input;
    for (i, &phase) in phases.iter().enumerate() {
        let mut amp = program.clone();
        let mut io = Buffer::from(vec![phase, signal]);
        let status = amp
            .run(&mut io)
            .with_context(|| format!("amplifier {i} failed"))?;
        signal = *io
            .output()
            .last()
            .ok_or_else(|| anyhow!("amplifier {i} produced no output"))?;
        trace!("amplifier {i} ({status:?}) emitted {signal}");
    }
    Ok(signal)
}

/// Runs a feedback loop until the last stage halts
///
/// Each stage is primed with its phase setting, then the stages are run in
/// turn, each until it halts or needs more input, with every stage's output
/// queued as input to the next.  The result is the last value emitted by the
/// last stage.
pub fn run_feedback(
    program: &Program,
    phases: &[Value],
    input: Value,
) -> Result<Value> {
    ensure!(!phases.is_empty(), "no phase settings given");
    let n = phases.len();
    let mut amps: Vec<(Program, Buffer)> = phases
        .iter()
        .map(|&p| (program.clone(), Buffer::from(vec![p])))
        .collect();
    amps[0].1.push_input(input);

    let mut signal = None;
    for round in 0.. {
        let mut emitted = 0;
        for i in 0..n {
            let (amp, io) = &mut amps[i];
            amp.run(io)
                .with_context(|| format!("amplifier {i} failed"))?;
            let out = io.take_output();
            emitted += out.len();
            if i == n - 1 {
                if let Some(&v) = out.last() {
                    signal = Some(v);
                }
            }
            amps[(i + 1) % n].1.extend_input(out);
        }
        if amps[n - 1].0.is_halted() {
            debug!("feedback loop finished after {} rounds", round + 1);
            break;
        }
        // Without new output, the next round would be identical to this one
        ensure!(
            emitted > 0,
            "feedback loop deadlocked in round {round}: no amplifier \
             produced output"
        );
    }
    signal.ok_or_else(|| anyhow!("last amplifier produced no output"))
}

/// Runs a chain with the given wiring
pub fn run(
    program: &Program,
    phases: &[Value],
    wiring: Wiring,
    input: Value,
) -> Result<Value> {
    match wiring {
        Wiring::Serial => run_chain(program, phases, input),
        Wiring::Feedback => run_feedback(program, phases, input),
    }
}

/// Tries every ordering of the given phase settings
///
/// Returns the largest final signal and the phase order which produced it.
pub fn max_signal(
    program: &Program,
    phases: &[Value],
    wiring: Wiring,
    input: Value,
) -> Result<(Value, Vec<Value>)> {
    ensure!(!phases.is_empty(), "no phase settings given");
    let mut best: Option<(Value, Vec<Value>)> = None;
    for order in phases.iter().copied().permutations(phases.len()) {
        let signal = run(program, &order, wiring, input)
            .with_context(|| format!("phase order {order:?} failed"))?;
        trace!("{order:?} => {signal}");
        if best.as_ref().map_or(true, |(b, _)| signal > *b) {
            best = Some((signal, order));
        }
    }
    // `phases` is non-empty, so there's at least one permutation
    best.ok_or_else(|| anyhow!("no phase orders to try"))
}

#[cfg(test)]
mod test {
    use super::*;

    const SERIAL: &str = "3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0";
    const FEEDBACK: &str = "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
        27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5";

    #[test]
    fn chain() {
        let p = Program::parse(SERIAL).unwrap();
        assert_eq!(run_chain(&p, &[4, 3, 2, 1, 0], 0).unwrap(), 43210);
    }

    #[test]
    fn feedback() {
        let p = Program::parse(FEEDBACK).unwrap();
        assert_eq!(
            run_feedback(&p, &[9, 8, 7, 6, 5], 0).unwrap(),
            139629729
        );
    }

    #[test]
    fn empty_phases() {
        let p = Program::parse(SERIAL).unwrap();
        assert!(run_chain(&p, &[], 0).is_err());
        assert!(run_feedback(&p, &[], 0).is_err());
        assert!(max_signal(&p, &[], Wiring::Serial, 0).is_err());
    }

    #[test]
    fn deadlock() {
        // Reads forever without writing anything
        let p = Program::parse("3,5,1105,1,0,0").unwrap();
        let err = run_feedback(&p, &[1, 2], 0).unwrap_err();
        assert!(err.to_string().contains("deadlocked"), "{err}");
    }

    #[test]
    fn failure_is_reported() {
        let p = Program::parse("3,0,3,0,42").unwrap();
        let err = run_chain(&p, &[0], 0).unwrap_err();
        assert_eq!(err.to_string(), "amplifier 0 failed");
        assert_eq!(
            err.root_cause().to_string(),
            "invalid opcode in instruction word 42"
        );
    }
}
