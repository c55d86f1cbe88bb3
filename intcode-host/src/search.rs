//! Brute-force search over a program's "noun" and "verb" inputs
use anyhow::{ensure, Context, Result};
use itertools::Itertools;
use log::{debug, info};
use std::ops::RangeInclusive;
use vm::{EmptyChannel, Program, Status, Value};

/// Address patched with the noun
pub const NOUN: Value = 1;

/// Address patched with the verb
pub const VERB: Value = 2;

/// Runs a fork of `program` with cells 1 and 2 patched, returning cell 0
///
/// The program must halt without needing any input.
pub fn run_patched(
    program: &Program,
    noun: Value,
    verb: Value,
) -> Result<Value> {
    let mut vm = program.clone();
    vm.memory_mut().write(NOUN, noun)?;
    vm.memory_mut().write(VERB, verb)?;
    let status = vm
        .run(&mut EmptyChannel)
        .with_context(|| format!("failed with noun {noun}, verb {verb}"))?;
    ensure!(
        status == Status::Halted,
        "program with noun {noun}, verb {verb} is waiting for input"
    );
    Ok(vm.memory().read(0)?)
}

/// Finds the first `(noun, verb)` pair for which cell 0 ends up at `target`
///
/// Pairs are tried with the noun varying slowest.  Forks which fail or wait
/// for input are skipped, since many pairs produce malformed programs.
pub fn find_noun_verb(
    program: &Program,
    target: Value,
    range: RangeInclusive<Value>,
) -> Option<(Value, Value)> {
    for (noun, verb) in range.clone().cartesian_product(range) {
        match run_patched(program, noun, verb) {
            Ok(v) if v == target => {
                info!("{target} reached with noun {noun}, verb {verb}");
                return Some((noun, verb));
            }
            Ok(_) => (),
            Err(e) => debug!("skipping: {e:#}"),
        }
    }
    None
}
