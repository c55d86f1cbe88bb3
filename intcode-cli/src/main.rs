use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;

use host::amplifier::{self, Wiring};
use host::{ascii, search, Console};
use vm::{Channel, Program, Status, Value};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::info;

/// Intcode runner
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Comma-separated program listing to load and execute
    program: PathBuf,

    /// Input values, supplied before anything read from stdin
    #[clap(
        short,
        long,
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    input: Vec<Value>,

    /// Lines of ASCII input, each sent with a trailing newline after any
    /// `--input` values
    #[clap(long, value_name = "LINE")]
    text: Vec<String>,

    /// Read more input from stdin whenever the program is waiting for it
    #[clap(long)]
    interactive: bool,

    /// Write this value to address 1 before running
    #[clap(long, allow_hyphen_values = true)]
    noun: Option<Value>,

    /// Write this value to address 2 before running
    #[clap(long, allow_hyphen_values = true)]
    verb: Option<Value>,

    /// Search nouns and verbs in 0..=99 for one which leaves this value at
    /// address 0, printing `100 * noun + verb`
    #[clap(long, allow_hyphen_values = true, conflicts_with = "amplifiers")]
    find: Option<Value>,

    /// Treat the program as an amplifier and search orderings of these
    /// phase settings for the highest output signal
    #[clap(long, value_delimiter = ',')]
    amplifiers: Option<Vec<Value>>,

    /// Wire amplifiers in a feedback loop rather than in series
    #[clap(long, requires = "amplifiers")]
    feedback: bool,

    /// Maximum number of instructions to execute between inputs
    #[clap(long)]
    max_steps: Option<usize>,

    /// Print output as ASCII text, and read stdin as lines of text
    #[clap(long)]
    ascii: bool,

    /// Print the final memory contents after the program halts, with cells
    /// far beyond the program as `address: value` lines
    #[clap(long)]
    dump: bool,
}

/// Pre-supplied input, followed by stdin when running interactively
///
/// Output is written to stdout as soon as it's emitted, or in ASCII mode,
/// collected and rendered whenever the program stops.
struct Stdio {
    preset: VecDeque<Value>,
    console: Option<Console>,
    ascii: Option<Vec<Value>>,
}

impl Stdio {
    /// Renders any collected ASCII output to stdout
    fn flush(&mut self) -> Result<()> {
        let Some(out) = self.ascii.as_mut().filter(|out| !out.is_empty())
        else {
            return Ok(());
        };
        let text = ascii::render(&std::mem::take(out));
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

impl Channel for Stdio {
    fn read(&mut self) -> Result<Option<Value>, vm::Error> {
        if let Some(v) = self.preset.pop_front() {
            return Ok(Some(v));
        }
        match self.console.as_mut() {
            Some(c) => c.read(),
            None => Ok(None),
        }
    }

    fn write(&mut self, v: Value) -> Result<(), vm::Error> {
        if let Some(out) = self.ascii.as_mut() {
            out.push(v);
            return Ok(());
        }
        writeln!(std::io::stdout(), "{v}")
            .map_err(|e| vm::Error::Channel(format!("stdout: {e}")))
    }
}

fn main() -> Result<()> {
    let env = env_logger::Env::default()
        .filter_or("INTCODE_LOG", "info")
        .write_style_or("INTCODE_LOG", "always");
    env_logger::init_from_env(env);

    let args = Args::parse();
    let text = std::fs::read_to_string(&args.program)
        .with_context(|| format!("failed to read {:?}", args.program))?;
    let mut program = Program::parse(&text)
        .with_context(|| format!("failed to parse {:?}", args.program))?;

    if let Some(noun) = args.noun {
        program.memory_mut().write(search::NOUN, noun)?;
    }
    if let Some(verb) = args.verb {
        program.memory_mut().write(search::VERB, verb)?;
    }

    if let Some(phases) = &args.amplifiers {
        let wiring = if args.feedback {
            Wiring::Feedback
        } else {
            Wiring::Serial
        };
        let input = args.input.first().copied().unwrap_or(0);
        let (signal, order) =
            amplifier::max_signal(&program, phases, wiring, input)?;
        info!("best phase order is {order:?}");
        println!("{signal}");
        return Ok(());
    }

    if let Some(target) = args.find {
        let (noun, verb) = search::find_noun_verb(&program, target, 0..=99)
            .ok_or_else(|| anyhow!("no noun and verb produce {target}"))?;
        println!("{}", 100 * noun + verb);
        return Ok(());
    }

    let mut preset: VecDeque<Value> = args.input.iter().copied().collect();
    for line in &args.text {
        preset.extend(ascii::encode(line));
        preset.push_back(Value::from(b'\n'));
    }
    let mut io = Stdio {
        preset,
        console: args.interactive.then(|| {
            Console::new(if args.ascii {
                host::console::text_worker()
            } else {
                host::console_worker()
            })
        }),
        ascii: args.ascii.then(Vec::new),
    };

    let start = std::time::Instant::now();
    loop {
        let result = match args.max_steps {
            Some(n) => program.run_until(&mut io, |_vm, i| i >= n),
            None => program.run(&mut io).map(Some),
        };
        io.flush()?;
        let Some(status) = result? else {
            bail!(
                "no input or halt within {} steps",
                args.max_steps.unwrap_or_default()
            );
        };
        match status {
            Status::Halted => break,
            Status::AwaitingInput => match io.console.as_mut() {
                Some(c) => {
                    if !c.wait() {
                        bail!("waiting for input, but stdin is closed");
                    }
                }
                None => bail!(
                    "waiting for input at {}; supply more with --input or \
                     run with --interactive",
                    program.ip()
                ),
            },
            Status::Running => (),
        }
    }
    info!("halted in {:?}", start.elapsed());

    if args.dump {
        let mem = program.memory();
        println!("{}", mem.as_slice().iter().join(","));
        for (addr, v) in mem.spilled() {
            println!("{addr}: {v}");
        }
    }

    Ok(())
}
