//! Interactive input from a background reader thread
use log::{error, warn};
use std::{
    collections::VecDeque,
    io::BufRead,
    sync::mpsc::{self, TryRecvError},
};
use vm::{Channel, Error, Value};

use crate::ascii;

/// Spawns a worker thread that listens on `stdin` and emits integers
pub fn worker() -> mpsc::Receiver<Value> {
    spawn_reader(|| std::io::stdin().lock())
}

/// Spawns a worker thread that listens on `stdin` and emits ASCII text
pub fn text_worker() -> mpsc::Receiver<Value> {
    spawn_text_reader(|| std::io::stdin().lock())
}

/// Spawns a worker thread that parses integers from a reader
///
/// The reader is opened on the worker thread.  Values may be separated by
/// whitespace, commas, or newlines; unparseable tokens are logged and
/// skipped.  The channel is closed when the reader hits end-of-file.
pub fn spawn_reader<R, F>(open: F) -> mpsc::Receiver<Value>
where
    R: BufRead,
    F: FnOnce() -> R + Send + 'static,
{
    spawn_lines(open, numbers)
}

/// Spawns a worker thread that sends each line of a reader as ASCII input
///
/// Every line is sent with a single trailing newline, whatever line ending
/// the reader used.
pub fn spawn_text_reader<R, F>(open: F) -> mpsc::Receiver<Value>
where
    R: BufRead,
    F: FnOnce() -> R + Send + 'static,
{
    spawn_lines(open, |line| {
        ascii::encode(&format!("{}\n", line.trim_end_matches(['\r', '\n'])))
    })
}

fn numbers(line: &str) -> Vec<Value> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter_map(|token| match token.parse::<Value>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("ignoring invalid input {token:?}");
                None
            }
        })
        .collect()
}

fn spawn_lines<R, F>(
    open: F,
    parse: fn(&str) -> Vec<Value>,
) -> mpsc::Receiver<Value>
where
    R: BufRead,
    F: FnOnce() -> R + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut reader = open();
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => return,
                Ok(_) => (),
                Err(e) => {
                    error!("failed to read input: {e}");
                    return;
                }
            }
            for v in parse(&line) {
                if tx.send(v).is_err() {
                    return;
                }
            }
        }
    });
    rx
}

/// Channel backed by a worker thread's receiver
///
/// Reads never block: if the worker hasn't produced anything yet, the program
/// suspends and the caller can [`wait`](Console::wait) before resuming.
pub struct Console {
    rx: mpsc::Receiver<Value>,
    pending: VecDeque<Value>,
    closed: bool,
    stdout: Vec<Value>,
}

impl Console {
    /// Wraps a receiver, typically from [`worker`]
    pub fn new(rx: mpsc::Receiver<Value>) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
            closed: false,
            stdout: vec![],
        }
    }

    /// Blocks until at least one input value is available
    ///
    /// Returns `false` if the worker has hung up and nothing is pending.
    pub fn wait(&mut self) -> bool {
        if !self.pending.is_empty() {
            return true;
        }
        match self.rx.recv() {
            Ok(v) => {
                self.pending.push_back(v);
                true
            }
            Err(_) => {
                self.closed = true;
                false
            }
        }
    }

    /// Checks whether the worker has hung up
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Takes the output buffer, leaving it empty
    pub fn stdout(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.stdout)
    }
}

impl Channel for Console {
    fn read(&mut self) -> Result<Option<Value>, Error> {
        if let Some(v) = self.pending.pop_front() {
            return Ok(Some(v));
        }
        match self.rx.try_recv() {
            Ok(v) => Ok(Some(v)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                Ok(None)
            }
        }
    }
    fn write(&mut self, v: Value) -> Result<(), Error> {
        self.stdout.push(v);
        Ok(())
    }
}
