//! Input and output adapters
use crate::{Error, Value};
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Trait for an Intcode-compatible input source and output sink
///
/// A channel is only borrowed for the duration of a single run, so it can be
/// swapped between runs of the same [`Program`](crate::Program).
pub trait Channel {
    /// Returns the next input value
    ///
    /// `Ok(None)` means that no input is currently available; the program
    /// suspends without consuming the `IN` instruction and may be resumed
    /// once more input exists.
    fn read(&mut self) -> Result<Option<Value>, Error>;

    /// Accepts a single output value, in emission order
    fn write(&mut self, v: Value) -> Result<(), Error>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn read(&mut self) -> Result<Option<Value>, Error> {
        (**self).read()
    }
    fn write(&mut self, v: Value) -> Result<(), Error> {
        (**self).write(v)
    }
}

/// Channel which never has input and discards all output
pub struct EmptyChannel;
impl Channel for EmptyChannel {
    fn read(&mut self) -> Result<Option<Value>, Error> {
        Ok(None)
    }
    fn write(&mut self, _v: Value) -> Result<(), Error> {
        // nothing to do here
        Ok(())
    }
}

/// In-memory channel, with an input queue and an output accumulator
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    input: VecDeque<Value>,
    output: Vec<Value>,
}

impl Buffer {
    /// Builds an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single value to the input queue
    pub fn push_input(&mut self, v: Value) {
        self.input.push_back(v);
    }

    /// Appends several values to the input queue
    pub fn extend_input<I: IntoIterator<Item = Value>>(&mut self, vs: I) {
        self.input.extend(vs);
    }

    /// Number of input values not yet consumed
    pub fn pending(&self) -> usize {
        self.input.len()
    }

    /// Output emitted so far
    pub fn output(&self) -> &[Value] {
        &self.output
    }

    /// Takes the output buffer, leaving it empty
    pub fn take_output(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.output)
    }
}

impl From<Vec<Value>> for Buffer {
    fn from(input: Vec<Value>) -> Self {
        Self {
            input: input.into(),
            output: vec![],
        }
    }
}

impl Channel for Buffer {
    fn read(&mut self) -> Result<Option<Value>, Error> {
        Ok(self.input.pop_front())
    }
    fn write(&mut self, v: Value) -> Result<(), Error> {
        self.output.push(v);
        Ok(())
    }
}

/// Line-oriented text channel
///
/// Input is read as decimal integers separated by whitespace, commas, or
/// newlines; end-of-file means "no input available".  Each output value is
/// written as a decimal integer on its own line.
pub struct TextChannel<R, W> {
    reader: R,
    writer: W,
    pending: VecDeque<Value>,
    line: String,
}

impl<R: BufRead, W: Write> TextChannel<R, W> {
    /// Wraps a reader and writer
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            pending: VecDeque::new(),
            line: String::new(),
        }
    }

    /// Flushes and returns the underlying writer
    pub fn into_writer(mut self) -> std::io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Reads lines until at least one value is pending or input runs out
    fn fill(&mut self) -> Result<(), Error> {
        while self.pending.is_empty() {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| Error::Channel(format!("read failed: {e}")))?;
            if n == 0 {
                break;
            }
            for token in self
                .line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
            {
                let v = token.parse::<Value>().map_err(|_| {
                    Error::Channel(format!("invalid input {token:?}"))
                })?;
                self.pending.push_back(v);
            }
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> Channel for TextChannel<R, W> {
    fn read(&mut self) -> Result<Option<Value>, Error> {
        self.fill()?;
        Ok(self.pending.pop_front())
    }
    fn write(&mut self, v: Value) -> Result<(), Error> {
        writeln!(self.writer, "{v}")
            .map_err(|e| Error::Channel(format!("write failed: {e}")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buffer() {
        let mut b = Buffer::from(vec![1, 2]);
        b.push_input(3);
        assert_eq!(b.pending(), 3);
        assert_eq!(b.read(), Ok(Some(1)));
        assert_eq!(b.read(), Ok(Some(2)));
        assert_eq!(b.read(), Ok(Some(3)));
        assert_eq!(b.read(), Ok(None));

        b.write(10).unwrap();
        b.write(20).unwrap();
        assert_eq!(b.output(), &[10, 20]);
        assert_eq!(b.take_output(), vec![10, 20]);
        assert!(b.output().is_empty());
    }

    #[test]
    fn text_input() {
        let input = "8\n\n1, 2 3\n-4\n";
        let mut t = TextChannel::new(input.as_bytes(), vec![]);
        let mut seen = vec![];
        while let Some(v) = t.read().unwrap() {
            seen.push(v);
        }
        assert_eq!(seen, [8, 1, 2, 3, -4]);
        assert_eq!(t.read(), Ok(None));
    }

    #[test]
    fn text_output() {
        let mut t = TextChannel::new(&b""[..], vec![]);
        t.write(1).unwrap();
        t.write(-1125899906842624).unwrap();
        let out = t.into_writer().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\n-1125899906842624\n");
    }

    #[test]
    fn text_bad_input() {
        let mut t = TextChannel::new("12\nbanana\n".as_bytes(), vec![]);
        assert_eq!(t.read(), Ok(Some(12)));
        assert!(matches!(t.read(), Err(Error::Channel(..))));
    }

    #[test]
    fn borrowed() {
        fn drain(mut c: impl Channel) -> Vec<Value> {
            let mut out = vec![];
            while let Some(v) = c.read().unwrap() {
                out.push(v);
            }
            out
        }
        let mut b = Buffer::from(vec![5, 6]);
        assert_eq!(drain(&mut b), [5, 6]);
        assert_eq!(b.pending(), 0);
    }
}
