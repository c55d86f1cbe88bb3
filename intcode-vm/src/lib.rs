//! Intcode virtual machine
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use log::{debug, trace};

mod channel;
mod instruction;
mod memory;

pub use channel::{Buffer, Channel, EmptyChannel, TextChannel};
pub use instruction::{Instruction, Mode, Opcode};
pub use memory::{parse_listing, Memory, ParseError};

/// Integer type stored in every memory cell
pub type Value = i64;

/// Fatal conditions raised while executing a program
///
/// Running out of input is not an error; see [`Status::AwaitingInput`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A negative address was read, written, or jumped to
    #[error("invalid address {0}")]
    InvalidAddress(Value),

    /// The low two digits of an instruction word are not a known opcode
    #[error("invalid opcode in instruction word {word}")]
    InvalidOpcode {
        /// The full instruction word
        word: Value,
    },

    /// A parameter mode digit is not 0, 1, or 2
    #[error("invalid parameter mode {digit} in instruction word {word}")]
    InvalidMode {
        /// The full instruction word
        word: Value,
        /// The offending digit
        digit: Value,
    },

    /// An instruction tried to write through an immediate-mode parameter
    #[error("write through immediate-mode parameter at {ip}")]
    IllegalWriteMode {
        /// Address of the offending instruction
        ip: Value,
    },

    /// Arithmetic overflowed the cell width
    #[error("integer overflow at {ip}")]
    Overflow {
        /// Address of the offending instruction
        ip: Value,
    },

    /// The attached I/O channel failed
    #[error("channel error: {0}")]
    Channel(String),
}

/// Reason that a call to [`Program::run`] or [`Program::step`] returned
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// An instruction was executed and the program can keep going
    ///
    /// This is only returned by [`Program::step`]
    Running,
    /// The program is blocked on an `IN` instruction with no input available
    ///
    /// The instruction pointer is left on the `IN` instruction, so execution
    /// resumes there once more input is supplied.
    AwaitingInput,
    /// The program executed `HALT`
    Halted,
}

/// Lifecycle state of a [`Program`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// Ready to execute the instruction at the instruction pointer
    Running,
    /// Suspended on an `IN` instruction
    AwaitingInput,
    /// Terminal: `HALT` was executed
    Halted,
    /// Terminal: execution raised a fatal error
    Failed(Error),
}

/// Control flow after executing a single operation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Flow {
    /// Continue execution at the given address
    Next(Value),
    /// Input is exhausted; leave the instruction pointer in place
    Suspend,
    /// Stop execution
    Halt,
}

/// An Intcode program instance
///
/// Each program owns its memory; cloning a program forks it into an
/// independent instance with its own copy of memory and registers.
#[derive(Clone, Debug)]
pub struct Program {
    memory: Memory,
    /// Instruction pointer, always non-negative
    ip: Value,
    /// Offset applied to relative-mode parameters
    base: Value,
    state: State,
}

impl Program {
    /// Builds a new program with the given initial memory
    pub fn new(memory: Memory) -> Self {
        Self {
            memory,
            ip: 0,
            base: 0,
            state: State::Running,
        }
    }

    /// Parses a comma-separated listing into a new program
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        s.parse()
    }

    /// Shared borrow of program memory
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable borrow of program memory
    ///
    /// This is typically used to patch cells before the first run.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Current instruction pointer
    pub fn ip(&self) -> Value {
        self.ip
    }

    /// Current relative base
    pub fn relative_base(&self) -> Value {
        self.base
    }

    /// Current lifecycle state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Checks whether the program has executed `HALT`
    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Runs until the program halts or needs more input
    ///
    /// Calling this on a halted program is a no-op which returns
    /// [`Status::Halted`]; calling it on a failed program returns the stored
    /// error without executing anything.
    pub fn run<C: Channel>(&mut self, io: &mut C) -> Result<Status, Error> {
        loop {
            match self.step(io)? {
                Status::Running => (),
                s => break Ok(s),
            }
        }
    }

    /// Runs until the program stops or the predicate returns `true`
    ///
    /// The predicate is called before each instruction with the number of
    /// instructions executed so far in this call.  Returns `Ok(None)` if
    /// execution was stopped by the predicate, in which case it may be
    /// resumed with another call.
    pub fn run_until<C: Channel, F: FnMut(&Program, usize) -> bool>(
        &mut self,
        io: &mut C,
        mut f: F,
    ) -> Result<Option<Status>, Error> {
        let mut i = 0;
        loop {
            if f(self, i) {
                break Ok(None);
            }
            match self.step(io)? {
                Status::Running => i += 1,
                s => break Ok(Some(s)),
            }
        }
    }

    /// Executes a single instruction
    pub fn step<C: Channel>(&mut self, io: &mut C) -> Result<Status, Error> {
        match &self.state {
            State::Halted => return Ok(Status::Halted),
            State::Failed(e) => return Err(e.clone()),
            State::Running | State::AwaitingInput => (),
        }
        match self.exec(io) {
            Ok(Flow::Next(ip)) => {
                self.ip = ip;
                self.state = State::Running;
                Ok(Status::Running)
            }
            Ok(Flow::Suspend) => {
                if self.state != State::AwaitingInput {
                    debug!("awaiting input at {}", self.ip);
                }
                self.state = State::AwaitingInput;
                Ok(Status::AwaitingInput)
            }
            Ok(Flow::Halt) => {
                debug!("halted at {}", self.ip);
                self.state = State::Halted;
                Ok(Status::Halted)
            }
            Err(e) => {
                debug!("failed at {}: {e}", self.ip);
                self.state = State::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Decodes and executes the instruction at the instruction pointer
    fn exec(&mut self, io: &mut dyn Channel) -> Result<Flow, Error> {
        let word = self.memory.read(self.ip)?;
        let ins = Instruction::decode(word)?;
        trace!("{:>6}: {ins} (base {})", self.ip, self.base);
        match ins.opcode {
            Opcode::Add => op::add(self, io, ins),
            Opcode::Mul => op::mul(self, io, ins),
            Opcode::Input => op::input(self, io, ins),
            Opcode::Output => op::output(self, io, ins),
            Opcode::JumpIfTrue => op::jnz(self, io, ins),
            Opcode::JumpIfFalse => op::jz(self, io, ins),
            Opcode::LessThan => op::lt(self, io, ins),
            Opcode::Equals => op::eq(self, io, ins),
            Opcode::AdjustRelativeBase => op::arb(self, io, ins),
            Opcode::Halt => op::halt(self, io, ins),
        }
    }

    /// Reads the raw word for parameter `i` of the current instruction
    #[inline]
    fn raw(&self, i: usize) -> Result<Value, Error> {
        let addr = self
            .ip
            .checked_add(i as Value + 1)
            .ok_or(Error::Overflow { ip: self.ip })?;
        self.memory.read(addr)
    }

    /// Resolves parameter `i` to a memory address, for writing
    ///
    /// Fails with [`Error::IllegalWriteMode`] for immediate-mode parameters
    fn address(&self, ins: Instruction, i: usize) -> Result<Value, Error> {
        let raw = self.raw(i)?;
        match ins.mode(i) {
            Mode::Position => Ok(raw),
            Mode::Relative => raw
                .checked_add(self.base)
                .ok_or(Error::Overflow { ip: self.ip }),
            Mode::Immediate => Err(Error::IllegalWriteMode { ip: self.ip }),
        }
    }

    /// Resolves parameter `i` to a value, for reading
    fn load(&self, ins: Instruction, i: usize) -> Result<Value, Error> {
        match ins.mode(i) {
            Mode::Immediate => self.raw(i),
            Mode::Position | Mode::Relative => {
                let addr = self.address(ins, i)?;
                self.memory.read(addr)
            }
        }
    }

    /// Writes to the address named by parameter `i`
    fn store(
        &mut self,
        ins: Instruction,
        i: usize,
        v: Value,
    ) -> Result<(), Error> {
        let addr = self.address(ins, i)?;
        self.memory.write(addr, v)
    }

    /// Address of the instruction following `ins`
    #[inline]
    fn next(&self, ins: Instruction) -> Result<Value, Error> {
        self.ip
            .checked_add(ins.size() as Value)
            .ok_or(Error::Overflow { ip: self.ip })
    }
}

impl std::str::FromStr for Program {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Program::new)
    }
}

impl From<Vec<Value>> for Program {
    fn from(code: Vec<Value>) -> Self {
        Self::new(code.into())
    }
}

mod op {
    use super::*;

    /// Applies a checked binary function to the first two parameters, storing
    /// the result through the third
    #[inline]
    fn binary(
        vm: &mut Program,
        ins: Instruction,
        f: fn(Value, Value) -> Option<Value>,
    ) -> Result<Flow, Error> {
        let a = vm.load(ins, 0)?;
        let b = vm.load(ins, 1)?;
        let v = f(a, b).ok_or(Error::Overflow { ip: vm.ip })?;
        vm.store(ins, 2, v)?;
        vm.next(ins).map(Flow::Next)
    }

    /// Jumps to the second parameter if the predicate holds for the first
    #[inline]
    fn jump(
        vm: &mut Program,
        ins: Instruction,
        f: fn(Value) -> bool,
    ) -> Result<Flow, Error> {
        let cond = vm.load(ins, 0)?;
        let target = vm.load(ins, 1)?;
        if f(cond) {
            if target < 0 {
                return Err(Error::InvalidAddress(target));
            }
            Ok(Flow::Next(target))
        } else {
            vm.next(ins).map(Flow::Next)
        }
    }

    /// Add
    ///
    /// ```text
    /// ADD a b c       mem[c] = a + b
    /// ```
    ///
    /// `c` must not be in immediate mode.
    ///
    /// ```text
    /// 1,0,0,0,99          ( mem[0] = 2 )
    /// 1101,100,-1,4,0     ( mem[4] = 99 )
    /// ```
    #[inline]
    pub fn add(
        vm: &mut Program,
        _: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        binary(vm, ins, Value::checked_add)
    }

    /// Multiply
    ///
    /// ```text
    /// MUL a b c       mem[c] = a * b
    /// ```
    ///
    /// `c` must not be in immediate mode.
    ///
    /// ```text
    /// 2,3,0,3,99          ( mem[3] = 6 )
    /// 1002,4,3,4,33       ( mem[4] = 99 )
    /// ```
    #[inline]
    pub fn mul(
        vm: &mut Program,
        _: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        binary(vm, ins, Value::checked_mul)
    }

    /// Input
    ///
    /// ```text
    /// IN a            mem[a] = next input
    /// ```
    ///
    /// Consumes exactly one value from the channel.  If the channel has no
    /// value available, the instruction pointer is left in place and
    /// execution suspends.
    #[inline]
    pub fn input(
        vm: &mut Program,
        io: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        // Resolve the destination first, so that a malformed instruction
        // fails without consuming input
        let addr = vm.address(ins, 0)?;
        memory::index(addr)?;
        let Some(v) = io.read()? else {
            return Ok(Flow::Suspend);
        };
        vm.memory.write(addr, v)?;
        vm.next(ins).map(Flow::Next)
    }

    /// Output
    ///
    /// ```text
    /// OUT a           emit a
    /// ```
    ///
    /// ```text
    /// 104,1125899906842624,99     ( 1125899906842624 )
    /// ```
    #[inline]
    pub fn output(
        vm: &mut Program,
        io: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        let v = vm.load(ins, 0)?;
        io.write(v)?;
        vm.next(ins).map(Flow::Next)
    }

    /// Jump If True
    ///
    /// ```text
    /// JNZ a b         if a != 0 { ip = b }
    /// ```
    #[inline]
    pub fn jnz(
        vm: &mut Program,
        _: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        jump(vm, ins, |a| a != 0)
    }

    /// Jump If False
    ///
    /// ```text
    /// JZ a b          if a == 0 { ip = b }
    /// ```
    #[inline]
    pub fn jz(
        vm: &mut Program,
        _: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        jump(vm, ins, |a| a == 0)
    }

    /// Less Than
    ///
    /// ```text
    /// LT a b c        mem[c] = (a < b) ? 1 : 0
    /// ```
    #[inline]
    pub fn lt(
        vm: &mut Program,
        _: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        binary(vm, ins, |a, b| Some(Value::from(a < b)))
    }

    /// Equals
    ///
    /// ```text
    /// EQ a b c        mem[c] = (a == b) ? 1 : 0
    /// ```
    #[inline]
    pub fn eq(
        vm: &mut Program,
        _: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        binary(vm, ins, |a, b| Some(Value::from(a == b)))
    }

    /// Adjust Relative Base
    ///
    /// ```text
    /// ARB a           base += a
    /// ```
    ///
    /// ```text
    /// 109,19,204,-34      ( base = 19, then emits mem[-15], which fails )
    /// ```
    #[inline]
    pub fn arb(
        vm: &mut Program,
        _: &mut dyn Channel,
        ins: Instruction,
    ) -> Result<Flow, Error> {
        let a = vm.load(ins, 0)?;
        vm.base = vm
            .base
            .checked_add(a)
            .ok_or(Error::Overflow { ip: vm.ip })?;
        vm.next(ins).map(Flow::Next)
    }

    /// Halt
    ///
    /// ```text
    /// HALT
    /// ```
    ///
    /// Ends execution; the instruction pointer is left on the `HALT`.
    #[inline]
    pub fn halt(
        _: &mut Program,
        _: &mut dyn Channel,
        _: Instruction,
    ) -> Result<Flow, Error> {
        Ok(Flow::Halt)
    }
}
