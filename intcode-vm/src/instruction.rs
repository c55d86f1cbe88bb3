use crate::{Error, Value};

/// Parameter addressing mode
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// The operand is an address to dereference
    #[default]
    Position,
    /// The operand is used literally; never valid as a destination
    Immediate,
    /// The operand is an offset from the relative base, then dereferenced
    Relative,
}

impl TryFrom<Value> for Mode {
    type Error = Value;
    fn try_from(digit: Value) -> Result<Self, Self::Error> {
        match digit {
            0 => Ok(Mode::Position),
            1 => Ok(Mode::Immediate),
            2 => Ok(Mode::Relative),
            d => Err(d),
        }
    }
}

/// Operation selector, stored in the low two decimal digits of a word
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// `mem[c] = a + b`
    Add = 1,
    /// `mem[c] = a * b`
    Mul = 2,
    /// `mem[a] = next input`, suspending if none is available
    Input = 3,
    /// Emits `a`
    Output = 4,
    /// Jumps to `b` if `a != 0`
    JumpIfTrue = 5,
    /// Jumps to `b` if `a == 0`
    JumpIfFalse = 6,
    /// `mem[c] = (a < b) as Value`
    LessThan = 7,
    /// `mem[c] = (a == b) as Value`
    Equals = 8,
    /// `relative_base += a`
    AdjustRelativeBase = 9,
    /// Stops execution
    Halt = 99,
}

impl Opcode {
    /// Number of parameters that follow the instruction word
    pub const fn arity(self) -> usize {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustRelativeBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Short assembly-style mnemonic
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Input => "IN",
            Opcode::Output => "OUT",
            Opcode::JumpIfTrue => "JNZ",
            Opcode::JumpIfFalse => "JZ",
            Opcode::LessThan => "LT",
            Opcode::Equals => "EQ",
            Opcode::AdjustRelativeBase => "ARB",
            Opcode::Halt => "HALT",
        }
    }
}

impl TryFrom<Value> for Opcode {
    type Error = Value;
    fn try_from(i: Value) -> Result<Self, Self::Error> {
        match i {
            1 => Ok(Opcode::Add),
            2 => Ok(Opcode::Mul),
            3 => Ok(Opcode::Input),
            4 => Ok(Opcode::Output),
            5 => Ok(Opcode::JumpIfTrue),
            6 => Ok(Opcode::JumpIfFalse),
            7 => Ok(Opcode::LessThan),
            8 => Ok(Opcode::Equals),
            9 => Ok(Opcode::AdjustRelativeBase),
            99 => Ok(Opcode::Halt),
            i => Err(i),
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded instruction word
///
/// Modes for slots beyond the opcode's arity are always [`Mode::Position`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Operation to perform
    pub opcode: Opcode,
    /// Addressing mode for each parameter slot, lowest slot first
    pub modes: [Mode; 3],
}

impl Instruction {
    /// Decodes a single instruction word
    ///
    /// The mode digits are consumed from the hundreds place upwards, one per
    /// parameter that the opcode takes; higher digits are ignored.
    ///
    /// ```
    /// # use intcode_vm::{Instruction, Mode, Opcode};
    /// let i = Instruction::decode(1002).unwrap();
    /// assert_eq!(i.opcode, Opcode::Mul);
    /// assert_eq!(i.modes, [Mode::Position, Mode::Immediate, Mode::Position]);
    /// ```
    pub fn decode(word: Value) -> Result<Self, Error> {
        // Negative words fall through to the error branch, since `%` keeps
        // the sign of the dividend.
        let opcode = Opcode::try_from(word % 100)
            .map_err(|_| Error::InvalidOpcode { word })?;

        let mut modes = [Mode::Position; 3];
        let mut digits = word / 100;
        for m in modes.iter_mut().take(opcode.arity()) {
            let digit = digits % 10;
            *m = Mode::try_from(digit)
                .map_err(|digit| Error::InvalidMode { word, digit })?;
            digits /= 10;
        }
        Ok(Self { opcode, modes })
    }

    /// Returns the mode of parameter `i`
    ///
    /// # Panics
    /// If `i >= 3`
    #[inline]
    pub fn mode(&self, i: usize) -> Mode {
        self.modes[i]
    }

    /// Total instruction length, in words
    #[inline]
    pub fn size(&self) -> usize {
        self.opcode.arity() + 1
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opcode)?;
        for m in &self.modes[..self.opcode.arity()] {
            let s = match m {
                Mode::Position => " _",
                Mode::Immediate => " #",
                Mode::Relative => " @",
            };
            f.write_str(s)?;
        }
        Ok(())
    }
}
