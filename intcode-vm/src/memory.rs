use crate::{Error, Value};
use std::collections::BTreeMap;

/// Auto-extending program memory
///
/// Every address that has never been written reads as zero.  Cells near the
/// end of the dense store extend it with zeros; cells far beyond it are kept
/// in a sparse map, so that any non-negative address can be written without
/// allocating everything below it.  Reads never allocate.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<Value>,
    /// Nonzero cells at or beyond `data.len()`
    far: BTreeMap<usize, Value>,
}

/// Maximum distance past the dense store which grows it, rather than
/// spilling into the sparse map
const SPILL: usize = 1 << 16;

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        self.cells().eq(other.cells())
    }
}
impl Eq for Memory {}

/// Failure to parse a comma-separated program listing
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid token {token:?} at position {index}")]
pub struct ParseError {
    /// Index of the offending token (0-based)
    pub index: usize,
    /// The token text, with surrounding whitespace removed
    pub token: String,
}

/// Converts a signed address into an index, rejecting negative values
#[inline]
pub(crate) fn index(addr: Value) -> Result<usize, Error> {
    usize::try_from(addr).map_err(|_| Error::InvalidAddress(addr))
}

impl Memory {
    /// Builds an empty memory, in which every cell reads as zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the value at the given address
    ///
    /// Returns [`Error::InvalidAddress`] if `addr` is negative
    #[inline]
    pub fn read(&self, addr: Value) -> Result<Value, Error> {
        let i = index(addr)?;
        let v = match self.data.get(i) {
            Some(&v) => v,
            None => self.far.get(&i).copied().unwrap_or(0),
        };
        Ok(v)
    }

    /// Writes a value at the given address, growing memory if needed
    ///
    /// Returns [`Error::InvalidAddress`] if `addr` is negative
    #[inline]
    pub fn write(&mut self, addr: Value, v: Value) -> Result<(), Error> {
        let i = index(addr)?;
        if let Some(c) = self.data.get_mut(i) {
            *c = v;
        } else if i - self.data.len() >= SPILL {
            if v == 0 {
                self.far.remove(&i);
            } else {
                self.far.insert(i, v);
            }
        } else if v != 0 || self.far.contains_key(&i) {
            self.data.resize(i + 1, 0);
            let rest = self.far.split_off(&(i + 1));
            for (j, w) in std::mem::replace(&mut self.far, rest) {
                self.data[j] = w;
            }
            self.data[i] = v;
        }
        Ok(())
    }

    /// Returns the extent of the dense store
    ///
    /// Cells at or beyond this index are zero unless listed by
    /// [`spilled`](Memory::spilled).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks whether no cell has ever been populated
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.far.is_empty()
    }

    /// Borrows the dense prefix of memory
    pub fn as_slice(&self) -> &[Value] {
        &self.data
    }

    /// Iterates over nonzero cells beyond the dense prefix, by address
    pub fn spilled(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
        self.far.iter().map(|(&i, &v)| (i, v))
    }

    /// Iterates over every nonzero cell, by address
    fn cells(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
        self.data
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, v)| v != 0)
            .chain(self.spilled())
    }
}

impl From<Vec<Value>> for Memory {
    fn from(data: Vec<Value>) -> Self {
        Self {
            data,
            far: BTreeMap::new(),
        }
    }
}

impl From<&[Value]> for Memory {
    fn from(data: &[Value]) -> Self {
        data.to_vec().into()
    }
}

impl std::str::FromStr for Memory {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_listing(s).map(Memory::from)
    }
}

/// Parses a comma-separated listing of signed decimal integers
///
/// Whitespace around each token (including a trailing newline) is ignored.
/// An entirely blank listing parses to an empty program.
pub fn parse_listing(s: &str) -> Result<Vec<Value>, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(vec![]);
    }
    s.split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token.parse::<Value>().map_err(|_| ParseError {
                index,
                token: token.to_owned(),
            })
        })
        .collect()
}
