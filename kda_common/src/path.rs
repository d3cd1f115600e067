use std::fmt;
use std::str::FromStr;

use crate::error::PathError;

/// Offset added to an index to mark it as hardened.
pub const HARDENED: u32 = 0x8000_0000;

/// Maximum number of segments the binary wire form of a path can carry.
pub const MAX_WIRE_DEPTH: usize = 10;

/// One segment of a [`DerivationPath`]: a 31-bit index and a hardened flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildIndex {
    index: u32,
    hardened: bool,
}

impl ChildIndex {
    /// A non-hardened index, `index` must be lower than 2^31
    pub fn normal(index: u32) -> Result<Self, PathError> {
        Self::new(index, false)
    }

    /// A hardened index, `index` must be lower than 2^31
    pub fn hardened(index: u32) -> Result<Self, PathError> {
        Self::new(index, true)
    }

    fn new(index: u32, hardened: bool) -> Result<Self, PathError> {
        if index >= HARDENED {
            return Err(PathError::IndexOutOfRange(index.to_string()));
        }
        Ok(Self { index, hardened })
    }

    /// The index without the hardened offset
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// The index as used on the wire and in derivation, with the hardened offset applied
    pub fn to_u32(self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl From<u32> for ChildIndex {
    fn from(raw: u32) -> Self {
        Self {
            index: raw & !HARDENED,
            hardened: raw & HARDENED != 0,
        }
    }
}

impl From<ChildIndex> for u32 {
    fn from(child: ChildIndex) -> Self {
        child.to_u32()
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildIndex {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, hardened) = match s.strip_suffix(['\'', 'h']) {
            Some(digits) => (digits, true),
            None => (s, false),
        };
        // `u32::from_str` would also accept a leading '+'
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PathError::InvalidSegment(s.to_string()));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| PathError::IndexOutOfRange(s.to_string()))?;
        if index >= HARDENED {
            return Err(PathError::IndexOutOfRange(s.to_string()));
        }
        Ok(Self { index, hardened })
    }
}

/// A non-empty hierarchical derivation path such as `44'/626'/0`.
///
/// The textual form has no leading `m/`: every segment must be numeric.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildIndex>);

impl DerivationPath {
    /// Build a path from already validated segments
    pub fn new(children: Vec<ChildIndex>) -> Result<Self, PathError> {
        if children.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(children))
    }

    /// Build a path from raw indexes, where bit 31 marks hardened segments
    pub fn from_u32_slice(indexes: &[u32]) -> Result<Self, PathError> {
        Self::new(indexes.iter().copied().map(ChildIndex::from).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, a path has at least one segment
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChildIndex> {
        self.0.iter()
    }

    pub fn to_u32_vec(&self) -> Vec<u32> {
        self.0.iter().map(|c| c.to_u32()).collect()
    }

    /// Decode the binary wire form: a count byte followed by little-endian `u32` indexes.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, PathError> {
        Self::decode_wire(bytes)
            .inspect_err(|e| tracing::debug!("cannot decode wire path {bytes:02x?}: {e}"))
    }

    fn decode_wire(bytes: &[u8]) -> Result<Self, PathError> {
        let (&count, rest) = bytes.split_first().ok_or(PathError::Empty)?;
        let count = count as usize;
        if count == 0 {
            return Err(PathError::Empty);
        }
        if count > MAX_WIRE_DEPTH {
            return Err(PathError::TooDeep(count));
        }
        let expected = count * 4;
        if rest.len() < expected {
            return Err(PathError::Truncated {
                expected,
                got: rest.len(),
            });
        }
        if rest.len() > expected {
            return Err(PathError::TrailingBytes(rest.len() - expected));
        }
        let indexes: Vec<u32> = rest
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_u32_slice(&indexes)
    }

    /// Encode into the binary wire form, see [`DerivationPath::from_wire`]
    pub fn to_wire(&self) -> Result<Vec<u8>, PathError> {
        if self.len() > MAX_WIRE_DEPTH {
            return Err(PathError::TooDeep(self.len()));
        }
        Ok(self.0.iter().fold(vec![self.len() as u8], |mut acc, child| {
            acc.extend_from_slice(&child.to_u32().to_le_bytes());
            acc
        }))
    }
}

impl AsRef<[ChildIndex]> for DerivationPath {
    fn as_ref(&self) -> &[ChildIndex] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a ChildIndex;
    type IntoIter = std::slice::Iter<'a, ChildIndex>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            tracing::debug!("empty derivation path");
            return Err(PathError::Empty);
        }
        let children = s
            .split('/')
            .map(ChildIndex::from_str)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::debug!("cannot parse {s:?}: {e}"))?;
        Self::new(children)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{child}")?;
        }
        Ok(())
    }
}
