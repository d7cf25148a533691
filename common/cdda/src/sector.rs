//! Contiguous, inclusive ranges of physical sectors on a CDDA disc


use bincode::de::{BorrowDecoder, Decoder};
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{BorrowDecode, Decode, Encode};
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed construction input or an invalid stored pair
    InvalidArgument,
    /// Index or sector lookup outside of a range's bounds
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SectorRangeError {
    #[error("sector count must be at least 1")]
    ZeroCount,
    #[error("first sector {first} is after last sector {last}")]
    FirstAfterLast { first: u32, last: u32 },
    #[error("{count} sectors ending or starting at sector {sector} do not fit in the address space")]
    CountOverflow { sector: u32, count: u32 },
    #[error("range {first}-{last} is too long for its length to be represented")]
    RangeTooLong { first: u32, last: u32 },
    #[error("sector {sector} is outside of range {range}")]
    SectorOutOfRange { sector: u32, range: SectorRange },
    #[error("index {index} is out of bounds for a range of length {len}")]
    IndexOutOfRange { index: u32, len: u32 },
}

impl SectorRangeError {
    #[must_use]
    pub fn kind(self) -> ErrorKind {
        match self {
            Self::ZeroCount
            | Self::FirstAfterLast { .. }
            | Self::CountOverflow { .. }
            | Self::RangeTooLong { .. } => ErrorKind::InvalidArgument,
            Self::SectorOutOfRange { .. } | Self::IndexOutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }
}

/// A non-empty range of sectors `[first_sector, last_sector]`, both ends inclusive.
///
/// There is no empty range; every value names at least one physical sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "(u32, u32)", into = "(u32, u32)"))]
pub struct SectorRange {
    first_sector: u32,
    last_sector: u32,
}

#[allow(clippy::len_without_is_empty)]
impl SectorRange {
    /// Create a range covering exactly one sector.
    #[must_use]
    pub const fn from_sector(sector: u32) -> Self {
        Self { first_sector: sector, last_sector: sector }
    }

    /// Create a range from both of its inclusive bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if `first > last`, or if the range spans the entire address space (its
    /// length would not fit in a `u32`).
    pub fn from_first_and_last(first: u32, last: u32) -> Result<Self, SectorRangeError> {
        if first > last {
            return Err(SectorRangeError::FirstAfterLast { first, last });
        }

        if first == 0 && last == u32::MAX {
            return Err(SectorRangeError::RangeTooLong { first, last });
        }

        Ok(Self { first_sector: first, last_sector: last })
    }

    /// Create a range of `count` sectors starting at `first`.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is 0 or if the last sector would overflow the address space.
    pub fn from_first_and_count(first: u32, count: u32) -> Result<Self, SectorRangeError> {
        if count == 0 {
            return Err(SectorRangeError::ZeroCount);
        }

        let last = first
            .checked_add(count - 1)
            .ok_or(SectorRangeError::CountOverflow { sector: first, count })?;
        Self::from_first_and_last(first, last)
    }

    /// Create a range of `count` sectors ending at `last`.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is 0 or if `count - 1 > last`.
    pub fn from_last_and_count(last: u32, count: u32) -> Result<Self, SectorRangeError> {
        if count == 0 {
            return Err(SectorRangeError::ZeroCount);
        }

        let first = last
            .checked_sub(count - 1)
            .ok_or(SectorRangeError::CountOverflow { sector: last, count })?;
        Self::from_first_and_last(first, last)
    }

    /// Translate a half-open `(offset, length)` pair into an inclusive range. This is the inverse
    /// of [`to_offset_and_length`](Self::to_offset_and_length).
    ///
    /// # Errors
    ///
    /// Returns an error if `length` is 0 or if the range would overflow the address space.
    pub fn from_offset_and_length(offset: u32, length: u32) -> Result<Self, SectorRangeError> {
        Self::from_first_and_count(offset, length)
    }

    #[must_use]
    pub const fn first_sector(&self) -> u32 {
        self.first_sector
    }

    #[must_use]
    pub const fn last_sector(&self) -> u32 {
        self.last_sector
    }

    /// Number of sectors in the range; always at least 1.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.last_sector - self.first_sector + 1
    }

    /// Size in bytes of the raw sectors covered by this range.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        u64::from(self.len()) * crate::BYTES_PER_SECTOR
    }

    /// Position of `sector` relative to the start of the range.
    ///
    /// # Errors
    ///
    /// Returns an error if `sector` is not contained in the range.
    pub fn index_for_sector(&self, sector: u32) -> Result<u32, SectorRangeError> {
        if !self.contains_sector(sector) {
            return Err(SectorRangeError::SectorOutOfRange { sector, range: *self });
        }

        Ok(sector - self.first_sector)
    }

    /// Absolute sector at position `index` within the range.
    ///
    /// # Errors
    ///
    /// Returns an error if `index >= self.len()`.
    pub fn sector_for_index(&self, index: u32) -> Result<u32, SectorRangeError> {
        if index >= self.len() {
            return Err(SectorRangeError::IndexOutOfRange { index, len: self.len() });
        }

        Ok(self.first_sector + index)
    }

    #[must_use]
    pub const fn contains_sector(&self, sector: u32) -> bool {
        self.first_sector <= sector && sector <= self.last_sector
    }

    #[must_use]
    pub const fn contains_sector_range(&self, other: &SectorRange) -> bool {
        other.first_sector >= self.first_sector && other.last_sector <= self.last_sector
    }

    #[must_use]
    pub fn intersects_sector_range(&self, other: &SectorRange) -> bool {
        self.first_sector.max(other.first_sector) <= self.last_sector.min(other.last_sector)
    }

    /// The largest range contained in both `self` and `other`, or `None` if they are disjoint.
    #[must_use]
    pub fn intersected_sector_range(&self, other: &SectorRange) -> Option<SectorRange> {
        let first_sector = self.first_sector.max(other.first_sector);
        let last_sector = self.last_sector.min(other.last_sector);

        (first_sector <= last_sector).then_some(Self { first_sector, last_sector })
    }

    /// Half-open `(offset, length)` form of this range, for APIs that take an offset plus a count.
    #[must_use]
    pub const fn to_offset_and_length(&self) -> (u32, u32) {
        (self.first_sector, self.len())
    }

    /// Iterate over every sector number in the range, in ascending order.
    #[must_use]
    pub fn sectors(&self) -> RangeInclusive<u32> {
        self.first_sector..=self.last_sector
    }
}

impl Display for SectorRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first_sector, self.last_sector)
    }
}

impl From<SectorRange> for RangeInclusive<u32> {
    fn from(value: SectorRange) -> Self {
        value.sectors()
    }
}

impl From<SectorRange> for (u32, u32) {
    fn from(value: SectorRange) -> Self {
        (value.first_sector, value.last_sector)
    }
}

impl TryFrom<(u32, u32)> for SectorRange {
    type Error = SectorRangeError;

    fn try_from((first, last): (u32, u32)) -> Result<Self, Self::Error> {
        Self::from_first_and_last(first, last)
    }
}

// Stored as the ordered pair (first, last); decoding rejects pairs that do not form a valid range

impl Encode for SectorRange {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.first_sector.encode(encoder)?;
        self.last_sector.encode(encoder)?;
        Ok(())
    }
}

impl<Context> Decode<Context> for SectorRange {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let first = u32::decode(decoder)?;
        let last = u32::decode(decoder)?;
        Self::from_first_and_last(first, last)
            .map_err(|err| DecodeError::OtherString(err.to_string()))
    }
}

impl<'de, Context> BorrowDecode<'de, Context> for SectorRange {
    fn borrow_decode<D: BorrowDecoder<'de, Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, DecodeError> {
        let first = u32::borrow_decode(decoder)?;
        let last = u32::borrow_decode(decoder)?;
        Self::from_first_and_last(first, last)
            .map_err(|err| DecodeError::OtherString(err.to_string()))
    }
}
