//! Per-track information for a CDDA disc

use crate::sector::{SectorRange, SectorRangeError};
use bincode::{Decode, Encode};

/// A single track on a disc.
///
/// The sector bounds are stored as independent scalars so that they can be populated one at a
/// time from a TOC read; they are only validated when the derived range is requested.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackDescriptor {
    pub number: u8,
    first_sector: Option<u32>,
    last_sector: Option<u32>,
    /// Length in sectors of the pregap stored in the image directly before `first_sector`
    pub pregap: Option<u32>,
    /// Length in sectors of pregap silence that precedes the track on disc but is not stored in
    /// the image (CUE `PREGAP`)
    pub silent_pregap: Option<u32>,
    pub is_data_track: bool,
    pub channels_per_frame: u8,
    pub has_pre_emphasis: bool,
    pub digital_copy_permitted: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub is_selected: bool,
}

impl TrackDescriptor {
    #[must_use]
    pub fn new(number: u8) -> Self {
        Self {
            number,
            first_sector: None,
            last_sector: None,
            pregap: None,
            silent_pregap: None,
            is_data_track: false,
            channels_per_frame: 2,
            has_pre_emphasis: false,
            digital_copy_permitted: false,
            is_selected: true,
        }
    }

    #[must_use]
    pub fn first_sector(&self) -> Option<u32> {
        self.first_sector
    }

    #[must_use]
    pub fn last_sector(&self) -> Option<u32> {
        self.last_sector
    }

    pub fn set_first_sector(&mut self, first_sector: Option<u32>) {
        self.first_sector = first_sector;
    }

    pub fn set_last_sector(&mut self, last_sector: Option<u32>) {
        self.last_sector = last_sector;
    }

    /// The sectors occupied by this track, recomputed from the current bounds on every call.
    ///
    /// Returns `Ok(None)` if either bound is not yet known.
    ///
    /// # Errors
    ///
    /// Returns an error if both bounds are known and the first sector is after the last.
    pub fn sector_range(&self) -> Result<Option<SectorRange>, SectorRangeError> {
        let (Some(first), Some(last)) = (self.first_sector, self.last_sector) else {
            return Ok(None);
        };

        SectorRange::from_first_and_last(first, last).map(Some)
    }

    /// # Errors
    ///
    /// Propagates any error from [`sector_range`](Self::sector_range).
    pub fn sector_count(&self) -> Result<Option<u32>, SectorRangeError> {
        Ok(self.sector_range()?.map(|range| range.len()))
    }

    /// The stored pregap sectors immediately preceding the track's first sector. Silent pregap
    /// has no sectors in the image and is not included. Returns `Ok(None)` if the first sector or
    /// pregap is unknown, or if the pregap is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the pregap would extend before sector 0.
    pub fn pregap_range(&self) -> Result<Option<SectorRange>, SectorRangeError> {
        let (Some(first), Some(pregap)) = (self.first_sector, self.pregap) else {
            return Ok(None);
        };

        if pregap == 0 {
            return Ok(None);
        }

        let last = first
            .checked_sub(1)
            .ok_or(SectorRangeError::CountOverflow { sector: first, count: pregap })?;
        SectorRange::from_last_and_count(last, pregap).map(Some)
    }

    /// Total pregap length on disc, stored plus silent.
    #[must_use]
    pub fn total_pregap(&self) -> Option<u32> {
        match (self.pregap, self.silent_pregap) {
            (None, None) => None,
            (stored, silent) => Some(stored.unwrap_or(0).saturating_add(silent.unwrap_or(0))),
        }
    }
}
