//! A single session on a CDDA disc: its tracks and lead-out

use crate::sector::{SectorRange, SectorRangeError};
use crate::track::TrackDescriptor;
use crate::{CddaError, CddaResult};
use bincode::{Decode, Encode};

pub const MAX_TRACK_NUMBER: u8 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionDescriptor {
    pub number: u8,
    lead_out: u32,
    tracks: Vec<TrackDescriptor>,
}

impl SessionDescriptor {
    #[must_use]
    pub fn new(number: u8, tracks: Vec<TrackDescriptor>, lead_out: u32) -> Self {
        Self { number, lead_out, tracks }
    }

    /// Build a session from the track start offsets and lead-out read from a disc TOC. Each track
    /// ends one sector before the next track (or the lead-out) begins.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no tracks, if the track numbers would exceed 99, or if the
    /// offsets are not strictly increasing and below the lead-out.
    pub fn from_toc(
        first_track_number: u8,
        track_offsets: &[u32],
        lead_out: u32,
    ) -> CddaResult<Self> {
        if track_offsets.is_empty() {
            return Err(CddaError::InvalidToc("TOC has no tracks".into()));
        }

        let last_track_number = usize::from(first_track_number) + track_offsets.len() - 1;
        if first_track_number == 0 || last_track_number > usize::from(MAX_TRACK_NUMBER) {
            return Err(CddaError::InvalidToc(format!(
                "Track numbers {first_track_number}-{last_track_number} are outside of 1-{MAX_TRACK_NUMBER}"
            )));
        }

        let mut tracks = Vec::with_capacity(track_offsets.len());
        for (i, &offset) in track_offsets.iter().enumerate() {
            let end = track_offsets.get(i + 1).copied().unwrap_or(lead_out);
            if end <= offset {
                return Err(CddaError::InvalidToc(format!(
                    "Track starting at sector {offset} is followed by sector {end}"
                )));
            }

            let sector_range = SectorRange::from_first_and_last(offset, end - 1)?;

            let mut track = TrackDescriptor::new(first_track_number + i as u8);
            track.set_first_sector(Some(sector_range.first_sector()));
            track.set_last_sector(Some(sector_range.last_sector()));
            tracks.push(track);
        }

        log::debug!("Built session from TOC: {} tracks, lead-out at {lead_out}", tracks.len());

        Ok(Self::new(1, tracks, lead_out))
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackDescriptor] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [TrackDescriptor] {
        &mut self.tracks
    }

    #[must_use]
    pub fn track(&self, number: u8) -> Option<&TrackDescriptor> {
        self.tracks.iter().find(|track| track.number == number)
    }

    #[must_use]
    pub fn lead_out(&self) -> u32 {
        self.lead_out
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &TrackDescriptor> {
        self.tracks.iter().filter(|track| !track.is_data_track)
    }

    pub fn selected_tracks(&self) -> impl Iterator<Item = &TrackDescriptor> {
        self.tracks.iter().filter(|track| track.is_selected)
    }

    /// Sectors from the start of the first track up to (not including) the lead-out. Returns
    /// `Ok(None)` if the first track's start is not yet known.
    ///
    /// # Errors
    ///
    /// Returns an error if the lead-out is not after the first track's start.
    pub fn sector_range(&self) -> Result<Option<SectorRange>, SectorRangeError> {
        let Some(first) = self.tracks.first().and_then(TrackDescriptor::first_sector) else {
            return Ok(None);
        };

        let last = self
            .lead_out
            .checked_sub(1)
            .ok_or(SectorRangeError::FirstAfterLast { first, last: self.lead_out })?;
        SectorRange::from_first_and_last(first, last).map(Some)
    }

    /// Find the track containing the given sector. Tracks without a valid sector range are skipped.
    #[must_use]
    pub fn find_track_by_sector(&self, sector: u32) -> Option<&TrackDescriptor> {
        self.tracks.iter().find(|track| {
            matches!(track.sector_range(), Ok(Some(range)) if range.contains_sector(sector))
        })
    }
}
