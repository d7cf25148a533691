pub mod cdtime;
pub mod cue;
pub mod image;
pub mod sector;
pub mod session;
pub mod track;

use crate::sector::{SectorRange, SectorRangeError};
use std::io;
use thiserror::Error;

// Audio: 588 stereo frames of signed 16-bit PCM, 1176 samples in total
// Data: 16 header bytes + 2048 data bytes + 288 error detection/correction bytes
pub const BYTES_PER_SECTOR: u64 = 2352;

#[derive(Debug, Error)]
pub enum CddaError {
    #[error("Invalid sector range: {0}")]
    SectorRange(#[from] SectorRangeError),
    #[error("CUE sheet path '{0}' has no parent directory to resolve BIN files against")]
    CueParentDir(String),
    #[error("Malformed CUE sheet: {0}")]
    CueParse(String),
    #[error("CUE FILE entry must name a quoted BINARY file: {0}")]
    CueInvalidFileLine(String),
    #[error("CUE TRACK entry needs a number and an AUDIO/MODE1/MODE2 mode: {0}")]
    CueInvalidTrackLine(String),
    #[error("CUE INDEX entry needs a track, an index number and an MM:SS:FF time: {0}")]
    CueInvalidIndexLine(String),
    #[error("CUE PREGAP entry needs a track and an MM:SS:FF length: {0}")]
    CueInvalidPregapLine(String),
    #[error("CUE FLAGS entry needs a track and only DCP/PRE/4CH/SCMS flags: {0}")]
    CueInvalidFlagsLine(String),
    #[error("Unable to read the size of BIN file '{path}': {source}")]
    FsMetadata {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Unable to read CUE sheet '{path}': {source}")]
    CueOpen {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Unable to open BIN file '{path}': {source}")]
    BinOpen {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Invalid table of contents: {0}")]
    InvalidToc(String),
    #[error("Track {track_number} does not have a known sector range")]
    UnresolvedTrack { track_number: u8 },
    #[error("Output buffer of {actual} bytes is too small, {required} bytes required")]
    BufferTooSmall { required: u64, actual: usize },
    #[error("Disc image files holding sectors {first} and {second} overlap")]
    OverlappingImageFiles { first: SectorRange, second: SectorRange },
    #[error("Sectors {range} are not fully backed by the disc image")]
    SectorsNotInImage { range: SectorRange },
    #[error("Disc image read failed: {0}")]
    DiscReadIo(#[source] io::Error),
    #[error(
        "CRC mismatch re-reading track {track_number}; expected={expected:08X}, actual={actual:08X}"
    )]
    CrcMismatch { track_number: u8, expected: u32, actual: u32 },
}

pub type CddaResult<T> = Result<T, CddaError>;
