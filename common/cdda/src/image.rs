//! Reading sector ranges out of raw (2352 bytes per sector) disc images

use crate::cue::{self, BinFile};
use crate::sector::SectorRange;
use crate::session::SessionDescriptor;
use crate::track::TrackDescriptor;
use crate::{CddaError, CddaResult};
use crc::Crc;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

// Same CRC-32 variant reported by common ripping tools' logs
const TRACK_CRC: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

#[derive(Debug)]
struct ImageFile<F: Read + Seek> {
    sectors: SectorRange,
    file: BufReader<F>,
    position: u64,
}

/// A disc image made up of one or more files, each holding a contiguous run of sectors.
#[derive(Debug)]
pub struct DiscImage<F: Read + Seek> {
    files: Vec<ImageFile<F>>,
}

/// Raw audio read from one track of a disc image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTrack {
    pub track_number: u8,
    pub sector_range: SectorRange,
    pub data: Vec<u8>,
    pub crc32: u32,
}

impl DiscImage<File> {
    /// Open the CUE sheet at the given path along with all of the BIN files it references.
    ///
    /// # Errors
    ///
    /// Returns an error if the CUE sheet cannot be loaded or if any BIN file cannot be opened.
    pub fn open_cue<P: AsRef<Path>>(cue_path: P) -> CddaResult<(Self, SessionDescriptor)> {
        let cue_path = cue_path.as_ref();
        let (session, bin_files) = cue::load_cue(cue_path)?.into_parts();

        let parent_dir = cue_path
            .parent()
            .ok_or_else(|| CddaError::CueParentDir(cue_path.display().to_string()))?;

        let mut files = Vec::with_capacity(bin_files.len());
        for BinFile { file_name, sectors } in bin_files {
            let file_path = parent_dir.join(&file_name);
            let file = File::open(&file_path).map_err(|source| CddaError::BinOpen {
                path: file_path.display().to_string(),
                source,
            })?;
            files.push((sectors, file));
        }

        Ok((Self::new(files)?, session))
    }
}

impl<F: Read + Seek> DiscImage<F> {
    /// Create an image from files and the disc sectors each one holds. A file's first byte is the
    /// first byte of its range's first sector.
    ///
    /// # Errors
    ///
    /// Returns an error if any two files claim the same sector.
    pub fn new(files: Vec<(SectorRange, F)>) -> CddaResult<Self> {
        for (i, (a, _)) in files.iter().enumerate() {
            if let Some((b, _)) = files[i + 1..].iter().find(|(b, _)| a.intersects_sector_range(b)) {
                return Err(CddaError::OverlappingImageFiles { first: *a, second: *b });
            }
        }

        let files = files
            .into_iter()
            .map(|(sectors, file)| ImageFile { sectors, file: BufReader::new(file), position: 0 })
            .collect();
        Ok(Self { files })
    }

    /// Read the raw contents of every sector in `range` into the start of `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` is shorter than `range.byte_size()`, if any sector in the range is
    /// not held by a file in this image, or if an I/O error occurs.
    pub fn read_sectors(&mut self, range: SectorRange, out: &mut [u8]) -> CddaResult<()> {
        let required = range.byte_size();
        if (out.len() as u64) < required {
            return Err(CddaError::BufferTooSmall { required, actual: out.len() });
        }

        let mut sectors_read = 0_u64;
        for ImageFile { sectors, file, position } in &mut self.files {
            let Some(overlap) = sectors.intersected_sector_range(&range) else { continue };

            let file_index = sectors.index_for_sector(overlap.first_sector())?;
            let out_index = range.index_for_sector(overlap.first_sector())?;

            let file_addr = u64::from(file_index) * crate::BYTES_PER_SECTOR;
            let out_start = (u64::from(out_index) * crate::BYTES_PER_SECTOR) as usize;
            let out_end = out_start + overlap.byte_size() as usize;

            // Only seek if the file is not already at the desired position
            if *position != file_addr {
                log::trace!("Seeking to byte {file_addr} for sectors {overlap}");
                file.seek(SeekFrom::Start(file_addr)).map_err(CddaError::DiscReadIo)?;
            }

            file.read_exact(&mut out[out_start..out_end]).map_err(CddaError::DiscReadIo)?;
            *position = file_addr + overlap.byte_size();

            sectors_read += u64::from(overlap.len());
        }

        // Files never overlap, so any shortfall means part of the range is missing
        if sectors_read != u64::from(range.len()) {
            return Err(CddaError::SectorsNotInImage { range });
        }

        Ok(())
    }

    /// Read every sector of a track and compute its CRC-32.
    ///
    /// # Errors
    ///
    /// Returns an error if the track's sector range is unresolved or invalid, or if reading fails.
    pub fn extract_track(&mut self, track: &TrackDescriptor) -> CddaResult<ExtractedTrack> {
        let sector_range = track
            .sector_range()?
            .ok_or(CddaError::UnresolvedTrack { track_number: track.number })?;

        log::debug!(
            "Extracting track {} from sectors {sector_range} ({} bytes)",
            track.number,
            sector_range.byte_size()
        );

        let mut data = vec![0; sector_range.byte_size() as usize];
        self.read_sectors(sector_range, &mut data)?;
        let crc32 = TRACK_CRC.checksum(&data);

        Ok(ExtractedTrack { track_number: track.number, sector_range, data, crc32 })
    }

    /// Re-read an extracted track's sectors and compare against the CRC computed on extraction.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or if the CRCs do not match.
    pub fn verify_track(&mut self, extracted: &ExtractedTrack) -> CddaResult<()> {
        let mut data = vec![0; extracted.sector_range.byte_size() as usize];
        self.read_sectors(extracted.sector_range, &mut data)?;

        let actual = TRACK_CRC.checksum(&data);
        if actual != extracted.crc32 {
            return Err(CddaError::CrcMismatch {
                track_number: extracted.track_number,
                expected: extracted.crc32,
                actual,
            });
        }

        Ok(())
    }
}
