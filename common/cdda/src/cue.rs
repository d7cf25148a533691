//! Code for loading CUE sheets that describe raw (BIN) disc images

#[cfg(test)]
mod tests;

use crate::cdtime::CdTime;
use crate::sector::SectorRange;
use crate::session::{MAX_TRACK_NUMBER, SessionDescriptor};
use crate::track::TrackDescriptor;
use crate::{CddaError, CddaResult};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    Audio,
    Mode1,
    Mode2,
}

impl TrackMode {
    #[must_use]
    pub fn is_data(self) -> bool {
        matches!(self, Self::Mode1 | Self::Mode2)
    }
}

impl FromStr for TrackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUDIO" => Ok(Self::Audio),
            "MODE1/2352" => Ok(Self::Mode1),
            "MODE2/2352" => Ok(Self::Mode2),
            _ => Err(format!("unsupported CD track mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackFlags {
    pub digital_copy_permitted: bool,
    pub pre_emphasis: bool,
    pub four_channel: bool,
}

/// A BIN file referenced by a CUE sheet, and the disc sectors it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinFile {
    pub file_name: String,
    pub sectors: SectorRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueSheet {
    session: SessionDescriptor,
    files: Vec<BinFile>,
}

impl CueSheet {
    #[must_use]
    pub fn session(&self) -> &SessionDescriptor {
        &self.session
    }

    #[must_use]
    pub fn files(&self) -> &[BinFile] {
        &self.files
    }

    #[must_use]
    pub fn into_parts(self) -> (SessionDescriptor, Vec<BinFile>) {
        (self.session, self.files)
    }
}

/// Load a CUE sheet from disk. BIN file sizes are read from the filesystem to determine where
/// the last track in each file ends.
///
/// # Errors
///
/// Returns an error if the CUE file cannot be read or parsed, or if any referenced BIN file cannot
/// be found.
pub fn load_cue<P: AsRef<Path>>(cue_path: P) -> CddaResult<CueSheet> {
    let cue_path = cue_path.as_ref();
    let display_path = || cue_path.display().to_string();

    let contents = fs::read_to_string(cue_path)
        .map_err(|source| CddaError::CueOpen { path: display_path(), source })?;
    let bin_dir = cue_path.parent().ok_or_else(|| CddaError::CueParentDir(display_path()))?;

    parse_cue(&contents, |file_name| {
        let bin_path = bin_dir.join(file_name);
        let len_bytes = fs::metadata(&bin_path)
            .map_err(|source| CddaError::FsMetadata { path: bin_path.display().to_string(), source })?
            .len();

        let trailing_bytes = len_bytes % crate::BYTES_PER_SECTOR;
        if trailing_bytes != 0 {
            log::warn!(
                "Ignoring {trailing_bytes} bytes past the last whole sector of '{}'",
                bin_path.display()
            );
        }

        u32::try_from(len_bytes / crate::BYTES_PER_SECTOR).map_err(|_| {
            CddaError::CueParse(format!("'{}' holds more sectors than a disc can", bin_path.display()))
        })
    })
}

/// Parse CUE sheet contents. `file_len_sectors` is called once per FILE entry to look up the
/// length of that file in sectors.
///
/// # Errors
///
/// Returns an error if the CUE sheet is malformed or inconsistent with the file lengths.
pub fn parse_cue<F>(contents: &str, file_len_sectors: F) -> CddaResult<CueSheet>
where
    F: FnMut(&str) -> CddaResult<u32>,
{
    let parsed_files = CueParser::default().parse(contents)?;
    to_cue_sheet(parsed_files, file_len_sectors)
}

#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
struct ParsedTrack {
    number: u8,
    mode: TrackMode,
    flags: TrackFlags,
    pregap_len: Option<CdTime>,
    pause_start: Option<CdTime>,
    track_start: CdTime,
}

#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
struct ParsedFile {
    file_name: String,
    tracks: Vec<ParsedTrack>,
}

/// A TRACK entry whose INDEX/PREGAP/FLAGS lines are still being read
#[derive(Debug, Clone)]
struct OpenTrack {
    number: u8,
    mode: TrackMode,
    flags: TrackFlags,
    pregap_len: Option<CdTime>,
    pause_start: Option<CdTime>,
    track_start: Option<CdTime>,
}

#[derive(Debug, Clone, Default)]
struct CueParser {
    files: Vec<ParsedFile>,
    open_track: Option<OpenTrack>,
}

// Splits `args` into exactly N whitespace-separated fields
fn fields<const N: usize>(args: &str) -> Option<[&str; N]> {
    let mut iter = args.split_whitespace();
    let fields = std::array::from_fn(|_| iter.next());
    if iter.next().is_some() {
        return None;
    }
    fields.iter().all(Option::is_some).then(|| fields.map(|field| field.unwrap_or_default()))
}

impl CueParser {
    fn parse(mut self, contents: &str) -> CddaResult<Vec<ParsedFile>> {
        for line in contents.lines().map(str::trim) {
            let (keyword, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            match keyword {
                "FILE" => self.open_file(line)?,
                "TRACK" => self.open_track(line, args)?,
                "INDEX" => self.index(line, args)?,
                "PREGAP" => self.pregap(line, args)?,
                "FLAGS" => self.flags(line, args)?,
                // REM, TITLE, PERFORMER, CATALOG, ISRC, POSTGAP etc. carry no sector information
                _ => {}
            }
        }

        self.close_file()?;

        if self.files.is_empty() {
            return Err(CddaError::CueParse("no FILE entries found".into()));
        }

        Ok(self.files)
    }

    fn open_file(&mut self, line: &str) -> CddaResult<()> {
        static FILE_LINE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r#"^FILE\s+"(.+)"\s+BINARY$"#).unwrap());

        self.close_file()?;

        let file_name = FILE_LINE
            .captures(line)
            .and_then(|captures| captures.get(1))
            .ok_or_else(|| CddaError::CueInvalidFileLine(line.into()))?;
        self.files.push(ParsedFile { file_name: file_name.as_str().into(), tracks: vec![] });

        Ok(())
    }

    fn open_track(&mut self, line: &str, args: &str) -> CddaResult<()> {
        self.close_track()?;

        let invalid = || CddaError::CueInvalidTrackLine(line.into());
        if self.files.is_empty() {
            return Err(invalid());
        }

        let [number, mode] = fields(args).ok_or_else(invalid)?;
        let number: u8 = number.parse().map_err(|_| invalid())?;
        let mode: TrackMode = mode.parse().map_err(|_| invalid())?;

        if !(1..=MAX_TRACK_NUMBER).contains(&number) {
            return Err(CddaError::CueParse(format!(
                "track number {number} is outside 1-{MAX_TRACK_NUMBER}"
            )));
        }

        let previous = self.files.iter().flat_map(|file| &file.tracks).next_back();
        if let Some(previous) =
            previous.map(|track| track.number).filter(|&previous| number != previous + 1)
        {
            return Err(CddaError::CueParse(format!(
                "track {number} follows track {previous}; tracks must be numbered consecutively"
            )));
        }

        self.open_track = Some(OpenTrack {
            number,
            mode,
            flags: TrackFlags::default(),
            pregap_len: None,
            pause_start: None,
            track_start: None,
        });

        Ok(())
    }

    fn index(&mut self, line: &str, args: &str) -> CddaResult<()> {
        let invalid = || CddaError::CueInvalidIndexLine(line.into());
        let track = self.open_track.as_mut().ok_or_else(invalid)?;

        let [index, time] = fields(args).ok_or_else(invalid)?;
        let index: u8 = index.parse().map_err(|_| invalid())?;
        let time: CdTime = time.parse().map_err(|_| invalid())?;

        match index {
            0 => track.pause_start = Some(time),
            1 => track.track_start = Some(time),
            // Sub-indices mark points inside the track and leave its bounds alone
            _ => log::debug!("Track {} index {index} at {time}", track.number),
        }

        Ok(())
    }

    fn pregap(&mut self, line: &str, args: &str) -> CddaResult<()> {
        let invalid = || CddaError::CueInvalidPregapLine(line.into());
        let track = self.open_track.as_mut().ok_or_else(invalid)?;

        let [len] = fields(args).ok_or_else(invalid)?;
        track.pregap_len = Some(len.parse().map_err(|_| invalid())?);

        Ok(())
    }

    fn flags(&mut self, line: &str, args: &str) -> CddaResult<()> {
        let invalid = || CddaError::CueInvalidFlagsLine(line.into());
        let track = self.open_track.as_mut().ok_or_else(invalid)?;

        let mut flags = TrackFlags::default();
        for flag in args.split_whitespace() {
            match flag {
                "DCP" => flags.digital_copy_permitted = true,
                "PRE" => flags.pre_emphasis = true,
                "4CH" => flags.four_channel = true,
                // Serial copy management; not represented
                "SCMS" => {}
                _ => return Err(invalid()),
            }
        }
        track.flags = flags;

        Ok(())
    }

    fn close_track(&mut self) -> CddaResult<()> {
        let Some(open) = self.open_track.take() else { return Ok(()) };

        let track_start = open
            .track_start
            .ok_or_else(|| CddaError::CueParse(format!("track {} has no INDEX 01", open.number)))?;

        // open_track() only succeeds once a FILE entry exists
        if let Some(file) = self.files.last_mut() {
            file.tracks.push(ParsedTrack {
                number: open.number,
                mode: open.mode,
                flags: open.flags,
                pregap_len: open.pregap_len,
                pause_start: open.pause_start,
                track_start,
            });
        }

        Ok(())
    }

    fn close_file(&mut self) -> CddaResult<()> {
        self.close_track()?;

        match self.files.last() {
            Some(file) if file.tracks.is_empty() => Err(CddaError::CueParse(format!(
                "FILE entry '{}' contains no tracks",
                file.file_name
            ))),
            _ => Ok(()),
        }
    }
}

fn to_cue_sheet<F>(parsed_files: Vec<ParsedFile>, mut file_len_sectors: F) -> CddaResult<CueSheet>
where
    F: FnMut(&str) -> CddaResult<u32>,
{
    let mut file_start = 0_u32;
    let mut tracks = Vec::new();
    let mut files = Vec::with_capacity(parsed_files.len());

    for ParsedFile { file_name, tracks: parsed_tracks } in parsed_files {
        let file_len = file_len_sectors(&file_name)?;
        let file_sectors = SectorRange::from_first_and_count(file_start, file_len).map_err(|_| {
            CddaError::CueParse(format!("'{file_name}' cannot hold {file_len} sectors at sector {file_start}"))
        })?;

        for (i, parsed) in parsed_tracks.iter().enumerate() {
            let track_start = parsed.track_start.to_sector_number();
            let data_end = parsed_tracks.get(i + 1).map_or(file_len, |next| {
                next.pause_start.unwrap_or(next.track_start).to_sector_number()
            });

            if data_end > file_len {
                return Err(CddaError::CueParse(format!(
                    "track {} runs past the end of '{file_name}' ({file_len} sectors)",
                    parsed.number
                )));
            }

            if data_end <= track_start {
                return Err(CddaError::CueParse(format!(
                    "track {} in '{file_name}' is empty (INDEX 01 at {}, data ends at sector {data_end})",
                    parsed.number, parsed.track_start
                )));
            }

            // INDEX 00 to INDEX 01 is stored in the file; a PREGAP directive is not
            let stored_pregap = match parsed.pause_start {
                Some(pause_start) if pause_start > parsed.track_start => {
                    return Err(CddaError::CueParse(format!(
                        "track {} has INDEX 00 after INDEX 01",
                        parsed.number
                    )));
                }
                Some(pause_start) => track_start - pause_start.to_sector_number(),
                None => 0,
            };

            let mut track = TrackDescriptor::new(parsed.number);
            track.set_first_sector(Some(file_start + track_start));
            track.set_last_sector(Some(file_start + data_end - 1));
            track.pregap = Some(stored_pregap);
            track.silent_pregap = parsed.pregap_len.map(CdTime::to_sector_number);
            track.is_data_track = parsed.mode.is_data();
            track.channels_per_frame = if parsed.flags.four_channel { 4 } else { 2 };
            track.has_pre_emphasis = parsed.flags.pre_emphasis;
            track.digital_copy_permitted = parsed.flags.digital_copy_permitted;
            tracks.push(track);
        }

        file_start = file_sectors.last_sector().checked_add(1).ok_or_else(|| {
            CddaError::CueParse(format!("'{file_name}' ends past the last addressable sector"))
        })?;
        files.push(BinFile { file_name, sectors: file_sectors });
    }

    let session = SessionDescriptor::new(1, tracks, file_start);

    log::trace!("Parsed cue sheet:\n{session:#?}");

    Ok(CueSheet { session, files })
}
