use anyhow::{Context, anyhow};
use cdda::CddaError;
use cdda::cdtime::CdTime;
use cdda::image::DiscImage;
use cdda::session::SessionDescriptor;
use cdda::track::TrackDescriptor;
use clap::Parser;
use env_logger::Env;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RipConfig {
    #[serde(default = "true_fn")]
    skip_data_tracks: bool,
    #[serde(default = "default_file_name_prefix")]
    file_name_prefix: String,
    #[serde(default)]
    verify_crc: bool,
}

fn true_fn() -> bool {
    true
}

fn default_file_name_prefix() -> String {
    "track".into()
}

impl Default for RipConfig {
    fn default() -> Self {
        toml::from_str("").unwrap()
    }
}

impl RipConfig {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file '{}'", path.display()))?;
        toml::from_str(&config_str)
            .with_context(|| format!("Unable to parse config file '{}'", path.display()))
    }

    fn output_path(&self, dir: &Path, track_number: u8) -> PathBuf {
        dir.join(format!("{}{track_number:02}.raw", self.file_name_prefix))
    }
}

#[derive(Parser)]
struct Args {
    /// CUE file path
    #[arg(short = 'f', long)]
    file_path: PathBuf,

    /// TOML config file path
    #[arg(short = 'c', long)]
    config_path: Option<PathBuf>,

    /// Only process the track with this number
    #[arg(short = 't', long)]
    track: Option<u8>,

    /// Extract raw PCM for each selected audio track into this directory
    #[arg(short = 'o', long)]
    extract_dir: Option<PathBuf>,

    /// Print the parsed session as TOML instead of a track listing
    #[arg(long, default_value_t)]
    dump_toml: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config_path {
        Some(path) => RipConfig::load(path)?,
        None => RipConfig::default(),
    };
    log::debug!("Using config: {config:?}");

    let (mut image, session) = DiscImage::open_cue(&args.file_path)
        .with_context(|| format!("Unable to open disc image '{}'", args.file_path.display()))?;

    if args.dump_toml {
        println!("{}", toml::to_string_pretty(&session)?);
        return Ok(());
    }

    println!("{}", format_header());
    for track in session.tracks() {
        println!("{}", format_track(track));
    }

    let Some(extract_dir) = &args.extract_dir else { return Ok(()) };

    fs::create_dir_all(extract_dir)
        .with_context(|| format!("Unable to create directory '{}'", extract_dir.display()))?;

    for track in select_tracks(&session, args.track, &config)? {
        let extracted = match image.extract_track(track) {
            Ok(extracted) => extracted,
            Err(CddaError::UnresolvedTrack { track_number }) => {
                log::warn!("Skipping track {track_number}; its sector range is not known");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if config.verify_crc {
            image.verify_track(&extracted)?;
        }

        let output_path = config.output_path(extract_dir, track.number);
        fs::write(&output_path, &extracted.data)
            .with_context(|| format!("Unable to write '{}'", output_path.display()))?;

        log::info!(
            "Extracted track {} ({} sectors) to '{}', CRC32 {:08X}",
            track.number,
            extracted.sector_range.len(),
            output_path.display(),
            extracted.crc32
        );
    }

    Ok(())
}

fn select_tracks<'a>(
    session: &'a SessionDescriptor,
    track_number: Option<u8>,
    config: &RipConfig,
) -> anyhow::Result<Vec<&'a TrackDescriptor>> {
    if let Some(track_number) = track_number {
        let track = session
            .track(track_number)
            .ok_or_else(|| anyhow!("Disc has no track {track_number}"))?;
        return Ok(vec![track]);
    }

    Ok(session
        .selected_tracks()
        .filter(|track| !(config.skip_data_tracks && track.is_data_track))
        .collect())
}

fn format_header() -> String {
    format!(
        "{:>2}  {:<5}  {:>8}  {:>13}  {:>7}  {:>11}  {:>6}",
        "#", "type", "start", "sectors", "length", "bytes", "pregap"
    )
}

fn format_track(track: &TrackDescriptor) -> String {
    let track_type = if track.is_data_track { "data" } else { "audio" };

    let (start, sectors, length, bytes) = match track.sector_range() {
        Ok(Some(range)) => (
            CdTime::from_sector_number(range.first_sector())
                .map_or_else(|| "--:--:--".into(), |time| time.to_string()),
            range.to_string(),
            range.len().to_string(),
            range.byte_size().to_string(),
        ),
        Ok(None) => ("--:--:--".into(), "unresolved".into(), "-".into(), "-".into()),
        Err(err) => {
            log::warn!("Track {} has invalid sector bounds: {err}", track.number);
            ("--:--:--".into(), "invalid".into(), "-".into(), "-".into())
        }
    };
    let pregap = track.total_pregap().map_or_else(|| "-".into(), |pregap| pregap.to_string());

    format!(
        "{:>2}  {track_type:<5}  {start:>8}  {sectors:>13}  {length:>7}  {bytes:>11}  {pregap:>6}",
        track.number
    )
}
