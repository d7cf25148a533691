use super::*;
use test_log::test;

const SINGLE_FILE: &str = "
REM GENRE Rock
PERFORMER \"Someone\"
TITLE \"Single File\"
FILE \"Single File.bin\" BINARY
  TRACK 01 AUDIO
    FLAGS DCP
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    FLAGS PRE
    INDEX 00 03:44:00
    INDEX 01 03:46:00
  TRACK 03 AUDIO
    INDEX 01 06:40:00
";

fn range(first: u32, last: u32) -> SectorRange {
    SectorRange::from_first_and_last(first, last).unwrap()
}

fn ranges(cue_sheet: &CueSheet) -> Vec<SectorRange> {
    cue_sheet
        .session()
        .tracks()
        .iter()
        .map(|track| track.sector_range().unwrap().unwrap())
        .collect()
}

#[test]
fn parse_single_file() {
    let files = CueParser::default().parse(SINGLE_FILE).unwrap();
    assert_eq!(
        files,
        vec![ParsedFile {
            file_name: "Single File.bin".into(),
            tracks: vec![
                ParsedTrack {
                    number: 1,
                    mode: TrackMode::Audio,
                    flags: TrackFlags { digital_copy_permitted: true, ..TrackFlags::default() },
                    pregap_len: None,
                    pause_start: None,
                    track_start: CdTime::ZERO,
                },
                ParsedTrack {
                    number: 2,
                    mode: TrackMode::Audio,
                    flags: TrackFlags { pre_emphasis: true, ..TrackFlags::default() },
                    pregap_len: None,
                    pause_start: Some(CdTime { minutes: 3, seconds: 44, frames: 0 }),
                    track_start: CdTime { minutes: 3, seconds: 46, frames: 0 },
                },
                ParsedTrack {
                    number: 3,
                    mode: TrackMode::Audio,
                    flags: TrackFlags::default(),
                    pregap_len: None,
                    pause_start: None,
                    track_start: CdTime { minutes: 6, seconds: 40, frames: 0 },
                },
            ]
        }]
    );
}

#[test]
fn single_file_sector_ranges() {
    // 10 minutes of audio
    let cue_sheet = parse_cue(SINGLE_FILE, |_| Ok(45000)).unwrap();

    // Track 1 ends where track 2's pregap begins
    assert_eq!(ranges(&cue_sheet), vec![range(0, 16799), range(16950, 29999), range(30000, 44999)]);

    let tracks = cue_sheet.session().tracks();
    assert_eq!(tracks[0].pregap, Some(0));
    assert_eq!(tracks[1].pregap, Some(150));
    assert_eq!(tracks[1].pregap_range(), Ok(Some(range(16800, 16949))));

    assert!(tracks[0].digital_copy_permitted);
    assert!(!tracks[0].has_pre_emphasis);
    assert!(tracks[1].has_pre_emphasis);
    assert!(tracks.iter().all(|track| track.channels_per_frame == 2 && !track.is_data_track));

    assert_eq!(cue_sheet.session().lead_out(), 45000);
    assert_eq!(
        cue_sheet.files(),
        &[BinFile { file_name: "Single File.bin".into(), sectors: range(0, 44999) }]
    );
}

const MULTI_FILE: &str = "
FILE \"Multi File (Track 01).bin\" BINARY
  TRACK 01 MODE1/2352
    INDEX 01 00:00:00
FILE \"Multi File (Track 02).bin\" BINARY
  TRACK 02 AUDIO
    INDEX 00 00:00:00
    INDEX 01 00:02:00
FILE \"Multi File (Track 03).bin\" BINARY
  TRACK 03 AUDIO
    FLAGS 4CH
    INDEX 00 00:00:00
    INDEX 01 00:02:00
";

#[test]
fn multi_file_sector_ranges() {
    let cue_sheet = parse_cue(MULTI_FILE, |file_name| match file_name {
        "Multi File (Track 01).bin" => Ok(1000),
        "Multi File (Track 02).bin" => Ok(2000),
        "Multi File (Track 03).bin" => Ok(3000),
        _ => panic!("unexpected file name: {file_name}"),
    })
    .unwrap();

    assert_eq!(ranges(&cue_sheet), vec![range(0, 999), range(1150, 2999), range(3150, 5999)]);

    let files: Vec<_> = cue_sheet.files().iter().map(|file| file.sectors).collect();
    assert_eq!(files, vec![range(0, 999), range(1000, 2999), range(3000, 5999)]);

    let tracks = cue_sheet.session().tracks();
    assert!(tracks[0].is_data_track);
    assert_eq!(tracks[2].channels_per_frame, 4);
    assert_eq!(cue_sheet.session().audio_tracks().count(), 2);
}

#[test]
fn pregap_directive_is_not_stored_in_the_image() {
    let cue = "
FILE \"disc.bin\" BINARY
  TRACK 01 AUDIO
    PREGAP 00:02:00
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    PREGAP 00:01:00
    INDEX 01 00:10:00
";
    let cue_sheet = parse_cue(cue, |_| Ok(1500)).unwrap();
    assert_eq!(ranges(&cue_sheet), vec![range(0, 749), range(750, 1499)]);

    let tracks = cue_sheet.session().tracks();
    assert_eq!(tracks[0].silent_pregap, Some(150));
    assert_eq!(tracks[0].pregap_range(), Ok(None));
    assert_eq!(tracks[1].pregap, Some(0));
    assert_eq!(tracks[1].silent_pregap, Some(75));
    assert_eq!(tracks[1].total_pregap(), Some(75));
    assert_eq!(tracks[1].pregap_range(), Ok(None));
}

#[test]
fn stored_pregap_never_overlaps_previous_track() {
    let cue = "
FILE \"disc.bin\" BINARY
  TRACK 01 AUDIO
    INDEX 00 00:00:00
    INDEX 01 00:02:00
  TRACK 02 AUDIO
    PREGAP 00:01:00
    INDEX 00 00:09:00
    INDEX 01 00:10:00
";
    let cue_sheet = parse_cue(cue, |_| Ok(1500)).unwrap();
    let tracks = cue_sheet.session().tracks();

    assert_eq!(tracks[0].pregap_range(), Ok(Some(range(0, 149))));
    assert_eq!(tracks[1].pregap_range(), Ok(Some(range(675, 749))));
    assert_eq!(tracks[1].total_pregap(), Some(150));

    for pair in tracks.windows(2) {
        let previous = pair[0].sector_range().unwrap().unwrap();
        let pregap = pair[1].pregap_range().unwrap().unwrap();
        assert!(!previous.intersects_sector_range(&pregap), "{previous} / {pregap}");
        assert_eq!(previous.last_sector() + 1, pregap.first_sector());
    }
}

#[test]
fn track_numbers_are_bounded() {
    let track_zero = "
FILE \"disc.bin\" BINARY
  TRACK 00 AUDIO
    INDEX 01 00:00:00
";
    assert!(matches!(CueParser::default().parse(track_zero), Err(CddaError::CueParse(_))));

    let track_150 = "
FILE \"disc.bin\" BINARY
  TRACK 150 AUDIO
    INDEX 01 00:00:00
";
    assert!(matches!(CueParser::default().parse(track_150), Err(CddaError::CueParse(_))));

    let past_99 = "
FILE \"disc.bin\" BINARY
  TRACK 99 AUDIO
    INDEX 01 00:00:00
  TRACK 100 AUDIO
    INDEX 01 00:01:00
";
    assert!(matches!(CueParser::default().parse(past_99), Err(CddaError::CueParse(_))));

    let last_track = "
FILE \"disc.bin\" BINARY
  TRACK 99 AUDIO
    INDEX 01 00:00:00
";
    let files = CueParser::default().parse(last_track).unwrap();
    assert_eq!(files[0].tracks[0].number, 99);
}

#[test]
fn parse_errors() {
    let out_of_order = "
FILE \"disc.bin\" BINARY
  TRACK 01 AUDIO
    INDEX 01 00:00:00
  TRACK 03 AUDIO
    INDEX 01 00:10:00
";
    assert!(matches!(CueParser::default().parse(out_of_order), Err(CddaError::CueParse(_))));

    let no_start = "
FILE \"disc.bin\" BINARY
  TRACK 01 AUDIO
    INDEX 00 00:00:00
";
    assert!(matches!(CueParser::default().parse(no_start), Err(CddaError::CueParse(_))));

    let bad_mode = "
FILE \"disc.bin\" BINARY
  TRACK 01 CDG
    INDEX 01 00:00:00
";
    assert!(matches!(CueParser::default().parse(bad_mode), Err(CddaError::CueInvalidTrackLine(_))));

    let bad_time = "
FILE \"disc.bin\" BINARY
  TRACK 01 AUDIO
    INDEX 01 00:00:99
";
    assert!(matches!(CueParser::default().parse(bad_time), Err(CddaError::CueInvalidIndexLine(_))));

    let bad_flags = "
FILE \"disc.bin\" BINARY
  TRACK 01 AUDIO
    FLAGS XYZ
    INDEX 01 00:00:00
";
    assert!(matches!(CueParser::default().parse(bad_flags), Err(CddaError::CueInvalidFlagsLine(_))));

    let index_before_track = "
FILE \"disc.bin\" BINARY
  INDEX 01 00:00:00
  TRACK 01 AUDIO
";
    assert!(matches!(
        CueParser::default().parse(index_before_track),
        Err(CddaError::CueInvalidIndexLine(_))
    ));

    let extra_field = "
FILE \"disc.bin\" BINARY
  TRACK 01 AUDIO EXTRA
    INDEX 01 00:00:00
";
    assert!(matches!(
        CueParser::default().parse(extra_field),
        Err(CddaError::CueInvalidTrackLine(_))
    ));

    let wave_file = "
FILE \"disc.wav\" WAVE
  TRACK 01 AUDIO
    INDEX 01 00:00:00
";
    assert!(matches!(CueParser::default().parse(wave_file), Err(CddaError::CueInvalidFileLine(_))));

    assert!(matches!(CueParser::default().parse("REM nothing here"), Err(CddaError::CueParse(_))));
}

#[test]
fn track_past_end_of_file() {
    // File holds only 2 minutes, but track 3 starts at 06:40:00
    let result = parse_cue(SINGLE_FILE, |_| Ok(9000));
    assert!(matches!(result, Err(CddaError::CueParse(_))));

    let result = parse_cue(SINGLE_FILE, |_| Ok(0));
    assert!(matches!(result, Err(CddaError::CueParse(_))));
}

#[test]
fn load_from_disk_reports_missing_cue() {
    let result = load_cue("/nonexistent/dir/disc.cue");
    assert!(matches!(result, Err(CddaError::CueOpen { .. })));
}
