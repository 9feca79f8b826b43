#![forbid(unsafe_code)]
#![cfg(unix)]

//! External decode checks driven by shell-script stand-ins for the decoder.
//!
//! The stand-in treats its `-i` argument as a directory of pre-rendered
//! `frames%06d.png` files and copies up to `-vframes` of them into the
//! output directory, the way a real decoder would dump them.
//!
//! Run:
//!   cargo test -p seqcheck-harness --test decoder_stand_in

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use seqcheck_core::{
    FileOpener, Frame, MemorySequence, PatternWriter, SequenceReader, Shape, Source, SourceOpener,
    convert,
};
use seqcheck_harness::{
    AccessOrder, DecodeCommand, ExternalDecode, HarnessError, MismatchKind, RunConfig,
    RunWorkspace, check_determinism, collect,
};

/// Scripts are written then executed; serialize so no concurrent spawn
/// inherits a still-open write handle.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

const FIXTURE_FRAMES: usize = 4;

fn write_fixture(dir: &Path) {
    let frames = (0..FIXTURE_FRAMES)
        .map(|k| {
            let shape = Shape::color(10, 10);
            let data = (0..shape.byte_len())
                .map(|i| ((i + 40 * k) % 256) as u8)
                .collect();
            Frame::new(shape, data).expect("frame")
        })
        .collect();
    let mut memory = MemorySequence::new(1, frames).expect("seq");
    let pattern = dir.join("frames%06d.png").to_string_lossy().into_owned();
    let mut writer = PatternWriter::create(&pattern, 25.0, memory.shape(), true).expect("writer");
    convert(&mut memory, &mut writer).expect("convert");
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod");
    path
}

const COPY_FRAMES: &str = r#"
i=1
while [ "$i" -le "$limit" ]; do
  src=$(printf '%s/frames%06d.png' "$input" $((i + skip)))
  [ -f "$src" ] || break
  cp "$src" "$(printf '%s/frames%06d.png' "$out_dir" "$i")"
  i=$((i + 1))
done
"#;

fn copying_decoder(dir: &Path) -> PathBuf {
    let body = format!(
        "input=\"$2\"\nlimit=\"$6\"\nout_dir=$(dirname \"$7\")\nskip=0\n{COPY_FRAMES}"
    );
    write_script(dir, "fake-decoder", &body)
}

/// Drops the leading frame on its second invocation only.
fn flaky_decoder(dir: &Path) -> PathBuf {
    let body = format!(
        "input=\"$2\"\nlimit=\"$6\"\nout_dir=$(dirname \"$7\")\n\
         calls=$(cat \"$input/.calls\" 2>/dev/null || echo 0)\n\
         calls=$((calls + 1))\n\
         echo \"$calls\" > \"$input/.calls\"\n\
         skip=0\n\
         if [ \"$calls\" -eq 2 ]; then skip=1; fi\n\
         {COPY_FRAMES}"
    );
    write_script(dir, "flaky-decoder", &body)
}

fn config(scratch: &Path) -> RunConfig {
    RunConfig {
        scratch_root: scratch.to_path_buf(),
        decode_frames: FIXTURE_FRAMES,
        artifact_path: None,
        ..RunConfig::default()
    }
}

struct Setup {
    _root: tempfile::TempDir,
    fixture: PathBuf,
    tools: PathBuf,
    scratch: PathBuf,
}

fn setup() -> Setup {
    let root = tempfile::tempdir().expect("root");
    let fixture = root.path().join("fixture");
    let tools = root.path().join("tools");
    let scratch = root.path().join("scratch");
    for dir in [&fixture, &tools, &scratch] {
        fs::create_dir_all(dir).expect("mkdir");
    }
    write_fixture(&fixture);
    Setup {
        _root: root,
        fixture,
        tools,
        scratch,
    }
}

#[test]
fn stable_decoder_matches_direct_pattern_read() {
    let _lock = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let env = setup();
    let decoder = copying_decoder(&env.tools);
    let config = config(&env.scratch);
    let workspace = RunWorkspace::create(&config).expect("workspace");

    let command = DecodeCommand::new(decoder.to_string_lossy(), &env.fixture);
    let mut producer = ExternalDecode::new(command, &config, true, &workspace).expect("producer");
    let report = check_determinism(&mut producer, 3).expect("stable");
    assert!(report.is_stable());
    assert_eq!(report.digests.len(), FIXTURE_FRAMES);

    let pattern = env
        .fixture
        .join("frames%06d.png")
        .to_string_lossy()
        .into_owned();
    let mut reader = FileOpener.open(&Source::new("png", pattern)).expect("open");
    let first = reader.first();
    let direct = collect(
        reader.as_mut(),
        first,
        &AccessOrder::sequential(FIXTURE_FRAMES),
        config.stride,
    )
    .expect("collect");
    assert_eq!(report.digests, direct);

    let leftovers = fs::read_dir(workspace.path()).expect("read_dir").count();
    assert_eq!(leftovers, 0, "per-round directories are removed");
    let workspace_path = workspace.path().to_path_buf();
    workspace.close().expect("close");
    assert!(!workspace_path.exists());
}

#[test]
fn flaky_leading_frame_is_classified_as_missing() {
    let _lock = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let env = setup();
    let decoder = flaky_decoder(&env.tools);
    let config = config(&env.scratch);
    let workspace = RunWorkspace::create(&config).expect("workspace");

    let command = DecodeCommand::new(decoder.to_string_lossy(), &env.fixture);
    let mut producer = ExternalDecode::new(command, &config, true, &workspace).expect("producer");
    let report = check_determinism(&mut producer, 3).expect("known mismatch");
    assert_eq!(report.known.len(), 2);
    assert!(
        report
            .known
            .iter()
            .all(|m| m.kind == MismatchKind::Frame0Missing)
    );
}

#[test]
fn failing_decoder_reports_exit_code() {
    let _lock = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let env = setup();
    let decoder = write_script(&env.tools, "broken-decoder", "exit 3\n");
    let config = config(&env.scratch);
    let workspace = RunWorkspace::create(&config).expect("workspace");

    let command = DecodeCommand::new(decoder.to_string_lossy(), &env.fixture);
    let mut producer = ExternalDecode::new(command, &config, true, &workspace).expect("producer");
    let err = check_determinism(&mut producer, 2).expect_err("decoder failed");
    assert!(matches!(
        err,
        HarnessError::ExternalToolFailure { code: Some(3), .. }
    ));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn absent_decoder_is_rejected_up_front() {
    let env = setup();
    let config = config(&env.scratch);
    let workspace = RunWorkspace::create(&config).expect("workspace");
    let command = DecodeCommand::new(
        env.tools.join("not-installed").to_string_lossy(),
        &env.fixture,
    );
    let err = ExternalDecode::new(command, &config, true, &workspace).expect_err("missing");
    assert!(matches!(err, HarnessError::MissingCommand { .. }));
}
