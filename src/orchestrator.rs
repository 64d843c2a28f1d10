//! # Orchestrator.
//!
//! Detects which direction a conversion runs (binary → JSON or JSON →
//! binary), and drives the schema/value codec pair or the JSON projection
//! accordingly. Also walks a directory for bulk conversion: every entry is
//! converted independently, a failure is logged and recorded, and the walk
//! continues rather than aborting.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::HEADER_MAGIC;
use crate::error::{Error, Result};
use crate::{codec, json};

/// Which way a single file's bytes are about to flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    BinaryToJson,
    JsonToBinary,
}

/// One entry's outcome in a bulk (directory) conversion.
#[derive(Debug)]
pub struct ConversionReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl ConversionReport {
    fn new() -> Self {
        ConversionReport { converted: Vec::new(), failed: Vec::new() }
    }

    /// The process exit code a caller should surface: non-zero if anything failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Detects direction from the input's leading bytes (`XFS\0`) or, failing
/// that, its `.json` extension.
pub fn detect_direction(input: &Path) -> Result<Direction> {
    let mut head = [0u8; 4];
    let bytes = fs::read(input)?;
    if bytes.len() >= 4 {
        head.copy_from_slice(&bytes[..4]);
        if u32::from_le_bytes(head) == HEADER_MAGIC {
            return Ok(Direction::BinaryToJson);
        }
    }
    if input.extension().and_then(OsStr::to_str).map(|ext| ext.eq_ignore_ascii_case("json")).unwrap_or(false) {
        return Ok(Direction::JsonToBinary);
    }
    Err(Error::InvalidMagic)
}

/// The default output path for a file with no explicit `-o`: append `.json`
/// for a binary input, `.xfs` for a JSON input.
pub fn default_output_path(input: &Path, direction: Direction) -> PathBuf {
    let suffix = match direction {
        Direction::BinaryToJson => "json",
        Direction::JsonToBinary => "xfs",
    };
    let mut out = input.as_os_str().to_owned();
    out.push(".");
    out.push(suffix);
    PathBuf::from(out)
}

/// Converts one file in the direction its contents (or extension) indicate.
pub fn convert_file(input: &Path, output: &Path) -> Result<()> {
    let direction = detect_direction(input)?;
    match direction {
        Direction::BinaryToJson => {
            let bytes = fs::read(input)?;
            let doc = codec::decode(&bytes)?;
            let value = json::to_json(&doc);
            let text = serde_json::to_string_pretty(&value).map_err(|e| Error::JsonShape(e.to_string()))?;
            fs::write(output, text)?;
        }
        Direction::JsonToBinary => {
            let text = fs::read_to_string(input)?;
            let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| Error::JsonShape(e.to_string()))?;
            let doc = json::from_json(&value)?;
            let bytes = codec::encode(&doc)?;
            fs::write(output, bytes)?;
        }
    }
    tracing::info!(input = %input.display(), output = %output.display(), "converted");
    Ok(())
}

/// Top-level entry point: dispatches to single-file or bulk-directory
/// conversion depending on whether `input` is a directory.
///
/// For a directory, `output` must name a directory that already exists — the
/// orchestrator never creates one on the caller's behalf. For a single file,
/// `output` is optional; when absent the default path from
/// [`default_output_path`] is used.
pub fn convert_path(input: &Path, output: Option<&Path>) -> Result<ConversionReport> {
    if input.is_dir() {
        let output_dir = output.ok_or_else(|| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, "bulk mode requires an output directory"))
        })?;
        if !output_dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("output directory {} does not exist", output_dir.display()),
            )));
        }
        return convert_directory(input, output_dir);
    }

    let output_path = match output {
        Some(path) if path.is_dir() => {
            let direction = detect_direction(input)?;
            let name = input.file_name().ok_or_else(|| {
                Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, "input has no file name"))
            })?;
            path.join(name).with_extension(match direction {
                Direction::BinaryToJson => "json",
                Direction::JsonToBinary => "xfs",
            })
        }
        Some(path) => path.to_path_buf(),
        None => default_output_path(input, detect_direction(input)?),
    };

    let mut report = ConversionReport::new();
    match convert_file(input, &output_path) {
        Ok(()) => report.converted.push(input.to_path_buf()),
        Err(err) => report.failed.push((input.to_path_buf(), err)),
    }
    Ok(report)
}

/// Non-recursive directory walk: convert every entry into `output_dir`,
/// recording per-file failures without aborting the rest of the walk.
fn convert_directory(input_dir: &Path, output_dir: &Path) -> Result<ConversionReport> {
    let mut report = ConversionReport::new();

    let mut entries: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    for entry in entries {
        let direction = match detect_direction(&entry) {
            Ok(d) => d,
            Err(err) => {
                tracing::error!(path = %entry.display(), %err, "skipping file of unrecognized direction");
                report.failed.push((entry, err));
                continue;
            }
        };
        let name = match entry.file_name() {
            Some(name) => name,
            None => continue,
        };
        let out_path = output_dir.join(name).with_extension(match direction {
            Direction::BinaryToJson => "json",
            Direction::JsonToBinary => "xfs",
        });

        match convert_file(&entry, &out_path) {
            Ok(()) => report.converted.push(entry),
            Err(err) => {
                tracing::error!(path = %entry.display(), %err, "conversion failed");
                report.failed.push((entry, err));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_empty_v16(path: &Path) {
        let mut f = fs::File::create(path).unwrap();
        f.write_all(&HEADER_MAGIC.to_le_bytes()).unwrap();
        f.write_all(&16u16.to_le_bytes()).unwrap();
        f.write_all(&0u16.to_le_bytes()).unwrap();
        f.write_all(&0i64.to_le_bytes()).unwrap();
        f.write_all(&0i32.to_le_bytes()).unwrap();
        f.write_all(&0i32.to_le_bytes()).unwrap();
        f.write_all(&0u32.to_le_bytes()).unwrap();
    }

    #[test]
    fn detects_binary_direction_from_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xfs");
        write_empty_v16(&path);
        assert_eq!(detect_direction(&path).unwrap(), Direction::BinaryToJson);
    }

    #[test]
    fn detects_json_direction_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, b"{}").unwrap();
        assert_eq!(detect_direction(&path).unwrap(), Direction::JsonToBinary);
    }

    #[test]
    fn unrecognized_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.bin");
        fs::write(&path, b"not xfs").unwrap();
        assert!(matches!(detect_direction(&path), Err(Error::InvalidMagic)));
    }

    #[test]
    fn single_file_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.xfs");
        write_empty_v16(&input);

        let report = convert_path(&input, None).unwrap();
        assert!(report.all_succeeded());
        let json_path = dir.path().join("doc.xfs.json");
        assert!(json_path.exists());

        let report2 = convert_path(&json_path, None).unwrap();
        assert!(report2.all_succeeded());
        assert!(dir.path().join("doc.xfs.json.xfs").exists());
    }

    #[test]
    fn bulk_mode_requires_existing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("in");
        fs::create_dir(&input_dir).unwrap();
        let missing_output = dir.path().join("out");

        let result = convert_path(&input_dir, Some(&missing_output));
        assert!(result.is_err());
    }

    #[test]
    fn bulk_mode_converts_every_entry_and_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("in");
        let output_dir = dir.path().join("out");
        fs::create_dir(&input_dir).unwrap();
        fs::create_dir(&output_dir).unwrap();

        write_empty_v16(&input_dir.join("a.xfs"));
        fs::write(input_dir.join("bad.xfs"), b"not really xfs!!").unwrap();

        let report = convert_path(&input_dir, Some(&output_dir)).unwrap();
        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(output_dir.join("a.json").exists());
    }
}
