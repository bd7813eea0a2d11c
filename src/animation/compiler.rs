//! Offline compilation of a frame source into a [`CompiledAsset`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use super::asset::CompiledAsset;
use super::recorder::{AssetStats, RecorderConfig};
use crate::compute::FrameQuantizer;
use crate::schema::DEFAULT_FRAME_DURATION_MS;
use crate::source::{FrameSource, FrameStream, SourceError, decode_frames};

/// Errors that abort a single compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("Could not open source: {0}")]
    Open(#[source] SourceError),
    #[error("Frame {index} failed to decode: {source}")]
    Decode { index: usize, source: SourceError },
    #[error("Source produced no decodable frames")]
    NoFrames,
    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Invalid command line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Expected 2 or 3 arguments, got {0}")]
    ArgumentCount(usize),
    #[error("Frame limit must be a positive integer, got `{0}`")]
    FrameLimit(String),
}

/// Parsed `input output [frame-limit]` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub frame_limit: Option<usize>,
}

impl CompileArgs {
    /// Parse positional arguments (program name excluded).
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, UsageError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let (input, output, limit) = match args.as_slice() {
            [input, output] => (*input, *output, None),
            [input, output, limit] => (*input, *output, Some(*limit)),
            _ => return Err(UsageError::ArgumentCount(args.len())),
        };

        let frame_limit = limit
            .map(|raw| match raw.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(UsageError::FrameLimit(raw.to_string())),
            })
            .transpose()?;

        Ok(Self {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            frame_limit,
        })
    }
}

/// Run `source` once and quantize up to `frame_limit` frames.
pub fn compile(
    source: &mut dyn FrameSource,
    quantizer: &FrameQuantizer,
    frame_limit: Option<usize>,
) -> Result<CompiledAsset, CompileError> {
    let stream = source.acquire().map_err(|e| match e {
        SourceError::Empty => CompileError::NoFrames,
        other => CompileError::Open(other),
    })?;

    let mut asset = CompiledAsset::new();
    for (index, frame) in stream.take(frame_limit.unwrap_or(usize::MAX)).enumerate() {
        let decoded = frame.map_err(|source| CompileError::Decode { index, source })?;
        asset.push(quantizer.quantize(&decoded.frame), decoded.duration_ms);
    }

    if asset.is_empty() {
        return Err(CompileError::NoFrames);
    }
    info!("Compiled {} frames", asset.len());
    Ok(asset)
}

/// Animated image file decoded lazily, so a frame limit skips the tail.
struct ImageFile {
    path: PathBuf,
    default_duration_ms: u32,
}

impl FrameSource for ImageFile {
    fn acquire(&mut self) -> Result<FrameStream, SourceError> {
        let bytes = fs::read(&self.path)?;
        decode_frames(bytes, self.default_duration_ms)
    }
}

/// Compile the file at `args.input` and write it to `args.output`.
pub fn compile_file(
    args: &CompileArgs,
    config: &RecorderConfig,
) -> Result<AssetStats, CompileError> {
    if !args.input.is_file() {
        return Err(CompileError::MissingInput(args.input.clone()));
    }

    let mut source = ImageFile {
        path: args.input.clone(),
        default_duration_ms: DEFAULT_FRAME_DURATION_MS,
    };
    let asset = compile(&mut source, &FrameQuantizer::default(), args.frame_limit)?;
    write_asset(&asset, &args.output, config)
}

fn write_asset(
    asset: &CompiledAsset,
    path: &Path,
    config: &RecorderConfig,
) -> Result<AssetStats, CompileError> {
    asset.save(path, config).map_err(|source| CompileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{CELL_COUNT, DISPLAY_HEIGHT, DISPLAY_WIDTH};
    use crate::source::test_utils::{ScriptedSource, gif_bytes, solid};
    use tempfile::tempdir;

    #[test]
    fn test_two_frame_source() {
        let mut source = ScriptedSource::new(vec![Ok(vec![
            Ok(solid([255, 0, 0], 50)),
            Ok(solid([0, 0, 255], 75)),
        ])]);
        let asset = compile(&mut source, &FrameQuantizer::default(), None).unwrap();

        assert_eq!(asset.len(), 2);
        assert_eq!(asset.durations(), &[50, 75]);
        for frame in asset.frames() {
            assert_eq!(frame.cells().len(), CELL_COUNT);
            assert_eq!(frame.rows().count(), DISPLAY_HEIGHT);
            assert!(frame.rows().all(|row| row.len() == DISPLAY_WIDTH));
        }
    }

    #[test]
    fn test_frame_limit_keeps_first_frames() {
        let frames = (1..=10).map(|i| Ok(solid([0, 0, 0], i))).collect();
        let mut source = ScriptedSource::new(vec![Ok(frames)]);

        let asset = compile(&mut source, &FrameQuantizer::default(), Some(3)).unwrap();
        assert_eq!(asset.durations(), &[1, 2, 3]);
    }

    #[test]
    fn test_zero_frames_fails() {
        let mut source = ScriptedSource::new(vec![Ok(Vec::new())]);
        assert!(matches!(
            compile(&mut source, &FrameQuantizer::default(), None),
            Err(CompileError::NoFrames)
        ));
    }

    #[test]
    fn test_mid_stream_failure_aborts() {
        let mut source = ScriptedSource::new(vec![Ok(vec![
            Ok(solid([1, 1, 1], 10)),
            Err(SourceError::Decode("bad block".into())),
        ])]);
        assert!(matches!(
            compile(&mut source, &FrameQuantizer::default(), None),
            Err(CompileError::Decode { index: 1, .. })
        ));
    }

    #[test]
    fn test_parse_args() {
        let args = CompileArgs::parse(&["in.gif", "out.json", "3"]).unwrap();
        assert_eq!(args.frame_limit, Some(3));
        assert_eq!(args.output, PathBuf::from("out.json"));

        assert_eq!(
            CompileArgs::parse(&["in.gif", "out.json"]).unwrap().frame_limit,
            None
        );
        assert_eq!(
            CompileArgs::parse(&["in.gif"]),
            Err(UsageError::ArgumentCount(1))
        );
        assert_eq!(
            CompileArgs::parse(&["a", "b", "c", "d"]),
            Err(UsageError::ArgumentCount(4))
        );
        assert_eq!(
            CompileArgs::parse(&["a", "b", "0"]),
            Err(UsageError::FrameLimit("0".into()))
        );
        assert!(CompileArgs::parse(&["a", "b", "ten"]).is_err());
    }

    #[test]
    fn test_compile_file_round_trip() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.gif");
        let output = dir.path().join("out.mxr");
        fs::write(
            &input,
            gif_bytes(&[([255, 0, 0], 50), ([0, 255, 0], 80), ([0, 0, 255], 50)], 16, 8),
        )
        .unwrap();

        let args = CompileArgs {
            input,
            output: output.clone(),
            frame_limit: Some(2),
        };
        let stats = compile_file(&args, &RecorderConfig::default()).unwrap();
        assert_eq!(stats.frame_count, 2);

        let asset = CompiledAsset::load(&output).unwrap();
        assert_eq!(asset.durations(), &[50, 80]);
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let args = CompileArgs {
            input: dir.path().join("absent.gif"),
            output: dir.path().join("out.json"),
            frame_limit: None,
        };
        assert!(matches!(
            compile_file(&args, &RecorderConfig::default()),
            Err(CompileError::MissingInput(_))
        ));
        assert!(!args.output.exists());
    }

    #[test]
    fn test_undecodable_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("notes.gif");
        fs::write(&input, b"definitely not an image").unwrap();
        let args = CompileArgs {
            input,
            output: dir.path().join("out.mxr"),
            frame_limit: None,
        };

        assert!(matches!(
            compile_file(&args, &RecorderConfig::default()),
            Err(CompileError::Open(SourceError::Decode(_)))
        ));
        assert!(!args.output.exists());
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.gif");
        fs::write(&input, gif_bytes(&[([9, 9, 9], 50)], 4, 4)).unwrap();
        let args = CompileArgs {
            input,
            output: dir.path().join("missing-dir").join("out.mxr"),
            frame_limit: None,
        };
        assert!(matches!(
            compile_file(&args, &RecorderConfig::default()),
            Err(CompileError::Write { .. })
        ));
    }
}
