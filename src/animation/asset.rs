//! In-memory compiled animation and its persisted forms.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::player::AssetPlayer;
use super::recorder::{AssetRecorder, AssetStats, RecorderConfig};
use crate::compute::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Grid, MAX_PACKED_COLOR};

/// Fully decoded and quantized animation, ready for zero-decode replay.
///
/// Frames are packed RGB565 grids; `durations` is index-aligned with them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledAsset {
    frames: Vec<Grid<u16>>,
    durations: Vec<u32>,
}

/// JSON layout: frames as rows of cells plus a parallel duration list.
#[derive(Serialize, Deserialize)]
struct JsonAsset {
    frames: Vec<Vec<Vec<u16>>>,
    durations: Vec<u32>,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn write_json(path: &Path, doc: &JsonAsset) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, doc)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

impl CompiledAsset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Grid<u16>, duration_ms: u32) {
        self.frames.push(frame);
        self.durations.push(duration_ms);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Grid<u16>] {
        &self.frames
    }

    pub fn durations(&self) -> &[u32] {
        &self.durations
    }

    /// Frame `index` and its duration.
    pub fn frame(&self, index: usize) -> Option<(&Grid<u16>, u32)> {
        Some((self.frames.get(index)?, *self.durations.get(index)?))
    }

    /// Persist to `path`. A `.json` extension selects the JSON layout,
    /// anything else the binary format.
    ///
    /// Output appears at `path` only if the whole write succeeds.
    pub fn save<P: AsRef<Path>>(&self, path: P, config: &RecorderConfig) -> io::Result<AssetStats> {
        let path = path.as_ref();
        if is_json(path) {
            return self.save_json(path);
        }

        let mut recorder = AssetRecorder::new(path, config.clone())?;
        for (frame, &ms) in self.frames.iter().zip(&self.durations) {
            recorder.record_frame(frame, ms)?;
        }
        recorder.finalize()
    }

    fn save_json(&self, path: &Path) -> io::Result<AssetStats> {
        if self.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Refusing to write an asset with no frames",
            ));
        }

        let doc = JsonAsset {
            frames: self
                .frames
                .iter()
                .map(|grid| grid.rows().map(<[u16]>::to_vec).collect())
                .collect(),
            durations: self.durations.clone(),
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!(".{name}.partial"));

        let written = write_json(&temp_path, &doc).and_then(|()| fs::rename(&temp_path, path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        let total_bytes = fs::metadata(path)?.len();
        Ok(AssetStats {
            frame_count: self.len() as u64,
            total_bytes,
            average_frame_size: total_bytes / self.len() as u64,
            compression: Default::default(),
        })
    }

    /// Load either persisted form, choosing by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if is_json(path) {
            return Self::load_json(path);
        }

        let mut player = AssetPlayer::open(path)?;
        let mut asset = Self::new();
        for frame in player.frames() {
            let (grid, ms) = frame?;
            asset.push(grid, ms);
        }
        Ok(asset)
    }

    fn load_json(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let doc: JsonAsset = serde_json::from_str(&text).map_err(io::Error::from)?;

        if doc.frames.len() != doc.durations.len() {
            return Err(invalid(format!(
                "{} frames but {} durations",
                doc.frames.len(),
                doc.durations.len()
            )));
        }
        if doc.frames.is_empty() {
            return Err(invalid("Asset contains no frames".to_string()));
        }

        let mut asset = Self::new();
        for (i, (rows, ms)) in doc.frames.into_iter().zip(doc.durations).enumerate() {
            if rows.len() != DISPLAY_HEIGHT || rows.iter().any(|r| r.len() != DISPLAY_WIDTH) {
                return Err(invalid(format!(
                    "Frame {i} is not {DISPLAY_WIDTH}x{DISPLAY_HEIGHT}"
                )));
            }
            if ms == 0 {
                return Err(invalid(format!("Frame {i} has a zero duration")));
            }
            if rows.iter().flatten().any(|&c| c > MAX_PACKED_COLOR) {
                return Err(invalid(format!(
                    "Frame {i} holds a colour above {MAX_PACKED_COLOR}"
                )));
            }
            let grid = Grid::from_cells(rows.concat()).map_err(|e| invalid(e.to_string()))?;
            asset.push(grid, ms);
        }
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::CELL_COUNT;
    use tempfile::tempdir;

    fn sample() -> CompiledAsset {
        let mut asset = CompiledAsset::new();
        let mut first = Grid::filled(0);
        first.set(63, 0, 0xF800);
        asset.push(first, 50);
        asset.push(Grid::filled(0x001F), 75);
        asset
    }

    #[test]
    fn test_binary_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mxr");

        let stats = sample().save(&path, &RecorderConfig::default()).unwrap();
        assert_eq!(stats.frame_count, 2);
        assert_eq!(CompiledAsset::load(&path).unwrap(), sample());
    }

    #[test]
    fn test_json_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.json");
        sample().save(&path, &RecorderConfig::default()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["durations"], serde_json::json!([50, 75]));
        let frames = value["frames"].as_array().unwrap();
        assert_eq!(frames.len(), 2);
        let rows = frames[0].as_array().unwrap();
        assert_eq!(rows.len(), 32);
        assert_eq!(rows[0].as_array().unwrap().len(), 64);
        assert_eq!(rows[0][63], 0xF800);

        assert_eq!(CompiledAsset::load(&path).unwrap(), sample());
    }

    #[test]
    fn test_json_rejects_misaligned_durations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let row = vec![0u16; 64];
        let doc = JsonAsset {
            frames: vec![vec![row; 32]],
            durations: vec![10, 20],
        };
        fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
        assert!(CompiledAsset::load(&path).is_err());
    }

    fn write_doc(path: &Path, cell: u16, duration_ms: u32) {
        let doc = JsonAsset {
            frames: vec![vec![vec![cell; 64]; 32]],
            durations: vec![duration_ms],
        };
        fs::write(path, serde_json::to_string(&doc).unwrap()).unwrap();
    }

    #[test]
    fn test_json_rejects_zero_duration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("zero.json");
        write_doc(&path, 0, 0);

        let err = CompiledAsset::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_json_rejects_reserved_colour() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("white.json");
        write_doc(&path, u16::MAX, 40);
        assert!(CompiledAsset::load(&path).is_err());

        write_doc(&path, MAX_PACKED_COLOR, 40);
        let asset = CompiledAsset::load(&path).unwrap();
        assert_eq!(asset.durations(), &[40]);
    }

    #[test]
    fn test_frame_lookup() {
        let asset = sample();
        let (grid, ms) = asset.frame(1).unwrap();
        assert_eq!(ms, 75);
        assert_eq!(grid.cells().len(), CELL_COUNT);
        assert!(asset.frame(2).is_none());
    }

    #[test]
    fn test_empty_asset_not_written() {
        let dir = tempdir().unwrap();
        for name in ["a.mxr", "a.json"] {
            let path = dir.path().join(name);
            assert!(CompiledAsset::new().save(&path, &RecorderConfig::default()).is_err());
            assert!(!path.exists());
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
