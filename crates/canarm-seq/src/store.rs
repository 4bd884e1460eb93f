//! JSON sequence store
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/json/<name>.json      one recorded sequence per file
//! <root>/<merged>.json         {"joint_sequences": [left, right]}
//! <root>/.recording.json       pending way-points per interface
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use canarm_core::{JointAngleSet, JointSequence, MergedSequences, Side};
use serde::Serialize;

use crate::error::{SequenceError, SequenceResult};
use crate::recording::RecordingBuffer;
use crate::transform::{file_safe_name, MergeDirection, MergeOutcome, MergedPair};

const SEQUENCE_DIR: &str = "json";
const RECORDING_FILE: &str = ".recording.json";

/// Merged file found at the store root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedFileInfo {
    /// File name including the `.json` extension
    pub file_name: String,
    /// File name without extension
    pub name: String,
    pub direction: MergeDirection,
}

/// Filesystem store for recorded and merged sequences
#[derive(Debug, Clone)]
pub struct SequenceStore {
    root: PathBuf,
}

impl SequenceStore {
    /// Open a store, creating the sequence directory if needed
    pub fn open(root: impl Into<PathBuf>) -> SequenceResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(SEQUENCE_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sequence_path(&self, name: &str) -> PathBuf {
        self.root
            .join(SEQUENCE_DIR)
            .join(format!("{}.json", file_safe_name(name)))
    }

    fn merged_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_safe_name(name)))
    }

    // =========================================================================
    // Recorded sequences
    // =========================================================================

    /// Write one sequence to `json/<name>.json`, replacing any previous file
    pub fn save(&self, sequence: &JointSequence) -> SequenceResult<PathBuf> {
        let path = self.sequence_path(&sequence.name);
        fs::write(&path, serde_json::to_vec_pretty(sequence)?)?;
        tracing::info!(
            name = %sequence.name,
            side = %sequence.side,
            waypoints = sequence.len(),
            path = %path.display(),
            "Saved sequence"
        );
        Ok(path)
    }

    /// Every readable sequence, ordered by file name
    ///
    /// Files that cannot be read or parsed are skipped with a warning.
    pub fn load_all(&self) -> SequenceResult<Vec<JointSequence>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(self.root.join(SEQUENCE_DIR))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut sequences = Vec::with_capacity(paths.len());
        for path in paths {
            match read_json::<JointSequence>(&path) {
                Ok(sequence) => sequences.push(sequence),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable sequence file")
                }
            }
        }
        Ok(sequences)
    }

    /// Sequence with exactly this name
    pub fn find(&self, name: &str) -> SequenceResult<JointSequence> {
        self.load_all()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SequenceError::NotFound(name.to_string()))
    }

    /// Sequence with this name recorded for `side`
    pub fn find_for_side(&self, name: &str, side: Side) -> SequenceResult<JointSequence> {
        self.load_all()?
            .into_iter()
            .find(|s| s.name == name && s.side == side)
            .ok_or_else(|| SequenceError::NotFound(format!("{} ({} arm)", name, side)))
    }

    /// Remove `json/<name>.json`; a missing file is not an error
    pub fn delete(&self, name: &str) -> SequenceResult<()> {
        match fs::remove_file(self.sequence_path(name)) {
            Ok(()) => {
                tracing::info!(name, "Deleted sequence");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Merged pairs
    // =========================================================================

    /// Write a pair to `<root>/<name>.json`
    pub fn save_merged(&self, pair: &MergedPair) -> SequenceResult<PathBuf> {
        let path = self.merged_path(&pair.name);
        fs::write(&path, serde_json::to_vec_pretty(&pair.sequences)?)?;
        tracing::info!(
            name = %pair.name,
            sequences = pair.sequences.joint_sequences.len(),
            path = %path.display(),
            "Saved merged sequences"
        );
        Ok(path)
    }

    /// Persist a merge: the primary pair, then the derived descending pair
    ///
    /// A failure to write the derived pair is logged and does not undo the
    /// primary file; only the written paths are returned.
    pub fn save_merge(&self, outcome: &MergeOutcome) -> SequenceResult<Vec<PathBuf>> {
        let mut written = vec![self.save_merged(&outcome.primary)?];
        if let Some(derived) = &outcome.derived_descending {
            match self.save_merged(derived) {
                Ok(path) => written.push(path),
                Err(e) => {
                    tracing::warn!(name = %derived.name, error = %e, "Failed to save derived descending sequences")
                }
            }
        }
        Ok(written)
    }

    /// Load a merged file by name, with or without `.json`
    pub fn load_merged(&self, file_name: &str) -> SequenceResult<MergedSequences> {
        let file_name = if file_name.ends_with(".json") {
            file_name.to_string()
        } else {
            format!("{}.json", file_name)
        };
        let path = self.root.join(&file_name);
        if !path.is_file() {
            return Err(SequenceError::NotFound(file_name));
        }
        read_json(&path)
    }

    /// Merged files at the root: name mentions up or down and the file holds
    /// both a left and a right sequence
    pub fn list_merged(&self) -> SequenceResult<Vec<MergedFileInfo>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let lower = file_name.to_lowercase();
            if !lower.contains("up") && !lower.contains("down") {
                continue;
            }
            let Ok(merged) = read_json::<MergedSequences>(&path) else {
                continue;
            };
            if !merged.is_pair() {
                continue;
            }
            let direction = if lower.contains("up") {
                MergeDirection::Ascending
            } else {
                MergeDirection::Descending
            };
            found.push(MergedFileInfo {
                file_name: file_name.to_string(),
                name: file_name.trim_end_matches(".json").to_string(),
                direction,
            });
        }
        found.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(found)
    }

    // =========================================================================
    // Pending recordings
    // =========================================================================

    /// Restore the recording buffer left by a previous run
    pub fn load_recording(&self) -> SequenceResult<RecordingBuffer> {
        let path = self.root.join(RECORDING_FILE);
        if !path.is_file() {
            return Ok(RecordingBuffer::new());
        }
        let records: HashMap<String, Vec<JointAngleSet>> = read_json(&path)?;
        Ok(RecordingBuffer::from_snapshot(records))
    }

    /// Persist the recording buffer so later runs can continue it
    pub fn save_recording(&self, buffer: &RecordingBuffer) -> SequenceResult<()> {
        let path = self.root.join(RECORDING_FILE);
        fs::write(path, serde_json::to_vec_pretty(&buffer.snapshot())?)?;
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> SequenceResult<T> {
    let content = fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}
