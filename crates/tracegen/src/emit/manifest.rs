//! Generation manifest.
//!
//! Written next to the generated modules so a later run can tell whether a
//! module was edited by hand or produced from different inputs.

use crate::cover::CoverageReport;
use crate::error::{TracegenError, TracegenResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// blake3 hex digest of text.
#[must_use]
pub fn hash_contents(contents: &str) -> String {
    blake3::hash(contents.as_bytes()).to_hex().to_string()
}

/// blake3 hex digest over several inputs, each length-prefixed.
#[must_use]
pub fn hash_inputs<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().to_hex().to_string()
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the manifest
    pub file: String,
    /// blake3 hex digest of the file
    pub digest: String,
    /// Test methods in the file
    pub traces: usize,
}

/// Record of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationManifest {
    /// Manifest format version
    pub manifest_version: u32,
    /// Tool name
    pub tool: String,
    /// Tool version
    pub version: String,
    /// Digest over the input documents
    pub input_digest: String,
    /// Requested coverage fraction
    pub requested_pct: f64,
    /// Achieved coverage fraction
    pub achieved_pct: f64,
    /// Covering paths emitted
    pub path_count: usize,
    /// Generated files in the order first written
    pub files: Vec<ManifestEntry>,
}

impl GenerationManifest {
    /// Current manifest format version.
    pub const VERSION: u32 = 1;

    /// Conventional file name inside the output directory.
    pub const FILE_NAME: &'static str = "tracegen.manifest.json";

    /// Manifest for a run over inputs hashing to `input_digest`.
    #[must_use]
    pub fn new(input_digest: impl Into<String>, report: &CoverageReport) -> Self {
        Self {
            manifest_version: Self::VERSION,
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_digest: input_digest.into(),
            requested_pct: report.requested_pct,
            achieved_pct: report.achieved_pct(),
            path_count: report.path_count,
            files: Vec::new(),
        }
    }

    /// Record a generated file.
    pub fn push(&mut self, file: impl Into<String>, digest: impl Into<String>, traces: usize) {
        self.files.push(ManifestEntry {
            file: file.into(),
            digest: digest.into(),
            traces,
        });
    }

    /// Whether `other` records a run over the same inputs and cover.
    #[must_use]
    pub fn same_run(&self, other: &Self) -> bool {
        self.manifest_version == other.manifest_version
            && self.input_digest == other.input_digest
            && self.requested_pct.to_bits() == other.requested_pct.to_bits()
            && self.path_count == other.path_count
    }

    /// Keep the entries of `previous` for files this run did not write.
    ///
    /// Entries this run rewrote take their old position. Nothing is kept when
    /// `previous` describes a different run; returns whether it was merged.
    pub fn merge_previous(&mut self, previous: Self) -> bool {
        if !self.same_run(&previous) {
            return false;
        }
        let mut files = previous.files;
        for entry in std::mem::take(&mut self.files) {
            match files.iter_mut().find(|old| old.file == entry.file) {
                Some(old) => *old = entry,
                None => files.push(entry),
            }
        }
        self.files = files;
        true
    }

    /// Write as pretty JSON.
    pub fn write(&self, path: &Path) -> TracegenResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read from JSON.
    pub fn read(path: &Path) -> TracegenResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Check every listed file in `dir` against its recorded digest.
    pub fn verify(&self, dir: &Path) -> TracegenResult<()> {
        for entry in &self.files {
            let contents = std::fs::read_to_string(dir.join(&entry.file))?;
            let actual = hash_contents(&contents);
            if actual != entry.digest {
                return Err(TracegenError::DigestMismatch {
                    file: entry.file.clone(),
                    expected: entry.digest.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> CoverageReport {
        CoverageReport {
            strategy: "greedy-longest-first".into(),
            total_targets: 4,
            covered: 4,
            requested_pct: 1.0,
            uncovered: Vec::new(),
            unreachable: 0,
            path_count: 2,
            average_path_len: 3.0,
        }
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_contents("x = 1"), hash_contents("x = 1"));
        assert_ne!(hash_contents("x = 1"), hash_contents("x = 2"));
    }

    #[test]
    fn test_hash_inputs_respects_boundaries() {
        let a = hash_inputs([b"ab".as_slice(), b"c".as_slice()]);
        let b = hash_inputs([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_write_read_verify() {
        let dir = TempDir::new().unwrap();
        let text = "def test_trace_0(self):\n    pass\n";
        std::fs::write(dir.path().join("model_tests_1.py"), text).unwrap();

        let mut manifest = GenerationManifest::new("abc", &report());
        manifest.push("model_tests_1.py", hash_contents(text), 1);
        let path = dir.path().join(GenerationManifest::FILE_NAME);
        manifest.write(&path).unwrap();

        let loaded = GenerationManifest::read(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.tool, "tracegen");
        loaded.verify(dir.path()).unwrap();
    }

    #[test]
    fn test_merge_keeps_other_shards() {
        let mut first = GenerationManifest::new("abc", &report());
        first.push("model_tests_1.py", "d1", 1);
        first.push("model_tests_2.py", "stale", 1);

        let mut second = GenerationManifest::new("abc", &report());
        second.push("model_tests_2.py", "d2", 1);
        second.push("model_tests_3.py", "d3", 0);
        assert!(second.merge_previous(first));

        let files: Vec<_> = second.files.iter().map(|e| (e.file.as_str(), e.digest.as_str())).collect();
        assert_eq!(
            files,
            vec![
                ("model_tests_1.py", "d1"),
                ("model_tests_2.py", "d2"),
                ("model_tests_3.py", "d3"),
            ]
        );
    }

    #[test]
    fn test_merge_skips_other_inputs() {
        let mut old = GenerationManifest::new("abc", &report());
        old.push("model_tests_1.py", "d1", 1);

        let mut fresh = GenerationManifest::new("def", &report());
        fresh.push("model_tests_2.py", "d2", 1);
        assert!(!fresh.merge_previous(old));
        assert_eq!(fresh.files.len(), 1);
        assert_eq!(fresh.files[0].file, "model_tests_2.py");
    }

    #[test]
    fn test_verify_detects_edit() {
        let dir = TempDir::new().unwrap();
        let mut manifest = GenerationManifest::new("abc", &report());
        manifest.push("model_tests_1.py", hash_contents("original"), 1);
        std::fs::write(dir.path().join("model_tests_1.py"), "edited").unwrap();

        let err = manifest.verify(dir.path()).unwrap_err();
        assert!(matches!(err, TracegenError::DigestMismatch { ref file, .. } if file == "model_tests_1.py"));
    }
}
