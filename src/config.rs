//! Option set for [`DatasetSplitLoader`](crate::loaders::DatasetSplitLoader).

use crate::data::cifar::LabelKind;
use crate::error::{DataError, Result};
use crate::split::validate_fraction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Loader configuration. Every field has a default, so a JSON file only needs
/// to list the options it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Fraction of the training set withheld for validation, in `[0, 1)`.
    pub valid_split: f64,
    /// Batch size of the train loader.
    pub train_batch_size: usize,
    /// Batch size shared by the validation and test loaders.
    pub test_batch_size: usize,
    /// Where the dataset files live or get materialized. `~` is expanded.
    pub dataset_root_path: String,
    /// Worker threads per loader; 0 fetches samples on the calling thread.
    pub num_workers: usize,
    /// Seed for the split and shuffle permutations. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Fetch the training files when they are missing.
    pub download: bool,
    /// Which CIFAR-100 label set the samples carry.
    pub label_kind: LabelKind,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            valid_split: 0.05,
            train_batch_size: 128,
            test_batch_size: 128,
            dataset_root_path: "/tmp/CIFAR100".to_string(),
            num_workers: 1,
            seed: None,
            download: true,
            label_kind: LabelKind::Fine,
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON config; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_valid_split(mut self, valid_split: f64) -> Self {
        self.valid_split = valid_split;
        self
    }

    pub fn with_train_batch_size(mut self, size: usize) -> Self {
        self.train_batch_size = size;
        self
    }

    pub fn with_test_batch_size(mut self, size: usize) -> Self {
        self.test_batch_size = size;
        self
    }

    pub fn with_root<S: Into<String>>(mut self, root: S) -> Self {
        self.dataset_root_path = root.into();
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    pub fn with_label_kind(mut self, label_kind: LabelKind) -> Self {
        self.label_kind = label_kind;
        self
    }

    /// Checks the fraction and both batch sizes. Performs no I/O.
    pub fn validate(&self) -> Result<()> {
        validate_fraction(self.valid_split)?;
        if self.train_batch_size == 0 {
            return Err(DataError::InvalidBatchSize {
                name: "train_batch_size",
            });
        }
        if self.test_batch_size == 0 {
            return Err(DataError::InvalidBatchSize {
                name: "test_batch_size",
            });
        }
        Ok(())
    }

    /// Dataset root as an absolute path.
    pub fn resolved_root(&self) -> Result<PathBuf> {
        let expanded = expand_home(&self.dataset_root_path);
        Ok(std::path::absolute(expanded)?)
    }
}

/// Replaces a leading `~` with `$HOME`. Other paths are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.valid_split, 0.05);
        assert_eq!(config.train_batch_size, 128);
        assert_eq!(config.test_batch_size, 128);
        assert_eq!(config.dataset_root_path, "/tmp/CIFAR100");
        assert_eq!(config.num_workers, 1);
        assert!(config.download);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = LoaderConfig::new().with_valid_split(1.0).validate().unwrap_err();
        assert!(matches!(err, DataError::InvalidSplit(_)));
        assert!(err.is_config_error());

        let err = LoaderConfig::new().with_train_batch_size(0).validate().unwrap_err();
        assert!(matches!(err, DataError::InvalidBatchSize { name: "train_batch_size" }));

        let err = LoaderConfig::new().with_test_batch_size(0).validate().unwrap_err();
        assert!(matches!(err, DataError::InvalidBatchSize { name: "test_batch_size" }));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: LoaderConfig =
            serde_json::from_str(r#"{"valid_split": 0.1, "seed": 5}"#).unwrap();
        assert_eq!(config.valid_split, 0.1);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.train_batch_size, 128);
        assert_eq!(config.label_kind, LabelKind::Fine);
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/data"), PathBuf::from(&home).join("data"));
            assert_eq!(expand_home("~"), PathBuf::from(&home));
        }
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
        assert_eq!(expand_home("~user/x"), PathBuf::from("~user/x"));
    }

    #[test]
    fn test_resolved_root_is_absolute() {
        let config = LoaderConfig::new().with_root("relative/dir");
        assert!(config.resolved_root().unwrap().is_absolute());
    }
}
