//! CIFAR-100 over the binary distribution.
//!
//! Each record in `train.bin` (50 000 records) and `test.bin` (10 000) is
//! 3074 bytes:
//!
//! ```text
//! coarse label (u8) | fine label (u8) | 1024 R | 1024 G | 1024 B
//! ```
//!
//! with every colour plane stored row-major, 32x32. Images are kept in
//! memory as `[n, 32, 32, 3]` bytes so that geometric augmentations see the
//! `[H, W, C]` layout before [`ToTensor`](super::transforms::ToTensor).

use super::dataset::Dataset;
use super::download::{self, BASE_FOLDER, TEST_FILE, TRAIN_FILE};
use crate::error::{DataError, Result};
use ndarray::{Array4, ArrayD, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Per-channel mean of the CIFAR-100 training images, in `[0, 1]` scale.
pub const MEAN: [f32; 3] = [0.5071, 0.4867, 0.4408];
/// Per-channel standard deviation of the CIFAR-100 training images.
pub const STD: [f32; 3] = [0.2675, 0.2565, 0.2761];

pub const NUM_CLASSES: usize = 100;
pub const NUM_COARSE_CLASSES: usize = 20;
pub const IMAGE_SIZE: usize = 32;
pub const CHANNELS: usize = 3;

const PIXELS_PER_IMAGE: usize = CHANNELS * IMAGE_SIZE * IMAGE_SIZE;
const RECORD_LEN: usize = 2 + PIXELS_PER_IMAGE;

/// Which label set a sample carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    /// 100 fine-grained classes.
    #[default]
    Fine,
    /// 20 superclasses.
    Coarse,
}

impl LabelKind {
    pub fn num_classes(self) -> usize {
        match self {
            LabelKind::Fine => NUM_CLASSES,
            LabelKind::Coarse => NUM_COARSE_CLASSES,
        }
    }

    fn names_file(self) -> &'static str {
        match self {
            LabelKind::Fine => "fine_label_names.txt",
            LabelKind::Coarse => "coarse_label_names.txt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cifar100Options {
    /// Training partition (`train.bin`) when true, test partition otherwise.
    pub train: bool,
    /// Materialize the files under the root when they are missing.
    pub download: bool,
    pub label_kind: LabelKind,
}

impl Default for Cifar100Options {
    fn default() -> Self {
        Self {
            train: true,
            download: false,
            label_kind: LabelKind::Fine,
        }
    }
}

/// In-memory CIFAR-100 partition. `get` returns the raw `[32, 32, 3]` image
/// with values in `0..=255` and the class id.
#[derive(Debug)]
pub struct Cifar100 {
    images: Array4<u8>,
    labels: Vec<u8>,
    label_kind: LabelKind,
    train: bool,
    classes: Vec<String>,
}

impl Cifar100 {
    /// Loads one partition from `root`, materializing it first when
    /// `options.download` is set.
    pub fn new<P: AsRef<Path>>(root: P, options: Cifar100Options) -> Result<Self> {
        let root = root.as_ref();
        if options.download {
            download::materialize(root)?;
        }

        let dir = root.join(BASE_FOLDER);
        let file = dir.join(if options.train { TRAIN_FILE } else { TEST_FILE });
        if !file.is_file() {
            return Err(DataError::MissingFile(file));
        }

        let bytes = fs::read(&file)?;
        let mut dataset = Self::parse(&bytes, &file, options)?;
        dataset.classes = read_class_names(&dir.join(options.label_kind.names_file()))?;

        log::info!(
            "loaded CIFAR-100 {} partition: {} images from {}",
            if options.train { "train" } else { "test" },
            dataset.len(),
            file.display()
        );
        Ok(dataset)
    }

    /// Builds a partition from the contents of a `.bin` file.
    pub fn from_bytes(bytes: &[u8], options: Cifar100Options) -> Result<Self> {
        Self::parse(bytes, Path::new("<memory>"), options)
    }

    fn parse(bytes: &[u8], path: &Path, options: Cifar100Options) -> Result<Self> {
        let format_error = |reason: String| DataError::Format {
            path: path.to_path_buf(),
            reason,
        };

        if bytes.is_empty() || bytes.len() % RECORD_LEN != 0 {
            return Err(format_error(format!(
                "size {} is not a positive multiple of the {RECORD_LEN}-byte record",
                bytes.len()
            )));
        }

        let n = bytes.len() / RECORD_LEN;
        let mut images = Array4::<u8>::zeros((n, IMAGE_SIZE, IMAGE_SIZE, CHANNELS));
        let mut labels = Vec::with_capacity(n);

        for (i, record) in bytes.chunks_exact(RECORD_LEN).enumerate() {
            let (coarse, fine) = (record[0], record[1]);
            if usize::from(coarse) >= NUM_COARSE_CLASSES || usize::from(fine) >= NUM_CLASSES {
                return Err(format_error(format!(
                    "record {i} has labels coarse={coarse} fine={fine} out of range"
                )));
            }
            labels.push(match options.label_kind {
                LabelKind::Fine => fine,
                LabelKind::Coarse => coarse,
            });

            let planar = ArrayView3::from_shape((CHANNELS, IMAGE_SIZE, IMAGE_SIZE), &record[2..])
                .map_err(|e| format_error(e.to_string()))?;
            images
                .index_axis_mut(Axis(0), i)
                .assign(&planar.permuted_axes([1, 2, 0]));
        }

        Ok(Self {
            images,
            labels,
            label_kind: options.label_kind,
            train: options.train,
            classes: Vec::new(),
        })
    }

    /// Class names in label order; empty when the names file was not found.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_train(&self) -> bool {
        self.train
    }

    pub fn label_kind(&self) -> LabelKind {
        self.label_kind
    }

    pub fn num_classes(&self) -> usize {
        self.label_kind.num_classes()
    }

    /// Raw `[32, 32, 3]` pixels of sample `index`.
    pub fn image_u8(&self, index: usize) -> Option<ArrayView3<'_, u8>> {
        (index < self.labels.len()).then(|| self.images.index_axis(Axis(0), index))
    }
}

impl Dataset for Cifar100 {
    type Item = ArrayD<f32>;
    type Label = usize;

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Option<(Self::Item, Self::Label)> {
        let image = self.image_u8(index)?;
        Some((image.mapv(f32::from).into_dyn(), usize::from(self.labels[index])))
    }

    fn get_label(&self, index: usize) -> Option<Self::Label> {
        self.labels.get(index).map(|&label| usize::from(label))
    }
}

/// One name per non-empty line.
fn read_class_names(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Encodes one binary record from planar `[3, 32, 32]` pixels.
pub fn encode_record(coarse: u8, fine: u8, planar_pixels: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(RECORD_LEN);
    record.push(coarse);
    record.push(fine);
    record.extend_from_slice(planar_pixels);
    record.resize(RECORD_LEN, 0);
    record
}
