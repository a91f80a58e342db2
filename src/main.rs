//! Command-line front end: builds the CIFAR-100 loaders and walks the
//! requested number of epochs, reporting batch counts and throughput.

use cifar_loaders::data::{DataLoader, Dataset};
use cifar_loaders::LoaderConfig;
use cifar_loaders::DatasetSplitLoader;

use clap::Parser;
use ndarray::ArrayD;
use std::path::PathBuf;
use std::time::Instant;

/// Аргументы командной строки
#[derive(Parser, Debug)]
#[command(author, version, about = "CIFAR-100 train/valid/test loaders", long_about = None)]
struct Args {
    /// JSON file with a LoaderConfig; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fraction of the training partition held out for validation
    #[arg(long)]
    valid_split: Option<f64>,

    #[arg(long)]
    train_batch_size: Option<usize>,

    /// Batch size of the validation and test loaders
    #[arg(long)]
    test_batch_size: Option<usize>,

    /// Directory holding (or receiving) cifar-100-binary/
    #[arg(short, long)]
    root: Option<String>,

    #[arg(long)]
    num_workers: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Fail instead of downloading when the files are missing
    #[arg(long)]
    no_download: bool,

    /// Number of passes over each loader
    #[arg(short, long, default_value_t = 1)]
    epochs: usize,
}

impl Args {
    fn loader_config(&self) -> cifar_loaders::Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_json_file(path)?,
            None => LoaderConfig::default(),
        };

        if let Some(valid_split) = self.valid_split {
            config = config.with_valid_split(valid_split);
        }
        if let Some(size) = self.train_batch_size {
            config = config.with_train_batch_size(size);
        }
        if let Some(size) = self.test_batch_size {
            config = config.with_test_batch_size(size);
        }
        if let Some(root) = &self.root {
            config = config.with_root(root.as_str());
        }
        if let Some(num_workers) = self.num_workers {
            config = config.with_num_workers(num_workers);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.no_download {
            config = config.with_download(false);
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = args.loader_config()?;
    log::debug!("loader config: {}", serde_json::to_string(&config)?);

    let start = Instant::now();
    let loaders = DatasetSplitLoader::new(config)?.build()?;
    println!("[SETUP] loaders ready in {:.2?}", start.elapsed());

    for (name, len, batches) in [
        ("train", loaders.train.len(), loaders.train.num_batches()),
        ("valid", loaders.valid.len(), loaders.valid.num_batches()),
        ("test", loaders.test.len(), loaders.test.num_batches()),
    ] {
        println!("[SETUP] {name:<5}: {len:>6} samples, {batches:>4} batches");
    }

    for epoch in 1..=args.epochs {
        run_epoch(epoch, "train", &loaders.train)?;
        run_epoch(epoch, "valid", &loaders.valid)?;
    }
    run_epoch(args.epochs, "test", &loaders.test)?;

    Ok(())
}

fn run_epoch<D>(epoch: usize, name: &str, loader: &DataLoader<D>) -> cifar_loaders::Result<()>
where
    D: Dataset<Item = ArrayD<f32>, Label = usize>,
{
    let start = Instant::now();
    let mut samples = 0usize;
    let mut shape = Vec::new();

    for batch in loader {
        let batch = batch?;
        samples += batch.len();
        if shape.is_empty() {
            shape = batch.features.shape().to_vec();
        }
    }

    let elapsed = start.elapsed();
    println!(
        "[EPOCH {epoch}] {name:<5}: {samples} samples in {elapsed:.2?} (first batch {shape:?}, {:.0} img/s)",
        samples as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    Ok(())
}
