//! Интеграционные тесты: полный цикл DatasetSplitLoader::build на синтетическом
//! наборе CIFAR-100, записанном во временный каталог.

use cifar_loaders::data::cifar::encode_record;
use cifar_loaders::data::download::{BASE_FOLDER, TEST_FILE, TRAIN_FILE};
use cifar_loaders::{DataError, DatasetSplitLoader, LoaderConfig};

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Записывает `n_train` и `n_test` записей; метка образца i равна i % 100.
fn write_cifar_tree(n_train: usize, n_test: usize) -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join(BASE_FOLDER);
    fs::create_dir_all(&dir).unwrap();

    let write = |file: &str, n: usize| {
        let mut bytes = Vec::new();
        for i in 0..n {
            let pixels = vec![(i % 256) as u8; 3 * 32 * 32];
            bytes.extend(encode_record((i % 20) as u8, (i % 100) as u8, &pixels));
        }
        fs::write(dir.join(file), bytes).unwrap();
    };
    write(TRAIN_FILE, n_train);
    write(TEST_FILE, n_test);
    root
}

fn config(root: &Path) -> LoaderConfig {
    LoaderConfig::default()
        .with_root(root.to_string_lossy().into_owned())
        .with_download(false)
        .with_num_workers(2)
        .with_seed(2024)
}

#[test]
fn test_build_reference_split() {
    let root = write_cifar_tree(1000, 40);
    let loaders = DatasetSplitLoader::new(config(root.path()))
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(loaders.train.len(), 950);
    assert_eq!(loaders.valid.len(), 50);
    assert_eq!(loaders.test.len(), 40);

    let train: HashSet<usize> = loaders.train.dataset().indices().iter().copied().collect();
    let valid: HashSet<usize> = loaders.valid.dataset().indices().iter().copied().collect();
    assert!(train.is_disjoint(&valid));
    assert_eq!(train.len() + valid.len(), 1000);
}

#[test]
fn test_batches_are_normalized_chw_tensors() {
    let root = write_cifar_tree(300, 20);
    let loaders = DatasetSplitLoader::new(config(root.path()).with_train_batch_size(64))
        .unwrap()
        .build()
        .unwrap();

    // ceil(285 / 64) = 5
    assert_eq!(loaders.train.num_batches(), 5);
    let sizes: Vec<usize> = loaders.train.iter().map(|b| b.unwrap().len()).collect();
    assert_eq!(sizes, vec![64, 64, 64, 64, 29]);

    let batch = loaders.test.iter().next().unwrap().unwrap();
    assert_eq!(batch.features.shape(), &[20, 3, 32, 32]);
    assert_eq!(batch.labels.to_vec(), (0..20).collect::<Vec<_>>());
    assert!(batch.features.iter().all(|v| v.is_finite()));
}

#[test]
fn test_test_loader_ignores_valid_split() {
    let root = write_cifar_tree(200, 30);
    for valid_split in [0.0, 0.3, 0.9] {
        let loaders = DatasetSplitLoader::new(config(root.path()).with_valid_split(valid_split))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(loaders.test.len(), 30);
        assert_eq!(loaders.train.len() + loaders.valid.len(), 200);
    }
}

#[test]
fn test_same_seed_same_split() {
    let root = write_cifar_tree(200, 10);
    let build = || {
        DatasetSplitLoader::new(config(root.path()).with_valid_split(0.25))
            .unwrap()
            .build()
            .unwrap()
    };
    let first = build();
    let second = build();

    assert_eq!(first.valid.dataset().indices(), second.valid.dataset().indices());
    assert_eq!(first.train.dataset().indices(), second.train.dataset().indices());

    let first_labels: Vec<usize> = first.train.iter().flat_map(|b| b.unwrap().labels.to_vec()).collect();
    let second_labels: Vec<usize> = second.train.iter().flat_map(|b| b.unwrap().labels.to_vec()).collect();
    assert_eq!(first_labels, second_labels);
}

#[test]
fn test_valid_order_is_stable_across_epochs() {
    let root = write_cifar_tree(400, 10);
    let loaders = DatasetSplitLoader::new(config(root.path()).with_valid_split(0.5))
        .unwrap()
        .build()
        .unwrap();

    let order = |valid: bool| -> Vec<usize> {
        let loader = if valid { &loaders.valid } else { &loaders.train };
        loader.iter().flat_map(|b| b.unwrap().indices).collect()
    };

    assert_eq!(order(true), order(true));
    assert_eq!(order(true), (0..200).collect::<Vec<_>>());
    assert_ne!(order(false), order(false));
}

#[test]
fn test_invalid_split_fails_before_io() {
    let config = LoaderConfig::default()
        .with_root("/nonexistent/cifar/root")
        .with_valid_split(1.0);
    let err = DatasetSplitLoader::new(config).unwrap_err();
    assert!(matches!(err, DataError::InvalidSplit(f) if f == 1.0));
    assert!(err.is_config_error());
}

#[test]
fn test_missing_files_without_download() {
    let root = tempfile::tempdir().unwrap();
    let err = DatasetSplitLoader::new(config(root.path()))
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(err, DataError::MissingFile(p) if p.ends_with(TRAIN_FILE)));
}

#[test]
fn test_config_from_json_file() {
    let root = write_cifar_tree(100, 10);
    let path = root.path().join("loader.json");
    let json = format!(
        r#"{{"valid_split": 0.2, "test_batch_size": 7, "dataset_root_path": {:?}, "download": false, "seed": 1}}"#,
        root.path().to_string_lossy()
    );
    fs::write(&path, json).unwrap();

    let config = LoaderConfig::from_json_file(&path).unwrap();
    assert_eq!(config.train_batch_size, 128);

    let loaders = DatasetSplitLoader::new(config).unwrap().build().unwrap();
    assert_eq!(loaders.valid.len(), 20);
    assert_eq!(loaders.valid.num_batches(), 3);
    assert_eq!(loaders.test.num_batches(), 2);
}
