// --- Файл: src/data/dataloader.rs ---

//! DataLoader - итератор по батчам данных.

use super::dataset::Dataset;
use super::sampler::{BatchSampler, RandomSampler, SequentialSampler};
use crate::error::{DataError, Result};
use crate::rng::RandomSource;
use ndarray::{Array1, ArrayD, IxDyn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// Батч данных - пара (features, labels).
#[derive(Debug, Clone)]
pub struct Batch {
    /// Признаки батча, форма `[batch, ...sample_shape]`
    pub features: ArrayD<f32>,
    /// Метки классов батча
    pub labels: Array1<usize>,
    /// Индексы образцов (в датасете загрузчика) в этом батче
    pub indices: Vec<usize>,
}

impl Batch {
    /// Возвращает размер батча.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Проверяет, пуст ли батч.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// DataLoader - удобный интерфейс для итерации по датасету батчами.
///
/// Каждый вызов [`DataLoader::iter`] начинает новую эпоху; при включенном
/// перемешивании порядок образцов в каждой эпохе новый.
///
/// # Пример
///
/// ```rust,ignore
/// let loader = DataLoader::new(dataset, 32)
///     .shuffle(true)
///     .drop_last(false);
///
/// for batch in loader.iter() {
///     let batch = batch?;
///     println!("Batch size: {}", batch.len());
/// }
/// ```
pub struct DataLoader<D> {
    dataset: D,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    pin_memory: bool,
    num_workers: usize,
    pool: Option<Arc<ThreadPool>>,
    rng: RandomSource,
}

impl<D> DataLoader<D>
where
    D: Dataset<Item = ArrayD<f32>, Label = usize>,
{
    /// Создает новый DataLoader без фоновых потоков.
    ///
    /// # Аргументы
    ///
    /// * `dataset` - Датасет для загрузки
    /// * `batch_size` - Размер батча (ноль трактуется как 1)
    pub fn new(dataset: D, batch_size: usize) -> Self {
        Self {
            dataset,
            batch_size: batch_size.max(1),
            shuffle: false,
            drop_last: false,
            pin_memory: false,
            num_workers: 0,
            pool: None,
            rng: RandomSource::default(),
        }
    }

    /// Включает/выключает перемешивание данных.
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Устанавливает, нужно ли отбрасывать последний неполный батч.
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Устанавливает seed для воспроизводимости.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = RandomSource::seeded(seed);
        self
    }

    /// Использует общий источник случайности для перемешивания.
    pub fn random_source(mut self, rng: RandomSource) -> Self {
        self.rng = rng;
        self
    }

    /// Возвращает количество батчей.
    pub fn num_batches(&self) -> usize {
        let n = self.dataset.len();
        if self.drop_last {
            n / self.batch_size
        } else {
            n.div_ceil(self.batch_size)
        }
    }

    /// Возвращает размер датасета.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Проверяет, пуст ли DataLoader.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Возвращает размер батча.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    /// Флаг pin_memory. Батчи лежат в обычной памяти хоста, флаг
    /// передается дальше потребителю, который копирует их на устройство.
    pub fn pin_memory(&self) -> bool {
        self.pin_memory
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Датасет, по которому итерирует загрузчик.
    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    /// Создает итератор по батчам (одна эпоха).
    pub fn iter(&self) -> DataLoaderIter<'_, D> {
        let n = self.dataset.len();
        let batch_sampler = if self.shuffle {
            BatchSamplerEnum::Random(BatchSampler::new(
                RandomSampler::new(n, self.rng.clone()),
                self.batch_size,
                self.drop_last,
            ))
        } else {
            BatchSamplerEnum::Sequential(BatchSampler::new(
                SequentialSampler::new(n),
                self.batch_size,
                self.drop_last,
            ))
        };

        DataLoaderIter {
            loader: self,
            batch_sampler,
        }
    }

    /// Загружает и преобразует образцы; при наличии пула - параллельно.
    fn fetch(&self, indices: &[usize]) -> Result<Vec<(ArrayD<f32>, usize)>> {
        let len = self.dataset.len();
        let get = |&index: &usize| {
            self.dataset
                .get(index)
                .ok_or(DataError::IndexOutOfRange { index, len })
        };

        match &self.pool {
            Some(pool) if indices.len() > 1 => {
                pool.install(|| indices.par_iter().map(get).collect())
            }
            _ => indices.iter().map(get).collect(),
        }
    }
}

impl<'a, D> IntoIterator for &'a DataLoader<D>
where
    D: Dataset<Item = ArrayD<f32>, Label = usize>,
{
    type Item = Result<Batch>;
    type IntoIter = DataLoaderIter<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Enum для хранения разных типов batch sampler'ов.
enum BatchSamplerEnum {
    Sequential(BatchSampler<SequentialSampler>),
    Random(BatchSampler<RandomSampler>),
}

impl Iterator for BatchSamplerEnum {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            BatchSamplerEnum::Sequential(s) => s.next(),
            BatchSamplerEnum::Random(s) => s.next(),
        }
    }
}

/// Итератор по батчам данных.
pub struct DataLoaderIter<'a, D> {
    loader: &'a DataLoader<D>,
    batch_sampler: BatchSamplerEnum,
}

impl<D> Iterator for DataLoaderIter<'_, D>
where
    D: Dataset<Item = ArrayD<f32>, Label = usize>,
{
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.batch_sampler.next()?;
        Some(
            self.loader
                .fetch(&indices)
                .and_then(|samples| collate(samples, indices)),
        )
    }
}

/// Склеивает образцы одинаковой формы в один батч.
fn collate(samples: Vec<(ArrayD<f32>, usize)>, indices: Vec<usize>) -> Result<Batch> {
    let sample_shape = samples
        .first()
        .map(|(features, _)| features.shape().to_vec())
        .unwrap_or_default();
    let sample_len: usize = sample_shape.iter().product();

    let mut data = Vec::with_capacity(samples.len() * sample_len);
    let mut labels = Vec::with_capacity(samples.len());
    for (features, label) in samples {
        if features.shape() != sample_shape.as_slice() {
            return Err(DataError::ShapeMismatch {
                expected: sample_shape,
                actual: features.shape().to_vec(),
            });
        }
        data.extend(features.iter().copied());
        labels.push(label);
    }

    let mut batch_shape = vec![labels.len()];
    batch_shape.extend(&sample_shape);
    let features = ArrayD::from_shape_vec(IxDyn(&batch_shape), data).map_err(|_| {
        DataError::ShapeMismatch {
            expected: batch_shape.clone(),
            actual: vec![labels.len() * sample_len],
        }
    })?;

    Ok(Batch {
        features,
        labels: Array1::from(labels),
        indices,
    })
}

/// Конструктор DataLoader с более гибкими опциями.
pub struct DataLoaderBuilder {
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    num_workers: usize,
    pin_memory: bool,
    rng: Option<RandomSource>,
}

impl Default for DataLoaderBuilder {
    fn default() -> Self {
        Self {
            batch_size: 1,
            shuffle: false,
            drop_last: false,
            num_workers: 0,
            pin_memory: false,
            rng: None,
        }
    }
}

impl DataLoaderBuilder {
    /// Создает новый builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Устанавливает размер батча.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Включает перемешивание.
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Устанавливает drop_last.
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Устанавливает seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Some(RandomSource::seeded(seed));
        self
    }

    /// Общий источник случайности (разделяется между загрузчиками).
    pub fn random_source(mut self, rng: RandomSource) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Количество потоков, загружающих образцы батча (0 - в текущем потоке).
    pub fn num_workers(mut self, num: usize) -> Self {
        self.num_workers = num;
        self
    }

    /// Устанавливает pin_memory.
    pub fn pin_memory(mut self, pin: bool) -> Self {
        self.pin_memory = pin;
        self
    }

    /// Строит DataLoader. Пул потоков создается здесь, один на загрузчик.
    pub fn build<D>(self, dataset: D) -> Result<DataLoader<D>>
    where
        D: Dataset<Item = ArrayD<f32>, Label = usize>,
    {
        if self.batch_size == 0 {
            return Err(DataError::InvalidBatchSize { name: "batch_size" });
        }

        let pool = if self.num_workers > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.num_workers)
                .thread_name(|i| format!("loader-worker-{i}"))
                .build()?;
            log::debug!("started loader pool with {} workers", self.num_workers);
            Some(Arc::new(pool))
        } else {
            None
        };

        let mut loader = DataLoader::new(dataset, self.batch_size)
            .shuffle(self.shuffle)
            .drop_last(self.drop_last);
        if let Some(rng) = self.rng {
            loader = loader.random_source(rng);
        }
        loader.pin_memory = self.pin_memory;
        loader.num_workers = self.num_workers;
        loader.pool = pool;

        Ok(loader)
    }
}
