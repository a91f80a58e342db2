// --- Файл: src/data/dataset.rs ---

//! Определение трейта Dataset и базовые реализации.

use super::transforms::Transform;
use crate::error::{DataError, Result};
use ndarray::{ArrayD, Axis};
use std::sync::Arc;

/// Трейт для источников данных.
///
/// Каждый датасет должен уметь:
/// - Возвращать количество элементов
/// - Возвращать элемент по индексу
pub trait Dataset: Send + Sync {
    /// Тип элемента данных (features)
    type Item;
    /// Тип метки (label)
    type Label;

    /// Возвращает количество элементов в датасете.
    fn len(&self) -> usize;

    /// Проверяет, пуст ли датасет.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Возвращает элемент и метку по индексу.
    fn get(&self, index: usize) -> Option<(Self::Item, Self::Label)>;

    /// Возвращает только метку по индексу.
    fn get_label(&self, index: usize) -> Option<Self::Label> {
        self.get(index).map(|(_, label)| label)
    }
}

/// Разделяемый датасет: несколько подмножеств читают один источник без копирования.
impl<D: Dataset + ?Sized> Dataset for Arc<D> {
    type Item = D::Item;
    type Label = D::Label;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Option<(Self::Item, Self::Label)> {
        (**self).get(index)
    }

    fn get_label(&self, index: usize) -> Option<Self::Label> {
        (**self).get_label(index)
    }
}

/// Датасет, хранящий данные в памяти.
///
/// Признаки лежат в одном массиве формы `[num_samples, ...]`,
/// метки классов - в отдельном векторе.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    features: Arc<ArrayD<f32>>,
    labels: Arc<Vec<usize>>,
}

impl InMemoryDataset {
    /// Создает новый датасет из массива признаков и меток классов.
    ///
    /// Возвращает ошибку, если количество образцов не совпадает.
    pub fn new(features: ArrayD<f32>, labels: Vec<usize>) -> Result<Self> {
        let num_samples = features.shape().first().copied().unwrap_or(0);
        if num_samples != labels.len() {
            return Err(DataError::ShapeMismatch {
                expected: vec![num_samples],
                actual: vec![labels.len()],
            });
        }

        Ok(Self {
            features: Arc::new(features),
            labels: Arc::new(labels),
        })
    }

    /// Возвращает форму признаков (без batch dimension).
    pub fn feature_shape(&self) -> Vec<usize> {
        self.features.shape().get(1..).map(<[usize]>::to_vec).unwrap_or_default()
    }
}

impl Dataset for InMemoryDataset {
    type Item = ArrayD<f32>;
    type Label = usize;

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Option<(Self::Item, Self::Label)> {
        let label = *self.labels.get(index)?;
        let feature = self.features.index_axis(Axis(0), index).to_owned();
        Some((feature, label))
    }

    fn get_label(&self, index: usize) -> Option<Self::Label> {
        self.labels.get(index).copied()
    }
}

/// Датасет с применением преобразования к каждому образцу.
///
/// Преобразование выполняется на лету при каждом `get`, поэтому случайные
/// аугментации дают новый результат в каждой эпохе.
pub struct MapDataset<D> {
    inner: D,
    transform: Arc<dyn Transform>,
}

impl<D> MapDataset<D>
where
    D: Dataset<Item = ArrayD<f32>>,
{
    /// Создает новый MapDataset с преобразованием.
    pub fn new<T: Transform + 'static>(dataset: D, transform: T) -> Self {
        Self {
            inner: dataset,
            transform: Arc::new(transform),
        }
    }

    /// Исходный датасет без преобразования.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D> Dataset for MapDataset<D>
where
    D: Dataset<Item = ArrayD<f32>>,
{
    type Item = ArrayD<f32>;
    type Label = D::Label;

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> Option<(Self::Item, Self::Label)> {
        self.inner
            .get(index)
            .map(|(item, label)| (self.transform.apply(item), label))
    }

    fn get_label(&self, index: usize) -> Option<Self::Label> {
        self.inner.get_label(index)
    }
}

/// Датасет с подмножеством индексов.
///
/// Не копирует данные: хранит только индексы и ссылку на родителя,
/// так что преобразование родителя сохраняется.
#[derive(Debug)]
pub struct SubsetDataset<D> {
    inner: D,
    indices: Vec<usize>,
}

impl<D: Dataset> SubsetDataset<D> {
    /// Создает подмножество датасета по указанным индексам.
    ///
    /// Все индексы должны быть меньше длины родительского датасета.
    pub fn new(dataset: D, indices: Vec<usize>) -> Result<Self> {
        let len = dataset.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(DataError::IndexOutOfRange { index, len });
        }

        Ok(Self {
            inner: dataset,
            indices,
        })
    }

    /// Индексы родителя, видимые через это подмножество.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D: Dataset> Dataset for SubsetDataset<D> {
    type Item = D::Item;
    type Label = D::Label;

    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Option<(Self::Item, Self::Label)> {
        let actual_idx = *self.indices.get(index)?;
        self.inner.get(actual_idx)
    }

    fn get_label(&self, index: usize) -> Option<Self::Label> {
        let actual_idx = *self.indices.get(index)?;
        self.inner.get_label(actual_idx)
    }
}
