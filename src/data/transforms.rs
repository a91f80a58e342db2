// --- Файл: src/data/transforms.rs ---

//! Преобразования изображений для предобработки и аугментации.
//!
//! Геометрические аугментации ([`RandomCrop`], [`RandomHorizontalFlip`])
//! работают с изображением в раскладке `[H, W, C]` со значениями `0..=255`,
//! как оно хранится в датасете. [`ToTensor`] переводит его в `[C, H, W]`
//! со значениями в `[0, 1]`, после чего применяется [`Normalize`].

use ndarray::{s, Array3, ArrayD, Axis};
use rand::Rng;

/// Трейт для преобразований данных.
pub trait Transform: Send + Sync {
    /// Применяет преобразование к данным.
    fn apply(&self, data: ArrayD<f32>) -> ArrayD<f32>;
}

/// Композиция нескольких преобразований.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    /// Создает пустую композицию.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Добавляет преобразование в композицию.
    pub fn add<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for Compose {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Compose {
    fn apply(&self, mut data: ArrayD<f32>) -> ArrayD<f32> {
        for transform in &self.transforms {
            data = transform.apply(data);
        }
        data
    }
}

/// Случайная вырезка `size x size` после дополнения нулями на `padding` пикселей.
///
/// Ожидает `[H, W, C]`; данные другой размерности возвращаются без изменений.
#[derive(Debug, Clone)]
pub struct RandomCrop {
    size: usize,
    padding: usize,
}

impl RandomCrop {
    pub fn new(size: usize, padding: usize) -> Self {
        Self { size, padding }
    }
}

impl Transform for RandomCrop {
    fn apply(&self, data: ArrayD<f32>) -> ArrayD<f32> {
        if data.ndim() != 3 {
            return data;
        }
        let (h, w, c) = (data.shape()[0], data.shape()[1], data.shape()[2]);
        let pad = self.padding;

        let mut padded = Array3::<f32>::zeros((h + 2 * pad, w + 2 * pad, c));
        padded
            .slice_mut(s![pad..pad + h, pad..pad + w, ..])
            .assign(&data);

        // Если вырезка больше дополненного изображения, берем левый верхний угол
        let crop_h = self.size.min(h + 2 * pad);
        let crop_w = self.size.min(w + 2 * pad);
        let mut rng = rand::rng();
        let y0 = rng.random_range(0..=h + 2 * pad - crop_h);
        let x0 = rng.random_range(0..=w + 2 * pad - crop_w);

        padded
            .slice(s![y0..y0 + crop_h, x0..x0 + crop_w, ..])
            .to_owned()
            .into_dyn()
    }
}

/// Отражение изображения по горизонтали с вероятностью `p`.
///
/// Ожидает `[H, W, C]`: меняется порядок столбцов (ось 1).
#[derive(Debug, Clone)]
pub struct RandomHorizontalFlip {
    p: f64,
}

impl RandomHorizontalFlip {
    pub fn new(p: f64) -> Self {
        Self { p: p.clamp(0.0, 1.0) }
    }
}

impl Default for RandomHorizontalFlip {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Transform for RandomHorizontalFlip {
    fn apply(&self, data: ArrayD<f32>) -> ArrayD<f32> {
        if data.ndim() < 2 || !rand::rng().random_bool(self.p) {
            return data;
        }
        let mut flipped = data;
        flipped.invert_axis(Axis(1));
        flipped.as_standard_layout().into_owned()
    }
}

/// Перевод изображения `[H, W, C]` со значениями `0..=255`
/// в тензор `[C, H, W]` со значениями в `[0, 1]`.
#[derive(Debug, Clone, Default)]
pub struct ToTensor;

impl ToTensor {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for ToTensor {
    fn apply(&self, data: ArrayD<f32>) -> ArrayD<f32> {
        if data.ndim() != 3 {
            return data.mapv(|x| x / 255.0);
        }
        data.permuted_axes(vec![2, 0, 1])
            .as_standard_layout()
            .mapv(|x| x / 255.0)
    }
}

/// Поканальная нормализация: `(x - mean[c]) / std[c]` для тензора `[C, H, W]`.
///
/// Если задано одно значение mean/std, оно применяется ко всем элементам.
#[derive(Debug, Clone)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    /// Создает нормализатор с поканальными параметрами.
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Self {
        assert_eq!(mean.len(), std.len(), "mean and std must have the same length");
        Self { mean, std }
    }

    /// Создает нормализатор для одномерных данных.
    pub fn from_scalars(mean: f32, std: f32) -> Self {
        Self {
            mean: vec![mean],
            std: vec![std],
        }
    }
}

impl Transform for Normalize {
    fn apply(&self, mut data: ArrayD<f32>) -> ArrayD<f32> {
        if self.mean.len() == 1 {
            let (mean, std) = (self.mean[0], self.std[0]);
            data.mapv_inplace(|x| (x - mean) / std);
            return data;
        }

        if data.ndim() == 0 || data.shape()[0] != self.mean.len() {
            log::warn!(
                "Normalize: expected {} channels, got shape {:?}",
                self.mean.len(),
                data.shape()
            );
            return data;
        }

        for (channel, mut plane) in data.axis_iter_mut(Axis(0)).enumerate() {
            let (mean, std) = (self.mean[channel], self.std[channel]);
            plane.mapv_inplace(|x| (x - mean) / std);
        }
        data
    }
}
