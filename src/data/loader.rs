use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::dataset::Dataset;

/// Splits a dataset into consecutive batches of `batch_size` rows; the last
/// batch holds the remainder. A batch size of 0 means one batch with every row.
#[derive(Debug, Clone, Copy)]
pub struct DataLoader<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: &'a Dataset, batch_size: usize) -> DataLoader<'a> {
        let batch_size = if batch_size == 0 { dataset.len() } else { batch_size };
        DataLoader { dataset, batch_size: batch_size.max(1) }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches produced by one pass.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One pass over the data; with `shuffle` the row order is permuted first.
    pub fn iter<R: Rng + ?Sized>(&self, shuffle: bool, rng: &mut R) -> Batches<'a> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if shuffle {
            order.shuffle(rng);
        }
        Batches { dataset: self.dataset, order, batch_size: self.batch_size, pos: 0 }
    }
}

/// Iterator over owned `(X_batch, Y_batch)` pairs.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    dataset: &'a Dataset,
    order: Vec<usize>,
    batch_size: usize,
    pos: usize,
}

impl Iterator for Batches<'_> {
    type Item = (Array2<f64>, Array2<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.order.len() {
            return None;
        }
        let end = (self.pos + self.batch_size).min(self.order.len());
        let batch = self.dataset.select(&self.order[self.pos..end]);
        self.pos = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.order.len() - self.pos).div_ceil(self.batch_size);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Batches<'_> {}
