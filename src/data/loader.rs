// ============================================================
// Layer 4 — Training Batch Loader
// ============================================================
// Feeds the training loop one shuffled, augmented batch at a
// time, with augmentation and tensor creation done ahead of the
// loop on worker threads.
//
// Why not Burn's multi-threaded DataLoader?
//   Burn gives every worker its own slice of the dataset, and
//   every slice ends with its own short batch. An epoch over
//   50 000 images with batch 128 and 4 workers then has 392
//   batches (four of them short) instead of 391.
//
// Here the epoch is a single stream:
//   1. Shuffle all indices once (seeded, reshuffled per epoch)
//   2. Cut the shuffled order into batch_size chunks; only the
//      final chunk can be short
//   3. Chunk i is built by worker i % num_workers and handed
//      over through that worker's bounded channel
//   4. The loop reads the channels round-robin, so batches come
//      out in chunk order no matter which worker finishes first
//
// num_workers = 0 builds every batch on the calling thread.

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::{
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
    vec,
};

use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::AugmentedDataset,
};

/// Batches each worker may have ready before the loop asks
const PREFETCH_PER_WORKER: usize = 2;

pub struct TrainLoader<B: Backend> {
    dataset:     Arc<AugmentedDataset>,
    batcher:     ImageBatcher<B>,
    batch_size:  usize,
    num_workers: usize,
    rng:         StdRng,
}

impl<B: Backend> TrainLoader<B> {
    pub fn new(
        dataset:     AugmentedDataset,
        batcher:     ImageBatcher<B>,
        batch_size:  usize,
        num_workers: usize,
        seed:        u64,
    ) -> Self {
        Self {
            dataset: Arc::new(dataset),
            batcher,
            batch_size: batch_size.max(1),
            num_workers,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Exact number of batches `epoch()` yields
    pub fn batches_per_epoch(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Reshuffle and start streaming the next epoch's batches.
    pub fn epoch(&mut self) -> EpochBatches<B> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        order.shuffle(&mut self.rng);

        let chunks: Vec<Vec<usize>> = order
            .chunks(self.batch_size)
            .map(<[usize]>::to_vec)
            .collect();

        if self.num_workers == 0 {
            EpochBatches::Inline {
                dataset: Arc::clone(&self.dataset),
                batcher: self.batcher.clone(),
                chunks:  chunks.into_iter(),
            }
        } else {
            EpochBatches::Workers(WorkerBatches::spawn(
                &self.dataset,
                &self.batcher,
                chunks,
                self.num_workers,
            ))
        }
    }
}

fn build_batch<B: Backend>(
    dataset: &AugmentedDataset,
    batcher: &ImageBatcher<B>,
    chunk:   &[usize],
) -> ImageBatch<B> {
    let items = chunk.iter().filter_map(|&index| dataset.get(index)).collect();
    batcher.batch(items)
}

/// One epoch's batches, in shuffled-chunk order
pub enum EpochBatches<B: Backend> {
    Inline {
        dataset: Arc<AugmentedDataset>,
        batcher: ImageBatcher<B>,
        chunks:  vec::IntoIter<Vec<usize>>,
    },
    Workers(WorkerBatches<B>),
}

impl<B: Backend> Iterator for EpochBatches<B> {
    type Item = ImageBatch<B>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            EpochBatches::Inline { dataset, batcher, chunks } => {
                let chunk = chunks.next()?;
                Some(build_batch(dataset, batcher, &chunk))
            }
            EpochBatches::Workers(workers) => workers.next_batch(),
        }
    }
}

pub struct WorkerBatches<B: Backend> {
    receivers: Vec<mpsc::Receiver<ImageBatch<B>>>,
    handles:   Vec<JoinHandle<()>>,
    next:      usize,
    total:     usize,
}

impl<B: Backend> WorkerBatches<B> {
    fn spawn(
        dataset:     &Arc<AugmentedDataset>,
        batcher:     &ImageBatcher<B>,
        chunks:      Vec<Vec<usize>>,
        num_workers: usize,
    ) -> Self {
        let total = chunks.len();

        // Worker k owns chunks k, k + n, k + 2n, ...
        let mut assigned: Vec<Vec<Vec<usize>>> = vec![Vec::new(); num_workers];
        for (i, chunk) in chunks.into_iter().enumerate() {
            assigned[i % num_workers].push(chunk);
        }

        let mut receivers = Vec::with_capacity(num_workers);
        let mut handles   = Vec::with_capacity(num_workers);

        for own_chunks in assigned {
            let (tx, rx) = mpsc::sync_channel(PREFETCH_PER_WORKER);
            let dataset  = Arc::clone(dataset);
            let batcher  = batcher.clone();

            handles.push(thread::spawn(move || {
                for chunk in own_chunks {
                    // The receiver is gone once the epoch iterator is dropped
                    if tx.send(build_batch(&dataset, &batcher, &chunk)).is_err() {
                        break;
                    }
                }
            }));
            receivers.push(rx);
        }

        Self { receivers, handles, next: 0, total }
    }

    fn next_batch(&mut self) -> Option<ImageBatch<B>> {
        if self.next == self.total {
            return None;
        }
        let worker = self.next % self.receivers.len();
        self.next += 1;

        match self.receivers[worker].recv() {
            Ok(batch) => Some(batch),
            // The sender only disappears early if its worker panicked
            Err(_) => {
                let handle = self.handles.swap_remove(worker);
                if let Err(payload) = handle.join() {
                    std::panic::resume_unwind(payload);
                }
                None
            }
        }
    }
}

impl<B: Backend> Drop for WorkerBatches<B> {
    fn drop(&mut self) {
        // Unblock workers waiting on a full channel, then wait for them
        self.receivers.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
