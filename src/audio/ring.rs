//! Lock-free sample history shared between the capture callback and the
//! analysis pass.
//!
//! The ring is always "full": it starts zeroed and is continuously
//! overwritten, so a reader treats the whole buffer as the history window.
//! There is exactly one [`RingWriter`] (moved into the audio callback) and
//! any number of [`RingReader`]s. Nothing blocks: a reader racing the writer
//! may observe up to one period of samples from the wrong side of the
//! cursor, which the analysis tolerates as jitter.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed-capacity sample storage. Samples are stored as `f32` bit patterns.
pub struct SampleRing {
    samples: Box<[AtomicU32]>,
    /// Position where the next write begins
    cursor: AtomicUsize,
    period: usize,
}

impl SampleRing {
    /// Allocate a zeroed ring holding at most `min_history` samples, rounded
    /// down to a whole number of periods (never less than one period).
    pub fn with_history(min_history: usize, period: usize) -> Self {
        let period = period.max(1);
        let len = (min_history / period).max(1) * period;
        let samples = (0..len).map(|_| AtomicU32::new(0)).collect();

        Self {
            samples,
            cursor: AtomicUsize::new(0),
            period,
        }
    }

    /// Split into the single writer and a cloneable reader.
    pub fn split(self) -> (RingWriter, RingReader) {
        let ring = Arc::new(self);
        (
            RingWriter {
                ring: Arc::clone(&ring),
            },
            RingReader { ring },
        )
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn period(&self) -> usize {
        self.period
    }

    fn write_chunk(&self, chunk: &[f32]) {
        let len = self.samples.len();
        let mut start = self.cursor.load(Ordering::Relaxed);
        // Wrap before copying so a chunk is never split across the end
        if start + chunk.len() > len {
            start = 0;
        }

        for (slot, &sample) in self.samples[start..start + chunk.len()].iter().zip(chunk) {
            slot.store(sample.to_bits(), Ordering::Relaxed);
        }

        let mut next = start + chunk.len();
        if next == len {
            next = 0;
        }
        self.cursor.store(next, Ordering::Release);
    }
}

/// The audio callback's handle. Not `Clone`: there is only ever one writer.
pub struct RingWriter {
    ring: Arc<SampleRing>,
}

impl RingWriter {
    /// Append samples, one period-sized chunk at a time.
    ///
    /// The driver is expected to deliver exactly one period per call; larger
    /// deliveries are chunked so each chunk stays contiguous.
    pub fn write(&mut self, samples: &[f32]) {
        for chunk in samples.chunks(self.ring.period) {
            self.ring.write_chunk(chunk);
        }
    }

    pub fn period(&self) -> usize {
        self.ring.period
    }
}

/// Observer handle used by the analysis pass. Has no mutating API.
#[derive(Clone)]
pub struct RingReader {
    ring: Arc<SampleRing>,
}

impl RingReader {
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn period(&self) -> usize {
        self.ring.period
    }

    /// Current cursor, i.e. where the next write will begin.
    pub fn cursor(&self) -> usize {
        self.ring.cursor.load(Ordering::Acquire)
    }

    /// Visit every sample oldest to newest.
    ///
    /// The cursor is read once; the two sub-ranges on either side of it are
    /// traversed as a single logical sequence.
    pub fn for_each_ordered(&self, mut f: impl FnMut(f32)) {
        let cursor = self.cursor();
        let (newer, older) = self.ring.samples.split_at(cursor);
        for slot in older.iter().chain(newer) {
            f(f32::from_bits(slot.load(Ordering::Relaxed)));
        }
    }

    /// Copy the history oldest to newest into `out` (cleared first).
    pub fn copy_ordered(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.len());
        self.for_each_ordered(|sample| out.push(sample));
    }

    /// Buffer contents in storage order, ignoring the cursor.
    pub fn raw_contents(&self) -> Vec<f32> {
        self.ring
            .samples
            .iter()
            .map(|slot| f32::from_bits(slot.load(Ordering::Relaxed)))
            .collect()
    }
}
