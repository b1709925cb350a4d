//! Serialization Study
//!
//! Measures the cost of `encode + store` for the binary and text formats,
//! one operation at a time and in large sequential batches. Everything runs
//! on the calling thread.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::CacheEngine;
use crate::error::Result;
use crate::serializer::{BinaryFormatSerializer, Cacheable, TextFormatSerializer};
use crate::store::Backend;

/// Times a fallible operation.
pub fn duration_of<F>(op: F) -> Result<Duration>
where
    F: FnOnce() -> Result<()>,
{
    let start = Instant::now();
    op()?;
    Ok(start.elapsed())
}

// == Single-Operation Report ==
/// Per-operation latency samples, collected in interleaved pairs.
#[derive(Debug, Clone, Serialize)]
pub struct SingleOpReport {
    pub binary: Vec<Duration>,
    pub text: Vec<Duration>,
}

impl SingleOpReport {
    pub fn repetitions(&self) -> usize {
        self.binary.len()
    }

    pub fn binary_mean(&self) -> Duration {
        mean(&self.binary)
    }

    pub fn text_mean(&self) -> Duration {
        mean(&self.text)
    }

    pub fn binary_median(&self) -> Duration {
        median(&self.binary)
    }

    pub fn text_median(&self) -> Duration {
        median(&self.text)
    }

    /// Number of pairs in which the binary operation was strictly faster.
    pub fn binary_wins(&self) -> usize {
        self.binary
            .iter()
            .zip(&self.text)
            .filter(|(binary, text)| binary < text)
            .count()
    }
}

fn mean(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        return Duration::ZERO;
    }
    let total = samples.iter().sum::<Duration>();
    match u32::try_from(samples.len()) {
        Ok(count) => total / count,
        Err(_) => total.div_f64(samples.len() as f64),
    }
}

fn median(samples: &[Duration]) -> Duration {
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    sorted.get(sorted.len() / 2).copied().unwrap_or_default()
}

// == Batch Report ==
/// Aggregate duration of many sequential operations per format.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub operations: usize,
    pub binary: Duration,
    pub text: Duration,
}

impl BatchReport {
    /// Absolute difference between the two totals.
    pub fn difference(&self) -> Duration {
        if self.binary > self.text {
            self.binary - self.text
        } else {
            self.text - self.binary
        }
    }

    /// True if the totals are within `tolerance` of each other.
    pub fn within(&self, tolerance: Duration) -> bool {
        self.difference() < tolerance
    }
}

// == Serialization Study ==
/// Runs the same value through both formats into one set slot.
pub struct SerializationStudy<'a, B: Backend> {
    engine: &'a mut CacheEngine<B>,
    binary: &'a BinaryFormatSerializer,
    text: &'a TextFormatSerializer,
    key: String,
}

impl<'a, B: Backend> SerializationStudy<'a, B> {
    pub fn new(
        engine: &'a mut CacheEngine<B>,
        binary: &'a BinaryFormatSerializer,
        text: &'a TextFormatSerializer,
        key: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            binary,
            text,
            key: key.into(),
        }
    }

    fn binary_op<T: Cacheable>(&mut self, value: &T) -> Result<()> {
        self.engine.add_member(&self.key, value, self.binary)?;
        Ok(())
    }

    fn text_op<T: Cacheable>(&mut self, value: &T) -> Result<()> {
        self.engine.add_member(&self.key, value, self.text)?;
        Ok(())
    }

    /// Runs each path once so first-call costs stay out of the samples.
    pub fn warm_up<T: Cacheable>(&mut self, value: &T) -> Result<()> {
        self.text_op(value)?;
        self.binary_op(value)
    }

    // == Single Operation ==
    /// Times `repetitions` single operations per format, alternating text
    /// and binary so drift affects both equally.
    pub fn single_op<T: Cacheable>(
        &mut self,
        value: &T,
        repetitions: usize,
    ) -> Result<SingleOpReport> {
        self.warm_up(value)?;

        let mut report = SingleOpReport {
            binary: Vec::with_capacity(repetitions),
            text: Vec::with_capacity(repetitions),
        };
        for _ in 0..repetitions {
            report.text.push(duration_of(|| self.text_op(value))?);
            report.binary.push(duration_of(|| self.binary_op(value))?);
        }

        debug!(
            "Single-op study: binary_mean={:?} text_mean={:?} binary_wins={}/{}",
            report.binary_mean(),
            report.text_mean(),
            report.binary_wins(),
            repetitions
        );
        Ok(report)
    }

    // == Batched ==
    /// Times `operations` back-to-back operations per format.
    pub fn batched<T: Cacheable>(&mut self, value: &T, operations: usize) -> Result<BatchReport> {
        self.warm_up(value)?;

        let text = duration_of(|| (0..operations).try_for_each(|_| self.text_op(value)))?;
        let binary = duration_of(|| (0..operations).try_for_each(|_| self.binary_op(value)))?;

        let report = BatchReport {
            operations,
            binary,
            text,
        };
        info!(
            "Batched study: {} ops, binary={:?} text={:?} difference={:?}",
            operations,
            report.binary,
            report.text,
            report.difference()
        );
        Ok(report)
    }
}
