//! Histogram over scalar samples with lazily recomputed bins.
//!
//! The raw samples are kept so the bins can be rebuilt whenever the data
//! range changes. Bins are only recomputed when a snapshot is requested after
//! a mutation, and the computation runs outside the lock.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{PlotError, Result};
use crate::view::{Range, Viewport};

/// Rule used to choose the number of bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinRule {
    /// Sturges' rule: `ceil(log2(n)) + 1` bins.
    #[default]
    Sturges,
    /// A fixed number of bins.
    Fixed(usize),
}

impl BinRule {
    /// Number of bins for `samples` values.
    pub fn bin_count(self, samples: usize) -> usize {
        match self {
            Self::Fixed(bins) => bins.max(1),
            Self::Sturges => {
                if samples <= 1 {
                    1
                } else {
                    (samples as f64).log2().ceil() as usize + 1
                }
            }
        }
    }
}

/// Conversion of a caller value into a histogram sample.
///
/// The error carries the textual form of the rejected value.
pub trait IntoSample {
    /// Convert into a finite `f64`.
    fn into_sample(self) -> std::result::Result<f64, String>;
}

fn finite(value: f64) -> std::result::Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(value.to_string())
    }
}

macro_rules! impl_into_sample {
    ($($ty:ty),*) => {
        $(
            impl IntoSample for $ty {
                fn into_sample(self) -> std::result::Result<f64, String> {
                    finite(self as f64)
                }
            }
        )*
    };
}

impl_into_sample!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl IntoSample for &str {
    fn into_sample(self) -> std::result::Result<f64, String> {
        self.trim()
            .parse::<f64>()
            .map_err(|_| self.to_string())
            .and_then(finite)
    }
}

impl IntoSample for String {
    fn into_sample(self) -> std::result::Result<f64, String> {
        self.as_str().into_sample()
    }
}

impl IntoSample for &String {
    fn into_sample(self) -> std::result::Result<f64, String> {
        self.as_str().into_sample()
    }
}

/// One histogram bin covering `[start, end)` (the last bin also includes `end`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Lower edge.
    pub start: f64,
    /// Upper edge.
    pub end: f64,
    /// Number of samples in the bin.
    pub count: usize,
}

impl Bin {
    /// Bin width.
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Stable, fully binned view of a histogram.
#[derive(Debug, Clone)]
pub struct HistogramSnapshot {
    bins: Arc<Vec<Bin>>,
    sample_count: usize,
    frequency: bool,
    generation: u64,
}

impl HistogramSnapshot {
    /// Bins in ascending order.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Number of samples counted.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Generation the snapshot was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether bar heights are normalized frequencies.
    pub fn is_frequency(&self) -> bool {
        self.frequency
    }

    /// Bar height of a bin: a count, or a frequency in frequency mode.
    pub fn height(&self, bin: &Bin) -> f64 {
        if self.frequency && self.sample_count > 0 {
            bin.count as f64 / self.sample_count as f64
        } else {
            bin.count as f64
        }
    }

    /// Bounds that show every bar with one spare bin on each side.
    pub fn fit_bounds(&self) -> Option<Viewport> {
        let first = self.bins.first()?;
        let last = self.bins.last()?;
        let width = first.width();
        let max_height = self
            .bins
            .iter()
            .map(|bin| self.height(bin))
            .fold(0.0_f64, f64::max);
        let top = if max_height > 0.0 { max_height * 1.1 } else { 1.0 };
        Some(Viewport::new(
            Range::new(first.start - width, last.end + width),
            Range::new(0.0, top),
        ))
    }
}

#[derive(Debug)]
struct HistogramState {
    samples: Arc<Vec<f64>>,
    rule: BinRule,
    frozen: Option<Range>,
    frequency: bool,
    cache: Option<HistogramSnapshot>,
    generation: u64,
}

impl HistogramState {
    fn touch(&mut self) {
        self.cache = None;
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Thread-safe histogram handle.
///
/// Clones share the same samples, so one clone can be attached to a plot
/// while others keep feeding data from worker threads.
#[derive(Debug, Clone)]
pub struct Histogram {
    state: Arc<Mutex<HistogramState>>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    /// Create a histogram whose bins follow the data range (Sturges' rule).
    pub fn new() -> Self {
        Self::from_parts(BinRule::Sturges, None)
    }

    /// Create a histogram with fixed edges over `[min, max]`.
    ///
    /// Samples outside the range are counted in the nearest edge bin.
    pub fn with_range(min: f64, max: f64, bins: usize) -> Result<Self> {
        let range = Range::new(min, max);
        if !range.is_valid() || bins == 0 {
            return Err(PlotError::InvalidConfig(format!(
                "histogram range [{min}, {max}] with {bins} bins"
            )));
        }
        Ok(Self::from_parts(BinRule::Fixed(bins), Some(range)))
    }

    fn from_parts(rule: BinRule, frozen: Option<Range>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HistogramState {
                samples: Arc::new(Vec::new()),
                rule,
                frozen,
                frequency: false,
                cache: None,
                generation: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistogramState> {
        // A panic while holding the lock cannot leave the samples torn, so
        // keep going with the inner value.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add one sample.
    pub fn add_data(&self, value: impl IntoSample) -> Result<()> {
        let value = value
            .into_sample()
            .map_err(|value| PlotError::InvalidValue { value })?;
        let mut state = self.lock();
        Arc::make_mut(&mut state.samples).push(value);
        state.touch();
        Ok(())
    }

    /// Replace all samples.
    ///
    /// The batch is converted up front; if any element fails, nothing changes.
    pub fn set_data<I, T>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: IntoSample,
    {
        let samples = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                value
                    .into_sample()
                    .map_err(|value| PlotError::InvalidSample { index, value })
            })
            .collect::<Result<Vec<f64>>>()?;
        let mut state = self.lock();
        state.samples = Arc::new(samples);
        state.touch();
        Ok(())
    }

    /// Replace all samples with values repeated by their counts.
    ///
    /// Each `(value, count)` pair stands for `count` samples of `value`. As
    /// with [`set_data`](Self::set_data), one bad value rejects the batch.
    pub fn set_counts_data<I, T>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (T, usize)>,
        T: IntoSample,
    {
        let pairs = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (value, count))| {
                value
                    .into_sample()
                    .map(|value| (value, count))
                    .map_err(|value| PlotError::InvalidSample { index, value })
            })
            .collect::<Result<Vec<(f64, usize)>>>()?;
        let total = pairs
            .iter()
            .try_fold(0_usize, |total, &(_, count)| total.checked_add(count))
            .ok_or_else(|| PlotError::InvalidConfig("histogram counts overflow".to_string()))?;
        let mut samples = Vec::new();
        samples.try_reserve_exact(total).map_err(|_| {
            PlotError::InvalidConfig(format!("cannot hold {total} histogram samples"))
        })?;
        for (value, count) in pairs {
            samples.extend(std::iter::repeat_n(value, count));
        }
        let mut state = self.lock();
        state.samples = Arc::new(samples);
        state.touch();
        Ok(())
    }

    /// Remove all samples.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.samples = Arc::new(Vec::new());
        state.touch();
    }

    /// Change the binning rule. Ignored for fixed-range histograms.
    pub fn set_rule(&self, rule: BinRule) {
        let mut state = self.lock();
        if state.frozen.is_none() {
            state.rule = rule;
            state.touch();
        }
    }

    /// Show frequencies instead of counts.
    pub fn set_frequency(&self, frequency: bool) {
        let mut state = self.lock();
        state.frequency = frequency;
        state.touch();
    }

    /// Number of samples added since the last `set_data` or `clear`.
    pub fn sample_count(&self) -> usize {
        self.lock().samples.len()
    }

    /// Generation, bumped by every mutation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Binned snapshot, recomputing the bins if the data changed.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let (samples, rule, frozen, frequency, generation) = {
            let state = self.lock();
            if let Some(cache) = &state.cache {
                return cache.clone();
            }
            (
                Arc::clone(&state.samples),
                state.rule,
                state.frozen,
                state.frequency,
                state.generation,
            )
        };

        let snapshot = HistogramSnapshot {
            sample_count: samples.len(),
            bins: Arc::new(compute_bins(&samples, rule, frozen)),
            frequency,
            generation,
        };

        let mut state = self.lock();
        if state.generation == generation {
            state.cache = Some(snapshot.clone());
        }
        snapshot
    }
}

fn compute_bins(samples: &[f64], rule: BinRule, frozen: Option<Range>) -> Vec<Bin> {
    if samples.is_empty() && frozen.is_none() {
        return Vec::new();
    }
    let count = rule.bin_count(samples.len());
    let range = match frozen {
        Some(range) => range,
        None => match Range::from_values(samples.iter().copied()) {
            Some(range) if range.span() > 0.0 => range,
            // All samples equal: give the single value a unit-wide bin.
            Some(range) => Range::new(range.min - 0.5, range.min + 0.5),
            None => return Vec::new(),
        },
    };
    let width = range.span() / count as f64;
    let mut bins: Vec<Bin> = (0..count)
        .map(|i| Bin {
            start: range.min + width * i as f64,
            end: if i + 1 == count {
                range.max
            } else {
                range.min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();
    for &value in samples {
        let index = ((value - range.min) / width).floor();
        let index = if index <= 0.0 {
            0
        } else {
            (index as usize).min(count - 1)
        };
        bins[index].count += 1;
    }
    bins
}
