use std::ops::Range;

/// Capacity of the label table of classic 8-bit labelling tools (labels 1..=254).
pub const LEGACY_MAX_LABELS: u32 = 254;

/// Which already-visited neighbours of a pixel are taken into account by the labelling scan.
///
/// ```text
/// A B C
/// D X
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Copy)]
pub enum Connectivity {
    /// Only `B` (up) and `D` (left). Diagonal neighbours are separate blobs.
    Four,
    /// `A`, `B`, `C` and `D`. This is the kernel of the classic 8-bit tools.
    Eight,
}

/// Changes between implementations of `metrics::blob_info()`. All of them produce the same
/// blobs.
#[derive(Clone, PartialEq, Eq, Debug, Copy)]
pub enum MetricsStrategy {
    /// Scan the whole image once per blob. O(blobs * pixels).
    PerBlob,
    /// Single pass over the image dispatching every pixel to its blob accumulator.
    SinglePass,
    /// Like `SinglePass`, but rows are split to chunks processed by rayon and the partial
    /// accumulators are merged afterwards.
    ///
    /// Only worth it for large images.
    RowParallel,
}

/// Main config for the labelling and metrics passes.
#[derive(Clone, Debug)]
pub struct Config {
    /// Neighbourhood used to join foreground pixels to blobs.
    ///
    /// Perimeter is always computed from the 4 orthogonal neighbours regardless of this setting.
    pub connectivity: Connectivity,
    /// Maximal number of provisional labels. `None` means the table grows as needed.
    ///
    /// With `Some(n)` labelling fails with `Error::LabelsExhausted` when the first scan needs
    /// the label `n + 1`.
    pub max_labels: Option<u32>,
    /// How blob metrics are accumulated.
    pub metrics_strategy: MetricsStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Four,
            max_labels: None,
            metrics_strategy: MetricsStrategy::SinglePass,
        }
    }
}

impl Config {
    /// Config matching the output of the classic 8-bit tools: 8-neighbour kernel, at most 254
    /// labels and per-blob metrics scan.
    pub fn legacy() -> Self {
        Self {
            connectivity: Connectivity::Eight,
            max_labels: Some(LEGACY_MAX_LABELS),
            metrics_strategy: MetricsStrategy::PerBlob,
        }
    }
}

pub(crate) fn split_length_to_ranges(length: usize, splits: usize) -> Vec<Range<usize>> {
    let splits = splits.max(1);
    let chunk_size = length / splits;
    let rem = length % splits;
    (0..splits)
        .scan((rem, 0usize), |(r, acc), _split| {
            let mut size = chunk_size;
            if *r > 0 {
                *r -= 1;
                size += 1;
            }
            let out = (*acc, *acc + size);
            *acc += size;
            Some(out.0..out.1)
        })
        .filter(|range| !range.is_empty())
        .collect()
}
