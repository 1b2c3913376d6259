use crate::arrays::{LabelImage, RasterImage};
use crate::blob::Blob;
use crate::common::{split_length_to_ranges, Config, MetricsStrategy};
use crate::error::Error;
use log::debug;
use multiversion::multiversion;
use rayon::current_num_threads;
use rayon::prelude::*;
use std::ops::Range;

const NO_SLOT: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct BlobAccumulator {
    area: usize,
    sum_x: u64,
    sum_y: u64,
    x_min: usize,
    y_min: usize,
    x_max: usize,
    y_max: usize,
    perimeter: usize,
}

impl BlobAccumulator {
    fn new(labels: &LabelImage) -> Self {
        Self {
            area: 0,
            sum_x: 0,
            sum_y: 0,
            x_min: labels.width - 1,
            y_min: labels.height - 1,
            x_max: 0,
            y_max: 0,
            perimeter: 0,
        }
    }

    #[inline(always)]
    fn add(&mut self, x: usize, y: usize, on_perimeter: bool) {
        self.area += 1;
        self.sum_x += x as u64;
        self.sum_y += y as u64;
        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
        self.perimeter += on_perimeter as usize;
    }

    fn merge(&mut self, other: &Self) {
        self.area += other.area;
        self.sum_x += other.sum_x;
        self.sum_y += other.sum_y;
        self.x_min = self.x_min.min(other.x_min);
        self.y_min = self.y_min.min(other.y_min);
        self.x_max = self.x_max.max(other.x_max);
        self.y_max = self.y_max.max(other.y_max);
        self.perimeter += other.perimeter;
    }

    fn write_to(&self, blob: &mut Blob) {
        blob.area = self.area;
        blob.perimeter = self.perimeter;
        blob.x = self.x_min;
        blob.y = self.y_min;
        if self.area == 0 {
            // label not present, empty box anchored at the initial minimum
            blob.width = 0;
            blob.height = 0;
            return;
        }
        blob.width = self.x_max - self.x_min + 1;
        blob.height = self.y_max - self.y_min + 1;
        blob.xc = (self.sum_x / self.area as u64) as usize;
        blob.yc = (self.sum_y / self.area as u64) as usize;
    }
}

/// Pixel at `index` has an orthogonal neighbour with a different label. Interior only.
#[inline(always)]
fn is_on_perimeter(data: &[u32], width: usize, index: usize, label: u32) -> bool {
    data[index - 1] != label
        || data[index + 1] != label
        || data[index - width] != label
        || data[index + width] != label
}

#[inline(always)]
fn interior_rows(labels: &LabelImage) -> Range<usize> {
    1..labels.height.saturating_sub(1)
}

fn measure_per_blob(labels: &LabelImage, blobs: &mut [Blob]) {
    let width = labels.width;
    for blob in blobs.iter_mut() {
        let mut accumulator = BlobAccumulator::new(labels);
        for y in interior_rows(labels) {
            for x in 1..width - 1 {
                let index = y * width + x;
                if labels.data[index] == blob.label {
                    let on_perimeter = is_on_perimeter(&labels.data, width, index, blob.label);
                    accumulator.add(x, y, on_perimeter);
                }
            }
        }
        accumulator.write_to(blob);
    }
}

/// Maps the labels of the measured blobs to accumulator slots.
///
/// Labels up to the largest label present in the image (at most one per pixel) go to a dense
/// table, larger ones present in the image to a sorted list. Labels that cannot occur in the
/// image get no slot at all.
struct SlotMap {
    dense: Vec<u32>,
    sparse: Vec<(u32, u32)>,
    num_slots: usize,
}

impl SlotMap {
    fn new(labels: &LabelImage, blobs: &[Blob]) -> Self {
        let max_present = interior_rows(labels)
            .flat_map(|y| labels.get_row(y).iter().copied())
            .max()
            .unwrap_or(0);
        let max_dense = max_present.min(u32::try_from(labels.data.len()).unwrap_or(u32::MAX));
        let max_wanted = blobs
            .iter()
            .map(|blob| blob.label)
            .filter(|label| *label <= max_dense)
            .max();
        let mut map = SlotMap {
            dense: max_wanted.map_or_else(Vec::new, |max| vec![NO_SLOT; max as usize + 1]),
            sparse: Vec::new(),
            num_slots: 0,
        };
        for blob in blobs {
            if blob.label > max_present || map.get(blob.label).is_some() {
                continue;
            }
            let slot = map.num_slots as u32;
            map.num_slots += 1;
            if blob.label <= max_dense {
                map.dense[blob.label as usize] = slot;
            } else {
                let at = map.sparse.partition_point(|(label, _)| *label < blob.label);
                map.sparse.insert(at, (blob.label, slot));
            }
        }
        map
    }

    #[inline(always)]
    fn get(&self, label: u32) -> Option<usize> {
        match self.dense.get(label as usize) {
            Some(slot) if *slot != NO_SLOT => Some(*slot as usize),
            Some(_) => None,
            None if self.sparse.is_empty() => None,
            None => self
                .sparse
                .binary_search_by_key(&label, |(label, _)| *label)
                .ok()
                .map(|i| self.sparse[i].1 as usize),
        }
    }
}

/// Accumulates metrics of all blobs in `rows` into the slots given by `slots`.
#[multiversion(targets = "simd")]
fn accumulate_rows(
    labels: &LabelImage,
    rows: Range<usize>,
    slots: &SlotMap,
    accumulators: &mut [BlobAccumulator],
) {
    let width = labels.width;
    for y in rows {
        let row = labels.get_row(y);
        for x in 1..width - 1 {
            let label = row[x];
            let Some(slot) = slots.get(label) else {
                continue;
            };
            let on_perimeter = is_on_perimeter(&labels.data, width, y * width + x, label);
            accumulators[slot].add(x, y, on_perimeter);
        }
    }
}

fn measure_single_pass(labels: &LabelImage, blobs: &mut [Blob], parallel: bool) {
    // duplicated labels in `blobs` share one accumulator
    let slots = SlotMap::new(labels, blobs);
    let fresh = || vec![BlobAccumulator::new(labels); slots.num_slots];

    let rows = interior_rows(labels);
    let accumulators = if parallel {
        let offset = rows.start;
        split_length_to_ranges(rows.len(), current_num_threads())
            .into_par_iter()
            .map(|r| {
                let mut local = fresh();
                accumulate_rows(labels, r.start + offset..r.end + offset, &slots, &mut local);
                local
            })
            .reduce(fresh, |mut acc, local| {
                acc.iter_mut().zip(&local).for_each(|(a, l)| a.merge(l));
                acc
            })
    } else {
        let mut accumulators = fresh();
        accumulate_rows(labels, rows, &slots, &mut accumulators);
        accumulators
    };

    let absent = BlobAccumulator::new(labels);
    for blob in blobs.iter_mut() {
        match slots.get(blob.label) {
            Some(slot) => accumulators[slot].write_to(blob),
            None => absent.write_to(blob),
        }
    }
}

/// Computes area, bounding box, centroid and perimeter of every blob from a label image.
///
/// Only the interior of the image is scanned, the border never belongs to a blob. Metric
/// fields are overwritten, so calling this again gives the same result. Labels that do not
/// occur in the image are not an error, they get zero area, zero sized box anchored at
/// `(width - 1, height - 1)` and centroid `(0, 0)`.
pub fn blob_info(labels: &LabelImage, blobs: &mut [Blob], config: &Config) -> Result<(), Error> {
    if labels.width == 0 || labels.height == 0 {
        return Err(Error::InvalidSize {
            width: labels.width,
            height: labels.height,
        });
    }
    blobs.iter_mut().for_each(Blob::reset_metrics);
    match config.metrics_strategy {
        MetricsStrategy::PerBlob => measure_per_blob(labels, blobs),
        MetricsStrategy::SinglePass => measure_single_pass(labels, blobs, false),
        MetricsStrategy::RowParallel => measure_single_pass(labels, blobs, true),
    }
    debug!(
        "measured {} blobs in {}x{} label image ({:?})",
        blobs.len(),
        labels.width,
        labels.height,
        config.metrics_strategy
    );
    Ok(())
}

/// [`blob_info`] over an 8-bit single channel label raster.
pub fn blob_info_raster(
    labels: &RasterImage,
    blobs: &mut [Blob],
    config: &Config,
) -> Result<(), Error> {
    let labels = LabelImage::from_raster(labels)?;
    blob_info(&labels, blobs, config)
}

#[cfg(test)]
mod tests {
    use super::{blob_info, blob_info_raster};
    use crate::arrays::{Array2D, LabelImage, RasterImage};
    use crate::blob::Blob;
    use crate::common::{Config, Connectivity, MetricsStrategy};
    use crate::error::Error;
    use crate::labelling::{blob_labelling, find_blobs, mask_from_rows, random_mask};

    const STRATEGIES: [MetricsStrategy; 3] = [
        MetricsStrategy::PerBlob,
        MetricsStrategy::SinglePass,
        MetricsStrategy::RowParallel,
    ];

    fn config(metrics_strategy: MetricsStrategy) -> Config {
        Config {
            metrics_strategy,
            ..Config::default()
        }
    }

    #[test]
    fn square_test() {
        let mask = mask_from_rows(&[".....", ".###.", ".###.", ".###.", "....."]);
        for strategy in STRATEGIES {
            let labelling = find_blobs(&mask, &config(strategy)).unwrap();
            assert_eq!(
                labelling.blobs,
                vec![Blob {
                    label: 1,
                    x: 1,
                    y: 1,
                    width: 3,
                    height: 3,
                    area: 9,
                    xc: 2,
                    yc: 2,
                    perimeter: 8,
                }],
                "{strategy:?}"
            );
        }
    }

    #[test]
    fn isolated_pixel_test() {
        let mask = mask_from_rows(&[".....", ".....", "...#.", ".....", "....."]);
        let labelling = find_blobs(&mask, &Config::default()).unwrap();
        let blob = labelling.blobs[0];
        assert_eq!((blob.area, blob.width, blob.height), (1, 1, 1));
        assert_eq!((blob.xc, blob.yc), (3, 2));
        assert_eq!((blob.x, blob.y), (3, 2));
        assert_eq!(blob.perimeter, 1);
    }

    #[test]
    fn solid_block_perimeter_test() {
        let mask = mask_from_rows(&[
            ".......", //
            ".#####.",
            ".#####.",
            ".#####.",
            ".#####.",
            ".#####.",
            ".......",
        ]);
        let labelling = find_blobs(&mask, &Config::default()).unwrap();
        assert_eq!(labelling.blobs[0].area, 25);
        assert_eq!(labelling.blobs[0].perimeter, 16);
    }

    #[test]
    fn centroid_truncated_test() {
        let mask = mask_from_rows(&["....", ".##.", ".#..", "...."]);
        let labelling = find_blobs(&mask, &Config::default()).unwrap();
        let blob = labelling.blobs[0];
        // (1 + 2 + 1) / 3 and (1 + 1 + 2) / 3
        assert_eq!((blob.xc, blob.yc), (1, 1));
        assert_eq!((blob.width, blob.height), (2, 2));
        assert_eq!(blob.perimeter, 3);
    }

    #[test]
    fn touching_labels_perimeter_test() {
        #[rustfmt::skip]
        let data = [
            0, 0, 0, 0, 0, 0,
            0, 1, 1, 2, 2, 0,
            0, 1, 1, 2, 2, 0,
            0, 0, 0, 0, 0, 0,
        ];
        let labels = Array2D::from_slice(&data, 6, 4).unwrap();
        for strategy in STRATEGIES {
            let mut blobs = vec![Blob::new(1), Blob::new(2)];
            blob_info(&labels, &mut blobs, &config(strategy)).unwrap();
            assert_eq!(blobs[0].perimeter, 4);
            assert_eq!(blobs[1].perimeter, 4);
            assert_eq!((blobs[1].x, blobs[1].xc), (3, 3));
        }
    }

    #[test]
    fn missing_label_test() {
        let mask = mask_from_rows(&[".....", ".###.", ".###.", ".###.", "....."]);
        let labelling = blob_labelling(&mask, &Config::default()).unwrap();
        for strategy in STRATEGIES {
            let mut blobs = vec![Blob::new(9), Blob::new(1)];
            blob_info(&labelling.labels, &mut blobs, &config(strategy)).unwrap();
            assert_eq!(
                blobs[0],
                Blob {
                    label: 9,
                    x: 4,
                    y: 4,
                    ..Blob::default()
                }
            );
            assert_eq!(blobs[1].area, 9);
        }
    }

    #[test]
    fn huge_missing_label_test() {
        let mask = mask_from_rows(&[".....", ".###.", ".###.", ".###.", "....."]);
        let labelling = blob_labelling(&mask, &Config::default()).unwrap();
        for strategy in STRATEGIES {
            let mut blobs = vec![Blob::new(1), Blob::new(u32::MAX), Blob::new(u32::MAX - 1)];
            blob_info(&labelling.labels, &mut blobs, &config(strategy)).unwrap();
            assert_eq!(blobs[0].area, 9, "{strategy:?}");
            for blob in &blobs[1..] {
                assert_eq!(
                    *blob,
                    Blob {
                        label: blob.label,
                        x: 4,
                        y: 4,
                        ..Blob::default()
                    },
                    "{strategy:?}"
                );
            }
        }
    }

    #[test]
    fn huge_present_label_test() {
        let big = 4_000_000_000u32;
        #[rustfmt::skip]
        let data = [
            0, 0, 0, 0, 0, 0,
            0, 1, 0, big, big, 0,
            0, 1, 0, big, 0, 0,
            0, 0, 0, 0, 0, 0,
        ];
        let labels = Array2D::from_slice(&data, 6, 4).unwrap();
        for strategy in STRATEGIES {
            let mut blobs = vec![Blob::new(big), Blob::new(1), Blob::new(big + 1)];
            blob_info(&labels, &mut blobs, &config(strategy)).unwrap();
            assert_eq!(
                blobs[0],
                Blob {
                    label: big,
                    x: 3,
                    y: 1,
                    width: 2,
                    height: 2,
                    area: 3,
                    xc: 3,
                    yc: 1,
                    perimeter: 3,
                },
                "{strategy:?}"
            );
            assert_eq!((blobs[1].area, blobs[1].height), (2, 2));
            assert_eq!(blobs[2].area, 0);
        }
    }

    #[test]
    fn duplicated_label_test() {
        let mask = mask_from_rows(&["....", ".##.", "...."]);
        let labelling = blob_labelling(&mask, &Config::default()).unwrap();
        let mut blobs = vec![Blob::new(1), Blob::new(1)];
        blob_info(&labelling.labels, &mut blobs, &Config::default()).unwrap();
        assert_eq!(blobs[0], blobs[1]);
        assert_eq!(blobs[0].area, 2);
    }

    #[test]
    fn strategies_agree_test() {
        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            for seed in 0..10 {
                let mask = random_mask(97, 61, 0.45, seed);
                let base = Config {
                    connectivity,
                    ..Config::default()
                };
                let labelling = blob_labelling(&mask, &base).unwrap();
                let results: Vec<Vec<Blob>> = STRATEGIES
                    .iter()
                    .map(|strategy| {
                        let mut blobs = labelling.blobs.clone();
                        let config = Config {
                            metrics_strategy: *strategy,
                            ..base.clone()
                        };
                        blob_info(&labelling.labels, &mut blobs, &config).unwrap();
                        blobs
                    })
                    .collect();
                assert_eq!(results[0], results[1], "seed {seed}");
                assert_eq!(results[0], results[2], "seed {seed}");

                let total_area: usize = results[0].iter().map(|blob| blob.area).sum();
                assert_eq!(total_area, labelling.labels.count_nonzero());
                for blob in &results[0] {
                    assert!(blob.area > 0);
                    assert!(blob.perimeter <= blob.area);
                    assert!(blob.xc >= blob.x && blob.xc <= blob.right());
                    assert!(blob.yc >= blob.y && blob.yc <= blob.bottom());
                    assert!(blob.x >= 1 && blob.right() <= mask.width - 2);
                    assert!(blob.y >= 1 && blob.bottom() <= mask.height - 2);
                }
            }
        }
    }

    #[test]
    fn idempotent_test() {
        let mask = random_mask(40, 40, 0.5, 3);
        let mut labelling = find_blobs(&mask, &Config::default()).unwrap();
        let first = labelling.blobs.clone();
        blob_info(&labelling.labels, &mut labelling.blobs, &Config::default()).unwrap();
        assert_eq!(first, labelling.blobs);
    }

    #[test]
    fn raster_labels_test() {
        let mask = random_mask(30, 20, 0.5, 5);
        let labelling = find_blobs(&mask, &Config::legacy()).unwrap();
        let raster = labelling.labels.to_raster().unwrap();
        let mut blobs: Vec<Blob> = labelling
            .blobs
            .iter()
            .map(|blob| Blob::new(blob.label))
            .collect();
        blob_info_raster(&raster, &mut blobs, &Config::legacy()).unwrap();
        assert_eq!(blobs, labelling.blobs);
    }

    #[test]
    fn invalid_input_test() {
        let rgb = RasterImage::new(5, 5, 3, 255).unwrap();
        assert_eq!(
            blob_info_raster(&rgb, &mut [Blob::new(1)], &Config::default()).unwrap_err(),
            Error::ChannelCount(3)
        );
        let empty: LabelImage = Array2D::from_fill(0, 0, 0);
        assert_eq!(
            blob_info(&empty, &mut [], &Config::default()).unwrap_err(),
            Error::InvalidSize {
                width: 0,
                height: 0
            }
        );
    }
}
