use crate::arrays::{LabelImage, RasterImage};
use crate::blob::Blob;
use crate::common::{Config, Connectivity};
use crate::error::Error;
use crate::label_table::LabelTable;
use crate::metrics::blob_info;
use log::debug;
use multiversion::multiversion;
use rayon::prelude::*;

/// Marks foreground pixels not visited by the first pass yet.
const FOREGROUND: u32 = u32::MAX;

/// Label image together with the blobs found in it.
#[derive(Debug)]
pub struct Labelling {
    pub labels: LabelImage,
    pub blobs: Vec<Blob>,
}

impl Labelling {
    /// Number of blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

/// Copies the mask normalized to background/foreground and clears the one pixel wide border.
fn copy_mask(mask: &RasterImage, labels: &mut LabelImage) {
    let (width, height) = mask.size();
    for y in 0..height {
        let dst = labels.get_row_mut(y);
        dst.iter_mut()
            .zip(mask.get_row(y))
            .for_each(|(label, value)| *label = if *value != 0 { FOREGROUND } else { 0 });
        dst[0] = 0;
        dst[width - 1] = 0;
    }
    labels.get_row_mut(0).fill(0);
    labels.get_row_mut(height - 1).fill(0);
}

/// First raster scan assigning provisional labels.
///
/// Only the already visited neighbours are looked at:
/// ```text
/// A B C
/// D X
/// ```
/// The pixel gets the smallest canonical label of its foreground neighbours and all their
/// classes are merged into it.
#[multiversion(targets = "simd")]
fn assign_provisional_labels(
    labels: &mut LabelImage,
    table: &mut LabelTable,
    connectivity: Connectivity,
) -> Result<(), Error> {
    let width = labels.width;
    for y in 1..labels.height.saturating_sub(1) {
        let (above, rest) = labels.data.split_at_mut(y * width);
        let up = &above[(y - 1) * width..];
        let row = &mut rest[..width];
        for x in 1..width - 1 {
            if row[x] == 0 {
                continue;
            }
            debug_assert!(up[x] != FOREGROUND && row[x - 1] != FOREGROUND);
            let neighbours = match connectivity {
                Connectivity::Four => [0, up[x], 0, row[x - 1]],
                Connectivity::Eight => [up[x - 1], up[x], up[x + 1], row[x - 1]],
            };
            if neighbours.iter().all(|n| *n == 0) {
                row[x] = table.new_label()?;
                continue;
            }
            let num = neighbours
                .iter()
                .filter(|n| **n != 0)
                .fold(u32::MAX, |num, n| num.min(table.resolve(*n)));
            for n in neighbours.into_iter().filter(|n| *n != 0) {
                if table.resolve(n) != num {
                    table.unify(n, num);
                }
            }
            row[x] = num;
        }
    }
    Ok(())
}

/// Labels 4- or 8-connected foreground regions of `mask` into `labels`.
///
/// `mask` must be a single channel image, any nonzero value is foreground. `labels` must have
/// the same size. The one pixel wide border is always background in the output. Every blob
/// pixel holds its canonical label, the smallest provisional label of the blob.
///
/// Returns one [`Blob`] per distinct label in ascending order with only `label` filled. No
/// foreground yields an empty vector.
///
/// Nothing is written when the inputs are invalid. When the label table runs out of labels
/// (`Config::max_labels`) the label image is cleared and the error is returned.
pub fn blob_labelling_into(
    mask: &RasterImage,
    labels: &mut LabelImage,
    config: &Config,
) -> Result<Vec<Blob>, Error> {
    mask.check_single_channel()?;
    if labels.size() != mask.size() {
        return Err(Error::DimensionMismatch {
            expected: mask.size(),
            found: labels.size(),
        });
    }

    let mut table = LabelTable::with_optional_limit(config.max_labels);
    copy_mask(mask, labels);
    if let Err(e) = assign_provisional_labels(labels, &mut table, config.connectivity) {
        labels.fill(0);
        return Err(e);
    }

    let lookup = table.flatten();
    labels
        .data
        .iter_mut()
        .filter(|label| **label != 0)
        .for_each(|label| *label = lookup[*label as usize]);

    let blobs: Vec<Blob> = table
        .canonical_labels()
        .into_iter()
        .map(Blob::new)
        .collect();
    debug!(
        "labelled {}x{} mask: {} provisional labels, {} blobs",
        mask.width,
        mask.height,
        table.len(),
        blobs.len()
    );
    Ok(blobs)
}

/// Same as [`blob_labelling_into`] with a newly allocated label image.
pub fn blob_labelling(mask: &RasterImage, config: &Config) -> Result<Labelling, Error> {
    let mut labels = LabelImage::new_labels(mask.width, mask.height)?;
    let blobs = blob_labelling_into(mask, &mut labels, config)?;
    Ok(Labelling { labels, blobs })
}

/// Labels the mask and computes metrics of every blob.
pub fn find_blobs(mask: &RasterImage, config: &Config) -> Result<Labelling, Error> {
    let mut labelling = blob_labelling(mask, config)?;
    blob_info(&labelling.labels, &mut labelling.blobs, config)?;
    Ok(labelling)
}

/// Runs [`find_blobs`] on independent masks (e.g. video frames) in parallel.
///
/// Every mask gets its own label table. Results keep the order of `masks`.
pub fn find_blobs_batch(
    masks: &[RasterImage],
    config: &Config,
) -> Vec<Result<Labelling, Error>> {
    masks
        .par_iter()
        .map(|mask| find_blobs(mask, config))
        .collect()
}

/// Builds a mask from rows of text, `#` is foreground.
#[cfg(test)]
pub(crate) fn mask_from_rows(rows: &[&str]) -> RasterImage {
    let width = rows[0].len();
    let data: Vec<u8> = rows
        .iter()
        .flat_map(|row| {
            assert_eq!(row.len(), width);
            row.bytes().map(|c| if c == b'#' { 255 } else { 0 })
        })
        .collect();
    RasterImage::from_raw_slice(&data, width, rows.len(), 1, 255).unwrap()
}

#[cfg(test)]
pub(crate) fn random_mask(width: usize, height: usize, density: f64, seed: u64) -> RasterImage {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<u8> = (0..width * height)
        .map(|_| if rng.random_bool(density) { 1 } else { 0 })
        .collect();
    RasterImage::from_raw_slice(&data, width, height, 1, 255).unwrap()
}
