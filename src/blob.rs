use std::fmt::{Display, Formatter};

/// Struct of a labelled blob (4- or 8-connected foreground region).
///
/// `blob_labelling()` fills only `label`. The rest is filled by `metrics::blob_info()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Blob {
    /// Canonical label, the value of this blob's pixels in the label image.
    ///
    /// This is the smallest provisional label of the blob, not a dense `1..=n` index.
    pub label: u32,
    /// Left column of the bounding box
    pub x: usize,
    /// Top row of the bounding box
    pub y: usize,
    /// Bounding box width, 0 when the label doesn't occur in the image
    pub width: usize,
    /// Bounding box height, 0 when the label doesn't occur in the image
    pub height: usize,
    /// Number of pixels carrying the label
    pub area: usize,
    /// Mean x coordinate truncated toward zero
    pub xc: usize,
    /// Mean y coordinate truncated toward zero
    pub yc: usize,
    /// Number of pixels with at least one orthogonal neighbour of a different label
    pub perimeter: usize,
}

impl Blob {
    pub fn new(label: u32) -> Self {
        Self {
            label,
            ..Blob::default()
        }
    }

    /// Whether the label was found in the image by the last metrics pass.
    pub fn is_empty(&self) -> bool {
        self.area == 0
    }

    /// Right column of the bounding box (inclusive).
    pub fn right(&self) -> usize {
        (self.x + self.width).saturating_sub(1)
    }

    /// Bottom row of the bounding box (inclusive).
    pub fn bottom(&self) -> usize {
        (self.y + self.height).saturating_sub(1)
    }

    pub(crate) fn reset_metrics(&mut self) {
        *self = Blob::new(self.label);
    }
}

impl Display for Blob {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "blob {}: area = {}, perimeter = {}, bbox = ({}, {}, {}x{}), centroid = ({}, {})",
            self.label,
            self.area,
            self.perimeter,
            self.x,
            self.y,
            self.width,
            self.height,
            self.xc,
            self.yc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Blob;

    #[test]
    fn blob_display_test() {
        let blob = Blob {
            label: 3,
            x: 1,
            y: 2,
            width: 4,
            height: 5,
            area: 11,
            xc: 2,
            yc: 4,
            perimeter: 9,
        };
        assert_eq!(
            blob.to_string(),
            "blob 3: area = 11, perimeter = 9, bbox = (1, 2, 4x5), centroid = (2, 4)"
        );
        assert_eq!(blob.right(), 4);
        assert_eq!(blob.bottom(), 6);
    }

    #[test]
    fn blob_reset_test() {
        let mut blob = Blob {
            label: 7,
            area: 3,
            perimeter: 3,
            ..Blob::default()
        };
        blob.reset_metrics();
        assert_eq!(blob, Blob::new(7));
        assert!(blob.is_empty());
    }
}
