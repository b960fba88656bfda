//! Per-image annotation model shared by every source normalizer.
//!
//! Unlike a whole-dataset representation, this model is deliberately
//! image-at-a-time: sources are converted one image per step and written out
//! immediately, so nothing larger than a single image's boxes is kept alive.

use super::geometry::{BBox, Normalized};
use super::ids::ClassIndex;

/// One box in canonical form: class plus center/extent fractions of the
/// image's own width and height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxAnnotation {
    pub class: ClassIndex,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl BoxAnnotation {
    pub fn new(class: ClassIndex, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { class, cx, cy, w, h }
    }

    /// Clips a normalized box to the unit square and converts it.
    ///
    /// Returns `None` when nothing usable remains after clipping.
    pub fn from_normalized(class: ClassIndex, bbox: &BBox<Normalized>) -> Option<Self> {
        let clipped = bbox.clip_unit();
        if clipped.is_degenerate() {
            return None;
        }
        let (cx, cy, w, h) = clipped.to_cxcywh();
        Some(Self::new(class, cx, cy, w, h))
    }

    /// Renders the canonical label line `"<class> <cx> <cy> <w> <h>"`.
    pub fn to_label_line(&self) -> String {
        format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class, self.cx, self.cy, self.w, self.h
        )
    }
}

/// An image together with the boxes that survived conversion.
#[derive(Clone, Debug)]
pub struct AnnotatedImage {
    /// Identifier shared by the image file and its label file.
    pub stem: String,

    /// File name of the image inside the split's `images/` directory.
    pub file_name: String,

    /// Pixel size, when the source geometry needed it.
    ///
    /// Sources that ship already-normalized boxes leave this empty.
    pub dimensions: Option<(u32, u32)>,

    pub annotations: Vec<BoxAnnotation>,
}

impl AnnotatedImage {
    pub fn new(stem: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            file_name: file_name.into(),
            dimensions: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn label_lines(&self) -> Vec<String> {
        self.annotations
            .iter()
            .map(BoxAnnotation::to_label_line)
            .collect()
    }
}
