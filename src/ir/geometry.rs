//! Axis-aligned boxes tagged with the coordinate space they live in.
//!
//! Sources hand us boxes in a handful of conventions (corner pairs, top-left
//! plus extent, already-normalized fractions). Everything is funneled through
//! [`BBox`] in XYXY form, then clipped and expressed as a center/extent
//! fraction of the image.

use std::fmt;
use std::marker::PhantomData;

/// Marker for absolute pixel coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker for coordinates expressed as fractions of the image size.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

/// A box in XYXY form (xmin, ymin, xmax, ymax).
///
/// Construction does not enforce `min <= max`; callers check
/// [`BBox::is_degenerate`] after clipping.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox<TSpace> {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBox<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    /// Builds a box from a top-left corner plus width and height (COCO, ODGT).
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    /// Builds a box from its center and extent (YOLO label rows).
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns `(cx, cy, w, h)`.
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        (
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
            self.width(),
            self.height(),
        )
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite() && self.ymin.is_finite() && self.xmax.is_finite() && self.ymax.is_finite()
    }

    /// True when the box has no usable area or carries NaN/infinite values.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.width() <= 0.0 || self.height() <= 0.0
    }

    fn clip(&self, max_x: f64, max_y: f64) -> Self {
        Self::from_xyxy(
            self.xmin.clamp(0.0, max_x),
            self.ymin.clamp(0.0, max_y),
            self.xmax.clamp(0.0, max_x),
            self.ymax.clamp(0.0, max_y),
        )
    }
}

impl BBox<Pixel> {
    /// Clips to `[0, width] x [0, height]` and divides by the image size.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBox<Normalized> {
        let clipped = self.clip(image_width, image_height);
        BBox::from_xyxy(
            clipped.xmin / image_width,
            clipped.ymin / image_height,
            clipped.xmax / image_width,
            clipped.ymax / image_height,
        )
    }
}

impl BBox<Normalized> {
    /// Clips to the unit square.
    pub fn clip_unit(&self) -> Self {
        self.clip(1.0, 1.0)
    }
}

impl<TSpace> fmt::Debug for BBox<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBox")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}
