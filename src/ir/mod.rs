//! Canonical representation shared by every pipeline stage.
//!
//! Sources are decoded into [`AnnotatedImage`] values holding
//! [`BoxAnnotation`]s keyed by [`ClassIndex`], and written out as YOLO-style
//! label files under the [`CorpusLayout`] directory contract.
//!
//! # Example
//!
//! ```
//! use unilabel::ir::{BBox, BoxAnnotation, ClassIndex, Pixel};
//!
//! let bbox = BBox::<Pixel>::from_xyxy(10.0, 20.0, 30.0, 60.0).to_normalized(100.0, 200.0);
//! let ann = BoxAnnotation::from_normalized(ClassIndex::new(0), &bbox).unwrap();
//! assert_eq!(ann.to_label_line(), "0 0.200000 0.200000 0.200000 0.200000");
//! ```

mod geometry;
mod ids;
pub mod label_file;
pub mod layout;
mod model;

pub use geometry::{BBox, Normalized, Pixel};
pub use ids::ClassIndex;
pub use layout::{CorpusLayout, TransferMode};
pub use model::{AnnotatedImage, BoxAnnotation};
