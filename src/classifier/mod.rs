//! # Content Classification
//!
//! Decides which specifications an archive needs by running sniffers over
//! its descriptor files and classes.

pub mod class_descriptor;
pub mod class_file;
pub mod class_loader;
pub mod sniffer;
pub mod sniffers;
pub mod specification;
pub mod specification_classifier;

pub use class_descriptor::{Annotation, ClassDescriptor};
pub use class_file::{parse_class, ClassFileError};
pub use class_loader::{ArchiveClassLoader, ClassLoadError, ClassLoader, StaticClassLoader};
pub use sniffer::{Sniffer, SnifferReport};
pub use specification::Specification;
pub use specification_classifier::{ClassificationResult, SpecificationClassifier};
