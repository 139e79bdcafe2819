//! Built-in field handlers.

pub mod datetime;
pub mod image;
pub mod relationship;
pub mod scalar;
pub mod structural;

pub use datetime::DateTimeHandler;
pub use image::ImageHandler;
pub use relationship::{ChildrenHandler, ParentHandler, ReferenceHandler};
pub use scalar::ScalarHandler;
pub use structural::{IdHandler, LanguageHandler, VersionHandler};
