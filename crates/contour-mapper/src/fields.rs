//! Composite field value objects.

use contour_types::Guid;
use serde::{Deserialize, Serialize};

/// An image field: a media link plus display attributes.
///
/// Absent attributes read as zero values (empty strings, `0`, nil media id).
/// A nil [`Image::media_id`] is a valid image without a media link, which is
/// different from having no image at all (`Option<Image>::None`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Alternate text.
    pub alt: String,
    /// Border style hint.
    pub border: String,
    /// CSS class hint.
    pub class: String,
    /// Height in pixels.
    pub height: i32,
    /// Width in pixels.
    pub width: i32,
    /// Horizontal spacing in pixels.
    pub hspace: i32,
    /// Vertical spacing in pixels.
    pub vspace: i32,
    /// Linked media item, nil when unlinked.
    pub media_id: Guid,
}

impl Image {
    /// Media URL for the linked item, empty when unlinked.
    pub fn src(&self) -> String {
        if self.media_id.is_nil() {
            String::new()
        } else {
            format!("/~/media/{}.ashx", self.media_id.to_simple())
        }
    }
}
