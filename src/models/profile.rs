/// One company record from the source table. Names are not required to be
/// unique; duplicate rows render as separate cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    /// Identifier used to locate the image file under the images directory.
    pub image_ref: String,
    /// URL opened when the card is clicked. Not validated.
    pub link: String,
}

/// Coarse device class, used only to pick the grid column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportClass {
    Desktop,
    Mobile,
}

/// Image bytes re-encoded into a text-safe form for direct embedding in the
/// rendered page, plus the pixel dimensions of the decoded image.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub png_base64: String,
    pub width: u32,
    pub height: u32,
}
