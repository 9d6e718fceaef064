pub mod profile;

pub use profile::{InlineImage, Profile, ViewportClass};
