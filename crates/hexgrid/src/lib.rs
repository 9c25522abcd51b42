pub mod clip;
pub mod id;
pub mod layout;
pub mod resolution;

pub use clip::{clip_segment, overlap_length, planar_length};
pub use id::{HexId, ParseHexIdError};
pub use resolution::{InvalidResolution, Resolution, MAX_RESOLUTION};
