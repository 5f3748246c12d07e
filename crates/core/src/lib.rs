pub mod analysis;
pub mod clustering;
pub mod content;
pub mod mapping;
pub mod pipeline;
pub mod shared;
pub mod swapping;
pub mod video;
