pub mod compliance;
pub mod detection;
pub mod overlay;
pub mod pipeline;
pub mod shared;
pub mod video;
