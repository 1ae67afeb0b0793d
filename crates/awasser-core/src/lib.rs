pub mod constants;
pub mod content;
pub mod error;
pub mod generation;
pub mod live;
pub mod orientation;
pub mod pcm;
pub mod projector;
pub mod quiz;
pub mod recent;
pub mod session;
pub mod spatial;
pub mod video;
pub mod view;
pub mod visualizer;

pub use constants::*;
pub use error::{Capability, Error, Result};
pub use orientation::*;
pub use projector::*;
pub use session::*;
pub use spatial::*;
pub use visualizer::*;
