pub mod orientation;
pub mod pointer;

pub use orientation::{request_permission, wire_device_orientation};
pub use pointer::{wire_drag, wire_sampler_pointer};
