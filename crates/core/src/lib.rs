//! Domain model shared by the preview scheduler, the render coordinator and
//! the render backend.

pub mod brand;
pub mod error;
pub mod frame_data;
pub mod job;
pub mod request;
pub mod resolve;
pub mod script;
pub mod session;
pub mod theme;
pub mod timeline;
pub mod types;
