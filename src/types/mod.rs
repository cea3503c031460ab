// ABOUTME: Validated domain types shared by config, runtime, and deploy.
// ABOUTME: Uses phantom types so engine ids cannot be confused with plain strings.

mod id;
mod image_ref;
mod service_name;

pub use id::{ContainerId, Id};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use service_name::{ServiceName, ServiceNameError};
