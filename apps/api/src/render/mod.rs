// Declaration output. Rendering is CPU-bound and must run inside
// tokio::task::spawn_blocking.

pub mod declaration;
pub mod header_image;
pub mod pdf;
