pub mod cache;
pub mod demo;
pub mod demofile;
pub mod slots;
pub mod timeline;

mod error;
pub use error::{BuildError, DecodeError};

mod event;
pub use event::{DemoEvent, Decoder};

pub use demo::{CachedDemo, CachedDemoData};

/// Decodes a demo container and builds its timeline.
pub fn parse<P>(buf: &[u8], config: &timeline::Config, progress: P) -> Result<CachedDemoData, BuildError>
where
    P: FnMut(f32) -> std::ops::ControlFlow<()>,
{
    let file = demofile::DemoFile::parse(buf)?;
    timeline::build(file, config, progress)
}
