pub mod buffer;
pub mod parser;
pub mod worker;

pub use buffer::DemoBuffer;
pub use parser::{AsyncParser, ParseError, ProgressHandle};
