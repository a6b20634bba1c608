pub mod frame_data;
pub mod loader;
pub mod stream;

pub use frame_data::{Frame, FrameSequence, FrameSource};
pub use loader::load;
pub use stream::StreamingSource;
