mod media_source;
mod remote_registry;

pub use media_source::*;
pub use remote_registry::*;
