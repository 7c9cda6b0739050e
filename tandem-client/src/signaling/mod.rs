mod signal_channel;

pub use signal_channel::*;
