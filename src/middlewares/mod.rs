#[cfg(feature = "middleware-logging")]
pub mod logging;
pub mod recovery;
pub mod trace;
