//! Infrastructure configuration modules.

pub mod logging;
pub mod provider;
pub mod settings;
pub mod sync;
