//! Runtime core: the [`Warden`] context and its shutdown path.
//!
//! - [`warden`]: owns bus, subscribers, root token and config; tracks stewards;
//! - [`builder`]: wires subscribers into a new warden;
//! - [`shutdown`]: termination signal handling.

mod builder;
mod shutdown;
mod warden;

pub use builder::WardenBuilder;
pub use warden::Warden;
