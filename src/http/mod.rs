pub mod client;
pub(crate) mod csrf;
pub mod refresh;
