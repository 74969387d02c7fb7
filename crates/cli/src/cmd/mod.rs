mod build;
mod check;
mod draft;
mod guess;
mod network;

pub use build::cmd_build;
pub use check::cmd_check;
pub use draft::cmd_draft;
pub use guess::cmd_guess;
pub use network::{cmd_network_add, cmd_network_remove};
