mod autoplay;
mod config;
mod session;
pub use autoplay::*;
pub use config::*;
pub use session::*;
