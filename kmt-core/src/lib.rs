//! The rules of the academy: levels, the course catalog, content gating and level progression.
//!
//! Everything here is pure. Persistence and sessions live in `kmt-collab`.

mod catalog;
mod config;
mod level;
mod news;
mod user;

pub mod gate;
pub mod progress;
pub mod progression;
pub mod settings;

pub use catalog::*;
pub use config::*;
pub use level::*;
pub use news::*;
pub use user::*;
