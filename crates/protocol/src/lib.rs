#![forbid(unsafe_code)]

mod command;
mod executor;
mod frame;
pub mod options;
mod parse;
pub mod reply;

pub use command::{ClaimModifiers, Command};
pub use executor::CommandExecutor;
pub use frame::Frame;
pub use parse::Parse;
pub use reply::{EntryMap, StreamEntry};
