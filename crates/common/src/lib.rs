#![forbid(unsafe_code)]

mod error;

pub use error::*;

pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024; // 64 MB
pub const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024; // 4 KB
pub const DEFAULT_LOG_FILTER: &str = "stormstream_cli=info,stormstream_client=info,stormstream_storage=info";

/// Token que pede ao servidor para gerar o ID da entrada.
pub const AUTO_ID: &str = "*";
