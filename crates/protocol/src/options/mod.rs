//! Opções de comandos e sua conversão em argumentos.
//!
//! Cada tipo de opções é montado por um builder fluente e convertido, via
//! [`ToArgs`], numa sequência de tokens na ordem exigida pelo comando.

mod add;
mod claim;
mod scan;
mod trim;
mod tristate;

pub use add::AddOptions;
pub use claim::ClaimOptions;
pub use scan::{ScanOptions, ZScanOptions};
pub use trim::{TrimExactness, TrimMethod, TrimOptions};
pub use tristate::TriState;

use stormstream_common::EncodingError;

pub const NOMKSTREAM: &str = "NOMKSTREAM";
pub const MAXLEN: &str = "MAXLEN";
pub const MINID: &str = "MINID";
pub const LIMIT: &str = "LIMIT";
pub const EXACT: &str = "=";
pub const APPROXIMATE: &str = "~";
pub const IDLE: &str = "IDLE";
pub const TIME: &str = "TIME";
pub const RETRYCOUNT: &str = "RETRYCOUNT";
pub const FORCE: &str = "FORCE";
pub const JUSTID: &str = "JUSTID";
pub const MATCH: &str = "MATCH";
pub const COUNT: &str = "COUNT";
pub const NOSCORES: &str = "NOSCORES";

/// Conversão de um conjunto de opções em tokens do comando.
pub trait ToArgs {
    fn to_args(&self) -> Result<Vec<String>, EncodingError>;
}
