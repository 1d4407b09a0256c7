//! Cliente tipado para comandos de stream.
//!
//! [`StreamClient`] monta os argumentos de XADD, XTRIM e XCLAIM a partir das
//! opções de [`stormstream_protocol::options`] e delega a execução a um
//! [`CommandExecutor`].

mod stream;

pub use stream::StreamClient;

pub use stormstream_common::{ClientError, ClientResult};
pub use stormstream_protocol::options::{AddOptions, ClaimOptions, TrimOptions};
pub use stormstream_protocol::{CommandExecutor, EntryMap, StreamEntry};
