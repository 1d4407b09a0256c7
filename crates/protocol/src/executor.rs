use std::future::Future;
use std::sync::Arc;

use stormstream_common::ExecutorError;

use crate::Frame;

/// Executa um comando já codificado e devolve a resposta bruta.
///
/// Conexão, autenticação e roteamento são responsabilidade de quem implementa.
pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        command: &str,
        args: Vec<String>,
    ) -> impl Future<Output = Result<Frame, ExecutorError>> + Send;
}

impl<E: CommandExecutor> CommandExecutor for Arc<E> {
    fn execute(
        &self,
        command: &str,
        args: Vec<String>,
    ) -> impl Future<Output = Result<Frame, ExecutorError>> + Send {
        (**self).execute(command, args)
    }
}
