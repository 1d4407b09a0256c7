/// Erros de parsing do protocolo RESP.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame incompleto")]
    Incomplete,
    #[error("byte de tipo inválido: {0:#x}")]
    InvalidFrameType(u8),
    #[error("inteiro inválido: {0}")]
    InvalidInteger(String),
    #[error("comprimento de bulk inválido: {0}")]
    InvalidBulkLength(i64),
    #[error("frame excede tamanho máximo ({0} bytes)")]
    FrameTooLarge(usize),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
}

/// Erros ao converter opções em argumentos de comando.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("combinação de opções inválida: {0}")]
    InvalidCombination(String),
}

/// Erros de parsing/validação de comandos.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("número errado de argumentos para '{0}'")]
    WrongArity(String),
    #[error("erro de sintaxe: {0}")]
    Syntax(String),
    #[error("argumento inválido: {0}")]
    InvalidArgument(String),
}

/// Erros de conexão com o executor.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("conexão resetada pelo peer")]
    ConnectionReset,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("executor em shutdown")]
    Shutdown,
}

/// Falhas reportadas pelo executor. Repassadas sem alteração ao chamador.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// Resposta de erro do servidor, com a mensagem original.
    #[error("{0}")]
    Server(String),
}

/// Resposta com formato diferente do esperado pelo tipo de retorno.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("resposta inesperada: esperado {expected}, recebido {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("lista de campos com tamanho ímpar ({0})")]
    OddFieldCount(usize),
    #[error("entrada malformada: {0}")]
    MalformedEntry(String),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
}

/// Erros do armazenamento in-memory de streams.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("ID de stream inválido: {0}")]
    InvalidStreamId(String),
    #[error("ID especificado é menor ou igual ao último item do stream")]
    IdTooSmall,
    #[error("ID especificado deve ser maior que 0-0")]
    IdZero,
    #[error("chave '{key}' ou grupo '{group}' inexistente")]
    NoGroup { key: String, group: String },
    #[error("grupo de consumidores já existe: {0}")]
    GroupExists(String),
    #[error("chave não encontrada")]
    KeyNotFound,
}

/// Erro top-level do cliente de streams.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    Reply(#[from] ReplyError),
}

/// Result type alias.
pub type ClientResult<T> = Result<T, ClientError>;

// Conversão implícita de ConnectionError → ClientError (via ExecutorError)
impl From<ConnectionError> for ClientError {
    fn from(e: ConnectionError) -> Self {
        ClientError::Executor(ExecutorError::Connection(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::Incomplete;
        assert_eq!(err.to_string(), "frame incompleto");
    }

    #[test]
    fn server_error_keeps_message() {
        let err: ClientError = ExecutorError::Server("NOGROUP No such key".into()).into();
        assert_eq!(err.to_string(), "NOGROUP No such key");
    }

    #[test]
    fn client_error_from_connection() {
        let err: ClientError = ConnectionError::Shutdown.into();
        assert!(matches!(
            err,
            ClientError::Executor(ExecutorError::Connection(ConnectionError::Shutdown))
        ));
    }

    #[test]
    fn client_error_from_reply() {
        let err: ClientError = ReplyError::OddFieldCount(3).into();
        assert!(matches!(err, ClientError::Reply(ReplyError::OddFieldCount(3))));
    }

    #[test]
    fn reply_error_display() {
        let err = ReplyError::UnexpectedType {
            expected: "array",
            found: "integer",
        };
        assert_eq!(
            err.to_string(),
            "resposta inesperada: esperado array, recebido integer"
        );
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::NoGroup {
            key: "s".into(),
            group: "g".into(),
        };
        assert_eq!(err.to_string(), "chave 's' ou grupo 'g' inexistente");
    }

    #[test]
    fn command_error_display() {
        let err = CommandError::WrongArity("XADD".into());
        assert_eq!(err.to_string(), "número errado de argumentos para 'XADD'");
    }
}
