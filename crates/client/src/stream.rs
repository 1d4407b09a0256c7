use tracing::{debug, warn};

use stormstream_common::{ClientError, ClientResult, CommandError, ExecutorError, ReplyError};
use stormstream_protocol::options::{AddOptions, ClaimOptions, JUSTID, ToArgs, TrimOptions};
use stormstream_protocol::{CommandExecutor, EntryMap, Frame, reply};

/// Comandos do grupo "stream" sobre um [`CommandExecutor`].
///
/// Cada chamada valida a entrada, converte as opções em tokens, executa
/// e projeta a resposta no tipo de retorno. Nenhum estado é compartilhado
/// entre chamadas.
#[derive(Debug, Clone)]
pub struct StreamClient<E> {
    executor: E,
}

impl<E: CommandExecutor> StreamClient<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Adiciona uma entrada ao stream em `key`, criando o stream se preciso.
    ///
    /// Retorna o ID gerado.
    pub async fn add<F, V>(&self, key: &str, values: &[(F, V)]) -> ClientResult<Option<String>>
    where
        F: AsRef<str>,
        V: AsRef<str>,
    {
        self.add_with_options(key, values, &AddOptions::new()).await
    }

    /// Adiciona uma entrada com opções (ID explícito, NOMKSTREAM, trimming).
    ///
    /// Retorna `None` quando o stream não existe e a criação foi desabilitada.
    pub async fn add_with_options<F, V>(
        &self,
        key: &str,
        values: &[(F, V)],
        options: &AddOptions,
    ) -> ClientResult<Option<String>>
    where
        F: AsRef<str>,
        V: AsRef<str>,
    {
        validate_key(key)?;
        if values.is_empty() {
            return Err(CommandError::InvalidArgument("nenhum par campo/valor".into()).into());
        }

        let mut args = vec![key.to_string()];
        args.extend(options.to_args()?);
        for (field, value) in values {
            args.push(field.as_ref().to_string());
            args.push(value.as_ref().to_string());
        }

        let frame = self.send("XADD", args).await?;
        decode("XADD", reply::optional_string(frame))
    }

    /// Faz trimming do stream. Retorna o número de entradas removidas.
    pub async fn trim(&self, key: &str, options: &TrimOptions) -> ClientResult<u64> {
        validate_key(key)?;
        let mut args = vec![key.to_string()];
        args.extend(options.to_args()?);

        let frame = self.send("XTRIM", args).await?;
        let removed = decode("XTRIM", reply::integer(frame))?;
        Ok(removed.max(0) as u64)
    }

    /// Transfere a posse de mensagens pendentes para `consumer`.
    pub async fn claim<S: AsRef<str>>(
        &self,
        key: &str,
        group: &str,
        consumer: &str,
        min_idle_ms: u64,
        ids: &[S],
    ) -> ClientResult<EntryMap> {
        self.claim_with_options(key, group, consumer, min_idle_ms, ids, &ClaimOptions::new())
            .await
    }

    /// Como [`claim`](Self::claim), com IDLE, TIME, RETRYCOUNT e FORCE.
    pub async fn claim_with_options<S: AsRef<str>>(
        &self,
        key: &str,
        group: &str,
        consumer: &str,
        min_idle_ms: u64,
        ids: &[S],
        options: &ClaimOptions,
    ) -> ClientResult<EntryMap> {
        let args = claim_args(key, group, consumer, min_idle_ms, ids, options)?;
        let frame = self.send("XCLAIM", args).await?;
        decode("XCLAIM", reply::entry_map(frame))
    }

    /// Como [`claim`](Self::claim), mas retorna apenas os IDs (JUSTID).
    pub async fn claim_just_id<S: AsRef<str>>(
        &self,
        key: &str,
        group: &str,
        consumer: &str,
        min_idle_ms: u64,
        ids: &[S],
    ) -> ClientResult<Vec<String>> {
        self.claim_just_id_with_options(key, group, consumer, min_idle_ms, ids, &ClaimOptions::new())
            .await
    }

    pub async fn claim_just_id_with_options<S: AsRef<str>>(
        &self,
        key: &str,
        group: &str,
        consumer: &str,
        min_idle_ms: u64,
        ids: &[S],
        options: &ClaimOptions,
    ) -> ClientResult<Vec<String>> {
        let mut args = claim_args(key, group, consumer, min_idle_ms, ids, options)?;
        args.push(JUSTID.to_string());
        let frame = self.send("XCLAIM", args).await?;
        decode("XCLAIM", reply::string_list(frame))
    }

    /// Executa e separa respostas de erro do servidor.
    async fn send(&self, command: &str, args: Vec<String>) -> ClientResult<Frame> {
        debug!("{command} com {} argumentos", args.len());
        match self.executor.execute(command, args).await? {
            Frame::Error(msg) => Err(ExecutorError::Server(msg).into()),
            frame => Ok(frame),
        }
    }
}

fn validate_key(key: &str) -> Result<(), CommandError> {
    if key.is_empty() {
        return Err(CommandError::InvalidArgument("chave vazia".into()));
    }
    Ok(())
}

/// Argumentos posicionais do XCLAIM seguidos das opções.
fn claim_args<S: AsRef<str>>(
    key: &str,
    group: &str,
    consumer: &str,
    min_idle_ms: u64,
    ids: &[S],
    options: &ClaimOptions,
) -> ClientResult<Vec<String>> {
    validate_key(key)?;
    if ids.is_empty() {
        return Err(CommandError::InvalidArgument("nenhum ID informado".into()).into());
    }

    let mut args = Vec::with_capacity(4 + ids.len());
    args.push(key.to_string());
    args.push(group.to_string());
    args.push(consumer.to_string());
    args.push(min_idle_ms.to_string());
    args.extend(ids.iter().map(|id| id.as_ref().to_string()));
    args.extend(options.to_args()?);
    Ok(args)
}

fn decode<T>(command: &str, result: Result<T, ReplyError>) -> ClientResult<T> {
    result.map_err(|e| {
        warn!("resposta inválida para {command}: {e}");
        ClientError::Reply(e)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use stormstream_common::ConnectionError;
    use stormstream_protocol::options::TrimOptions;

    use super::*;

    type Reply = fn() -> Result<Frame, ExecutorError>;

    /// Executor que grava as chamadas e devolve uma resposta fixa.
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        reply: Reply,
    }

    impl Recorder {
        fn new(reply: Reply) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply,
            }
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandExecutor for Recorder {
        async fn execute(&self, command: &str, args: Vec<String>) -> Result<Frame, ExecutorError> {
            self.calls
                .lock()
                .unwrap()
                .push((command.to_string(), args));
            (self.reply)()
        }
    }

    fn client(reply: Reply) -> StreamClient<Recorder> {
        StreamClient::new(Recorder::new(reply))
    }

    #[tokio::test]
    async fn add_sends_auto_id_before_fields() {
        let client = client(|| Ok(Frame::bulk("1526919030474-55")));
        let id = client
            .add("myStream", &[("field1", "value1"), ("field2", "value2")])
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("1526919030474-55"));
        let calls = client.executor().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "XADD");
        assert_eq!(
            calls[0].1,
            vec!["myStream", "*", "field1", "value1", "field2", "value2"]
        );
    }

    #[tokio::test]
    async fn add_with_options_places_modifiers_after_key() {
        let client = client(|| Ok(Frame::bulk("100-500")));
        let options = AddOptions::new()
            .id("100-500")
            .dont_make_stream()
            .trim(TrimOptions::max_len(1000).approximate());
        client
            .add_with_options("s", &[("f", "v")], &options)
            .await
            .unwrap();
        let (_, args) = &client.executor().calls()[0];
        assert_eq!(
            args,
            &vec!["s", "NOMKSTREAM", "MAXLEN", "~", "1000", "100-500", "f", "v"]
        );
    }

    #[tokio::test]
    async fn add_null_reply_is_none() {
        let client = client(|| Ok(Frame::Null));
        let id = client
            .add_with_options("s", &[("f", "v")], &AddOptions::new().dont_make_stream())
            .await
            .unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn empty_key_short_circuits() {
        let client = client(|| Ok(Frame::Null));
        let err = client.add("", &[("f", "v")]).await.unwrap_err();
        assert!(matches!(err, ClientError::Command(CommandError::InvalidArgument(_))));
        assert!(client.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn empty_values_short_circuit() {
        let client = client(|| Ok(Frame::Null));
        let values: &[(&str, &str)] = &[];
        assert!(client.add("s", values).await.is_err());
        assert!(client.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn claim_without_ids_short_circuits() {
        let client = client(|| Ok(Frame::Array(vec![])));
        let ids: &[&str] = &[];
        assert!(client.claim("s", "g", "c", 0, ids).await.is_err());
        assert!(client.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn claim_with_options_token_order() {
        let client = client(|| Ok(Frame::Array(vec![])));
        let options = ClaimOptions::new().retry_count(3).force();
        let claimed = client
            .claim_with_options("s", "g", "c", 100, &["1-0", "2-0"], &options)
            .await
            .unwrap();
        assert!(claimed.is_empty());
        let (name, args) = &client.executor().calls()[0];
        assert_eq!(name, "XCLAIM");
        assert_eq!(
            args,
            &vec!["s", "g", "c", "100", "1-0", "2-0", "RETRYCOUNT", "3", "FORCE"]
        );
    }

    #[tokio::test]
    async fn claim_just_id_appends_justid_last() {
        let client = client(|| Ok(Frame::array_from_strs(&["2-0", "1-0"])));
        let options = ClaimOptions::new().idle(50);
        let ids = client
            .claim_just_id_with_options("s", "g", "c", 0, &["1-0", "2-0"], &options)
            .await
            .unwrap();
        assert_eq!(ids, vec!["2-0", "1-0"]);
        let (_, args) = &client.executor().calls()[0];
        assert_eq!(args.last().map(String::as_str), Some("JUSTID"));
        assert_eq!(&args[6..], &["IDLE", "50", "JUSTID"]);
    }

    #[tokio::test]
    async fn claim_decodes_entries_in_order() {
        let client = client(|| {
            Ok(Frame::Array(vec![
                Frame::Array(vec![Frame::bulk("2-0"), Frame::array_from_strs(&["b", "2"])]),
                Frame::Array(vec![Frame::bulk("1-0"), Frame::array_from_strs(&["a", "1"])]),
            ]))
        });
        let claimed = client.claim("s", "g", "c", 0, &["1-0", "2-0"]).await.unwrap();
        assert_eq!(claimed.ids().collect::<Vec<_>>(), vec!["2-0", "1-0"]);
    }

    #[tokio::test]
    async fn server_error_passes_through() {
        let client = client(|| Ok(Frame::Error("NOGROUP No such key 's'".into())));
        let err = client.claim("s", "g", "c", 0, &["1-0"]).await.unwrap_err();
        match err {
            ClientError::Executor(ExecutorError::Server(msg)) => {
                assert_eq!(msg, "NOGROUP No such key 's'")
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_error_passes_through() {
        let client = client(|| Err(ConnectionError::Shutdown.into()));
        let err = client.add("s", &[("f", "v")]).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Executor(ExecutorError::Connection(ConnectionError::Shutdown))
        ));
    }

    #[tokio::test]
    async fn shape_mismatch_is_reply_error() {
        let client = client(|| Ok(Frame::Integer(1)));
        let err = client.claim("s", "g", "c", 0, &["1-0"]).await.unwrap_err();
        assert!(matches!(err, ClientError::Reply(ReplyError::UnexpectedType { .. })));

        let err = client.claim_just_id("s", "g", "c", 0, &["1-0"]).await.unwrap_err();
        assert!(matches!(err, ClientError::Reply(_)));
    }

    #[tokio::test]
    async fn trim_returns_removed_count() {
        let client = client(|| Ok(Frame::Integer(4)));
        let removed = client
            .trim("s", &TrimOptions::min_id("10-0").approximate_with_limit(4))
            .await
            .unwrap();
        assert_eq!(removed, 4);
        let (name, args) = &client.executor().calls()[0];
        assert_eq!(name, "XTRIM");
        assert_eq!(args, &vec!["s", "MINID", "~", "10-0", "LIMIT", "4"]);
    }
}
