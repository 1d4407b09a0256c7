use std::io::Cursor;

use bytes::BytesMut;
use tracing::debug;

use stormstream_common::{ConnectionError, ExecutorError, INITIAL_BUFFER_CAPACITY, StorageError};
use stormstream_protocol::{Command, CommandExecutor, Frame};

use crate::Db;
use crate::stream::{Fields, StreamId};

impl CommandExecutor for Db {
    /// Passa o comando pelo codec RESP, executa e devolve a resposta
    /// também decodificada do wire.
    async fn execute(&self, command: &str, args: Vec<String>) -> Result<Frame, ExecutorError> {
        let request = through_wire(&Frame::command(command, &args))?;

        let cmd = match Command::from_frame(request) {
            Ok(cmd) => cmd,
            Err(e) => return through_wire(&error_line(format!("ERR {e}"))),
        };

        debug!(write = cmd.is_write(), "comando recebido: {cmd:?}");
        let response = execute_command(&cmd, self);
        through_wire(&response)
    }
}

/// Encoda e decodifica o frame, como faria uma conexão real.
fn through_wire(frame: &Frame) -> Result<Frame, ExecutorError> {
    let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
    frame.encode(&mut buf);

    let mut cursor = Cursor::new(&buf[..]);
    Frame::check(&mut cursor)
        .and_then(|()| {
            cursor.set_position(0);
            Frame::parse(&mut cursor)
        })
        .map_err(|e| {
            ConnectionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            ))
            .into()
        })
}

/// Executa um comando e retorna o Frame de resposta.
fn execute_command(cmd: &Command, db: &Db) -> Frame {
    match cmd {
        Command::Ping(msg) => match msg {
            Some(m) => Frame::bulk(m),
            None => Frame::Simple("PONG".into()),
        },
        Command::XAdd {
            key,
            make_stream,
            trim,
            id,
            fields,
        } => match db.xadd(key, *make_stream, trim.as_ref(), id, fields.clone()) {
            Ok(Some(id)) => Frame::bulk(&id.to_string()),
            Ok(None) => Frame::Null,
            Err(e) => error_frame(e),
        },
        Command::XTrim { key, trim } => match db.xtrim(key, trim) {
            Ok(removed) => Frame::Integer(removed as i64),
            Err(e) => error_frame(e),
        },
        Command::XLen(key) => Frame::Integer(db.xlen(key) as i64),
        Command::XRange {
            key,
            start,
            end,
            count,
        } => match db.xrange(key, start, end, *count) {
            Ok(entries) => Frame::Array(
                entries
                    .into_iter()
                    .map(|(id, fields)| entry_frame(id, Some(fields)))
                    .collect(),
            ),
            Err(e) => error_frame(e),
        },
        Command::XGroupCreate {
            key,
            group,
            id,
            make_stream,
        } => match db.xgroup_create(key, group, id, *make_stream) {
            Ok(()) => Frame::Simple("OK".into()),
            Err(e) => error_frame(e),
        },
        Command::XReadGroup {
            group,
            consumer,
            count,
            streams,
        } => match db.xreadgroup(group, consumer, *count, streams) {
            Ok(read) if read.is_empty() => Frame::Null,
            Ok(read) => Frame::Array(
                read.into_iter()
                    .map(|(key, entries)| {
                        Frame::Array(vec![
                            Frame::bulk(&key),
                            Frame::Array(
                                entries
                                    .into_iter()
                                    .map(|(id, fields)| entry_frame(id, fields))
                                    .collect(),
                            ),
                        ])
                    })
                    .collect(),
            ),
            Err(e) => error_frame(e),
        },
        Command::XClaim {
            key,
            group,
            consumer,
            min_idle_ms,
            ids,
            modifiers,
        } => match db.xclaim(key, group, consumer, *min_idle_ms, ids, modifiers) {
            Ok(claimed) if modifiers.just_id => Frame::Array(
                claimed
                    .into_iter()
                    .map(|(id, _)| Frame::bulk(&id.to_string()))
                    .collect(),
            ),
            Ok(claimed) => Frame::Array(
                claimed
                    .into_iter()
                    .map(|(id, fields)| entry_frame(id, Some(fields)))
                    .collect(),
            ),
            Err(e) => error_frame(e),
        },
        Command::XAck { key, group, ids } => match db.xack(key, group, ids) {
            Ok(count) => Frame::Integer(count as i64),
            Err(e) => error_frame(e),
        },
        Command::Del(keys) => Frame::Integer(db.del(keys) as i64),
        Command::Unknown(name) => error_line(format!("ERR unknown command '{name}'")),
    }
}

fn entry_frame(id: StreamId, fields: Option<Fields>) -> Frame {
    let fields = match fields {
        Some(fields) => Frame::Array(
            fields
                .iter()
                .flat_map(|(f, v)| [Frame::bulk(f), Frame::bulk(v)])
                .collect(),
        ),
        None => Frame::Null,
    };
    Frame::Array(vec![Frame::bulk(&id.to_string()), fields])
}

fn error_frame(err: StorageError) -> Frame {
    let msg = match err {
        StorageError::InvalidStreamId(_) => {
            "ERR Invalid stream ID specified as stream command argument".to_string()
        }
        StorageError::IdTooSmall => {
            "ERR The ID specified in XADD is equal or smaller than the target stream top item"
                .to_string()
        }
        StorageError::IdZero => "ERR The ID specified in XADD must be greater than 0-0".to_string(),
        StorageError::NoGroup { key, group } => {
            format!("NOGROUP No such key '{key}' or consumer group '{group}'")
        }
        StorageError::GroupExists(_) => "BUSYGROUP Consumer Group name already exists".to_string(),
        StorageError::KeyNotFound => "ERR The XGROUP subcommand requires the key to exist. \
             Note that for CREATE you may want to use the MKSTREAM option to create an empty \
             stream automatically."
            .to_string(),
    };
    error_line(msg)
}

/// Erros RESP ocupam uma linha: CR e LF viram espaço.
fn error_line(msg: String) -> Frame {
    if msg.contains(['\r', '\n']) {
        Frame::Error(msg.replace(['\r', '\n'], " "))
    } else {
        Frame::Error(msg)
    }
}
