use stormstream_common::CommandError;

use crate::options::{
    APPROXIMATE, COUNT, EXACT, FORCE, IDLE, JUSTID, LIMIT, MAXLEN, MINID, NOMKSTREAM,
    RETRYCOUNT, TIME, TrimExactness, TrimOptions,
};
use crate::{Frame, Parse};

/// Modificadores do XCLAIM, como lidos pelo servidor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimModifiers {
    pub idle_ms: Option<u64>,
    pub time_ms: Option<u64>,
    pub retry_count: Option<u64>,
    pub force: bool,
    pub just_id: bool,
}

/// Comandos de stream aceitos pelo store.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping(Option<String>),
    XAdd {
        key: String,
        make_stream: bool,
        trim: Option<TrimOptions>,
        id: String,
        fields: Vec<(String, String)>,
    },
    XTrim {
        key: String,
        trim: TrimOptions,
    },
    XLen(String),
    XRange {
        key: String,
        start: String,
        end: String,
        count: Option<usize>,
    },
    XGroupCreate {
        key: String,
        group: String,
        id: String,
        make_stream: bool,
    },
    XReadGroup {
        group: String,
        consumer: String,
        count: Option<usize>,
        streams: Vec<(String, String)>,
    },
    XClaim {
        key: String,
        group: String,
        consumer: String,
        min_idle_ms: u64,
        ids: Vec<String>,
        modifiers: ClaimModifiers,
    },
    XAck {
        key: String,
        group: String,
        ids: Vec<String>,
    },
    Del(Vec<String>),
    Unknown(String),
}

impl Command {
    /// Faz o parse de um Frame em um Command.
    pub fn from_frame(frame: Frame) -> Result<Command, CommandError> {
        let mut parse = Parse::new(frame)?;
        let cmd_name = parse.next_keyword()?;

        let cmd = match cmd_name.as_str() {
            "PING" => {
                let msg = if parse.has_remaining() {
                    Some(parse.next_string()?)
                } else {
                    None
                };
                parse.finish()?;
                Command::Ping(msg)
            }
            "XADD" => parse_xadd(&mut parse)?,
            "XTRIM" => {
                let key = parse.next_string()?;
                let method = parse.next_keyword()?;
                let trim = parse_trim(&mut parse, &method)?;
                parse.finish()?;
                Command::XTrim { key, trim }
            }
            "XLEN" => {
                let key = parse.next_string()?;
                parse.finish()?;
                Command::XLen(key)
            }
            "XRANGE" => {
                let key = parse.next_string()?;
                let start = parse.next_string()?;
                let end = parse.next_string()?;
                let count = parse_count(&mut parse)?;
                parse.finish()?;
                Command::XRange {
                    key,
                    start,
                    end,
                    count,
                }
            }
            "XGROUP" => parse_xgroup(&mut parse)?,
            "XREADGROUP" => parse_xreadgroup(&mut parse)?,
            "XCLAIM" => parse_xclaim(&mut parse)?,
            "XACK" => {
                let key = parse.next_string()?;
                let group = parse.next_string()?;
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("XACK".into()));
                }
                let mut ids = Vec::new();
                while parse.has_remaining() {
                    ids.push(parse.next_string()?);
                }
                Command::XAck { key, group, ids }
            }
            "DEL" => {
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("DEL".into()));
                }
                let mut keys = Vec::new();
                while parse.has_remaining() {
                    keys.push(parse.next_string()?);
                }
                Command::Del(keys)
            }
            _ => Command::Unknown(cmd_name),
        };

        Ok(cmd)
    }

    /// Verdadeiro para comandos que alteram o estado do store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::XAdd { .. }
                | Command::XTrim { .. }
                | Command::XGroupCreate { .. }
                | Command::XReadGroup { .. }
                | Command::XClaim { .. }
                | Command::XAck { .. }
                | Command::Del(_)
        )
    }
}

fn parse_xadd(parse: &mut Parse) -> Result<Command, CommandError> {
    let key = parse.next_string()?;
    let mut make_stream = true;
    let mut trim = None;

    // Modificadores vêm antes do ID
    loop {
        match parse.peek_keyword().as_deref() {
            Some(NOMKSTREAM) => {
                parse.next_string()?;
                make_stream = false;
            }
            Some(kw @ (MAXLEN | MINID)) => {
                let method = kw.to_string();
                parse.next_string()?;
                trim = Some(parse_trim(parse, &method)?);
            }
            _ => break,
        }
    }

    let id = parse.next_string()?;
    if !parse.has_remaining() || parse.remaining() % 2 != 0 {
        return Err(CommandError::WrongArity("XADD".into()));
    }
    let mut fields = Vec::with_capacity(parse.remaining() / 2);
    while parse.has_remaining() {
        let field = parse.next_string()?;
        let value = parse.next_string()?;
        fields.push((field, value));
    }

    Ok(Command::XAdd {
        key,
        make_stream,
        trim,
        id,
        fields,
    })
}

/// Lê `[=|~] threshold [LIMIT n]` depois de MAXLEN/MINID.
fn parse_trim(parse: &mut Parse, method: &str) -> Result<TrimOptions, CommandError> {
    let exactness = match parse.peek_keyword().as_deref() {
        Some(EXACT) => {
            parse.next_string()?;
            TrimExactness::Exact
        }
        Some(APPROXIMATE) => {
            parse.next_string()?;
            TrimExactness::Approximate
        }
        _ => TrimExactness::Unset,
    };

    let mut trim = match method {
        MAXLEN => {
            let threshold = parse.next_u64().map_err(|_| {
                CommandError::InvalidArgument("MAXLEN deve ser um inteiro não negativo".into())
            })?;
            TrimOptions::max_len(threshold)
        }
        MINID => TrimOptions::min_id(parse.next_string()?),
        other => return Err(CommandError::Syntax(format!("esperado MAXLEN ou MINID, recebido '{other}'"))),
    };

    let limit = if parse.peek_keyword().as_deref() == Some(LIMIT) {
        parse.next_string()?;
        Some(parse.next_u64()?)
    } else {
        None
    };

    trim = match (exactness, limit) {
        (TrimExactness::Approximate, Some(limit)) => trim.approximate_with_limit(limit),
        (TrimExactness::Approximate, None) => trim.approximate(),
        (_, Some(_)) => {
            return Err(CommandError::Syntax(
                "LIMIT só pode ser usado com a opção ~".into(),
            ));
        }
        (TrimExactness::Exact, None) => trim.exact(),
        (TrimExactness::Unset, None) => trim,
    };
    Ok(trim)
}

fn parse_count(parse: &mut Parse) -> Result<Option<usize>, CommandError> {
    if parse.peek_keyword().as_deref() == Some(COUNT) {
        parse.next_string()?;
        Ok(Some(parse.next_u64()? as usize))
    } else {
        Ok(None)
    }
}

fn parse_xgroup(parse: &mut Parse) -> Result<Command, CommandError> {
    let sub = parse.next_keyword()?;
    if sub != "CREATE" {
        return Err(CommandError::Syntax(format!("subcomando XGROUP desconhecido: {sub}")));
    }
    let key = parse.next_string()?;
    let group = parse.next_string()?;
    let id = parse.next_string()?;
    let make_stream = match parse.peek_keyword().as_deref() {
        Some("MKSTREAM") => {
            parse.next_string()?;
            true
        }
        _ => false,
    };
    parse.finish()?;
    Ok(Command::XGroupCreate {
        key,
        group,
        id,
        make_stream,
    })
}

fn parse_xreadgroup(parse: &mut Parse) -> Result<Command, CommandError> {
    if parse.next_keyword()? != "GROUP" {
        return Err(CommandError::Syntax("esperado GROUP".into()));
    }
    let group = parse.next_string()?;
    let consumer = parse.next_string()?;
    let count = parse_count(parse)?;
    if parse.next_keyword()? != "STREAMS" {
        return Err(CommandError::Syntax("esperado STREAMS".into()));
    }
    let rest = parse.remaining();
    if rest == 0 || rest % 2 != 0 {
        return Err(CommandError::WrongArity("XREADGROUP".into()));
    }
    let mut keys = Vec::with_capacity(rest / 2);
    for _ in 0..rest / 2 {
        keys.push(parse.next_string()?);
    }
    let mut streams = Vec::with_capacity(keys.len());
    for key in keys {
        streams.push((key, parse.next_string()?));
    }
    Ok(Command::XReadGroup {
        group,
        consumer,
        count,
        streams,
    })
}

fn parse_xclaim(parse: &mut Parse) -> Result<Command, CommandError> {
    let key = parse.next_string()?;
    let group = parse.next_string()?;
    let consumer = parse.next_string()?;
    let min_idle_ms = parse.next_u64()?;

    let mut ids = Vec::new();
    while parse.has_remaining() {
        match parse.peek_keyword().as_deref() {
            Some(IDLE | TIME | RETRYCOUNT | FORCE | JUSTID) => break,
            _ => ids.push(parse.next_string()?),
        }
    }
    if ids.is_empty() {
        return Err(CommandError::WrongArity("XCLAIM".into()));
    }

    let mut modifiers = ClaimModifiers::default();
    while parse.has_remaining() {
        let opt = parse.next_keyword()?;
        match opt.as_str() {
            IDLE => modifiers.idle_ms = Some(parse.next_u64()?),
            TIME => modifiers.time_ms = Some(parse.next_u64()?),
            RETRYCOUNT => modifiers.retry_count = Some(parse.next_u64()?),
            FORCE => modifiers.force = true,
            JUSTID => modifiers.just_id = true,
            other => {
                return Err(CommandError::Syntax(format!("opção inválida para XCLAIM: {other}")));
            }
        }
    }

    Ok(Command::XClaim {
        key,
        group,
        consumer,
        min_idle_ms,
        ids,
        modifiers,
    })
}
