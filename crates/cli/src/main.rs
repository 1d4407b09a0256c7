use std::io::{self, Write};

use anyhow::bail;
use bytes::BytesMut;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{debug, info};

use stormstream_common::{DEFAULT_LOG_FILTER, INITIAL_BUFFER_CAPACITY};
use stormstream_protocol::options::{
    AddOptions, ClaimOptions, JUSTID, ToArgs, TrimOptions, ZScanOptions,
};
use stormstream_protocol::{CommandExecutor, Frame};
use stormstream_storage::Db;

#[derive(Parser, Debug)]
#[command(name = "stormstream-cli", about = "StormStream: comandos de stream")]
struct Args {
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Mostra os argumentos que um comando envia ao servidor
    Encode {
        /// Imprime o frame RESP em vez dos tokens
        #[arg(long)]
        resp: bool,
        #[command(subcommand)]
        command: EncodeCmd,
    },
    /// Sessão interativa contra um store in-memory
    Repl,
}

#[derive(Subcommand, Debug)]
enum EncodeCmd {
    Xadd {
        key: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        nomkstream: bool,
        #[command(flatten)]
        trim: TrimArgs,
        /// Pares campo valor
        #[arg(required = true, num_args = 2..)]
        pairs: Vec<String>,
    },
    Xtrim {
        key: String,
        #[command(flatten)]
        trim: TrimArgs,
    },
    Xclaim {
        key: String,
        group: String,
        consumer: String,
        min_idle_ms: u64,
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long, default_value_t = 0)]
        idle: u64,
        #[arg(long, default_value_t = 0)]
        time: u64,
        #[arg(long, default_value_t = 0)]
        retry_count: u64,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        justid: bool,
    },
    Zscan {
        key: String,
        cursor: String,
        #[arg(long = "match")]
        pattern: Option<String>,
        #[arg(long, default_value_t = 0)]
        count: u64,
        #[arg(long)]
        no_scores: bool,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct TrimArgs {
    #[arg(long, conflicts_with = "minid")]
    maxlen: Option<u64>,
    #[arg(long)]
    minid: Option<String>,
    #[arg(long, conflicts_with = "exact")]
    approximate: bool,
    #[arg(long)]
    exact: bool,
    /// Só vale com --approximate
    #[arg(long, requires = "approximate")]
    limit: Option<u64>,
}

impl TrimArgs {
    fn build(&self) -> Option<TrimOptions> {
        let trim = match (self.maxlen, &self.minid) {
            (Some(len), _) => TrimOptions::max_len(len),
            (None, Some(id)) => TrimOptions::min_id(id.clone()),
            (None, None) => return None,
        };
        Some(match (self.exact, self.approximate, self.limit) {
            (true, _, _) => trim.exact(),
            (false, true, Some(limit)) => trim.approximate_with_limit(limit),
            (false, true, None) => trim.approximate(),
            (false, false, _) => trim,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let args = Args::parse();
    match args.command.unwrap_or(Cmd::Repl) {
        Cmd::Encode { resp, command } => {
            let (name, args) = encode(command)?;
            if resp {
                let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
                Frame::command(&name, &args).encode(&mut buf);
                println!("{}", String::from_utf8_lossy(&buf).escape_debug());
            } else {
                println!("{}", format_tokens(&name, &args));
            }
        }
        Cmd::Repl => repl(Db::new()).await?,
    }
    Ok(())
}

/// Converte o subcomando em nome + argumentos, na ordem do wire.
fn encode(command: EncodeCmd) -> anyhow::Result<(String, Vec<String>)> {
    match command {
        EncodeCmd::Xadd {
            key,
            id,
            nomkstream,
            trim,
            pairs,
        } => {
            if pairs.len() % 2 != 0 {
                bail!("pares campo/valor incompletos ({} tokens)", pairs.len());
            }
            let mut options = AddOptions::new();
            if let Some(id) = id {
                options = options.id(id);
            }
            if nomkstream {
                options = options.dont_make_stream();
            }
            if let Some(trim) = trim.build() {
                options = options.trim(trim);
            }
            let mut args = vec![key];
            args.extend(options.to_args()?);
            args.extend(pairs);
            Ok(("XADD".into(), args))
        }
        EncodeCmd::Xtrim { key, trim } => {
            let Some(trim) = trim.build() else {
                bail!("XTRIM exige --maxlen ou --minid");
            };
            let mut args = vec![key];
            args.extend(trim.to_args()?);
            Ok(("XTRIM".into(), args))
        }
        EncodeCmd::Xclaim {
            key,
            group,
            consumer,
            min_idle_ms,
            ids,
            idle,
            time,
            retry_count,
            force,
            justid,
        } => {
            let mut options = ClaimOptions::new()
                .idle(idle)
                .idle_unix_time(time)
                .retry_count(retry_count);
            if force {
                options = options.force();
            }
            let mut args = vec![key, group, consumer, min_idle_ms.to_string()];
            args.extend(ids);
            args.extend(options.to_args()?);
            if justid {
                args.push(JUSTID.to_string());
            }
            Ok(("XCLAIM".into(), args))
        }
        EncodeCmd::Zscan {
            key,
            cursor,
            pattern,
            count,
            no_scores,
        } => {
            let mut options = ZScanOptions::new().count(count).no_scores(no_scores);
            if let Some(pattern) = pattern {
                options = options.match_pattern(pattern);
            }
            let mut args = vec![key, cursor];
            args.extend(options.to_args()?);
            Ok(("ZSCAN".into(), args))
        }
    }
}

async fn repl(db: Db) -> anyhow::Result<()> {
    info!("store in-memory pronto");

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("stormstream> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let mut tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }

        let name = tokens.remove(0);
        debug!("{name} {:?}", tokens);
        match db.execute(&name, tokens).await {
            Ok(reply) => println!("{}", format_frame(&reply, 0)),
            Err(e) => println!("(error) {e}"),
        }
    }

    Ok(())
}

/// Junta os tokens para exibição, com aspas onde houver espaço.
fn format_tokens(name: &str, args: &[String]) -> String {
    let mut out = name.to_string();
    for arg in args {
        out.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
            out.push_str(&format!("{arg:?}"));
        } else {
            out.push_str(arg);
        }
    }
    out
}

/// Tokeniza a linha de input com suporte a strings quoted.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut quote_char = '"';
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == quote_char {
                in_quote = false;
                // Aspas vazias ainda geram um token
                if current.is_empty() {
                    tokens.push(String::new());
                }
            } else if c == '\\' {
                match chars.peek().copied() {
                    Some('n') => current.push('\n'),
                    Some('t') => current.push('\t'),
                    Some(next @ ('\\' | '"' | '\'')) => current.push(next),
                    _ => {
                        current.push(c);
                        continue;
                    }
                }
                chars.next();
            } else {
                current.push(c);
            }
        } else if c == '"' || c == '\'' {
            in_quote = true;
            quote_char = c;
        } else if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Formata um frame para exibição humana.
fn format_frame(frame: &Frame, indent: usize) -> String {
    let pad = " ".repeat(indent);
    match frame {
        Frame::Simple(s) => format!("{pad}\"{s}\""),
        Frame::Error(s) => format!("{pad}(error) {s}"),
        Frame::Integer(n) => format!("{pad}(integer) {n}"),
        Frame::Bulk(data) => match std::str::from_utf8(data) {
            Ok(s) => format!("{pad}\"{s}\""),
            Err(_) => format!("{pad}(binary) {} bytes", data.len()),
        },
        Frame::Null => format!("{pad}(nil)"),
        Frame::Array(frames) => {
            if frames.is_empty() {
                return format!("{pad}(empty array)");
            }
            frames
                .iter()
                .enumerate()
                .map(|(i, f)| format!("{pad}{}) {}", i + 1, nested(f, indent)))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Frame::Map(pairs) => {
            if pairs.is_empty() {
                return format!("{pad}(empty map)");
            }
            pairs
                .iter()
                .enumerate()
                .map(|(i, (k, v))| {
                    format!("{pad}{}# {} => {}", i + 1, format_frame(k, 0), nested(v, indent))
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Agregados aninhados começam numa nova linha, recuados.
fn nested(frame: &Frame, indent: usize) -> String {
    match frame {
        Frame::Array(items) if !items.is_empty() => {
            format!("\n{}", format_frame(frame, indent + 3))
        }
        Frame::Map(pairs) if !pairs.is_empty() => {
            format!("\n{}", format_frame(frame, indent + 3))
        }
        _ => format_frame(frame, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_simple() {
        assert_eq!(
            tokenize("XADD s * field value"),
            vec!["XADD", "s", "*", "field", "value"]
        );
    }

    #[test]
    fn tokenize_quoted() {
        assert_eq!(
            tokenize(r#"XADD s * msg "hello world""#),
            vec!["XADD", "s", "*", "msg", "hello world"]
        );
    }

    #[test]
    fn tokenize_single_quotes() {
        assert_eq!(
            tokenize("XADD s * msg 'hello world'"),
            vec!["XADD", "s", "*", "msg", "hello world"]
        );
    }

    #[test]
    fn tokenize_escaped() {
        assert_eq!(
            tokenize(r#"XADD s * msg "hello\"world""#),
            vec!["XADD", "s", "*", "msg", r#"hello"world"#]
        );
    }

    #[test]
    fn tokenize_empty_quotes() {
        assert_eq!(tokenize(r#"XADD s * f """#), vec!["XADD", "s", "*", "f", ""]);
    }

    #[test]
    fn tokenize_empty() {
        assert_eq!(tokenize(""), Vec::<String>::new());
    }

    #[test]
    fn format_integer() {
        assert_eq!(format_frame(&Frame::Integer(42), 0), "(integer) 42");
    }

    #[test]
    fn format_null() {
        assert_eq!(format_frame(&Frame::Null, 0), "(nil)");
    }

    #[test]
    fn format_error() {
        let frame = Frame::Error("ERR unknown command".into());
        assert_eq!(format_frame(&frame, 0), "(error) ERR unknown command");
    }

    #[test]
    fn format_nested_entry() {
        let frame = Frame::Array(vec![Frame::Array(vec![
            Frame::bulk("1-0"),
            Frame::array_from_strs(&["f", "v"]),
        ])]);
        assert_eq!(
            format_frame(&frame, 0),
            "1) \n   1) \"1-0\"\n   2) \n      1) \"f\"\n      2) \"v\""
        );
    }

    #[test]
    fn format_map() {
        let frame = Frame::Map(vec![(Frame::bulk("1-0"), Frame::Null)]);
        assert_eq!(format_frame(&frame, 0), "1# \"1-0\" => (nil)");
    }

    #[test]
    fn encode_xadd_with_trim() {
        let cli = Args::try_parse_from([
            "stormstream-cli",
            "encode",
            "xadd",
            "s",
            "--nomkstream",
            "--maxlen",
            "1000",
            "--approximate",
            "--limit",
            "100",
            "f",
            "v",
        ])
        .unwrap();
        let Some(Cmd::Encode { command, .. }) = cli.command else {
            panic!("expected encode");
        };
        let (name, args) = encode(command).unwrap();
        assert_eq!(name, "XADD");
        assert_eq!(
            args,
            vec!["s", "NOMKSTREAM", "MAXLEN", "~", "1000", "LIMIT", "100", "*", "f", "v"]
        );
    }

    #[test]
    fn encode_xclaim_justid_last() {
        let cli = Args::try_parse_from([
            "stormstream-cli",
            "encode",
            "xclaim",
            "s",
            "g",
            "c",
            "0",
            "1-0",
            "--retry-count",
            "2",
            "--force",
            "--justid",
        ])
        .unwrap();
        let Some(Cmd::Encode { command, .. }) = cli.command else {
            panic!("expected encode");
        };
        let (_, args) = encode(command).unwrap();
        assert_eq!(
            args,
            vec!["s", "g", "c", "0", "1-0", "RETRYCOUNT", "2", "FORCE", "JUSTID"]
        );
    }

    #[test]
    fn encode_xtrim_requires_strategy() {
        let cli = Args::try_parse_from(["stormstream-cli", "encode", "xtrim", "s"]).unwrap();
        let Some(Cmd::Encode { command, .. }) = cli.command else {
            panic!("expected encode");
        };
        assert!(encode(command).is_err());
    }

    #[test]
    fn limit_requires_approximate() {
        let result = Args::try_parse_from([
            "stormstream-cli",
            "encode",
            "xtrim",
            "s",
            "--maxlen",
            "5",
            "--limit",
            "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn encode_zscan_options() {
        let (name, args) = encode(EncodeCmd::Zscan {
            key: "z".into(),
            cursor: "0".into(),
            pattern: Some("a*".into()),
            count: 10,
            no_scores: true,
        })
        .unwrap();
        assert_eq!(name, "ZSCAN");
        assert_eq!(args, vec!["z", "0", "MATCH", "a*", "COUNT", "10", "NOSCORES"]);
    }

    #[test]
    fn format_tokens_quotes_spaces() {
        let args = vec!["s".to_string(), "hello world".to_string()];
        assert_eq!(format_tokens("XADD", &args), "XADD s \"hello world\"");
    }
}
