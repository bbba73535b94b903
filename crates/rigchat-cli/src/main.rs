use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

mod context;
mod telemetry;
mod ui;

use rigchat_core::{ChatClient, ChatError, ChatMessage, ChatSession, Config, Mode, RequestContext};
use ui::TranscriptPrinter;

#[derive(Parser)]
#[command(name = "rigchat")]
#[command(about = "Chat with the mining-hardware store assistant from your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Completion endpoint (overrides config and RIGCHAT_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Write JSON trace logs to RIGCHAT_TRACE_LOG or a temp file
    #[arg(long, global = true)]
    logs: bool,
    /// Trace level for --logs (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RIGCHAT_LOG_LEVEL", value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Args, Debug)]
struct ContextArgs {
    /// Assistant mode (recommendation, order)
    #[arg(short, long)]
    mode: Option<String>,
    /// JSON file with the product catalogue
    #[arg(long, value_name = "FILE")]
    products: Option<PathBuf>,
    /// JSON file with order history
    #[arg(long, value_name = "FILE")]
    orders: Option<PathBuf>,
    /// Signed-in user; order data is only sent when this is set
    #[arg(short, long, env = "RIGCHAT_USER")]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat
    Chat {
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Ask a single question and print the streamed reply
    Ask {
        /// Your question
        question: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// List assistant modes
    Modes {
        /// Save this mode as the default
        #[arg(long, value_name = "MODE")]
        set: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.logs {
        telemetry::init_tracing(&telemetry::LogSettings::new(cli.log_level.as_deref()));
    }

    let config = Config::load().unwrap_or_else(|_| Config::new());

    match cli.command {
        Commands::Chat { context } => {
            let client = build_client(&config, cli.endpoint.as_deref())?;
            chat(&config, &client, &context).await?
        }
        Commands::Ask { question, context } => {
            let client = build_client(&config, cli.endpoint.as_deref())?;
            ask(&config, &client, &question, &context).await?
        }
        Commands::Modes { set } => list_modes(&config, set.as_deref())?,
    }

    Ok(())
}

fn build_client(config: &Config, endpoint: Option<&str>) -> Result<ChatClient> {
    let endpoint = endpoint
        .map(str::to_string)
        .unwrap_or_else(|| config.endpoint());

    let mut client = match config.connect_timeout() {
        Some(timeout) => ChatClient::with_connect_timeout(&endpoint, timeout)?,
        None => ChatClient::new(&endpoint),
    };
    if let Some(key) = config.api_key() {
        client = client.with_api_key(&key);
    }
    Ok(client)
}

fn resolve_mode(name: Option<&str>, config: &Config) -> Result<Mode> {
    match name {
        Some(name) => Mode::from_str(name)
            .ok_or_else(|| anyhow!("Unknown mode '{}'. Run `rigchat modes` to list them.", name)),
        None => Ok(config.mode()),
    }
}

fn load_context(args: &ContextArgs) -> Result<RequestContext> {
    context::build_context(
        args.products.as_deref(),
        args.orders.as_deref(),
        args.user.as_deref(),
    )
}

#[derive(Debug, PartialEq)]
enum ChatCommand {
    Quit,
    Help,
    Reset,
    Mode(Option<String>),
    Unknown(String),
}

/// Parse a `/command` line. Returns `None` for ordinary chat input.
fn parse_command(input: &str) -> Option<ChatCommand> {
    let command = input.trim().strip_prefix('/')?;
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let command = match name {
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "help" | "?" => ChatCommand::Help,
        "reset" | "clear" => ChatCommand::Reset,
        "mode" => ChatCommand::Mode(parts.next().map(str::to_string)),
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

async fn chat(config: &Config, client: &ChatClient, args: &ContextArgs) -> Result<()> {
    let mode = resolve_mode(args.mode.as_deref(), config)?;
    let context = load_context(args)?;

    let mut session = ChatSession::new(mode).with_recovery(config.frame_recovery());
    let mut printer = TranscriptPrinter::new();

    ui::print_banner(mode, client.endpoint());
    print_rendered(&mut printer, session.transcript().messages());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{} ", "You:".green().bold());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match parse_command(&line) {
            Some(ChatCommand::Quit) => break,
            Some(ChatCommand::Help) => ui::print_help(),
            Some(ChatCommand::Reset) => {
                session.reset();
                printer.restart();
                print_rendered(&mut printer, session.transcript().messages());
                println!();
            }
            Some(ChatCommand::Mode(None)) => ui::print_modes(session.mode()),
            Some(ChatCommand::Mode(Some(name))) => match Mode::from_str(&name) {
                Some(mode) => {
                    session.set_mode(mode);
                    printer.restart();
                    println!("{} {}", "Switched to".dimmed(), mode.display_name().green());
                    print_rendered(&mut printer, session.transcript().messages());
                    println!();
                }
                None => ui::print_error(&format!("Unknown mode '{}'", name)),
            },
            Some(ChatCommand::Unknown(name)) => {
                ui::print_error(&format!("Unknown command '/{}'. Type /help.", name))
            }
            None => {
                if line.trim().is_empty() {
                    continue;
                }
                match run_turn(&mut session, client, &line, &context, &mut printer).await {
                    Ok(()) => {}
                    Err(ChatError::Cancelled) => println!("{}", "Cancelled.".dimmed()),
                    Err(err) => ui::print_error(&err.to_string()),
                }
            }
        }
    }

    Ok(())
}

async fn ask(
    config: &Config,
    client: &ChatClient,
    question: &str,
    args: &ContextArgs,
) -> Result<()> {
    let mode = resolve_mode(args.mode.as_deref(), config)?;
    let context = load_context(args)?;

    let mut session = ChatSession::new(mode).with_recovery(config.frame_recovery());
    let mut printer = TranscriptPrinter::new();
    // The welcome message is not worth printing for a one-shot question.
    printer.render(session.transcript().messages());

    println!("🔍 {} {}", mode.display_name().dimmed(), question.bold().cyan());
    run_turn(&mut session, client, question, &context, &mut printer).await?;
    Ok(())
}

/// Send one message and print the reply as it streams in.
/// Ctrl-C cancels the request.
async fn run_turn(
    session: &mut ChatSession,
    client: &ChatClient,
    input: &str,
    context: &RequestContext,
    printer: &mut TranscriptPrinter,
) -> std::result::Result<(), ChatError> {
    let mut updates = session.subscribe();
    let cancel = session.cancel_token();
    ui::print_thinking();

    let result = {
        let send = session.send(client, input, context);
        tokio::pin!(send);
        loop {
            tokio::select! {
                result = &mut send => break result,
                changed = updates.changed() => {
                    if changed.is_ok() {
                        let snapshot = updates.borrow_and_update().clone();
                        print_rendered(printer, &snapshot);
                    }
                }
                _ = tokio::signal::ctrl_c() => cancel.cancel(),
            }
        }
    };

    print_rendered(printer, session.transcript().messages());
    println!();
    result
}

fn print_rendered(printer: &mut TranscriptPrinter, messages: &[ChatMessage]) {
    let text = printer.render(messages);
    if !text.is_empty() {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}

fn list_modes(config: &Config, set: Option<&str>) -> Result<()> {
    let current = match set {
        Some(name) => {
            let mode = resolve_mode(Some(name), config)?;
            Config::save_default_mode(mode)?;
            println!("{} {}", "Default mode set to".dimmed(), mode.as_str().green());
            mode
        }
        None => config.mode(),
    };
    ui::print_modes(current);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_with_context() {
        let cli = Cli::try_parse_from([
            "rigchat",
            "chat",
            "--mode",
            "order",
            "--orders",
            "orders.json",
            "--user",
            "user-7",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat { context } => {
                assert_eq!(context.mode.as_deref(), Some("order"));
                assert_eq!(context.orders, Some(PathBuf::from("orders.json")));
                assert_eq!(context.user.as_deref(), Some("user-7"));
                assert!(context.products.is_none());
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_parse_ask_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rigchat",
            "ask",
            "which miner for hydro?",
            "--endpoint",
            "http://localhost:9000/chat",
            "--logs",
            "--log-level",
            "info",
        ])
        .unwrap();
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000/chat"));
        assert!(cli.logs);
        assert_eq!(cli.log_level.as_deref(), Some("info"));
        match cli.command {
            Commands::Ask { question, .. } => assert_eq!(question, "which miner for hydro?"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_parse_modes_and_missing_question() {
        let cli = Cli::try_parse_from(["rigchat", "modes", "--set", "order"]).unwrap();
        assert!(matches!(cli.command, Commands::Modes { set: Some(ref m) } if m == "order"));
        assert!(Cli::try_parse_from(["rigchat", "ask"]).is_err());
    }

    #[test]
    fn test_resolve_mode() {
        let config = Config::new();
        assert_eq!(resolve_mode(Some("order"), &config).unwrap(), Mode::OrderInquiry);
        assert_eq!(resolve_mode(None, &config).unwrap(), Mode::Recommendation);
        assert!(resolve_mode(Some("refunds"), &config).is_err());
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command(" /mode order "), Some(ChatCommand::Mode(Some("order".into()))));
        assert_eq!(parse_command("/mode"), Some(ChatCommand::Mode(None)));
        assert_eq!(parse_command("/reset"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/frobnicate"), Some(ChatCommand::Unknown("frobnicate".into())));
        assert_eq!(parse_command("what about S21?"), None);
    }

    #[test]
    fn test_build_client_prefers_flag_endpoint() {
        let client = build_client(&Config::new(), Some("http://127.0.0.1:1/chat")).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:1/chat");
    }
}
