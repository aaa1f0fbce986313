use chatline::adapters::{HttpChatRepository, HttpCompletionProvider, ReqwestHttpClient};
use chatline::bus::EventBus;
use chatline::config::ClientConfig;
use chatline::engine::{SendOutcome, StreamingEngine};
use chatline::error::{ChatError, ChatResult};
use chatline::pagination::ChatListLoader;
use chatline::state::{Action, AppState, Store};
use chatline::telemetry;
use chatline::traits::HttpClient;

use color_eyre::Result;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = "\
Type a message and press enter to send it.
  /regen        regenerate the last reply
  /new          start a new conversation
  /model NAME   switch model
  /chats        list loaded conversations
  /more         load the next page of conversations
  /quit         exit
Ctrl-C stops a streaming reply.";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Send(&'a str),
    Regenerate,
    NewChat,
    Model(&'a str),
    Chats,
    More,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Command::Send(line);
    }
    let (name, arg) = line
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((line, ""));
    match name {
        "/regen" => Command::Regenerate,
        "/new" => Command::NewChat,
        "/model" if !arg.is_empty() => Command::Model(arg),
        "/chats" => Command::Chats,
        "/more" => Command::More,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(line),
    }
}

fn describe(err: &ChatError) -> String {
    format!("! {} ({})", err.user_message(), err.recovery_hint())
}

fn report(result: ChatResult<SendOutcome>) {
    match result {
        Ok(outcome) if outcome.cancelled => println!("\n[stopped]"),
        Ok(_) => println!(),
        Err(e) => {
            println!();
            eprintln!("{}", describe(&e));
            tracing::debug!(code = e.error_code(), error = %e, "Operation failed");
        }
    }
}

/// What a Ctrl-C does in the current engine phase.
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Nothing is running; leave the program
    Exit,
    /// The streaming reply was asked to stop
    Stopping,
    /// An operation is running but its reply has not started streaming
    NotYet,
}

fn interrupt(engine: &StreamingEngine) -> Interrupt {
    if engine.phase().is_idle() {
        return Interrupt::Exit;
    }
    match engine.stop() {
        Ok(()) => Interrupt::Stopping,
        Err(_) => Interrupt::NotYet,
    }
}

/// Echo the streaming reply to stdout as it grows.
fn print_replies(store: &Store) {
    let printed = Arc::new(Mutex::new(0usize));
    store.observe(move |action, _| {
        let mut printed = printed.lock().unwrap_or_else(|e| e.into_inner());
        match action {
            Action::AddMessage(m) if m.is_assistant() => *printed = 0,
            Action::UpdateMessage(m) if m.is_assistant() => {
                if let Some(delta) = m.content.get(*printed..) {
                    print!("{}", delta);
                    let _ = std::io::stdout().flush();
                }
                *printed = m.content.len();
            }
            _ => {}
        }
    });
}

fn print_chats(loader: &ChatListLoader) {
    let groups = loader.grouped(chrono::Utc::now());
    if groups.is_empty() {
        println!("(no conversations)");
        return;
    }
    for group in groups {
        println!("{}", group.bucket.label());
        for chat in group.chats {
            println!("  {}  {}", chat.id, chat.title);
        }
    }
    if loader.has_more() {
        println!("(/more for older conversations)");
    }
}

async fn run(config: ClientConfig) -> Result<()> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(
        config.request_timeout(),
    )?);
    let repository = Arc::new(HttpChatRepository::new(Arc::clone(&http), &config.base_url));
    let completions = Arc::new(HttpCompletionProvider::new(http, &config.base_url));

    let bus = EventBus::new();
    let store = Store::new(AppState::with_model(&config.default_model));
    let engine = Arc::new(StreamingEngine::new(
        store.clone(),
        bus.clone(),
        repository.clone(),
        completions,
    ));

    let loader = ChatListLoader::new(repository);
    loader.attach(&bus);
    if let Err(e) = loader.load_next().await {
        eprintln!("! {}", e.user_message());
    }

    print_replies(&store);

    let stopper = Arc::clone(&engine);
    ctrlc::set_handler(move || match interrupt(&stopper) {
        Interrupt::Exit => std::process::exit(130),
        Interrupt::Stopping => {}
        Interrupt::NotYet => eprintln!("\n(reply not started yet; press Ctrl-C again to stop it)"),
    })?;

    println!("chatline {} connected to {}", VERSION, config.base_url);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Command::Send("") => {}
            Command::Send(text) => report(engine.send(text).await),
            Command::Regenerate => report(engine.resend().await),
            Command::NewChat => {
                engine.new_chat();
                println!("(new conversation)");
            }
            Command::Model(name) => {
                engine.select_model(name);
                println!("(model: {})", name);
            }
            Command::Chats => print_chats(&loader),
            Command::More => match loader.on_sentinel_visible(true).await {
                Ok(true) => print_chats(&loader),
                Ok(false) => println!("(nothing more to load)"),
                Err(e) => eprintln!("! {}", e.user_message()),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(cmd) => eprintln!("unknown command {}; try /help", cmd),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("chatline {}", VERSION);
        return Ok(());
    }

    color_eyre::install()?;

    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", describe(&ChatError::from(e)));
            std::process::exit(78);
        }
    };
    telemetry::init_tracing(&config.log_filter);
    tracing::debug!(?config, "Starting");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config))
}
