use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;

use telegram_search_client::format::{
    format_file_size, message_type_label, relative_time, truncate_text, MessageType,
};
use telegram_search_client::search::highlight::{highlight_query, mark};
use telegram_search_client::search::Query;
use telegram_search_client::{credential, logging, ClientConfig, SearchOutcome, SearchSession};

#[derive(Parser)]
#[command(name = "btts", about = "Search indexed Telegram chats")]
struct Cli {
    /// Log at debug level even in release builds
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save the API key used for every request
    Login { key: String },
    /// Forget the saved API key
    Logout,
    /// List indexed chats
    Chats {
        #[arg(long)]
        refresh: bool,
    },
    /// Search messages
    Search {
        query: Vec<String>,
        #[arg(long = "chat")]
        chats: Vec<i64>,
        #[arg(long = "user")]
        users: Vec<i64>,
        #[arg(long = "type")]
        types: Vec<MessageType>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        /// Search every indexed chat (master keys only)
        #[arg(long)]
        all: bool,
    },
    /// Fetch messages by id
    Fetch { chat_id: i64, ids: Vec<i64> },
    /// Reply to a message
    Reply {
        chat_id: i64,
        message_id: i64,
        text: String,
    },
    /// Forward messages to another chat
    Forward {
        from_chat_id: i64,
        to_chat_id: i64,
        message_ids: Vec<i64>,
    },
    /// Write a message attachment to stdout
    File { chat_id: i64, message_id: i64 },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    let _logger = logging::init(&config.log_dir(), cli.verbose)?;

    let session = SearchSession::from_config(&config)?;

    match cli.command {
        Command::Login { key } => {
            if !credential::validate_api_key(&key) {
                return Err("API key looks empty".into());
            }
            session.set_api_key(key.trim())?;
            println!("API key saved");
        }
        Command::Logout => {
            session.clear_api_key()?;
            println!("API key removed");
        }
        command if !session.is_configured() && !matches!(command, Command::File { .. }) => {
            return Err("no API key configured; run `btts login <key>` first".into());
        }
        Command::Chats { refresh } => {
            if refresh {
                session.reload_chat_catalog().await?;
            } else {
                session.load_chat_catalog().await?;
            }
            for chat in session.indexed_chats() {
                let watching = if chat.is_watching { "watching" } else { "" };
                println!("{:>16}  {}  {}", chat.chat_id, chat.title, watching);
            }
            if session.is_master() {
                println!("(master key)");
            }
        }
        Command::Search {
            query,
            chats,
            users,
            types,
            page,
            page_size,
            all,
        } => {
            if let Some(size) = page_size {
                if !session.set_page_size(size) {
                    return Err("page size must be positive".into());
                }
            }
            session.set_query(query.join(" "));
            session.set_chat_filter(chats);
            session.set_user_filter(users);
            session.set_type_filter(types.iter().map(|t| t.as_str()));
            if all {
                session.load_chat_catalog().await?;
                session.set_all_chats(true);
            }

            session.search().await?;
            if page > 1 && session.go_to_page(page).await? == SearchOutcome::PageOutOfRange {
                return Err(format!("page {} is past the last page", page).into());
            }
            print_results(&session);
        }
        Command::Fetch { chat_id, ids } => {
            if let Some(response) = session.fetch_messages(chat_id, &ids).await? {
                for hit in response.hits {
                    println!("[{}] {}", hit.message_id, hit.text);
                }
            }
        }
        Command::Reply {
            chat_id,
            message_id,
            text,
        } => {
            if let Some(response) = session.reply(chat_id, message_id, &text).await? {
                println!("{}: {}", response.status, response.message);
            }
        }
        Command::Forward {
            from_chat_id,
            to_chat_id,
            message_ids,
        } => {
            if let Some(response) = session
                .forward(from_chat_id, to_chat_id, &message_ids)
                .await?
            {
                println!("{}: {}", response.status, response.message);
            }
        }
        Command::File {
            chat_id,
            message_id,
        } => {
            let mut stream = session.open_file(chat_id, message_id).await?;
            let mut stdout = tokio::io::stdout();
            let mut written = 0u64;
            while let Some(chunk) = stream.try_next().await? {
                stdout.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            stdout.flush().await?;
            eprintln!("wrote {}", format_file_size(written));
        }
    }

    Ok(())
}

fn print_results<B: telegram_search_client::SearchBackend>(session: &SearchSession<B>) {
    let results = session.results();
    let query = Query::new(session.query());
    let now = chrono::Utc::now();

    let scope = if session.filter().is_unrestricted() {
        "no filters"
    } else {
        "filtered"
    };
    println!(
        "{} hits ({} semantic, {}) in {} ms, page {}/{}",
        results.estimated_total,
        results.semantic_hit_count,
        scope,
        results.processing_time_ms,
        session.current_page(),
        session.total_pages()
    );
    for hit in &results.hits {
        let text = truncate_text(&hit.text, 150);
        let ranges = highlight_query(&text, &query);
        let when = hit
            .sent_at()
            .map(|t| relative_time(t, now))
            .unwrap_or_default();
        println!(
            "- {} #{} [{}] {} {}",
            hit.chat_title.as_deref().unwrap_or("?"),
            hit.message_id,
            message_type_label(&hit.msg_type),
            when,
            hit.user_full_name.as_deref().unwrap_or("")
        );
        println!("  {}", mark(&text, &ranges, "\x1b[1m", "\x1b[0m"));
    }
}
