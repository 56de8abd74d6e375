use anyhow::Result;
use chatbase::catalog::TableCatalog;
use chatbase::config::{BackendKind, DbConfig, LlmConfig};
use chatbase::llm::CompletionClient;
use chatbase::pipeline::{ChatPipeline, ChatResponse};
use chatbase::session::SessionLog;
use chatbase::vocabulary::Vocabulary;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chatbase")]
#[command(about = "Ask your database questions in natural language")]
struct Args {
    /// One-shot question; omit for an interactive session
    query: Option<String>,

    /// Path to the entity vocabulary file (category -> entity names)
    #[arg(long, default_value = "ner.json")]
    vocabulary: PathBuf,

    /// Completion backend
    #[arg(long, value_enum, default_value = "gemini")]
    backend: BackendKind,

    /// Database host
    #[arg(long, default_value = "localhost")]
    db_host: String,

    /// Database user
    #[arg(long, default_value = "root")]
    db_user: String,

    /// Database password (or set CHATBASE_DB_PASSWORD)
    #[arg(long)]
    db_password: Option<String>,

    /// Database name
    #[arg(long, default_value = "elevate_v2")]
    db_name: String,

    /// Database port
    #[arg(long, default_value_t = 3306)]
    db_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!("Loading vocabulary from {}", args.vocabulary.display());
    let vocabulary = Vocabulary::load(&args.vocabulary)?;
    info!("Loaded {} entities", vocabulary.len());

    let db = DbConfig {
        host: args.db_host,
        user: args.db_user,
        password: args
            .db_password
            .or_else(|| std::env::var("CHATBASE_DB_PASSWORD").ok())
            .unwrap_or_default(),
        database: args.db_name,
        port: args.db_port,
    };

    let llm = LlmConfig::from_env(args.backend)?;
    let client = CompletionClient::new(llm);
    let pipeline = ChatPipeline::new(vocabulary, TableCatalog::builtin(), client, db);

    let mut log = SessionLog::new();

    if let Some(query) = args.query {
        let response = pipeline.ask(&query, &mut log).await?;
        print_response(&response);
        return Ok(());
    }

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        match pipeline.ask(question, &mut log).await {
            Ok(response) => {
                print_response(&response);
                print_history(&log);
            }
            Err(e) => error!("Request failed: {}", e),
        }
    }

    Ok(())
}

fn print_response(response: &ChatResponse) {
    println!("tagged input: {}", response.tagged_input);
    println!("relevant tables: {}", response.selected_tables.join(", "));
    for statement in &response.statements {
        println!("sql: {}", statement);
    }
    println!("\n{}\n", response.answer);
}

fn print_history(log: &SessionLog) {
    for turn in log.turns().iter().rev() {
        println!("User: {}", turn.user);
        println!("Bot:  {}\n", turn.answer);
    }
}
