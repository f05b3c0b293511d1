use anyhow::Context;
use std::io::Read;
use std::path::PathBuf;
use structopt::StructOpt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use gossip_ai::analyzer::Analyzer;
use gossip_ai::app::{App, NOT_CONFIGURED};
use gossip_ai::cache::TranscriptCache;
use gossip_ai::chat::{ChatSession, EXAMPLE_PROMPTS};
use gossip_ai::config::{Environment, Settings};
use gossip_ai::conversation::{Media, Submission};
use gossip_ai::error::GossipError;
use gossip_ai::model::{GeminiClient, LanguageModel};
use gossip_ai::render::{ActiveCard, overview, results_view};
use gossip_ai::store::{ConversationStore, LocalStore, SupabaseStore};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "gossip-ai",
    about = "AI-powered emotional analysis of conversations"
)]
struct Args {
    /// Path to a TOML settings file
    #[structopt(short = "c", long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Keep history in a local JSON file instead of Supabase
    #[structopt(long)]
    local: bool,

    /// Local history file (implies --local)
    #[structopt(long, parse(from_os_str))]
    history_file: Option<PathBuf>,

    /// Reuse earlier transcriptions of identical audio
    #[structopt(long)]
    reuse_transcripts: bool,

    /// Log debug output to stderr
    #[structopt(short, long)]
    verbose: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt, Debug)]
enum Command {
    /// Totals and the most recent conversations
    Overview,

    /// Analyze a new conversation (text is read from stdin unless given)
    Analyze {
        /// Conversation text
        #[structopt(short, long)]
        text: Option<String>,

        /// Free-text context about the conversation
        #[structopt(long)]
        context: Option<String>,

        /// Screenshot of the conversation
        #[structopt(short, long, parse(from_os_str))]
        image: Option<PathBuf>,

        /// Recording of the conversation
        #[structopt(short, long, parse(from_os_str))]
        audio: Option<PathBuf>,
    },

    /// Render a stored analysis (newest by default)
    Show {
        id: Option<Uuid>,

        /// Middle tab: judge, subtext or timeline
        #[structopt(long)]
        card: Option<ActiveCard>,
    },

    /// Ask follow-up questions about a stored conversation
    Chat {
        /// Conversation to ask about (newest by default)
        #[structopt(long)]
        id: Option<Uuid>,

        /// One question; omit to read questions line by line from stdin
        question: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gossip_ai=debug" } else { "gossip_ai=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::load()?;
    let args = Args::from_args();
    init_tracing(args.verbose);
    let settings = Settings::load(args.config.as_deref()).await?;

    if let Some(notice) = configuration_notice(&args.command, environment.language_api_key().is_some())? {
        println!("⚠ {notice}\n");
    }

    let analyzer = match environment.language_api_key() {
        Some(key) => {
            let client = GeminiClient::new(key, environment.model(), settings.request_timeout())?;
            let mut analyzer = Analyzer::new(client);
            if args.reuse_transcripts {
                analyzer = analyzer.with_transcript_cache(TranscriptCache::new().await?);
            }
            Some(analyzer)
        }
        None => None,
    };

    if args.local || args.history_file.is_some() {
        let path = match &args.history_file {
            Some(path) => path.clone(),
            None => LocalStore::default_path()?,
        };
        run(App::new(analyzer, LocalStore::new(path)), args.command, &settings).await
    } else {
        let (url, key) = environment.store_credentials()?;
        let store = SupabaseStore::new(url, key, &settings.table, settings.request_timeout())?
            .with_retry(settings.retry);
        run(App::new(analyzer, store), args.command, &settings).await
    }
}

async fn run<M: LanguageModel, S: ConversationStore>(
    mut app: App<M, S>,
    command: Command,
    settings: &Settings,
) -> anyhow::Result<()> {
    match command {
        Command::Overview => {
            app.show_overview();
            println!("{}", overview(app.refresh().await));
        }
        Command::Analyze {
            text,
            context,
            image,
            audio,
        } => {
            let submission = read_submission(text, context, image, audio).await?;
            println!("Analyzing…");
            let width = settings.card_width;
            match app.submit(submission).await {
                Ok(record) => println!("Saved as {}.\n", record.id()),
                Err(e @ (GossipError::Validation(_) | GossipError::NotConfigured(_))) => {
                    anyhow::bail!(e)
                }
                Err(e) => {
                    error!(error = %e, "analysis failed");
                    anyhow::bail!("Analysis failed. Please try again.");
                }
            }
            if let Some(result) = app.current() {
                println!("{}", results_view(result, app.active_card(), width));
            }
        }
        Command::Show { id, card } => {
            app.refresh().await;
            if app.open(id).is_none() {
                anyhow::bail!(no_record_message(id));
            }
            if let Some(card) = card {
                app.select_card(card);
            }
            if let Some(result) = app.current() {
                println!("{}", results_view(result, app.active_card(), settings.card_width));
            }
        }
        Command::Chat { id, question } => {
            app.refresh().await;
            let text = match app.open(id) {
                Some(record) => record.conversation.text.clone(),
                None => anyhow::bail!(no_record_message(id)),
            };
            let analyzer = app.analyzer().context(NOT_CONFIGURED)?;
            let mut session = ChatSession::new(analyzer, text);

            if let Some(question) = question {
                if let Some(reply) = session.send(&question).await {
                    println!("{}", reply.text);
                }
                return Ok(());
            }

            println!("Ask anything about this conversation, for example:");
            for prompt in EXAMPLE_PROMPTS {
                println!("  • {prompt}");
            }
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                println!("ai: typing…");
                if let Some(reply) = session.send(&line).await {
                    println!("{}: {}\n", reply.sender, reply.text);
                }
            }
        }
    }
    Ok(())
}

/// Checked before any store is built so a missing model key is reported
/// even when the store credentials are missing too.
fn configuration_notice(command: &Command, model_configured: bool) -> anyhow::Result<Option<&'static str>> {
    if model_configured {
        return Ok(None);
    }
    match command {
        Command::Analyze { .. } => anyhow::bail!(NOT_CONFIGURED),
        Command::Overview => Ok(Some(NOT_CONFIGURED)),
        Command::Show { .. } | Command::Chat { .. } => Ok(None),
    }
}

fn no_record_message(id: Option<Uuid>) -> String {
    match id {
        Some(id) => format!("No stored conversation with id {id}"),
        None => "No conversations stored yet".to_owned(),
    }
}

async fn read_submission(
    text: Option<String>,
    context: Option<String>,
    image: Option<PathBuf>,
    audio: Option<PathBuf>,
) -> anyhow::Result<Submission> {
    let image = match image {
        Some(path) => Some(
            Media::from_file(&path, "image/jpeg")
                .await
                .context("Failed to read image file")?,
        ),
        None => None,
    };
    let audio = match audio {
        Some(path) => Some(
            Media::from_file(&path, "audio/mp3")
                .await
                .context("Failed to read audio file")?,
        ),
        None => None,
    };
    let text = match text {
        Some(text) => text,
        None if image.is_none() && audio.is_none() => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read conversation from stdin")?;
            buffer
        }
        None => String::new(),
    };

    Ok(Submission {
        text,
        context: context.unwrap_or_default(),
        image,
        audio,
    })
}
