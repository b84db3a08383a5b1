use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use careboard_core::app::{BoardEngine, DropOutcome, DropTarget, EngineBuilder, ReconcileOutcome};
use careboard_core::config::ClientConfig;
use careboard_core::domain::{Board, ContainerKey, ItemId, ProfileId};
use careboard_core::impls::{HttpTaskStore, InMemoryTaskStore};
use careboard_core::ports::{RecordingEventSink, TaskStore};

#[derive(Debug, Parser)]
#[command(name = "careboard", about = "Follow-up task board for family medical records")]
struct Cli {
    /// Backend base URL (overrides careboard.toml / CAREBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Profile whose board to open
    #[arg(long, global = true, default_value_t = 1)]
    profile: u64,

    /// Log filter, e.g. "debug" or "careboard_core=trace" (RUST_LOG wins when set)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the board
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Create missing follow-up tasks from medical records
    Sync,
    /// Drop an item onto another item or an empty column
    Move { item: String, target: String },
    /// Add a task at the end of a column
    Add {
        title: String,
        #[arg(long)]
        status: Option<ContainerKey>,
    },
    /// Run a scripted session against an in-memory store
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = ClientConfig::from_env().context("loading configuration")?;
    if let Some(url) = &cli.api_url {
        config.base_url = url
            .parse()
            .with_context(|| format!("invalid --api-url {url:?}"))?;
    }
    let profile_id = ProfileId::new(cli.profile);

    if let Command::Demo = cli.command {
        return run_demo(profile_id).await;
    }

    let store: Arc<dyn TaskStore> =
        Arc::new(HttpTaskStore::from_config(&config).context("building http client")?);
    let mut engine = EngineBuilder::new(store).build(profile_id);
    engine
        .mount()
        .await
        .with_context(|| format!("loading board for {profile_id}"))?;

    match cli.command {
        Command::Show { json } => {
            let board = engine.snapshot().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print_board(&board);
            }
        }
        Command::Sync => match engine.reconcile_derived().await? {
            ReconcileOutcome::AlreadyRunning => println!("reconciliation already running"),
            ReconcileOutcome::Completed(report) => println!(
                "created {}, skipped {}, failed {}",
                report.created.len(),
                report.skipped,
                report.failed.len()
            ),
        },
        Command::Move { item, target } => {
            let item_id: ItemId = item.parse().with_context(|| format!("invalid item {item:?}"))?;
            let target =
                DropTarget::parse(&target).with_context(|| format!("invalid target {target:?}"))?;
            move_item(&mut engine, item_id, target).await?;
            print_board(&engine.snapshot().await);
        }
        Command::Add { title, status } => {
            let status = status.unwrap_or(config.default_status);
            let added = engine.add_task(status, &title).await?;
            let created = added.sync.await.context("create task panicked")??;
            println!("created {} in {}", created.id, status.label());
        }
        Command::Demo => {}
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn move_item(engine: &mut BoardEngine, item_id: ItemId, target: DropTarget) -> Result<()> {
    engine.begin_drag(item_id).await?;
    let result = engine.end_drag(Some(target)).await?;
    match result.outcome {
        DropOutcome::Cancelled => bail!("{target:?} is not a valid drop target"),
        DropOutcome::Unchanged => println!("nothing to move"),
        DropOutcome::Moved(instruction) => {
            if let Some(sync) = result.sync {
                if let Err(err) = sync.await.context("move sync panicked")? {
                    // 位置はローカルに残る。次回の読み込みでサーバーの状態に戻る
                    println!("warning: {err}");
                }
            }
            println!(
                "moved {} to {} #{}",
                instruction.item_id,
                instruction.to.label(),
                instruction.index
            );
        }
    }
    Ok(())
}

fn print_board(board: &Board) {
    for key in ContainerKey::ALL {
        let items = board.container(key);
        println!("{} ({})", key.label(), items.len());
        for item in items {
            println!("  [{}] {}", item.id, item.title);
        }
    }
}

/// InMemoryTaskStore 上で一連の操作を流す
async fn run_demo(profile_id: ProfileId) -> Result<()> {
    let store = Arc::new(InMemoryTaskStore::new());
    let events = Arc::new(RecordingEventSink::new());

    let call = store.seed_task(profile_id, "Call GP", ContainerKey::Todo).await;
    store
        .seed_task(profile_id, "Refill prescription", ContainerKey::InProgress)
        .await;
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).context("demo date")?;
    store.seed_record(profile_id, "Blood Test", date).await;
    store.seed_record(profile_id, "blood test ", date).await;

    let mut engine = EngineBuilder::new(store.clone())
        .event_sink(events.clone())
        .build(profile_id);
    engine.mount().await?;
    info!("mounted demo board");
    print_board(&engine.snapshot().await);

    println!("\n-- drag \"Call GP\" to Done");
    move_item(&mut engine, call.id, DropTarget::Container(ContainerKey::Done)).await?;

    println!("\n-- add \"Book dentist\"");
    let added = engine.add_task(ContainerKey::Todo, "Book dentist").await?;
    added.sync.await.context("create task panicked")??;

    println!("\n-- rename \"Book dentist\" with a failing backend");
    let dentist = engine
        .snapshot()
        .await
        .container(ContainerKey::Todo)
        .iter()
        .find(|item| item.title == "Book dentist")
        .map(|item| item.id);
    let Some(dentist) = dentist else {
        bail!("created task missing from board");
    };
    store.fail_next_patches(1).await;
    engine.open_edit(dentist).await?;
    engine.edit_mut().set_title("Book dentist (urgent)")?;
    let sync = engine.commit_edit().await?;
    let _ = sync.await.context("edit sync panicked")?;

    println!();
    print_board(&engine.snapshot().await);
    let summary = engine.summary().await;
    println!("\n{} tasks, {} pending", summary.total(), summary.pending);
    for event in events.warnings() {
        println!("warning: {event:?}");
    }
    Ok(())
}
