use clap::Parser;
use miette::{IntoDiagnostic, Result};
use resto_chat::application::dialogue::{ChatReply, DialogueEngine};
use resto_chat::application::payment::PaymentService;
use resto_chat::domain::menu::sample_menu;
use resto_chat::domain::ports::{
    MenuStoreRef, OrderStoreRef, ProviderOutcome, UserStoreRef,
};
use resto_chat::infrastructure::gateway::SimulatedGateway;
use resto_chat::infrastructure::in_memory::{
    InMemoryMenuStore, InMemoryOrderStore, InMemoryUserStore,
};
use resto_chat::interfaces::api::{ChatApi, MessageRequest, VerifyRequest};
use std::io::BufRead;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<std::path::PathBuf>,

    /// Base URL stamped into payment links.
    #[arg(long, default_value = "http://localhost:3000")]
    callback_base: String,

    /// Session id to chat under. Defaults to a fresh random session.
    #[arg(long)]
    session: Option<String>,
}

fn build_stores(cli: &Cli) -> Result<(MenuStoreRef, UserStoreRef, OrderStoreRef)> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store = resto_chat::infrastructure::rocksdb::RocksDbStore::open(db_path)
            .into_diagnostic()?;
        return Ok((
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        ));
    }
    let _ = cli;
    Ok((
        Arc::new(InMemoryMenuStore::new()),
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryOrderStore::new()),
    ))
}

fn print_reply(reply: &ChatReply) {
    println!("\n{}", reply.message);
    for option in &reply.options {
        println!("  [{}] {}", option.value, option.text);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (menu, users, orders) = build_stores(&cli)?;
    menu.seed(sample_menu()).await.into_diagnostic()?;

    let gateway = Arc::new(SimulatedGateway::new(&cli.callback_base));
    let payments = Arc::new(PaymentService::new(
        orders.clone(),
        users.clone(),
        None,
        gateway.clone(),
        &cli.callback_base,
    ));
    let engine = DialogueEngine::new(menu, users.clone(), orders.clone(), payments.clone());
    let api = ChatApi::new(engine, payments, users, orders);

    let session = cli
        .session
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    println!("Session: {session}");
    print_reply(
        &api.post_message(MessageRequest {
            user_id: session.clone(),
            message: "main-menu".to_string(),
        })
        .await,
    );
    println!("\nType an option token, `settle <reference> <success|failed>`, or `quit`.");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.into_diagnostic()?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }
        if let Some(rest) = input.strip_prefix("settle ") {
            settle(&api, &gateway, &session, rest).await;
            continue;
        }
        let reply = api
            .post_message(MessageRequest {
                user_id: session.clone(),
                message: input.to_string(),
            })
            .await;
        print_reply(&reply);
    }

    Ok(())
}

/// Drives the simulated confirmation page: records the chosen outcome on the
/// gateway, then runs the verify call a real client would make.
async fn settle(api: &ChatApi, gateway: &SimulatedGateway, session: &str, rest: &str) {
    let mut parts = rest.split_whitespace();
    let (Some(reference), outcome) = (parts.next(), parts.next()) else {
        println!("usage: settle <reference> <success|failed>");
        return;
    };
    let outcome = match outcome {
        Some("failed") => ProviderOutcome::Failed,
        _ => ProviderOutcome::Success,
    };
    gateway.settle(reference, outcome).await;
    let response = api
        .verify_payment(VerifyRequest {
            reference: reference.to_string(),
            user_id: session.to_string(),
            outcome: Some(outcome),
        })
        .await;
    match response.message {
        Some(message) => println!("{message}"),
        None => println!("status: {}", response.status),
    }
}
