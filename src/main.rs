mod admissions;
mod app;
mod chat;
mod config;
mod error;
mod event;
mod jobs;
mod logging;
mod session;
mod theme;
mod views;

use admissions::client::{AdmissionsClient, HttpAdmissionsBackend};
use app::{StudentDeskApp, Surface};
use chat::client::{HttpChatBackend, LaptopClient};
use clap::Parser;
use eframe::egui;
use jobs::poller::JobPoller;
use session::store::SessionStore;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use views::admissions::AdmissionsView;
use views::laptops::LaptopView;

#[derive(Debug, Parser)]
#[command(name = "studentdesk", version, about = "Laptop finder and admissions desk client")]
struct Cli {
    /// Base URL of the laptop recommendation API.
    #[arg(long, env = "LAPTOP_API_URL")]
    laptop_api_url: Option<String>,

    /// Base URL of the admissions server.
    #[arg(long, env = "ADMISSIONS_URL")]
    admissions_url: Option<String>,

    /// Directory holding config.toml and the saved chat session.
    #[arg(long, env = "STUDENTDESK_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "laptops")]
    surface: Surface,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing()?;
    let cli = Cli::parse();

    let state_dir = cli.state_dir.unwrap_or_else(config::default_state_dir);
    let mut config = config::load(&state_dir);
    if let Some(url) = cli.laptop_api_url {
        config.laptop_api_url = url;
    }
    if let Some(url) = cli.admissions_url {
        config.admissions_url = url;
    }
    tracing::info!(
        laptop_api = %config.laptop_api_url,
        admissions = %config.admissions_url,
        state_dir = %state_dir.display(),
        "starting studentdesk"
    );

    let (tx, rx) = mpsc::channel();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("studentdesk-runtime")
        .build()?;
    let handle = runtime.handle().clone();

    let chat_backend = HttpChatBackend::new(config.laptop_api_url.clone(), config.request_timeout())?;
    let laptop_client = LaptopClient::new(Arc::new(chat_backend), tx.clone(), handle.clone());
    let laptops = LaptopView::new(laptop_client, SessionStore::new(&state_dir));

    let admissions_backend = Arc::new(HttpAdmissionsBackend::new(
        config.admissions_url.clone(),
        config.request_timeout(),
    )?);
    let poller = JobPoller::spawn(
        &handle,
        admissions_backend.clone(),
        config.poll_interval(),
        tx.clone(),
    );
    let admissions_client = AdmissionsClient::new(admissions_backend, tx, handle);
    let admissions = AdmissionsView::new(admissions_client, poller, config.download_dir(&state_dir));

    let app = StudentDeskApp::new(rx, cli.surface, laptops, admissions);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "StudentDesk",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
