// This is the entry point of the exobrain diary server.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Google APIs, SQLite)
// - `web/` = HTTP adapter (form page, JSON API)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start the web server

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/web_layer.rs"]
mod web;

use crate::core::ai::{prompt, AiConfig, AiProvider, FeedbackService};
use crate::core::diary::{DiaryService, DiaryStore};
use crate::core::reference::ReferenceSource;
use crate::core::submission::SubmissionOrchestrator;
use crate::infra::ai::GeminiClient;
use crate::infra::diary::{InMemoryDiaryStore, SqliteDiaryStore};
use crate::infra::drive::DriveFolderClient;
use crate::infra::google::{auth::DIARY_SCOPES, ServiceAccountAuth};
use crate::infra::sheets::SheetsDiaryStore;
use crate::web::AppState;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_SPREADSHEET: &str = "exobrain-diary";
const DEFAULT_BIND: &str = "127.0.0.1:8990";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    let gemini_api_key = std::env::var("GEMINI_API_KEY").expect(
        "Missing GEMINI_API_KEY environment variable! Create a .env file with your API key.",
    );
    let gemini_model =
        std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
    let max_output_tokens = std::env::var("GEMINI_MAX_OUTPUT_TOKENS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok());

    let spreadsheet_name =
        std::env::var("EXOBRAIN_SPREADSHEET").unwrap_or_else(|_| DEFAULT_SPREADSHEET.to_string());
    let store_kind = std::env::var("EXOBRAIN_STORE").unwrap_or_else(|_| "sheets".to_string());
    let drive_folder = std::env::var("EXOBRAIN_DRIVE_FOLDER").ok();
    let persona =
        std::env::var("EXOBRAIN_PERSONA").unwrap_or_else(|_| prompt::DEFAULT_PERSONA.to_string());
    let cache_ttl = std::env::var("EXOBRAIN_CACHE_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_CACHE_TTL_SECS);
    let bind_addr = std::env::var("EXOBRAIN_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    // Sheets and Drive share one service-account credential.
    let use_sheets = !matches!(store_kind.as_str(), "sqlite" | "memory");
    let needs_google = use_sheets || drive_folder.is_some();
    let google_auth = if needs_google {
        Some(Arc::new(
            ServiceAccountAuth::from_env(DIARY_SCOPES)
                .await
                .expect("Failed to load Google service account credentials"),
        ))
    } else {
        None
    };

    let store: Box<dyn DiaryStore> = match store_kind.as_str() {
        // Ephemeral store: lets you try the app without Google credentials.
        "memory" => {
            tracing::info!("Using in-memory diary store (entries are lost on restart)");
            Box::new(InMemoryDiaryStore::new())
        }
        "sqlite" => {
            let db_path =
                std::env::var("EXOBRAIN_DB_PATH").unwrap_or_else(|_| "data/diary.db".to_string());
            tracing::info!(path = %db_path, "Using SQLite diary store");
            Box::new(
                SqliteDiaryStore::new(&db_path)
                    .await
                    .expect("Failed to initialize SQLite diary store"),
            )
        }
        _ => {
            tracing::info!(spreadsheet = %spreadsheet_name, "Using Google Sheets diary store");
            Box::new(SheetsDiaryStore::new(
                Arc::clone(google_auth.as_ref().expect("auth required for sheets")),
                spreadsheet_name,
            ))
        }
    };

    let diary = Arc::new(DiaryService::new(store, Duration::from_secs(cache_ttl)));

    let reference: Option<Box<dyn ReferenceSource>> = drive_folder.map(|folder| {
        tracing::info!(folder = %folder, "Reference folder enabled");
        Box::new(DriveFolderClient::new(
            Arc::clone(google_auth.as_ref().expect("auth required for drive")),
            folder,
        )) as Box<dyn ReferenceSource>
    });

    let ai_config = AiConfig {
        model: gemini_model,
        temperature: 0.7,
        max_output_tokens,
    };
    let provider: Box<dyn AiProvider> = Box::new(GeminiClient::new(gemini_api_key));
    let feedback = FeedbackService::new(provider, ai_config);

    let orchestrator = Arc::new(SubmissionOrchestrator::new(
        Arc::clone(&diary),
        feedback,
        reference,
        persona,
    ));

    let state = AppState {
        orchestrator,
        diary,
    };

    // ========================================================================
    // WEB SERVER
    // ========================================================================

    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {bind_addr}: {e}"));

    tracing::info!("Exobrain diary listening on http://{bind_addr}");

    axum::serve(listener, app)
        .await
        .expect("Error running web server");
}
