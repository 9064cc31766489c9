use std::{sync::Arc, time::Duration};

use axum::{Router, middleware::from_fn};
use dotenv::dotenv;
use reqwest::Client;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::FmtSubscriber;

use crate::{
    analytics::ledger::UserLedger,
    bank::loader::QuestionBank,
    client::chat_client::ChatClient,
    common::app_state::AppState,
    config::config::CONFIG,
    health::handlers::{health_routes, status_routes},
    mw::request_mw::request_mw,
    session::{engine::QuizEngine, models::EngineSettings, reaper::spawn_reaper},
    webhook::handlers::webhook_routes,
};

mod analytics;
mod bank;
mod client;
mod common;
mod config;
mod health;
mod mw;
mod session;
mod transport;
mod webhook;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() {
    // Initialize .env
    dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(LevelFilter::DEBUG)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing");

    // Load the question bank once; a missing or broken file degrades to an
    // empty bank so the service still comes up.
    let bank = match QuestionBank::load(&CONFIG.bank.path) {
        Ok(bank) => {
            info!("Loaded {} categories", bank.category_count());
            bank
        }
        Err(e) => {
            error!(
                "Failed to load question bank from {}: {}",
                CONFIG.bank.path, e
            );
            QuestionBank::empty()
        }
    };

    // Initialize state
    let ledger = Arc::new(UserLedger::load(&CONFIG.analytics.path).await);
    let transport = Arc::new(ChatClient::new(
        &CONFIG.chat.api_base,
        &CONFIG.chat.token,
        Client::new(),
    ));
    let engine = QuizEngine::new(
        bank,
        transport,
        ledger,
        EngineSettings::from_config(&CONFIG),
    );

    // Background eviction of abandoned sessions
    spawn_reaper(
        Arc::clone(engine.store()),
        Duration::from_secs(CONFIG.quiz.reap_interval_secs),
    );

    let state = AppState::new(engine);

    // Initialize routes
    let app = Router::new()
        .nest("/webhook", webhook_routes(state.clone()))
        .nest("/health", health_routes(state.clone()))
        .merge(status_routes(state.clone()))
        .layer(from_fn(request_mw));

    // Initialize webserver
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", CONFIG.server.address, CONFIG.server.port))
            .await
            .unwrap();

    info!(
        "Server listening on address: {}",
        listener.local_addr().unwrap()
    );
    axum::serve(listener, app).await.unwrap();
}
