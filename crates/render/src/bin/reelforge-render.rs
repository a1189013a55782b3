//! `reelforge-render` -- submit a render request and follow it to the end.
//!
//! Usage: `reelforge-render <request.json>`
//!
//! # Environment variables
//!
//! | Variable         | Required | Default                 | Description              |
//! |------------------|----------|-------------------------|--------------------------|
//! | `RENDER_API_URL` | no       | `http://localhost:8000` | Render backend base URL  |

use std::sync::Arc;

use reelforge_core::request::RenderRequest;
use reelforge_render::{CoordinatorState, HttpRenderApi, PollPolicy, RenderCoordinator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelforge_render=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        tracing::error!("Usage: reelforge-render <request.json>");
        std::process::exit(2);
    });

    let api_url = std::env::var("RENDER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());

    let raw = tokio::fs::read_to_string(&path).await.unwrap_or_else(|e| {
        tracing::error!(path = %path, error = %e, "Cannot read request file");
        std::process::exit(2);
    });
    let request: RenderRequest = serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::error!(path = %path, error = %e, "Request file is not a valid render request");
        std::process::exit(2);
    });

    let coordinator = RenderCoordinator::new(
        Arc::new(HttpRenderApi::new(api_url.clone())),
        PollPolicy::default(),
    );

    let mut job = match coordinator.start(&request).await {
        Ok(job) => job,
        Err(e) => {
            match e.failure_reason() {
                Some(reason) => println!("failed: {reason}"),
                None => println!("failed: {e}"),
            }
            std::process::exit(1);
        }
    };
    println!("{} submitted to {api_url}", job.id());

    let mut states = job.subscribe();
    let mut last = states.borrow_and_update().clone();
    print_state(&last);
    while !last.is_terminal() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                job.cancel();
                println!("cancelled");
                std::process::exit(130);
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                last = states.borrow_and_update().clone();
                print_state(&last);
            }
        }
    }

    match job.wait().await {
        CoordinatorState::Done { .. } => {}
        _ => std::process::exit(1),
    }
}

fn print_state(state: &CoordinatorState) {
    match state {
        CoordinatorState::Idle => println!("idle"),
        CoordinatorState::Pending => println!("pending"),
        CoordinatorState::Processing => println!("processing"),
        CoordinatorState::Done { output_url } => {
            println!("done: {}", output_url.as_deref().unwrap_or("<no output url>"))
        }
        CoordinatorState::Failed { reason } => println!("failed: {reason}"),
    }
}
