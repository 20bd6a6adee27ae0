use anyhow::Result;

mod api;
mod app;
mod config;
mod error;
mod identity;
mod middleware;
mod services;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
