use std::sync::Arc;

use anyhow::{Context, Result};

use aralin_lib::server::{start_server, AppState};

use crate::app::App;

pub fn run(app: App, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| app.config.bind.clone());
    let db = app.open_database()?;
    let generator = app.generator()?;
    let state = Arc::new(AppState::new(db, generator));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let handle = start_server(&bind, state)
            .await
            .with_context(|| format!("Failed to bind {}", bind))?;
        println!("Listening on {}", handle.base_url());

        tokio::signal::ctrl_c().await.context("Failed to wait for Ctrl-C")?;
        handle.shutdown().await;
        Ok(())
    })
}
