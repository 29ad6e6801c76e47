//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Entry point of the signup server. Loads the configuration, wires the store, the sinks, the
// render worker and the signup service, re-renders recently changed events and serves the API
// until Ctrl-C.
//--------------------------------------------------------------------------------------------------

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{Level, info, warn};

use dance_signup::{
    AggregateStore, Api, Config, LogSink, MemoryStore, NotificationSink, Notifier, RenderSink,
    RenderWorker, ServiceSettings, SignupService, TaskSupervisor, WebhookSink,
};

/// Command line arguments; anything not given falls back to the environment.
#[derive(Parser, Debug)]
#[command(author, version, about = "Dance event signup coordinator")]
struct Args {
    /// Address to listen on
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Skip the startup re-render sweep
    #[arg(long)]
    no_rerender: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::try_from_env().map_err(anyhow::Error::msg)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    let level: Level = config
        .log_level
        .parse()
        .with_context(|| format!("invalid log level {:?}", config.log_level))?;
    tracing_subscriber::fmt().with_max_level(level).init();

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.bind_addr))?;

    let store: Arc<dyn AggregateStore> = Arc::new(MemoryStore::new());

    let render_sink: Arc<dyn RenderSink> = match &config.render_webhook_url {
        Some(url) => Arc::new(WebhookSink::new(url.clone())?),
        None => Arc::new(LogSink),
    };
    let notify_sink: Arc<dyn NotificationSink> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookSink::new(url.clone())?),
        None => Arc::new(LogSink),
    };

    let (renderer, render_handle) = RenderWorker::new(render_sink, config.render_queue_capacity)
        .with_repeats(config.render_repeats.clone(), store.clone())
        .start();
    let notifier = Notifier::new(notify_sink, store.clone());
    let tasks = TaskSupervisor::new();

    let service = SignupService::new(
        ServiceSettings::from(&config),
        store,
        renderer.clone(),
        notifier,
        tasks.clone(),
    );

    if !args.no_rerender {
        let queued = service.rerender_recent(config.rerender_on_startup).await?;
        info!(queued, "startup re-render queued");
    }

    info!(addr = %addr, "starting signup server");
    let api = Api::new(addr, service);
    tokio::select! {
        res = api.serve() => res.context("API server failed")?,
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
    }

    if let Err(e) = renderer.shutdown().await {
        warn!(error = %e, "render worker already stopped");
    }
    let _ = render_handle.await;
    tasks.wait_idle().await;
    info!(failures = tasks.failures(), "signup server stopped");
    Ok(())
}
