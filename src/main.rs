use anyhow::Context;
use slack_feed::bridge::{EnrichedMessage, MessageParams, SlackBridge};
use slack_feed::config::load_settings;
use slack_feed::logging::init_tracing;
use slack_feed::slack::{FileDownloader, SlackClient, SocketModeSession};
use slack_feed::storage::PublicDir;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize rustls crypto provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    init_tracing();

    tracing::info!("🚀 Starting Slack feed bridge");

    // Load configuration
    let settings = load_settings().context("failed to load configuration")?;
    tracing::info!("✅ Configuration loaded");
    tracing::debug!(
        "Config: public_dir={:?}, reconnect_interval={}s, channel={:?}",
        settings.bridge.public_dir,
        settings.bridge.reconnect_interval_secs,
        settings.bridge.channel_filter
    );

    // Prepare the directory served to the dashboard
    let public_dir = PublicDir::new(settings.bridge.public_dir.clone());
    public_dir
        .ensure()
        .await
        .with_context(|| format!("failed to create {:?}", settings.bridge.public_dir))?;
    tracing::info!("✅ Public directory ready at {:?}", public_dir.path());

    let slack_client = Arc::new(SlackClient::new(settings.slack.clone())?);
    tracing::info!("Slack client created");

    let downloader = if settings.bridge.download_files {
        Some(FileDownloader::new(
            settings.slack.bot_token.clone(),
            public_dir,
        )?)
    } else {
        tracing::info!("Attachment downloads disabled");
        None
    };

    let (events, _) = broadcast::channel(settings.bridge.event_buffer);
    let bridge = SlackBridge::new(slack_client.clone(), downloader, events.clone());

    if let Err(e) = bridge.test().await {
        tracing::warn!(error = %e, "Slack auth test failed, continuing anyway");
    }

    let subscription = bridge.message(
        write_json_line,
        MessageParams {
            channel: settings.bridge.channel_filter.clone(),
        },
    );

    let shutdown = shutdown_signal().context("failed to install signal handlers")?;
    let session = SocketModeSession::new(slack_client, events);

    tracing::info!("Starting realtime session (Socket Mode)");
    bridge
        .run(session, settings.bridge.reconnect_interval(), async {
            let signal_name = shutdown.await;
            tracing::info!(
                signal = %signal_name,
                "Received shutdown signal, initiating graceful shutdown"
            );
        })
        .await;

    subscription.abort();
    tracing::info!("Application shutdown sequence complete");
    Ok(())
}

/// Emit one enriched message as a JSON line on stdout
fn write_json_line(message: EnrichedMessage) {
    let line = match serde_json::to_string(&message) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e, ts = %message.ts.as_str(), "Could not serialize message");
            return;
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
        tracing::warn!(error = %e, "Could not write message to stdout");
    }
}

/// Resolve once SIGINT, SIGTERM or SIGQUIT arrives, naming the signal
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = String>> {
    use signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => "SIGINT (Ctrl+C)".to_string(),
            _ = sigterm.recv() => "SIGTERM".to_string(),
            _ = sigquit.recv() => "SIGQUIT".to_string(),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = String>> {
    // On Windows, only handle Ctrl+C
    Ok(async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        }
        "Ctrl+C".to_string()
    })
}
