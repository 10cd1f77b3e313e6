// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve` command implementation.
//!
//! Runs a processing pass every `poll_interval_secs` and serves the provider
//! callback webhook until SIGINT or SIGTERM. Both stop at the same
//! cancellation token; an in-flight pass finishes before exit.

use std::sync::Arc;
use std::time::Duration;

use herald_cascade::DispatchProcessor;
use herald_config::HeraldConfig;
use herald_core::HeraldError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::server::{self, ServerState};

pub async fn run_serve(config: &HeraldConfig, app: App) -> Result<(), HeraldError> {
    let cancel = install_signal_handler();

    let poller = {
        let processor = app.processor.clone();
        let cancel = cancel.clone();
        let batch_size = config.processor.batch_size;
        let period = Duration::from_secs(config.processor.poll_interval_secs);
        tokio::spawn(async move { poll_loop(processor, batch_size, period, cancel).await })
    };

    let state = ServerState {
        processor: app.processor.clone(),
        storage: app.store.clone(),
    };
    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HeraldError::Config(format!("failed to bind webhook server to {addr}: {e}")))?;
    info!("webhook server listening on {addr}");

    let served = axum::serve(listener, server::router(state))
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await
        .map_err(|e| HeraldError::Internal(format!("webhook server error: {e}")));

    // The server can also stop on its own error; make sure the poller follows.
    cancel.cancel();
    if let Err(e) = poller.await {
        warn!(error = %e, "poll task ended abnormally");
    }

    app.shutdown().await;
    info!("herald serve shutdown complete");
    served
}

/// Run a pass on every tick until cancelled.
async fn poll_loop(
    processor: Arc<DispatchProcessor>,
    batch_size: usize,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match processor.process_due(batch_size).await {
                    Ok(summary) if summary.processed > 0 => {
                        debug!(processed = summary.processed, "poll pass complete");
                    }
                    Ok(_) => debug!("poll pass found no due records"),
                    Err(e) => warn!(error = %e, "poll pass failed (non-fatal)"),
                }
            }
            _ = cancel.cancelled() => {
                info!("poll loop shutting down");
                break;
            }
        }
    }
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable; listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

#[cfg(test)]
mod tests {
    use herald_cascade::{CascadePolicy, ChannelSet, ProcessorSettings, ProviderRegistry};
    use herald_core::Channel;
    use herald_test_utils::{fixtures, ManualClock, MemoryStore, MockChannel};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn poll_loop_runs_passes_until_cancelled() {
        let store = Arc::new(MemoryStore::new());
        let campaign = fixtures::campaign("c-1", &[Channel::TextMessage]);
        store.put_campaign(campaign).await;
        store.put_template(fixtures::template(Channel::TextMessage)).await;
        store.put_member(fixtures::member("m-1")).await;

        let sms = Arc::new(MockChannel::new("sms"));
        let processor = Arc::new(DispatchProcessor::new(
            store.clone(),
            store.clone(),
            ChannelSet::new().with_text_message(sms.clone()),
            ProviderRegistry::new()
                .with_credentials(Channel::TextMessage, fixtures::credentials(Channel::TextMessage))
                .with_identity(fixtures::identity(fixtures::OWNER, Channel::TextMessage)),
            CascadePolicy::default(),
            ProcessorSettings::default(),
            Arc::new(ManualClock::fixed()),
        ));
        processor.launch(&"c-1".into()).await.unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            processor,
            10,
            Duration::from_secs(60),
            cancel.clone(),
        ));

        // The first tick fires immediately.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sms.sent_count().await, 1);

        cancel.cancel();
        task.await.unwrap();
    }
}
