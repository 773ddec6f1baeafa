use std::time::Duration;

use {
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    classify::classify, dispatcher::Dispatcher, error::TransportError, transport::UpdateSource,
};

/// Pull updates until `cancel` fires, handing each one to the dispatcher.
///
/// Never waits on a handler. Transient poll failures are retried after
/// `poll_retry`; a fatal one ends the loop with that error. Returns the
/// number of events dispatched.
pub async fn run_ingestion<S: UpdateSource>(
    mut source: S,
    dispatcher: &Dispatcher,
    cancel: CancellationToken,
    poll_retry: Duration,
) -> Result<u64, TransportError> {
    let me = source.identity().await?;
    info!(bot = %me.handle(), id = me.id, "bot started, waiting for updates");

    let mut dispatched: u64 = 0;
    loop {
        let batch = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            batch = source.poll() => batch,
        };

        match batch {
            Ok(updates) => {
                if !updates.is_empty() {
                    debug!(count = updates.len(), "received updates");
                }
                for raw in &updates {
                    let event = classify(raw);
                    debug!(
                        event_id = %event.id,
                        kind = event.kind.label(),
                        source = ?event.source.map(|s| s.0),
                        "dispatching event"
                    );
                    // Detached: the unit reports its own outcome.
                    drop(dispatcher.dispatch(event));
                    dispatched += 1;
                }
            },
            Err(e) if e.is_fatal() => {
                error!(error = %e, "update polling stopped");
                return Err(e);
            },
            Err(e) => {
                warn!(error = %e, retry_in = ?poll_retry, "polling for updates failed");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(poll_retry) => {},
                }
            },
        }
    }

    info!(dispatched, "ingestion stopped");
    Ok(dispatched)
}
