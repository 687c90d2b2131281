//! Knowledge-base status watches.
//!
//! After a document upload the backend ingests it asynchronously. A watch
//! queries the status endpoint on a fixed interval while the knowledge base
//! is `processing`. Once it reports anything else the timer is disarmed, the
//! bot is fetched once and handed to the caller's callback.
//!
//! Each watch runs in its own task and is owned by a [`WatchHandle`].
//! Stopping or dropping the handle disarms the timer; a status query already
//! in flight is allowed to finish but its result is discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use botdesk_client::ApiClient;
use botdesk_models::{Bot, BotId, KnowledgeBaseState};

use crate::config::PollerConfig;
use crate::error::{Result, RuntimeError};
use crate::event::PollEvent;
use crate::source::StatusSource;

/// Arms and tracks status watches, at most one per bot.
#[derive(Clone)]
pub struct KnowledgePoller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    source: Arc<dyn StatusSource>,
    config: PollerConfig,
    /// Active watches by bot, tagged with the generation that armed them.
    active: Mutex<HashMap<BotId, u64>>,
    next_generation: AtomicU64,
    events: broadcast::Sender<PollEvent>,
}

impl KnowledgePoller {
    /// Creates a poller querying `source`.
    pub fn new(source: Arc<dyn StatusSource>, config: PollerConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(PollerInner {
                source,
                config,
                active: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
                events,
            }),
        }
    }

    /// Creates a poller over the REST client.
    pub fn for_client(client: ApiClient, config: PollerConfig) -> Self {
        Self::new(Arc::new(client), config)
    }

    /// Returns the poller configuration.
    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    /// Subscribe to poll events.
    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.inner.events.subscribe()
    }

    /// Returns true if a watch is active for `bot_id`.
    pub fn is_watching(&self, bot_id: BotId) -> bool {
        self.inner.active().contains_key(&bot_id)
    }

    /// Bots with an active watch.
    pub fn active_watches(&self) -> Vec<BotId> {
        let mut ids: Vec<_> = self.inner.active().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Starts watching the knowledge base of `bot_id`.
    ///
    /// Only arms when the poll interval is non-zero, `last_known` is
    /// `processing` and no watch for the bot is running. `on_bot_update`
    /// receives the re-fetched bot once processing finishes; it is not called
    /// if the watch is stopped first.
    pub fn watch<F>(
        &self,
        bot_id: BotId,
        last_known: KnowledgeBaseState,
        on_bot_update: F,
    ) -> Result<WatchHandle>
    where
        F: FnOnce(Bot) + Send + 'static,
    {
        self.inner.config.validate()?;
        if !last_known.is_processing() {
            return Err(RuntimeError::NotProcessing {
                bot_id,
                status: last_known,
            });
        }

        let generation = {
            let mut active = self.inner.active();
            if active.contains_key(&bot_id) {
                return Err(RuntimeError::AlreadyWatching(bot_id));
            }
            let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
            active.insert(bot_id, generation);
            generation
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(last_known);

        let task = tokio::spawn(run_watch(
            Arc::clone(&self.inner),
            bot_id,
            generation,
            status_tx,
            shutdown_rx,
            on_bot_update,
        ));

        info!(
            bot_id = %bot_id,
            poll_interval_ms = self.inner.config.poll_interval.as_millis(),
            "watching knowledge base"
        );
        self.inner.emit_event(PollEvent::WatchStarted { bot_id });

        Ok(WatchHandle {
            bot_id,
            generation,
            status: status_rx,
            shutdown: shutdown_tx,
            task,
            poller: Arc::clone(&self.inner),
        })
    }
}

impl PollerInner {
    fn active(&self) -> MutexGuard<'_, HashMap<BotId, u64>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Frees the registry slot if it still belongs to `generation`.
    fn release(&self, bot_id: BotId, generation: u64) {
        let mut active = self.active();
        if active.get(&bot_id) == Some(&generation) {
            active.remove(&bot_id);
        }
    }

    fn emit_event(&self, event: PollEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

async fn run_watch<F>(
    poller: Arc<PollerInner>,
    bot_id: BotId,
    generation: u64,
    status: watch::Sender<KnowledgeBaseState>,
    mut shutdown: watch::Receiver<bool>,
    on_bot_update: F,
) where
    F: FnOnce(Bot) + Send + 'static,
{
    let period = poller.config.poll_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let finished = loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break None;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        trace!(bot_id = %bot_id, "querying knowledge base status");
        let result = poller.source.knowledge_status(bot_id).await;

        if *shutdown.borrow() {
            debug!(bot_id = %bot_id, "watch stopped during status query, discarding result");
            break None;
        }

        let current = match result {
            Ok(reported) => reported.knowledge_base_status,
            Err(e) => {
                warn!(bot_id = %bot_id, error = %e, "knowledge base status query failed");
                poller.emit_event(PollEvent::TickFailed {
                    bot_id,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let previous = status.send_replace(current);
        if previous != current {
            debug!(bot_id = %bot_id, from = %previous, to = %current, "knowledge base status changed");
            poller.emit_event(PollEvent::StatusChanged {
                bot_id,
                status: current,
            });
        }

        if !current.is_processing() {
            break Some(current);
        }
    };

    poller.release(bot_id, generation);
    let Some(current) = finished else {
        debug!(bot_id = %bot_id, "watch stopped");
        return;
    };

    info!(bot_id = %bot_id, status = %current, "knowledge base processing finished");
    poller.emit_event(PollEvent::Completed {
        bot_id,
        status: current,
    });

    match poller.source.bot(bot_id).await {
        Ok(bot) if !*shutdown.borrow() => on_bot_update(bot),
        Ok(_) => debug!(bot_id = %bot_id, "watch stopped, dropping refreshed bot"),
        Err(e) => {
            warn!(bot_id = %bot_id, error = %e, "failed to refresh bot after processing");
            poller.emit_event(PollEvent::BotRefreshFailed {
                bot_id,
                error: e.to_string(),
            });
        }
    }
}

/// Owner of a running watch.
///
/// Dropping the handle stops the watch.
pub struct WatchHandle {
    bot_id: BotId,
    generation: u64,
    status: watch::Receiver<KnowledgeBaseState>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    poller: Arc<PollerInner>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("bot_id", &self.bot_id)
            .field("status", &*self.status.borrow())
            .field("active", &self.is_active())
            .finish()
    }
}

impl WatchHandle {
    /// Bot being watched.
    pub fn bot_id(&self) -> BotId {
        self.bot_id
    }

    /// Most recently observed status.
    pub fn status(&self) -> KnowledgeBaseState {
        *self.status.borrow()
    }

    /// Receiver notified on every status change.
    pub fn status_updates(&self) -> watch::Receiver<KnowledgeBaseState> {
        self.status.clone()
    }

    /// Returns true until the watch finishes or is stopped.
    pub fn is_active(&self) -> bool {
        !*self.shutdown.borrow() && !self.task.is_finished()
    }

    /// Disarms the timer. Safe to call any number of times.
    pub fn stop(&self) {
        let was_running = self.is_active();
        self.shutdown.send_replace(true);
        self.poller.release(self.bot_id, self.generation);
        if was_running {
            debug!(bot_id = %self.bot_id, "stopping knowledge base watch");
            self.poller
                .emit_event(PollEvent::Stopped { bot_id: self.bot_id });
        }
    }

    /// Waits for the watch to finish, including the bot callback.
    ///
    /// Dropping the returned future before it completes stops the watch.
    pub async fn join(mut self) -> Result<KnowledgeBaseState> {
        (&mut self.task)
            .await
            .map_err(|e| RuntimeError::Task(e.to_string()))?;
        Ok(self.status())
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
