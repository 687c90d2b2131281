//! Watch lifecycle with a scripted status source and paused time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};

use botdesk_client::ClientError;
use botdesk_models::{Bot, BotId, BotType, KnowledgeBaseState, KnowledgeBaseStatus};
use botdesk_runtime::{KnowledgePoller, PollEvent, PollerConfig, RuntimeError, StatusSource};

use KnowledgeBaseState::{Empty, Failed, Processing, Ready};

const BOT: BotId = BotId::new(42);

struct ScriptedSource {
    script: Mutex<VecDeque<Result<KnowledgeBaseState, String>>>,
    delay: Duration,
    fail_bot: bool,
    started: Instant,
    status_calls: Mutex<Vec<Duration>>,
    bot_calls: AtomicUsize,
}

impl ScriptedSource {
    /// Answers with `script`, then `processing` forever.
    fn new(script: impl IntoIterator<Item = Result<KnowledgeBaseState, String>>) -> Arc<Self> {
        Self::build(script, Duration::ZERO, false)
    }

    fn always_processing() -> Arc<Self> {
        Self::build(Vec::<Result<KnowledgeBaseState, String>>::new(), Duration::ZERO, false)
    }

    fn build(
        script: impl IntoIterator<Item = Result<KnowledgeBaseState, String>>,
        delay: Duration,
        fail_bot: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            delay,
            fail_bot,
            started: Instant::now(),
            status_calls: Mutex::new(Vec::new()),
            bot_calls: AtomicUsize::new(0),
        })
    }

    fn status_calls(&self) -> Vec<Duration> {
        self.status_calls.lock().unwrap().clone()
    }

    fn bot_calls(&self) -> usize {
        self.bot_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn knowledge_status(&self, bot_id: BotId) -> Result<KnowledgeBaseStatus, ClientError> {
        self.status_calls
            .lock()
            .unwrap()
            .push(self.started.elapsed());
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(Processing));
        next.map(|status| KnowledgeBaseStatus {
            bot_id,
            knowledge_base_status: status,
            bot_type: BotType::QaKnowledgeBase,
        })
        .map_err(ClientError::Transport)
    }

    async fn bot(&self, bot_id: BotId) -> Result<Bot, ClientError> {
        self.bot_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_bot {
            return Err(ClientError::from_status(
                404,
                r#"{"detail":"Bot not found"}"#.to_string(),
            ));
        }
        Ok(serde_json::from_value(serde_json::json!({
            "id": bot_id,
            "owner_id": 1,
            "bot_name": "Support",
            "bot_token": "123456:ABCDEF",
            "bot_type": "qa_knowledge_base",
            "status": "ready",
            "created_at": "2025-02-10T08:00:00",
            "knowledge_base_status": "ready"
        }))
        .unwrap())
    }
}

fn poller(source: &Arc<ScriptedSource>) -> KnowledgePoller {
    KnowledgePoller::new(source.clone(), PollerConfig::default())
}

fn assert_ticks(actual: &[Duration], expected_secs: &[u64]) {
    assert_eq!(actual.len(), expected_secs.len(), "ticks: {:?}", actual);
    for (at, secs) in actual.iter().zip(expected_secs) {
        let expected = Duration::from_secs(*secs);
        assert!(
            *at >= expected && *at - expected < Duration::from_millis(10),
            "tick at {:?}, expected {:?}",
            at,
            expected
        );
    }
}

/// Callback flag that records whether it ran.
fn flag() -> (Arc<AtomicBool>, impl FnOnce(Bot) + Send + 'static) {
    let called = Arc::new(AtomicBool::new(false));
    let set = called.clone();
    (called, move |_bot: Bot| set.store(true, Ordering::SeqCst))
}

#[tokio::test(start_paused = true)]
async fn watch_completes_after_processing_ends() {
    let source = ScriptedSource::new([Ok(Processing), Ok(Ready)]);
    let poller = poller(&source);
    let (tx, rx) = oneshot::channel();

    let handle = poller
        .watch(BOT, Processing, move |bot| {
            let _ = tx.send(bot);
        })
        .unwrap();
    assert!(poller.is_watching(BOT));

    let final_status = handle.join().await.unwrap();

    assert_eq!(final_status, Ready);
    let bot = rx.await.unwrap();
    assert_eq!(bot.id, BOT);
    assert_eq!(bot.knowledge_base_status, Ready);
    assert_ticks(&source.status_calls(), &[3, 6]);
    assert_eq!(source.bot_calls(), 1);
    assert!(!poller.is_watching(BOT));
}

#[tokio::test(start_paused = true)]
async fn no_queries_after_completion() {
    let source = ScriptedSource::new([Ok(Processing), Ok(Ready)]);
    let poller = poller(&source);

    let handle = poller.watch(BOT, Processing, |_| {}).unwrap();
    handle.join().await.unwrap();
    sleep(Duration::from_secs(30)).await;

    assert_eq!(source.status_calls().len(), 2);
    assert_eq!(source.bot_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_disarms_the_timer() {
    let source = ScriptedSource::always_processing();
    let poller = poller(&source);
    let (called, callback) = flag();

    let handle = poller.watch(BOT, Processing, callback).unwrap();
    sleep(Duration::from_secs(7)).await;
    assert_eq!(source.status_calls().len(), 2);

    handle.stop();
    handle.stop();
    assert!(!handle.is_active());
    assert!(!poller.is_watching(BOT));
    sleep(Duration::from_secs(30)).await;

    assert_eq!(source.status_calls().len(), 2);
    assert_eq!(source.bot_calls(), 0);
    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(handle.join().await.unwrap(), Processing);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_watch() {
    let source = ScriptedSource::always_processing();
    let poller = poller(&source);
    let mut events = poller.subscribe();

    let handle = poller.watch(BOT, Processing, |_| {}).unwrap();
    sleep(Duration::from_secs(4)).await;
    drop(handle);
    sleep(Duration::from_secs(30)).await;

    assert_eq!(source.status_calls().len(), 1);
    assert!(!poller.is_watching(BOT));
    assert_eq!(events.try_recv().unwrap(), PollEvent::WatchStarted { bot_id: BOT });
    assert_eq!(events.try_recv().unwrap(), PollEvent::Stopped { bot_id: BOT });
}

#[tokio::test(start_paused = true)]
async fn result_of_in_flight_query_is_ignored_after_stop() {
    let source = ScriptedSource::build([Ok(Ready)], Duration::from_secs(1), false);
    let poller = poller(&source);
    let (called, callback) = flag();

    let handle = poller.watch(BOT, Processing, callback).unwrap();
    sleep(Duration::from_millis(3500)).await;
    assert_eq!(source.status_calls().len(), 1);

    handle.stop();
    sleep(Duration::from_secs(10)).await;

    assert_eq!(handle.status(), Processing);
    assert_eq!(source.status_calls().len(), 1);
    assert_eq!(source.bot_calls(), 0);
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn failed_tick_keeps_polling_and_status() {
    let source = ScriptedSource::new([Err("connection reset".to_string()), Ok(Ready)]);
    let poller = poller(&source);
    let mut events = poller.subscribe();
    let (called, callback) = flag();

    let handle = poller.watch(BOT, Processing, callback).unwrap();
    sleep(Duration::from_secs(4)).await;

    assert_eq!(handle.status(), Processing);
    assert!(handle.is_active());

    assert_eq!(handle.join().await.unwrap(), Ready);
    assert_ticks(&source.status_calls(), &[3, 6]);
    assert!(called.load(Ordering::SeqCst));

    let events: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert_eq!(
        events,
        vec![
            PollEvent::WatchStarted { bot_id: BOT },
            PollEvent::TickFailed {
                bot_id: BOT,
                error: "transport error: connection reset".to_string(),
            },
            PollEvent::StatusChanged {
                bot_id: BOT,
                status: Ready,
            },
            PollEvent::Completed {
                bot_id: BOT,
                status: Ready,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_bot_refresh_skips_callback() {
    let source = ScriptedSource::build([Ok(Failed)], Duration::ZERO, true);
    let poller = poller(&source);
    let mut events = poller.subscribe();
    let (called, callback) = flag();

    let handle = poller.watch(BOT, Processing, callback).unwrap();
    assert_eq!(handle.join().await.unwrap(), Failed);

    assert_eq!(source.bot_calls(), 1);
    assert!(!called.load(Ordering::SeqCst));
    let events: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert!(events.last().unwrap().is_error());
}

#[tokio::test(start_paused = true)]
async fn watch_requires_processing_status() {
    let source = ScriptedSource::always_processing();
    let poller = poller(&source);

    for status in [Empty, Ready, Failed] {
        let err = poller.watch(BOT, status, |_| {}).unwrap_err();
        assert!(matches!(err, RuntimeError::NotProcessing { .. }), "{:?}", err);
    }
    sleep(Duration::from_secs(10)).await;

    assert!(!poller.is_watching(BOT));
    assert!(source.status_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn one_watch_per_bot() {
    let source = ScriptedSource::always_processing();
    let poller = poller(&source);

    let first = poller.watch(BOT, Processing, |_| {}).unwrap();
    let err = poller.watch(BOT, Processing, |_| {}).unwrap_err();
    assert!(matches!(err, RuntimeError::AlreadyWatching(id) if id == BOT));

    let other = poller.watch(BotId::new(43), Processing, |_| {}).unwrap();
    assert_eq!(poller.active_watches(), vec![BOT, BotId::new(43)]);

    first.stop();
    let again = poller.watch(BOT, Processing, |_| {}).unwrap();
    assert!(again.is_active());

    // The old task winding down must not free the new watch's slot.
    sleep(Duration::from_secs(1)).await;
    assert!(poller.is_watching(BOT));

    drop(other);
    drop(again);
    drop(first);
    assert!(poller.active_watches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn abandoned_join_stops_the_watch() {
    let source = ScriptedSource::always_processing();
    let poller = poller(&source);
    let mut events = poller.subscribe();

    let handle = poller.watch(BOT, Processing, |_| {}).unwrap();
    let waited = tokio::time::timeout(Duration::from_secs(4), handle.join()).await;
    assert!(waited.is_err());
    sleep(Duration::from_secs(30)).await;

    assert_eq!(source.status_calls().len(), 1);
    assert!(!poller.is_watching(BOT));
    let events: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert_eq!(
        events,
        vec![
            PollEvent::WatchStarted { bot_id: BOT },
            PollEvent::Stopped { bot_id: BOT },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_rejected() {
    let source = ScriptedSource::always_processing();
    let poller = KnowledgePoller::new(
        source.clone(),
        PollerConfig::new().with_poll_interval(Duration::ZERO),
    );

    let err = poller.watch(BOT, Processing, |_| {}).unwrap_err();

    assert!(matches!(err, RuntimeError::Configuration(_)), "{:?}", err);
    assert!(!poller.is_watching(BOT));
    assert!(source.status_calls().is_empty());
}
