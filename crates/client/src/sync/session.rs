// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The session state machine.
//!
//! A [`Session`] owns one logical connection for one stream. It is driven
//! from a single task: [`Session::step`] waits for the next thing to
//! happen (an inbound message, a heartbeat tick, the reconnect timer, an
//! online signal or a disconnect) and handles it. [`Session::run`] steps
//! until the session stops.
//!
//! ```text
//!            connect                 welcome
//!   Idle ──────────────► Connecting ─────────► Connected
//!    ▲                     │   ▲                  │
//!    │ disconnect          │   │ timer / online   │ close, error,
//!    │                     ▼   │                  │ heartbeat timeout
//!    └────────────────── Reconnecting ◄───────────┘
//!                          │
//!                          ▼ budget spent / auth refused
//!                        Failed
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use ts_core::protocol::{ClientMessage, ErrorCode, ServerMessage};
use ts_core::{Action, ActionId, Channel};

use super::auth::TokenProvider;
use super::dispatcher::EventDispatcher;
use super::heartbeat::{Heartbeat, HeartbeatPolicy, HeartbeatStatus};
use super::kv::KeyValueStore;
use super::queue::{ActionSender, Delivery, DrainReport, OfflineQueue};
use super::registry::SubscriptionRegistry;
use super::scheduler::{BackoffPolicy, ReconnectScheduler};
use super::state::{
    ActionOutcome, ActionReport, FailureReason, SessionError, SessionInfo, SessionState,
    StatusUpdate,
};
use super::store::ActionStore;
use super::transport::{Transport, TransportError, TransportResult};

/// Configuration for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Logical stream name. Scopes the durable queue.
    pub stream: String,
    /// WebSocket URL of the server.
    pub endpoint: String,
    /// Extra parameters sent with `hello`.
    pub query: BTreeMap<String, String>,
    pub connect_timeout: Duration,
    pub ack_timeout: Duration,
    pub backoff: BackoffPolicy,
    pub heartbeat: HeartbeatPolicy,
    /// Failed delivery attempts after which a queued action is reported stuck.
    pub stuck_threshold: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            stream: "default".to_string(),
            endpoint: "ws://127.0.0.1:7890".to_string(),
            query: BTreeMap::new(),
            connect_timeout: Duration::from_secs(10),
            ack_timeout: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
            heartbeat: HeartbeatPolicy::default(),
            stuck_threshold: 5,
        }
    }
}

/// State shared with [`SessionHandle`]s.
struct Control {
    cancel: Mutex<CancellationToken>,
    /// Generation counter bumped on every online signal.
    online: watch::Sender<u64>,
}

impl Control {
    fn new() -> Self {
        Control {
            cancel: Mutex::new(CancellationToken::new()),
            online: watch::channel(0).0,
        }
    }

    fn token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cancel(&self) {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Replaces a spent token so a new connect is not cancelled at birth.
    fn rearm(&self) {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
    }
}

/// Cross-task control of a session.
#[derive(Clone)]
pub struct SessionHandle {
    control: Arc<Control>,
}

impl SessionHandle {
    /// Stops the session. Any in-flight connect, send or drain is abandoned
    /// and the reconnect timer is cancelled.
    pub fn disconnect(&self) {
        self.control.cancel();
    }

    /// Signals that the network is reachable again.
    pub fn notify_online(&self) {
        self.control.online.send_modify(|n| *n = n.wrapping_add(1));
    }
}

/// Result of one [`Session::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// The session is idle or failed; nothing will happen until `connect`.
    Stopped,
}

/// What a server message means to the session.
#[derive(Debug)]
enum Inbound {
    Handled,
    Ack(ActionId),
    Rejected(ActionId, String),
    Lost(SessionError),
}

/// The live connection: transport plus everything that reacts to traffic.
struct Link<T> {
    transport: T,
    dispatcher: EventDispatcher,
    heartbeat: Heartbeat,
    ack_timeout: Duration,
    control: Arc<Control>,
    /// Verdicts for other actions seen while waiting on one.
    stray: Vec<Inbound>,
}

impl<T: Transport> Link<T> {
    fn route(&mut self, msg: ServerMessage) -> Inbound {
        match msg {
            ServerMessage::Pong { id } => {
                self.heartbeat.on_pong(id);
                return Inbound::Handled;
            }
            _ => self.heartbeat.on_traffic(),
        }

        match msg {
            ServerMessage::Event { event } => {
                self.dispatcher.emit(&event);
                Inbound::Handled
            }
            ServerMessage::Ack { id } => Inbound::Ack(id),
            ServerMessage::Rejected { id, message } => Inbound::Rejected(id, message),
            ServerMessage::Close { reason } => Inbound::Lost(SessionError::ServerClosed(reason)),
            ServerMessage::Error {
                code: Some(ErrorCode::AuthRejected),
                message,
            } => Inbound::Lost(SessionError::AuthRejected(message)),
            ServerMessage::Error {
                code: Some(ErrorCode::Unavailable),
                message,
            } => Inbound::Lost(SessionError::TransportUnavailable(message)),
            ServerMessage::Error { code, message } => {
                tracing::warn!(?code, %message, "server error");
                Inbound::Handled
            }
            ServerMessage::Welcome { .. } | ServerMessage::Pong { .. } => Inbound::Handled,
        }
    }

    async fn send(&mut self, msg: ClientMessage) -> Result<(), SessionError> {
        let cancel = self.control.token();
        tracing::debug!(?msg, "send");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SessionError::Cancelled),
            result = self.transport.send(msg) => {
                result.map_err(|e| SessionError::TransportUnavailable(e.to_string()))
            }
        }
    }

    async fn await_verdict(&mut self, id: ActionId) -> Delivery {
        loop {
            let msg = match self.transport.recv().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    return Delivery::Failed(SessionError::ServerClosed(
                        "connection closed by peer".into(),
                    ))
                }
                Err(e) => return Delivery::Failed(SessionError::TransportUnavailable(e.to_string())),
            };
            match self.route(msg) {
                Inbound::Ack(got) if got == id => return Delivery::Acked,
                Inbound::Rejected(got, message) if got == id => return Delivery::Rejected(message),
                Inbound::Lost(err) => return Delivery::Failed(err),
                Inbound::Handled => {}
                other => self.stray.push(other),
            }
        }
    }
}

impl<T: Transport> ActionSender for Link<T> {
    fn deliver<'a>(
        &'a mut self,
        action: &'a Action,
    ) -> Pin<Box<dyn Future<Output = Delivery> + Send + 'a>> {
        Box::pin(async move {
            if !self.transport.is_connected() {
                return Delivery::Failed(SessionError::TransportUnavailable(
                    "not connected".into(),
                ));
            }
            if let Err(e) = self.send(ClientMessage::action(action.clone())).await {
                return Delivery::Failed(e);
            }

            let cancel = self.control.token();
            let ack_timeout = self.ack_timeout;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Delivery::Failed(SessionError::Cancelled),
                verdict = tokio::time::timeout(ack_timeout, self.await_verdict(action.id)) => {
                    verdict.unwrap_or(Delivery::Failed(SessionError::AckTimeout(ack_timeout)))
                }
            }
        })
    }
}

/// What woke a step.
enum Wake {
    Cancelled,
    Online,
    Retry,
    Inbound(TransportResult<Option<ServerMessage>>),
    Heartbeat,
}

/// One logical connection lifecycle for one stream.
pub struct Session<T: Transport> {
    config: SessionConfig,
    auth: Arc<dyn TokenProvider>,
    state: SessionState,
    info: SessionInfo,
    registry: SubscriptionRegistry,
    queue: OfflineQueue,
    scheduler: ReconnectScheduler,
    link: Link<T>,
    control: Arc<Control>,
    online: watch::Receiver<u64>,
}

impl<T: Transport> Session<T> {
    /// Creates an idle session. The durable queue for `config.stream` is
    /// loaded from `kv` immediately.
    pub fn new(
        config: SessionConfig,
        transport: T,
        auth: Arc<dyn TokenProvider>,
        kv: Box<dyn KeyValueStore>,
    ) -> Self {
        let store = ActionStore::new(kv, &config.stream);
        let queue = OfflineQueue::open(store, config.stuck_threshold);
        let control = Arc::new(Control::new());
        let online = control.online.subscribe();
        let link = Link {
            transport,
            dispatcher: EventDispatcher::new(),
            heartbeat: Heartbeat::new(config.heartbeat.clone()),
            ack_timeout: config.ack_timeout,
            control: Arc::clone(&control),
            stray: Vec::new(),
        };

        Session {
            scheduler: ReconnectScheduler::new(config.backoff.clone()),
            config,
            auth,
            state: SessionState::Idle,
            info: SessionInfo::default(),
            registry: SubscriptionRegistry::new(),
            queue,
            link,
            control,
            online,
        }
    }

    /// Replaces the reconnect scheduler, e.g. with a seeded one.
    pub fn with_scheduler(mut self, scheduler: ReconnectScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    pub fn transport(&self) -> &T {
        &self.link.transport
    }

    /// Delay chosen for the pending (or most recent) reconnect.
    pub fn last_retry_delay(&self) -> Option<Duration> {
        self.scheduler.last_delay()
    }

    /// True while connected but with unanswered heartbeats.
    pub fn is_degraded(&self) -> bool {
        self.state == SessionState::Connected && self.link.heartbeat.is_degraded()
    }

    pub fn dispatcher_mut(&mut self) -> &mut EventDispatcher {
        &mut self.link.dispatcher
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            control: Arc::clone(&self.control),
        }
    }

    fn transition(&mut self, state: SessionState, reason: Option<SessionError>) {
        self.state = state;
        self.info.reconnect_attempt = self.scheduler.attempt();
        match &reason {
            Some(reason) => {
                tracing::info!(stream = %self.config.stream, %state, %reason, "session state changed")
            }
            None => tracing::info!(stream = %self.config.stream, %state, "session state changed"),
        }
        self.link
            .dispatcher
            .emit_status(&StatusUpdate::new(state, reason));
    }

    /// Drops online signals that arrived before now.
    fn forget_online(&mut self) {
        let _ = self.online.borrow_and_update();
    }

    fn report(&mut self, report: ActionReport) {
        self.link.dispatcher.emit_action_report(&report);
    }

    /// Starts the session and records `channels` as subscriptions.
    ///
    /// From `Idle` or `Failed` this makes one connect attempt before
    /// returning; afterwards drive the session with [`Session::run`]. On an
    /// already active session only the channels are recorded (and joined,
    /// if connected).
    pub async fn connect(&mut self, channels: impl IntoIterator<Item = Channel>) {
        let added: Vec<Channel> = channels
            .into_iter()
            .filter(|c| self.registry.subscribe(c.clone()))
            .collect();

        if self.state.is_active() {
            if self.state == SessionState::Connected {
                for channel in added {
                    if let Err(e) = self.link.send(ClientMessage::join(channel)).await {
                        self.handle_failure(e).await;
                        return;
                    }
                }
            }
            return;
        }

        self.control.rearm();
        self.forget_online();
        self.scheduler.reset();
        self.info.consecutive_failures = 0;
        self.attempt_connect().await;
    }

    /// Stops the session and returns it to `Idle`.
    pub async fn disconnect(&mut self) {
        self.control.cancel();
        self.shutdown().await;
    }

    /// Adds a subscription. Joins immediately when connected.
    pub async fn subscribe(&mut self, channel: Channel) -> bool {
        if !self.registry.subscribe(channel.clone()) {
            return false;
        }
        if self.state == SessionState::Connected {
            if let Err(e) = self.link.send(ClientMessage::join(channel)).await {
                self.handle_failure(e).await;
            }
        }
        true
    }

    /// Removes a subscription. Leaves immediately when connected.
    pub async fn unsubscribe(&mut self, channel: &Channel) -> bool {
        if !self.registry.unsubscribe(channel) {
            return false;
        }
        if self.state == SessionState::Connected {
            if let Err(e) = self.link.send(ClientMessage::leave(channel.clone())).await {
                self.handle_failure(e).await;
            }
        }
        true
    }

    /// Sends an action, queueing it if it cannot be delivered now.
    ///
    /// While older actions are queued, the new one is queued behind them
    /// and the queue is drained, so actions reach the server in order.
    pub async fn send_action(&mut self, action: Action) -> ActionOutcome {
        let id = action.id;

        if self.state != SessionState::Connected {
            self.queue.enqueue(action);
            return ActionOutcome::Queued;
        }

        if !self.queue.is_empty() {
            self.queue.enqueue(action);
            let report = self.drain().await;
            if report.flushed.contains(&id) {
                return ActionOutcome::Delivered;
            }
            if let Some(r) = report.rejected.iter().find(|r| r.id == id) {
                return ActionOutcome::Rejected(r.message.clone());
            }
            return ActionOutcome::Queued;
        }

        let delivery = self.link.deliver(&action).await;
        self.resolve_stray();
        match delivery {
            Delivery::Acked => ActionOutcome::Delivered,
            Delivery::Rejected(message) => {
                tracing::warn!(%id, %message, "action rejected");
                ActionOutcome::Rejected(message)
            }
            Delivery::Failed(err) => {
                self.queue.enqueue(action);
                self.handle_failure(err).await;
                ActionOutcome::Queued
            }
        }
    }

    /// Delivers queued actions in order. Does nothing unless connected.
    pub async fn drain(&mut self) -> DrainReport {
        if self.state != SessionState::Connected {
            return DrainReport::not_started(
                self.queue.len(),
                SessionError::TransportUnavailable("not connected".into()),
            );
        }
        if self.queue.is_empty() {
            return DrainReport::default();
        }

        let report = self.queue.drain(&mut self.link).await;
        tracing::info!(
            stream = %self.config.stream,
            flushed = report.flushed.len(),
            rejected = report.rejected.len(),
            remaining = report.remaining,
            "offline queue drained"
        );

        for outcome in &report.outcomes {
            self.report(outcome.clone());
        }
        self.resolve_stray();

        if let Some(err) = report.stopped.clone() {
            self.handle_failure(err).await;
        }
        report
    }

    /// Applies verdicts that arrived for actions other than the one awaited.
    fn resolve_stray(&mut self) {
        let stray = std::mem::take(&mut self.link.stray);
        for inbound in stray {
            self.resolve(inbound);
        }
    }

    fn resolve(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Ack(id) => {
                if self.queue.remove(id).is_some() {
                    self.report(ActionReport::Delivered { id });
                } else {
                    tracing::debug!(%id, "ack for unknown action");
                }
            }
            Inbound::Rejected(id, message) => {
                if self.queue.remove(id).is_some() {
                    tracing::warn!(%id, %message, "queued action rejected");
                    self.report(ActionReport::Rejected { id, message });
                } else {
                    tracing::debug!(%id, "rejection for unknown action");
                }
            }
            Inbound::Handled | Inbound::Lost(_) => {}
        }
    }

    /// Waits for and handles the next event.
    pub async fn step(&mut self) -> StepOutcome {
        let connected = self.state == SessionState::Connected;
        let reconnecting = matches!(self.state, SessionState::Reconnecting { .. });
        if !connected && !reconnecting {
            return StepOutcome::Stopped;
        }

        let cancel = self.control.token();
        let wake = tokio::select! {
            biased;
            _ = cancel.cancelled() => Wake::Cancelled,
            Ok(()) = self.online.changed() => Wake::Online,
            _ = self.scheduler.fired(), if reconnecting => Wake::Retry,
            msg = self.link.transport.recv(), if connected => Wake::Inbound(msg),
            _ = self.link.heartbeat.tick(), if connected => Wake::Heartbeat,
        };

        match wake {
            Wake::Cancelled => self.shutdown().await,
            Wake::Online => self.on_online().await,
            Wake::Retry => self.attempt_connect().await,
            Wake::Inbound(msg) => self.on_inbound(msg).await,
            Wake::Heartbeat => self.on_heartbeat().await,
        }

        if self.state.is_active() {
            StepOutcome::Continue
        } else {
            StepOutcome::Stopped
        }
    }

    /// Steps until the session is idle or failed.
    pub async fn run(&mut self) -> SessionState {
        while self.step().await == StepOutcome::Continue {}
        self.state
    }

    async fn attempt_connect(&mut self) {
        let Some(token) = self.auth.token().filter(|t| !t.is_empty()) else {
            self.scheduler.cancel();
            self.transition(
                SessionState::Failed {
                    reason: FailureReason::AuthMissing,
                },
                Some(SessionError::AuthMissing),
            );
            return;
        };

        self.transition(SessionState::Connecting, None);

        let cancel = self.control.token();
        let timeout = self.config.connect_timeout;
        let attempt = tokio::time::timeout(
            timeout,
            self.link
                .transport
                .connect(&self.config.endpoint, &token, &self.config.query),
        );
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = attempt => Some(result.unwrap_or(Err(TransportError::Timeout(timeout)))),
        };

        match result {
            None => self.shutdown().await,
            Some(Ok(session_id)) => self.on_connected(session_id).await,
            Some(Err(e)) if e.is_auth_rejection() => self.fail_auth(e.to_string()).await,
            Some(Err(e)) => {
                tracing::warn!(endpoint = %self.config.endpoint, error = %e, "connect failed");
                self.info.consecutive_failures = self.info.consecutive_failures.saturating_add(1);
                let _ = self.link.transport.close().await;
                self.schedule_retry(SessionError::TransportUnavailable(e.to_string()));
            }
        }
    }

    async fn on_connected(&mut self, session_id: String) {
        self.scheduler.reset();
        self.info.session_id = Some(session_id);
        self.info.last_connected_at = Some(Utc::now());
        self.info.consecutive_failures = 0;
        self.link.heartbeat.start();
        self.transition(SessionState::Connected, None);

        for channel in self.registry.reassert_all() {
            if let Err(e) = self.link.send(ClientMessage::join(channel)).await {
                self.handle_failure(e).await;
                return;
            }
        }

        self.drain().await;
    }

    async fn on_online(&mut self) {
        match self.state {
            SessionState::Reconnecting { .. } => {
                tracing::info!(stream = %self.config.stream, "network online, reconnecting now");
                self.scheduler.cancel();
                self.attempt_connect().await;
            }
            SessionState::Connected => {
                self.drain().await;
            }
            _ => {}
        }
    }

    async fn on_inbound(&mut self, msg: TransportResult<Option<ServerMessage>>) {
        match msg {
            Ok(Some(msg)) => match self.link.route(msg) {
                Inbound::Lost(err) => self.handle_failure(err).await,
                other => self.resolve(other),
            },
            Ok(None) => {
                self.handle_failure(SessionError::ServerClosed(
                    "connection closed by peer".into(),
                ))
                .await
            }
            Err(e) => {
                self.handle_failure(SessionError::TransportUnavailable(e.to_string()))
                    .await
            }
        }
    }

    async fn on_heartbeat(&mut self) {
        let (status, ping) = self.link.heartbeat.on_tick();
        match status {
            HeartbeatStatus::TimedOut => {
                self.handle_failure(SessionError::HeartbeatTimeout).await;
                return;
            }
            HeartbeatStatus::Degraded { missed } => {
                tracing::info!(stream = %self.config.stream, missed, "connection degraded");
            }
            HeartbeatStatus::Healthy => {}
        }
        if let Some(id) = ping {
            if let Err(e) = self.link.send(ClientMessage::ping(id)).await {
                self.handle_failure(e).await;
            }
        }
    }

    async fn handle_failure(&mut self, err: SessionError) {
        match err {
            SessionError::Cancelled => self.shutdown().await,
            SessionError::AuthRejected(message) => self.fail_auth(message).await,
            other => self.connection_lost(other).await,
        }
    }

    async fn connection_lost(&mut self, err: SessionError) {
        tracing::warn!(stream = %self.config.stream, error = %err, "connection lost");
        self.link.heartbeat.stop();
        self.info.session_id = None;
        self.info.consecutive_failures = self.info.consecutive_failures.saturating_add(1);
        let _ = self.link.transport.close().await;
        self.schedule_retry(err);
    }

    fn schedule_retry(&mut self, err: SessionError) {
        // Online signals from before the failure are stale
        self.forget_online();
        match self.scheduler.schedule() {
            Some(delay) => {
                let attempt = self.scheduler.attempt();
                tracing::info!(stream = %self.config.stream, attempt, ?delay, "reconnect scheduled");
                self.transition(SessionState::Reconnecting { attempt }, Some(err));
            }
            None => {
                let attempts = self.scheduler.attempt();
                tracing::error!(stream = %self.config.stream, attempts, error = %err, "giving up on reconnect");
                self.transition(
                    SessionState::Failed {
                        reason: FailureReason::MaxAttemptsExceeded,
                    },
                    Some(SessionError::MaxAttemptsExceeded { attempts }),
                );
            }
        }
    }

    async fn fail_auth(&mut self, message: String) {
        tracing::error!(stream = %self.config.stream, %message, "auth token rejected");
        self.auth.clear_token();
        self.scheduler.cancel();
        self.link.heartbeat.stop();
        self.info.session_id = None;
        let _ = self.link.transport.close().await;
        self.transition(
            SessionState::Failed {
                reason: FailureReason::AuthRejected,
            },
            Some(SessionError::AuthRejected(message)),
        );
    }

    async fn shutdown(&mut self) {
        self.control.cancel();
        self.forget_online();
        self.scheduler.cancel();
        self.link.heartbeat.stop();
        self.info.session_id = None;
        let _ = self.link.transport.close().await;
        if self.state != SessionState::Idle {
            self.transition(SessionState::Idle, None);
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
