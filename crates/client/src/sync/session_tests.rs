// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the session state machine.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use tokio::time::{sleep, Instant};
use ts_core::protocol::{ClientMessage, ErrorCode, ServerMessage};
use ts_core::{Action, Channel, Event, EventKind};

use super::*;
use crate::sync::auth::StaticToken;
use crate::sync::kv::MemoryStore;
use crate::sync::state::StatusKind;
use crate::sync::test_helpers::{ConnectScript, MockTransport, Reply};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn poll(id: &str) -> Channel {
    Channel::poll_room(id).unwrap()
}

struct Fixture {
    session: Session<MockTransport>,
    mock: MockTransport,
    auth: Arc<StaticToken>,
    kv: MemoryStore,
    statuses: Arc<Mutex<Vec<StatusUpdate>>>,
    reports: Arc<Mutex<Vec<ActionReport>>>,
}

impl Fixture {
    fn states(&self) -> Vec<SessionState> {
        self.statuses.lock().unwrap().iter().map(|s| s.state).collect()
    }

    fn last_status(&self) -> StatusUpdate {
        self.statuses.lock().unwrap().last().cloned().unwrap()
    }

    fn reports(&self) -> Vec<ActionReport> {
        self.reports.lock().unwrap().clone()
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        stream: "polls".into(),
        ..SessionConfig::default()
    }
}

fn fixture_with(config: SessionConfig, token: Option<&str>, kv: MemoryStore) -> Fixture {
    let mock = MockTransport::new();
    let auth = Arc::new(StaticToken::new(token.map(String::from)));
    let scheduler = ReconnectScheduler::with_seed(config.backoff.clone(), 17);
    let mut session = Session::new(config, mock.clone(), auth.clone(), Box::new(kv.clone()))
        .with_scheduler(scheduler);

    let statuses: Arc<Mutex<Vec<StatusUpdate>>> = Arc::default();
    let reports: Arc<Mutex<Vec<ActionReport>>> = Arc::default();
    let s = Arc::clone(&statuses);
    session.dispatcher_mut().on_status(move |u| {
        s.lock().unwrap().push(u.clone());
        Ok(())
    });
    let r = Arc::clone(&reports);
    session.dispatcher_mut().on_action_report(move |a| {
        r.lock().unwrap().push(a.clone());
        Ok(())
    });

    Fixture {
        session,
        mock,
        auth,
        kv,
        statuses,
        reports,
    }
}

fn fixture() -> Fixture {
    fixture_with(config(), Some("token-1"), MemoryStore::new())
}

#[tokio::test(start_paused = true)]
async fn refused_then_reconnects_joins_and_drains_once() {
    let mut f = fixture();
    f.mock.script_connects(&[ConnectScript::Refuse]);
    let scan = Action::scan("evt_1", "t1");
    assert_eq!(f.session.send_action(scan.clone()).await, ActionOutcome::Queued);

    f.session.connect([poll("p1")]).await;

    assert_eq!(f.session.state(), SessionState::Reconnecting { attempt: 1 });
    let delay = f.session.last_retry_delay().unwrap();
    assert!(delay >= ms(1000) && delay < ms(2000), "{delay:?}");
    assert_eq!(f.mock.connect_calls(), 1);
    assert!(f.mock.actions().is_empty());

    let start = Instant::now();
    assert_eq!(f.session.step().await, StepOutcome::Continue);

    assert_eq!(start.elapsed(), delay);
    assert_eq!(f.session.state(), SessionState::Connected);
    assert_eq!(f.session.info().reconnect_attempt, 0);
    assert_eq!(f.session.info().session_id.as_deref(), Some("mock-1"));
    assert_eq!(f.mock.joins(), vec![poll("p1")]);
    assert_eq!(f.mock.actions(), vec![scan.id]);
    assert!(f.session.queue().is_empty());
    assert_eq!(f.reports(), vec![ActionReport::Delivered { id: scan.id }]);

    let sent = f.mock.sent();
    let join_at = sent
        .iter()
        .position(|m| matches!(m, ClientMessage::Join { .. }))
        .unwrap();
    let action_at = sent
        .iter()
        .position(|m| matches!(m, ClientMessage::Action { .. }))
        .unwrap();
    assert!(join_at < action_at);

    assert_eq!(
        f.states(),
        vec![
            SessionState::Connecting,
            SessionState::Reconnecting { attempt: 1 },
            SessionState::Connecting,
            SessionState::Connected,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn connect_uses_token_and_records_session() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;

    assert_eq!(f.session.state(), SessionState::Connected);
    assert_eq!(f.mock.tokens(), vec!["token-1".to_string()]);
    assert!(f.session.info().last_connected_at.is_some());
    assert_eq!(f.last_status().kind, StatusKind::Connected);
}

#[tokio::test(start_paused = true)]
async fn missing_token_fails_without_network() {
    let mut f = fixture_with(config(), None, MemoryStore::new());
    f.session.connect([poll("p1")]).await;

    assert_eq!(
        f.session.state(),
        SessionState::Failed {
            reason: FailureReason::AuthMissing
        }
    );
    assert_eq!(f.mock.connect_calls(), 0);
    let status = f.last_status();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.reason, Some(SessionError::AuthMissing));
    assert_eq!(f.session.step().await, StepOutcome::Stopped);
}

#[tokio::test(start_paused = true)]
async fn auth_rejection_clears_token_and_never_retries() {
    let mut f = fixture();
    f.mock.script_connects(&[ConnectScript::RejectAuth]);
    f.session.connect([poll("p1")]).await;

    assert_eq!(
        f.session.state(),
        SessionState::Failed {
            reason: FailureReason::AuthRejected
        }
    );
    assert_eq!(f.auth.token(), None);
    assert_eq!(f.session.step().await, StepOutcome::Stopped);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(f.mock.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn server_auth_error_while_connected_fails_session() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    f.mock.push(ServerMessage::error_with_code(
        ErrorCode::AuthRejected,
        "token revoked",
    ));

    assert_eq!(f.session.step().await, StepOutcome::Stopped);
    assert_eq!(
        f.session.state(),
        SessionState::Failed {
            reason: FailureReason::AuthRejected
        }
    );
    assert_eq!(f.auth.token(), None);
}

#[tokio::test(start_paused = true)]
async fn plain_server_error_keeps_connection() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    f.mock.push(ServerMessage::error("unknown channel"));

    assert_eq!(f.session.step().await, StepOutcome::Continue);
    assert_eq!(f.session.state(), SessionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn handle_disconnect_cancels_pending_reconnect() {
    let mut f = fixture();
    f.mock.script_connects(&[ConnectScript::Refuse]);
    f.session.connect([poll("p1")]).await;
    assert!(matches!(f.session.state(), SessionState::Reconnecting { .. }));

    f.session.handle().disconnect();
    assert_eq!(f.session.step().await, StepOutcome::Stopped);
    assert_eq!(f.session.state(), SessionState::Idle);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(f.session.step().await, StepOutcome::Stopped);
    assert_eq!(f.mock.connect_calls(), 1);
    assert_eq!(f.last_status().state, SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn disconnect_abandons_hung_connect() {
    let mut f = fixture();
    f.mock.script_connects(&[ConnectScript::Hang]);
    let handle = f.session.handle();

    tokio::join!(f.session.connect([poll("p1")]), async {
        sleep(ms(500)).await;
        handle.disconnect();
    });

    assert_eq!(f.session.state(), SessionState::Idle);
    sleep(Duration::from_secs(120)).await;
    assert_eq!(f.mock.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn disconnect_during_drain_keeps_queue_in_order() {
    let mut f = fixture();
    let a = Action::scan("evt_1", "a");
    let b = Action::scan("evt_1", "b");
    f.session.send_action(a.clone()).await;
    f.session.send_action(b.clone()).await;
    f.mock.reply_to_actions(&[Reply::Silent]);
    let handle = f.session.handle();

    tokio::join!(f.session.connect([]), async {
        sleep(ms(500)).await;
        handle.disconnect();
    });

    assert_eq!(f.session.state(), SessionState::Idle);
    assert_eq!(f.mock.actions(), vec![a.id]);
    let left = f.session.queue().peek_all();
    assert_eq!(
        left.iter().map(|p| p.id()).collect::<Vec<_>>(),
        vec![a.id, b.id]
    );
    assert_eq!(left[0].attempt_count, 1);
    assert_eq!(left[1].attempt_count, 0);
    assert!(f.reports().is_empty());

    let stored = ActionStore::new(Box::new(f.kv.clone()), "polls").load();
    assert_eq!(stored, left);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(f.mock.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn disconnect_then_connect_again() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    f.session.disconnect().await;

    assert_eq!(f.session.state(), SessionState::Idle);
    assert!(!f.session.transport().is_connected());
    assert_eq!(f.session.info().session_id, None);

    f.session.connect([]).await;
    assert_eq!(f.session.state(), SessionState::Connected);
    assert_eq!(f.mock.connect_calls(), 2);
    // Subscriptions survive an explicit disconnect
    assert_eq!(f.mock.joins(), vec![poll("p1"), poll("p1")]);
}

#[tokio::test(start_paused = true)]
async fn connect_timeout_schedules_retry() {
    let mut f = fixture();
    f.mock.script_connects(&[ConnectScript::Hang]);
    let start = Instant::now();

    f.session.connect([poll("p1")]).await;

    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert_eq!(f.session.state(), SessionState::Reconnecting { attempt: 1 });
    assert!(matches!(
        f.last_status().reason,
        Some(SessionError::TransportUnavailable(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_retry_budget() {
    let mut cfg = config();
    cfg.backoff.max_attempts = 2;
    let mut f = fixture_with(cfg, Some("t"), MemoryStore::new());
    f.mock.script_connects(&[ConnectScript::Refuse; 3]);

    f.session.connect([poll("p1")]).await;
    assert_eq!(f.session.step().await, StepOutcome::Continue);
    assert_eq!(f.session.state(), SessionState::Reconnecting { attempt: 2 });
    assert_eq!(f.session.step().await, StepOutcome::Stopped);

    assert_eq!(
        f.session.state(),
        SessionState::Failed {
            reason: FailureReason::MaxAttemptsExceeded
        }
    );
    assert_eq!(
        f.last_status().reason,
        Some(SessionError::MaxAttemptsExceeded { attempts: 2 })
    );
    assert_eq!(f.mock.connect_calls(), 3);

    // connect from Failed starts over
    f.session.connect([]).await;
    assert_eq!(f.session.state(), SessionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn success_resets_backoff() {
    let mut f = fixture();
    f.mock
        .script_connects(&[ConnectScript::Refuse, ConnectScript::Refuse]);

    f.session.connect([poll("p1")]).await;
    f.session.step().await;
    assert_eq!(f.session.state(), SessionState::Reconnecting { attempt: 2 });
    assert!(f.session.last_retry_delay().unwrap() >= ms(2000));
    assert_eq!(f.session.info().consecutive_failures, 2);

    f.session.step().await;
    assert_eq!(f.session.state(), SessionState::Connected);
    assert_eq!(f.session.info().reconnect_attempt, 0);
    assert_eq!(f.session.info().consecutive_failures, 0);

    f.mock.close_from_server();
    f.session.step().await;
    assert_eq!(f.session.state(), SessionState::Reconnecting { attempt: 1 });
    assert!(f.session.last_retry_delay().unwrap() < ms(2000));
}

#[tokio::test(start_paused = true)]
async fn server_close_reconnects() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    f.mock.push(ServerMessage::close("maintenance"));

    assert_eq!(f.session.step().await, StepOutcome::Continue);
    assert_eq!(f.session.state(), SessionState::Reconnecting { attempt: 1 });
    let status = f.last_status();
    assert_eq!(status.kind, StatusKind::Disconnected);
    assert_eq!(
        status.reason,
        Some(SessionError::ServerClosed("maintenance".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn each_channel_joined_once_per_connection() {
    let mut f = fixture();
    f.session.connect([poll("p1"), poll("p1")]).await;
    assert!(!f.session.subscribe(poll("p1")).await);
    assert!(f.session.subscribe(poll("p2")).await);
    assert_eq!(f.mock.joins(), vec![poll("p1"), poll("p2")]);

    f.mock.drop_connection();
    f.session.step().await;
    assert!(matches!(f.session.state(), SessionState::Reconnecting { .. }));
    f.session.step().await;
    assert_eq!(f.session.state(), SessionState::Connected);

    assert_eq!(
        f.mock.joins(),
        vec![poll("p1"), poll("p2"), poll("p1"), poll("p2")]
    );
}

#[tokio::test(start_paused = true)]
async fn subscribe_while_disconnected_records_intent() {
    let mut f = fixture();
    assert!(f.session.subscribe(poll("p3")).await);
    assert!(f.mock.sent().is_empty());
    assert!(f.session.registry().contains(&poll("p3")));

    f.session.connect([]).await;
    assert_eq!(f.mock.joins(), vec![poll("p3")]);
}

#[tokio::test(start_paused = true)]
async fn unsubscribe_leaves_when_connected() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    assert!(f.session.unsubscribe(&poll("p1")).await);
    assert!(!f.session.unsubscribe(&poll("p1")).await);

    assert!(f
        .mock
        .sent()
        .contains(&ClientMessage::leave(poll("p1"))));
    assert!(f.session.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn connect_on_active_session_only_adds_channels() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    f.session.connect([poll("p2")]).await;

    assert_eq!(f.mock.connect_calls(), 1);
    assert_eq!(f.mock.joins(), vec![poll("p1"), poll("p2")]);
}

#[tokio::test(start_paused = true)]
async fn send_action_connected_is_delivered() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    let vote = Action::vote("p1", "yes");

    assert_eq!(f.session.send_action(vote.clone()).await, ActionOutcome::Delivered);
    assert_eq!(f.mock.actions(), vec![vote.id]);
    assert!(f.session.queue().is_empty());
}

#[tokio::test(start_paused = true)]
async fn send_action_rejected_is_not_queued() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    f.mock.reply_to_actions(&[Reply::Reject]);

    let outcome = f.session.send_action(Action::vote("p1", "maybe")).await;

    assert_eq!(outcome, ActionOutcome::Rejected("rejected by server".into()));
    assert!(f.session.queue().is_empty());
    assert_eq!(f.session.state(), SessionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn network_failure_queues_and_redelivers() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    f.mock.reply_to_actions(&[Reply::FailSend]);
    let vote = Action::vote("p1", "no");

    assert_eq!(f.session.send_action(vote.clone()).await, ActionOutcome::Queued);
    assert!(matches!(f.session.state(), SessionState::Reconnecting { .. }));
    assert_eq!(f.session.queue().len(), 1);

    f.session.step().await;
    assert_eq!(f.session.state(), SessionState::Connected);
    assert!(f.session.queue().is_empty());
    assert_eq!(f.mock.actions(), vec![vote.id]);
    assert_eq!(f.reports(), vec![ActionReport::Delivered { id: vote.id }]);
}

#[tokio::test(start_paused = true)]
async fn partial_drain_keeps_rest_in_order() {
    let mut f = fixture();
    let (a, b, c) = (
        Action::scan("evt_1", "a"),
        Action::scan("evt_1", "b"),
        Action::scan("evt_1", "c"),
    );
    for action in [&a, &b, &c] {
        f.session.send_action(action.clone()).await;
    }
    f.mock.reply_to_actions(&[Reply::Ack, Reply::FailSend]);

    f.session.connect([]).await;

    assert!(matches!(f.session.state(), SessionState::Reconnecting { .. }));
    let left = f.session.queue().peek_all();
    assert_eq!(
        left.iter().map(|p| p.id()).collect::<Vec<_>>(),
        vec![b.id, c.id]
    );
    assert_eq!(left[0].attempt_count, 1);
    assert_eq!(left[1].attempt_count, 0);
    assert_eq!(f.reports(), vec![ActionReport::Delivered { id: a.id }]);

    // The persisted copy matches
    let stored = ActionStore::new(Box::new(f.kv.clone()), "polls").load();
    assert_eq!(stored, left);
}

#[tokio::test(start_paused = true)]
async fn queued_action_rejected_during_drain_is_reported() {
    let mut f = fixture();
    let a = Action::scan("evt_1", "void");
    let b = Action::scan("evt_1", "ok");
    f.session.send_action(a.clone()).await;
    f.session.send_action(b.clone()).await;
    f.mock.reply_to_actions(&[Reply::Reject]);

    f.session.connect([]).await;

    assert!(f.session.queue().is_empty());
    assert_eq!(
        f.reports(),
        vec![
            ActionReport::Rejected {
                id: a.id,
                message: "rejected by server".into()
            },
            ActionReport::Delivered { id: b.id },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn missing_ack_is_retried_not_dropped() {
    let mut f = fixture();
    let a = Action::vote("p1", "yes");
    f.session.send_action(a.clone()).await;
    f.mock.reply_to_actions(&[Reply::Silent]);

    let start = Instant::now();
    f.session.connect([]).await;

    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert!(matches!(f.session.state(), SessionState::Reconnecting { .. }));
    assert_eq!(f.session.queue().len(), 1);
    assert!(matches!(
        f.last_status().reason,
        Some(SessionError::AckTimeout(_))
    ));

    f.session.step().await;
    assert!(f.session.queue().is_empty());
    // Same id both times so the server can deduplicate
    assert_eq!(f.mock.actions(), vec![a.id, a.id]);
}

#[tokio::test(start_paused = true)]
async fn server_unavailable_requeues_without_waiting_for_ack() {
    let mut f = fixture();
    f.session.connect([]).await;
    let a = Action::vote("p1", "yes");
    f.mock.reply_to_actions(&[Reply::Silent]);
    f.mock.push(ServerMessage::error_with_code(
        ErrorCode::Unavailable,
        "storage error",
    ));

    let start = Instant::now();
    assert_eq!(f.session.send_action(a.clone()).await, ActionOutcome::Queued);

    assert!(start.elapsed() < ms(1));
    assert!(matches!(f.session.state(), SessionState::Reconnecting { .. }));
    assert_eq!(f.session.queue().len(), 1);
    assert!(matches!(
        f.last_status().reason,
        Some(SessionError::TransportUnavailable(_))
    ));

    f.session.step().await;
    assert_eq!(f.session.state(), SessionState::Connected);
    assert!(f.session.queue().is_empty());
    assert_eq!(f.reports(), vec![ActionReport::Delivered { id: a.id }]);
}

#[tokio::test(start_paused = true)]
async fn late_ack_for_other_queued_action_resolves_it() {
    let mut f = fixture();
    let a = Action::scan("evt_1", "a");
    let b = Action::scan("evt_1", "b");
    f.session.send_action(a.clone()).await;
    f.session.send_action(b.clone()).await;
    f.mock.reply_to_actions(&[Reply::Silent]);
    f.mock.push(ServerMessage::ack(b.id));

    f.session.connect([]).await;

    let left = f.session.queue().peek_all();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id(), a.id);
    assert_eq!(f.reports(), vec![ActionReport::Delivered { id: b.id }]);
}

#[tokio::test(start_paused = true)]
async fn repeated_failures_report_stuck_action() {
    let mut cfg = config();
    cfg.stuck_threshold = 2;
    let mut f = fixture_with(cfg, Some("t"), MemoryStore::new());
    let a = Action::scan("evt_1", "a");
    f.session.send_action(a.clone()).await;
    f.mock.reply_to_actions(&[Reply::FailSend, Reply::FailSend]);

    f.session.connect([]).await;
    assert!(f.reports().is_empty());
    f.session.step().await;

    assert_eq!(f.reports(), vec![ActionReport::Stuck { id: a.id, attempts: 2 }]);
    assert_eq!(f.session.queue().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_degrades_then_times_out() {
    let mut f = fixture();
    f.mock.ignore_pings(true);
    f.session.connect([poll("p1")]).await;
    let start = Instant::now();

    f.session.step().await;
    assert_eq!(start.elapsed(), Duration::from_secs(25));
    assert!(!f.session.is_degraded());

    f.session.step().await;
    assert_eq!(f.session.state(), SessionState::Connected);
    assert!(f.session.is_degraded());

    f.session.step().await;
    assert_eq!(start.elapsed(), Duration::from_secs(75));
    assert!(matches!(f.session.state(), SessionState::Reconnecting { .. }));
    assert_eq!(f.last_status().reason, Some(SessionError::HeartbeatTimeout));
    assert_eq!(f.mock.pings(), 2);
}

#[tokio::test(start_paused = true)]
async fn answered_heartbeats_keep_connection() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;

    for _ in 0..6 {
        f.session.step().await;
    }
    assert_eq!(f.session.state(), SessionState::Connected);
    assert!(!f.session.is_degraded());
    assert!(f.mock.pings() >= 3);
}

#[tokio::test(start_paused = true)]
async fn inbound_events_reach_handlers() {
    let mut f = fixture();
    let seen: Arc<Mutex<Vec<EventKind>>> = Arc::default();
    let s = Arc::clone(&seen);
    f.session
        .dispatcher_mut()
        .on_event(EventKind::VoteUpdate, move |e| {
            s.lock().unwrap().push(e.kind.clone());
            Ok(())
        });
    f.session
        .dispatcher_mut()
        .on_any_event(|_| Err("handler bug".into()));

    f.session.connect([poll("p1")]).await;
    f.mock.push(ServerMessage::event(Event::new(
        poll("p1"),
        EventKind::VoteUpdate,
        serde_json::json!({ "poll_id": "p1", "tallies": { "yes": 1 } }),
    )));

    assert_eq!(f.session.step().await, StepOutcome::Continue);
    assert_eq!(*seen.lock().unwrap(), vec![EventKind::VoteUpdate]);
    assert_eq!(f.session.state(), SessionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn online_signal_skips_backoff() {
    let mut f = fixture();
    f.mock.script_connects(&[ConnectScript::Refuse]);
    f.session.connect([poll("p1")]).await;

    f.session.handle().notify_online();
    let start = Instant::now();
    f.session.step().await;

    assert_eq!(f.session.state(), SessionState::Connected);
    assert!(start.elapsed() < ms(1));
}

#[tokio::test(start_paused = true)]
async fn online_signal_before_connect_does_not_skip_backoff() {
    let mut f = fixture();
    f.session.handle().notify_online();
    f.mock.script_connects(&[ConnectScript::Refuse]);
    f.session.connect([poll("p1")]).await;
    let delay = f.session.last_retry_delay().unwrap();

    let start = Instant::now();
    f.session.step().await;

    assert_eq!(start.elapsed(), delay);
    assert_eq!(f.session.state(), SessionState::Connected);
    assert_eq!(f.mock.connect_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn online_signal_while_idle_does_not_skip_backoff() {
    let mut f = fixture();
    f.session.connect([poll("p1")]).await;
    f.session.disconnect().await;
    f.session.handle().notify_online();

    f.mock.script_connects(&[ConnectScript::Refuse]);
    f.session.connect([]).await;
    assert_eq!(f.session.state(), SessionState::Reconnecting { attempt: 1 });
    let delay = f.session.last_retry_delay().unwrap();

    let start = Instant::now();
    f.session.step().await;

    assert_eq!(start.elapsed(), delay);
    assert_eq!(f.mock.connect_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn run_stops_on_disconnect() {
    let mut f = fixture();
    f.mock.script_connects(&[ConnectScript::Refuse]);
    f.session.connect([poll("p1")]).await;
    let handle = f.session.handle();

    let (state, ()) = tokio::join!(f.session.run(), async {
        sleep(Duration::from_secs(5)).await;
        handle.disconnect();
    });

    assert_eq!(state, SessionState::Idle);
    assert_eq!(f.mock.connect_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn queue_survives_session_restart() {
    let kv = MemoryStore::new();
    let a = Action::scan("evt_1", "a");
    {
        let mut f = fixture_with(config(), Some("t"), kv.clone());
        f.session.send_action(a.clone()).await;
    }

    let mut f = fixture_with(config(), Some("t"), kv);
    assert_eq!(f.session.queue().len(), 1);
    f.session.connect([]).await;
    assert_eq!(f.mock.actions(), vec![a.id]);
    assert!(f.session.queue().is_empty());
}
