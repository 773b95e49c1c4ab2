// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    poll_room = { "poll-room:p1", ChannelKind::PollRoom, "p1" },
    event_room = { "event-room:evt_1", ChannelKind::EventRoom, "evt_1" },
    other_kind = { "staff-room:door-3", ChannelKind::Other("staff-room".into()), "door-3" },
    colon_in_id = { "poll-room:a:b", ChannelKind::PollRoom, "a:b" },
)]
fn parse_valid(input: &str, kind: ChannelKind, id: &str) {
    let channel: Channel = input.parse().unwrap();
    assert_eq!(channel.kind(), &kind);
    assert_eq!(channel.id(), id);
    assert_eq!(channel.to_string(), input);
}

#[parameterized(
    no_colon = { "poll-room" },
    empty_kind = { ":p1" },
    empty_id = { "poll-room:" },
    uppercase_kind = { "Poll-Room:p1" },
    whitespace_id = { "poll-room:p 1" },
    leading_dash = { "-room:p1" },
)]
fn parse_invalid(input: &str) {
    let err = input.parse::<Channel>().unwrap_err();
    assert!(matches!(err, Error::InvalidChannel(ref s) if s == input));
}

#[test]
fn constructors_match_parsed() {
    assert_eq!(
        Channel::poll_room("p1").unwrap(),
        "poll-room:p1".parse().unwrap()
    );
    assert_eq!(
        Channel::event_room("evt_1").unwrap(),
        "event-room:evt_1".parse().unwrap()
    );
    assert!(Channel::poll_room("").is_err());
}

#[test]
fn serializes_as_plain_string() {
    let channel = Channel::poll_room("p1").unwrap();
    let json = serde_json::to_string(&channel).unwrap();
    assert_eq!(json, "\"poll-room:p1\"");

    let back: Channel = serde_json::from_str(&json).unwrap();
    assert_eq!(back, channel);
}

#[test]
fn deserialize_rejects_invalid() {
    assert!(serde_json::from_str::<Channel>("\"nope\"").is_err());
}

#[test]
fn ordering_groups_by_kind() {
    let mut channels = [
        Channel::poll_room("b").unwrap(),
        Channel::event_room("z").unwrap(),
        Channel::poll_room("a").unwrap(),
    ];
    channels.sort();
    let rendered: Vec<String> = channels.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, ["event-room:z", "poll-room:a", "poll-room:b"]);
}
