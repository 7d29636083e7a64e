//! Engine Construction Tests
//!
//! Building from raw values, from member records and from TOML
//! configuration. Record failures are collected, not fail-fast.

use assert_matches::assert_matches;
use groupclock_core::{
    ClockError, GroupClock, GroupConfig, KnownMember, MemberConfig, MembershipPolicy,
};
use groupclock_testkit::{member_fixtures, member_location};

#[test]
fn from_members_seeds_values_and_locations() {
    let members = member_fixtures(&[5, 7, 2]);
    let engine = GroupClock::from_members(1, &members).unwrap();

    assert_eq!(engine.values(), vec![5, 7, 2]);
    assert_eq!(engine.local_counter(), 7);
    assert_eq!(
        engine.location(2).map(|url| url.to_string()),
        Some(member_location(2))
    );
}

#[test]
fn from_members_places_by_index() {
    let members = vec![
        MemberConfig::new(2, "tcp://c:1", 30),
        MemberConfig::new(0, "tcp://a:1", 10),
        MemberConfig::new(1, "tcp://b:1", 20),
    ];
    let engine = GroupClock::from_members(0, &members).unwrap();

    assert_eq!(engine.values(), vec![10, 20, 30]);
}

#[test]
fn from_members_collects_every_bad_location() {
    let members = vec![
        MemberConfig::new(0, "tcp://ok:1", 0),
        MemberConfig::new(1, "no scheme here", 0),
        MemberConfig::new(2, "tcp://ok:2", 0),
        MemberConfig::new(3, "::also broken", 0),
    ];

    let err = GroupClock::from_members(0, &members).unwrap_err();
    let errors = match err {
        ClockError::Batch(errors) => errors,
        other => panic!("expected a batch error, got {other:?}"),
    };

    assert_eq!(errors.len(), 2);
    assert_matches!(errors.primary(), ClockError::InvalidLocation { index: 1, .. });
    assert_matches!(
        errors.suppressed(),
        [ClockError::InvalidLocation { index: 3, .. }]
    );
}

#[test]
fn from_members_reports_duplicates_and_gaps() {
    let members = vec![
        MemberConfig::new(0, "tcp://a:1", 0),
        MemberConfig::new(0, "tcp://b:1", 0),
        MemberConfig::new(7, "bad", 0),
    ];

    let err = GroupClock::from_members(0, &members).unwrap_err();
    let errors = match err {
        ClockError::Batch(errors) => errors,
        other => panic!("expected a batch error, got {other:?}"),
    };
    // duplicate 0, bad location of 7, index 7 out of range
    assert_eq!(errors.len(), 3);
    assert!(errors
        .iter()
        .all(|e| matches!(e, ClockError::InvalidConfig { .. } | ClockError::InvalidLocation { .. })));
}

#[test]
fn from_members_rejects_local_index_first() {
    let members = member_fixtures(&[1, 2]);
    assert_matches!(
        GroupClock::from_members(2, &members),
        Err(ClockError::LocalIndexOutOfRange { index: 2, len: 2 })
    );
}

#[test]
fn from_members_accepts_custom_records() {
    struct Peer {
        slot: usize,
        uri: &'static str,
    }

    impl KnownMember for Peer {
        fn index(&self) -> usize {
            self.slot
        }
        fn location(&self) -> &str {
            self.uri
        }
        fn start(&self) -> u64 {
            self.slot as u64 * 100
        }
    }

    let peers = [
        Peer { slot: 0, uri: "quic://10.1.0.1:4433" },
        Peer { slot: 1, uri: "quic://10.1.0.2:4433" },
    ];
    let engine = GroupClock::from_members(1, &peers).unwrap();
    assert_eq!(engine.values(), vec![0, 100]);
}

#[test]
fn from_config_applies_policy() {
    let config = GroupConfig::from_toml_str(
        r#"
local_index = 0
policy = "lenient"

[scatter]
max_members = 64

[[members]]
index = 0
location = "tcp://10.0.0.1:7000"
start = 3

[[members]]
index = 1
location = "tcp://10.0.0.2:7000"
start = 4
"#,
    )
    .unwrap();

    let engine = GroupClock::from_config(&config).unwrap();
    assert_eq!(engine.policy(), MembershipPolicy::Lenient);
    assert_eq!(engine.values(), vec![3, 4]);
    assert_eq!(config.scatter.max_members, 64);
}

#[test]
fn from_config_validates_first() {
    let config = GroupConfig::new(0, Vec::new());
    let err = GroupClock::from_config(&config).unwrap_err();
    assert_matches!(err, ClockError::Batch(_));
}
