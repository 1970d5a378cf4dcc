// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{Duration, Utc};
use wagent_core::{
    ConnectionState, DedupOutcome, InboundDedupRecord, OutboundRecord, PermissionEntry,
    PermissionScope, PluginAdapter, Store,
};
use wagent_storage::queries::permissions::ListKind;
use wagent_storage::{Database, SqliteStore};

async fn store_with_agent() -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.create_agent("agent-1", "Support", "asst_1").await.unwrap();
    store
}

fn dedup(id: &str, ts: i64) -> InboundDedupRecord {
    InboundDedupRecord {
        agent_id: "agent-1".into(),
        chat_id: "chat-1".into(),
        unique_message_id: id.into(),
        timestamp_ms: ts,
    }
}

#[tokio::test]
async fn duplicate_delivery_is_reported_once() {
    let store = store_with_agent().await;
    assert_eq!(
        store.record_inbound(&dedup("m1", 100)).await.unwrap(),
        DedupOutcome::Inserted
    );
    assert_eq!(
        store.record_inbound(&dedup("m1", 100)).await.unwrap(),
        DedupOutcome::Duplicate
    );

    let mut other_chat = dedup("m1", 100);
    other_chat.chat_id = "chat-2".into();
    assert_eq!(
        store.record_inbound(&other_chat).await.unwrap(),
        DedupOutcome::Inserted
    );
}

#[tokio::test]
async fn agent_state_and_phone_round_trip() {
    let store = store_with_agent().await;
    let at = Utc::now();
    store
        .update_agent_state("agent-1", ConnectionState::Connected, at)
        .await
        .unwrap();
    store.set_agent_phone("agent-1", "15551234").await.unwrap();

    let agent = store.get_agent("agent-1").await.unwrap().unwrap();
    assert_eq!(agent.state, ConnectionState::Connected);
    assert_eq!(agent.phone_number.as_deref(), Some("15551234"));
    let stored = agent.last_state_change_at.unwrap();
    assert!((stored - at).abs() < Duration::milliseconds(5));

    // Unknown agents are not an error.
    store
        .update_agent_state("ghost", ConnectionState::Disconnected, at)
        .await
        .unwrap();
    assert!(store.get_agent("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn permission_lists_stay_disjoint() {
    let store = store_with_agent().await;
    let alice = PermissionEntry::new(PermissionScope::Contact, "1555");
    store.allow("agent-1", &alice).await.unwrap();
    store
        .allow("agent-1", &PermissionEntry::new(PermissionScope::All, "*"))
        .await
        .unwrap();
    store.deny("agent-1", &alice).await.unwrap();

    let lists = store.permission_lists("agent-1").await.unwrap().unwrap();
    assert_eq!(lists.whitelist.len(), 1);
    assert_eq!(lists.whitelist[0].scope, PermissionScope::All);
    assert_eq!(lists.blacklist, vec![alice]);

    assert!(store.permission_lists("ghost").await.unwrap().is_none());
    assert!(
        store
            .remove_permission("agent-1", ListKind::Blacklist, "1555")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn thread_mapping_upserts() {
    let store = store_with_agent().await;
    assert!(store.find_thread("agent-1", "chat-1").await.unwrap().is_none());
    store.upsert_thread("agent-1", "chat-1", "thread_a").await.unwrap();
    store.upsert_thread("agent-1", "chat-1", "thread_b").await.unwrap();
    assert_eq!(
        store.find_thread("agent-1", "chat-1").await.unwrap().as_deref(),
        Some("thread_b")
    );
}

#[tokio::test]
async fn outbound_history_is_ordered() {
    let store = store_with_agent().await;
    let base = Utc::now();
    for (i, text) in ["first", "second"].iter().enumerate() {
        store
            .insert_outbound(&OutboundRecord {
                agent_id: "agent-1".into(),
                chat_id: "chat-1".into(),
                thread_id: "thread_a".into(),
                sender: "1555@c.us".into(),
                message: text.to_string(),
                created_at: base + Duration::seconds(i as i64),
            })
            .await
            .unwrap();
    }
    let history = store.conversation_history("agent-1", "chat-1").await.unwrap();
    let texts: Vec<_> = history.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(texts, ["first", "second"]);
}

#[tokio::test]
async fn api_keys_are_keyed_by_name() {
    let store = store_with_agent().await;
    store.set_api_key("agent-1", "OPENAIAPIKEY", "aa:bb").await.unwrap();
    store.set_api_key("agent-1", "OPENAIAPIKEY", "cc:dd").await.unwrap();
    assert_eq!(
        store.api_key("agent-1", "OPENAIAPIKEY").await.unwrap().as_deref(),
        Some("cc:dd")
    );
    assert!(store.api_key("agent-1", "OTHER").await.unwrap().is_none());
}

#[tokio::test]
async fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/wagent.db");
    {
        let store = SqliteStore::new(Database::open(&path, true).await.unwrap());
        store.create_agent("agent-1", "Support", "asst_1").await.unwrap();
        store.upsert_thread("agent-1", "chat-1", "thread_a").await.unwrap();
        assert!(matches!(
            store.health_check().await.unwrap(),
            wagent_core::HealthStatus::Healthy
        ));
    }
    let db = Database::open(&path, true).await.unwrap();
    let store = SqliteStore::new(db);
    assert_eq!(store.list_agents().await.unwrap().len(), 1);
    assert_eq!(
        store.find_thread("agent-1", "chat-1").await.unwrap().as_deref(),
        Some("thread_a")
    );
}
