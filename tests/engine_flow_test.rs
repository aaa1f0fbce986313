//! End-to-end behavior of the streaming engine over in-memory collaborators.

mod common;

use bytes::Bytes;
use chatline::adapters::mock::{MockReply, RepoCall, RepoOp};
use chatline::bus::Topic;
use chatline::engine::Phase;
use chatline::models::{Chat, Role};
use common::*;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_send_on_empty_conversation_emits_expected_sequence() {
    let session = TestSessionBuilder::new()
        .with_reply(MockReply::text(&["Hel", "lo"]))
        .build();

    let outcome = session.engine.send("hello").await.unwrap();
    assert_eq!(outcome.content, "Hello");

    assert_eq!(
        session.journal(),
        vec![
            "save user 'hello'",
            "AddMessage user 'hello'",
            "save assistant ''",
            "AddMessage assistant ''",
            "Set streamingId <id>",
            "UpdateMessage assistant 'Hel'",
            "UpdateMessage assistant 'Hello'",
            "save assistant 'Hello'",
            "Set streamingId ''",
        ]
    );
}

#[tokio::test]
async fn test_first_message_binds_conversation_id_to_all_messages() {
    let session = TestSessionBuilder::new()
        .with_reply(MockReply::text(&["one"]))
        .with_reply(MockReply::text(&["two"]))
        .build();

    session.engine.send("first").await.unwrap();
    let chat_id = session.engine.conversation_id();
    assert!(!chat_id.is_empty());

    session.engine.send("second").await.unwrap();

    let messages = session.store.messages();
    assert_eq!(messages.len(), 4);
    assert!(messages.iter().all(|m| m.chat_id == chat_id));
    assert_eq!(session.repo.store().chat_count(), 1);

    // The very first save carried no chat id, every later one did
    let saves: Vec<_> = session
        .repo
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            RepoCall::Save(m) => Some(m.chat_id),
            _ => None,
        })
        .collect();
    assert_eq!(saves[0], "");
    assert!(saves[1..].iter().all(|id| *id == chat_id));
}

#[tokio::test]
async fn test_conversation_list_changed_fires_once_per_new_conversation() {
    let session = TestSessionBuilder::new()
        .with_reply(MockReply::text(&["a"]))
        .with_reply(MockReply::text(&["b"]))
        .with_reply(MockReply::text(&["c"]))
        .build();
    let published = count_publishes(&session.bus, Topic::ConversationListChanged);

    session.engine.send("one").await.unwrap();
    assert_eq!(published.load(Ordering::SeqCst), 1);

    session.engine.send("two").await.unwrap();
    assert_eq!(published.load(Ordering::SeqCst), 1);

    session.engine.new_chat();
    session.engine.send("three").await.unwrap();
    assert_eq!(published.load(Ordering::SeqCst), 2);
    assert_eq!(session.repo.store().chat_count(), 2);
}

#[tokio::test]
async fn test_streaming_id_always_names_an_assistant_message() {
    let session = TestSessionBuilder::new()
        .with_reply(MockReply::text(&["a", "b", "c"]))
        .with_reply(MockReply::text(&["d"]))
        .build();
    let violations = track_streaming_violations(&session.store);

    session.engine.send("one").await.unwrap();
    session.engine.resend().await.unwrap();

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert!(session.store.streaming_id().is_empty());
}

#[tokio::test]
async fn test_send_while_streaming_is_rejected() {
    let (feeder, reply) = MockReply::fed();
    let session = TestSessionBuilder::new().with_reply(reply).build();
    let engine = &session.engine;

    let first = engine.send("hello");
    let second = async {
        wait_until(|| !session.store.streaming_id().is_empty()).await;
        let rejected = engine.send("again").await;
        let resend = engine.resend().await;
        drop(feeder);
        (rejected, resend)
    };
    let (first, (rejected, resend)) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(rejected.unwrap_err().is_validation());
    assert!(resend.unwrap_err().is_validation());
    assert_eq!(session.repo.count(RepoOp::Save), 3);
}

#[tokio::test]
async fn test_split_multibyte_character_is_decoded_across_chunks() {
    let bytes = "héllo".as_bytes();
    let session = TestSessionBuilder::new()
        .with_reply(MockReply::Chunks(vec![
            Bytes::copy_from_slice(&bytes[..2]),
            Bytes::copy_from_slice(&bytes[2..]),
        ]))
        .build();

    let outcome = session.engine.send("hi").await.unwrap();
    assert_eq!(outcome.content, "héllo");

    let updates: Vec<_> = session
        .journal()
        .into_iter()
        .filter(|l| l.starts_with("UpdateMessage"))
        .collect();
    assert_eq!(
        updates,
        vec!["UpdateMessage assistant 'h'", "UpdateMessage assistant 'héllo'"]
    );
}

#[tokio::test]
async fn test_completion_request_carries_history_and_model() {
    let session = TestSessionBuilder::new()
        .with_model("gpt-4")
        .with_reply(MockReply::text(&["a"]))
        .with_reply(MockReply::text(&["b"]))
        .build();

    session.engine.send("one").await.unwrap();
    session.engine.select_model("gpt-4o");
    session.engine.send("two").await.unwrap();

    let requests = session.provider.requests();
    assert_eq!(requests[0].model, "gpt-4");
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[1].model, "gpt-4o");
    let roles: Vec<_> = requests[1].messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
}

#[tokio::test]
async fn test_open_chat_mid_stream_detaches_old_reply() {
    let (feeder, reply) = MockReply::fed();
    let session = TestSessionBuilder::new().with_reply(reply).build();
    let other = Chat::new("other", "Other chat", chrono::Utc::now());
    let engine = &session.engine;

    let send = engine.send("hello");
    let switch = async {
        feeder.send("Hel");
        wait_until(|| {
            session
                .store
                .messages()
                .last()
                .map_or(false, |m| m.content == "Hel")
        })
        .await;
        engine.open_chat(Some(other.clone()), Vec::new());
        feeder.send("lo");
    };
    let (outcome, ()) = tokio::join!(send, switch);

    let outcome = outcome.unwrap();
    assert!(outcome.cancelled);

    let state = session.store.snapshot();
    assert!(state.message_list.is_empty());
    assert!(state.streaming_id.is_empty());
    assert_eq!(state.selected_chat, Some(other));
    assert_eq!(engine.conversation_id(), "other");
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(session.provider.abort_count(), 1);
}

#[tokio::test]
async fn test_delete_open_chat_cascades_and_starts_new_conversation() {
    let session = TestSessionBuilder::new()
        .with_reply(MockReply::text(&["reply"]))
        .build();
    let published = count_publishes(&session.bus, Topic::ConversationListChanged);

    session.engine.send("hello").await.unwrap();
    let chat_id = session.engine.conversation_id();
    assert_eq!(session.repo.store().messages_of(&chat_id).len(), 2);

    session.engine.delete_chat(&chat_id).await.unwrap();

    assert!(session.repo.store().messages_of(&chat_id).is_empty());
    assert!(session.repo.store().chat(&chat_id).is_none());
    assert!(session.store.messages().is_empty());
    assert!(session.engine.conversation_id().is_empty());
    assert_eq!(published.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_chat_delete_changes_nothing() {
    let session = TestSessionBuilder::new()
        .with_reply(MockReply::text(&["reply"]))
        .build();
    session.engine.send("hello").await.unwrap();
    let chat_id = session.engine.conversation_id();

    session.repo.fail(RepoOp::DeleteChat);
    let err = session.engine.delete_chat(&chat_id).await.unwrap_err();

    assert_eq!(err.category(), chatline::error::ErrorCategory::Persistence);
    assert_eq!(session.store.messages().len(), 2);
    assert_eq!(session.engine.conversation_id(), chat_id);
}

#[tokio::test]
async fn test_engine_can_be_driven_from_spawned_tasks() {
    let (feeder, reply) = MockReply::fed();
    let session = TestSessionBuilder::new().with_reply(reply).build();

    let engine = session.engine.clone();
    let task = tokio::spawn(async move { engine.send("hello").await });

    feeder.send("partial");
    wait_until(|| !session.store.streaming_id().is_empty()).await;
    wait_until(|| {
        session
            .store
            .messages()
            .last()
            .map_or(false, |m| m.content == "partial")
    })
    .await;
    session.engine.stop().unwrap();
    feeder.send(" more");

    let outcome = task.await.unwrap().unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.content, "partial more");
}

#[tokio::test]
async fn test_send_into_opened_chat_reuses_its_id() {
    let existing = Chat::new("c42", "Earlier chat", chrono::Utc::now());
    let session = TestSessionBuilder::new()
        .with_chat(existing.clone())
        .with_reply(MockReply::text(&["welcome back"]))
        .build();
    let published = count_publishes(&session.bus, Topic::ConversationListChanged);

    session.engine.open_chat(Some(existing), Vec::new());
    session.engine.send("hello again").await.unwrap();

    assert_eq!(session.engine.conversation_id(), "c42");
    assert_eq!(session.repo.store().chat_count(), 1);
    assert_eq!(session.repo.store().messages_of("c42").len(), 2);
    assert_eq!(published.load(Ordering::SeqCst), 0);
}
