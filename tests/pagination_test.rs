//! Conversation list loading under concurrent triggers.

mod common;

use chatline::adapters::mock::{MockReply, RecordingRepository, RepoCall, RepoOp};
use chatline::adapters::InMemoryChatRepository;
use chatline::bus::{EventBus, Topic};
use chatline::models::Chat;
use chatline::pagination::{ChatListLoader, DateBucket};
use chrono::{Duration, Utc};
use common::*;
use serde_json::json;
use std::sync::Arc;

fn seeded(count: usize, page_size: usize) -> RecordingRepository {
    let backing = InMemoryChatRepository::with_page_size(page_size);
    let now = Utc::now();
    for i in 0..count {
        backing.insert_chat(Chat::new(
            format!("c{}", i),
            format!("chat {}", i),
            now - Duration::minutes(i as i64),
        ));
    }
    RecordingRepository::wrap(backing)
}

fn ids(chats: &[Chat]) -> Vec<String> {
    chats.iter().map(|c| c.id.clone()).collect()
}

#[tokio::test]
async fn test_overlapping_triggers_issue_one_request() {
    let repo = seeded(4, 2);
    let loader = ChatListLoader::new(Arc::new(repo.clone()));
    repo.hold_list_chats();

    let first = loader.load_next();
    let second = async {
        wait_until(|| loader.is_loading()).await;
        let sentinel = loader.on_sentinel_visible(true).await;
        let direct = loader.load_next().await;
        repo.release_list_chats();
        (sentinel, direct)
    };
    let (first, (sentinel, direct)) = tokio::join!(first, second);

    assert!(first.unwrap());
    assert!(!sentinel.unwrap());
    assert!(!direct.unwrap());
    assert_eq!(repo.count(RepoOp::ListChats), 1);
    assert_eq!(ids(&loader.chats()), vec!["c0", "c1"]);
    assert_eq!(loader.page(), 2);
}

#[tokio::test]
async fn test_reset_during_fetch_discards_stale_page() {
    let repo = seeded(4, 2);
    let loader = ChatListLoader::new(Arc::new(repo.clone()));
    loader.load_next().await.unwrap();
    assert!(loader.has_more());

    repo.hold_list_chats();
    let page_two = loader.load_next();
    let interrupt = async {
        wait_until(|| loader.is_loading()).await;
        let started = loader.reset().await;
        repo.release_list_chats();
        started
    };
    let (page_two, started) = tokio::join!(page_two, interrupt);

    assert!(page_two.unwrap());
    // The reset could not start its own fetch while one was in flight
    assert!(!started.unwrap());

    assert_eq!(ids(&loader.chats()), vec!["c0", "c1"]);
    assert_eq!(loader.page(), 2);
    assert_eq!(
        repo.calls(),
        vec![
            RepoCall::ListChats(1),
            RepoCall::ListChats(2),
            RepoCall::ListChats(1),
        ]
    );
}

#[tokio::test]
async fn test_sentinel_walks_to_the_last_page() {
    let repo = seeded(5, 2);
    let loader = ChatListLoader::new(Arc::new(repo.clone()));

    // Nothing is known to exist before the first explicit load
    assert!(!loader.on_sentinel_visible(true).await.unwrap());

    loader.load_next().await.unwrap();
    while loader.on_sentinel_visible(true).await.unwrap() {}

    assert_eq!(loader.chats().len(), 5);
    assert!(!loader.has_more());
    assert_eq!(repo.count(RepoOp::ListChats), 3);

    // A hidden sentinel never fetches
    assert!(!loader.on_sentinel_visible(false).await.unwrap());
    assert_eq!(repo.count(RepoOp::ListChats), 3);
}

#[tokio::test]
async fn test_failed_page_keeps_cursor() {
    let repo = seeded(4, 2);
    let loader = ChatListLoader::new(Arc::new(repo.clone()));
    loader.load_next().await.unwrap();

    repo.fail(RepoOp::ListChats);
    assert!(loader.load_next().await.is_err());
    assert_eq!(loader.page(), 2);
    assert!(!loader.is_loading());
    assert_eq!(loader.chats().len(), 2);

    repo.succeed(RepoOp::ListChats);
    assert!(loader.load_next().await.unwrap());
    assert_eq!(loader.chats().len(), 4);
}

#[tokio::test]
async fn test_list_change_notification_reloads_first_page() {
    let repo = seeded(3, 2);
    let loader = ChatListLoader::new(Arc::new(repo.clone()));
    let bus = EventBus::new();
    loader.attach(&bus);

    loader.load_next().await.unwrap();
    loader.load_next().await.unwrap();
    assert_eq!(loader.chats().len(), 3);

    repo.store()
        .insert_chat(Chat::new("fresh", "fresh chat", Utc::now() + Duration::minutes(1)));
    bus.publish(
        Topic::ConversationListChanged,
        Some(&json!({ "chatId": "fresh" })),
    );

    wait_until(|| loader.chats().first().map_or(false, |c| c.id == "fresh")).await;
    assert_eq!(ids(&loader.chats()), vec!["fresh", "c0"]);
    assert_eq!(loader.page(), 2);
}

#[tokio::test]
async fn test_new_conversation_appears_in_attached_list() {
    let session = TestSessionBuilder::new()
        .with_reply(MockReply::text(&["hi"]))
        .build();
    let loader = ChatListLoader::new(Arc::new(session.repo.clone()));
    loader.attach(&session.bus);
    loader.load_next().await.unwrap();
    assert!(loader.chats().is_empty());

    session.engine.send("hello").await.unwrap();

    let chat_id = session.engine.conversation_id();
    wait_until(|| loader.chats().len() == 1).await;
    assert_eq!(loader.chats()[0].id, chat_id);

    let groups = loader.grouped(Utc::now());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].bucket, DateBucket::Today);
}

#[tokio::test]
async fn test_new_conversation_leads_refreshed_first_page() {
    let now = Utc::now();
    let mut builder = TestSessionBuilder::new()
        .with_page_size(2)
        .with_reply(MockReply::text(&["hi"]));
    for i in 0..3 {
        builder = builder.with_chat(Chat::new(
            format!("old{}", i),
            format!("old chat {}", i),
            now - Duration::days(i + 1),
        ));
    }
    let session = builder.build();
    let loader = ChatListLoader::new(Arc::new(session.repo.clone()));
    loader.attach(&session.bus);
    loader.load_next().await.unwrap();
    loader.load_next().await.unwrap();
    assert_eq!(loader.chats().len(), 3);

    session.engine.send("hello").await.unwrap();
    let chat_id = session.engine.conversation_id();

    wait_until(|| loader.chats().first().map_or(false, |c| c.id == chat_id)).await;
    assert_eq!(ids(&loader.chats()), vec![chat_id.as_str(), "old0"]);
    assert!(loader.has_more());
}
