//! End-to-end tests for the chat relay over real TCP connections.

mod common;

use common::{TestClient, TestServer};

#[tokio::test]
async fn test_join_and_chat() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut alice = TestClient::join(server.addr, "alice", "lobby").await;
    let mut bob = TestClient::join(server.addr, "bob", "lobby").await;

    alice.expect_line("Users: alice, bob").await;
    alice.expect_line("bob has joined the room.").await;

    alice.send_line("hi").await;
    alice.expect_line("alice: hi").await;
    bob.expect_line("alice: hi").await;
}

#[tokio::test]
async fn test_join_sequence_order() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut alice = TestClient::connect(server.addr).await;
    alice.send_line("alice").await;
    alice.send_line("lobby").await;

    assert_eq!(alice.read_line().await.as_deref(), Some("Rooms: lobby"));
    assert_eq!(alice.read_line().await.as_deref(), Some("Users: alice"));
    assert_eq!(
        alice.read_line().await.as_deref(),
        Some("alice has joined the room.")
    );
}

#[tokio::test]
async fn test_chat_stays_in_room() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut alice = TestClient::join(server.addr, "alice", "lobby").await;
    let mut carol = TestClient::join(server.addr, "carol", "hall").await;

    // Rooms roster reaches every room
    alice.expect_line("Rooms: hall, lobby").await;

    alice.send_line("lobby only").await;
    alice.expect_line("alice: lobby only").await;

    carol.send_line("marker").await;
    let skipped = carol.expect_line("carol: marker").await;
    assert!(!skipped.iter().any(|l| l.contains("lobby only")));
}

#[tokio::test]
async fn test_departure_and_room_removal() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let alice = TestClient::join(server.addr, "alice", "lobby").await;
    let mut bob = TestClient::join(server.addr, "bob", "lobby").await;
    let mut carol = TestClient::join(server.addr, "carol", "hall").await;
    bob.expect_line("Rooms: hall, lobby").await;

    alice.close();

    let skipped = bob.expect_line("alice has left the room.").await;
    assert_eq!(skipped, vec!["Rooms: hall, lobby", "Users: bob"]);
    assert!(server.registry.contains_room("lobby").await);

    bob.close();

    let skipped = carol.expect_line("Rooms: hall").await;
    assert!(!skipped.iter().any(|l| l.contains("has left")));
    server.wait_for_members(1).await;
    assert_eq!(server.registry.room_names().await, vec!["hall"]);
}

#[tokio::test]
async fn test_duplicate_names_are_distinct_members() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut first = TestClient::join(server.addr, "alice", "lobby").await;
    let mut second = TestClient::join(server.addr, "alice", "lobby").await;
    first.expect_line("Users: alice, alice").await;

    first.close();

    second.expect_line("Users: alice").await;
    second.expect_line("alice has left the room.").await;
    server.wait_for_members(1).await;
}

#[tokio::test]
async fn test_file_upload() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut alice = TestClient::join(server.addr, "alice", "lobby").await;
    let mut bob = TestClient::join(server.addr, "bob", "lobby").await;

    let data: Vec<u8> = (0..1025u32).map(|i| (i % 256) as u8).collect();
    alice.send_line("FILE:data.bin").await;
    alice.send_line("1025").await;
    alice.send_raw(&data).await;
    alice.send_line("after upload").await;

    bob.expect_line("alice is sharing a file: data.bin").await;
    bob.expect_line("File upload complete: data.bin").await;
    bob.expect_line("alice: after upload").await;
    alice.expect_line("File upload complete: data.bin").await;

    let written = std::fs::read(dir.path().join("data.bin")).unwrap();
    assert_eq!(written, data);
}

#[tokio::test]
async fn test_empty_file_upload() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut alice = TestClient::join(server.addr, "alice", "lobby").await;
    alice.send_line("FILE:empty.txt").await;
    alice.send_line("0").await;

    alice.expect_line("File upload complete: empty.txt").await;
    let written = std::fs::read(dir.path().join("empty.txt")).unwrap();
    assert!(written.is_empty());
}

#[tokio::test]
async fn test_malformed_file_size_keeps_session() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut alice = TestClient::join(server.addr, "alice", "lobby").await;
    alice.send_line("FILE:bad.txt").await;
    alice.send_line("abc").await;
    alice.send_line("still here").await;

    let skipped = alice.expect_line("alice: still here").await;
    assert_eq!(skipped, vec!["alice is sharing a file: bad.txt"]);
    assert!(!dir.path().join("bad.txt").exists());
    assert_eq!(server.registry.member_count().await, 1);
}

#[tokio::test]
async fn test_disconnect_before_registration() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut early = TestClient::connect(server.addr).await;
    early.send_line("ghost").await;
    early.close();

    let mut alice = TestClient::join(server.addr, "alice", "lobby").await;
    alice.send_line("ping").await;
    alice.expect_line("alice: ping").await;

    assert_eq!(server.registry.member_names("lobby").await, vec!["alice"]);
    assert_eq!(server.registry.room_count().await, 1);
}

#[tokio::test]
async fn test_truncated_upload_ends_session() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;

    let mut alice = TestClient::join(server.addr, "alice", "lobby").await;
    let mut bob = TestClient::join(server.addr, "bob", "lobby").await;
    alice.expect_line("bob has joined the room.").await;

    // Nothing may be left unread on alice's socket when it closes
    alice.send_line("FILE:short.bin").await;
    alice.expect_line("alice is sharing a file: short.bin").await;
    alice.send_line("100").await;
    alice.send_raw(b"partial").await;
    alice.close();

    bob.expect_line("File upload complete: short.bin").await;
    bob.expect_line("alice has left the room.").await;

    let written = std::fs::read(dir.path().join("short.bin")).unwrap();
    assert_eq!(written, b"partial");
}
