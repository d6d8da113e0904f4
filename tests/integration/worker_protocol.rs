//! The monitor side of the worker protocol, read back from the worker side.

use pagewatch::tui::TuiState;
use pagewatch::worker::{
    decode_inbound, Inbound, Message, MessageReader, PendingPolicy, WorkerLink, WorkerState,
};
use tokio::io::{duplex, DuplexStream};

async fn read_message(reader: &mut MessageReader<DuplexStream>) -> Message {
    let line = reader
        .next_line()
        .await
        .unwrap()
        .expect("stream ended early");
    serde_json::from_str(&line).unwrap()
}

fn labels() -> Vec<String> {
    vec!["/a".to_string(), "/b".to_string()]
}

#[tokio::test]
async fn test_config_precedes_buffered_counts() {
    let (monitor_end, worker_end) = duplex(4096);
    let policy = PendingPolicy::Buffer { capacity: 8 };
    let mut link = WorkerLink::connected(monitor_end, labels(), policy);
    let mut reader = MessageReader::new(worker_end);

    link.forward(1, "/a".to_string()).await.unwrap();
    link.forward(2, "/b".to_string()).await.unwrap();
    assert_eq!(link.pending_len(), 2);

    link.handle(decode_inbound(r#"{"type":"childReady"}"#).unwrap())
        .await
        .unwrap();
    assert_eq!(link.state(), WorkerState::Ready);

    assert_eq!(
        read_message(&mut reader).await,
        Message::Config {
            config_array: vec!["/a".into(), "/b".into(), " ".into(), "Quit".into()],
        }
    );
    assert_eq!(
        read_message(&mut reader).await,
        Message::DataFromParent {
            count: 1,
            dir: "/a".into()
        }
    );
    assert_eq!(
        read_message(&mut reader).await,
        Message::DataFromParent {
            count: 2,
            dir: "/b".into()
        }
    );

    link.forward(4, "/a".to_string()).await.unwrap();
    assert_eq!(
        read_message(&mut reader).await,
        Message::DataFromParent {
            count: 4,
            dir: "/a".into()
        }
    );
}

#[tokio::test]
async fn test_drop_policy_discards_early_counts() {
    let (monitor_end, worker_end) = duplex(4096);
    let mut link = WorkerLink::connected(monitor_end, labels(), PendingPolicy::Drop);
    let mut reader = MessageReader::new(worker_end);

    link.forward(3, "/a".to_string()).await.unwrap();
    assert_eq!(link.dropped(), 1);

    link.handle(Inbound::ChildReady).await.unwrap();
    link.forward(5, "/b".to_string()).await.unwrap();

    assert!(matches!(read_message(&mut reader).await, Message::Config { .. }));
    assert_eq!(
        read_message(&mut reader).await,
        Message::DataFromParent {
            count: 5,
            dir: "/b".into()
        }
    );
}

#[tokio::test]
async fn test_repeated_ready_sends_config_once() {
    let (monitor_end, worker_end) = duplex(4096);
    let mut link = WorkerLink::connected(monitor_end, labels(), PendingPolicy::default());
    let mut reader = MessageReader::new(worker_end);

    link.handle(Inbound::ChildReady).await.unwrap();
    link.handle(Inbound::ChildReady).await.unwrap();
    link.forward(7, "/a".to_string()).await.unwrap();

    assert!(matches!(read_message(&mut reader).await, Message::Config { .. }));
    assert!(matches!(
        read_message(&mut reader).await,
        Message::DataFromParent { count: 7, .. }
    ));
}

#[tokio::test]
async fn test_worker_state_follows_wire_messages() {
    let (monitor_end, worker_end) = duplex(4096);
    let mut link = WorkerLink::connected(monitor_end, labels(), PendingPolicy::default());
    let mut reader = MessageReader::new(worker_end);
    let mut state = TuiState::new();

    link.handle(Inbound::ChildReady).await.unwrap();
    link.forward(4, "/a".to_string()).await.unwrap();
    link.forward(2, "/b".to_string()).await.unwrap();

    for _ in 0..3 {
        state.apply(read_message(&mut reader).await);
    }

    assert!(state.is_configured());
    assert_eq!(state.menu().len(), 4);
    assert_eq!(state.count_for("/a"), Some(4));
    assert_eq!(state.count_for("/b"), Some(2));
    assert_eq!(state.total(), 6);
    assert_eq!(state.last_dir(), Some("/b"));
}

#[tokio::test]
async fn test_closed_worker_pipe_closes_link() {
    let (monitor_end, worker_end) = duplex(64);
    let mut link = WorkerLink::connected(monitor_end, labels(), PendingPolicy::default());
    drop(worker_end);

    assert!(link.handle(Inbound::ChildReady).await.is_err());
    assert_eq!(link.state(), WorkerState::Closed);

    // Nothing is delivered or buffered once closed
    link.forward(1, "/a".to_string()).await.unwrap();
    assert_eq!(link.pending_len(), 0);
}
