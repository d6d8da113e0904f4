//! Terminal worker process: protocol, handshake and supervision.

pub mod link;
pub mod protocol;
pub mod supervisor;

pub use link::{PendingPolicy, WorkerLink, WorkerState, DEFAULT_PENDING_CAPACITY};
pub use protocol::{
    decode_inbound, menu_entries, Inbound, Message, MessageReader, MessageWriter, SOCKET_ENV,
};
pub use supervisor::{resolve_worker, WorkerEvent, WorkerLaunch, WorkerSupervisor, WORKER_BINARY};
