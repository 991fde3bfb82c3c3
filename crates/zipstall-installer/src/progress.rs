use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Install,
    Uninstall,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
        }
    }
}

/// One operation emits an ordered, finite sequence of these to a single
/// subscriber, ending with `Finished` on success (error paths end the
/// stream by dropping the sender).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started {
        operation: OperationKind,
        destination: PathBuf,
    },
    Extracting {
        index: usize,
        total: usize,
        path: String,
    },
    RemovingObsolete {
        path: String,
    },
    WritingManifest,
    ApplyingShortcuts,
    ApplyingRegistration,
    DeletingFile {
        index: usize,
        total: usize,
        path: String,
    },
    PruningDirectories,
    RemovingIntegrations,
    SchedulingSelfDelete,
    Warning {
        detail: String,
    },
    Finished,
}

pub trait ProgressSink: Send {
    fn emit(&self, event: ProgressEvent);
}

pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Sink backed by an mpsc channel; the subscriber side simply drains the
/// receiver. A vanished subscriber never fails the operation.
pub struct ChannelSink {
    sender: Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

/// Cooperative cancellation flag. Checked before each file copy begins; a
/// file already being copied is never truncated.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
