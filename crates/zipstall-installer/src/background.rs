use std::collections::BTreeSet;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::collaborators::Collaborators;
use crate::locks::DestinationLocks;
use crate::progress::{CancelToken, ChannelSink, ProgressEvent};
use crate::transaction::{run_install, InstallOutcome, InstallRequest};
use crate::uninstall::{run_uninstall, UninstallOutcome, UninstallPlan};
use crate::EngineError;

/// One running install or uninstall: drain `events` while it works, then
/// `join` for the result.
pub struct BackgroundHandle<T> {
    pub events: Receiver<ProgressEvent>,
    handle: JoinHandle<T>,
}

impl<T> BackgroundHandle<T> {
    pub fn join(self) -> T {
        match self.handle.join() {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

pub fn spawn_install(
    request: InstallRequest,
    locks: DestinationLocks,
    collaborators: Arc<Collaborators>,
    cancel: CancelToken,
) -> BackgroundHandle<Result<InstallOutcome, EngineError>> {
    let (sink, events) = ChannelSink::new();
    let handle = thread::spawn(move || {
        run_install(request, &locks, &collaborators, &sink, &cancel)
    });
    BackgroundHandle { events, handle }
}

pub fn spawn_uninstall(
    plan: UninstallPlan,
    approved_drift: BTreeSet<String>,
    locks: DestinationLocks,
    collaborators: Arc<Collaborators>,
) -> BackgroundHandle<Result<UninstallOutcome, EngineError>> {
    let (sink, events) = ChannelSink::new();
    let handle = thread::spawn(move || {
        run_uninstall(&plan, &approved_drift, &locks, &collaborators, &sink)
    });
    BackgroundHandle { events, handle }
}
