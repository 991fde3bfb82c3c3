mod background;
mod collaborators;
mod error;
mod fs_utils;
mod layout;
mod locks;
mod manifest_store;
mod native;
mod progress;
mod source;
mod transaction;
mod uninstall;

pub use background::{spawn_install, spawn_uninstall, BackgroundHandle};
pub use collaborators::{
    Collaborators, MetadataReader, NoMetadataReader, NullRegistrar, NullSelfDeleteScheduler,
    NullShortcutManager, RegistrationDescriptor, SelfDeleteRequest, SelfDeleteScheduler,
    ShortcutDescriptor, ShortcutKind, ShortcutManager, SystemRegistrar,
};
pub use error::{EngineError, EngineWarning};
pub use fs_utils::{directory_size, sha256_file};
pub use layout::{default_install_root, uninstaller_file_name, DestinationLayout};
pub use locks::{DestinationLockGuard, DestinationLocks};
pub use manifest_store::{load_manifest, remove_manifest, save_manifest};
pub use native::{
    CommandRegistrar, ScriptSelfDeleteScheduler, SystemMetadataReader, SystemShortcutManager,
};
pub use progress::{
    CancelToken, ChannelSink, NullSink, OperationKind, ProgressEvent, ProgressSink,
};
pub use source::{ArchiveSource, ZipArchiveSource};
pub use transaction::{
    classify_destination, run_install, InstallOptions, InstallOutcome, InstallRequest,
};
pub use uninstall::{
    plan_uninstall, run_uninstall, DriftEntry, DriftKind, UninstallCompletion, UninstallOutcome,
    UninstallPlan,
};
