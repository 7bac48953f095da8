pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use self::config::CliConfig;

pub use self::config::{cli::LocalStorage, toml_config::EditorConfig};
pub use self::core::{
    names::NameMapping,
    session::{EditorSession, Outcome, SessionEvent, SessionSnapshot},
    store::DocumentStore,
    template::{Autofill, DeviceTemplate},
    tracker::{ChangeEntry, ChangeKind, ChangeLog, ChangeTracker},
};
pub use utils::error::{EditorError, Result};
