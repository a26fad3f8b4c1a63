//! Client core for the skillchain dApp: chain boundary, wallet, snapshot
//! fetching, mutation submission and the session that ties them to a front-end.

pub mod chain;
pub mod error;
pub mod mutations;
pub mod node_client;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod state;
pub mod wallet;

pub use chain::{ChainReader, DisconnectedWallet, Wallet};
pub use error::{ConnectError, FetchError, MutationError, NodeError, SettingsError, WalletError};
pub use mutations::{CreateBountyForm, MintSkillForm};
pub use node_client::NodeClient;
pub use session::{SessionConfig, SessionEvent, SkillchainSession};
pub use settings::{load_settings, ClientSettings};
pub use snapshot::Snapshot;
pub use state::{ActiveTab, AppState, Notice, NoticeVariant, ShellView};
pub use wallet::LocalWallet;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
