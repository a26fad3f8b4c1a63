use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::AccountAddress,
    protocol::{EntryFunctionPayload, PendingTransaction, TransactionOptions},
};
use tokio::{
    sync::{broadcast, RwLock},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::{
    chain::{ChainReader, DisconnectedWallet, Wallet},
    error::{ConnectError, FetchError, MutationError},
    mutations::{
        ensure_not_own_skill, mint_skill_payload, parse_skill_id, submit_and_confirm,
        validate_skill_payload, CreateBountyForm, MintSkillForm, TransactionGuard, MISSING_FIELDS,
        MISSING_SKILL_ID,
    },
    node_client::NodeClient,
    settings::ClientSettings,
    snapshot::{fetch_snapshot, Snapshot},
    state::{ActiveTab, AppState, Notice},
    wallet::LocalWallet,
};

pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(2000);
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data. Make sure the contract is deployed.";
const MINT_FAILED: &str = "Failed to mint skill";
const VALIDATE_FAILED: &str = "Failed to validate skill";
const BOUNTY_UNAVAILABLE: &str = "Bounty creation not implemented in current contract";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub module_address: AccountAddress,
    pub transaction_options: TransactionOptions,
    /// Delay between a confirmed mutation and the follow-up snapshot fetch.
    pub refresh_delay: Duration,
}

impl SessionConfig {
    pub fn new(module_address: AccountAddress) -> Self {
        Self {
            module_address,
            transaction_options: TransactionOptions::default(),
            refresh_delay: DEFAULT_REFRESH_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    SnapshotUpdated(Snapshot),
    LoadingChanged(bool),
    TransactionStateChanged(bool),
    TabChanged(ActiveTab),
    Notice(Notice),
}

/// Owns the front-end state and runs fetches and mutations against the chain.
pub struct SkillchainSession {
    reader: Arc<dyn ChainReader>,
    wallet: Arc<dyn Wallet>,
    config: SessionConfig,
    state: RwLock<AppState>,
    guard: TransactionGuard,
    fetch_generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl SkillchainSession {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        wallet: Arc<dyn Wallet>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let state = AppState {
            account: wallet.account(),
            ..AppState::default()
        };
        Arc::new(Self {
            reader,
            wallet,
            config,
            state: RwLock::new(state),
            guard: TransactionGuard::default(),
            fetch_generation: AtomicU64::new(0),
            events,
        })
    }

    /// Builds a node-backed session; without key material the wallet stays disconnected.
    pub fn connect(settings: &ClientSettings) -> Result<Arc<Self>, ConnectError> {
        let node = NodeClient::new(&settings.node_url)?
            .with_confirmation_timeout(settings.confirmation_timeout());
        let config = settings.session_config()?;

        let wallet: Arc<dyn Wallet> =
            match (settings.account_address()?, settings.resolve_private_key()?) {
                (Some(account), Some(mut key)) => {
                    let wallet = LocalWallet::from_hex_key(node.clone(), account, &key);
                    key.zeroize();
                    info!(account = %account, node = node.base_url(), "wallet connected");
                    Arc::new(wallet?.with_expiration_secs(settings.expiration_secs))
                }
                (None, None) => Arc::new(DisconnectedWallet),
                (_, Some(mut key)) => {
                    key.zeroize();
                    return Err(ConnectError::IncompleteWallet);
                }
                (Some(_), None) => return Err(ConnectError::IncompleteWallet),
            };

        Ok(Self::new(Arc::new(node), wallet, config))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub async fn state(&self) -> AppState {
        let mut state = self.state.read().await.clone();
        state.account = self.wallet.account();
        state.transaction_in_progress = self.guard.is_in_progress();
        state
    }

    pub async fn select_tab(&self, tab: ActiveTab) {
        self.state.write().await.select_tab(tab);
        self.emit(SessionEvent::TabChanged(tab));
    }

    /// Replaces the snapshot wholesale. A fetch overtaken by a newer one is dropped.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let Some(account) = self.wallet.account() else {
            debug!("refresh skipped: no wallet connected");
            return Ok(());
        };

        let generation = self.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_loading(true).await;

        let result = fetch_snapshot(self.reader.as_ref(), self.config.module_address).await;
        if self.fetch_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale snapshot");
            return Ok(());
        }

        match result {
            Ok(snapshot) => {
                {
                    let mut state = self.state.write().await;
                    // A newer fetch may have started while this one waited for the lock.
                    if self.fetch_generation.load(Ordering::SeqCst) != generation {
                        debug!(generation, "discarding stale snapshot");
                        return Ok(());
                    }
                    state.account = Some(account);
                    state.snapshot = snapshot.clone();
                    state.loading = false;
                }
                self.emit(SessionEvent::SnapshotUpdated(snapshot));
                self.emit(SessionEvent::LoadingChanged(false));
                Ok(())
            }
            Err(err) => {
                warn!("error fetching data: {err}");
                self.set_loading(false).await;
                self.emit(SessionEvent::Notice(Notice::destructive(
                    "Error",
                    FETCH_FAILED_MESSAGE,
                )));
                Err(err)
            }
        }
    }

    pub async fn mint_skill(
        self: &Arc<Self>,
        form: &MintSkillForm,
    ) -> Result<PendingTransaction, MutationError> {
        if self.wallet.account().is_none() || !form.is_complete() {
            return Err(self.reject(MutationError::MissingInformation(MISSING_FIELDS), MINT_FAILED));
        }

        let module_address = self.config.module_address;
        let form = form.clone();
        self.run_transaction(
            move || mint_skill_payload(module_address, &form),
            "Skill NFT minted successfully",
            MINT_FAILED,
        )
        .await
    }

    pub async fn validate_skill(
        self: &Arc<Self>,
        raw_skill_id: &str,
    ) -> Result<PendingTransaction, MutationError> {
        let checked = self
            .wallet
            .account()
            .ok_or(MutationError::MissingInformation(MISSING_SKILL_ID))
            .and_then(|account| Ok((account, parse_skill_id(raw_skill_id)?)));
        let (account, skill_id) = match checked {
            Ok(checked) => checked,
            Err(err) => return Err(self.reject(err, VALIDATE_FAILED)),
        };

        let ownership = {
            let state = self.state.read().await;
            ensure_not_own_skill(&state.snapshot, skill_id, account)
        };
        if let Err(err) = ownership {
            return Err(self.reject(err, VALIDATE_FAILED));
        }

        let module_address = self.config.module_address;
        self.run_transaction(
            move || validate_skill_payload(module_address, skill_id),
            "Skill validated successfully",
            VALIDATE_FAILED,
        )
        .await
    }

    /// The deployed contract has no bounty entry points.
    pub async fn create_bounty(&self, form: &CreateBountyForm) -> Result<(), MutationError> {
        debug!(title = %form.title, reward_apt = form.reward_apt, "create bounty requested");
        Err(self.reject(MutationError::Unavailable, BOUNTY_UNAVAILABLE))
    }

    /// Re-fetches after the configured delay.
    pub fn schedule_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        let delay = self.config.refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = session.refresh().await;
        })
    }

    async fn run_transaction<F>(
        self: &Arc<Self>,
        build_payload: F,
        success_message: &str,
        fallback: &str,
    ) -> Result<PendingTransaction, MutationError>
    where
        F: FnOnce() -> EntryFunctionPayload,
    {
        let Some(permit) = self.guard.try_acquire() else {
            debug!("mutation ignored: transaction already in progress");
            return Err(MutationError::InProgress);
        };
        self.emit(SessionEvent::TransactionStateChanged(true));

        let result = submit_and_confirm(
            self.reader.as_ref(),
            self.wallet.as_ref(),
            build_payload(),
            self.config.transaction_options,
        )
        .await;

        drop(permit);
        self.emit(SessionEvent::TransactionStateChanged(false));

        match result {
            Ok(pending) => {
                self.emit(SessionEvent::Notice(Notice::success(success_message)));
                self.schedule_refresh();
                Ok(pending)
            }
            Err(err) => Err(self.reject(err, fallback)),
        }
    }

    async fn set_loading(&self, loading: bool) {
        self.state.write().await.loading = loading;
        self.emit(SessionEvent::LoadingChanged(loading));
    }

    fn reject(&self, err: MutationError, fallback: &str) -> MutationError {
        warn!("mutation rejected: {err}");
        if let Some(notice) = notice_for(&err, fallback) {
            self.emit(SessionEvent::Notice(notice));
        }
        err
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// `None` for errors the user never sees (a refused duplicate click).
pub fn notice_for(err: &MutationError, fallback: &str) -> Option<Notice> {
    let notice = match err {
        MutationError::MissingInformation(message) => {
            Notice::destructive("Missing Information", *message)
        }
        MutationError::InvalidSkillId(_) => {
            Notice::destructive("Missing Information", "Please enter a valid skill ID")
        }
        MutationError::OwnSkill(_) => {
            Notice::destructive("Not Allowed", "You cannot validate your own skills")
        }
        MutationError::Unavailable => Notice::destructive("Not Available", BOUNTY_UNAVAILABLE),
        MutationError::InProgress => return None,
        MutationError::Submission(_) | MutationError::Confirmation(_) => {
            let message = err.to_string();
            let description = if message.trim().is_empty() {
                fallback.to_string()
            } else {
                message
            };
            Notice::destructive("Error", description)
        }
    };
    Some(notice)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
