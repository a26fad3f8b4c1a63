//! Front-end state: connection, selected tab, last snapshot and busy flags.

use shared::domain::AccountAddress;

use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActiveTab {
    #[default]
    Skills,
    Bounties,
    Validate,
}

impl ActiveTab {
    pub const ALL: [ActiveTab; 3] = [ActiveTab::Skills, ActiveTab::Bounties, ActiveTab::Validate];

    pub fn label(self) -> &'static str {
        match self {
            ActiveTab::Skills => "Skills",
            ActiveTab::Bounties => "Bounties",
            ActiveTab::Validate => "Validate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellView {
    Connect,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            title: "Success!".to_string(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub account: Option<AccountAddress>,
    pub active_tab: ActiveTab,
    pub snapshot: Snapshot,
    pub loading: bool,
    pub transaction_in_progress: bool,
}

impl AppState {
    pub fn shell_view(&self) -> ShellView {
        if self.account.is_some() {
            ShellView::Main
        } else {
            ShellView::Connect
        }
    }

    pub fn select_tab(&mut self, tab: ActiveTab) {
        self.active_tab = tab;
    }
}
