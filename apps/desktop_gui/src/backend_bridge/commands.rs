//! Backend commands queued from UI to backend worker.

use client_core::{ActiveTab, ClientSettings, CreateBountyForm, MintSkillForm};

pub enum BackendCommand {
    /// Builds a session from the connect screen's settings and fetches once.
    Connect {
        settings: ClientSettings,
    },
    Disconnect,
    Refresh,
    SelectTab {
        tab: ActiveTab,
    },
    MintSkill {
        form: MintSkillForm,
    },
    ValidateSkill {
        skill_id: String,
    },
    CreateBounty {
        form: CreateBountyForm,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Connect { .. } => "connect",
            BackendCommand::Disconnect => "disconnect",
            BackendCommand::Refresh => "refresh",
            BackendCommand::SelectTab { .. } => "select_tab",
            BackendCommand::MintSkill { .. } => "mint_skill",
            BackendCommand::ValidateSkill { .. } => "validate_skill",
            BackendCommand::CreateBounty { .. } => "create_bounty",
        }
    }
}
