//! UI/backend events and error modeling for desktop GUI controller.

use client_core::SessionEvent;
use shared::domain::AccountAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    MintSkill,
    ValidateSkill,
}

pub enum UiEvent {
    Info(String),
    Connected { account: AccountAddress },
    Disconnected,
    /// Confirmed on chain; the originating form can be cleared.
    TransactionConfirmed { kind: TransactionKind, hash: String },
    Session(SessionEvent),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Wallet,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Settings,
    Connect,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("private key")
            || message_lower.contains("wallet")
            || message_lower.contains("signing key")
            || message_lower.contains("not connected")
        {
            UiErrorCategory::Wallet
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("not valid hex")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Errors that send the user back to the connect screen.
    pub fn requires_reconnect(&self) -> bool {
        self.context == UiErrorContext::Connect || self.category == UiErrorCategory::Wallet
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
