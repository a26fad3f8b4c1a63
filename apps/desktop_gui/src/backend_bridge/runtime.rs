//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{SessionEvent, SkillchainSession};
use crossbeam_channel::{Receiver, Sender};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{TransactionKind, UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut worker = BackendWorker::new(ui_tx.clone());
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            // `recv` blocks this runtime thread; mutations run on spawned tasks.
            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend command received");
                worker.handle(cmd);
            }
            worker.disconnect();
            tracing::info!("backend command channel closed; worker exiting");
        });
    });
}

struct BackendWorker {
    ui_tx: Sender<UiEvent>,
    session: Option<Arc<SkillchainSession>>,
    event_task: Option<JoinHandle<()>>,
}

impl BackendWorker {
    fn new(ui_tx: Sender<UiEvent>) -> Self {
        Self {
            ui_tx,
            session: None,
            event_task: None,
        }
    }

    fn handle(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::Connect { settings } => {
                self.disconnect();
                let session = match SkillchainSession::connect(&settings) {
                    Ok(session) => session,
                    Err(err) => {
                        self.send_error(UiErrorContext::Connect, err.to_string());
                        return;
                    }
                };

                let ui_tx = self.ui_tx.clone();
                let events = session.subscribe_events();
                self.event_task = Some(tokio::spawn(forward_session_events(events, ui_tx)));

                let connected = Arc::clone(&session);
                let ui_tx = self.ui_tx.clone();
                tokio::spawn(async move {
                    let Some(account) = connected.state().await.account else {
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                            UiErrorContext::Connect,
                            "wallet missing: enter an account address and private key",
                        )));
                        return;
                    };
                    let _ = ui_tx.try_send(UiEvent::Connected { account });
                    // Failures surface as a session notice.
                    let _ = connected.refresh().await;
                });
                self.session = Some(session);
            }
            BackendCommand::Disconnect => {
                self.disconnect();
                let _ = self.ui_tx.try_send(UiEvent::Disconnected);
            }
            BackendCommand::Refresh => {
                if let Some(session) = self.session_or_report() {
                    tokio::spawn(async move {
                        let _ = session.refresh().await;
                    });
                }
            }
            BackendCommand::SelectTab { tab } => {
                if let Some(session) = self.session.clone() {
                    tokio::spawn(async move { session.select_tab(tab).await });
                }
            }
            BackendCommand::MintSkill { form } => {
                if let Some(session) = self.session_or_report() {
                    let ui_tx = self.ui_tx.clone();
                    tokio::spawn(async move {
                        if let Ok(pending) = session.mint_skill(&form).await {
                            let _ = ui_tx.try_send(UiEvent::TransactionConfirmed {
                                kind: TransactionKind::MintSkill,
                                hash: pending.hash,
                            });
                        }
                    });
                }
            }
            BackendCommand::ValidateSkill { skill_id } => {
                if let Some(session) = self.session_or_report() {
                    let ui_tx = self.ui_tx.clone();
                    tokio::spawn(async move {
                        if let Ok(pending) = session.validate_skill(&skill_id).await {
                            let _ = ui_tx.try_send(UiEvent::TransactionConfirmed {
                                kind: TransactionKind::ValidateSkill,
                                hash: pending.hash,
                            });
                        }
                    });
                }
            }
            BackendCommand::CreateBounty { form } => {
                if let Some(session) = self.session_or_report() {
                    tokio::spawn(async move {
                        let _ = session.create_bounty(&form).await;
                    });
                }
            }
        }
    }

    fn session_or_report(&self) -> Option<Arc<SkillchainSession>> {
        if self.session.is_none() {
            self.send_error(UiErrorContext::General, "wallet not connected");
        }
        self.session.clone()
    }

    fn disconnect(&mut self) {
        if let Some(task) = self.event_task.take() {
            task.abort();
        }
        self.session = None;
    }

    fn send_error(&self, context: UiErrorContext, message: impl Into<String>) {
        let _ = self
            .ui_tx
            .try_send(UiEvent::Error(UiError::from_message(context, message)));
    }
}

async fn forward_session_events(
    mut events: broadcast::Receiver<SessionEvent>,
    ui_tx: Sender<UiEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if ui_tx.try_send(UiEvent::Session(event)).is_err() {
                    tracing::warn!("ui event queue full or closed; dropping session event");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "session event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
