use std::time::{Duration, Instant};

use client_core::{
    ActiveTab, AppState, ClientSettings, CreateBountyForm, MintSkillForm, Notice, SessionEvent,
    ShellView,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{format_apt, truncate_address, Bounty, Skill};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{TransactionKind, UiError, UiErrorCategory, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const NOTICE_TTL: Duration = Duration::from_secs(6);
const MINT_FEE_BADGE: &str = "0.1 APT Fee";

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Wallet => "Wallet",
        UiErrorCategory::Transport => "Network",
        UiErrorCategory::Validation => "Invalid input",
        UiErrorCategory::Unknown => "Error",
    }
}

fn verification_badge(skill: &Skill) -> (&'static str, egui::Color32) {
    if skill.is_verified {
        ("Verified", egui::Color32::from_rgb(67, 160, 71))
    } else {
        ("Pending", egui::Color32::from_rgb(158, 158, 158))
    }
}

/// Connect-screen inputs. The key is cleared once handed to the backend.
#[derive(Debug, Clone, Default)]
struct ConnectForm {
    node_url: String,
    module_address: String,
    account_address: String,
    private_key: String,
}

impl ConnectForm {
    fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            node_url: settings.node_url.clone(),
            module_address: settings.module_address.clone(),
            account_address: settings.account_address.clone().unwrap_or_default(),
            private_key: String::new(),
        }
    }

    /// Blank fields fall back to whatever the loaded settings carried.
    fn to_settings(&self, base: &ClientSettings) -> ClientSettings {
        let mut settings = base.clone();
        let non_empty = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        if let Some(node_url) = non_empty(&self.node_url) {
            settings.node_url = node_url;
        }
        if let Some(module_address) = non_empty(&self.module_address) {
            settings.module_address = module_address;
        }
        settings.account_address = non_empty(&self.account_address);
        if let Some(key) = non_empty(&self.private_key) {
            settings.private_key = Some(key);
        }
        settings
    }
}

#[derive(Debug, Clone)]
struct ActiveNotice {
    notice: Notice,
    shown_at: Instant,
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    base_settings: ClientSettings,
    connect_form: ConnectForm,
    connecting: bool,
    state: AppState,
    mint_form: MintSkillForm,
    bounty_form: CreateBountyForm,
    validate_input: String,
    notice: Option<ActiveNotice>,
    status_banner: Option<UiError>,
    status: String,
}

impl DesktopGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            connect_form: ConnectForm::from_settings(&settings),
            base_settings: settings,
            connecting: false,
            state: AppState::default(),
            mint_form: MintSkillForm::default(),
            bounty_form: CreateBountyForm::default(),
            validate_input: String::new(),
            notice: None,
            status_banner: None,
            status: "Not connected".to_string(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::Connected { account } => {
                self.connecting = false;
                self.state = AppState {
                    account: Some(account),
                    ..AppState::default()
                };
                self.status_banner = None;
                self.status = format!("Connected as {}", truncate_address(&account.to_hex_literal()));
            }
            UiEvent::Disconnected => {
                self.connecting = false;
                self.state = AppState::default();
                self.notice = None;
                self.status = "Disconnected".to_string();
            }
            UiEvent::TransactionConfirmed { kind, hash } => {
                match kind {
                    TransactionKind::MintSkill => self.mint_form.clear(),
                    TransactionKind::ValidateSkill => self.validate_input.clear(),
                }
                self.status = format!("Transaction {hash} confirmed");
            }
            UiEvent::Session(event) => self.apply_session_event(event),
            UiEvent::Error(err) => {
                tracing::warn!(context = ?err.context(), "{}", err.message());
                self.connecting = false;
                if err.requires_reconnect() {
                    self.state.account = None;
                }
                self.status = format!("{}: {}", err_label(err.category()), err.message());
                self.status_banner = Some(err);
            }
        }
    }

    fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SnapshotUpdated(snapshot) => self.state.snapshot = snapshot,
            SessionEvent::LoadingChanged(loading) => self.state.loading = loading,
            SessionEvent::TransactionStateChanged(in_progress) => {
                self.state.transaction_in_progress = in_progress;
            }
            SessionEvent::TabChanged(tab) => self.state.select_tab(tab),
            SessionEvent::Notice(notice) => {
                self.notice = Some(ActiveNotice {
                    notice,
                    shown_at: Instant::now(),
                });
            }
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn try_connect(&mut self) {
        let settings = self.connect_form.to_settings(&self.base_settings);
        self.connect_form.private_key.clear();
        self.connecting = true;
        self.status_banner = None;
        self.status = "Connecting...".to_string();
        self.dispatch(BackendCommand::Connect { settings });
    }

    fn select_tab(&mut self, tab: ActiveTab) {
        if self.state.active_tab == tab {
            return;
        }
        self.state.select_tab(tab);
        self.dispatch(BackendCommand::SelectTab { tab });
    }

    /// Mutation buttons are only live while no transaction is in flight.
    fn actions_enabled(&self) -> bool {
        !self.state.transaction_in_progress
    }

    fn expire_notice(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|active| active.shown_at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.clone() else {
            return;
        };
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "{}: {}",
                            err_label(banner.category()),
                            banner.message()
                        ))
                        .color(egui::Color32::WHITE),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.status_banner = None;
                        }
                    });
                });
            });
    }

    fn show_notice(&mut self, ui: &mut egui::Ui) {
        let Some(active) = self.notice.clone() else {
            return;
        };
        let (fill, stroke) = if active.notice.is_error() {
            (
                egui::Color32::from_rgb(111, 53, 53),
                egui::Color32::from_rgb(175, 96, 96),
            )
        } else {
            (
                egui::Color32::from_rgb(38, 84, 60),
                egui::Color32::from_rgb(86, 150, 110),
            )
        };
        egui::Frame::NONE
            .fill(fill)
            .stroke(egui::Stroke::new(1.0, stroke))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.vertical(|ui| {
                        ui.label(
                            egui::RichText::new(&active.notice.title)
                                .strong()
                                .color(egui::Color32::WHITE),
                        );
                        ui.label(
                            egui::RichText::new(&active.notice.description)
                                .color(egui::Color32::WHITE),
                        );
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.notice = None;
                        }
                    });
                });
            });
        ui.add_space(8.0);
    }

    fn form_text_field(ui: &mut egui::Ui, label: &str, hint: &str, value: &mut String) {
        ui.label(egui::RichText::new(label).strong());
        let edit = egui::TextEdit::singleline(value)
            .hint_text(hint)
            .desired_width(f32::INFINITY);
        ui.add_sized([ui.available_width(), 30.0], edit);
    }

    fn card(ui: &mut egui::Ui, add: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::NONE
            .fill(ui.visuals().faint_bg_color)
            .stroke(egui::Stroke::new(
                1.0,
                ui.visuals().widgets.noninteractive.bg_stroke.color,
            ))
            .corner_radius(12.0)
            .inner_margin(egui::Margin::symmetric(14, 12))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                add(ui);
            });
    }

    fn show_connect_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(420.0, 540.0);
            ui.add_space((avail.y * 0.1).clamp(18.0, 80.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);
                Self::card(ui, |ui| {
                    ui.style_mut().spacing.item_spacing = egui::vec2(10.0, 8.0);
                    ui.heading("SkillChain");
                    ui.weak("Mint skill NFTs and get them validated by peers on Aptos.");
                    ui.add_space(6.0);
                    self.show_status_banner(ui);

                    let mut form = std::mem::take(&mut self.connect_form);
                    Self::form_text_field(
                        ui,
                        "Node URL",
                        "https://fullnode.devnet.aptoslabs.com",
                        &mut form.node_url,
                    );
                    Self::form_text_field(ui, "Module address", "0x...", &mut form.module_address);
                    Self::form_text_field(
                        ui,
                        "Account address",
                        "0x...",
                        &mut form.account_address,
                    );
                    ui.label(egui::RichText::new("Private key").strong());
                    let key_resp = ui.add_sized(
                        [ui.available_width(), 30.0],
                        egui::TextEdit::singleline(&mut form.private_key)
                            .password(true)
                            .hint_text("ed25519-priv-0x... (blank uses the configured key)")
                            .desired_width(f32::INFINITY),
                    );
                    self.connect_form = form;

                    let enter_pressed = ctx.input(|i| i.key_pressed(egui::Key::Enter));
                    if key_resp.lost_focus() && enter_pressed && !self.connecting {
                        self.try_connect();
                    }

                    ui.add_space(6.0);
                    let button = egui::Button::new(
                        egui::RichText::new("Connect Wallet").strong().size(16.0),
                    )
                    .min_size(egui::vec2(ui.available_width(), 38.0));
                    if ui.add_enabled(!self.connecting, button).clicked() {
                        self.try_connect();
                    }

                    ui.separator();
                    ui.horizontal_wrapped(|ui| {
                        ui.small("Status:");
                        ui.small(egui::RichText::new(&self.status).weak());
                    });
                });
            });
        });
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("SkillChain");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Disconnect").clicked() {
                        self.dispatch(BackendCommand::Disconnect);
                    }
                    if let Some(account) = self.state.account {
                        ui.monospace(truncate_address(&account.to_hex_literal()));
                    }
                    if self.state.loading {
                        ui.spinner();
                    }
                });
            });
        });
    }

    fn show_profile_card(&self, ui: &mut egui::Ui) {
        let profile = self.state.snapshot.profile;
        let address = self
            .state
            .account
            .map(|account| account.to_hex_literal())
            .unwrap_or_default();
        Self::card(ui, |ui| {
            ui.label(egui::RichText::new("Profile").strong().size(18.0));
            ui.monospace(truncate_address(&address));
            ui.add_space(4.0);
            ui.columns(3, |columns| {
                let stat = |ui: &mut egui::Ui, value: String, label: &str| {
                    ui.vertical_centered(|ui| {
                        ui.label(egui::RichText::new(value).strong().size(20.0));
                        ui.weak(label);
                    });
                };
                stat(&mut columns[0], profile.reputation_score.to_string(), "Reputation");
                stat(&mut columns[1], profile.bounties_completed.to_string(), "Completed");
                stat(&mut columns[2], format!("{:.2}", profile.total_earned), "APT Earned");
            });
        });
    }

    fn show_tab_bar(&mut self, ui: &mut egui::Ui) {
        let mut chosen = self.state.active_tab;
        ui.horizontal(|ui| {
            for tab in ActiveTab::ALL {
                ui.selectable_value(&mut chosen, tab, egui::RichText::new(tab.label()).strong());
            }
        });
        self.select_tab(chosen);
    }

    fn show_skill_row(ui: &mut egui::Ui, skill: &Skill) {
        Self::card(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&skill.name).strong());
                let (badge, color) = verification_badge(skill);
                ui.label(egui::RichText::new(badge).small().color(color));
            });
            ui.label(&skill.description);
            ui.horizontal_wrapped(|ui| {
                ui.weak(format!("ID: {}", skill.id));
                ui.weak(format!(
                    "Owner: {}",
                    truncate_address(&skill.owner.to_hex_literal())
                ));
                ui.weak(format!("Validations: {}", skill.validation_count));
                ui.hyperlink_to("View Evidence", &skill.evidence_url);
            });
        });
        ui.add_space(6.0);
    }

    fn show_bounty_row(ui: &mut egui::Ui, bounty: &Bounty) {
        Self::card(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&bounty.title).strong());
                ui.label(
                    egui::RichText::new(format!("{} APT", format_apt(bounty.reward_amount)))
                        .small(),
                );
            });
            ui.label(&bounty.description);
            ui.weak(format!(
                "Creator: {}",
                truncate_address(&bounty.creator.to_hex_literal())
            ));
            if bounty.is_assigned() {
                ui.weak(format!(
                    "Assigned to: {}",
                    truncate_address(&bounty.assigned_to.to_hex_literal())
                ));
            }
        });
        ui.add_space(6.0);
    }

    fn show_skills_tab(&mut self, ui: &mut egui::Ui) {
        let busy = !self.actions_enabled();
        Self::card(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Mint Skill NFT").strong().size(16.0));
                ui.label(egui::RichText::new(MINT_FEE_BADGE).small().weak());
            });
            Self::form_text_field(ui, "Skill Name", "e.g. Rust Development", &mut self.mint_form.name);
            Self::form_text_field(
                ui,
                "Description",
                "Describe your skill",
                &mut self.mint_form.description,
            );
            Self::form_text_field(
                ui,
                "Evidence URL",
                "https://github.com/...",
                &mut self.mint_form.evidence_url,
            );
            let label = if busy { "Minting..." } else { "Mint Skill NFT" };
            if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                let form = self.mint_form.clone();
                self.dispatch(BackendCommand::MintSkill { form });
            }
        });
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("All Skills").strong().size(16.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.state.loading { "Loading..." } else { "Refresh" };
                if ui
                    .add_enabled(!self.state.loading, egui::Button::new(label))
                    .clicked()
                {
                    self.dispatch(BackendCommand::Refresh);
                }
            });
        });
        if self.state.snapshot.skills.is_empty() {
            ui.weak("No skills found. Mint your first skill NFT!");
        }
        for skill in &self.state.snapshot.skills {
            Self::show_skill_row(ui, skill);
        }
    }

    fn show_bounties_tab(&mut self, ui: &mut egui::Ui) {
        let enabled = self.actions_enabled();
        Self::card(ui, |ui| {
            ui.label(egui::RichText::new("Create Bounty").strong().size(16.0));
            Self::form_text_field(ui, "Title", "What needs doing?", &mut self.bounty_form.title);
            Self::form_text_field(
                ui,
                "Description",
                "Details and acceptance criteria",
                &mut self.bounty_form.description,
            );
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Reward (APT)").strong());
                ui.add(
                    egui::DragValue::new(&mut self.bounty_form.reward_apt)
                        .speed(0.1)
                        .range(0.0..=f64::MAX),
                );
            });
            if ui
                .add_enabled(enabled, egui::Button::new("Create Bounty"))
                .clicked()
            {
                let form = self.bounty_form.clone();
                self.dispatch(BackendCommand::CreateBounty { form });
            }
        });
        ui.add_space(10.0);

        ui.label(egui::RichText::new("Active Bounties").strong().size(16.0));
        let mut any = false;
        for bounty in self.state.snapshot.active_bounties() {
            any = true;
            Self::show_bounty_row(ui, bounty);
        }
        if !any {
            ui.weak("No active bounties. Create one to get started!");
        }
    }

    fn show_validate_tab(&mut self, ui: &mut egui::Ui) {
        let busy = !self.actions_enabled();
        Self::card(ui, |ui| {
            ui.label(egui::RichText::new("Validate Skill").strong().size(16.0));
            Self::form_text_field(ui, "Skill ID", "Enter skill ID", &mut self.validate_input);
            let label = if busy { "Validating..." } else { "Validate Skill" };
            if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                let skill_id = self.validate_input.clone();
                self.dispatch(BackendCommand::ValidateSkill { skill_id });
            }
            ui.weak("Note: You cannot validate your own skills");
        });
        ui.add_space(10.0);

        ui.label(egui::RichText::new("Skills Awaiting Validation").strong().size(16.0));
        let mut any = false;
        for skill in self.state.snapshot.unverified_skills() {
            any = true;
            Self::show_skill_row(ui, skill);
        }
        if !any {
            ui.weak("No unverified skills to validate");
        }
    }

    fn show_main_workspace(&mut self, ctx: &egui::Context) {
        self.show_top_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_status_banner(ui);
                    self.show_notice(ui);
                    self.show_profile_card(ui);
                    ui.add_space(10.0);
                    self.show_tab_bar(ui);
                    ui.separator();
                    match self.state.active_tab {
                        ActiveTab::Skills => self.show_skills_tab(ui),
                        ActiveTab::Bounties => self.show_bounties_tab(ui),
                        ActiveTab::Validate => self.show_validate_tab(ui),
                    }
                });
        });
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.expire_notice();

        match self.state.shell_view() {
            ShellView::Connect => self.show_connect_screen(ctx),
            ShellView::Main => self.show_main_workspace(ctx),
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
