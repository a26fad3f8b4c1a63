use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, AppState, CreateBountyForm, MintSkillForm, MutationError, Notice,
    SessionEvent, SkillchainSession, Snapshot,
};
use shared::{
    domain::{format_apt, truncate_address, Skill},
    protocol::PendingTransaction,
};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";
/// Extra time allowed on top of the refresh delay for the follow-up fetch.
const REFRESH_GRACE: Duration = Duration::from_secs(30);

/// `RUST_LOG` when set and parseable, `info` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[derive(Parser, Debug)]
#[command(name = "skillchain", about = "Mint and validate on-chain skill credentials")]
struct Args {
    /// TOML settings file; defaults to ./skillchain.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    node_url: Option<String>,
    #[arg(long)]
    module_address: Option<String>,
    /// Print snapshot data as JSON.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all skills.
    Skills,
    /// List skills still awaiting validation.
    Unverified,
    /// List active bounties.
    Bounties,
    /// Show the connected account's profile card.
    Profile,
    Mint {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        evidence_url: String,
    },
    Validate {
        skill_id: String,
    },
    CreateBounty {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = 1.0)]
        reward: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("loading settings")?;
    if let Some(node_url) = args.node_url {
        settings.node_url = node_url;
    }
    if let Some(module_address) = args.module_address {
        settings.module_address = module_address;
    }

    let session = SkillchainSession::connect(&settings).context("connecting to node")?;
    let mut events = session.subscribe_events();

    let state = session.state().await;
    let Some(account) = state.account else {
        bail!("no wallet configured: set account_address and private_key (or private_key_path)");
    };

    // A failed fetch only aborts the read commands; its notice is printed below.
    let fetched = session.refresh().await.is_ok();
    let state = session.state().await;

    let outcome = match args.command {
        Command::Skills => require_snapshot(fetched)
            .and_then(|()| print_skills(&state.snapshot.skills, args.json)),
        Command::Unverified => require_snapshot(fetched).and_then(|()| {
            let unverified: Vec<Skill> = state.snapshot.unverified_skills().cloned().collect();
            if unverified.is_empty() && !args.json {
                println!("No unverified skills to validate");
                return Ok(());
            }
            print_skills(&unverified, args.json)
        }),
        Command::Bounties => require_snapshot(fetched).and_then(|()| print_bounties(&state, args.json)),
        Command::Profile => require_snapshot(fetched).and_then(|()| {
            let profile = state.snapshot.profile;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Address:     {}", truncate_address(&account.to_hex_literal()));
                println!("Reputation:  {}", profile.reputation_score);
                println!("Completed:   {}", profile.bounties_completed);
                println!("APT Earned:  {:.2}", profile.total_earned);
            }
            Ok(())
        }),
        Command::Mint {
            name,
            description,
            evidence_url,
        } => {
            print_notices(&mut events);
            let form = MintSkillForm::new(name, description, evidence_url);
            let result = session.mint_skill(&form).await;
            finish_transaction(&session, &mut events, result).await
        }
        Command::Validate { skill_id } => {
            print_notices(&mut events);
            let result = session.validate_skill(&skill_id).await;
            finish_transaction(&session, &mut events, result).await
        }
        Command::CreateBounty {
            title,
            description,
            reward,
        } => {
            let form = CreateBountyForm {
                title,
                description,
                reward_apt: reward,
            };
            session.create_bounty(&form).await.map_err(anyhow::Error::from)
        }
    };

    print_notices(&mut events);
    outcome
}

fn require_snapshot(fetched: bool) -> Result<()> {
    if fetched {
        Ok(())
    } else {
        bail!("snapshot unavailable")
    }
}

/// Reports the hash, then waits for the session's follow-up refresh.
async fn finish_transaction(
    session: &SkillchainSession,
    events: &mut broadcast::Receiver<SessionEvent>,
    result: Result<PendingTransaction, MutationError>,
) -> Result<()> {
    let pending = result?;
    println!("Transaction confirmed: {}", pending.hash);

    let limit = session.config().refresh_delay + REFRESH_GRACE;
    match wait_for_refresh(events, limit).await {
        Some(snapshot) => println!("Refreshed: {} skills on chain", snapshot.skills.len()),
        None => println!("Refresh did not complete; run `skillchain skills` to check"),
    }
    Ok(())
}

/// Prints notices until the next fetch settles. `None` when it failed or timed out.
async fn wait_for_refresh(
    events: &mut broadcast::Receiver<SessionEvent>,
    limit: Duration,
) -> Option<Snapshot> {
    let settle = async {
        let mut started = false;
        let mut fetched = None;
        loop {
            match events.recv().await {
                Ok(SessionEvent::Notice(notice)) => print_notice(&notice),
                Ok(SessionEvent::LoadingChanged(true)) => started = true,
                Ok(SessionEvent::SnapshotUpdated(snapshot)) => fetched = Some(snapshot),
                Ok(SessionEvent::LoadingChanged(false)) if started => return fetched,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    };
    tokio::time::timeout(limit, settle).await.ok().flatten()
}

fn print_skills(skills: &[Skill], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(skills)?);
        return Ok(());
    }
    if skills.is_empty() {
        println!("No skills found. Mint your first skill NFT!");
        return Ok(());
    }
    for skill in skills {
        let status = if skill.is_verified { "Verified" } else { "Pending" };
        println!("#{} {} [{status}]", skill.id, skill.name);
        println!("    {}", skill.description);
        println!("    Evidence:    {}", skill.evidence_url);
        println!("    Owner:       {}", truncate_address(&skill.owner.to_hex_literal()));
        println!("    Validations: {}", skill.validation_count);
    }
    Ok(())
}

fn print_bounties(state: &AppState, json: bool) -> Result<()> {
    let bounties: Vec<_> = state.snapshot.active_bounties().collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&bounties)?);
        return Ok(());
    }
    if bounties.is_empty() {
        println!("No active bounties. Create one to get started!");
        return Ok(());
    }
    for bounty in bounties {
        println!("#{} {} ({} APT)", bounty.id, bounty.title, format_apt(bounty.reward_amount));
        println!("    {}", bounty.description);
        println!("    Creator:     {}", truncate_address(&bounty.creator.to_hex_literal()));
        if bounty.is_assigned() {
            println!(
                "    Assigned to: {}",
                truncate_address(&bounty.assigned_to.to_hex_literal())
            );
        }
    }
    Ok(())
}

fn print_notice(notice: &Notice) {
    if notice.is_error() {
        eprintln!("{}: {}", notice.title, notice.description);
    } else {
        println!("{}: {}", notice.title, notice.description);
    }
}

fn print_notices(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Notice(notice) = event {
            print_notice(&notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{AccountAddress, SkillId};

    use super::*;

    fn skill() -> Skill {
        Skill {
            id: SkillId(1),
            name: "rust".into(),
            description: "systems".into(),
            evidence_url: "https://example.com".into(),
            is_verified: false,
            validation_count: 0,
            owner: AccountAddress::ZERO,
        }
    }

    #[test]
    fn log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).to_string(), "info");
        assert_eq!(log_filter(Some("client_core=debug".into())).to_string(), "client_core=debug");
    }

    #[tokio::test]
    async fn waits_for_the_follow_up_fetch() {
        let (tx, mut rx) = broadcast::channel(16);
        // Leftovers from the fetch that ran before the transaction.
        tx.send(SessionEvent::TransactionStateChanged(false)).expect("send");
        tx.send(SessionEvent::Notice(Notice::success("Skill NFT minted successfully")))
            .expect("send");

        let sender = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let snapshot = Snapshot {
                skills: vec![skill()],
                ..Snapshot::default()
            };
            let _ = sender.send(SessionEvent::LoadingChanged(true));
            let _ = sender.send(SessionEvent::SnapshotUpdated(snapshot));
            let _ = sender.send(SessionEvent::LoadingChanged(false));
        });

        let snapshot = wait_for_refresh(&mut rx, Duration::from_secs(5))
            .await
            .expect("refreshed");
        assert_eq!(snapshot.skills, vec![skill()]);
    }

    #[tokio::test]
    async fn failed_follow_up_fetch_yields_nothing() {
        let (tx, mut rx) = broadcast::channel(16);
        tx.send(SessionEvent::LoadingChanged(true)).expect("send");
        tx.send(SessionEvent::LoadingChanged(false)).expect("send");
        tx.send(SessionEvent::Notice(Notice::destructive("Error", "boom")))
            .expect("send");

        assert!(wait_for_refresh(&mut rx, Duration::from_secs(5)).await.is_none());
    }

    #[tokio::test]
    async fn gives_up_when_no_fetch_arrives() {
        let (_tx, mut rx) = broadcast::channel::<SessionEvent>(4);
        assert!(wait_for_refresh(&mut rx, Duration::from_millis(30)).await.is_none());
    }
}
