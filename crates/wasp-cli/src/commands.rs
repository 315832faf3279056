use anyhow::{bail, Context, Result};
use serde_json::json;
use wasp_core::{
    AuditQuery, Decision, Platform, TrustLevel, Wasp, WaspConfig,
};

use crate::cli::{Cli, Commands};
use crate::output::emit_json;

fn store_initialized(config: &WaspConfig) -> bool {
    config.data_dir.join("wasp.db").exists()
}

fn require_store(config: &WaspConfig) -> Result<()> {
    if !store_initialized(config) {
        bail!("store not initialized; run `wasp init` first");
    }
    Ok(())
}

/// Runs the selected subcommand and returns the process exit code.
pub async fn dispatch(cli: Cli, mut config: WaspConfig) -> Result<i32> {
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    let json_mode = cli.json;

    match cli.command {
        Commands::Init => {
            let data_dir = config.data_dir.clone();
            Wasp::open(config).await.context("initializing store")?;
            if json_mode {
                emit_json(json!({ "initialized": true, "data_dir": data_dir.display().to_string() }));
            } else {
                println!("initialized wasp store at {}", data_dir.display());
            }
            Ok(0)
        }

        Commands::Add {
            id,
            platform,
            trust,
            name,
            notes,
        } => {
            require_store(&config)?;
            let platform: Platform = platform.parse().context("parsing --platform")?;
            let trust: TrustLevel = trust.parse().context("parsing --trust")?;
            let wasp = Wasp::open(config).await.context("opening store")?;
            let contact = wasp
                .contacts
                .upsert(&id, platform, trust, name.as_deref(), notes.as_deref())
                .await
                .context("upserting contact")?;
            if json_mode {
                emit_json(contact);
            } else {
                println!(
                    "{} ({}) trust={} name={}",
                    contact.identifier,
                    contact.platform,
                    contact.trust,
                    contact.name.as_deref().unwrap_or("-")
                );
            }
            Ok(0)
        }

        Commands::Remove { id, platform } => {
            require_store(&config)?;
            let platform: Platform = platform.parse().context("parsing --platform")?;
            let wasp = Wasp::open(config).await.context("opening store")?;
            let removed = wasp
                .contacts
                .remove(&id, platform)
                .await
                .context("removing contact")?;
            if json_mode {
                emit_json(json!({ "removed": removed }));
            } else if removed {
                println!("removed {id}");
            } else {
                println!("no contact found for {id}");
            }
            Ok(0)
        }

        Commands::List { platform, trust } => {
            require_store(&config)?;
            let platform = platform
                .map(|p| p.parse::<Platform>())
                .transpose()
                .context("parsing --platform")?;
            let trust = trust
                .map(|t| t.parse::<TrustLevel>())
                .transpose()
                .context("parsing --trust")?;
            let wasp = Wasp::open(config).await.context("opening store")?;
            let contacts = wasp
                .contacts
                .list(platform, trust)
                .await
                .context("listing contacts")?;
            if json_mode {
                emit_json(contacts);
            } else if contacts.is_empty() {
                println!("no contacts");
            } else {
                for c in &contacts {
                    println!(
                        "{}\t{}\t{}\t{}",
                        c.identifier,
                        c.platform,
                        c.trust,
                        c.name.as_deref().unwrap_or("-")
                    );
                }
            }
            Ok(0)
        }

        Commands::Check { id, platform } => {
            require_store(&config)?;
            let platform: Platform = platform.parse().context("parsing --platform")?;
            let wasp = Wasp::open(config).await.context("opening store")?;
            let result = wasp
                .contacts
                .check(&id, platform)
                .await
                .context("checking contact")?;
            let allowed = result.allowed;
            if json_mode {
                emit_json(result);
            } else {
                println!(
                    "{}: {} ({})",
                    if allowed { "allowed" } else { "denied" },
                    result.reason,
                    result
                        .trust
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                );
            }
            Ok(if allowed { 0 } else { 1 })
        }

        Commands::Log { limit, decision } => {
            require_store(&config)?;
            let decision = decision
                .map(|d| d.parse::<Decision>())
                .transpose()
                .context("parsing --decision")?;
            let wasp = Wasp::open(config).await.context("opening store")?;
            let entries = wasp
                .audit
                .query(AuditQuery {
                    limit: Some(limit),
                    decision,
                    since: None,
                })
                .await
                .context("querying audit log")?;
            print_audit(json_mode, &entries);
            Ok(0)
        }

        Commands::Blocked { limit } => {
            require_store(&config)?;
            let wasp = Wasp::open(config).await.context("opening store")?;
            let entries = wasp
                .audit
                .query(AuditQuery {
                    limit: Some(limit),
                    decision: Some(Decision::Deny),
                    since: None,
                })
                .await
                .context("querying audit log")?;
            print_audit(json_mode, &entries);
            Ok(0)
        }

        Commands::Serve => {
            if !store_initialized(&config) {
                if json_mode {
                    emit_json(json!({ "error": "store not initialized" }));
                } else {
                    eprintln!("error: store not initialized; run `wasp init` first");
                }
                return Ok(1);
            }
            wasp_server::run(config).await.context("running server")?;
            Ok(0)
        }

        Commands::Review {
            approve,
            deny,
            platform,
            limit,
        } => {
            require_store(&config)?;
            let platform: Platform = platform.parse().context("parsing --platform")?;
            let wasp = Wasp::open(config).await.context("opening store")?;

            if let Some(id) = approve {
                let released = wasp
                    .quarantine
                    .release(&id, platform)
                    .await
                    .context("releasing quarantined messages")?;
                if json_mode {
                    emit_json(released);
                } else {
                    println!("released {} message(s) for {id}", released.len());
                }
            } else if let Some(id) = deny {
                let deleted = wasp
                    .quarantine
                    .delete(&id, platform)
                    .await
                    .context("deleting quarantined messages")?;
                if json_mode {
                    emit_json(json!({ "deleted": deleted }));
                } else {
                    println!("deleted {deleted} message(s) for {id}");
                }
            } else {
                let rows = wasp
                    .quarantine
                    .list_unreviewed(limit)
                    .await
                    .context("listing quarantine")?;
                if json_mode {
                    emit_json(rows);
                } else if rows.is_empty() {
                    println!("nothing pending review");
                } else {
                    for r in &rows {
                        println!("[{}] {} ({}) {}", r.id, r.identifier, r.platform, r.preview);
                    }
                }
            }
            Ok(0)
        }

        Commands::Canary {
            stats,
            clear,
            days,
            limit,
        } => {
            require_store(&config)?;
            let wasp = Wasp::open(config).await.context("opening store")?;

            if clear {
                let purged = wasp
                    .heuristic
                    .purge_older_than(0)
                    .await
                    .context("clearing telemetry")?;
                if json_mode {
                    emit_json(json!({ "purged": purged }));
                } else {
                    println!("cleared {purged} telemetry row(s)");
                }
                return Ok(0);
            }

            if let Some(days) = days {
                let purged = wasp
                    .heuristic
                    .purge_older_than(days)
                    .await
                    .context("purging telemetry")?;
                if json_mode {
                    emit_json(json!({ "purged": purged }));
                } else {
                    println!("purged {purged} telemetry row(s) older than {days} day(s)");
                }
                return Ok(0);
            }

            let rows = wasp
                .heuristic
                .query(limit, None)
                .await
                .context("querying telemetry")?;

            if stats {
                let total = rows.len();
                let avg = if total == 0 {
                    0.0
                } else {
                    rows.iter().map(|r| r.score).sum::<f64>() / total as f64
                };
                if json_mode {
                    emit_json(json!({ "rows": total, "average_score": avg }));
                } else {
                    println!("{total} row(s), average score {avg:.2}");
                }
            } else if json_mode {
                emit_json(rows);
            } else if rows.is_empty() {
                println!("no telemetry");
            } else {
                for r in &rows {
                    println!(
                        "[{}] {} ({}) score={:.2} patterns={:?} verbs={:?}",
                        r.id, r.identifier, r.platform, r.score, r.patterns, r.sensitive_verbs
                    );
                }
            }
            Ok(0)
        }
    }
}

fn print_audit(json_mode: bool, entries: &[wasp_core::AuditEntry]) {
    if json_mode {
        emit_json(entries);
    } else if entries.is_empty() {
        println!("no entries");
    } else {
        for e in entries {
            let platform = e
                .platform
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "[{}] {} {} ({}) {}",
                e.id, e.timestamp, e.identifier, platform, e.decision.as_str()
            );
            println!("    {}", e.reason);
        }
    }
}
