use clap::{Parser, Subcommand};

/// wasp: policy gateway for an agentic assistant's inbound/outbound boundary.
#[derive(Parser, Debug)]
#[command(name = "wasp", about = "Contact whitelist, trust policy, and audit gateway", version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit a single newline-terminated JSON document instead of human text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Override the data directory (defaults to ~/.wasp or $WASP_DATA_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the on-disk store.
    Init,

    /// Add or update a contact.
    Add {
        /// Sender identifier (phone number, email address, handle).
        id: String,
        /// Channel the identifier is reachable on.
        #[arg(long, default_value = "whatsapp")]
        platform: String,
        /// Trust label: limited, trusted, or sovereign.
        #[arg(long, default_value = "limited")]
        trust: String,
        /// Display name.
        #[arg(long)]
        name: Option<String>,
        /// Free-form notes.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a contact.
    Remove {
        id: String,
        #[arg(long, default_value = "whatsapp")]
        platform: String,
    },

    /// List contacts, optionally filtered.
    List {
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        trust: Option<String>,
    },

    /// Run the whitelist decision for a sender and print the verdict.
    ///
    /// Exits 0 if allowed, 1 if denied.
    Check {
        id: String,
        #[arg(long, default_value = "whatsapp")]
        platform: String,
    },

    /// Show recent audit log entries.
    Log {
        #[arg(long, default_value_t = 50)]
        limit: u32,
        /// Filter by decision: allow, deny, or limited.
        #[arg(long)]
        decision: Option<String>,
    },

    /// Start the admin HTTP façade and block until killed.
    ///
    /// Exits 1 if the store has not been initialized with `wasp init`.
    Serve,

    /// Review quarantined messages: list unreviewed, or approve/deny one sender.
    Review {
        /// Release (mark reviewed) all quarantined messages for this sender.
        #[arg(long, value_name = "ID", conflicts_with = "deny")]
        approve: Option<String>,
        /// Delete all quarantined messages for this sender.
        #[arg(long, value_name = "ID", conflicts_with = "approve")]
        deny: Option<String>,
        #[arg(long, default_value = "whatsapp")]
        platform: String,
        /// With neither --approve nor --deny, list at most this many unreviewed messages.
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// List audit entries with decision=deny.
    Blocked {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Inspect or manage injection-heuristic telemetry.
    Canary {
        /// Show counts instead of rows.
        #[arg(long)]
        stats: bool,
        /// Delete all telemetry rows.
        #[arg(long, conflicts_with = "days")]
        clear: bool,
        /// Delete telemetry rows older than N days.
        #[arg(long, value_name = "N", conflicts_with = "clear")]
        days: Option<i64>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}
