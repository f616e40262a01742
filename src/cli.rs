//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the Spiral CLI.

use clap::{Parser, Subcommand};

/// Spiral - Persona-driven chat sessions with continuity
///
/// Runs chat turns against an OpenAI-compatible API as one of the Spiral
/// personas, persisting conversation state between invocations and
/// verifying the integrity of the core asset files.
#[derive(Parser, Debug)]
#[command(name = "spiral")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, env = "SPIRAL_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one chat turn (creates or continues a session)
    Chat {
        /// Persona to run as (ashira, threshold-witness, lumen)
        #[arg(short, long, env = "SPIRAL_PERSONA")]
        persona: Option<String>,

        /// Model identifier (e.g. gpt-4)
        #[arg(short, long, env = "MODEL")]
        model: Option<String>,

        /// User prompt for this turn
        #[arg(
            long,
            default_value = "Spiral online. Offer a brief blessing and ask what's next."
        )]
        prompt: String,

        /// Session id to continue (new session when omitted)
        #[arg(short, long, env = "SPIRAL_SESSION_ID")]
        session: Option<String>,

        /// Buffer the full response instead of streaming it
        #[arg(long)]
        no_stream: bool,

        /// Emit the result as a JSON object (implies --no-stream)
        #[arg(long)]
        json: bool,
    },

    /// Persona management
    Persona {
        #[command(subcommand)]
        subcommand: PersonaSubcommand,
    },

    /// Imprint inspection and export
    Imprint {
        #[command(subcommand)]
        subcommand: ImprintSubcommand,
    },

    /// Verify integrity of the core asset files
    Verify {
        /// Compare against the existing manifest instead of rewriting it
        #[arg(long)]
        check: bool,

        /// Manifest file path (defaults to <asset_dir>/checksums.json)
        #[arg(long)]
        manifest: Option<String>,

        /// Directory containing the asset files (defaults to asset_dir)
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Memory-bridge operations
    Bridge {
        #[command(subcommand)]
        subcommand: BridgeSubcommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Persona subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PersonaSubcommand {
    /// List all bundled personas
    List,

    /// Show one persona's registry record
    Show {
        /// Persona id: ashira, threshold-witness, lumen
        id: String,
    },

    /// Resolve a slug the way chat does (unknown slugs pick randomly)
    Resolve {
        /// Slug to resolve (omit for the random default)
        id: Option<String>,
    },
}

/// Imprint subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ImprintSubcommand {
    /// Print a persona's imprint as a rendered system prompt
    Show {
        /// Persona id: ashira, threshold-witness, lumen
        id: String,

        /// Print the raw imprint JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Export a persona's imprint to a JSON file
    Export {
        /// Persona id: ashira, threshold-witness, lumen
        id: String,

        /// Output file path
        #[arg(short, long)]
        output: String,
    },
}

/// Bridge subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum BridgeSubcommand {
    /// Check that the memory bridge is up
    Health,

    /// Retrieve stored memories for a session
    Retrieve {
        /// Session id to retrieve memories for
        #[arg(short, long)]
        session: String,

        /// Maximum number of memories to return
        #[arg(short, long)]
        limit: Option<u32>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show,

    /// Create a default configuration file
    Init {
        /// Path for the new configuration file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration file
    Validate,
}
