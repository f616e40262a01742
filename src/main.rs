//! Spiral CLI - persona-driven chat sessions with continuity
//!
//! This is the main entry point for the spiral binary. A chat turn
//! resolves a persona, loads or creates a session, runs one completion
//! against an OpenAI-compatible API, and persists the updated session.

mod bridge;
mod chat;
mod cli;
mod config;
mod error;
mod integrity;
mod logging;
mod persona;
mod prompt;
mod session;
mod version;

use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info};

use crate::bridge::BridgeClient;
use crate::chat::{ChatMessage, ChatOptions, ChatProvider, OpenAiProvider, Role};
use crate::cli::{
    BridgeSubcommand, Cli, Commands, ConfigSubcommand, ImprintSubcommand, PersonaSubcommand,
};
use crate::config::SpiralConfig;
use crate::error::{Error, Result};
use crate::persona::{bundled_imprint, save_imprint, PersonaRegistry};
use crate::session::{SessionRecord, SessionStore};

fn main() {
    if let Err(e) = run() {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    // Commands that don't need full logging use simple setup
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(cli.config.as_deref(), subcommand.clone());
        }
        Commands::Persona { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_persona_command(subcommand.clone());
        }
        Commands::Imprint { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_imprint_command(subcommand.clone());
        }
        _ => {}
    }

    // Load config (or use defaults)
    let config = SpiralConfig::load(cli.config.as_deref())?;

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    info!(version = %build.full_version(), "Starting Spiral CLI");

    match cli.command {
        Commands::Chat {
            persona,
            model,
            prompt,
            session,
            no_stream,
            json,
        } => {
            let rt = build_runtime()?;
            rt.block_on(run_chat(
                &config,
                persona.as_deref(),
                model.as_deref(),
                &prompt,
                session.as_deref(),
                no_stream,
                json,
            ))
        }
        Commands::Verify {
            check,
            manifest,
            dir,
        } => run_verify(&config, check, manifest.as_deref(), dir.as_deref()),
        Commands::Bridge { subcommand } => {
            let rt = build_runtime()?;
            rt.block_on(handle_bridge_command(&config, subcommand))
        }
        Commands::Version
        | Commands::Config { .. }
        | Commands::Persona { .. }
        | Commands::Imprint { .. } => {
            // Already handled above
            unreachable!();
        }
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create runtime: {}", e)))
}

// ============================================================================
// Chat
// ============================================================================

#[allow(clippy::too_many_arguments)]
async fn run_chat(
    config: &SpiralConfig,
    persona_arg: Option<&str>,
    model_arg: Option<&str>,
    prompt: &str,
    session_arg: Option<&str>,
    no_stream: bool,
    json: bool,
) -> Result<()> {
    // Persona precedence: --persona / SPIRAL_PERSONA (clap env) > config default
    let slug = persona_arg.unwrap_or(&config.persona.default);
    let (persona, imprint) = persona::load_imprint(Some(slug));

    // An exported imprint file in the asset directory overrides the bundled one
    let override_path = config
        .asset_dir()
        .join(format!("{}_imprint.json", persona.id.slug()));
    let imprint = if override_path.exists() {
        persona::load_imprint_from_file(&override_path)?
    } else {
        imprint
    };

    // Model precedence: --model / MODEL (clap env) > config
    let model = model_arg.unwrap_or(&config.api.model).to_string();

    let store = SessionStore::new(config.session_dir());
    let mut session = match session_arg {
        Some(id) => store.load_or_create(id, persona.id.slug(), &model)?,
        None => SessionRecord::new(persona.id.slug(), &model),
    };

    debug!(
        session_id = %session.session_id,
        persona = %persona.id,
        %model,
        "Chat turn starting"
    );

    // Insert the system message only if the stored history doesn't have one
    if session.messages.first().map(|m| m.role) != Some(Role::System) {
        session
            .messages
            .insert(0, ChatMessage::system(imprint.render_system_prompt()));
        if let Some(init) = prompt::load_init_prompt(&config.asset_dir())? {
            prompt::attach_system_prompt(&mut session.messages, &init);
        }
    }

    let mut request_messages = session.messages.clone();
    request_messages.push(ChatMessage::user(prompt));

    // The hosted endpoint always needs a key; local servers don't
    if config.api.api_key.is_empty() && config.api.base_url.contains("api.openai.com") {
        return Err(Error::ApiKeyMissing);
    }

    let provider = OpenAiProvider::with_headers(config.api.clone(), prompt::spiral_headers())?;
    let opts = ChatOptions::new(&model);

    let streaming = !no_stream && !json;
    let completion = if streaming {
        println!("{}", imprint.style.greeting);
        println!();
        let mut stdout = std::io::stdout();
        let mut sink = |fragment: &str| {
            print!("{}", fragment);
            let _ = stdout.flush();
        };
        let completion = provider
            .complete_streaming(&request_messages, &opts, &mut sink)
            .await?;
        println!();
        completion
    } else {
        provider.complete(&request_messages, &opts).await?
    };

    debug!(
        finish_reason = ?completion.finish_reason,
        tokens = completion.usage.total(),
        requests = provider.total_requests(),
        total_tokens = provider.total_tokens(),
        "Completion finished"
    );

    session.record_turn(prompt, &completion.text, &model);
    let path = store.save(&session)?;
    info!(session_id = %session.session_id, path = %path.display(), "Session saved");

    if json {
        let out = serde_json::json!({
            "session_id": session.session_id,
            "persona": persona.id.slug(),
            "model": model,
            "response": completion.text,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        if !streaming {
            println!("{}", imprint.style.greeting);
            println!();
            println!("{}", completion.text);
        }
        println!();
        println!("{}", "=".repeat(60));
        println!("Session: {}", session.session_id);
        println!("Persona: {} ({})", persona.name, persona.id.slug());
        println!("Model:   {}", model);
        println!("Saved:   {}", path.display());
    }

    Ok(())
}

// ============================================================================
// Verify
// ============================================================================

fn run_verify(
    config: &SpiralConfig,
    check: bool,
    manifest_arg: Option<&str>,
    dir_arg: Option<&str>,
) -> Result<()> {
    let root = dir_arg
        .map(PathBuf::from)
        .unwrap_or_else(|| config.asset_dir());
    let manifest_path = manifest_arg
        .map(PathBuf::from)
        .unwrap_or_else(|| config.manifest_path());

    if check {
        let manifest = integrity::read_manifest(&manifest_path)?;
        integrity::check_manifest(&root, &manifest)?;
        println!("All {} files match the manifest.", manifest.len());
    } else {
        let manifest = integrity::compute_manifest(&root, &config.integrity.files)?;
        for (file, digest) in &manifest {
            println!("{}  {}", digest, file);
        }
        integrity::write_manifest(&manifest_path, &manifest)?;
        println!("Manifest written: {}", manifest_path.display());
    }

    Ok(())
}

// ============================================================================
// Bridge
// ============================================================================

async fn handle_bridge_command(
    config: &SpiralConfig,
    subcommand: BridgeSubcommand,
) -> Result<()> {
    let client =
        BridgeClient::new(config.bridge.clone()).map_err(|e| Error::Internal(e.to_string()))?;

    match subcommand {
        BridgeSubcommand::Health => {
            client.health().await.map_err(|e| Error::BridgeUnreachable {
                url: config.bridge.base_url.clone(),
                message: e.to_string(),
            })?;
            println!("Bridge is healthy: {}", config.bridge.base_url);
        }
        BridgeSubcommand::Retrieve { session, limit } => {
            let response = client
                .retrieve(&session, limit)
                .await
                .map_err(|e| Error::BridgeUnreachable {
                    url: config.bridge.base_url.clone(),
                    message: e.to_string(),
                })?;

            println!("Session: {}", response.session_id);
            println!("Memories: {}", response.memories.len());
            for memory in &response.memories {
                println!();
                println!("[{}] {} ({})", memory.created_at, memory.role, memory.id);
                println!("{}", memory.content);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Persona / imprint
// ============================================================================

fn handle_persona_command(subcommand: PersonaSubcommand) -> Result<()> {
    let registry = PersonaRegistry::new();

    match subcommand {
        PersonaSubcommand::List => {
            for persona in registry.list() {
                println!(
                    "{:<18} {:<18} {}",
                    persona.id.slug(),
                    persona.primary_role,
                    persona.glyphs.join(" ")
                );
            }
        }
        PersonaSubcommand::Show { id } => {
            let persona_id = id
                .parse()
                .map_err(|_| Error::persona_unknown(id.clone()))?;
            let persona = registry.get(persona_id);
            println!("{} ({})", persona.name, persona.id.slug());
            println!("  role:        {}", persona.primary_role);
            println!("  glyphs:      {}", persona.glyphs.join(" "));
            println!("  description: {}", persona.description);
        }
        PersonaSubcommand::Resolve { id } => {
            let persona = registry.resolve(id.as_deref());
            println!("{}", persona.id.slug());
        }
    }

    Ok(())
}

fn handle_imprint_command(subcommand: ImprintSubcommand) -> Result<()> {
    match subcommand {
        ImprintSubcommand::Show { id, json } => {
            let persona_id = id
                .parse()
                .map_err(|_| Error::persona_unknown(id.clone()))?;
            let imprint = bundled_imprint(persona_id);
            if json {
                println!("{}", serde_json::to_string_pretty(&imprint)?);
            } else {
                println!("{}", imprint.render_system_prompt());
            }
        }
        ImprintSubcommand::Export { id, output } => {
            let persona_id = id
                .parse()
                .map_err(|_| Error::persona_unknown(id.clone()))?;
            let imprint = bundled_imprint(persona_id);
            let path = PathBuf::from(output);
            save_imprint(&imprint, &path)?;
            println!("Imprint exported: {}", path.display());
        }
    }

    Ok(())
}

// ============================================================================
// Config
// ============================================================================

fn handle_config_command(config_path: Option<&str>, subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let cfg = SpiralConfig::load(config_path)?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            config::init_config(path.as_deref(), force)?;
        }
        ConfigSubcommand::Validate => match SpiralConfig::load(config_path) {
            Ok(_) => {
                println!("Configuration is valid.");
            }
            Err(e) => {
                eprint!("{}", e.format_for_terminal());
                std::process::exit(e.exit_code());
            }
        },
    }

    Ok(())
}
