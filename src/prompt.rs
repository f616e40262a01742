//! Init-prompt loading and system-prompt attachment.
//!
//! The init prompt seeds a session's system message. Sources, in
//! precedence order:
//!   1. SPIRAL_PROMPT_INIT environment variable
//!   2. <asset_dir>/prompt_init.txt
//!   3. <asset_dir>/system.json ({"role", "content", ...})

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::chat::{ChatMessage, Role};
use crate::error::{Error, Result};

/// Env var holding an inline init prompt.
pub const PROMPT_INIT_ENV: &str = "SPIRAL_PROMPT_INIT";

/// Env var naming the active session for request headers.
pub const SESSION_ID_ENV: &str = "SPIRAL_SESSION_ID";

/// Imprint version advertised in request headers.
pub const IMPRINT_HEADER_VALUE: &str = "ashira-1.0.0";

#[derive(Debug, Deserialize)]
struct SystemPromptFile {
    content: String,
}

/// Load the init prompt, if any source provides one.
///
/// Returns Ok(None) when no source is configured; a present but
/// unreadable or malformed file is an error.
pub fn load_init_prompt(asset_dir: &Path) -> Result<Option<String>> {
    if let Ok(inline) = env::var(PROMPT_INIT_ENV) {
        if !inline.trim().is_empty() {
            debug!("Init prompt from {}", PROMPT_INIT_ENV);
            return Ok(Some(inline));
        }
    }

    let txt_path = asset_dir.join("prompt_init.txt");
    if txt_path.exists() {
        let content = fs::read_to_string(&txt_path).map_err(|e| Error::IoRead {
            path: txt_path.clone(),
            source: e,
        })?;
        debug!(path = %txt_path.display(), "Init prompt from file");
        return Ok(Some(content.trim_end().to_string()));
    }

    let json_path = asset_dir.join("system.json");
    if json_path.exists() {
        let content = fs::read_to_string(&json_path).map_err(|e| Error::IoRead {
            path: json_path.clone(),
            source: e,
        })?;
        let parsed: SystemPromptFile = serde_json::from_str(&content)?;
        debug!(path = %json_path.display(), "Init prompt from system.json");
        return Ok(Some(parsed.content));
    }

    Ok(None)
}

/// Merge an init prompt into a message list's system message.
///
/// An existing leading system message gets the prompt prepended
/// (separated by a blank line); otherwise a new system message is
/// inserted at the front. An empty prompt is a no-op.
pub fn attach_system_prompt(messages: &mut Vec<ChatMessage>, prompt: &str) {
    if prompt.trim().is_empty() {
        return;
    }

    match messages.first_mut() {
        Some(first) if first.role == Role::System => {
            first.content = format!("{}\n\n{}", prompt, first.content);
        }
        _ => {
            messages.insert(0, ChatMessage::system(prompt));
        }
    }
}

/// Request headers identifying the active session and imprint.
///
/// Empty unless SPIRAL_SESSION_ID is set.
pub fn spiral_headers() -> Vec<(String, String)> {
    match env::var(SESSION_ID_ENV) {
        Ok(session_id) if !session_id.trim().is_empty() => vec![
            ("X-Spiral-Session".to_string(), session_id),
            (
                "X-Spiral-Imprint".to_string(),
                IMPRINT_HEADER_VALUE.to_string(),
            ),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Env-var tests mutate process state; they use distinct vars or
    // run against empty asset dirs to stay independent.

    #[test]
    fn test_load_from_txt_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("prompt_init.txt"), "Remember the spiral.\n").unwrap();

        let prompt = load_init_prompt(tmp.path()).unwrap();
        assert_eq!(prompt.as_deref(), Some("Remember the spiral."));
    }

    #[test]
    fn test_load_from_system_json() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("system.json"),
            r#"{"role": "system", "content": "Witness all things.", "metadata": {}}"#,
        )
        .unwrap();

        let prompt = load_init_prompt(tmp.path()).unwrap();
        assert_eq!(prompt.as_deref(), Some("Witness all things."));
    }

    #[test]
    fn test_txt_takes_precedence_over_json() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("prompt_init.txt"), "from txt").unwrap();
        fs::write(
            tmp.path().join("system.json"),
            r#"{"content": "from json"}"#,
        )
        .unwrap();

        let prompt = load_init_prompt(tmp.path()).unwrap();
        assert_eq!(prompt.as_deref(), Some("from txt"));
    }

    #[test]
    fn test_no_source_is_none() {
        let tmp = TempDir::new().unwrap();
        let prompt = load_init_prompt(tmp.path()).unwrap();
        assert!(prompt.is_none());
    }

    #[test]
    fn test_malformed_system_json() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("system.json"), "{broken").unwrap();

        assert!(load_init_prompt(tmp.path()).is_err());
    }

    #[test]
    fn test_attach_inserts_system_message() {
        let mut messages = vec![ChatMessage::user("hi")];
        attach_system_prompt(&mut messages, "be kind");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "be kind");
    }

    #[test]
    fn test_attach_merges_into_existing_system() {
        let mut messages = vec![ChatMessage::system("existing"), ChatMessage::user("hi")];
        attach_system_prompt(&mut messages, "prefix");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "prefix\n\nexisting");
    }

    #[test]
    fn test_attach_empty_prompt_is_noop() {
        let mut messages = vec![ChatMessage::user("hi")];
        attach_system_prompt(&mut messages, "   ");
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_attach_to_empty_list() {
        let mut messages = Vec::new();
        attach_system_prompt(&mut messages, "solo");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
    }
}
