use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DcexportConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_true")]
    pub bot: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &mask_secret(&self.token))
            .field("bot", &self.bot)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            bot: true,
            base_url: default_base_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    dcexport_discord::DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,
}

fn default_output_dir() -> String {
    "~/dcexport".to_string()
}

fn default_progress_buffer() -> usize {
    64
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            progress_buffer: default_progress_buffer(),
        }
    }
}

/// Mask a secret string for safe display in Debug output / logs.
/// Shows first 3 and last 4 chars for keys longer than 7 chars, otherwise "***".
pub fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dcexport")
}

impl DcexportConfig {
    /// Load the config file, falling back to defaults when the default
    /// location does not exist. An explicit path must exist.
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = custom_path
            .clone()
            .unwrap_or_else(|| config_dir().join("config.toml"));

        if custom_path.is_none() && !path.exists() {
            let mut config = Self::default();
            config.discord.token = std::env::var("DISCORD_TOKEN").unwrap_or_default();
            return Ok(config);
        }

        // Refuse to read a token from a file others can read
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = std::fs::metadata(&path) {
                let mode = metadata.permissions().mode();
                if mode & 0o077 != 0 {
                    return Err(anyhow::anyhow!(
                        "Config file {:?} has overly permissive permissions ({:o}). \
                         It may contain secrets. Fix with: chmod 600 {:?}",
                        path,
                        mode & 0o777,
                        path
                    ));
                }
            }
        }

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read config at {}. Run `dcexport init` first.",
                path.display()
            )
        })?;

        Self::parse(&content).with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let config: Self = toml::from_str(&expanded)?;

        if !config.discord.token.is_empty() && !content.contains("${DISCORD_TOKEN}") {
            warn!(
                "Discord token is hardcoded in config file. For security, use environment variables: token = \"${{DISCORD_TOKEN}}\""
            );
        }

        Ok(config)
    }

    pub fn output_dir(&self) -> PathBuf {
        shellexpand(&self.export.output_dir)
    }
}

/// Allowlist of environment variable names that may be expanded in config files.
const ALLOWED_ENV_VARS: &[&str] = &["DISCORD_TOKEN", "HOME", "USER"];

fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        let Some(start) = result[pos..].find("${") else {
            break;
        };
        let abs_start = pos + start;
        let Some(end) = result[abs_start..].find('}') else {
            break;
        };
        let var_name = result[abs_start + 2..abs_start + end].to_string();

        if !ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
            warn!(
                "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                var_name
            );
            // Leave the ${VAR} unexpanded so it's obvious
            pos = abs_start + end + 1;
            continue;
        }

        let value = std::env::var(&var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..abs_start],
            value,
            &result[abs_start + end + 1..]
        );
        pos = abs_start + value.len();
    }
    result
}

/// Expand a leading `~/` to the home directory
pub fn shellexpand(s: &str) -> PathBuf {
    if let Some(rest) = s.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "(empty)");
        assert_eq!(mask_secret("short"), "***");
        assert_eq!(mask_secret("MTIzNDU2Nzg5.abc.defgh"), "MTI...efgh");
    }

    #[test]
    fn test_debug_hides_token() {
        let config = DiscordConfig {
            token: "MTIzNDU2Nzg5.abc.defgh".to_string(),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("MTIzNDU2Nzg5.abc.defgh"));
    }

    #[test]
    fn test_expand_skips_unlisted_vars() {
        let input = "path = \"${SOME_UNLISTED_VAR_FOR_TEST}\"";
        assert_eq!(expand_env_vars(input), input);
    }

    #[test]
    fn test_expand_unterminated() {
        let input = "token = \"${DISCORD_TOKEN\"";
        assert_eq!(expand_env_vars(input), input);
    }

    #[test]
    fn test_parse_default_config() {
        let config = DcexportConfig::parse(include_str!("../../../config/default.toml")).unwrap();
        assert!(config.discord.bot);
        assert_eq!(config.discord.base_url, "https://discord.com/api/v10");
        assert_eq!(config.export.progress_buffer, 64);
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = DcexportConfig::parse("").unwrap();
        assert!(config.discord.token.is_empty());
        assert_eq!(config.export.output_dir, "~/dcexport");
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Some(dir.path().join("nope.toml"));
        assert!(DcexportConfig::load(&missing).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_load_rejects_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[export]\noutput_dir = \"/tmp/x\"\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(DcexportConfig::load(&Some(path.clone())).is_err());

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        let config = DcexportConfig::load(&Some(path)).unwrap();
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_shellexpand_plain_path() {
        assert_eq!(shellexpand("/var/out"), PathBuf::from("/var/out"));
    }
}
