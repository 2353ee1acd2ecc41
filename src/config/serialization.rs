//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the config as a commented TOML file.
    ///
    /// Unset optional values are written as comments so the file still
    /// documents them.
    pub fn to_toml(&self) -> String {
        let owner = match self.console.owner_id {
            Some(id) => format!("owner_id = {id}"),
            None => "# owner_id = 123456789".to_string(),
        };

        format!(
            r#"# pagetree configuration

# Logging configuration ({env_log} and RUST_LOG env vars override the level)
[logging]
level = "{level}"
# File logging (in addition to stderr)
file_enabled = {file_enabled}
file_dir = "{file_dir}"
file_rotation = "{file_rotation}"  # hourly, daily, never
file_prefix = "{file_prefix}"

# Console demo host
[console]
# Seconds an open modal waits for `submit` ({env_modal} overrides)
modal_timeout_secs = {modal_timeout}
# Only this user may interact with the pages ({env_owner} overrides)
{owner}
channel_id = {channel_id}
message_id = {message_id}
"#,
            env_log = super::ENV_LOG,
            env_modal = super::ENV_MODAL_TIMEOUT,
            env_owner = super::ENV_OWNER,
            level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display().to_string().replace('\\', "/"),
            file_rotation = self.logging.file_rotation.as_str(),
            file_prefix = self.logging.file_prefix,
            modal_timeout = self.console.modal_timeout_secs,
            owner = owner,
            channel_id = self.console.channel_id,
            message_id = self.console.message_id,
        )
    }
}
