//! Versioned session snapshots.
//!
//! A snapshot is a JSON document carrying the conversation plus a little
//! client metadata. Loading is all-or-nothing: callers get a complete
//! [`ConversationContext`] or an error, never a half-built one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::core::constants::{CLI_VERSION, DEFAULT_TEMPERATURE};
use crate::core::context::ConversationContext;
use crate::core::error::PersistenceError;
use crate::core::message::{Message, Role};

/// Version written by this build.
pub const SCHEMA_VERSION: u64 = 1;

/// Files written before snapshots were versioned carry only `cli_version`.
const LEGACY_SCHEMA_VERSION: u64 = 0;

/// Client-side details recorded next to the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub cli_version: String,
    pub theme: Option<String>,
}

impl SnapshotMetadata {
    pub fn new(theme: Option<String>) -> Self {
        Self {
            created_at: Utc::now(),
            cli_version: CLI_VERSION.to_string(),
            theme,
        }
    }
}

/// On-disk shape of a saved session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub schema_version: u64,
    pub created_at: DateTime<Utc>,
    pub cli_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub history: Vec<Message>,
}

impl SessionSnapshot {
    pub fn capture(context: &ConversationContext, metadata: &SnapshotMetadata) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: metadata.created_at,
            cli_version: metadata.cli_version.clone(),
            theme: metadata.theme.clone(),
            model: context.model().map(str::to_string),
            system_prompt: context.system_prompt().map(str::to_string),
            temperature: context.temperature(),
            history: context.messages().to_vec(),
        }
    }

    pub fn into_context(
        self,
    ) -> Result<(ConversationContext, SnapshotMetadata), PersistenceError> {
        let context = ConversationContext::from_parts(
            self.history,
            self.model,
            self.temperature,
            self.system_prompt,
        )
        .map_err(|err| PersistenceError::Corrupt(err.to_string()))?;
        let metadata = SnapshotMetadata {
            created_at: self.created_at,
            cli_version: self.cli_version,
            theme: self.theme,
        };
        Ok((context, metadata))
    }
}

#[derive(Debug, Deserialize)]
struct LegacySnapshot {
    cli_version: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    system_prompt: Option<String>,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    history: Vec<LegacyMessage>,
}

#[derive(Debug, Deserialize)]
struct LegacyMessage {
    role: String,
    content: String,
    timestamp: String,
}

impl LegacySnapshot {
    fn migrate(self) -> Result<SessionSnapshot, PersistenceError> {
        let history = self
            .history
            .into_iter()
            .map(|entry| {
                let role = Role::try_from(entry.role.as_str())
                    .map_err(|err| PersistenceError::Corrupt(err.to_string()))?;
                let timestamp = parse_legacy_timestamp(&entry.timestamp)?;
                Ok(Message::new(role, entry.content).with_timestamp(timestamp))
            })
            .collect::<Result<Vec<_>, PersistenceError>>()?;

        let created_at = history
            .first()
            .map(|message| message.timestamp)
            .unwrap_or_else(Utc::now);

        Ok(SessionSnapshot {
            schema_version: SCHEMA_VERSION,
            created_at,
            cli_version: self.cli_version,
            theme: None,
            model: self.model.filter(|model| !model.is_empty()),
            system_prompt: self.system_prompt.filter(|prompt| !prompt.is_empty()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            history,
        })
    }
}

/// Legacy files store local wall-clock time without an offset.
fn parse_legacy_timestamp(raw: &str) -> Result<DateTime<Utc>, PersistenceError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| PersistenceError::Corrupt(format!("invalid timestamp '{raw}'")))
}

fn corrupt(err: serde_json::Error) -> PersistenceError {
    PersistenceError::Corrupt(err.to_string())
}

pub fn save(
    context: &ConversationContext,
    metadata: &SnapshotMetadata,
) -> Result<Vec<u8>, PersistenceError> {
    let snapshot = SessionSnapshot::capture(context, metadata);
    serde_json::to_vec_pretty(&snapshot).map_err(corrupt)
}

pub fn load(bytes: &[u8]) -> Result<(ConversationContext, SnapshotMetadata), PersistenceError> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(corrupt)?;
    let object = value
        .as_object()
        .ok_or_else(|| PersistenceError::Corrupt("snapshot is not a JSON object".to_string()))?;

    let version = match object.get("schema_version") {
        Some(raw) => raw.as_u64().ok_or_else(|| {
            PersistenceError::Corrupt(format!("schema_version is not a version number: {raw}"))
        })?,
        None if object.contains_key("cli_version") => LEGACY_SCHEMA_VERSION,
        None => {
            return Err(PersistenceError::Corrupt(
                "missing schema_version".to_string(),
            ))
        }
    };

    let snapshot = match version {
        SCHEMA_VERSION => serde_json::from_value::<SessionSnapshot>(value).map_err(corrupt)?,
        LEGACY_SCHEMA_VERSION => {
            debug!("migrating unversioned session snapshot");
            serde_json::from_value::<LegacySnapshot>(value)
                .map_err(corrupt)?
                .migrate()?
        }
        found => return Err(PersistenceError::SchemaMismatch { found }),
    };

    if snapshot.cli_version != CLI_VERSION {
        warn!(
            saved = %snapshot.cli_version,
            current = CLI_VERSION,
            "session was saved by a different client version"
        );
    }

    snapshot.into_context()
}

pub fn save_to_path(
    context: &ConversationContext,
    metadata: &SnapshotMetadata,
    path: &Path,
) -> Result<(), PersistenceError> {
    let io_error = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let contents = save(context, metadata)?;

    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(io_error)?;
    }

    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .map_err(io_error)?;

    temp_file.write_all(&contents).map_err(io_error)?;
    temp_file.as_file_mut().sync_all().map_err(io_error)?;
    temp_file.persist(path).map_err(|err| io_error(err.error))?;

    info!(path = %path.display(), messages = context.len(), "session saved");
    Ok(())
}

pub fn load_from_path(
    path: &Path,
) -> Result<(ConversationContext, SnapshotMetadata), PersistenceError> {
    let bytes = fs::read(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = load(&bytes)?;
    info!(path = %path.display(), messages = loaded.0.len(), "session loaded");
    Ok(loaded)
}

pub fn default_session_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "matollama", "matollama").map(|dirs| dirs.data_dir().join("sessions"))
}

pub fn default_file_name(now: DateTime<Local>) -> String {
    format!("session_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// A bare file name lives in `session_dir`; anything with a directory
/// component is taken as given, with a leading `~/` expanded.
pub fn resolve_session_path(name: &str, session_dir: &Path) -> PathBuf {
    if let Some(rest) = name.strip_prefix("~/") {
        if let Some(home) = directories::UserDirs::new() {
            return home.home_dir().join(rest);
        }
    }

    let candidate = Path::new(name);
    let has_dir = candidate
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty());
    if has_dir || candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        session_dir.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn terse_context() -> ConversationContext {
        let mut context = ConversationContext::new(Some("qwen3".to_string()));
        context.set_temperature(0.9).unwrap();
        context.set_system_prompt(Some("You are terse.".to_string()));
        context.append(Message::user("2+2?"));
        context.append(Message::assistant(
            "4",
            Some("checking arithmetic".to_string()),
        ));
        context.append(Message::user("thanks"));
        context
    }

    #[test]
    fn save_then_load_reproduces_context() {
        let context = terse_context();
        let metadata = SnapshotMetadata::new(Some("dark".to_string()));

        let bytes = save(&context, &metadata).unwrap();
        let (loaded, loaded_metadata) = load(&bytes).unwrap();

        assert_eq!(loaded, context);
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.temperature(), 0.9);
        assert_eq!(loaded.system_prompt(), Some("You are terse."));
        assert_eq!(
            loaded.messages()[1].thinking.as_deref(),
            Some("checking arithmetic")
        );
        assert_eq!(loaded_metadata, metadata);
    }

    #[test]
    fn snapshot_embeds_schema_version() {
        let bytes = save(&terse_context(), &SnapshotMetadata::new(None)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["cli_version"], CLI_VERSION);
        assert!(value.get("theme").is_none());
        assert_eq!(value["history"][0]["role"], "user");
        assert!(value["history"][0].get("thinking").is_none());
    }

    #[test]
    fn unknown_version_is_rejected_and_live_context_survives() {
        let mut live = terse_context();
        let before = live.clone();

        let bytes = br#"{"schema_version": 7, "created_at": "2024-01-01T00:00:00Z",
            "cli_version": "9.9.9", "temperature": 0.5, "history": []}"#;
        let result = load(bytes);
        assert!(matches!(
            result,
            Err(PersistenceError::SchemaMismatch { found: 7 })
        ));
        if let Ok((context, _)) = result {
            live = context;
        }
        assert_eq!(live, before);
    }

    #[test]
    fn structural_problems_are_corrupt() {
        let cases: [&[u8]; 5] = [
            b"not json",
            b"[1, 2]",
            br#"{"model": "llama3"}"#,
            br#"{"schema_version": 1, "created_at": "2024-01-01T00:00:00Z",
                "cli_version": "1.0.0", "temperature": 0.7,
                "history": [{"role": "tool", "content": "x",
                             "timestamp": "2024-01-01T00:00:00Z"}]}"#,
            br#"{"schema_version": 1, "created_at": "2024-01-01T00:00:00Z",
                "cli_version": "1.0.0", "temperature": 3.5, "history": []}"#,
        ];

        for bytes in cases {
            let err = load(bytes).unwrap_err();
            assert!(
                matches!(err, PersistenceError::Corrupt(_)),
                "expected corrupt for {}, got {err:?}",
                String::from_utf8_lossy(bytes)
            );
        }
    }

    #[test]
    fn unversioned_files_are_migrated() {
        let bytes = br#"{
            "cli_version": "1.0.0",
            "model": "llama3:latest",
            "system_prompt": "",
            "temperature": 0.4,
            "history": [
                {"role": "user", "content": "hi", "timestamp": "2024-05-01T12:30:00.250000"},
                {"role": "assistant", "content": "hello", "timestamp": "2024-05-01T12:30:02"}
            ]
        }"#;

        let (context, metadata) = load(bytes).unwrap();
        assert_eq!(context.model(), Some("llama3:latest"));
        assert_eq!(context.system_prompt(), None);
        assert_eq!(context.temperature(), 0.4);
        assert_eq!(context.len(), 2);
        assert!(context.messages()[1].is_assistant());
        assert_eq!(metadata.cli_version, "1.0.0");
        assert_eq!(metadata.created_at, context.messages()[0].timestamp);
    }

    #[test]
    fn unversioned_file_without_temperature_uses_default() {
        let bytes = br#"{"cli_version": "1.0.0", "model": null, "history": []}"#;
        let (context, _) = load(bytes).unwrap();
        assert_eq!(context.temperature(), DEFAULT_TEMPERATURE);
        assert!(context.is_empty());
    }

    #[test]
    fn unversioned_file_with_bad_timestamp_is_corrupt() {
        let bytes = br#"{"cli_version": "1.0.0", "history": [
            {"role": "user", "content": "hi", "timestamp": "yesterday"}]}"#;
        assert!(matches!(
            load(bytes).unwrap_err(),
            PersistenceError::Corrupt(_)
        ));
    }

    #[test]
    fn files_are_written_atomically_and_read_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("chat.json");
        let context = terse_context();

        save_to_path(&context, &SnapshotMetadata::new(None), &path).unwrap();
        let (loaded, _) = load_from_path(&path).unwrap();
        assert_eq!(loaded, context);

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn missing_file_reports_io_error_with_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("absent.json");
        match load_from_path(&path).unwrap_err() {
            PersistenceError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bare_names_resolve_inside_session_dir() {
        let dir = Path::new("/var/sessions");
        assert_eq!(
            resolve_session_path("chat.json", dir),
            PathBuf::from("/var/sessions/chat.json")
        );
        assert_eq!(
            resolve_session_path("./chat.json", dir),
            PathBuf::from("./chat.json")
        );
        assert_eq!(
            resolve_session_path("/tmp/chat.json", dir),
            PathBuf::from("/tmp/chat.json")
        );
    }

    #[test]
    fn default_file_name_uses_local_timestamp() {
        let when = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(default_file_name(when), "session_20240309_070501.json");
    }
}
