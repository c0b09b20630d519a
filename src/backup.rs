//! Backup artifact writer.
//!
//! One file per successfully visited device, holding the raw text of three
//! fixed reports. Output is stored verbatim; parsing it is somebody else's
//! job.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info};

use crate::driver::DeviceSession;
use crate::error::{BackupError, Result};

/// Identity used when the device prompt yields an empty name.
const UNKNOWN_IDENTITY: &str = "unknown";

/// The three reports saved per device with their artifact section headers,
/// in file order. Fixed IOS vocabulary, not parameters.
const REPORTS: [(&str, &str); 3] = [
    ("sh run", "--> show running-configuration:"),
    ("sh vlan", "--> show vlan:"),
    ("sh ver", "--> show version:"),
];

/// Collect the three reports from an open session and write the artifact.
///
/// Enters privileged mode for the duration of the collection and leaves it
/// before writing. The artifact is named from the device's self-reported
/// identity and a timestamp; a filesystem failure maps to
/// [`BackupError::ArtifactWrite`] naming the target path, with no retry.
pub async fn write_backup<S>(session: &mut S, backups_dir: &Path) -> Result<PathBuf>
where
    S: DeviceSession + ?Sized,
{
    session.enter_privileged().await?;

    let prompt = session.find_prompt().await?;
    let identity = identity_from_prompt(&prompt);

    let mut sections = Vec::with_capacity(REPORTS.len());
    for (command, header) in REPORTS {
        debug!("{}: collecting '{}'", identity, command);
        let output = session.execute(command).await?;
        sections.push(format!("{header}\n\n{output}"));
    }

    session.exit_privileged().await?;

    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let path = backups_dir.join(format!("{identity}_{timestamp}.conf"));

    tokio::fs::write(&path, sections.join("\n\n\n"))
        .await
        .map_err(|source| BackupError::ArtifactWrite {
            path: path.clone(),
            source,
        })?;

    info!("saved {}", path.display());
    Ok(path)
}

/// Device identity is whatever the prompt shows, minus the trailing mode
/// delimiter.
fn identity_from_prompt(prompt: &str) -> String {
    let identity = prompt.trim().trim_end_matches(['#', '>']).trim();
    if identity.is_empty() {
        UNKNOWN_IDENTITY.to_string()
    } else {
        identity.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use regex::bytes::Regex;

    use super::*;
    use crate::channel::SessionChannel;
    use crate::error::{ChannelError, Error};

    struct FakeSession {
        prompt: String,
        outputs: HashMap<&'static str, &'static str>,
        privileged: bool,
        executed: Vec<String>,
    }

    impl FakeSession {
        fn new(prompt: &str) -> Self {
            let mut outputs = HashMap::new();
            outputs.insert("sh run", "hostname switch1\ninterface Vlan1\n");
            outputs.insert("sh vlan", "1    default    active\n");
            outputs.insert("sh ver", "Cisco IOS Software, Version 15.0\n");
            Self {
                prompt: prompt.to_string(),
                outputs,
                privileged: false,
                executed: Vec::new(),
            }
        }
    }

    impl SessionChannel for FakeSession {
        async fn find_prompt(&mut self) -> Result<String> {
            Ok(self.prompt.clone())
        }

        async fn send_expect(&mut self, command: &str, _expect: &Regex) -> Result<String> {
            Ok(self.outputs.get(command).copied().unwrap_or_default().to_string())
        }

        async fn read_channel(&mut self) -> Result<String> {
            Err(ChannelError::ReadTimeout(Duration::from_secs(1)).into())
        }

        async fn write_channel(&mut self, _data: &str) -> Result<()> {
            Ok(())
        }
    }

    impl DeviceSession for FakeSession {
        async fn enter_privileged(&mut self) -> Result<()> {
            self.privileged = true;
            Ok(())
        }

        async fn exit_privileged(&mut self) -> Result<()> {
            self.privileged = false;
            Ok(())
        }

        async fn execute(&mut self, command: &str) -> Result<String> {
            assert!(self.privileged, "reports must be collected in enable mode");
            self.executed.push(command.to_string());
            Ok(self.outputs.get(command).copied().unwrap_or_default().to_string())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_artifact_has_three_labeled_sections_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = FakeSession::new("switch1#");

        let path = write_backup(&mut session, dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("switch1_"), "unexpected name {name}");
        assert!(name.ends_with(".conf"));

        let contents = std::fs::read_to_string(&path).unwrap();
        let run = contents.find("--> show running-configuration:").unwrap();
        let vlan = contents.find("--> show vlan:").unwrap();
        let ver = contents.find("--> show version:").unwrap();
        assert!(run < vlan && vlan < ver);
        assert!(contents.contains("hostname switch1"));
        assert!(contents.contains("1    default    active"));
        assert!(contents.contains("Version 15.0"));

        assert_eq!(session.executed, vec!["sh run", "sh vlan", "sh ver"]);
        assert!(!session.privileged, "enable mode must be left before writing");
    }

    #[tokio::test]
    async fn test_empty_prompt_falls_back_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = FakeSession::new("#");

        let path = write_backup(&mut session, dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("unknown_"), "unexpected name {name}");
    }

    #[tokio::test]
    async fn test_write_failure_maps_to_artifact_error() {
        // Use a regular file where a directory is expected.
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut session = FakeSession::new("switch1#");

        let err = write_backup(&mut session, file.path()).await.unwrap_err();
        match err {
            Error::Backup(BackupError::ArtifactWrite { ref path, .. }) => {
                assert!(path.to_string_lossy().contains("switch1_"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_identity_from_prompt() {
        assert_eq!(identity_from_prompt("switch1#"), "switch1");
        assert_eq!(identity_from_prompt("edge-sw.lab>"), "edge-sw.lab");
        assert_eq!(identity_from_prompt("  core# "), "core");
        assert_eq!(identity_from_prompt("#"), "unknown");
        assert_eq!(identity_from_prompt(""), "unknown");
    }
}
