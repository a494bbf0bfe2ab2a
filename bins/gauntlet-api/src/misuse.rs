// Append-only misuse log

use chrono::{SecondsFormat, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug)]
pub struct MisuseLog {
    path: PathBuf,
    // Serialises appends so concurrent reports never interleave
    write_lock: Mutex<()>,
}

impl MisuseLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, name: &str) -> io::Result<()> {
        let line = format_entry(name, &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(name = %name, "Misuse reported");
        Ok(())
    }
}

fn format_entry(name: &str, timestamp: &str) -> String {
    // Names are single-line in the log
    let name = name.replace(['\r', '\n'], " ");
    format!("Cheater: {} - {}\n", name, timestamp)
}
