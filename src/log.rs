//! Operator log: every line is written in Chinese and English, appended to the
//! log file next to the executable and mirrored to the console via `tracing`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const INIT_LINE: &str = "初始化日志文件... | Initializing log file...";

#[derive(Debug, Clone)]
pub struct BootLog {
    path: PathBuf,
}

impl BootLog {
    /// Truncates the log file and writes the header line.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        fs::write(&path, format!("{}\n", INIT_LINE))?;
        Ok(BootLog { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message_cn: &str, message_en: &str) {
        let line = combine(message_cn, message_en);
        tracing::info!("{}", line);
        self.append(&line);
    }

    /// Same as `info`, but flagged as an error on the console.
    pub fn error(&self, message_cn: &str, message_en: &str) {
        let line = combine(message_cn, message_en);
        tracing::error!("{}", line);
        self.append(&line);
    }

    fn append(&self, line: &str) {
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{}", line));
        if let Err(e) = written {
            tracing::warn!("could not write to {}: {}", self.path.display(), e);
        }
    }
}

fn combine(message_cn: &str, message_en: &str) -> String {
    format!("{} | {}", message_cn, message_en)
}
