use crate::errors::{BootError, Result};
use std::fs;
use std::path::Path;

/// Credentials of the mining account, read from the two-line key file.
/// Neither value is validated; the node rejects bad ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerKey {
    pub private_key: String,
    pub address: String,
}

impl MinerKey {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| BootError::KeyFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Line 1 is the private key, line 2 the address. Extra lines are ignored.
    pub fn parse(contents: &str) -> Result<Self> {
        let lines: Vec<&str> = contents.lines().collect();
        if lines.len() < 2 {
            return Err(BootError::KeyFileFormat { found: lines.len() });
        }
        Ok(MinerKey {
            private_key: lines[0].trim().to_string(),
            address: lines[1].trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_trims_both_lines() {
        let key = MinerKey::parse("  abc123 \r\n0xDeAdBeef\r\nignored\n").unwrap();
        assert_eq!(key.private_key, "abc123");
        assert_eq!(key.address, "0xDeAdBeef");
    }

    #[test]
    fn single_line_is_rejected() {
        let err = MinerKey::parse("abc123\n").unwrap_err();
        assert!(matches!(err, BootError::KeyFileFormat { found: 1 }));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(MinerKey::parse(""), Err(BootError::KeyFileFormat { found: 0 })));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = MinerKey::read(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, BootError::KeyFileRead { .. }));
    }
}
