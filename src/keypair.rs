//! Local SSH key-pair access for the machine folder.
//!
//! The host orchestrator provisions a key pair inside each machine folder.
//! The public half is injected into new instances through the bootstrap
//! script; the private half authenticates the remote command session.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

/// File name of the public key inside the machine folder.
pub const PUBLIC_KEY_FILE: &str = "sshkey.pub";
/// File name of the private key inside the machine folder.
pub const PRIVATE_KEY_FILE: &str = "sshkey";

/// Errors raised while accessing the machine folder key pair.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum KeypairError {
    /// Raised when the key file cannot be read.
    #[error("failed to read key file `{path}`: {message}")]
    Read {
        /// Path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when the key file exists but holds no key material.
    #[error("key file `{path}` is empty")]
    Empty {
        /// Path of the empty file.
        path: String,
    },
}

/// Reads the public key from the machine folder, trimmed of surrounding
/// whitespace.
///
/// # Errors
///
/// Returns [`KeypairError::Read`] when the folder or file cannot be read and
/// [`KeypairError::Empty`] when the file holds only whitespace.
pub fn public_key(machine_folder: &Utf8Path) -> Result<String, KeypairError> {
    let path = machine_folder.join(PUBLIC_KEY_FILE);
    let read_error = |message: String| KeypairError::Read {
        path: path.clone().into_string(),
        message,
    };

    let dir = Dir::open_ambient_dir(machine_folder, ambient_authority())
        .map_err(|err| read_error(err.to_string()))?;
    let content = dir
        .read_to_string(PUBLIC_KEY_FILE)
        .map_err(|err| read_error(err.to_string()))?;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(KeypairError::Empty {
            path: path.into_string(),
        });
    }
    Ok(trimmed.to_owned())
}

/// Returns the private key path used for SSH identity arguments.
#[must_use]
pub fn private_key_path(machine_folder: &Utf8Path) -> Utf8PathBuf {
    machine_folder.join(PRIVATE_KEY_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|path| panic!("temp dir should be utf8: {}", path.display()))
    }

    #[test]
    fn public_key_reads_and_trims_the_file() {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let root = utf8_root(&tmp);
        Dir::open_ambient_dir(&root, ambient_authority())
            .unwrap_or_else(|err| panic!("open temp dir: {err}"))
            .write(PUBLIC_KEY_FILE, "ssh-ed25519 AAAA devpod@host\n")
            .unwrap_or_else(|err| panic!("write key: {err}"));

        let key = public_key(&root).unwrap_or_else(|err| panic!("read key: {err}"));
        assert_eq!(key, "ssh-ed25519 AAAA devpod@host");
    }

    #[test]
    fn public_key_errors_when_the_file_is_missing() {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let root = utf8_root(&tmp);

        let err = public_key(&root).expect_err("missing key must fail");
        assert!(
            matches!(err, KeypairError::Read { ref path, .. } if path.ends_with(PUBLIC_KEY_FILE)),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn public_key_rejects_whitespace_only_files() {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let root = utf8_root(&tmp);
        Dir::open_ambient_dir(&root, ambient_authority())
            .unwrap_or_else(|err| panic!("open temp dir: {err}"))
            .write(PUBLIC_KEY_FILE, "   \n\t")
            .unwrap_or_else(|err| panic!("write key: {err}"));

        let err = public_key(&root).expect_err("empty key must fail");
        assert!(matches!(err, KeypairError::Empty { .. }), "unexpected error: {err}");
    }

    #[test]
    fn private_key_path_joins_the_machine_folder() {
        let path = private_key_path(Utf8Path::new("/machines/abc"));
        assert_eq!(path, Utf8PathBuf::from("/machines/abc/sshkey"));
    }
}
