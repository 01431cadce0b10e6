//! Tor-compatible key persistence.
//!
//! Each mined address is written as the triple of files the Tor daemon
//! expects in a hidden-service directory:
//!
//! - `hs_ed25519_public_key`: 32-byte header + 32-byte public key
//! - `hs_ed25519_secret_key`: 32-byte header + 64-byte expanded secret key
//! - `hostname`: the `.onion` hostname, no trailing newline
//!
//! The containing directory is created with mode 0700 and the files with
//! mode 0600, as Tor requires.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::crypto::{KeyError, KeyPair, OnionAddress, PUBLIC_KEY_LEN, SECRET_KEY_LEN};

const PUBLIC_KEY_FILE: &str = "hs_ed25519_public_key";
const SECRET_KEY_FILE: &str = "hs_ed25519_secret_key";
const HOSTNAME_FILE: &str = "hostname";

const PUBLIC_KEY_HEADER: &[u8] = b"== ed25519v1-public: type0 ==\x00\x00\x00";
const SECRET_KEY_HEADER: &[u8] = b"== ed25519v1-secret: type0 ==\x00\x00\x00";

const DIR_MODE: u32 = 0o700;
const FILE_MODE: u32 = 0o600;

/// Errors produced by saving and loading hidden-service directories.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("key file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} has the wrong length: expected {} bytes, got {}", .path.display(), .expected, .actual)]
    WrongLength {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("{} has a malformed header", .path.display())]
    BadHeader { path: PathBuf },

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Writes `address` under `dir/<hostname>.onion/` and returns that path.
///
/// An existing service directory is reused; its files are overwritten.
/// Partial writes on error may leave the directory incomplete.
pub fn save(dir: &Path, address: &OnionAddress) -> Result<PathBuf, StorageError> {
    let hostname = address.hostname_string();
    let target = dir.join(&hostname);

    create_private_dir(&target).map_err(|source| StorageError::Io {
        path: target.clone(),
        source,
    })?;

    let key_pair = address.key_pair();

    let mut public = Vec::with_capacity(PUBLIC_KEY_HEADER.len() + PUBLIC_KEY_LEN);
    public.extend_from_slice(PUBLIC_KEY_HEADER);
    public.extend_from_slice(key_pair.public_key());
    write_private_file(&target.join(PUBLIC_KEY_FILE), &public)?;

    let mut secret = Vec::with_capacity(SECRET_KEY_HEADER.len() + SECRET_KEY_LEN);
    secret.extend_from_slice(SECRET_KEY_HEADER);
    secret.extend_from_slice(key_pair.secret_key());
    write_private_file(&target.join(SECRET_KEY_FILE), &secret)?;

    write_private_file(&target.join(HOSTNAME_FILE), hostname.as_bytes())?;

    Ok(target)
}

/// Reads a hidden-service directory back into an [`OnionAddress`].
///
/// Both key files are length- and header-checked, and the public key must
/// match the one derived from the secret key.
pub fn load(dir: &Path) -> Result<OnionAddress, StorageError> {
    let public = read_key_file(
        &dir.join(PUBLIC_KEY_FILE),
        PUBLIC_KEY_HEADER,
        PUBLIC_KEY_LEN,
    )?;
    let secret = read_key_file(
        &dir.join(SECRET_KEY_FILE),
        SECRET_KEY_HEADER,
        SECRET_KEY_LEN,
    )?;

    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    public_key.copy_from_slice(&public);
    let mut secret_key = [0u8; SECRET_KEY_LEN];
    secret_key.copy_from_slice(&secret);

    let key_pair = KeyPair::from_parts(public_key, secret_key);
    key_pair.validate()?;

    Ok(OnionAddress::new(key_pair))
}

fn read_key_file(path: &Path, header: &[u8], key_len: usize) -> Result<Vec<u8>, StorageError> {
    let data = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let expected = header.len() + key_len;
    if data.len() != expected {
        return Err(StorageError::WrongLength {
            path: path.to_path_buf(),
            expected,
            actual: data.len(),
        });
    }

    if !data.starts_with(header) {
        return Err(StorageError::BadHeader {
            path: path.to_path_buf(),
        });
    }

    Ok(data[header.len()..].to_vec())
}

fn create_private_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }

    builder.create(path)
}

fn write_private_file(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = options.open(path).map_err(io_err)?;
    file.write_all(data).map_err(io_err)
}
