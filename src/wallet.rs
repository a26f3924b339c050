//! Wallet loading

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::path::Path;
use std::sync::Arc;

/// Signing wallet shared by the controller and the CLI
#[derive(Clone)]
pub struct WalletManager {
    keypair: Arc<Keypair>,
}

impl WalletManager {
    /// Loads a keypair file, either 64 raw bytes or the solana-keygen JSON array.
    /// A leading `~/` expands to `$HOME`.
    pub fn from_file(path: &str) -> Result<Self> {
        let path = expand_home(path);
        let keypair_bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read keypair file: {}", path.display()))?;

        let secret = if keypair_bytes.len() == 64 {
            keypair_bytes
        } else {
            serde_json::from_slice::<Vec<u8>>(&keypair_bytes)
                .context("Failed to parse keypair JSON")?
        };
        if secret.len() != 64 {
            anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", secret.len());
        }
        if secret.iter().all(|&b| b == 0) {
            anyhow::bail!("Invalid keypair: all-zero key rejected");
        }
        let keypair = Keypair::try_from(secret.as_slice()).context("Invalid keypair bytes")?;

        Ok(Self::from_keypair(keypair))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn keypair_arc(&self) -> Arc<Keypair> {
        Arc::clone(&self.keypair)
    }
}

fn expand_home(path: &str) -> std::path::PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => Path::new(&home).join(rest),
        _ => Path::new(path).to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_json_keypair() {
        let keypair = Keypair::new();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let wallet = WalletManager::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_load_raw_keypair() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&keypair.to_bytes()).unwrap();

        let wallet = WalletManager::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_rejects_zero_key_and_bad_length() {
        let mut zero = tempfile::NamedTempFile::new().unwrap();
        zero.write_all(&[0u8; 64]).unwrap();
        assert!(WalletManager::from_file(zero.path().to_str().unwrap()).is_err());

        let mut short = tempfile::NamedTempFile::new().unwrap();
        short.write_all(b"[1,2,3]").unwrap();
        assert!(WalletManager::from_file(short.path().to_str().unwrap()).is_err());
    }
}
