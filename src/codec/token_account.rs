//! SPL token account (vaults and user balances)

use super::layout::{LayoutReader, LayoutWriter};
use super::DecodeError;
use solana_sdk::pubkey::Pubkey;

/// Base token account size; Token-2022 accounts with extensions are longer
pub const TOKEN_ACCOUNT_LEN: usize = 165;

const ACCOUNT: &str = "token_account";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

impl TokenAccount {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let r = LayoutReader::untagged(ACCOUNT, data, TOKEN_ACCOUNT_LEN)?;
        Ok(Self {
            mint: r.pubkey(0)?,
            owner: r.pubkey(32)?,
            amount: r.u64(64)?,
        })
    }

    /// Encodes an initialized account with no delegate or close authority
    pub fn encode(&self) -> Vec<u8> {
        LayoutWriter::untagged(TOKEN_ACCOUNT_LEN)
            .pubkey(&self.mint)
            .pubkey(&self.owner)
            .u64(self.amount)
            .zeros(36) // delegate option
            .u8(1) // AccountState::Initialized
            .zeros(TOKEN_ACCOUNT_LEN - 109)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let account = TokenAccount {
            mint: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            amount: 42_000_000,
        };
        let bytes = account.encode();
        assert_eq!(bytes.len(), TOKEN_ACCOUNT_LEN);
        assert_eq!(TokenAccount::decode(&bytes).unwrap(), account);
    }

    #[test]
    fn test_token_2022_extension_bytes_ignored() {
        let account = TokenAccount {
            mint: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            amount: 7,
        };
        let mut bytes = account.encode();
        bytes.extend_from_slice(&[2u8; 40]);
        assert_eq!(TokenAccount::decode(&bytes).unwrap().amount, 7);
    }

    #[test]
    fn test_short_buffer() {
        assert!(TokenAccount::decode(&[0u8; 72]).is_err());
    }
}
