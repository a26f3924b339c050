//! Fixed-offset little-endian readers and writers shared by the venue codecs

use super::errors::DecodeError;
use solana_sdk::pubkey::Pubkey;

/// Bounds-checked view over an account buffer.
///
/// Construction validates the minimum length and the leading discriminator, so field
/// reads inside the validated length cannot fail; they still return `Result` rather than
/// index blindly.
pub(crate) struct LayoutReader<'a> {
    account: &'static str,
    data: &'a [u8],
}

impl<'a> LayoutReader<'a> {
    pub(crate) fn new(
        account: &'static str,
        data: &'a [u8],
        min_len: usize,
        discriminator: &[u8; 8],
    ) -> Result<Self, DecodeError> {
        if data.len() < min_len {
            return Err(DecodeError::short_buffer(account, min_len, data.len()));
        }
        if &data[..8] != discriminator {
            return Err(DecodeError::discriminator_mismatch(account, &data[..8]));
        }
        Ok(Self { account, data })
    }

    /// Reader without a discriminator (plain SPL accounts)
    pub(crate) fn untagged(
        account: &'static str,
        data: &'a [u8],
        min_len: usize,
    ) -> Result<Self, DecodeError> {
        if data.len() < min_len {
            return Err(DecodeError::short_buffer(account, min_len, data.len()));
        }
        Ok(Self { account, data })
    }

    fn slice<const N: usize>(&self, offset: usize) -> Result<[u8; N], DecodeError> {
        self.data
            .get(offset..offset + N)
            .and_then(|s| <[u8; N]>::try_from(s).ok())
            .ok_or_else(|| DecodeError::short_buffer(self.account, offset + N, self.data.len()))
    }

    pub(crate) fn u8(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.slice::<1>(offset)?[0])
    }

    pub(crate) fn u16(&self, offset: usize) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.slice::<2>(offset)?))
    }

    pub(crate) fn u64(&self, offset: usize) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.slice::<8>(offset)?))
    }

    pub(crate) fn pubkey(&self, offset: usize) -> Result<Pubkey, DecodeError> {
        Ok(Pubkey::new_from_array(self.slice::<32>(offset)?))
    }

    /// Strict bool: only 0 and 1 are accepted
    pub(crate) fn bool(&self, offset: usize, field: &'static str) -> Result<bool, DecodeError> {
        match self.u8(offset)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::ValueOutOfRange {
                account: self.account,
                field,
                value: other as u64,
            }),
        }
    }
}

/// Append-only little-endian writer, the inverse of [`LayoutReader`]
pub(crate) struct LayoutWriter {
    buf: Vec<u8>,
}

impl LayoutWriter {
    pub(crate) fn with_discriminator(discriminator: &[u8; 8], capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(discriminator);
        Self { buf }
    }

    pub(crate) fn untagged(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub(crate) fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn pubkey(&mut self, v: &Pubkey) -> &mut Self {
        self.buf.extend_from_slice(v.as_ref());
        self
    }

    pub(crate) fn zeros(&mut self, n: usize) -> &mut Self {
        self.buf.resize(self.buf.len() + n, 0);
        self
    }

    pub(crate) fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISC: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    #[test]
    fn test_reader_rejects_short_buffer() {
        let data = [1u8, 2, 3];
        let err = LayoutReader::new("test", &data, 16, &DISC).err().unwrap();
        assert!(matches!(err, DecodeError::BadLayout { .. }));
    }

    #[test]
    fn test_reader_rejects_wrong_discriminator() {
        let data = [0u8; 16];
        let err = LayoutReader::new("test", &data, 16, &DISC).err().unwrap();
        assert!(err.to_string().contains("discriminator"));
    }

    #[test]
    fn test_reader_writer_agree() {
        let key = Pubkey::new_unique();
        let bytes = LayoutWriter::with_discriminator(&DISC, 64)
            .u8(1)
            .u16(0xBEEF)
            .u64(u64::MAX - 1)
            .pubkey(&key)
            .finish();

        let r = LayoutReader::new("test", &bytes, bytes.len(), &DISC).unwrap();
        assert!(r.bool(8, "flag").unwrap());
        assert_eq!(r.u16(9).unwrap(), 0xBEEF);
        assert_eq!(r.u64(11).unwrap(), u64::MAX - 1);
        assert_eq!(r.pubkey(19).unwrap(), key);
        assert!(r.u64(bytes.len()).is_err());
    }

    #[test]
    fn test_strict_bool() {
        let mut bytes = LayoutWriter::with_discriminator(&DISC, 9).u8(2).finish();
        let r = LayoutReader::new("test", &bytes, 9, &DISC).unwrap();
        assert!(matches!(
            r.bool(8, "flag"),
            Err(DecodeError::ValueOutOfRange { value: 2, .. })
        ));
        bytes[8] = 0;
        let r = LayoutReader::new("test", &bytes, 9, &DISC).unwrap();
        assert!(!r.bool(8, "flag").unwrap());
    }
}
