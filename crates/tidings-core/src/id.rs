use snafu::{ResultExt as _, Snafu};

use crate::macros::define_id;

pub(crate) const ID_LEN: usize = 16;

#[derive(Debug, Snafu)]
pub enum IdParseError {
    #[snafu(display("Not valid base32: {source}"))]
    Encoding { source: data_encoding::DecodeError },
    #[snafu(display("Expected {ID_LEN} bytes, got {len}"))]
    Length { len: usize },
}

pub(crate) fn decode_id(s: &str) -> Result<[u8; ID_LEN], IdParseError> {
    let bytes = data_encoding::BASE32_NOPAD
        .decode(s.as_bytes())
        .context(EncodingSnafu)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| IdParseError::Length { len })
}

define_id!(
    /// Opaque identifier of an account
    ///
    /// Issued by whatever authenticates the caller; we never interpret it
    /// beyond equality and ordering.
    AccountId
);

define_id!(
    /// Identifier of a post
    ///
    /// Also the secondary sort key of the feed, so posts sharing a
    /// publication time still come out in a stable order.
    PostId
);
