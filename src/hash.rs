use crate::error::SiltGenericError;
use sha1::{Digest, Sha1};
use std::fmt::{self, Debug, Display, Formatter};
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::str::FromStr;

pub const OID_SIZE: usize = 20;

/// content address of a stored object
#[derive(PartialEq, Eq, Hash, Clone, Ord, PartialOrd, Copy)]
#[repr(transparent)]
pub struct Oid([u8; OID_SIZE]);

impl Oid {
    /// the all-zero hash stands in for "unknown/absent"
    // sha1 can presumably never produce this, and even if it somehow could
    // the collision odds are not worth worrying about
    pub const UNKNOWN: Self = Self([0; OID_SIZE]);

    #[inline]
    pub fn new(bytes: [u8; OID_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; OID_SIZE] {
        &self.0
    }

    #[inline]
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    #[inline]
    pub fn is_known(self) -> bool {
        self != Self::UNKNOWN
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// abbreviated 7 character form used in patch headers
    pub fn short(self) -> String {
        self.to_hex()[0..7].to_owned()
    }
}

impl FromStr for Oid {
    type Err = SiltGenericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end();
        ensure!(s.len() == 2 * OID_SIZE, "creating oid from hex string of incorrect length");
        let mut bytes = [0; OID_SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Oid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        if f.alternate() { write!(f, "{}", &hex[..7]) } else { write!(f, "{}", hex) }
    }
}

/// hash `bytes` framed with the standard `<kind> <size>\0` object header
pub fn hash_object(kind: &str, bytes: &[u8]) -> Oid {
    let mut hasher = Sha1::new();
    let mut header = Vec::with_capacity(32);
    write!(header, "{} {}\0", kind, bytes.len()).expect("write to vec is infallible");
    hasher.update(&header);
    hasher.update(bytes);
    Oid::new(hasher.finalize().into())
}

pub fn hash_blob_bytes(bytes: &[u8]) -> Oid {
    hash_object("blob", bytes)
}

pub fn hash_file(path: &Path) -> std::io::Result<Oid> {
    Ok(hash_blob_bytes(&std::fs::read(path)?))
}

/// symlinks are hashed as the bytes of their target path
pub fn hash_symlink(path: &Path) -> std::io::Result<Oid> {
    let target = std::fs::read_link(path)?;
    Ok(hash_blob_bytes(target.as_os_str().as_bytes()))
}
