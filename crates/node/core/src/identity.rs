//! Node identity.
//!
//! The identity is a secp256k1 key. Its public key is the [`NodeId`]
//! advertised to peers and written into enode URLs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use alloy_signer::k256::ecdsa::SigningKey;
use alloy_signer_local::LocalSigner;
use hearth_net_peer::{NodeId, node_id_from_key};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("failed to read node key {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("node key is not valid hex")]
    InvalidHex,
    #[error("node key is not a valid secp256k1 scalar")]
    InvalidKey,
}

/// Signing credentials of this node.
#[derive(Clone)]
pub struct NodeIdentity {
    signer: LocalSigner<SigningKey>,
    id: NodeId,
}

impl std::fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl NodeIdentity {
    /// Create an ephemeral identity.
    pub fn random() -> Self {
        Self::from_signer(LocalSigner::random())
    }

    pub fn from_signing_key(key: SigningKey) -> Self {
        Self::from_signer(LocalSigner::from_signing_key(key))
    }

    fn from_signer(signer: LocalSigner<SigningKey>) -> Self {
        let id = node_id_from_key(signer.credential().verifying_key());
        Self { signer, id }
    }

    /// Read a hex-encoded key (optionally `0x`-prefixed) from `path`.
    pub fn from_key_file(path: &Path) -> Result<Self, IdentityError> {
        let text = fs::read_to_string(path).map_err(|source| IdentityError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = text.trim();
        let bytes = hex::decode(text.strip_prefix("0x").unwrap_or(text))
            .map_err(|_| IdentityError::InvalidHex)?;
        let key = SigningKey::from_slice(&bytes).map_err(|_| IdentityError::InvalidKey)?;
        Ok(Self::from_signing_key(key))
    }

    /// Load the key at `path`, or generate an ephemeral one when unset.
    pub fn load(path: Option<&Path>) -> Result<Self, IdentityError> {
        match path {
            Some(path) => Self::from_key_file(path),
            None => {
                let identity = Self::random();
                info!(id = %identity.id, "Generated ephemeral node key");
                Ok(identity)
            }
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &LocalSigner<SigningKey> {
        &self.signer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_load_from_hex_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodekey");
        fs::write(&path, format!("0x{}\n", "11".repeat(32))).unwrap();

        let identity = NodeIdentity::load(Some(&path)).unwrap();
        let expected =
            NodeIdentity::from_signing_key(SigningKey::from_slice(&[0x11; 32]).unwrap());
        assert_eq!(identity.id(), expected.id());
        assert_eq!(identity.address(), expected.address());
    }

    #[test]
    fn test_invalid_key_files() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("not-hex");
        fs::write(&path, "zz").unwrap();
        assert_matches!(NodeIdentity::from_key_file(&path), Err(IdentityError::InvalidHex));

        let path = dir.path().join("zero");
        fs::write(&path, "00".repeat(32)).unwrap();
        assert_matches!(NodeIdentity::from_key_file(&path), Err(IdentityError::InvalidKey));

        assert_matches!(
            NodeIdentity::from_key_file(&dir.path().join("missing")),
            Err(IdentityError::Read { .. })
        );
    }

    #[test]
    fn test_random_identities_differ() {
        assert_ne!(NodeIdentity::load(None).unwrap().id(), NodeIdentity::random().id());
    }
}
