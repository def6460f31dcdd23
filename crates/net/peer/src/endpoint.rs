//! Peer endpoints in enode URL form.
//!
//! ```text
//! enode://<128 hex chars>@<ip>:<tcp port>[?discport=<udp port>]
//! ```

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use alloy_primitives::B512;
use alloy_signer::k256::{PublicKey, ecdsa::VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::PeerParseError;

/// URL scheme of a peer endpoint.
pub const ENODE_SCHEME: &str = "enode";

/// Node identity: the 64-byte uncompressed secp256k1 public key without the
/// SEC1 `0x04` prefix.
pub type NodeId = B512;

/// Derive the [`NodeId`] of a secp256k1 verifying key.
pub fn node_id_from_key(key: &VerifyingKey) -> NodeId {
    let point = key.to_encoded_point(false);
    NodeId::from_slice(point.as_bytes().get(1..).unwrap_or(&[0u8; 64]))
}

/// A well-formed, dialable peer endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerEndpoint {
    id: NodeId,
    ip: IpAddr,
    tcp_port: u16,
    discovery_port: Option<u16>,
}

impl PeerEndpoint {
    /// Create an endpoint. `discovery_port` defaults to the TCP port when `None`.
    pub fn new(id: NodeId, ip: IpAddr, tcp_port: u16, discovery_port: Option<u16>) -> Self {
        Self {
            id,
            ip,
            tcp_port,
            discovery_port,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    /// UDP port used for discovery.
    pub fn udp_port(&self) -> u16 {
        self.discovery_port.unwrap_or(self.tcp_port)
    }

    /// Address to dial for the TCP transport.
    pub fn tcp_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.tcp_port)
    }

    /// Short identity prefix for log lines.
    pub fn short_id(&self) -> String {
        hex::encode(self.id.get(..8).unwrap_or_default())
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ENODE_SCHEME}://{}@{}",
            hex::encode(self.id),
            self.tcp_addr()
        )?;
        match self.discovery_port {
            Some(port) if port != self.tcp_port => write!(f, "?discport={port}"),
            _ => Ok(()),
        }
    }
}

impl FromStr for PeerEndpoint {
    type Err = PeerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((scheme, rest)) = s.split_once("://") else {
            // A bare node ID names a peer but not where to reach it.
            return Err(PeerParseError::Incomplete);
        };
        if scheme != ENODE_SCHEME {
            return Err(PeerParseError::InvalidScheme(scheme.to_string()));
        }

        let Some((id, location)) = rest.split_once('@') else {
            return Err(PeerParseError::Incomplete);
        };
        let id = parse_node_id(id)?;

        let (host_port, query) = match location.split_once('?') {
            Some((host_port, query)) => (host_port, Some(query)),
            None => (location, None),
        };

        let Some((host, port)) = host_port.rsplit_once(':') else {
            return Err(PeerParseError::InvalidPort(String::new()));
        };
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(PeerParseError::Incomplete);
        }
        let ip: IpAddr = host
            .parse()
            .map_err(|_| PeerParseError::InvalidIp(host.to_string()))?;
        let tcp_port: u16 = port
            .parse()
            .map_err(|_| PeerParseError::InvalidPort(port.to_string()))?;

        let mut discovery_port = None;
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if let Some(value) = pair.strip_prefix("discport=") {
                discovery_port = Some(
                    value
                        .parse()
                        .map_err(|_| PeerParseError::InvalidDiscoveryPort(value.to_string()))?,
                );
            }
        }

        Ok(Self::new(id, ip, tcp_port, discovery_port))
    }
}

fn parse_node_id(text: &str) -> Result<NodeId, PeerParseError> {
    let bytes = hex::decode(text).map_err(|_| PeerParseError::InvalidNodeId)?;
    if bytes.len() != NodeId::len_bytes() {
        return Err(PeerParseError::InvalidNodeId);
    }

    let mut sec1 = Vec::with_capacity(bytes.len() + 1);
    sec1.push(0x04);
    sec1.extend_from_slice(&bytes);
    PublicKey::from_sec1_bytes(&sec1).map_err(|_| PeerParseError::NotOnCurve)?;

    Ok(NodeId::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_signer::k256::ecdsa::SigningKey;
    use assert_matches::assert_matches;

    fn test_id(seed: u8) -> NodeId {
        let key = SigningKey::from_slice(&[seed.max(1); 32]).unwrap();
        node_id_from_key(key.verifying_key())
    }

    #[test]
    fn test_parse_complete() {
        let id = test_id(1);
        let url = format!("enode://{}@10.3.58.6:30303?discport=30301", hex::encode(id));
        let endpoint: PeerEndpoint = url.parse().unwrap();

        assert_eq!(endpoint.id(), &id);
        assert_eq!(endpoint.ip(), "10.3.58.6".parse::<IpAddr>().unwrap());
        assert_eq!(endpoint.tcp_port(), 30303);
        assert_eq!(endpoint.udp_port(), 30301);
        assert_eq!(endpoint.to_string(), url);
    }

    #[test]
    fn test_parse_ipv6_without_discport() {
        let id = test_id(2);
        let url = format!("enode://{}@[::1]:30303", hex::encode(id));
        let endpoint: PeerEndpoint = url.parse().unwrap();

        assert!(endpoint.ip().is_ipv6());
        assert_eq!(endpoint.udp_port(), 30303);
        assert_eq!(endpoint.to_string(), url);
    }

    #[test]
    fn test_parse_errors() {
        let id = hex::encode(test_id(3));

        assert_matches!(
            format!("enr://{id}@1.2.3.4:30303").parse::<PeerEndpoint>(),
            Err(PeerParseError::InvalidScheme(s)) if s == "enr"
        );
        assert_matches!(
            format!("enode://{id}").parse::<PeerEndpoint>(),
            Err(PeerParseError::Incomplete)
        );
        assert_matches!(id.parse::<PeerEndpoint>(), Err(PeerParseError::Incomplete));
        assert_matches!(
            "enode://abcd@1.2.3.4:30303".parse::<PeerEndpoint>(),
            Err(PeerParseError::InvalidNodeId)
        );
        assert_matches!(
            format!("enode://{id}@example.org:30303").parse::<PeerEndpoint>(),
            Err(PeerParseError::InvalidIp(_))
        );
        assert_matches!(
            format!("enode://{id}@1.2.3.4:99999").parse::<PeerEndpoint>(),
            Err(PeerParseError::InvalidPort(_))
        );
        assert_matches!(
            format!("enode://{id}@1.2.3.4:30303?discport=x").parse::<PeerEndpoint>(),
            Err(PeerParseError::InvalidDiscoveryPort(_))
        );
    }

    #[test]
    fn test_reject_point_off_curve() {
        let url = format!("enode://{}@1.2.3.4:30303", "01".repeat(64));
        assert_matches!(
            url.parse::<PeerEndpoint>(),
            Err(PeerParseError::NotOnCurve)
        );
    }
}
