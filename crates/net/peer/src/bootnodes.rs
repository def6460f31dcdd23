//! Bootnode list loading.
//!
//! A bootnode source is a text file with one enode URL per line. Blank lines
//! and `#` comments are ignored. Malformed lines are reported and skipped;
//! only failing to read the source at all is an error.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use metrics::Counter;
use tracing::{debug, warn};

use crate::{BootnodeSourceError, PeerEndpoint, PeerParseError};

/// A rejected line of a bootnode source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEntry {
    /// 1-based line number.
    pub line: usize,
    /// The offending text, trimmed.
    pub text: String,
    /// Why it was rejected.
    pub error: PeerParseError,
}

#[derive(Clone, Debug)]
struct BootnodeMetrics {
    parsed_total: Counter,
    rejected_total: Counter,
}

impl Default for BootnodeMetrics {
    fn default() -> Self {
        Self {
            parsed_total: metrics::counter!("bootnodes.parsed_total"),
            rejected_total: metrics::counter!("bootnodes.rejected_total"),
        }
    }
}

/// Validated, deduplicated bootnodes in source order.
#[derive(Debug, Clone, Default)]
pub struct BootnodeList {
    endpoints: Vec<PeerEndpoint>,
    rejected: Vec<MalformedEntry>,
}

impl BootnodeList {
    /// Load the bootnode file at `path`.
    pub fn load(path: &Path) -> Result<Self, BootnodeSourceError> {
        if path.as_os_str().is_empty() {
            return Err(BootnodeSourceError::Unset);
        }

        let open_err = |source| BootnodeSourceError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        Self::parse(BufReader::new(file)).map_err(open_err)
    }

    /// Parse bootnodes from any line-oriented reader.
    ///
    /// Only I/O failures are returned as errors. A line that is not valid
    /// UTF-8 is rejected like any other malformed entry.
    pub fn parse<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let metrics = BootnodeMetrics::default();
        let mut list = Self::default();
        let mut seen = HashSet::new();

        for (index, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            let decoded = std::str::from_utf8(&line);
            let lossy;
            let text = match decoded {
                Ok(text) => text.trim(),
                Err(_) => {
                    lossy = String::from_utf8_lossy(&line);
                    lossy.trim()
                }
            };
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let parsed = decoded
                .map_err(|_| PeerParseError::InvalidUtf8)
                .and_then(|_| text.parse::<PeerEndpoint>())
                .and_then(|endpoint| {
                    if seen.insert(*endpoint.id()) {
                        Ok(endpoint)
                    } else {
                        Err(PeerParseError::Duplicate(*endpoint.id()))
                    }
                });

            match parsed {
                Ok(endpoint) => {
                    debug!(node_url = %endpoint, "added bootstrap node");
                    metrics.parsed_total.increment(1);
                    list.endpoints.push(endpoint);
                }
                Err(error) => {
                    warn!(line = index + 1, node_url = text, %error, "skipping bootstrap node");
                    metrics.rejected_total.increment(1);
                    list.rejected.push(MalformedEntry {
                        line: index + 1,
                        text: text.to_string(),
                        error,
                    });
                }
            }
        }

        Ok(list)
    }

    pub fn endpoints(&self) -> &[PeerEndpoint] {
        &self.endpoints
    }

    /// Lines that were skipped, one per warning emitted.
    pub fn rejected(&self) -> &[MalformedEntry] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn into_endpoints(self) -> Vec<PeerEndpoint> {
        self.endpoints
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use alloy_signer::k256::ecdsa::SigningKey;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;
    use crate::node_id_from_key;

    fn enode(seed: u8, port: u16) -> String {
        let key = SigningKey::from_slice(&[seed; 32]).unwrap();
        let id = node_id_from_key(key.verifying_key());
        format!("enode://{}@127.0.0.1:{port}", hex::encode(id))
    }

    const MALFORMED: &[&str] = &[
        "enode://deadbeef@127.0.0.1:30303",
        "http://example.org",
        "enode://",
        "not a node at all",
    ];

    #[test]
    fn test_skips_malformed_and_keeps_order() {
        let source = format!(
            "{}\n\n{}\n# comment\n{}\n{}\n",
            enode(1, 30301),
            MALFORMED[0],
            enode(2, 30302),
            enode(3, 30303),
        );
        let list = BootnodeList::parse(Cursor::new(source)).unwrap();

        let ports: Vec<_> = list.endpoints().iter().map(|e| e.tcp_port()).collect();
        assert_eq!(ports, vec![30301, 30302, 30303]);
        assert_eq!(list.rejected().len(), 1);
        assert_eq!(list.rejected()[0].line, 3);
        assert_matches!(list.rejected()[0].error, PeerParseError::InvalidNodeId);
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let source = format!("{}\n{}\n", enode(7, 1000), enode(7, 2000));
        let list = BootnodeList::parse(Cursor::new(source)).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list.endpoints()[0].tcp_port(), 1000);
        assert_matches!(list.rejected()[0].error, PeerParseError::Duplicate(_));
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut source = format!("{}\n", enode(1, 30301)).into_bytes();
        source.extend_from_slice(b"enode://\xff\xfe@1.2.3.4:1\r\n");
        source.extend_from_slice(format!("{}\n", enode(2, 30302)).as_bytes());

        let list = BootnodeList::parse(Cursor::new(source)).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.rejected().len(), 1);
        assert_eq!(list.rejected()[0].line, 2);
        assert_matches!(list.rejected()[0].error, PeerParseError::InvalidUtf8);
    }

    #[test]
    fn test_load_unset_path() {
        assert_matches!(
            BootnodeList::load(Path::new("")),
            Err(BootnodeSourceError::Unset)
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        assert_matches!(
            BootnodeList::load(&path),
            Err(BootnodeSourceError::Open { path: p, .. }) if p == path
        );
    }

    #[test]
    fn test_load_file_with_truncated_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let truncated = &enode(4, 30304)[..40];
        writeln!(file, "{}\n{}\n{}\n{}", enode(1, 1), enode(2, 2), truncated, enode(3, 3)).unwrap();

        let list = BootnodeList::load(file.path()).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.rejected().len(), 1);
    }

    proptest! {
        #[test]
        fn test_returns_exactly_the_well_formed_lines(
            layout in proptest::collection::vec(any::<Option<u8>>(), 0..24)
        ) {
            // `Some(_)` is a well-formed line with a distinct key, `None` a malformed one.
            let mut lines = Vec::new();
            let mut expected_ports = Vec::new();
            let mut malformed = 0;
            for (index, slot) in layout.iter().enumerate() {
                match slot {
                    Some(_) => {
                        let port = 1000 + index as u16;
                        lines.push(enode(index as u8 + 1, port));
                        expected_ports.push(port);
                    }
                    None => {
                        lines.push(MALFORMED[index % MALFORMED.len()].to_string());
                        malformed += 1;
                    }
                }
            }

            let list = BootnodeList::parse(Cursor::new(lines.join("\n"))).unwrap();
            let ports: Vec<_> = list.endpoints().iter().map(|e| e.tcp_port()).collect();

            prop_assert_eq!(ports, expected_ports);
            prop_assert_eq!(list.rejected().len(), malformed);
        }
    }
}
