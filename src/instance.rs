//! Instance name parsing.
//!
//! AlloyDB instances are addressed by a structured resource name:
//!
//! ```text
//! projects/{project}/locations/{location}/clusters/{cluster}/instances/{instance}
//! ```
//!
//! The prefix ending at `clusters/{cluster}` is the cluster name used when
//! minting client certificates.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConnectorError, Result};

const URI_SHAPE: &str =
    "projects/<project>/locations/<location>/clusters/<cluster>/instances/<instance>";

/// A validated AlloyDB instance resource name.
///
/// Parse one with [`FromStr`]:
///
/// ```
/// use alloydb_connector::InstanceUri;
///
/// let uri: InstanceUri = "projects/p/locations/r/clusters/c/instances/i"
///     .parse()
///     .unwrap();
/// assert_eq!(uri.project(), "p");
/// assert_eq!(uri.cluster_uri(), "projects/p/locations/r/clusters/c");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceUri {
    project: String,
    location: String,
    cluster: String,
    instance: String,
}

impl InstanceUri {
    /// The project segment.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The location (region) segment.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The cluster segment.
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// The instance segment.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// The cluster resource name, i.e. this URI with the
    /// `/instances/{instance}` suffix dropped.
    ///
    /// Client certificates are minted per cluster, not per instance.
    pub fn cluster_uri(&self) -> String {
        format!(
            "projects/{}/locations/{}/clusters/{}",
            self.project, self.location, self.cluster
        )
    }
}

impl fmt::Display for InstanceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/clusters/{}/instances/{}",
            self.project, self.location, self.cluster, self.instance
        )
    }
}

impl FromStr for InstanceUri {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 8 {
            return Err(ConnectorError::invalid_config(format!(
                "invalid instance URI {s:?}: expected {URI_SHAPE}"
            )));
        }

        for (index, literal) in [(0, "projects"), (2, "locations"), (4, "clusters"), (6, "instances")] {
            if parts[index] != literal {
                return Err(ConnectorError::invalid_config(format!(
                    "invalid instance URI {s:?}: expected {URI_SHAPE}"
                )));
            }
        }

        for index in [1, 3, 5, 7] {
            if parts[index].is_empty() {
                return Err(ConnectorError::invalid_config(format!(
                    "invalid instance URI {s:?}: empty segment"
                )));
            }
        }

        Ok(InstanceUri {
            project: parts[1].to_string(),
            location: parts[3].to_string(),
            cluster: parts[5].to_string(),
            instance: parts[7].to_string(),
        })
    }
}
