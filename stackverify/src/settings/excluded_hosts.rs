use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};

/// Short hostnames left out of per-host checks.
///
/// Membership is exact: excluding `node1` does not exclude `node10`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExcludedHosts(BTreeSet<String>);

impl ExcludedHosts {
    /// Parses a comma and/or whitespace delimited host list. Empty entries are ignored and fully
    /// qualified minion ids are reduced to their short hostname.
    pub fn parse(rep: &str) -> Self {
        rep.split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .collect()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.0.contains(host)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ExcludedHosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(","))
    }
}

impl<S: Into<String>> FromIterator<S> for ExcludedHosts {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .map(|host: String| crate::short_hostname(host.as_str()).to_string())
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for ExcludedHosts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Rep {
            Delimited(String),
            List(Vec<String>),
        }

        let hosts = match Rep::deserialize(deserializer)? {
            Rep::Delimited(rep) => Self::parse(rep.as_str()),
            Rep::List(hosts) => hosts.iter().flat_map(|h| Self::parse(h).0).collect(),
        };

        Ok(hosts)
    }
}
