use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const TEST_PING: &str = "test.ping";
pub const PILLAR_GET: &str = "pillar.get";
pub const CMD_RUN: &str = "cmd.run";

const LOCAL_CLIENT: &str = "local";
const GLOB_TARGET: &str = "glob";
const GRAIN_TARGET: &str = "grain";
const ALL_MINIONS: &str = "*";
const ROLES_GRAIN: &str = "roles";

/// Topology expression selecting minions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every minion.
    All,
    /// Minions whose grains match `<grain>:<value>`, e.g. `services:etcd`.
    Grain(String),
    /// Minions carrying the named role in their `roles` grain.
    Role(String),
    /// Minions whose id matches the glob, e.g. a single fully qualified host.
    Host(String),
}

impl Selector {
    pub fn grain(expr: impl Into<String>) -> Self {
        Self::Grain(expr.into())
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self::Role(name.into())
    }

    pub fn host(id: impl Into<String>) -> Self {
        Self::Host(id.into())
    }

    /// salt `(tgt, tgt_type)` for the selector.
    pub fn target(&self) -> (String, &'static str) {
        match self {
            Self::All => (ALL_MINIONS.to_string(), GLOB_TARGET),
            Self::Grain(expr) => (expr.clone(), GRAIN_TARGET),
            Self::Role(name) => (format!("{ROLES_GRAIN}:{name}"), GRAIN_TARGET),
            Self::Host(id) => (id.clone(), GLOB_TARGET),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (tgt, tgt_type) = self.target();
        write!(f, "{tgt_type}:{tgt}")
    }
}

/// A salt-api lowstate chunk executed through the `local` client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct LowState {
    pub client: &'static str,
    pub tgt: String,
    pub tgt_type: &'static str,
    pub fun: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arg: Vec<String>,
}

impl LowState {
    pub fn new(selector: &Selector, fun: &'static str, arg: Vec<String>) -> Self {
        let (tgt, tgt_type) = selector.target();
        Self { client: LOCAL_CLIENT, tgt, tgt_type, fun, arg }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub eauth: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaltReturn<T> {
    #[serde(rename = "return", default = "Vec::default")]
    pub returns: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginReturn {
    pub token: String,
    #[serde(default)]
    pub expire: Option<f64>,
}

/// Per-minion results of one lowstate call.
pub(crate) type MinionReturns = BTreeMap<String, serde_json::Value>;
