//! Address Remap Table
//!
//! Rules of the textual form `host:port to host:port` silently redirect
//! a requested destination to a substitute one. Redirecting literal-IP
//! destinations (not just hostnames) lets a test verify traffic actually
//! traversed the proxy: dialing the literal directly would otherwise
//! behave identically with or without it.

use crate::error::{ProxyError, Result};
use crate::protocol::Endpoint;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;
use std::net::IpAddr;
use tokio::net::lookup_host;
use tracing::debug;

// `SRC to DST`, each side `host:port`; a bracketed host may embed colons
// (IPv6 literals). Anchored at both ends.
static RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\[([^\[\]]+)\]|([^\[\]:\s]+)):(\d{1,5}) to (?:\[([^\[\]]+)\]|([^\[\]:\s]+)):(\d{1,5})$",
    )
    .expect("rule grammar regex is valid")
});

/// A single `source to destination` redirection.
#[derive(Debug, Clone)]
pub struct RemapRule {
    pub source: Endpoint,
    pub destination: Endpoint,
}

impl fmt::Display for RemapRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.source, self.destination)
    }
}

/// Parse one remap rule. Any deviation from the grammar, including a
/// port outside the u16 range, is a [`ProxyError::RuleFormat`].
pub fn parse(rule_text: &str) -> Result<RemapRule> {
    let caps = RULE_RE
        .captures(rule_text)
        .ok_or_else(|| ProxyError::RuleFormat(rule_text.to_string()))?;

    let source = Endpoint::new(capture_host(&caps, 1, 2), capture_port(&caps, 3, rule_text)?);
    let destination = Endpoint::new(capture_host(&caps, 4, 5), capture_port(&caps, 6, rule_text)?);
    Ok(RemapRule {
        source,
        destination,
    })
}

// One of the two host alternations always matched when the regex did.
fn capture_host(caps: &Captures<'_>, bracketed: usize, plain: usize) -> String {
    caps.get(bracketed)
        .or_else(|| caps.get(plain))
        .map_or_else(String::new, |m| m.as_str().to_string())
}

fn capture_port(caps: &Captures<'_>, group: usize, rule_text: &str) -> Result<u16> {
    caps[group]
        .parse::<u16>()
        .map_err(|_| ProxyError::RuleFormat(rule_text.to_string()))
}

/// Ordered, first-match-wins remap rules, fixed after startup and shared
/// read-only across all connections.
#[derive(Debug, Default)]
pub struct RemapTable {
    rules: Vec<RemapRule>,
}

impl RemapTable {
    /// Parse every rule, then expand hostname sources with resolved
    /// IP-literal equivalents: each newly discovered literal address
    /// gets one synthetic rule pointing at the original destination,
    /// appended after the explicit rules. Resolution failures skip the
    /// expansion for that rule only; a parse failure aborts the build.
    pub async fn build(rule_texts: &[String]) -> Result<Self> {
        let mut rules = Vec::with_capacity(rule_texts.len());
        for text in rule_texts {
            rules.push(parse(text)?);
        }

        let mut expanded: Vec<RemapRule> = Vec::new();
        for rule in &rules {
            if rule.source.host.parse::<IpAddr>().is_ok() {
                continue;
            }
            let addrs = match lookup_host((rule.source.host.as_str(), rule.source.port)).await {
                Ok(addrs) => addrs,
                Err(e) => {
                    debug!("skipping DNS expansion of {}: {}", rule.source, e);
                    continue;
                }
            };
            for addr in addrs {
                let source = Endpoint::from_ip(addr.ip(), rule.source.port);
                let already_known = rules
                    .iter()
                    .chain(expanded.iter())
                    .any(|known| known.source == source);
                if already_known {
                    continue;
                }
                debug!("expanded {} with literal source {}", rule, source);
                expanded.push(RemapRule {
                    source,
                    destination: rule.destination.clone(),
                });
            }
        }
        rules.extend(expanded);

        Ok(Self { rules })
    }

    /// Destination of the first rule whose source exactly equals the
    /// input, or the input unchanged when nothing matches. Consulted
    /// once per accepted connection.
    pub fn remap(&self, endpoint: &Endpoint) -> Endpoint {
        for rule in &self.rules {
            if rule.source == *endpoint {
                return rule.destination.clone();
            }
        }
        endpoint.clone()
    }

    /// Number of rules, synthetic expansions included.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
