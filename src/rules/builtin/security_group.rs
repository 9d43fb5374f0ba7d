use serde_json::Value;

use crate::error::RuleFailure;
use crate::resource::{ResourceKind, ResourceRecord};
use crate::rules::{Finding, Rule, RuleMetadata, Severity};

/// CIDR blocks that match every address.
const ANY_ADDRESS: &[&str] = &["0.0.0.0/0", "::/0"];

/// Protocol values that admit every port (AWS reports all traffic as `-1`).
const ALL_TRAFFIC: &[&str] = &["-1", "all"];

/// Flags ingress rules that expose one administrative port to the world.
///
/// An ingress entry covers the port when `from_port <= port <= to_port`;
/// a missing `to_port` means a single-port entry. The source may be given
/// as `cidr` or `ipv6_cidr`. An all-traffic entry (`protocol` of `-1`)
/// covers every port. Other entries without a `from_port` are skipped.
pub struct OpenPortRule {
    name: &'static str,
    service: &'static str,
    port: i64,
}

impl OpenPortRule {
    pub const fn new(name: &'static str, service: &'static str, port: i64) -> Self {
        Self {
            name,
            service,
            port,
        }
    }

    /// ssh-open-to-public
    pub const fn ssh() -> Self {
        Self::new("ssh-open-to-public", "SSH", 22)
    }

    /// mongodb-open-to-public
    pub const fn mongodb() -> Self {
        Self::new("mongodb-open-to-public", "MongoDB", 27017)
    }

    fn covers_port(&self, ingress: &Value) -> bool {
        let all_traffic = ingress
            .get("protocol")
            .and_then(Value::as_str)
            .is_some_and(|p| ALL_TRAFFIC.contains(&p));
        if all_traffic {
            return true;
        }

        let Some(from) = ingress.get("from_port").and_then(Value::as_i64) else {
            return false;
        };
        let to = ingress
            .get("to_port")
            .and_then(Value::as_i64)
            .unwrap_or(from);
        from <= self.port && self.port <= to
    }

    fn covers(&self, ingress: &Value) -> Option<&'static str> {
        if !self.covers_port(ingress) {
            return None;
        }

        ["cidr", "ipv6_cidr"]
            .iter()
            .filter_map(|key| ingress.get(*key).and_then(Value::as_str))
            .find_map(|cidr| ANY_ADDRESS.iter().copied().find(|any| *any == cidr))
    }
}

impl Rule for OpenPortRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: self.name.into(),
            kind: ResourceKind::SecurityGroup,
            description: format!("{} (port {}) open to the internet", self.service, self.port),
            default_severity: Severity::Critical,
            remediation: Some(format!(
                "Restrict port {} ingress to known address ranges or a VPN.",
                self.port
            )),
        }
    }

    fn evaluate(&self, record: &ResourceRecord) -> Result<Vec<Finding>, RuleFailure> {
        let Some(ingress_rules) = record.array_field("ingress_rules") else {
            return Ok(vec![]);
        };

        let Some(cidr) = ingress_rules.iter().find_map(|ingress| self.covers(ingress)) else {
            return Ok(vec![]);
        };

        let group = match record.str_field("group_name") {
            Some(name) if !name.is_empty() => format!("{} ({})", record.id, name),
            _ => record.id.clone(),
        };

        Ok(vec![Finding::for_record(
            &self.metadata(),
            record,
            format!(
                "{} (port {}) open to the public ({}) in security group {}",
                self.service, self.port, cidr, group
            ),
        )])
    }
}
