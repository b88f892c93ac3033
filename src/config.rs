/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Per-PDU OID ceiling carried from the source agent's behavior. `snmp2`
/// does not itself need this bound: every request this crate issues carries
/// a single OID or a single bulk root.
pub const MAX_OIDS: i32 = i32::MAX;

const DEFAULT_PORT: u16 = 161;

fn resolve_port(port: u16) -> u16 {
    if port == 0 {
        DEFAULT_PORT
    } else {
        port
    }
}

/// Construction parameters for a session, one variant per SNMP version.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "version", rename_all = "lowercase")]
pub enum SessionParams {
    V1(CommunityParams),
    V2c(CommunityParams),
    V3(UsmParams),
}

impl SessionParams {
    pub fn host_name(&self) -> &str {
        match self {
            SessionParams::V1(p) | SessionParams::V2c(p) => &p.host_name,
            SessionParams::V3(p) => &p.host_name,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            SessionParams::V1(p) | SessionParams::V2c(p) => p.port,
            SessionParams::V3(p) => p.port,
        }
    }

    pub fn retries(&self) -> u64 {
        match self {
            SessionParams::V1(p) | SessionParams::V2c(p) => p.retries,
            SessionParams::V3(p) => p.retries,
        }
    }

    pub fn timeout_secs(&self) -> f64 {
        match self {
            SessionParams::V1(p) | SessionParams::V2c(p) => p.timeout,
            SessionParams::V3(p) => p.timeout,
        }
    }

    pub fn is_v1(&self) -> bool {
        matches!(self, SessionParams::V1(_))
    }

    pub fn is_v3(&self) -> bool {
        matches!(self, SessionParams::V3(_))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CommunityParams {
    pub host_name: String,
    #[serde(default)]
    pub port: u16,
    pub community: String,
    pub timeout: f64,
    pub retries: u64,
}

impl CommunityParams {
    pub fn new(
        host_name: impl Into<String>,
        port: u16,
        community: impl Into<String>,
        timeout: f64,
        retries: u64,
    ) -> Self {
        CommunityParams {
            host_name: host_name.into(),
            port: resolve_port(port),
            community: community.into(),
            timeout,
            retries,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UsmParams {
    pub host_name: String,
    #[serde(default)]
    pub port: u16,
    pub context_name: String,
    pub security_username: String,
    pub privacy_password: String,
    pub auth_password: String,
    pub security_level: SecurityLevel,
    pub auth_protocol: AuthProtocol,
    pub privacy_protocol: PrivacyProtocol,
    pub timeout: f64,
    pub retries: u64,
}

#[allow(clippy::too_many_arguments)]
impl UsmParams {
    pub fn new(
        host_name: impl Into<String>,
        port: u16,
        context_name: impl Into<String>,
        security_username: impl Into<String>,
        privacy_password: impl Into<String>,
        auth_password: impl Into<String>,
        security_level: &str,
        auth_protocol: &str,
        privacy_protocol: &str,
        timeout: f64,
        retries: u64,
    ) -> Self {
        let auth_protocol: AuthProtocol = auth_protocol.parse().unwrap_or_default();
        let privacy_protocol: PrivacyProtocol = privacy_protocol.parse().unwrap_or_default();
        let auth_password = match auth_protocol {
            AuthProtocol::NoAuth => String::new(),
            _ => auth_password.into(),
        };
        let privacy_password = match privacy_protocol {
            PrivacyProtocol::NoPriv => String::new(),
            _ => privacy_password.into(),
        };
        UsmParams {
            host_name: host_name.into(),
            port: resolve_port(port),
            context_name: context_name.into(),
            security_username: security_username.into(),
            privacy_password,
            auth_password,
            security_level: security_level.parse().unwrap_or_default(),
            auth_protocol,
            privacy_protocol,
            timeout,
            retries,
        }
    }
}

/// Case-insensitive per §6; defaults to `NoAuthNoPriv` on unrecognized input.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SecurityLevel {
    #[default]
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

impl FromStr for SecurityLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "authpriv" => Ok(SecurityLevel::AuthPriv),
            "authnopriv" => Ok(SecurityLevel::AuthNoPriv),
            _ => Ok(SecurityLevel::NoAuthNoPriv),
        }
    }
}

/// `""` maps to `NoAuth`, and as a side effect forces the auth password to
/// `""` in [`UsmParams::new`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthProtocol {
    #[default]
    NoAuth,
    Md5,
    Sha,
}

impl FromStr for AuthProtocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "" => Ok(AuthProtocol::NoAuth),
            "MD5" => Ok(AuthProtocol::Md5),
            "SHA" => Ok(AuthProtocol::Sha),
            _ => Ok(AuthProtocol::NoAuth),
        }
    }
}

/// `""` maps to `NoPriv`, and as a side effect forces the privacy password
/// to `""` in [`UsmParams::new`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrivacyProtocol {
    #[default]
    NoPriv,
    Des,
    Aes,
}

impl FromStr for PrivacyProtocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "" => Ok(PrivacyProtocol::NoPriv),
            "DES" => Ok(PrivacyProtocol::Des),
            "AES" => Ok(PrivacyProtocol::Aes),
            _ => Ok(PrivacyProtocol::NoPriv),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_construction_matches_spec_scenario() {
        let p = CommunityParams::new("some_hostname", 161, "public", 5.0, 1);
        assert_eq!(p.host_name, "some_hostname");
        assert_eq!(p.port, 161);
        assert_eq!(p.community, "public");
        assert_eq!(p.timeout, 5.0);
        assert_eq!(p.retries, 1);
    }

    #[test]
    fn zero_port_defaults_to_161() {
        let p = CommunityParams::new("h", 0, "public", 1.0, 0);
        assert_eq!(p.port, 161);
    }

    #[test]
    fn v3_construction_matches_spec_scenario() {
        let p = UsmParams::new(
            "some_hostname",
            161,
            "",
            "user",
            "pass",
            "pass",
            "authPriv",
            "SHA",
            "AES",
            5.0,
            1,
        );
        assert_eq!(p.security_level, SecurityLevel::AuthPriv);
        assert_eq!(p.auth_protocol, AuthProtocol::Sha);
        assert_eq!(p.privacy_protocol, PrivacyProtocol::Aes);
        assert_eq!(p.auth_password, "pass");
        assert_eq!(p.privacy_password, "pass");
    }

    #[test]
    fn empty_auth_protocol_forces_empty_password() {
        let p = UsmParams::new(
            "h", 161, "", "user", "privpass", "authpass", "noAuthNoPriv", "", "", 1.0, 0,
        );
        assert_eq!(p.auth_password, "");
        assert_eq!(p.privacy_password, "");
    }

    #[test]
    fn security_level_parse_is_case_insensitive() {
        assert_eq!("AUTHPRIV".parse(), Ok(SecurityLevel::AuthPriv));
        assert_eq!("authPriv".parse(), Ok(SecurityLevel::AuthPriv));
        assert_eq!("bogus".parse(), Ok(SecurityLevel::NoAuthNoPriv));
    }
}
