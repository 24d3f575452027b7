//! Code signing certificates and the keychain-backed certificate store.

use crate::export::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;

/// An installed code signing certificate.
///
/// `fingerprint` is the uppercase hex SHA-1 of the DER encoding; provisioning
/// profiles reference certificates by the same fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Certificate {
    pub common_name: String,
    pub team_id: String,
    pub team_name: String,
    pub serial: String,
    pub fingerprint: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl Certificate {
    /// Whether `now` falls inside the validity window.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now <= self.not_after
    }
}

/// Source of installed signing certificates.
pub trait CertificateStore {
    /// Lists certificates that are trusted and currently valid.
    ///
    /// # Errors
    ///
    /// [`Error::StoreUnavailable`] when the store cannot be queried at all.
    fn list_valid(&self) -> Result<Vec<Certificate>>;
}

/// Keeps only certificates valid at `now`.
pub fn filter_valid(certificates: Vec<Certificate>, now: DateTime<Utc>) -> Vec<Certificate> {
    certificates
        .into_iter()
        .filter(|cert| {
            let valid = cert.is_valid_at(now);
            if !valid {
                log::debug!(
                    "Skipping certificate outside its validity window: {} ({})",
                    cert.common_name,
                    cert.serial
                );
            }
            valid
        })
        .collect()
}

/// Certificate store backed by the macOS keychain.
///
/// Identities come from `security find-identity -v -p codesigning`, which
/// already excludes untrusted and expired certificates. Each identity's
/// certificate is exported as PEM and decoded with `openssl x509`.
///
/// [`CertificateStore::list_valid`] blocks on the runtime the store was
/// created in, so it must be called from the blocking pool.
#[derive(Debug, Clone)]
pub struct KeychainCertificateStore {
    runtime: Handle,
}

impl KeychainCertificateStore {
    /// Binds the store to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`Error::StoreUnavailable`] outside a tokio runtime.
    pub fn new() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            Error::StoreUnavailable(format!("keychain queries need a tokio runtime: {}", e))
        })?;
        Ok(Self { runtime })
    }

    async fn list_certificates(&self) -> Result<Vec<Certificate>> {
        let output = Command::new("security")
            .args(["find-identity", "-v", "-p", "codesigning"])
            .output()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to run security: {}", e)))?;

        if !output.status.success() {
            return Err(Error::StoreUnavailable(format!(
                "security find-identity failed with status {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = std::str::from_utf8(&output.stdout).map_err(|e| {
            Error::StoreUnavailable(format!("security output is not valid UTF-8: {}", e))
        })?;

        let mut certificates = Vec::new();
        for identity in parse_find_identity_output(stdout) {
            if let Some(certificate) = self.certificate_for(&identity).await? {
                certificates.push(certificate);
            }
        }

        Ok(filter_valid(certificates, Utc::now()))
    }

    async fn certificate_for(&self, identity: &SigningIdentity) -> Result<Option<Certificate>> {
        let output = Command::new("security")
            .args(["find-certificate", "-a", "-Z", "-p", "-c", identity.name.as_str()])
            .output()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to run security: {}", e)))?;

        if !output.status.success() {
            return Err(Error::StoreUnavailable(format!(
                "security find-certificate failed with status {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(pem) = split_pem_blocks(&stdout)
            .into_iter()
            .find(|(hash, _)| hash.eq_ignore_ascii_case(&identity.fingerprint))
            .map(|(_, pem)| pem)
        else {
            log::warn!(
                "No certificate found in keychain for identity {} ({})",
                identity.name,
                identity.fingerprint
            );
            return Ok(None);
        };

        let fields = describe_pem(&pem).await?;
        Ok(Some(fields.into_certificate(identity)))
    }
}

impl CertificateStore for KeychainCertificateStore {
    fn list_valid(&self) -> Result<Vec<Certificate>> {
        self.runtime.block_on(self.list_certificates())
    }
}

/// One line of `security find-identity` output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningIdentity {
    pub fingerprint: String,
    pub name: String,
}

/// Parses `security find-identity -v -p codesigning` output.
///
/// Input: `  1) 0A1B2C... "Apple Distribution: Acme Corp (TEAM123)"`
pub fn parse_find_identity_output(output: &str) -> Vec<SigningIdentity> {
    let mut identities = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.contains("valid identities found") {
            continue;
        }

        let Some((_, rest)) = trimmed.split_once(')') else {
            continue;
        };
        let rest = rest.trim_start();
        let Some((fingerprint, quoted)) = rest.split_once(char::is_whitespace) else {
            continue;
        };

        let quoted = quoted.trim();
        if let Some(name) = quoted
            .strip_prefix('"')
            .and_then(|q| q.rfind('"').map(|end| &q[..end]))
        {
            identities.push(SigningIdentity {
                fingerprint: fingerprint.to_ascii_uppercase(),
                name: name.to_string(),
            });
        }
    }

    identities
}

/// Splits `security find-certificate -Z -p` output into (SHA-1, PEM) pairs.
pub fn split_pem_blocks(output: &str) -> Vec<(String, String)> {
    let mut blocks = Vec::new();
    let mut hash: Option<String> = None;
    let mut pem = String::new();
    let mut in_pem = false;

    for line in output.lines() {
        if let Some(value) = line.strip_prefix("SHA-1 hash:") {
            hash = Some(value.trim().to_ascii_uppercase());
        } else if line.starts_with("-----BEGIN CERTIFICATE-----") {
            in_pem = true;
            pem.clear();
            pem.push_str(line);
            pem.push('\n');
        } else if in_pem {
            pem.push_str(line);
            pem.push('\n');
            if line.starts_with("-----END CERTIFICATE-----") {
                in_pem = false;
                if let Some(h) = hash.take() {
                    blocks.push((h, std::mem::take(&mut pem)));
                }
            }
        }
    }

    blocks
}

/// Subject and validity fields reported by `openssl x509`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateFields {
    pub common_name: Option<String>,
    pub team_id: Option<String>,
    pub team_name: Option<String>,
    pub serial: Option<String>,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
}

impl CertificateFields {
    fn into_certificate(self, identity: &SigningIdentity) -> Certificate {
        Certificate {
            common_name: self.common_name.unwrap_or_else(|| identity.name.clone()),
            team_id: self.team_id.unwrap_or_default(),
            team_name: self.team_name.unwrap_or_default(),
            serial: self.serial.unwrap_or_default(),
            fingerprint: identity.fingerprint.clone(),
            not_before: self.not_before.unwrap_or(DateTime::<Utc>::MIN_UTC),
            not_after: self.not_after.unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

async fn describe_pem(pem: &str) -> Result<CertificateFields> {
    let mut child = Command::new("openssl")
        .args([
            "x509",
            "-noout",
            "-subject",
            "-serial",
            "-startdate",
            "-enddate",
            "-nameopt",
            "RFC2253",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::StoreUnavailable(format!("failed to run openssl: {}", e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(pem.as_bytes())
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to feed openssl: {}", e)))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| Error::StoreUnavailable(format!("openssl did not finish: {}", e)))?;

    if !output.status.success() {
        return Err(Error::StoreUnavailable(format!(
            "openssl x509 failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    Ok(parse_openssl_fields(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `openssl x509 -noout -subject -serial -startdate -enddate -nameopt RFC2253`.
///
/// Apple signing certificates carry the team identifier in `OU` and the team
/// name in `O`.
pub fn parse_openssl_fields(output: &str) -> CertificateFields {
    let mut fields = CertificateFields::default();

    for line in output.lines() {
        let line = line.trim();
        if let Some(subject) = line.strip_prefix("subject=") {
            for (key, value) in split_rfc2253(subject.trim()) {
                match key.as_str() {
                    "CN" => fields.common_name = Some(value),
                    "OU" => fields.team_id = Some(value),
                    "O" => fields.team_name = Some(value),
                    _ => {}
                }
            }
        } else if let Some(serial) = line.strip_prefix("serial=") {
            fields.serial = Some(serial.trim().to_ascii_uppercase());
        } else if let Some(date) = line.strip_prefix("notBefore=") {
            fields.not_before = parse_openssl_date(date);
        } else if let Some(date) = line.strip_prefix("notAfter=") {
            fields.not_after = parse_openssl_date(date);
        }
    }

    fields
}

/// Splits an RFC 2253 distinguished name, honouring `\,` escapes.
fn split_rfc2253(dn: &str) -> Vec<(String, String)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in dn.chars() {
        match ch {
            _ if escaped => {
                current.push(ch);
                escaped = false;
            }
            '\\' => escaped = true,
            ',' => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .filter_map(|part| {
            part.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

/// Parses `Dec 31 23:59:59 2025 GMT` (day may be space padded).
pub fn parse_openssl_date(value: &str) -> Option<DateTime<Utc>> {
    let normalized = value
        .split_whitespace()
        .filter(|token| *token != "GMT")
        .collect::<Vec<_>>()
        .join(" ");

    NaiveDateTime::parse_from_str(&normalized, "%b %d %H:%M:%S %Y")
        .ok()
        .map(|naive| naive.and_utc())
}
