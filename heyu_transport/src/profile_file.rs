//! Minimal INI-like reader for the certificate-profile configuration file
//! (`~/.heyu.cert` by default).
//!
//! Format:
//! ```ini
//! [hub]
//! ca = /etc/heyu/ca.pem
//! cert = /etc/heyu/hub-cert.pem
//! key = /etc/heyu/hub-key.pem
//! ```
//!
//! Not hardened beyond what the hub/notifier need to resolve a profile at
//! startup -- parsing of this file is explicitly an external collaborator
//! per spec, not part of the core being tested here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cert::CertProfile;
use crate::error::{Result, TransportError};

#[derive(Debug, Default)]
pub struct CertProfileFile {
    sections: HashMap<String, CertProfile>,
}

impl CertProfileFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| TransportError::CertRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::parse(&contents))
    }

    fn parse(contents: &str) -> Self {
        let mut sections: HashMap<String, CertProfile> = HashMap::new();
        let mut current: Option<String> = None;

        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                current = Some(name.trim().to_string());
                sections.entry(current.clone().unwrap()).or_default();
                continue;
            }
            let Some(section) = current.as_ref() else { continue };
            let Some((key, value)) = line.split_once('=') else { continue };
            let (key, value) = (key.trim(), value.trim());
            let profile = sections.entry(section.clone()).or_default();
            let path = PathBuf::from(value);
            match key {
                "ca" => profile.ca_path = Some(path),
                "cert" => profile.cert_path = Some(path),
                "key" => profile.key_path = Some(path),
                _ => {}
            }
        }

        CertProfileFile { sections }
    }

    pub fn profile(&self, name: &str) -> Option<&CertProfile> {
        self.sections.get(name)
    }
}

/// Splits a `--cert-conf` argument of the form `path[profileName]` into its
/// file path and optional profile-name override.
pub fn split_profile_reference(spec: &str) -> (&str, Option<&str>) {
    if let Some(open) = spec.find('[') {
        if let Some(close) = spec[open..].find(']') {
            let path = &spec[..open];
            let name = &spec[open + 1..open + close];
            return (path, Some(name));
        }
    }
    (spec, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_keys() {
        let file = CertProfileFile::parse(
            "[hub]\nca = /etc/heyu/ca.pem\ncert = /etc/heyu/cert.pem\nkey = /etc/heyu/key.pem\n\n[notifier]\nca=/etc/heyu/ca.pem\n",
        );
        let hub = file.profile("hub").unwrap();
        assert_eq!(hub.ca_path.as_deref(), Some(Path::new("/etc/heyu/ca.pem")));
        assert_eq!(hub.cert_path.as_deref(), Some(Path::new("/etc/heyu/cert.pem")));
        assert!(file.profile("notifier").is_some());
        assert!(file.profile("submitter").is_none());
    }

    #[test]
    fn splits_profile_reference_syntax() {
        assert_eq!(split_profile_reference("/etc/heyu.cert[hub]"), ("/etc/heyu.cert", Some("hub")));
        assert_eq!(split_profile_reference("/etc/heyu.cert"), ("/etc/heyu.cert", None));
    }
}
