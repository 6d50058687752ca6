//! Key and certificate files.
//!
//! Both are pretty-printed JSON. Key files hold the secret seed, so on Unix
//! they are written with mode 0600.

use agentlink_types::identity::KeyFile;
use agentlink_types::{DelegationCertificate, Keypair};
use anyhow::{bail, Context};
use std::path::Path;

pub fn write_key_file(path: &Path, keypair: &Keypair, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let json = serde_json::to_string_pretty(&keypair.to_key_file())?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    restrict_file_permissions(path);
    Ok(())
}

pub fn read_key_file(path: &Path) -> anyhow::Result<Keypair> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: KeyFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing key file {}", path.display()))?;
    Keypair::from_key_file(&file).with_context(|| format!("loading key from {}", path.display()))
}

pub fn write_certificate(path: &Path, cert: &DelegationCertificate) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(cert)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn read_certificate(path: &Path) -> anyhow::Result<DelegationCertificate> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing certificate {}", path.display()))
}

#[cfg(unix)]
fn restrict_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
fn restrict_file_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlink_types::delegation::{create_certificate, verify_certificate};
    use std::time::Duration;

    #[test]
    fn test_key_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.key.json");
        let keypair = Keypair::generate();

        write_key_file(&path, &keypair, false).unwrap();
        let loaded = read_key_file(&path).unwrap();
        assert_eq!(loaded.public_key_hex(), keypair.public_key_hex());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_key_file_not_overwritten_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.key.json");
        let first = Keypair::generate();
        write_key_file(&path, &first, false).unwrap();

        assert!(write_key_file(&path, &Keypair::generate(), false).is_err());
        assert_eq!(
            read_key_file(&path).unwrap().public_key_hex(),
            first.public_key_hex()
        );

        let second = Keypair::generate();
        write_key_file(&path, &second, true).unwrap();
        assert_eq!(
            read_key_file(&path).unwrap().public_key_hex(),
            second.public_key_hex()
        );
    }

    #[test]
    fn test_mismatched_key_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.key.json");
        let mut file = Keypair::generate().to_key_file();
        file.public_key = Keypair::generate().public_key_hex();
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        assert!(read_key_file(&path).is_err());
    }

    #[test]
    fn test_certificate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.cert.json");
        let cert = create_certificate(
            &Keypair::generate(),
            &Keypair::generate().public_key_hex(),
            vec!["echo".to_string()],
            Duration::from_secs(60),
        )
        .unwrap();

        write_certificate(&path, &cert).unwrap();
        let loaded = read_certificate(&path).unwrap();
        assert_eq!(loaded, cert);
        assert!(verify_certificate(&loaded));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"issuedAt\""));
    }
}
