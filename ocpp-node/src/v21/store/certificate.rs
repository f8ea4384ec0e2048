use chrono::{DateTime, Utc};
use ocpp_core::v21::types::{
    CertificateHashData, CertificateHashDataChain, CertificateUse, DeleteCertificateStatus,
    HashAlgorithm, InstallCertificateStatus,
};
use sha2::{Digest, Sha256};

use super::EntityStore;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

#[derive(Clone, Debug, PartialEq)]
pub struct InstalledCertificate {
    pub certificate_type: CertificateUse,
    pub pem: String,
    pub hash_data: CertificateHashData,
    pub installed_at: DateTime<Utc>,
}

fn pem_body(pem: &str) -> Option<String> {
    let trimmed = pem.trim();
    let inner = trimmed.strip_prefix(PEM_BEGIN)?.strip_suffix(PEM_END)?;
    let body: String = inner.split_whitespace().collect();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

fn sha256_hex(domain: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identifying hash data of a PEM certificate. The body is not parsed as
/// X.509, so issuer hashes are derived from the encoded body itself.
pub fn certificate_hash(pem: &str) -> Option<CertificateHashData> {
    let body = pem_body(pem)?;
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    let digest = hasher.finalize();
    Some(CertificateHashData {
        hash_algorithm: HashAlgorithm::SHA256,
        issuer_name_hash: sha256_hex("issuer", &body),
        issuer_key_hash: sha256_hex("key", &body),
        serial_number: hex::encode(&digest[..8]),
    })
}

impl EntityStore {
    /// Installing replaces the certificate held for the same use.
    pub fn install_certificate(
        &self,
        certificate_type: CertificateUse,
        pem: &str,
        now: DateTime<Utc>,
    ) -> InstallCertificateStatus {
        let Some(hash_data) = certificate_hash(pem) else {
            log::warn!("rejecting malformed {:?} certificate", certificate_type);
            return InstallCertificateStatus::Rejected;
        };
        let record = InstalledCertificate {
            certificate_type,
            pem: pem.trim().to_string(),
            hash_data,
            installed_at: now,
        };
        if self.certificates.upsert(certificate_type, record).is_some() {
            log::info!("replaced installed {:?} certificate", certificate_type);
        }
        InstallCertificateStatus::Accepted
    }

    /// All installed certificates, or only those of the given uses.
    pub fn installed_certificates(
        &self,
        filter: Option<&[CertificateUse]>,
    ) -> Vec<CertificateHashDataChain> {
        self.certificates
            .values()
            .into_iter()
            .filter(|cert| {
                filter
                    .map(|uses| uses.contains(&cert.certificate_type))
                    .unwrap_or(true)
            })
            .map(|cert| CertificateHashDataChain {
                certificate_type: cert.certificate_type,
                certificate_hash_data: cert.hash_data,
                child_certificate_hash_data: None,
            })
            .collect()
    }

    /// The CSMS root cannot be removed through this call.
    pub fn delete_certificate(&self, hash: &CertificateHashData) -> DeleteCertificateStatus {
        let Some(use_type) = self
            .certificates
            .find_key(|_, cert| &cert.hash_data == hash)
        else {
            return DeleteCertificateStatus::NotFound;
        };
        if use_type == CertificateUse::CSMSRootCertificate {
            return DeleteCertificateStatus::Failed;
        }
        match self.certificates.try_remove(&use_type) {
            Some(_) => DeleteCertificateStatus::Accepted,
            None => DeleteCertificateStatus::NotFound,
        }
    }
}
