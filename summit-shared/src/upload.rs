/// Kinds of user uploads, each with its own storage sub-path and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    PaymentProof,
    HealthCertificate,
    IdCard,
    Selfie,
    ProfilePicture,
    QrCode,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

const MB: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Ukuran file maksimal {max_mb}MB")]
    TooLarge { max_mb: usize },

    #[error("Format file tidak didukung. Gunakan: {allowed}")]
    BadExtension { allowed: String },

    #[error("File kosong")]
    Empty,
}

impl UploadKind {
    /// Sub-directory under the media root.
    pub fn dir(&self) -> &'static str {
        match self {
            UploadKind::PaymentProof => "bookings/payments",
            UploadKind::HealthCertificate => "participants/health_certificates",
            UploadKind::IdCard => "checkins/id_cards",
            UploadKind::Selfie => "checkins/selfies",
            UploadKind::ProfilePicture => "profile_pics",
            UploadKind::QrCode => "checkins/qr_codes",
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            UploadKind::IdCard | UploadKind::Selfie | UploadKind::ProfilePicture => 2 * MB,
            UploadKind::PaymentProof | UploadKind::HealthCertificate | UploadKind::QrCode => 5 * MB,
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::HealthCertificate => DOCUMENT_EXTENSIONS,
            _ => IMAGE_EXTENSIONS,
        }
    }

    /// Checks size and extension; returns the normalized (lower-case) extension.
    pub fn validate(&self, filename: &str, size: usize) -> Result<String, UploadError> {
        if size == 0 {
            return Err(UploadError::Empty);
        }
        if size > self.max_bytes() {
            return Err(UploadError::TooLarge {
                max_mb: self.max_bytes() / MB,
            });
        }

        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions().contains(&ext.as_str()) {
            return Err(UploadError::BadExtension {
                allowed: self.allowed_extensions().join(", "),
            });
        }

        Ok(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_card_limited_to_two_megabytes() {
        assert_eq!(UploadKind::IdCard.validate("ktp.JPG", 2 * MB), Ok("jpg".to_string()));
        assert_eq!(
            UploadKind::IdCard.validate("ktp.jpg", 2 * MB + 1),
            Err(UploadError::TooLarge { max_mb: 2 })
        );
    }

    #[test]
    fn test_extension_must_match_kind() {
        assert!(UploadKind::HealthCertificate.validate("surat.pdf", 1024).is_ok());
        assert!(matches!(
            UploadKind::PaymentProof.validate("bukti.pdf", 1024),
            Err(UploadError::BadExtension { .. })
        ));
        assert!(matches!(
            UploadKind::Selfie.validate("selfie", 1024),
            Err(UploadError::BadExtension { .. })
        ));
    }

    #[test]
    fn test_empty_upload_rejected() {
        assert_eq!(UploadKind::PaymentProof.validate("bukti.png", 0), Err(UploadError::Empty));
    }
}
