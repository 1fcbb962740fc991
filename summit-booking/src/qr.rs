use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;
use uuid::Uuid;

const MODULE_PX: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("qr encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("png encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// Check-in credential: `CHECKIN-{booking code}-{id number}-{8 hex}`.
pub fn credential_payload(booking_code: &str, id_number: &str) -> String {
    let nonce = &Uuid::new_v4().simple().to_string()[..8];
    format!("CHECKIN-{}-{}-{}", booking_code, id_number, nonce)
}

/// File name of the stored QR image for one participant.
pub fn qr_filename(booking_code: &str, participant_id: Uuid) -> String {
    format!("qr_{}_{}.png", booking_code, participant_id)
}

/// Renders `payload` as a black-on-white PNG with a quiet zone.
pub fn render_png(payload: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    let raster = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PX, MODULE_PX)
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(raster).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = credential_payload("RNJ-20261016-AB12", "5201234567890001");
        let prefix = "CHECKIN-RNJ-20261016-AB12-5201234567890001-";
        assert!(payload.starts_with(prefix));
        let nonce = &payload[prefix.len()..];
        assert_eq!(nonce.len(), 8);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_payloads_differ() {
        assert_ne!(credential_payload("A", "1"), credential_payload("A", "1"));
    }

    #[test]
    fn test_render_png_signature() {
        let png = render_png("CHECKIN-RNJ-20261016-AB12-1-deadbeef").unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_filename() {
        let id = Uuid::nil();
        assert_eq!(
            qr_filename("RNJ-20261016-AB12", id),
            "qr_RNJ-20261016-AB12_00000000-0000-0000-0000-000000000000.png"
        );
    }
}
