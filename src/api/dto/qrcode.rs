//! Query parameters of the QR code endpoint.

use serde::Deserialize;
use validator::Validate;

use crate::infrastructure::qr::{DEFAULT_SCALE, MAX_SCALE, MAX_WIDTH, QrFormat, QrOptions};

/// `GET /{code}/qrcode?format=png|svg&scale=N&width=N`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct QrCodeQuery {
    pub format: Option<QrFormat>,

    #[validate(range(min = 1, max = MAX_SCALE))]
    pub scale: Option<u32>,

    #[validate(range(min = 21, max = MAX_WIDTH))]
    pub width: Option<u32>,
}

impl QrCodeQuery {
    pub fn options(&self) -> QrOptions {
        QrOptions {
            format: self.format.unwrap_or_default(),
            scale: self.scale.unwrap_or(DEFAULT_SCALE),
            width: self.width,
        }
    }
}
