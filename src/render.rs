use crate::protocol::EncodedPayload;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// QR error correction level
///
/// | Level    | Recoverable codewords |
/// |----------|-----------------------|
/// | Low      | ~7%                   |
/// | Medium   | ~15%                  |
/// | Quartile | ~25%                  |
/// | High     | ~30%                  |
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum ErrorCorrection {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

/// Turns a payload into a scannable image
///
/// Implemented by the host application, this crate only hands over the text.
pub trait PayloadRenderer {
    type Output;
    type Error;

    fn render(
        &self,
        payload: &EncodedPayload,
        error_correction: ErrorCorrection,
    ) -> Result<Self::Output, Self::Error>;
}
