use crate::constants::*;
use crate::geometry::BoundsPolicy;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Signing configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SignOptions {
    // Signature dictionary metadata
    pub reason: Option<String>,
    pub location: Option<String>,
    pub contact_info: Option<String>,
    /// Overrides the certificate's common name in the caption and /Name
    pub signer_name: Option<String>,

    // Visual stamp
    pub stamp: StampStyle,

    // Placement policy
    pub reject_out_of_bounds: bool,

    // Space reserved for the CMS blob
    pub signature_reserve_bytes: usize,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            reason: Some(DEFAULT_REASON.to_string()),
            location: None,
            contact_info: None,
            signer_name: None,
            stamp: StampStyle::default(),
            reject_out_of_bounds: true,
            signature_reserve_bytes: DEFAULT_SIGNATURE_RESERVE_BYTES,
        }
    }
}

/// Typography and spacing of the stamp caption
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StampStyle {
    /// Caption font size in points
    pub font_size: f32,
    /// Line height as a multiple of the font size
    pub leading_factor: f32,
    /// Inner padding of each half in points
    pub padding: f32,
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_CAPTION_FONT_SIZE,
            leading_factor: DEFAULT_LEADING_FACTOR,
            padding: DEFAULT_STAMP_PADDING,
        }
    }
}

impl StampStyle {
    /// Distance between consecutive baselines
    pub fn leading(&self) -> f32 {
        self.font_size * self.leading_factor
    }
}

impl SignOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// How placements that leave the page are treated
    pub fn bounds_policy(&self) -> BoundsPolicy {
        if self.reject_out_of_bounds {
            BoundsPolicy::Reject
        } else {
            BoundsPolicy::Allow
        }
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.signature_reserve_bytes == 0 {
            return Err(EngineError::Config(
                "Signature reserve must be larger than zero".to_string(),
            ));
        }

        if !(self.stamp.font_size.is_finite() && self.stamp.font_size > 0.0) {
            return Err(EngineError::Config(format!(
                "Caption font size must be positive, got {}",
                self.stamp.font_size
            )));
        }

        let factor = self.stamp.leading_factor;
        if !(factor.is_finite() && factor > 0.0 && factor <= 1.0) {
            return Err(EngineError::Config(format!(
                "Leading factor must be in (0, 1], got {}",
                factor
            )));
        }

        if !(self.stamp.padding.is_finite() && self.stamp.padding >= 0.0) {
            return Err(EngineError::Config(format!(
                "Stamp padding must not be negative, got {}",
                self.stamp.padding
            )));
        }

        Ok(())
    }
}
