use std::fmt::{Display, Formatter};

use serde::Deserialize;

use crate::archive::{find_animation_entry, is_archive};
use crate::error::{RenderError, Result};

/// Container format of an animation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    LottieJson,
    DotLottieArchive,
}

impl Display for SourceFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LottieJson => write!(f, "Lottie JSON"),
            Self::DotLottieArchive => write!(f, "dotLottie archive"),
        }
    }
}

/// Header fields of a Lottie animation document.
///
/// Frame points follow the Lottie convention: `ip` is the first frame and
/// `op` is one past the last frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnimationDocument {
    #[serde(rename = "v", default)]
    pub version: Option<String>,
    #[serde(rename = "nm", default)]
    pub name: Option<String>,
    #[serde(rename = "fr")]
    pub frame_rate: f64,
    #[serde(rename = "ip")]
    pub in_point: f64,
    #[serde(rename = "op")]
    pub out_point: f64,
    #[serde(rename = "w", default)]
    pub width: f64,
    #[serde(rename = "h", default)]
    pub height: f64,
}

impl AnimationDocument {
    /// Parses and validates a Lottie JSON document.
    ///
    /// # Example
    /// ```
    /// use renderers::AnimationDocument;
    ///
    /// let doc = AnimationDocument::from_json(br#"{"fr":30,"ip":0,"op":90}"#)
    ///     .expect("valid document");
    /// assert_eq!(doc.total_frames(), 90);
    /// ```
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let document: Self = serde_json::from_slice(bytes)?;
        document.validate()?;
        Ok(document)
    }

    /// Number of frames between `ip` and `op`.
    pub fn total_frames(&self) -> u32 {
        (self.out_point - self.in_point).round().max(0.0) as u32
    }

    pub fn duration_seconds(&self) -> f64 {
        f64::from(self.total_frames()) / self.frame_rate
    }

    fn validate(&self) -> Result<()> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(RenderError::InvalidFrameRate(self.frame_rate));
        }
        if self.total_frames() == 0 {
            return Err(RenderError::InvalidFrameRange {
                in_point: self.in_point,
                out_point: self.out_point,
            });
        }
        Ok(())
    }
}

/// Detects the container format from the leading bytes.
pub fn sniff_format(bytes: &[u8]) -> SourceFormat {
    if is_archive(bytes) {
        SourceFormat::DotLottieArchive
    } else {
        SourceFormat::LottieJson
    }
}

/// Reads the animation header from JSON or dotLottie archive bytes.
pub fn probe_document(bytes: &[u8]) -> Result<(SourceFormat, AnimationDocument)> {
    let format = sniff_format(bytes);
    let document = match format {
        SourceFormat::LottieJson => AnimationDocument::from_json(bytes)?,
        SourceFormat::DotLottieArchive => {
            let entry = find_animation_entry(bytes)?;
            AnimationDocument::from_json(&entry.data)?
        }
    };
    Ok((format, document))
}

#[cfg(test)]
mod tests {
    use super::{AnimationDocument, SourceFormat, probe_document};
    use crate::archive::pack_dotlottie;
    use crate::error::RenderError;

    #[test]
    fn document_header_reads_lottie_short_keys() {
        let doc = AnimationDocument::from_json(
            br#"{"v":"5.7.4","nm":"bounce","fr":29.97,"ip":10,"op":130,"w":512,"h":256,"layers":[]}"#,
        )
        .expect("document should parse");

        assert_eq!(doc.version.as_deref(), Some("5.7.4"));
        assert_eq!(doc.name.as_deref(), Some("bounce"));
        assert_eq!(doc.total_frames(), 120);
        assert_eq!(doc.width, 512.0);
        assert!((doc.duration_seconds() - 120.0 / 29.97).abs() < 1e-9);
    }

    #[test]
    fn zero_frame_rate_is_rejected() {
        let error = AnimationDocument::from_json(br#"{"fr":0,"ip":0,"op":10}"#)
            .expect_err("zero frame rate is invalid");

        assert_eq!(error, RenderError::InvalidFrameRate(0.0));
    }

    #[test]
    fn empty_frame_range_is_rejected() {
        let error = AnimationDocument::from_json(br#"{"fr":30,"ip":5,"op":5}"#)
            .expect_err("empty range is invalid");

        assert!(matches!(error, RenderError::InvalidFrameRange { .. }));
    }

    #[test]
    fn missing_frame_rate_reports_invalid_document() {
        let error = AnimationDocument::from_json(br#"{"ip":0,"op":10}"#)
            .expect_err("fr is required");

        assert!(matches!(error, RenderError::InvalidDocument { .. }));
    }

    #[test]
    fn probe_document_reads_animation_inside_archive() {
        let archive = pack_dotlottie("loader", br#"{"fr":60,"ip":0,"op":240}"#)
            .expect("archive should pack");

        let (format, doc) = probe_document(&archive).expect("archive should probe");

        assert_eq!(format, SourceFormat::DotLottieArchive);
        assert_eq!(doc.total_frames(), 240);
    }
}
