//! Tool identifiers and their option bags.
//!
//! The remote service validates tool options; the client only knows the
//! closed set of tool names, a handful of typed option structs, and the one
//! business rule checked locally (`protect` needs a password).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Options passed verbatim to the process call.
pub type ProcessOptions = Map<String, Value>;

/// Remote tools supported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Compress,
    Extract,
    HtmlPdf,
    ImagePdf,
    Merge,
    OfficePdf,
    PageNumber,
    PdfA,
    PdfJpg,
    PdfOcr,
    Protect,
    Repair,
    Rotate,
    Split,
    Unlock,
    ValidatePdfA,
    Watermark,
    Sign,
    EditPdf,
}

impl Tool {
    pub const ALL: [Tool; 19] = [
        Tool::Compress,
        Tool::Extract,
        Tool::HtmlPdf,
        Tool::ImagePdf,
        Tool::Merge,
        Tool::OfficePdf,
        Tool::PageNumber,
        Tool::PdfA,
        Tool::PdfJpg,
        Tool::PdfOcr,
        Tool::Protect,
        Tool::Repair,
        Tool::Rotate,
        Tool::Split,
        Tool::Unlock,
        Tool::ValidatePdfA,
        Tool::Watermark,
        Tool::Sign,
        Tool::EditPdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compress => "compress",
            Self::Extract => "extract",
            Self::HtmlPdf => "htmlpdf",
            Self::ImagePdf => "imagepdf",
            Self::Merge => "merge",
            Self::OfficePdf => "officepdf",
            Self::PageNumber => "pagenumber",
            Self::PdfA => "pdfa",
            Self::PdfJpg => "pdfjpg",
            Self::PdfOcr => "pdfocr",
            Self::Protect => "protect",
            Self::Repair => "repair",
            Self::Rotate => "rotate",
            Self::Split => "split",
            Self::Unlock => "unlock",
            Self::ValidatePdfA => "validatepdfa",
            Self::Watermark => "watermark",
            Self::Sign => "sign",
            Self::EditPdf => "editpdf",
        }
    }

    /// Option keys that must be present (and non-empty) at construction.
    pub fn required_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::Protect => &["password"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Tool::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::ToolNotSupported(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    Recommended,
    Extreme,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<CompressionLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    Ranges,
    FixedRange,
    RemovePages,
    Filesize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_mode: Option<SplitMode>,
    /// e.g. "1-3,5-7"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranges: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_range: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_after: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectOptions {
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkMode {
    Text,
    Image,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<WatermarkMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Server filename of an uploaded image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageNumberOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_position: Option<String>,
    /// Template such as "Page {n} of {p}"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfJpgMode {
    Pages,
    Extract,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfJpgOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdfjpg_mode: Option<PdfJpgMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfOcrOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ocr_languages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfAOptions {
    /// e.g. "pdfa-2b"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conformance: Option<String>,
}

/// Construction-time options for a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolOptions {
    #[default]
    None,
    Compress(CompressOptions),
    Split(SplitOptions),
    Protect(ProtectOptions),
    Watermark(WatermarkOptions),
    PageNumber(PageNumberOptions),
    PdfJpg(PdfJpgOptions),
    PdfOcr(PdfOcrOptions),
    PdfA(PdfAOptions),
    Raw(Map<String, Value>),
}

impl ToolOptions {
    pub fn protect(password: impl Into<String>) -> Self {
        Self::Protect(ProtectOptions {
            password: password.into(),
        })
    }

    /// The tool a typed variant belongs to.
    pub fn tool(&self) -> Option<Tool> {
        match self {
            Self::None | Self::Raw(_) => None,
            Self::Compress(_) => Some(Tool::Compress),
            Self::Split(_) => Some(Tool::Split),
            Self::Protect(_) => Some(Tool::Protect),
            Self::Watermark(_) => Some(Tool::Watermark),
            Self::PageNumber(_) => Some(Tool::PageNumber),
            Self::PdfJpg(_) => Some(Tool::PdfJpg),
            Self::PdfOcr(_) => Some(Tool::PdfOcr),
            Self::PdfA(_) => Some(Tool::PdfA),
        }
    }

    /// Serialize into the JSON bag merged into the process request.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        let value = match self {
            Self::None => return Ok(Map::new()),
            Self::Raw(map) => return Ok(map.clone()),
            Self::Compress(o) => serde_json::to_value(o)?,
            Self::Split(o) => serde_json::to_value(o)?,
            Self::Protect(o) => serde_json::to_value(o)?,
            Self::Watermark(o) => serde_json::to_value(o)?,
            Self::PageNumber(o) => serde_json::to_value(o)?,
            Self::PdfJpg(o) => serde_json::to_value(o)?,
            Self::PdfOcr(o) => serde_json::to_value(o)?,
            Self::PdfA(o) => serde_json::to_value(o)?,
        };
        match value {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_names_round_trip_through_from_str() {
        for tool in Tool::ALL {
            assert_eq!(tool.as_str().parse::<Tool>().unwrap(), tool);
            assert_eq!(
                serde_json::to_value(tool).unwrap(),
                Value::String(tool.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_unknown_tool_is_not_supported() {
        for name in ["", "MERGE", "pdfword", "merge "] {
            assert!(matches!(
                name.parse::<Tool>(),
                Err(Error::ToolNotSupported(n)) if n == name
            ));
        }
    }

    #[test]
    fn test_typed_options_serialize_without_empty_fields() {
        let opts = ToolOptions::Split(SplitOptions {
            split_mode: Some(SplitMode::FixedRange),
            fixed_range: Some(2),
            ..Default::default()
        });
        assert_eq!(
            Value::Object(opts.to_map().unwrap()),
            json!({"split_mode": "fixed_range", "fixed_range": 2})
        );
        assert!(ToolOptions::None.to_map().unwrap().is_empty());
        assert_eq!(opts.tool(), Some(Tool::Split));
    }

    #[test]
    fn test_protect_requires_password() {
        assert_eq!(Tool::Protect.required_parameters(), &["password"]);
        assert!(Tool::Merge.required_parameters().is_empty());
    }
}
