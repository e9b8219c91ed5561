//! Positioned content placed on pages by the `editpdf` tool.

use serde::{Deserialize, Serialize};

/// Client-side handle of an element on an [`EditTask`](super::EditTask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(uuid::Uuid);

impl ElementId {
    pub(crate) fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_family: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<u32>,
        /// "#RRGGBB"
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_style: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text_align: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        underline_text: Option<bool>,
    },
    /// Raster image uploaded to the same task
    Image { server_filename: String },
    /// Vector image uploaded to the same task
    Svg { server_filename: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    /// e.g. "1", "1-3,5"
    pub pages: String,
    #[serde(default)]
    pub rotation: i32,
    /// 0 (transparent) to 100 (opaque)
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zindex: Option<u32>,
}

fn default_opacity() -> u8 {
    100
}

impl Element {
    fn new(kind: ElementKind, x: f64, y: f64, pages: impl Into<String>) -> Self {
        Self {
            kind,
            coordinates: Coordinates { x, y },
            dimensions: None,
            pages: pages.into(),
            rotation: 0,
            opacity: default_opacity(),
            zindex: None,
        }
    }

    pub fn text(text: impl Into<String>, x: f64, y: f64, pages: impl Into<String>) -> Self {
        Self::new(
            ElementKind::Text {
                text: text.into(),
                font_family: None,
                font_size: None,
                font_color: None,
                font_style: None,
                text_align: None,
                underline_text: None,
            },
            x,
            y,
            pages,
        )
    }

    pub fn image(server_filename: impl Into<String>, x: f64, y: f64, pages: impl Into<String>) -> Self {
        Self::new(
            ElementKind::Image {
                server_filename: server_filename.into(),
            },
            x,
            y,
            pages,
        )
    }

    pub fn svg(server_filename: impl Into<String>, x: f64, y: f64, pages: impl Into<String>) -> Self {
        Self::new(
            ElementKind::Svg {
                server_filename: server_filename.into(),
            },
            x,
            y,
            pages,
        )
    }

    pub fn with_dimensions(mut self, w: f64, h: f64) -> Self {
        self.dimensions = Some(Dimensions { w, h });
        self
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = degrees.rem_euclid(360);
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity.min(100);
        self
    }

    pub fn with_zindex(mut self, zindex: u32) -> Self {
        self.zindex = Some(zindex);
        self
    }

    /// Font settings; ignored on image and svg elements.
    pub fn with_font(mut self, family: impl Into<String>, size: u32, color: impl Into<String>) -> Self {
        if let ElementKind::Text {
            font_family,
            font_size,
            font_color,
            ..
        } = &mut self.kind
        {
            *font_family = Some(family.into());
            *font_size = Some(size);
            *font_color = Some(color.into());
        }
        self
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ElementKind::Text { .. } => "text",
            ElementKind::Image { .. } => "image",
            ElementKind::Svg { .. } => "svg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_element_json() {
        let element = Element::text("Draft", 50.0, 700.0, "1-2")
            .with_font("Arial", 14, "#FF0000")
            .with_rotation(-90)
            .with_opacity(150);
        assert_eq!(
            serde_json::to_value(&element).unwrap(),
            json!({
                "type": "text",
                "text": "Draft",
                "font_family": "Arial",
                "font_size": 14,
                "font_color": "#FF0000",
                "coordinates": {"x": 50.0, "y": 700.0},
                "pages": "1-2",
                "rotation": 270,
                "opacity": 100
            })
        );
    }

    #[test]
    fn test_image_element_json() {
        let element = Element::image("srv-logo.png", 10.0, 20.0, "1")
            .with_dimensions(120.0, 40.0)
            .with_zindex(2);
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["server_filename"], "srv-logo.png");
        assert_eq!(value["dimensions"], json!({"w": 120.0, "h": 40.0}));
        assert_eq!(element.type_name(), "image");
    }

    #[test]
    fn test_font_ignored_on_svg() {
        let element = Element::svg("srv.svg", 0.0, 0.0, "1").with_font("Arial", 9, "#000000");
        assert_eq!(element, Element::svg("srv.svg", 0.0, 0.0, "1"));
    }

    #[test]
    fn test_element_parses_back() {
        let parsed: Element = serde_json::from_value(json!({
            "type": "svg",
            "server_filename": "srv.svg",
            "coordinates": {"x": 1.5, "y": 2.5},
            "pages": "3"
        }))
        .unwrap();
        assert_eq!(parsed.opacity, 100);
        assert_eq!(parsed.type_name(), "svg");
    }
}
