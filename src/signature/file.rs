//! Signature placement on uploaded files.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::TaskFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureElementType {
    #[default]
    Signature,
    Initials,
    Date,
    Text,
    Input,
    Name,
}

/// Where and how one artifact is rendered on a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureElement {
    #[serde(rename = "type", default)]
    pub kind: SignatureElementType,
    /// "x y" in points from the page's top-left corner, y negative downwards
    pub position: String,
    /// e.g. "1", "1-3", "-1"
    pub pages: String,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl SignatureElement {
    pub fn new(kind: SignatureElementType, x: i32, y: i32, pages: impl Into<String>) -> Self {
        Self {
            kind,
            position: format!("{} {}", x, y),
            pages: pages.into(),
            size: 18,
            color: None,
            font: None,
            content: None,
            info: None,
        }
    }

    pub fn signature(x: i32, y: i32, pages: impl Into<String>) -> Self {
        Self::new(SignatureElementType::Signature, x, y, pages)
    }

    pub fn text(content: impl Into<String>, x: i32, y: i32, pages: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(SignatureElementType::Text, x, y, pages)
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

/// An uploaded file and the elements placed on it for one receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureFile {
    pub server_filename: String,
    #[serde(default)]
    pub elements: Vec<SignatureElement>,
}

impl SignatureFile {
    pub fn new(server_filename: impl Into<String>) -> Self {
        Self {
            server_filename: server_filename.into(),
            elements: Vec::new(),
        }
    }

    pub fn for_file(file: &TaskFile) -> Self {
        Self::new(file.server_filename.as_str())
    }

    pub fn add_element(&mut self, element: SignatureElement) -> Result<&mut Self> {
        if self.elements.contains(&element) {
            return Err(Error::ElementAlreadyExists(format!(
                "{:?} at {} on pages {} of {}",
                element.kind, element.position, element.pages, self.server_filename
            )));
        }
        self.elements.push(element);
        Ok(self)
    }

    pub fn remove_element(&mut self, element: &SignatureElement) -> Result<SignatureElement> {
        let index = self
            .elements
            .iter()
            .position(|e| e == element)
            .ok_or_else(|| {
                Error::ElementNotFound(format!(
                    "{:?} at {} on {}",
                    element.kind, element.position, self.server_filename
                ))
            })?;
        Ok(self.elements.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_element_json() {
        let element = SignatureElement::text("Approved", 100, -200, "2").with_font("Arial");
        assert_eq!(
            serde_json::to_value(&element).unwrap(),
            json!({
                "type": "text",
                "position": "100 -200",
                "pages": "2",
                "size": 18,
                "font": "Arial",
                "content": "Approved"
            })
        );
    }

    #[test]
    fn test_duplicate_elements_rejected() {
        let mut file = SignatureFile::new("srv.pdf");
        file.add_element(SignatureElement::signature(10, -10, "1"))
            .unwrap();
        assert!(matches!(
            file.add_element(SignatureElement::signature(10, -10, "1")),
            Err(Error::ElementAlreadyExists(_))
        ));
        file.add_element(SignatureElement::signature(10, -10, "2"))
            .unwrap();
        assert_eq!(file.elements.len(), 2);
    }

    #[test]
    fn test_remove_element() {
        let mut file = SignatureFile::new("srv.pdf");
        let element = SignatureElement::signature(0, 0, "1");
        assert!(matches!(
            file.remove_element(&element),
            Err(Error::ElementNotFound(_))
        ));
        file.add_element(element.clone()).unwrap();
        assert_eq!(file.remove_element(&element).unwrap(), element);
        assert!(file.elements.is_empty());
    }
}
