//! Document edit overlay: text, image and svg elements placed on pages.
//!
//! Elements are collected locally and only serialized into the `editpdf`
//! process request.

mod element;
mod task;

pub use element::{Coordinates, Dimensions, Element, ElementId, ElementKind};
pub use task::EditTask;
