use serde::{Deserialize, Serialize};

use crate::render::color::Color;
use crate::render::element::ShapeStyle;

/// A style value given once for every element or once per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attr<T> {
    PerElement(Vec<T>),
    Scalar(T),
}

impl<T: Clone> Attr<T> {
    /// Value at `index`: the element's own entry, else the scalar, else `None`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        match self {
            Self::PerElement(values) => values.get(index).cloned(),
            Self::Scalar(value) => Some(value.clone()),
        }
    }
}

impl<T> From<T> for Attr<T> {
    fn from(value: T) -> Self {
        Self::Scalar(value)
    }
}

/// Resolves `attr` at `index`, falling back to `default`.
#[must_use]
pub fn get_attr<T: Clone>(attr: Option<&Attr<T>>, index: usize, default: T) -> T {
    attr.and_then(|attr| attr.get(index)).unwrap_or(default)
}

/// Per-element style attributes accepted by every primitive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeAttrs {
    pub fill: Option<Attr<Color>>,
    pub stroke: Option<Attr<Color>>,
    pub opacity: Option<Attr<f64>>,
    pub fill_opacity: Option<Attr<f64>>,
    pub stroke_opacity: Option<Attr<f64>>,
    pub stroke_width: Option<Attr<f64>>,
    pub mask: Option<Attr<String>>,
    pub filter: Option<Attr<String>>,
}

impl ShapeAttrs {
    /// Style for element `index`, unset attributes taken from `defaults`.
    #[must_use]
    pub fn resolve(&self, index: usize, defaults: &ShapeStyle) -> ShapeStyle {
        ShapeStyle {
            fill: self
                .fill
                .as_ref()
                .and_then(|attr| attr.get(index))
                .or(defaults.fill),
            stroke: self
                .stroke
                .as_ref()
                .and_then(|attr| attr.get(index))
                .or(defaults.stroke),
            opacity: get_attr(self.opacity.as_ref(), index, defaults.opacity),
            fill_opacity: get_attr(self.fill_opacity.as_ref(), index, defaults.fill_opacity),
            stroke_opacity: get_attr(self.stroke_opacity.as_ref(), index, defaults.stroke_opacity),
            stroke_width: get_attr(self.stroke_width.as_ref(), index, defaults.stroke_width),
            mask: self
                .mask
                .as_ref()
                .and_then(|attr| attr.get(index))
                .or_else(|| defaults.mask.clone()),
            filter: self
                .filter
                .as_ref()
                .and_then(|attr| attr.get(index))
                .or_else(|| defaults.filter.clone()),
        }
    }

    /// Overlays the attributes set in `delta`.
    pub fn merge(&mut self, delta: &Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if delta.$field.is_some() {
                    self.$field = delta.$field.clone();
                })*
            };
        }
        take!(
            fill,
            stroke,
            opacity,
            fill_opacity,
            stroke_opacity,
            stroke_width,
            mask,
            filter
        );
    }
}
