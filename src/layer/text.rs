use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::WaveContext;
use crate::error::{WaveError, WaveResult};
use crate::layer::{Layer, LayerBase, LayerData, LayerOptions, LayerType};
use crate::render::primitives::{self, TextAttrs, TextSpec};
use crate::render::{Attr, Backend, ShapeAttrs, ShapeKind, ShapeStyle, TextAnchor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
}

impl TextOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self { common }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextBoxStyle {
    pub font_size: Option<f64>,
    pub rotation: f64,
    #[serde(flatten)]
    pub shape: ShapeAttrs,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    /// Horizontal placement inside the region.
    pub align: TextAnchor,
    pub text: TextBoxStyle,
}

/// Title, subtitle and unit text placed in a layout region.
#[derive(Debug)]
pub struct TextLayer {
    base: LayerBase,
    text: String,
}

impl TextLayer {
    pub fn new(options: TextOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        Ok(Self {
            base: LayerBase::new(options.common, context)?,
            text: String::new(),
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Layer for TextLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Text
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        self.text = match &data {
            LayerData::Text(text) => text.clone(),
            LayerData::Empty => String::new(),
            LayerData::Labels(labels) => labels.join(" "),
            LayerData::Table(_) => {
                return Err(WaveError::InvalidData(
                    "text layers take a string".to_owned(),
                ));
            }
        };
        self.base.store_data(data);
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: TextStyle = self.base.typed_style()?;
        let region = self.base.region();
        let font_size = style.text.font_size.unwrap_or(self.base.theme().font_size);
        let x = match style.align {
            TextAnchor::Start => region.left(),
            TextAnchor::Middle => region.center().0,
            TextAnchor::End => region.right(),
        };
        // baseline sits a third of the font below the middle
        let y = region.center().1 + font_size / 3.0;
        let texts = if self.text.is_empty() {
            Vec::new()
        } else {
            vec![TextSpec {
                text: self.text.clone(),
                position: (x, y),
                rotation: style.text.rotation,
            }]
        };

        let text = self
            .base
            .common("text", ShapeKind::Text)
            .with_attrs(style.text.shape.clone())
            .with_defaults(ShapeStyle::filled(self.base.theme().text));
        let attrs = TextAttrs {
            font_size: Some(Attr::Scalar(font_size)),
            anchor: Some(Attr::Scalar(style.align)),
        };
        let mut target = self.base.target(backend);
        primitives::draw_text(&mut target, &text, &texts, &attrs)
    }
}
