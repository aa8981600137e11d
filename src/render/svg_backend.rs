use std::fmt::Write as _;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{WaveError, WaveResult};
use crate::render::element::{ElementConfig, Geometry, GroupKey, ShapeStyle, Transition, TransitionPlan};
use crate::render::path::format_number;
use crate::render::{Backend, BackendKind};

/// Retained node bound to one element of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgNode {
    pub element: ElementConfig,
    /// Transition the host applies when setting the attributes, `None` when set
    /// instantly.
    pub transition: Option<Transition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinStats {
    pub updated: usize,
    pub entered: usize,
    pub exited: usize,
}

/// Retained-mode SVG document.
///
/// Each group is a `<g>` whose children are joined to the emitted element list
/// by index: existing nodes update, missing nodes enter, surplus nodes exit.
#[derive(Debug)]
pub struct SvgBackend {
    width: f64,
    height: f64,
    groups: IndexMap<GroupKey, Vec<SvgNode>>,
    attached: bool,
    last_join: JoinStats,
}

impl SvgBackend {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            groups: IndexMap::new(),
            attached: true,
            last_join: JoinStats::default(),
        }
    }

    /// Simulates the root node being removed from the document.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    #[must_use]
    pub fn last_join(&self) -> JoinStats {
        self.last_join
    }

    #[must_use]
    pub fn nodes(&self, key: &GroupKey) -> &[SvgNode] {
        self.groups.get(key).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Serializes the document.
    #[must_use]
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = format_number(self.width),
            h = format_number(self.height)
        );
        for (key, nodes) in &self.groups {
            let _ = write!(out, r#"<g class="{}">"#, escape(&key.to_string()));
            for node in nodes {
                write_node(&mut out, &node.element);
            }
            out.push_str("</g>");
        }
        out.push_str("</svg>");
        out
    }
}

impl Backend for SvgBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Svg
    }

    fn emit(
        &mut self,
        key: &GroupKey,
        elements: Vec<ElementConfig>,
        plan: TransitionPlan,
    ) -> WaveResult<()> {
        if !self.attached {
            return Err(WaveError::Backend(format!(
                "svg root detached while drawing `{key}`"
            )));
        }

        let nodes = self.groups.entry(key.clone()).or_default();
        let mut stats = JoinStats {
            exited: nodes.len().saturating_sub(elements.len()),
            ..JoinStats::default()
        };
        nodes.truncate(elements.len());

        for (index, element) in elements.into_iter().enumerate() {
            match nodes.get_mut(index) {
                Some(node) => {
                    node.element = element;
                    node.transition = plan.update;
                    stats.updated += 1;
                }
                None => {
                    nodes.push(SvgNode {
                        element,
                        transition: plan.enter,
                    });
                    stats.entered += 1;
                }
            }
        }

        trace!(
            group = %key,
            updated = stats.updated,
            entered = stats.entered,
            exited = stats.exited,
            "svg join"
        );
        self.last_join = stats;
        Ok(())
    }

    fn remove_layer(&mut self, layer: &str) -> WaveResult<()> {
        self.groups.retain(|key, _| key.layer != layer);
        Ok(())
    }

    fn elements(&self) -> Vec<(&GroupKey, &ElementConfig)> {
        self.groups
            .iter()
            .flat_map(|(key, nodes)| nodes.iter().map(move |node| (key, &node.element)))
            .collect()
    }
}

fn write_node(out: &mut String, element: &ElementConfig) {
    let paint = paint_attributes(&element.style);
    let origin = element.transform_origin.map_or_else(String::new, |(x, y)| {
        format!(
            r#" transform-origin="{} {}""#,
            format_number(x),
            format_number(y)
        )
    });
    let _ = match &element.geometry {
        Geometry::Rect {
            x,
            y,
            width,
            height,
            rx,
        } => write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}"{paint}{origin}/>"#,
            format_number(*x),
            format_number(*y),
            format_number(*width),
            format_number(*height),
            format_number(*rx)
        ),
        Geometry::Circle { cx, cy, r } => write!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}"{paint}{origin}/>"#,
            format_number(*cx),
            format_number(*cy),
            format_number(*r)
        ),
        Geometry::Line { x1, y1, x2, y2 } => write!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{paint}{origin}/>"#,
            format_number(*x1),
            format_number(*y1),
            format_number(*x2),
            format_number(*y2)
        ),
        Geometry::Path(path) => write!(out, r#"<path d="{}"{paint}{origin}/>"#, path.to_svg()),
        Geometry::Text {
            x,
            y,
            text,
            font_size,
            anchor,
            rotation,
        } => {
            let rotate = if *rotation == 0.0 {
                String::new()
            } else {
                format!(
                    r#" transform="rotate({} {} {})""#,
                    format_number(*rotation),
                    format_number(*x),
                    format_number(*y)
                )
            };
            write!(
                out,
                r#"<text x="{}" y="{}" font-size="{}" text-anchor="{}"{rotate}{paint}>{}</text>"#,
                format_number(*x),
                format_number(*y),
                format_number(*font_size),
                anchor.as_str(),
                escape(text)
            )
        }
    };
}

fn paint_attributes(style: &ShapeStyle) -> String {
    let mut out = String::new();
    let color = |color: Option<crate::render::Color>| {
        color.map_or_else(|| "none".to_owned(), crate::render::Color::to_css)
    };
    let _ = write!(out, r#" fill="{}" stroke="{}""#, color(style.fill), color(style.stroke));
    if style.stroke.is_some() {
        let _ = write!(out, r#" stroke-width="{}""#, format_number(style.stroke_width));
    }
    for (name, value) in [
        ("opacity", style.opacity),
        ("fill-opacity", style.fill_opacity),
        ("stroke-opacity", style.stroke_opacity),
    ] {
        if value != 1.0 {
            let _ = write!(out, r#" {name}="{}""#, format_number(value));
        }
    }
    if let Some(mask) = &style.mask {
        let _ = write!(out, r#" mask="{}""#, escape(mask));
    }
    if let Some(filter) = &style.filter {
        let _ = write!(out, r#" filter="{}""#, escape(filter));
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::element::ShapeKind;

    fn circle(cx: f64) -> ElementConfig {
        ElementConfig::new("dot", ShapeKind::Circle, Geometry::Circle { cx, cy: 0.0, r: 2.0 })
    }

    #[test]
    fn join_updates_enters_and_exits_by_index() {
        let mut svg = SvgBackend::new(100.0, 100.0);
        let key = GroupKey::new("layer", "dot");
        let enter = Transition {
            duration: 300,
            delay: 0,
        };
        let plan = TransitionPlan {
            enter: Some(enter),
            update: None,
        };

        svg.emit(&key, vec![circle(1.0), circle(2.0), circle(3.0)], plan)
            .expect("first emit");
        assert_eq!(svg.last_join().entered, 3);
        assert_eq!(svg.nodes(&key)[0].transition, Some(enter));

        svg.emit(&key, vec![circle(4.0), circle(5.0)], plan)
            .expect("second emit");
        let stats = svg.last_join();
        assert_eq!((stats.updated, stats.entered, stats.exited), (2, 0, 1));
        assert_eq!(svg.nodes(&key).len(), 2);
        // updates snap when update animation is off
        assert_eq!(svg.nodes(&key)[0].transition, None);
    }

    #[test]
    fn detached_root_is_a_backend_error() {
        let mut svg = SvgBackend::new(10.0, 10.0);
        svg.detach();
        let err = svg
            .emit(&GroupKey::new("a", "b"), vec![circle(0.0)], TransitionPlan::instant())
            .expect_err("detached");
        assert!(err.is_fatal());
    }

    #[test]
    fn serializes_groups_and_escapes_text() {
        let mut svg = SvgBackend::new(20.0, 10.0);
        let text = ElementConfig::new(
            "title",
            ShapeKind::Text,
            Geometry::Text {
                x: 10.0,
                y: 5.0,
                text: "a < b".to_owned(),
                font_size: 12.0,
                anchor: crate::render::TextAnchor::Middle,
                rotation: 0.0,
            },
        );
        svg.emit(&GroupKey::new("t", "title"), vec![text], TransitionPlan::instant())
            .expect("emit");
        let document = svg.to_svg_string();
        assert!(document.starts_with("<svg"));
        assert!(document.contains(r#"<g class="t-title">"#));
        assert!(document.contains("a &lt; b"));
    }
}
