use crate::core::prelude::*;

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write as _;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Align {
    #[default]
    Start,
    Middle,
    End,
}

impl Align {
    fn as_svg(self) -> &'static str {
        match self {
            Align::Start => "start",
            Align::Middle => "middle",
            Align::End => "end",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Line {
        start: Vec2,
        end: Vec2,
        width: f64,
        dashed: bool,
    },
    Dot {
        centre: Vec2,
        radius: f64,
    },
    Text {
        pos: Vec2,
        text: String,
        size: f64,
        align: Align,
    },
}

/// One entry in the display list.
///
/// Items with a `depth` belong to the 3D scene and take part in back-to-front sorting; a larger
/// depth is farther from the viewer. Items without one are screen-space overlays and are always
/// drawn after the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasItem {
    pub shape: Shape,
    pub colour: Colour,
    pub depth: Option<f64>,
}

impl CanvasItem {
    pub fn is_overlay(&self) -> bool {
        self.depth.is_none()
    }
}

/// A retained-mode display list for one frame.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: f64,
    height: f64,
    background: Colour,
    items: Vec<CanvasItem>,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            background: Colour::background(),
            items: Vec::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }
    pub fn height(&self) -> f64 {
        self.height
    }
    pub fn centre(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn fill(&mut self, col: Colour) {
        self.background = col;
        self.items.clear();
    }

    pub fn line(&mut self, start: Vec2, end: Vec2, width: f64, col: Colour, depth: f64) {
        self.push(
            Shape::Line {
                start,
                end,
                width,
                dashed: false,
            },
            col,
            Some(depth),
        );
    }
    pub fn dashed_line(&mut self, start: Vec2, end: Vec2, width: f64, col: Colour, depth: f64) {
        self.push(
            Shape::Line {
                start,
                end,
                width,
                dashed: true,
            },
            col,
            Some(depth),
        );
    }
    pub fn dot(&mut self, centre: Vec2, radius: f64, col: Colour, depth: f64) {
        self.push(Shape::Dot { centre, radius }, col, Some(depth));
    }
    pub fn text(
        &mut self,
        pos: Vec2,
        text: impl Into<String>,
        size: f64,
        align: Align,
        col: Colour,
        depth: f64,
    ) {
        self.push(
            Shape::Text {
                pos,
                text: text.into(),
                size,
                align,
            },
            col,
            Some(depth),
        );
    }

    pub fn overlay_text(
        &mut self,
        pos: Vec2,
        text: impl Into<String>,
        size: f64,
        align: Align,
        col: Colour,
    ) {
        self.push(
            Shape::Text {
                pos,
                text: text.into(),
                size,
                align,
            },
            col,
            None,
        );
    }

    fn push(&mut self, shape: Shape, colour: Colour, depth: Option<f64>) {
        self.items.push(CanvasItem {
            shape,
            colour,
            depth,
        });
    }

    /// Orders scene items back-to-front (descending depth, so nearer items are drawn over farther
    /// ones) followed by overlays. The sort is stable, so items at equal depth keep their
    /// insertion order.
    pub fn sort_back_to_front(&mut self) {
        self.items.sort_by(|a, b| match (a.depth, b.depth) {
            (Some(da), Some(db)) => db.partial_cmp(&da).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    pub fn items(&self) -> &[CanvasItem] {
        &self.items
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All text, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match &item.shape {
                Shape::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(
            out,
            r#"  <rect width="100%" height="100%" fill="{}" fill-opacity="{:.3}"/>"#,
            self.background.to_hex_rgb(),
            self.background.a
        );
        for item in &self.items {
            let col = item.colour.to_hex_rgb();
            let alpha = item.colour.a;
            let _ = match &item.shape {
                Shape::Line {
                    start,
                    end,
                    width,
                    dashed,
                } => writeln!(
                    out,
                    r#"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{col}" stroke-opacity="{alpha:.3}" stroke-width="{width}"{}/>"#,
                    start.x,
                    start.y,
                    end.x,
                    end.y,
                    if *dashed { r#" stroke-dasharray="2,3""# } else { "" }
                ),
                Shape::Dot { centre, radius } => writeln!(
                    out,
                    r#"  <circle cx="{:.2}" cy="{:.2}" r="{radius}" fill="{col}" fill-opacity="{alpha:.3}"/>"#,
                    centre.x, centre.y
                ),
                Shape::Text {
                    pos,
                    text,
                    size,
                    align,
                } => writeln!(
                    out,
                    r#"  <text x="{:.2}" y="{:.2}" text-anchor="{}" font-family="monospace" font-size="{size}" fill="{col}" fill-opacity="{alpha:.3}">{}</text>"#,
                    pos.x,
                    pos.y,
                    align.as_svg(),
                    escape_xml(text)
                ),
            };
        }
        out.push_str("</svg>\n");
        out
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "canvas {}x{}: {} items",
            self.width,
            self.height,
            self.items.len()
        )?;
        for item in &self.items {
            let depth = item
                .depth
                .map_or_else(|| "overlay".to_string(), |d| format!("depth {d:.2}"));
            match &item.shape {
                Shape::Line {
                    start, end, dashed, ..
                } => {
                    let kind = if *dashed { "dashed" } else { "line" };
                    writeln!(f, "  {kind} {start:.1} -> {end:.1} {} [{depth}]", item.colour)?;
                }
                Shape::Dot { centre, radius } => {
                    writeln!(f, "  dot {centre:.1} r={radius} {} [{depth}]", item.colour)?;
                }
                Shape::Text { pos, text, .. } => {
                    writeln!(f, "  text {pos:.1} \"{text}\" [{depth}]")?;
                }
            }
        }
        Ok(())
    }
}
