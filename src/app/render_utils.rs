use std::collections::HashMap;

use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2, pos2, vec2};

use crate::kg::{NodeGroup, NodeKind, RelationKind};

pub(super) const HOVER_SIZE_DELTA: f32 = 3.0;
pub(super) const LABEL_MAX_FONT: f32 = 12.0;
pub(super) const LABEL_MIN_FONT: f32 = 1.0;

const CATEGORY10: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.35 + (factor * 0.65))) as u8,
    )
}

/// Grid anchored to the world origin, which sits at `origin` on screen.
pub(super) fn draw_background(painter: &Painter, rect: Rect, origin: Pos2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(26, 26, 46));

    let step = (64.0 * zoom.clamp(0.5, 2.0)).max(24.0);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(70, 78, 110, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let expanded = rect.expand(padding);
    if expanded.contains(start) || expanded.contains(end) {
        return true;
    }

    let bounds = Rect::from_two_pos(start, end);
    if !bounds.intersects(expanded) {
        return false;
    }

    let corners = [
        expanded.left_top(),
        expanded.right_top(),
        expanded.right_bottom(),
        expanded.left_bottom(),
    ];
    (0..4).any(|side| segments_intersect(start, end, corners[side], corners[(side + 1) % 4]))
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

/// Screen distance from `point` to the segment `start..end`.
pub(super) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum NodeShape {
    Circle,
    Square,
    Triangle,
}

impl NodeShape {
    pub(super) fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Collection => Self::Square,
            NodeKind::Document => Self::Triangle,
            NodeKind::Entity => Self::Circle,
        }
    }
}

/// Draws `shape` inscribed in a circle of `radius` around `center`.
pub(super) fn paint_node(
    painter: &Painter,
    shape: NodeShape,
    center: Pos2,
    radius: f32,
    fill: Color32,
    stroke: Stroke,
) {
    match shape {
        NodeShape::Circle => {
            painter.circle_filled(center, radius, fill);
            painter.circle_stroke(center, radius, stroke);
        }
        NodeShape::Square => {
            let half = radius * std::f32::consts::FRAC_1_SQRT_2 * 1.15;
            let points = vec![
                center + vec2(-half, -half),
                center + vec2(half, -half),
                center + vec2(half, half),
                center + vec2(-half, half),
            ];
            painter.add(Shape::convex_polygon(points, fill, stroke));
        }
        NodeShape::Triangle => {
            let points = (0..3)
                .map(|corner| {
                    let angle = -std::f32::consts::FRAC_PI_2
                        + corner as f32 * std::f32::consts::TAU / 3.0;
                    center + vec2(angle.cos(), angle.sin()) * radius
                })
                .collect();
            painter.add(Shape::convex_polygon(points, fill, stroke));
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct EdgeStyle {
    pub(super) color: Color32,
    pub(super) width: f32,
    /// Dash and gap lengths in screen pixels; `None` draws a solid line.
    pub(super) dash: Option<(f32, f32)>,
    pub(super) particles: usize,
}

pub(super) fn edge_style(relation: RelationKind) -> EdgeStyle {
    match relation {
        RelationKind::Contains => EdgeStyle {
            color: Color32::from_rgb(120, 144, 176),
            width: 1.6,
            dash: None,
            particles: 1,
        },
        RelationKind::ExtractedFrom => EdgeStyle {
            color: Color32::from_rgb(100, 180, 255),
            width: 1.2,
            dash: Some((6.0, 4.0)),
            particles: 2,
        },
        RelationKind::SameAs => EdgeStyle {
            color: Color32::from_rgb(245, 166, 35),
            width: 1.8,
            dash: Some((2.0, 3.0)),
            particles: 3,
        },
        RelationKind::Generic => EdgeStyle {
            color: Color32::from_rgb(128, 128, 150),
            width: 1.0,
            dash: None,
            particles: 2,
        },
    }
}

/// Colors per node group, assigned in order of first appearance and kept for
/// the whole session so a category keeps its color across loads.
#[derive(Clone, Debug, Default)]
pub(super) struct CategoryPalette {
    ordinals: HashMap<String, usize>,
}

impl CategoryPalette {
    pub(super) fn color(&mut self, group: &NodeGroup) -> Color32 {
        let next = self.ordinals.len();
        let ordinal = *self.ordinals.entry(group.key().to_owned()).or_insert(next);
        CATEGORY10[ordinal % CATEGORY10.len()]
    }
}

/// Node radius in world units.
pub(super) fn node_size(degree: usize, min_size: f32, max_size: f32, hovered: bool) -> f32 {
    let max_size = max_size.max(min_size);
    let base = (degree as f32).clamp(min_size, max_size);
    if hovered { base + HOVER_SIZE_DELTA } else { base }
}

/// Largest font size, stepping down one point at a time, at which `text`
/// fits within `diameter`. `measure` returns the text width at a font size.
pub(super) fn fit_label_font_size(
    text: &str,
    diameter: f32,
    measure: impl Fn(&str, f32) -> f32,
) -> f32 {
    let mut size = LABEL_MAX_FONT;
    while size > LABEL_MIN_FONT && measure(text, size) > diameter {
        size -= 1.0;
    }
    size.max(LABEL_MIN_FONT)
}

/// Position `t` of the way along a segment, wrapping to stay in `0..1`.
pub(super) fn particle_position(start: Pos2, end: Pos2, t: f32) -> Pos2 {
    start + (end - start) * t.rem_euclid(1.0)
}

pub(super) fn world_bounds(points: impl IntoIterator<Item = Vec2>) -> Option<Rect> {
    let mut points = points.into_iter();
    let first = points.next()?.to_pos2();
    Some(points.fold(Rect::from_min_max(first, first), |bounds, point| {
        bounds.union(Rect::from_min_max(point.to_pos2(), point.to_pos2()))
    }))
}
