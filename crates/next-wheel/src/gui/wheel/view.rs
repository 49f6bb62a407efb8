use super::artwork::{ArtState, Artwork, Posters};
use super::{LABEL_RADIUS_RATIO, POINTER_DEPTH, POINTER_HALF_WIDTH, RING_WIDTH};
use crate::gui::theme::{ThemeColors, set_color};
use cairo::{Context, Operator};
use palette::Srgba;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use wheelkit::geometry::{OVER, WheelGeometry, chord};
use wheelkit::item::WheelItem;
use wheelkit::poster::ReadyCallback;
use wheelkit::segment::{Segment, build_segments};

/// Per-frame inputs that are not part of the item list.
pub struct Frame<'a> {
    pub rotation: f64,
    pub spinning: bool,
    pub hovered: Option<&'a str>,
    /// Builds the callback handed to loads that are still pending.
    pub on_ready: &'a dyn Fn() -> ReadyCallback,
}

impl Frame<'_> {
    /// Pending loads get no callback while the wheel spins.
    fn ready_callback(&self) -> Option<ReadyCallback> {
        (!self.spinning).then(|| (self.on_ready)())
    }
}

struct SegmentRenderer<'a> {
    segment: &'a Segment<'a>,
    geometry: &'a WheelGeometry,
    rot0: f64,
    index: usize,
}

impl<'a> SegmentRenderer<'a> {
    fn new(segment: &'a Segment<'a>, geometry: &'a WheelGeometry, rot0: f64, index: usize) -> Self {
        Self {
            segment,
            geometry,
            rot0,
            index,
        }
    }

    fn draw_fill(&self, cr: &Context, frame: &Frame, colors: &ThemeColors) -> Result<(), cairo::Error> {
        let c = self.geometry.center;
        let (a0, a1) = (self.rot0 + self.segment.start, self.rot0 + self.segment.end);

        cr.new_path();
        cr.move_to(c.x, c.y);
        cr.arc(c.x, c.y, self.geometry.radius, a0, a1);
        cr.close_path();
        set_color(
            cr,
            if self.index % 2 == 0 {
                colors.segment_even
            } else {
                colors.segment_odd
            },
        );
        cr.fill_preserve()?;

        let highlight = if frame.hovered == Some(self.segment.item.hit_key().as_str()) {
            Some(colors.hovered)
        } else if !frame.spinning && self.segment.item.winner {
            Some(colors.winner)
        } else {
            None
        };
        if let Some(color) = highlight {
            set_color(cr, color);
            cr.fill_preserve()?;
        }

        set_color(cr, colors.border);
        cr.set_line_width(1.0);
        cr.stroke()
    }

    /// Rotate so the segment's midpoint points up, clip to its annular sector,
    /// then fill the poster zone.
    fn draw_artwork(
        &self,
        cr: &Context,
        frame: &Frame,
        posters: &Posters,
        colors: &ThemeColors,
    ) -> Result<(), cairo::Error> {
        let r = self.geometry.radius;
        let hub = self.geometry.hub_radius();
        let half = self.segment.span() / 2.0;
        let up = -FRAC_PI_2;

        cr.save()?;
        cr.translate(self.geometry.center.x, self.geometry.center.y);
        cr.rotate(self.rot0 + self.segment.mid() + FRAC_PI_2);

        cr.new_path();
        cr.arc(0.0, 0.0, r, up - half, up + half);
        cr.arc_negative(0.0, 0.0, hub, up + half, up - half);
        cr.close_path();
        cr.clip();

        let (zw, zh) = self.geometry.poster_zone();
        let (zx, zy) = (-zw / 2.0, -(r + OVER));

        let result = match posters.artwork(self.segment.item, frame.ready_callback()) {
            ArtState::Ready(art) => Self::draw_cover(cr, &art, zx, zy, zw, zh),
            ArtState::Pending | ArtState::Failed => self.draw_placeholder(cr, colors, zx, zy, zw, zh),
        };
        cr.restore()?;
        result
    }

    fn draw_cover(
        cr: &Context,
        art: &Artwork,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    ) -> Result<(), cairo::Error> {
        let (iw, ih) = art.size();
        if iw <= 0.0 || ih <= 0.0 {
            return Ok(());
        }
        let scale = (w / iw).max(h / ih);
        let (dw, dh) = (iw * scale, ih * scale);

        cr.save()?;
        cr.translate(x - (dw - w) / 2.0, y - (dh - h) / 2.0);
        cr.scale(scale, scale);
        art.set_source(cr)?;
        cr.paint()?;
        cr.restore()
    }

    fn draw_placeholder(
        &self,
        cr: &Context,
        colors: &ThemeColors,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    ) -> Result<(), cairo::Error> {
        set_color(cr, colors.placeholder);
        cr.rectangle(x, y, w, h);
        cr.fill()?;

        let label_r = self.geometry.radius * LABEL_RADIUS_RATIO;
        let room = chord(label_r, self.segment.span()).min(w) * 0.9;
        let size = (self.geometry.radius / 22.0).clamp(9.0, 16.0);
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
        cr.set_font_size(size);
        set_color(cr, colors.text);

        if let Some((text, ext)) = fit_text(cr, &self.segment.item.title, room)? {
            cr.move_to(-ext.width() / 2.0 - ext.x_bearing(), -label_r + ext.height() / 2.0);
            cr.show_text(&text)?;
        }
        Ok(())
    }
}

/// Longest prefix of `text` (with an ellipsis when cut) that fits in `room`.
fn fit_text(
    cr: &Context,
    text: &str,
    room: f64,
) -> Result<Option<(String, cairo::TextExtents)>, cairo::Error> {
    let ext = cr.text_extents(text)?;
    if ext.width() <= room {
        return Ok(Some((text.to_string(), ext)));
    }
    let chars: Vec<char> = text.chars().collect();
    for len in (1..chars.len()).rev() {
        let candidate: String = chars[..len].iter().collect::<String>().trim_end().to_string() + "…";
        let ext = cr.text_extents(&candidate)?;
        if ext.width() <= room {
            return Ok(Some((candidate, ext)));
        }
    }
    Ok(None)
}

pub fn draw(
    cr: &Context,
    width: f64,
    height: f64,
    items: &[WheelItem],
    posters: &Posters,
    colors: &ThemeColors,
    frame: &Frame,
) -> Result<(), cairo::Error> {
    cr.save()?;
    cr.set_operator(Operator::Clear);
    cr.paint()?;
    cr.restore()?;

    let Some(geometry) = WheelGeometry::from_size(width, height) else {
        return Ok(());
    };
    let rot0 = WheelGeometry::rot0(frame.rotation);
    let segments = build_segments(items);

    draw_background(cr, &geometry, faint(colors.placeholder))?;
    for (i, segment) in segments.iter().enumerate() {
        let renderer = SegmentRenderer::new(segment, &geometry, rot0, i);
        renderer.draw_fill(cr, frame, colors)?;
        renderer.draw_artwork(cr, frame, posters, colors)?;
    }

    draw_ring(cr, &geometry, colors)?;
    draw_hub(cr, &geometry, frame.spinning, colors)?;
    draw_pointer(cr, &geometry, colors)
}

fn faint(color: Srgba<f64>) -> Srgba<f64> {
    Srgba {
        alpha: color.alpha * 0.35,
        ..color
    }
}

fn draw_background(cr: &Context, geometry: &WheelGeometry, color: Srgba<f64>) -> Result<(), cairo::Error> {
    let c = geometry.center;
    set_color(cr, color);
    cr.new_path();
    cr.arc(c.x, c.y, geometry.radius, 0.0, TAU);
    cr.fill()
}

fn draw_ring(cr: &Context, geometry: &WheelGeometry, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let c = geometry.center;
    set_color(cr, colors.ring);
    cr.set_line_width(RING_WIDTH);
    cr.new_path();
    cr.arc(c.x, c.y, geometry.radius, 0.0, TAU);
    cr.stroke()
}

fn draw_hub(
    cr: &Context,
    geometry: &WheelGeometry,
    spinning: bool,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let c = geometry.center;
    let hub = geometry.hub_radius();
    set_color(cr, colors.hub);
    cr.new_path();
    cr.arc(c.x, c.y, hub, 0.0, 2.0 * PI);
    cr.fill_preserve()?;
    set_color(cr, colors.ring);
    cr.set_line_width(RING_WIDTH);
    cr.stroke()?;

    let label = if spinning { "…" } else { "SPIN" };
    set_color(cr, colors.text);
    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
    cr.set_font_size((hub / 3.0).clamp(10.0, 28.0));
    let ext = cr.text_extents(label)?;
    cr.move_to(
        c.x - ext.width() / 2.0 - ext.x_bearing(),
        c.y - ext.height() / 2.0 - ext.y_bearing(),
    );
    cr.show_text(label)
}

/// Fixed marker at the top of the wheel; the segment under it wins.
fn draw_pointer(cr: &Context, geometry: &WheelGeometry, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let c = geometry.center;
    let top = c.y - geometry.radius;
    cr.new_path();
    cr.move_to(c.x - POINTER_HALF_WIDTH, top - POINTER_DEPTH / 2.0);
    cr.line_to(c.x + POINTER_HALF_WIDTH, top - POINTER_DEPTH / 2.0);
    cr.line_to(c.x, top + POINTER_DEPTH);
    cr.close_path();
    set_color(cr, colors.pointer);
    cr.fill_preserve()?;
    set_color(cr, colors.border);
    cr.set_line_width(1.5);
    cr.stroke()
}
