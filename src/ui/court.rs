use crate::core::play::{COURT_HEIGHT, COURT_WIDTH};
use crate::core::{player_motions, Frame, PlayerMotion, Point};
use imgui::Ui;
use std::time::{Duration, Instant};

/// Dot radius in court units
pub const DOT_RADIUS: f32 = 3.6;

/// Court line drawn across the floor at this height
pub const COURT_LINE_Y: f32 = 70.0;

/// Distance from the receiver where a pass arrow stops
const ARROW_INSET: f32 = 3.0;
const ARROW_HEAD_LENGTH: f32 = 2.0;
const ARROW_HEAD_HALF_WIDTH: f32 = 1.8;

/// Screen bar geometry
const SCREEN_INSET: f32 = 4.5;
const SCREEN_BAR_HALF_WIDTH: f32 = 2.4;

const COURT_FILL: [f32; 4] = [0.06, 0.22, 0.16, 1.0];
const COURT_LINES: [f32; 4] = [1.0, 1.0, 1.0, 0.2];
const PASS_COLOR: [f32; 4] = [0.9, 0.9, 0.9, 0.9];
const SCREEN_COLOR: [f32; 4] = [0.98, 0.6, 0.2, 0.9];
const DOT_FILL: [f32; 4] = [1.0, 1.0, 1.0, 0.9];
const DOT_RING: [f32; 4] = [0.2, 0.83, 0.6, 1.0];
const DOT_TEXT: [f32; 4] = [0.02, 0.3, 0.2, 1.0];
const ROLE_TEXT: [f32; 4] = [1.0, 1.0, 1.0, 0.7];

/// Maps court coordinates to screen pixels, preserving the court's aspect ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourtTransform {
    origin: [f32; 2],
    scale: f32,
}

impl CourtTransform {
    /// Largest court that fits in a `size` area starting at `pos_min`, centered horizontally
    pub fn fit(pos_min: [f32; 2], size: [f32; 2]) -> Self {
        let scale = (size[0] / COURT_WIDTH).min(size[1] / COURT_HEIGHT).max(0.0);
        let x_pad = (size[0] - COURT_WIDTH * scale) / 2.0;
        Self {
            origin: [pos_min[0] + x_pad, pos_min[1]],
            scale,
        }
    }

    pub fn to_screen(&self, p: Point) -> [f32; 2] {
        [self.origin[0] + p.x * self.scale, self.origin[1] + p.y * self.scale]
    }

    /// Convert a length in court units to pixels
    pub fn length(&self, units: f32) -> f32 {
        units * self.scale
    }

    /// Screen size of the whole court
    pub fn court_size(&self) -> [f32; 2] {
        [COURT_WIDTH * self.scale, COURT_HEIGHT * self.scale]
    }
}

/// Pass arrow in court coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowShape {
    pub start: Point,
    pub shaft_end: Point,
    /// Tip, then the two base corners
    pub head: [Point; 3],
}

/// Screen marker: a line ending in a perpendicular bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenShape {
    pub start: Point,
    pub end: Point,
    pub bar: [Point; 2],
}

fn unit_vector(from: Point, to: Point) -> Option<(Point, f32)> {
    let len = from.distance(to);
    if len <= f32::EPSILON {
        return None;
    }
    Some((Point::new((to.x - from.x) / len, (to.y - from.y) / len), len))
}

fn along(origin: Point, dir: Point, dist: f32) -> Point {
    Point::new(origin.x + dir.x * dist, origin.y + dir.y * dist)
}

/// Arrow from `from` to just short of `to`; `None` when the players are too close to draw one
pub fn arrow_shape(from: Point, to: Point) -> Option<ArrowShape> {
    let (dir, len) = unit_vector(from, to)?;
    if len <= ARROW_INSET + ARROW_HEAD_LENGTH {
        return None;
    }

    let normal = Point::new(-dir.y, dir.x);
    let tip = along(from, dir, len - ARROW_INSET);
    let base = along(from, dir, len - ARROW_INSET - ARROW_HEAD_LENGTH);

    Some(ArrowShape {
        start: from,
        shaft_end: tip,
        head: [
            tip,
            along(base, normal, ARROW_HEAD_HALF_WIDTH),
            along(base, normal, -ARROW_HEAD_HALF_WIDTH),
        ],
    })
}

/// Screen from the screener toward the screened player
pub fn screen_shape(from: Point, to: Point) -> Option<ScreenShape> {
    let (dir, len) = unit_vector(from, to)?;
    if len <= SCREEN_INSET {
        return None;
    }

    let normal = Point::new(-dir.y, dir.x);
    let end = along(from, dir, len - SCREEN_INSET);
    Some(ScreenShape {
        start: from,
        end,
        bar: [
            along(end, normal, SCREEN_BAR_HALF_WIDTH),
            along(end, normal, -SCREEN_BAR_HALF_WIDTH),
        ],
    })
}

pub fn lerp_point(a: Point, b: Point, t: f32) -> Point {
    let t = t.clamp(0.0, 1.0);
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Eased progress of a tween, 0.0 at start and 1.0 once `duration` has elapsed
pub fn tween_progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let t = (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0);
    // ease in-out cubic
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Draws frames on a court, tweening players between steps
pub struct CourtView {
    current: Option<Frame>,
    motions: Vec<PlayerMotion>,
    tween_start: Instant,
    tween_duration: Duration,
}

impl Default for CourtView {
    fn default() -> Self {
        Self::new()
    }
}

impl CourtView {
    pub fn new() -> Self {
        Self {
            current: None,
            motions: Vec::new(),
            tween_start: Instant::now(),
            tween_duration: Duration::ZERO,
        }
    }

    /// Forget the shown frame, e.g. when another play is loaded
    pub fn clear(&mut self) {
        self.current = None;
        self.motions.clear();
    }

    /// Show `frame`, starting a tween if it differs from the frame on screen
    pub fn set_frame(&mut self, frame: &Frame) {
        if self.current.as_ref() == Some(frame) {
            return;
        }

        self.motions = player_motions(self.current.as_ref(), frame);
        self.tween_start = Instant::now();
        self.tween_duration = if self.current.is_some() {
            frame.duration
        } else {
            Duration::ZERO
        };
        self.current = Some(frame.clone());
    }

    /// Player positions at `now`
    pub fn positions_at(&self, now: Instant) -> Vec<(&str, Point)> {
        let t = tween_progress(now.saturating_duration_since(self.tween_start), self.tween_duration);
        self.motions
            .iter()
            .map(|m| {
                let pos = match m.from {
                    Some(from) => lerp_point(from, m.to, t),
                    None => m.to,
                };
                (m.id.as_str(), pos)
            })
            .collect()
    }

    /// Render the court filling the available width
    pub fn render(&self, ui: &Ui) {
        let avail = ui.content_region_avail();
        let height = avail[1].min(avail[0] * COURT_HEIGHT / COURT_WIDTH).max(50.0);
        let pos_min = ui.cursor_screen_pos();
        let transform = CourtTransform::fit(pos_min, [avail[0], height]);
        let court = transform.court_size();
        let origin = transform.to_screen(Point::new(0.0, 0.0));

        let draw_list = ui.get_window_draw_list();

        draw_list
            .add_rect(origin, [origin[0] + court[0], origin[1] + court[1]], COURT_FILL)
            .filled(true)
            .rounding(transform.length(2.0))
            .build();
        draw_list
            .add_rect(origin, [origin[0] + court[0], origin[1] + court[1]], COURT_LINES)
            .rounding(transform.length(2.0))
            .build();
        draw_list
            .add_line(
                transform.to_screen(Point::new(0.0, COURT_LINE_Y)),
                transform.to_screen(Point::new(COURT_WIDTH, COURT_LINE_Y)),
                COURT_LINES,
            )
            .build();

        let Some(frame) = &self.current else {
            ui.dummy([avail[0], height]);
            return;
        };

        // Links are drawn at the frame's final positions
        for pass in &frame.passes {
            if let Some(arrow) = arrow_shape(pass.from, pass.to) {
                draw_list
                    .add_line(
                        transform.to_screen(arrow.start),
                        transform.to_screen(arrow.shaft_end),
                        PASS_COLOR,
                    )
                    .thickness(transform.length(0.6))
                    .build();
                draw_list
                    .add_triangle(
                        transform.to_screen(arrow.head[0]),
                        transform.to_screen(arrow.head[1]),
                        transform.to_screen(arrow.head[2]),
                        PASS_COLOR,
                    )
                    .filled(true)
                    .build();
            }
        }

        for screen in &frame.screens {
            if let Some(shape) = screen_shape(screen.from, screen.to) {
                let thickness = transform.length(0.8);
                draw_list
                    .add_line(transform.to_screen(shape.start), transform.to_screen(shape.end), SCREEN_COLOR)
                    .thickness(thickness)
                    .build();
                draw_list
                    .add_line(transform.to_screen(shape.bar[0]), transform.to_screen(shape.bar[1]), SCREEN_COLOR)
                    .thickness(thickness)
                    .build();
            }
        }

        let radius = transform.length(DOT_RADIUS);
        for (id, pos) in self.positions_at(Instant::now()) {
            let center = transform.to_screen(pos);
            draw_list.add_circle(center, radius, DOT_FILL).filled(true).build();
            draw_list
                .add_circle(center, radius, DOT_RING)
                .thickness(transform.length(0.6))
                .build();

            let id_size = ui.calc_text_size(id);
            draw_list.add_text(
                [center[0] - id_size[0] / 2.0, center[1] - id_size[1] / 2.0],
                DOT_TEXT,
                id,
            );

            if let Some(role) = frame.player(id).and_then(|p| p.role.as_deref()) {
                let role_size = ui.calc_text_size(role);
                draw_list.add_text(
                    [center[0] - role_size[0] / 2.0, center[1] + radius + 2.0],
                    ROLE_TEXT,
                    role,
                );
            }
        }

        ui.dummy([avail[0], height]);

        match &frame.label {
            Some(label) => ui.text_wrapped(label),
            None => ui.text_disabled("(no caption)"),
        }
    }
}
