use crate::core::camera::Camera;
use crate::core::event::VectorListener;
use crate::core::prelude::*;
use crate::util::canvas::{Align, Canvas};
use crate::util::vm_float;

const GRID_LINE_WIDTH: f64 = 0.8;
const AXIS_LINE_WIDTH: f64 = 2.5;
const VECTOR_LINE_WIDTH: f64 = 4.0;
const VECTOR_DOT_RADIUS: f64 = 7.0;
const LABEL_FONT_SIZE: f64 = 13.0;
const AXIS_FONT_SIZE: f64 = 14.0;
const OVERLAY_FONT_SIZE: f64 = 12.0;
const OVERLAY_MARGIN: f64 = 15.0;

fn text_colour() -> Colour {
    Colour::neon_cyan()
}

/// Turns the camera and the current vectors into a [`Canvas`].
///
/// The renderer owns the camera. It keeps a copy of the last vectors it was sent, and re-renders
/// whenever either changes.
#[derive(Debug)]
pub struct Renderer {
    camera: Camera,
    vectors: VectorUpdate,
    canvas: Canvas,
    frame_count: usize,
}

impl Renderer {
    pub fn new(settings: &Settings) -> Self {
        let camera = Camera::new(settings);
        let viewport = camera.viewport();
        let mut rv = Self {
            camera,
            vectors: VectorUpdate {
                a: Vec3::zero(),
                b: Vec3::zero(),
                result: None,
            },
            canvas: Canvas::new(viewport.x, viewport.y),
            frame_count: 0,
        };
        rv.render();
        rv
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
    pub fn vectors(&self) -> &VectorUpdate {
        &self.vectors
    }
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Applies a camera interaction and re-renders if it changed the view.
    ///
    /// ```
    /// use vmatrix::core::{config::Settings, render::Renderer};
    /// let mut renderer = Renderer::new(&Settings::default());
    /// assert!(renderer.with_camera(|camera| camera.wheel(1.0)));
    /// assert!(!renderer.with_camera(|camera| camera.wheel(0.0)));
    /// assert_eq!(renderer.frame_count(), 2);
    /// ```
    pub fn with_camera(&mut self, f: impl FnOnce(&mut Camera) -> bool) -> bool {
        let changed = f(&mut self.camera);
        if changed {
            self.render();
        }
        changed
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.camera.set_viewport(width, height);
        self.render();
    }

    pub fn set_vectors(&mut self, update: VectorUpdate) {
        self.vectors = update;
        self.render();
    }

    pub fn render(&mut self) -> &Canvas {
        let viewport = self.camera.viewport();
        let mut canvas = Canvas::new(viewport.x, viewport.y);
        canvas.fill(Colour::background());
        if self.camera.state().show_grid {
            self.draw_grid(&mut canvas);
        }
        self.draw_axes(&mut canvas);
        self.draw_vector(&mut canvas, self.vectors.a, Colour::neon_cyan(), "A");
        self.draw_vector(&mut canvas, self.vectors.b, Colour::neon_pink(), "B");
        if let Some(v) = self.vectors.result.and_then(|r| r.graphic_vector()) {
            self.draw_vector(&mut canvas, v, Colour::gold(), "Resultado");
        }
        canvas.sort_back_to_front();
        self.draw_camera_info(&mut canvas);
        self.draw_legend(&mut canvas);

        self.canvas = canvas;
        self.frame_count += 1;
        &self.canvas
    }

    fn segment(&self, canvas: &mut Canvas, start: Vec3, end: Vec3, width: f64, col: Colour, dashed: bool) {
        let (start, end) = (self.camera.project(start), self.camera.project(end));
        let depth = (start.depth + end.depth) / 2.0;
        if dashed {
            canvas.dashed_line(start.pos(), end.pos(), width, col, depth);
        } else {
            canvas.line(start.pos(), end.pos(), width, col, depth);
        }
    }

    fn draw_grid(&self, canvas: &mut Canvas) {
        let extent = f64::from(GRID_EXTENT);
        for i in (-GRID_EXTENT..=GRID_EXTENT).step_by(GRID_STEP) {
            let i = f64::from(i);
            self.segment(
                canvas,
                Vec3::new(i, 0.0, -extent),
                Vec3::new(i, 0.0, extent),
                GRID_LINE_WIDTH,
                Colour::grid(),
                true,
            );
            self.segment(
                canvas,
                Vec3::new(-extent, 0.0, i),
                Vec3::new(extent, 0.0, i),
                GRID_LINE_WIDTH,
                Colour::grid(),
                true,
            );
        }
    }

    fn draw_axes(&self, canvas: &mut Canvas) {
        for (axis, col, label) in [
            (Vec3::x_axis(), Colour::red(), "X"),
            (Vec3::y_axis(), Colour::green(), "Y"),
            (Vec3::z_axis(), Colour::blue(), "Z"),
        ] {
            self.segment(
                canvas,
                -AXIS_LENGTH * axis,
                AXIS_LENGTH * axis,
                AXIS_LINE_WIDTH,
                col,
                false,
            );
            let at = self.camera.project((AXIS_LENGTH + AXIS_LABEL_OFFSET) * axis);
            canvas.text(at.pos(), label, AXIS_FONT_SIZE, Align::Middle, text_colour(), at.depth);
        }
    }

    fn draw_vector(&self, canvas: &mut Canvas, v: Vec3, col: Colour, label: &str) {
        if !v.is_finite() {
            warn!("not drawing non-finite vector {label}: {v}");
            return;
        }
        self.segment(canvas, Vec3::zero(), v, VECTOR_LINE_WIDTH, col, false);
        let end = self.camera.project(v);
        canvas.dot(end.pos(), VECTOR_DOT_RADIUS, col, end.depth);
        canvas.text(
            end.pos() + Vec2::new(10.0, -10.0),
            vector_label(label, v),
            LABEL_FONT_SIZE,
            Align::Start,
            col,
            end.depth,
        );
    }

    fn draw_camera_info(&self, canvas: &mut Canvas) {
        let state = self.camera.state();
        let degrees = |radians: f64| vm_float::force_positive_zero(radians.to_degrees().round());
        let lines = [
            "Cámara 3D Activa".to_string(),
            format!("Zoom: {}", vm_float::format_plain(state.scale)),
            format!(
                "Rotación: X{}° Y{}°",
                degrees(state.rotation.x),
                degrees(state.rotation.y)
            ),
            "Arrastrar para rotar | Rueda para zoom".to_string(),
        ];
        let x = canvas.width() - OVERLAY_MARGIN;
        for (i, line) in lines.into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let y = 25.0 + i as f64 * 18.0;
            canvas.overlay_text(Vec2::new(x, y), line, OVERLAY_FONT_SIZE, Align::End, text_colour());
        }
    }

    fn draw_legend(&self, canvas: &mut Canvas) {
        let (x, y) = (OVERLAY_MARGIN, 30.0);
        for (i, (text, col)) in [
            ("Leyenda:", text_colour()),
            ("● Vector A", Colour::neon_cyan()),
            ("● Vector B", Colour::neon_pink()),
            ("● Resultado", Colour::gold()),
        ]
        .into_iter()
        .enumerate()
        {
            #[allow(clippy::cast_precision_loss)]
            let y = y + i as f64 * 20.0;
            canvas.overlay_text(Vec2::new(x, y), text, OVERLAY_FONT_SIZE, Align::Start, col);
        }
    }
}

impl VectorListener for Renderer {
    fn on_vector_update(&mut self, update: &VectorUpdate) {
        self.set_vectors(*update);
    }
}

/// `A (3, 4, 2) |5.39|`
pub fn vector_label(label: &str, v: Vec3) -> String {
    format!("{label} {} |{:.2}|", v.to_plain_string(), v.len())
}
