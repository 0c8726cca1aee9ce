use crate::core::prelude::*;

/// Everything the user can change about the view.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraState {
    /// Rotation about each axis, in radians. `z` is never changed by interaction.
    pub rotation: Vec3,
    pub scale: f64,
    pub zoom: f64,
    pub pan: Vec2,
    pub show_grid: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            rotation: Vec3::zero(),
            scale: DEFAULT_SCALE,
            zoom: 1.0,
            pan: Vec2::zero(),
            show_grid: true,
        }
    }
}

/// A model-space point after rotation and projection. `depth` is the rotated `z`, used for
/// sorting: in both projection modes `+z` recedes from the viewer, so a larger depth is farther.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

impl ProjectedPoint {
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Camera and projection. The projection mode is fixed for the camera's lifetime.
///
/// Every interaction method returns whether the view changed and needs to be re-rendered.
#[derive(Clone, Debug)]
pub struct Camera {
    state: CameraState,
    default_scale: f64,
    projection: ProjectionMode,
    depth_offset: f64,
    viewport: Vec2,
    drag_from: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Camera {
    pub fn new(settings: &Settings) -> Self {
        let default_scale = settings.default_scale.clamp(MIN_SCALE, MAX_SCALE);
        Self {
            state: CameraState {
                scale: default_scale,
                ..CameraState::default()
            },
            default_scale,
            projection: settings.projection,
            depth_offset: settings.depth_offset,
            viewport: Vec2::new(settings.viewport.width, settings.viewport.height),
            drag_from: None,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }
    pub fn projection(&self) -> ProjectionMode {
        self.projection
    }
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Vec2::new(width, height);
    }

    /// Viewport centre plus pan.
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.viewport.x / 2.0, self.viewport.y / 2.0) + self.state.pan
    }

    /// Rotates about X, then Y, then Z.
    pub fn rotate(&self, p: Vec3) -> Vec3 {
        let Vec3 { x: rx, y: ry, z: rz } = self.state.rotation;
        let (sin_x, cos_x) = rx.sin_cos();
        let (sin_y, cos_y) = ry.sin_cos();
        let (sin_z, cos_z) = rz.sin_cos();

        let y1 = p.y * cos_x - p.z * sin_x;
        let z1 = p.y * sin_x + p.z * cos_x;

        let x1 = p.x * cos_y + z1 * sin_y;
        let z2 = -p.x * sin_y + z1 * cos_y;

        let x2 = x1 * cos_z - y1 * sin_z;
        let y2 = x1 * sin_z + y1 * cos_z;
        Vec3::new(x2, y2, z2)
    }

    pub fn project(&self, p: Vec3) -> ProjectedPoint {
        let r = self.rotate(p);
        let origin = self.origin();
        let s = self.state.scale * self.state.zoom;
        let (x, y) = match self.projection {
            ProjectionMode::Oblique => (
                origin.x + r.x * s - r.z * s * OBLIQUE_DEPTH_FACTOR,
                origin.y - r.y * s - r.z * s * OBLIQUE_DEPTH_FACTOR,
            ),
            ProjectionMode::Perspective => {
                let p = s / (self.depth_offset + r.z).max(MIN_PERSPECTIVE_DENOMINATOR);
                (origin.x + r.x * p, origin.y - r.y * p)
            }
        };
        ProjectedPoint { x, y, depth: r.z }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.drag_from = Some(pos);
    }

    pub fn pointer_move(&mut self, pos: Vec2) -> bool {
        let Some(last) = self.drag_from else {
            return false;
        };
        let delta = pos - last;
        self.state.rotation.y += delta.x * DRAG_SENSITIVITY;
        self.state.rotation.x += delta.y * DRAG_SENSITIVITY;
        self.drag_from = Some(pos);
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag_from = None;
    }

    /// Positive `delta_y` (scrolling down) zooms out.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        let factor = match delta_y {
            d if d > 0.0 => ZOOM_OUT_FACTOR,
            d if d < 0.0 => ZOOM_IN_FACTOR,
            _ => return false,
        };
        self.state.scale = (self.state.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        true
    }

    pub fn set_scale_slider(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            warn!("ignoring non-finite scale {value}");
            return false;
        }
        self.state.scale = value.clamp(MIN_SCALE, MAX_SCALE);
        true
    }
    pub fn set_rotation_x_degrees(&mut self, degrees: f64) -> bool {
        self.state.rotation.x = degrees.to_radians();
        true
    }
    pub fn set_rotation_y_degrees(&mut self, degrees: f64) -> bool {
        self.state.rotation.y = degrees.to_radians();
        true
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        self.state.pan = self.state.pan + Vec2::new(dx, dy);
        true
    }

    /// Restores rotation, scale, zoom and pan. The grid setting is kept.
    pub fn reset(&mut self) -> bool {
        self.state = CameraState {
            scale: self.default_scale,
            show_grid: self.state.show_grid,
            ..CameraState::default()
        };
        self.drag_from = None;
        true
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.state.show_grid = !self.state.show_grid;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn origin_projects_to_viewport_centre() {
        let camera = Camera::default();
        let p = camera.project(Vec3::zero());
        assert_eq!(p.pos(), Vec2::new(400.0, 300.0));
        assert_eq!(p.depth, 0.0);
    }

    #[test]
    fn oblique_projection() {
        let camera = Camera::default();
        let p = camera.project(Vec3::new(1.0, 0.0, 0.0));
        assert!(close(p.x, 425.0) && close(p.y, 300.0));
        let p = camera.project(Vec3::new(0.0, 1.0, 0.0));
        assert!(close(p.x, 400.0) && close(p.y, 275.0));
        let p = camera.project(Vec3::new(0.0, 0.0, 2.0));
        assert!(close(p.x, 375.0) && close(p.y, 275.0));
        assert_eq!(p.depth, 2.0);
    }

    #[test]
    fn rotation_order() {
        let mut camera = Camera::default();
        camera.set_rotation_y_degrees(90.0);
        let r = camera.rotate(Vec3::x_axis());
        assert!(close(r.x, 0.0) && close(r.y, 0.0) && close(r.z, -1.0));

        camera.reset();
        camera.set_rotation_x_degrees(90.0);
        let r = camera.rotate(Vec3::y_axis());
        assert!(close(r.x, 0.0) && close(r.y, 0.0) && close(r.z, 1.0));
        assert!(close(camera.state().rotation.x, FRAC_PI_2));
    }

    #[test]
    fn perspective_projection() {
        let settings = Settings {
            projection: ProjectionMode::Perspective,
            ..Settings::default()
        };
        let camera = Camera::new(&settings);
        assert_eq!(camera.projection(), ProjectionMode::Perspective);
        // p = 25 / (5 + 0) = 5
        let p = camera.project(Vec3::new(1.0, 1.0, 0.0));
        assert!(close(p.x, 405.0) && close(p.y, 295.0));
        // Farther points are foreshortened.
        let near = camera.project(Vec3::new(1.0, 0.0, 0.0));
        let far = camera.project(Vec3::new(1.0, 0.0, 5.0));
        assert!(far.x - 400.0 < near.x - 400.0);
        // Points behind the eye never divide by zero.
        let behind = camera.project(Vec3::new(1.0, 0.0, -5.0));
        assert!(behind.x.is_finite());
        assert!(close(behind.x, 400.0 + 25.0 / MIN_PERSPECTIVE_DENOMINATOR));
    }

    #[test]
    fn drag_rotates() {
        let mut camera = Camera::default();
        assert!(!camera.pointer_move(Vec2::new(10.0, 10.0)));
        camera.pointer_down(Vec2::new(100.0, 100.0));
        assert!(camera.is_dragging());
        assert!(camera.pointer_move(Vec2::new(150.0, 80.0)));
        assert!(close(camera.state().rotation.y, 0.5));
        assert!(close(camera.state().rotation.x, -0.2));
        assert!(camera.pointer_move(Vec2::new(160.0, 80.0)));
        assert!(close(camera.state().rotation.y, 0.6));
        camera.pointer_up();
        assert!(!camera.pointer_move(Vec2::new(500.0, 500.0)));
        assert!(close(camera.state().rotation.y, 0.6));
    }

    #[test]
    fn wheel_zoom_is_clamped() {
        let mut camera = Camera::default();
        assert!(camera.wheel(1.0));
        assert!(close(camera.state().scale, 22.5));
        assert!(camera.wheel(-3.0));
        assert!(close(camera.state().scale, 24.75));
        assert!(!camera.wheel(0.0));
        assert!(close(camera.state().scale, 24.75));

        for _ in 0..100 {
            camera.wheel(1.0);
        }
        assert_eq!(camera.state().scale, MIN_SCALE);
        for _ in 0..100 {
            camera.wheel(-1.0);
        }
        assert_eq!(camera.state().scale, MAX_SCALE);
    }

    #[test]
    fn sliders_and_reset() {
        let mut camera = Camera::default();
        camera.set_scale_slider(500.0);
        assert_eq!(camera.state().scale, MAX_SCALE);
        assert!(!camera.set_scale_slider(f64::NAN));
        camera.set_rotation_x_degrees(45.0);
        camera.pan_by(10.0, -5.0);
        assert_eq!(camera.origin(), Vec2::new(410.0, 295.0));
        camera.toggle_grid();

        assert!(camera.reset());
        let state = camera.state();
        assert_eq!(state.rotation, Vec3::zero());
        assert_eq!(state.scale, DEFAULT_SCALE);
        assert_eq!(state.pan, Vec2::zero());
        assert!(!state.show_grid);
        camera.toggle_grid();
        assert!(camera.state().show_grid);
    }

    #[test]
    fn default_scale_from_settings() {
        let settings = Settings {
            default_scale: 40.0,
            ..Settings::default()
        };
        let mut camera = Camera::new(&settings);
        assert_eq!(camera.state().scale, 40.0);
        camera.wheel(1.0);
        camera.reset();
        assert_eq!(camera.state().scale, 40.0);
    }
}
