//! Interaction layer: pointer/scale input, the Preview/Touch/Compass mode
//! machine and the per-tick animation driving the sphere core.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat3, Vec2};
use image::RgbaImage;

use crate::projection::CanvasSize;
use crate::sphere::{DrawCommand, Sphere, SphereConfig};
use crate::SphereError;

const VELOCITY_FACTOR: f32 = 4.0;
const TOUCH_FRICTION: f32 = 0.0006;
const PREVIEW_FRICTION: f32 = 0.000005;
const PREVIEW_INITIAL_VELOCITY: f32 = 0.01;

/// How rotation updates are sourced each tick.
///
/// `Preview` lasts a single tick: it seeds a slow spin and hands over to
/// `Touch`. `Touch` follows drags with inertia; `Compass` follows the
/// externally supplied orientation matrix and ignores drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerMode {
    Preview,
    Touch,
    Compass,
}

/// A photo-sphere widget without the widget: hosts feed it pointer events,
/// scale gestures, orientation matrices and ticks, and pull draw commands
/// back out. Canvas dimensions are always passed in explicitly, never held
/// as ambient state.
#[derive(Debug)]
pub struct SphereViewer {
    config: SphereConfig,
    sphere: Option<Sphere>,
    mode: ViewerMode,

    x_rotation: f32,
    y_rotation: f32,
    velocity_x: f32,
    velocity_y: f32,
    friction: f32,
    prev_frame_x: f32,
    prev_frame_y: f32,

    pointer_down: bool,
    anchor: Option<Vec2>,
    orientation: Mat3,
    pending_zoom: Option<f32>,
}

impl SphereViewer {
    pub fn new(config: SphereConfig) -> Self {
        Self {
            config,
            sphere: None,
            mode: ViewerMode::Preview,
            x_rotation: 0.0,
            y_rotation: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            friction: TOUCH_FRICTION,
            prev_frame_x: 0.0,
            prev_frame_y: 0.0,
            pointer_down: false,
            anchor: None,
            orientation: Mat3::IDENTITY,
            pending_zoom: None,
        }
    }

    /// (Re)builds the vertex grid and mosaic for a new source bitmap and
    /// resets the orientation to the front. Any previously rotated grid is
    /// discarded with the old sphere.
    pub fn bind(&mut self, bitmap: &RgbaImage) -> Result<(), SphereError> {
        let mut sphere = Sphere::new(bitmap, self.config)?;
        if let Some(zoom) = self.pending_zoom.take() {
            sphere.set_zoom(zoom);
        }
        self.sphere = Some(sphere);
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.sphere.is_some()
    }

    pub fn mode(&self) -> ViewerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewerMode) {
        self.mode = mode;
    }

    pub fn zoom(&self) -> f32 {
        match &self.sphere {
            Some(sphere) => sphere.zoom(),
            None => self.pending_zoom.unwrap_or(self.config.initial_zoom),
        }
    }

    /// Programmatic zoom, clamped to the configured range. A zoom set before
    /// a bitmap is bound is remembered and applied on the next [`bind`].
    ///
    /// [`bind`]: SphereViewer::bind
    pub fn set_zoom(&mut self, factor: f32) {
        let clamped = factor.clamp(self.config.min_zoom, self.config.max_zoom);
        match self.sphere.as_mut() {
            Some(sphere) => sphere.set_zoom(clamped),
            None => self.pending_zoom = Some(clamped),
        }
    }

    /// Pinch gesture: multiplies the current zoom by the span ratio, and
    /// applies the result only while it stays inside the allowed range.
    pub fn on_scale_change(&mut self, span_ratio: f32) {
        let Some(sphere) = self.sphere.as_mut() else {
            return;
        };
        let next = sphere.zoom() * span_ratio;
        if next >= self.config.min_zoom && next <= self.config.max_zoom {
            sphere.set_zoom(next);
        }
    }

    pub fn rotation(&self) -> (f32, f32) {
        (self.x_rotation, self.y_rotation)
    }

    /// Sets the drag angles directly and, when bound, re-orients the sphere
    /// immediately.
    pub fn set_rotation(&mut self, x_angle: f32, y_angle: f32) {
        self.x_rotation = x_angle;
        self.y_rotation = y_angle.clamp(-FRAC_PI_2, FRAC_PI_2);
        if let Some(sphere) = self.sphere.as_mut() {
            sphere.rotate(self.x_rotation, self.y_rotation);
        }
    }

    /// Stores the sensor-fusion orientation used while in Compass mode. The
    /// matrix is consumed opaquely.
    pub fn set_orientation(&mut self, matrix: Mat3) {
        self.orientation = matrix;
    }

    /// A new grab kills any residual inertia and re-baselines the velocity
    /// sampler, so rotation accumulated while flinging is not misread as
    /// pointer travel on the first tick of the drag.
    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        if self.mode == ViewerMode::Compass {
            return;
        }
        self.friction = TOUCH_FRICTION;
        self.velocity_x = 0.0;
        self.velocity_y = 0.0;
        self.prev_frame_x = self.x_rotation;
        self.prev_frame_y = self.y_rotation;
        self.anchor = Some(Vec2::new(x, y));
        self.pointer_down = true;
    }

    /// Drags rotate the sphere proportionally to the pointer travel across
    /// the canvas; the tilt is pinned to +-pi/2 so the poles cannot be
    /// dragged past the screen center.
    pub fn on_pointer_move(&mut self, x: f32, y: f32, canvas: CanvasSize) {
        if self.mode == ViewerMode::Compass || !self.pointer_down {
            return;
        }
        if let Some(anchor) = self.anchor {
            self.x_rotation -= 2.0 * (x - anchor.x) / canvas.width;
            let tilt = self.y_rotation + 2.0 * (y - anchor.y) / canvas.height;
            if tilt.abs() <= FRAC_PI_2 {
                self.y_rotation = tilt;
            }
        }
        self.anchor = Some(Vec2::new(x, y));
    }

    pub fn on_pointer_up(&mut self) {
        self.pointer_down = false;
        self.anchor = None;
    }

    /// Double tap toggles between manual and compass control. Preview is
    /// left untouched; it retires itself on the first tick.
    pub fn on_double_tap(&mut self) {
        self.mode = match self.mode {
            ViewerMode::Touch => ViewerMode::Compass,
            ViewerMode::Compass => ViewerMode::Touch,
            ViewerMode::Preview => ViewerMode::Preview,
        };
    }

    /// Advances one animation frame. `dt_ms` is the elapsed time since the
    /// previous tick and only scales the velocity sampled from an active
    /// drag; the friction decay is applied per tick, which is what the
    /// tuned constants expect.
    pub fn tick(&mut self, dt_ms: f32) {
        let Some(sphere) = self.sphere.as_mut() else {
            return;
        };
        match self.mode {
            ViewerMode::Preview => {
                self.velocity_x = PREVIEW_INITIAL_VELOCITY;
                self.friction = PREVIEW_FRICTION;
                self.mode = ViewerMode::Touch;
            }
            ViewerMode::Touch => {
                if self.pointer_down {
                    if dt_ms > 0.0 {
                        self.velocity_x =
                            VELOCITY_FACTOR * (self.x_rotation - self.prev_frame_x) / dt_ms;
                        self.velocity_y =
                            VELOCITY_FACTOR * (self.y_rotation - self.prev_frame_y) / dt_ms;
                    }
                    self.prev_frame_x = self.x_rotation;
                    self.prev_frame_y = self.y_rotation;
                } else {
                    self.x_rotation += self.velocity_x;
                    let tilt = self.y_rotation + self.velocity_y;
                    if tilt.abs() < FRAC_PI_2 {
                        self.y_rotation = tilt;
                    }
                    self.velocity_x = decay(self.velocity_x, self.friction);
                    self.velocity_y = decay(self.velocity_y, self.friction);
                }
                sphere.rotate(self.x_rotation, self.y_rotation);
            }
            ViewerMode::Compass => {
                sphere.set_rotation(self.orientation);
            }
        }
    }

    /// Emits the draw commands for the current orientation and zoom.
    /// Rendering before [`bind`] is a programming error and fails loudly.
    ///
    /// [`bind`]: SphereViewer::bind
    pub fn render(
        &self,
        canvas: CanvasSize,
    ) -> Result<impl Iterator<Item = DrawCommand<'_>> + '_, SphereError> {
        let sphere = self.sphere.as_ref().ok_or(SphereError::NotBound)?;
        Ok(sphere.draw_commands(canvas))
    }
}

fn decay(velocity: f32, friction: f32) -> f32 {
    (velocity.abs() - friction).max(0.0) * velocity.signum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;
    use approx::assert_relative_eq;
    use image::Rgba;

    fn bitmap() -> RgbaImage {
        RgbaImage::from_pixel(360, 180, Rgba([80, 120, 200, 255]))
    }

    fn viewer() -> SphereViewer {
        let mut v = SphereViewer::new(SphereConfig {
            grid: GridConfig {
                width: 6,
                height: 4,
            },
            ..SphereConfig::default()
        });
        v.bind(&bitmap()).unwrap();
        v
    }

    #[test]
    fn render_before_bind_fails_loudly() {
        let v = SphereViewer::new(SphereConfig::default());
        let canvas = CanvasSize::new(200.0, 200.0);
        match v.render(canvas) {
            Err(SphereError::NotBound) => {}
            _ => panic!("expected NotBound"),
        };
    }

    #[test]
    fn preview_retires_into_touch_with_injected_spin() {
        let mut v = viewer();
        assert_eq!(v.mode(), ViewerMode::Preview);
        v.tick(16.0);
        assert_eq!(v.mode(), ViewerMode::Touch);
        let (x0, _) = v.rotation();
        v.tick(16.0);
        let (x1, _) = v.rotation();
        assert_relative_eq!(x1 - x0, PREVIEW_INITIAL_VELOCITY, epsilon = 1e-6);
    }

    #[test]
    fn double_tap_toggles_touch_and_compass_only() {
        let mut v = viewer();
        v.on_double_tap();
        assert_eq!(v.mode(), ViewerMode::Preview);
        v.set_mode(ViewerMode::Touch);
        v.on_double_tap();
        assert_eq!(v.mode(), ViewerMode::Compass);
        v.on_double_tap();
        assert_eq!(v.mode(), ViewerMode::Touch);
    }

    #[test]
    fn drag_rotates_proportionally_to_canvas_travel() {
        let mut v = viewer();
        v.set_mode(ViewerMode::Touch);
        let canvas = CanvasSize::new(200.0, 100.0);
        v.on_pointer_down(100.0, 50.0);
        v.on_pointer_move(150.0, 75.0, canvas);
        let (x, y) = v.rotation();
        assert_relative_eq!(x, -2.0 * 50.0 / 200.0, epsilon = 1e-6);
        assert_relative_eq!(y, 2.0 * 25.0 / 100.0, epsilon = 1e-6);
        v.on_pointer_up();
    }

    #[test]
    fn tilt_is_pinned_at_the_poles() {
        let mut v = viewer();
        v.set_mode(ViewerMode::Touch);
        let canvas = CanvasSize::new(100.0, 100.0);
        v.on_pointer_down(0.0, 0.0);
        // A huge vertical drag would tilt past pi/2; the update is refused.
        v.on_pointer_move(0.0, 1000.0, canvas);
        let (_, y) = v.rotation();
        assert_relative_eq!(y, 0.0);
    }

    #[test]
    fn compass_mode_ignores_drags_and_follows_the_orientation() {
        let mut v = viewer();
        v.set_mode(ViewerMode::Compass);
        let canvas = CanvasSize::new(200.0, 200.0);
        v.on_pointer_down(10.0, 10.0);
        v.on_pointer_move(90.0, 90.0, canvas);
        assert_eq!(v.rotation(), (0.0, 0.0));

        v.set_orientation(Mat3::from_rotation_x(0.9));
        v.tick(16.0);
        assert!(v.render(canvas).unwrap().count() > 0);
    }

    #[test]
    fn inertia_decays_to_rest() {
        let mut v = viewer();
        v.set_mode(ViewerMode::Touch);
        let canvas = CanvasSize::new(100.0, 100.0);
        v.on_pointer_down(0.0, 0.0);
        v.on_pointer_move(30.0, 0.0, canvas);
        v.tick(16.0);
        v.on_pointer_up();

        let (x_before, _) = v.rotation();
        v.tick(16.0);
        let (x_after, _) = v.rotation();
        assert!(x_after < x_before, "leftward fling keeps spinning left");

        for _ in 0..2000 {
            v.tick(16.0);
        }
        let (x_rest, _) = v.rotation();
        v.tick(16.0);
        let (x_done, _) = v.rotation();
        assert_relative_eq!(x_rest, x_done);
    }

    #[test]
    fn stationary_regrab_stops_a_fling() {
        let mut v = viewer();
        v.set_mode(ViewerMode::Touch);
        let canvas = CanvasSize::new(100.0, 100.0);
        v.on_pointer_down(0.0, 0.0);
        v.on_pointer_move(30.0, 0.0, canvas);
        v.tick(16.0);
        v.on_pointer_up();
        for _ in 0..20 {
            v.tick(16.0);
        }
        // Press a finger without moving it, then let go: the drift covered
        // while the sphere was coasting must not be sampled as a new fling.
        v.on_pointer_down(50.0, 50.0);
        v.tick(16.0);
        v.on_pointer_up();
        let (x_held, _) = v.rotation();
        v.tick(16.0);
        let (x_released, _) = v.rotation();
        assert_relative_eq!(x_released, x_held, epsilon = 1e-6);
    }

    #[test]
    fn pinch_outside_the_range_is_rejected() {
        let mut v = viewer();
        assert_relative_eq!(v.zoom(), 0.4);
        v.on_scale_change(1.5);
        assert_relative_eq!(v.zoom(), 0.6, epsilon = 1e-6);
        v.on_scale_change(2.0);
        assert_relative_eq!(v.zoom(), 0.6, epsilon = 1e-6);
        v.set_zoom(5.0);
        assert_relative_eq!(v.zoom(), 0.8);
    }

    #[test]
    fn zoom_set_before_bind_survives_binding() {
        let mut v = SphereViewer::new(SphereConfig {
            grid: GridConfig {
                width: 6,
                height: 4,
            },
            ..SphereConfig::default()
        });
        v.set_zoom(0.25);
        assert_relative_eq!(v.zoom(), 0.25);
        v.bind(&bitmap()).unwrap();
        assert_relative_eq!(v.zoom(), 0.25);
    }

    #[test]
    fn rebinding_replaces_the_sphere_and_resets_orientation() {
        let mut v = viewer();
        v.set_rotation(1.0, 0.5);
        v.bind(&bitmap()).unwrap();
        let canvas = CanvasSize::new(200.0, 200.0);
        // Fresh sphere renders the front cell of the identity baseline.
        let cell = v.render(canvas).unwrap().next().unwrap().cell;
        assert_eq!(cell, (1, 1));
    }
}
