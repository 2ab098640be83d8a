//! Damped orbit camera: right-drag to orbit, wheel to zoom.

use std::f32::consts::FRAC_PI_2;

use bevy::{
    input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit},
    prelude::*,
};

use crate::AppSystems;

/// Fraction of orbit velocity lost each frame.
const DAMPING: f32 = 0.2;
/// Radians per pixel of drag.
const ROTATE_SPEED: f32 = 0.004;
/// Relative zoom per wheel line.
const ZOOM_SPEED: f32 = 0.05;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.05;
const MIN_RADIUS: f32 = 40.0;
const MAX_RADIUS: f32 = 600.0;
const REST: f32 = 1e-5;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Update, orbit_camera.in_set(AppSystems::RecordInput));
}

/// Spherical camera rig around a fixed target.
#[derive(Component, Debug, Clone, PartialEq)]
#[require(Transform)]
pub struct OrbitCamera {
    target: Vec3,
    radius: f32,
    yaw: f32,
    pitch: f32,
    /// Yaw/pitch velocity in radians per frame.
    spin: Vec2,
    /// Relative radius change per frame.
    zoom: f32,
}

impl OrbitCamera {
    /// Rig that starts at `eye`, looking at `target`.
    pub fn around(target: Vec3, eye: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(MIN_RADIUS);
        Self {
            target,
            radius,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / radius).clamp(-1.0, 1.0).asin(),
            spin: Vec2::ZERO,
            zoom: 0.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.target + self.radius * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }

    pub fn is_resting(&self) -> bool {
        self.spin.length_squared() < REST * REST && self.zoom.abs() < REST
    }

    /// Feed one frame of drag (pixels) and wheel (lines), then advance and damp.
    pub fn step(&mut self, drag: Vec2, wheel: f32) {
        self.spin += Vec2::new(-drag.x, drag.y) * ROTATE_SPEED;
        self.zoom -= wheel * ZOOM_SPEED;

        self.yaw += self.spin.x;
        self.pitch = (self.pitch + self.spin.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.radius = (self.radius * (1.0 + self.zoom)).clamp(MIN_RADIUS, MAX_RADIUS);

        self.spin *= 1.0 - DAMPING;
        self.zoom *= 1.0 - DAMPING;
        if self.is_resting() {
            self.spin = Vec2::ZERO;
            self.zoom = 0.0;
        }
    }
}

fn orbit_camera(
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    let drag = if buttons.pressed(MouseButton::Right) {
        motion.delta
    } else {
        Vec2::ZERO
    };
    let wheel = match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y,
        MouseScrollUnit::Pixel => scroll.delta.y / 100.0,
    };

    for (mut orbit, mut transform) in &mut cameras {
        if drag == Vec2::ZERO && wheel == 0.0 && orbit.is_resting() {
            continue;
        }
        orbit.step(drag, wheel);
        *transform = orbit.transform();
    }
}
