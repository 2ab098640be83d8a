//! Dimming backdrop shown behind an inspected card.

use std::time::Duration;

use bevy::prelude::*;

use crate::AppSystems;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Update, fade_backdrop.in_set(AppSystems::TickTimers));
}

#[derive(Debug)]
struct Fade {
    from: f32,
    to: f32,
    timer: Timer,
}

/// Opacity of the backdrop plane; the scene mirrors it onto the material.
#[derive(Component, Debug, Default)]
#[require(Transform, Visibility)]
pub struct Backdrop {
    opacity: f32,
    fade: Option<Fade>,
}

impl Backdrop {
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Fade linearly from the current opacity, replacing any fade in progress.
    pub fn fade_to(&mut self, to: f32, duration: Duration) {
        self.fade = Some(Fade {
            from: self.opacity,
            to,
            timer: Timer::new(duration, TimerMode::Once),
        });
    }

    fn advance(&mut self, delta: Duration) {
        let Some(fade) = self.fade.as_mut() else {
            return;
        };
        fade.timer.tick(delta);
        self.opacity = fade.from + (fade.to - fade.from) * fade.timer.fraction();
        if fade.timer.is_finished() {
            self.opacity = fade.to;
            self.fade = None;
        }
    }
}

fn fade_backdrop(time: Res<Time>, mut backdrops: Query<&mut Backdrop>) {
    for mut backdrop in &mut backdrops {
        if backdrop.is_fading() {
            backdrop.advance(time.delta());
        }
    }
}
