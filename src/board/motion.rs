//! Card motions - per-channel keyframe chains played through `bevy_tweening`.
//!
//! A [`Motion`] describes where a card's translation, rotation, and scale go
//! over time. Channels run side by side; segments inside a channel run one
//! after another. The start pose is the card's pose when the motion starts, so
//! a motion replacing an unfinished one picks up from wherever the card is.
//! The tween and the [`InFlight`] timer are inserted together and tick in step;
//! when the timer runs out the card is snapped to its end pose and the tween is
//! dropped, so a join never releases before the card has landed.

use std::time::Duration;

use bevy::{
    math::curve::{Curve, easing::EaseFunction},
    prelude::*,
};
use bevy_tweening::{Lens, Tween, TweenAnim};

use crate::AppSystems;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Update, settle_in_flight.in_set(AppSystems::TickTimers));
}

/// Target for a vector channel. `None` axes keep their current value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Axes {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl Axes {
    pub fn xyz(v: Vec3) -> Self {
        Self {
            x: Some(v.x),
            y: Some(v.y),
            z: Some(v.z),
        }
    }

    pub fn xy(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
        }
    }

    pub fn y(y: f32) -> Self {
        Self {
            y: Some(y),
            ..default()
        }
    }

    pub fn yz(y: f32, z: f32) -> Self {
        Self {
            x: None,
            y: Some(y),
            z: Some(z),
        }
    }

    fn resolve(self, from: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(from.x),
            self.y.unwrap_or(from.y),
            self.z.unwrap_or(from.z),
        )
    }
}

#[derive(Clone, Debug)]
struct Segment<T> {
    duration: Duration,
    ease: EaseFunction,
    target: T,
}

trait Blend: Copy {
    type Target: Copy;
    fn resolve(target: Self::Target, from: Self) -> Self;
    fn blend(from: Self, to: Self, t: f32) -> Self;
}

impl Blend for Vec3 {
    type Target = Axes;

    fn resolve(target: Axes, from: Vec3) -> Vec3 {
        target.resolve(from)
    }

    fn blend(from: Vec3, to: Vec3, t: f32) -> Vec3 {
        from.lerp(to, t)
    }
}

impl Blend for Quat {
    type Target = Quat;

    fn resolve(target: Quat, _from: Quat) -> Quat {
        target
    }

    fn blend(from: Quat, to: Quat, t: f32) -> Quat {
        from.slerp(to, t)
    }
}

fn channel_length<T>(segments: &[Segment<T>]) -> Duration {
    segments.iter().map(|segment| segment.duration).sum()
}

fn sample_channel<V: Blend>(segments: &[Segment<V::Target>], start: V, elapsed: Duration) -> V {
    let mut from = start;
    let mut segment_start = Duration::ZERO;
    for segment in segments {
        let to = V::resolve(segment.target, from);
        let segment_end = segment_start + segment.duration;
        if elapsed >= segment_end {
            from = to;
            segment_start = segment_end;
            continue;
        }
        let t = (elapsed - segment_start).as_secs_f32() / segment.duration.as_secs_f32();
        return V::blend(from, to, segment.ease.sample_clamped(t));
    }
    from
}

/// Keyframe chains for one card.
#[derive(Clone, Debug, Default)]
pub struct Motion {
    translation: Vec<Segment<Axes>>,
    rotation: Vec<Segment<Quat>>,
    scale: Vec<Segment<Axes>>,
}

impl Motion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a translation segment.
    pub fn move_to(mut self, target: Axes, duration: Duration, ease: EaseFunction) -> Self {
        self.translation.push(Segment {
            duration,
            ease,
            target,
        });
        self
    }

    /// Append a rotation segment.
    pub fn turn_to(mut self, target: Quat, duration: Duration, ease: EaseFunction) -> Self {
        self.rotation.push(Segment {
            duration,
            ease,
            target,
        });
        self
    }

    /// Append a scale segment.
    pub fn scale_to(mut self, target: Axes, duration: Duration, ease: EaseFunction) -> Self {
        self.scale.push(Segment {
            duration,
            ease,
            target,
        });
        self
    }

    /// Length of the longest channel.
    pub fn duration(&self) -> Duration {
        channel_length(&self.translation)
            .max(channel_length(&self.rotation))
            .max(channel_length(&self.scale))
    }

    pub fn sample(&self, start: &Transform, elapsed: Duration) -> Transform {
        Transform {
            translation: sample_channel(&self.translation, start.translation, elapsed),
            rotation: sample_channel(&self.rotation, start.rotation, elapsed),
            scale: sample_channel(&self.scale, start.scale, elapsed),
        }
    }

    /// Pose once every channel has finished.
    pub fn end_pose(&self, start: &Transform) -> Transform {
        self.sample(start, self.duration())
    }
}

/// The motion most recently started on a card.
#[derive(Component, Clone, Debug)]
pub struct CardMotion(pub Motion);

/// Marks a card whose coordinator-issued motion has not finished yet.
/// In-flight cards ignore the pointer and hold up joins.
#[derive(Component, Debug)]
pub struct InFlight {
    timer: Timer,
    end: Transform,
}

impl InFlight {
    /// In flight for `duration`, then settled at `end`.
    pub fn new(end: Transform, duration: Duration) -> Self {
        Self {
            timer: Timer::new(duration, TimerMode::Once),
            end,
        }
    }
}

/// Plays a [`Motion`] as a single linear tween; easing happens per segment.
struct MotionLens {
    motion: Motion,
    start: Transform,
}

impl Lens<Transform> for MotionLens {
    fn lerp(&mut self, mut target: Mut<Transform>, ratio: f32) {
        let elapsed = self.motion.duration().mul_f32(ratio.clamp(0.0, 1.0));
        *target = self.motion.sample(&self.start, elapsed);
    }
}

fn tween(motion: &Motion, start: Transform) -> TweenAnim {
    let duration = motion.duration().max(Duration::from_millis(1));
    TweenAnim::new(Tween::new(
        EaseFunction::Linear,
        duration,
        MotionLens {
            motion: motion.clone(),
            start,
        },
    ))
}

/// Start `motion` on `card` from `start`, replacing whatever it was playing.
pub fn start_motion(commands: &mut Commands, card: Entity, start: Transform, motion: Motion) {
    let in_flight = InFlight::new(motion.end_pose(&start), motion.duration());
    commands
        .entity(card)
        .insert((tween(&motion, start), in_flight, CardMotion(motion)));
}

/// Start a hover-style motion that leaves the card interactive.
pub fn start_cosmetic_motion(commands: &mut Commands, card: Entity, start: Transform, motion: Motion) {
    commands
        .entity(card)
        .insert((tween(&motion, start), CardMotion(motion)));
}

fn settle_in_flight(
    time: Res<Time>,
    mut commands: Commands,
    mut in_flight: Query<(Entity, &mut InFlight, &mut Transform)>,
) {
    for (entity, mut flight, mut transform) in &mut in_flight {
        flight.timer.tick(time.delta());
        if flight.timer.is_finished() {
            *transform = flight.end;
            commands.entity(entity).remove::<(InFlight, TweenAnim)>();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use bevy::time::TimeUpdateStrategy;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_untouched_axes_keep_their_value() {
        let start = Transform::from_xyz(3.0, 4.0, 5.0);
        let motion = Motion::new().move_to(Axes::y(10.0), ms(100), EaseFunction::Linear);
        let end = motion.end_pose(&start);
        assert_eq!(end.translation, Vec3::new(3.0, 10.0, 5.0));
        assert_eq!(end.scale, Vec3::ONE);
    }

    #[test]
    fn test_segments_chain_in_order() {
        let start = Transform::from_xyz(0.0, 1.0, 0.0);
        let motion = Motion::new()
            .move_to(Axes::y(21.0), ms(250), EaseFunction::Linear)
            .move_to(Axes::y(1.0), ms(250), EaseFunction::Linear);

        assert_eq!(motion.duration(), ms(500));
        let peak = motion.sample(&start, ms(250));
        assert!((peak.translation.y - 21.0).abs() < 1e-4);
        let halfway_down = motion.sample(&start, ms(375));
        assert!((halfway_down.translation.y - 11.0).abs() < 1e-4);
        assert!((motion.end_pose(&start).translation.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_channels_run_side_by_side() {
        let start = Transform::default();
        let turned = Quat::from_rotation_y(PI / 2.0);
        let motion = Motion::new()
            .move_to(Axes::xyz(Vec3::X), ms(250), EaseFunction::Linear)
            .turn_to(turned, ms(500), EaseFunction::Linear);

        assert_eq!(motion.duration(), ms(500));
        let mid = motion.sample(&start, ms(250));
        assert!(mid.translation.abs_diff_eq(Vec3::X, 1e-5));
        assert!(mid.rotation.abs_diff_eq(Quat::from_rotation_y(PI / 4.0), 1e-4));
        assert!(motion.end_pose(&start).rotation.abs_diff_eq(turned, 1e-5));
    }

    #[test]
    fn test_easing_shapes_progress() {
        let start = Transform::default();
        let motion = Motion::new().move_to(Axes::y(1.0), ms(100), EaseFunction::SineIn);
        let early = motion.sample(&start, ms(50)).translation.y;
        assert!(early < 0.5, "sine-in should lag behind linear, got {early}");
    }

    #[test]
    fn test_settled_card_rests_on_its_end_pose() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, bevy_tweening::TweeningPlugin));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(ms(50)));
        app.add_plugins(plugin);

        let start = Transform::from_xyz(0.0, 1.0, 0.0);
        let card = app.world_mut().spawn(start).id();
        let motion = Motion::new()
            .move_to(Axes::y(21.0), ms(250), EaseFunction::SineIn)
            .turn_to(Quat::from_rotation_z(PI), ms(300), EaseFunction::Linear);
        let end = motion.end_pose(&start);
        start_motion(&mut app.world_mut().commands(), card, start, motion);
        app.world_mut().flush();
        assert!(app.world().get::<InFlight>(card).is_some());

        for _ in 0..20 {
            app.update();
            if app.world().get::<InFlight>(card).is_none() {
                break;
            }
        }
        assert!(app.world().get::<InFlight>(card).is_none());
        assert!(app.world().get::<TweenAnim>(card).is_none());

        // Nothing moves the card once it has settled.
        app.update();
        let pose = app.world().get::<Transform>(card).unwrap();
        assert!(pose.translation.abs_diff_eq(end.translation, 1e-4));
        assert!(pose.rotation.dot(end.rotation).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_empty_motion_is_instant() {
        let start = Transform::from_xyz(1.0, 2.0, 3.0);
        let motion = Motion::new();
        assert_eq!(motion.duration(), Duration::ZERO);
        assert_eq!(motion.end_pose(&start), start);
    }
}
