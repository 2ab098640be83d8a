//! Pointer input - normalised coordinates, card hit testing, hover tracking, clicks.

use bevy::{
    ecs::system::SystemParam,
    math::{
        Dir3A, Vec3A,
        bounding::{Aabb3d, RayCast3d},
    },
    prelude::*,
    window::PrimaryWindow,
};

use super::{
    BoardRequest, Card, EventGate, GateFlags, InFlight, Location, Zones,
    behavior::{dispatch_click, hover_enter, hover_exit},
    motion::start_cosmetic_motion,
    scene::BoardCamera,
};
use crate::{AppSystems, config::BoardSettings};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Pointer>();
    app.init_resource::<HoveredCard>();
    app.add_systems(
        Update,
        (track_pointer, hover_cards, click_cards)
            .chain()
            .in_set(AppSystems::RecordInput),
    );
}

/// Latest pointer position in normalised view coordinates, and the world ray through it.
#[derive(Resource, Debug, Default)]
pub struct Pointer {
    pub ndc: Option<Vec2>,
    pub ray: Option<Ray3d>,
    /// The ray changed this frame, from the pointer or the camera moving.
    pub moved: bool,
}

/// Map a position in surface pixels (origin top-left) to [-1, 1] with y up.
pub fn normalize_pointer(position: Vec2, surface: Vec2) -> Vec2 {
    Vec2::new(
        (position.x / surface.x) * 2.0 - 1.0,
        -(position.y / surface.y) * 2.0 + 1.0,
    )
}

/// World-space ray through a normalised pointer position.
pub fn pointer_ray(camera: &Camera, camera_transform: &GlobalTransform, ndc: Vec2) -> Option<Ray3d> {
    // Reverse-z: 1 is the near plane.
    let near = camera.ndc_to_world(camera_transform, ndc.extend(1.0))?;
    let far = camera.ndc_to_world(camera_transform, ndc.extend(f32::EPSILON))?;
    let direction = Dir3::new(far - near).ok()?;
    Some(Ray3d::new(near, direction))
}

/// Distance along `ray` to a card's box, or `None` on a miss.
pub fn card_hit_distance(ray: Ray3d, card: &GlobalTransform, half_extents: Vec3) -> Option<f32> {
    let to_local = card.affine().inverse();
    let origin = to_local.transform_point3a(Vec3A::from(ray.origin));
    let direction = to_local.transform_vector3a(Vec3A::from(*ray.direction));
    let stretch = direction.length();
    let local_direction = Dir3A::new(direction).ok()?;
    let cast = RayCast3d::new(origin, local_direction, f32::MAX);
    let distance = cast.aabb_intersection_at(&Aabb3d::new(Vec3A::ZERO, half_extents))?;
    Some(distance / stretch)
}

/// The card nearest along `ray`, if any is hit.
pub fn nearest_card<'a>(
    ray: Ray3d,
    cards: impl IntoIterator<Item = (Entity, &'a GlobalTransform)>,
    half_extents: Vec3,
) -> Option<(Entity, f32)> {
    cards
        .into_iter()
        .filter_map(|(entity, transform)| {
            card_hit_distance(ray, transform, half_extents).map(|distance| (entity, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Raycasts against settled cards only, never other scene meshes.
#[derive(SystemParam)]
pub struct HitTester<'w, 's> {
    cards: Query<'w, 's, (Entity, &'static Card, &'static GlobalTransform), Without<InFlight>>,
    settings: Res<'w, BoardSettings>,
}

impl HitTester<'_, '_> {
    /// The nearest card along `ray`, skipping cards still in flight.
    pub fn card_on(&self, ray: Ray3d) -> Option<(Entity, Location)> {
        let (entity, _) = nearest_card(
            ray,
            self.cards
                .iter()
                .map(|(entity, _, transform)| (entity, transform)),
            self.settings.card_half_extents(),
        )?;
        let (_, card, _) = self.cards.get(entity).ok()?;
        Some((entity, card.location))
    }
}

/// The card under the pointer, as last seen by the hover pass.
#[derive(Resource, Debug, Default)]
pub struct HoveredCard(Option<Entity>);

/// Enter/exit pair produced by a hover update.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HoverTransition {
    pub exited: Option<Entity>,
    pub entered: Option<Entity>,
}

impl HoveredCard {
    /// Record the card now under the pointer and report what changed.
    pub fn track(&mut self, now: Option<Entity>) -> HoverTransition {
        if self.0 == now {
            return HoverTransition::default();
        }
        let exited = std::mem::replace(&mut self.0, now);
        HoverTransition {
            exited,
            entered: now,
        }
    }
}

fn track_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<BoardCamera>>,
    mut pointer: ResMut<Pointer>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let ndc = window
        .cursor_position()
        .map(|position| normalize_pointer(position, Vec2::new(window.width(), window.height())));
    let ray = ndc.and_then(|ndc| {
        let (camera, camera_transform) = cameras.single().ok()?;
        pointer_ray(camera, camera_transform, ndc)
    });
    pointer.moved = ray != pointer.ray;
    pointer.ndc = ndc;
    pointer.ray = ray;
}

fn hover_cards(
    mut commands: Commands,
    pointer: Res<Pointer>,
    gate: Res<EventGate>,
    settings: Res<BoardSettings>,
    hit_tester: HitTester,
    cards: Query<(&Card, &Transform)>,
    mut hovered: ResMut<HoveredCard>,
) {
    if !pointer.moved || !gate.is_allowed(GateFlags::MAIN | GateFlags::MOUSE_OVER) {
        return;
    }

    let hit = pointer.ray.and_then(|ray| hit_tester.card_on(ray));
    let transition = hovered.track(hit.map(|(entity, _)| entity));

    if let Some(card) = transition.exited
        && let Ok((state, transform)) = cards.get(card)
    {
        debug!("hover exit {:?} ({:?})", card, state.location);
        if let Some(motion) = hover_exit(state.location, &settings) {
            start_cosmetic_motion(&mut commands, card, *transform, motion);
        }
    }
    if let Some((card, location)) = hit
        && transition.entered == Some(card)
        && let Ok((_, transform)) = cards.get(card)
    {
        debug!("hover enter {:?} ({:?})", card, location);
        if let Some(motion) = hover_enter(location, &settings) {
            start_cosmetic_motion(&mut commands, card, *transform, motion);
        }
    }
}

fn click_cards(
    mouse: Res<ButtonInput<MouseButton>>,
    pointer: Res<Pointer>,
    gate: Res<EventGate>,
    zones: Res<Zones>,
    hit_tester: HitTester,
    mut requests: MessageWriter<BoardRequest>,
) {
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }

    // A click that hits nothing still counts while inspecting.
    let hit = pointer.ray.and_then(|ray| hit_tester.card_on(ray));
    if let Some(request) = dispatch_click(&gate, hit, zones.inspected) {
        info!("click on {:?} -> {:?}", hit, request);
        requests.write(request);
    }
}

#[cfg(test)]
mod tests {
    use std::{f32::consts::FRAC_PI_2, time::Duration};

    use bevy::ecs::system::SystemState;
    use bevy_tweening::TweeningPlugin;

    use super::*;
    use crate::board::motion::CardMotion;

    const HALF: Vec3 = Vec3::new(6.75, 9.0, 0.005);

    fn flat_card(at: Vec3) -> GlobalTransform {
        GlobalTransform::from(
            Transform::from_translation(at).with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
        )
    }

    fn down_from(x: f32, z: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, 100.0, z), Dir3::NEG_Y)
    }

    #[test]
    fn test_normalize_pointer_corners() {
        let surface = Vec2::new(800.0, 600.0);
        assert_eq!(normalize_pointer(Vec2::ZERO, surface), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_pointer(surface, surface), Vec2::new(1.0, -1.0));
        assert_eq!(
            normalize_pointer(Vec2::new(400.0, 300.0), surface),
            Vec2::ZERO
        );
    }

    #[test]
    fn test_ray_hits_flat_card() {
        let card = flat_card(Vec3::new(0.0, 1.0, 0.0));
        let distance = card_hit_distance(down_from(2.0, -8.0), &card, HALF).unwrap();
        assert!((distance - (99.0 - 0.005)).abs() < 1e-3);
    }

    #[test]
    fn test_ray_misses_beside_card() {
        let card = flat_card(Vec3::ZERO);
        assert!(card_hit_distance(down_from(7.0, 0.0), &card, HALF).is_none());
        assert!(card_hit_distance(down_from(0.0, 9.5), &card, HALF).is_none());
    }

    #[test]
    fn test_scaled_card_grows_its_hit_area() {
        let card = GlobalTransform::from(
            Transform::from_xyz(0.0, 0.0, 0.0)
                .with_rotation(Quat::from_rotation_x(-FRAC_PI_2))
                .with_scale(Vec3::new(1.2, 1.2, 1.0)),
        );
        let distance = card_hit_distance(down_from(7.5, 0.0), &card, HALF).unwrap();
        assert!((distance - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_nearest_card_wins_a_stack() {
        let mut world = World::new();
        let lower = world.spawn_empty().id();
        let upper = world.spawn_empty().id();
        let lower_transform = flat_card(Vec3::new(75.0, 1.0, 50.0));
        let upper_transform = flat_card(Vec3::new(75.0, 1.2, 50.0));

        let (hit, _) = nearest_card(
            down_from(75.0, 50.0),
            [(lower, &lower_transform), (upper, &upper_transform)],
            HALF,
        )
        .unwrap();
        assert_eq!(hit, upper);

        assert!(nearest_card(down_from(0.0, 0.0), [(lower, &lower_transform)], HALF).is_none());
    }

    #[test]
    fn test_hover_transitions() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut hovered = HoveredCard::default();

        assert_eq!(
            hovered.track(Some(a)),
            HoverTransition {
                exited: None,
                entered: Some(a)
            }
        );
        assert_eq!(hovered.track(Some(a)), HoverTransition::default());
        assert_eq!(
            hovered.track(Some(b)),
            HoverTransition {
                exited: Some(a),
                entered: Some(b)
            }
        );
        assert_eq!(
            hovered.track(None),
            HoverTransition {
                exited: Some(b),
                entered: None
            }
        );
        assert_eq!(hovered.0, None);
    }

    fn spawn_flat(world: &mut World, location: Location, at: Vec3) -> Entity {
        let transform =
            Transform::from_translation(at).with_rotation(Quat::from_rotation_x(-FRAC_PI_2));
        world
            .spawn((
                Card::at(location),
                transform,
                GlobalTransform::from(transform),
            ))
            .id()
    }

    fn in_flight() -> InFlight {
        InFlight::new(Transform::default(), Duration::from_millis(250))
    }

    #[test]
    fn test_hit_tester_skips_cards_in_flight() {
        let mut world = World::new();
        world.insert_resource(BoardSettings::default());
        let lower = spawn_flat(&mut world, Location::Deck, Vec3::new(75.0, 1.0, 50.0));
        let upper = spawn_flat(&mut world, Location::Deck, Vec3::new(75.0, 1.2, 50.0));
        let ray = down_from(75.0, 50.0);
        let mut hit_tester = SystemState::<HitTester>::new(&mut world);

        assert_eq!(
            hit_tester.get(&world).card_on(ray),
            Some((upper, Location::Deck))
        );

        world.entity_mut(upper).insert(in_flight());
        assert_eq!(
            hit_tester.get(&world).card_on(ray),
            Some((lower, Location::Deck))
        );

        world.entity_mut(lower).insert(in_flight());
        assert_eq!(hit_tester.get(&world).card_on(ray), None);
    }

    #[derive(Resource, Default)]
    struct Requests(Vec<BoardRequest>);

    fn record_requests(mut requests: MessageReader<BoardRequest>, mut log: ResMut<Requests>) {
        log.0.extend(requests.read().copied());
    }

    fn pointer_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, TweeningPlugin));
        app.insert_resource(BoardSettings::default());
        app.init_resource::<ButtonInput<MouseButton>>();
        app.configure_sets(
            Update,
            (
                AppSystems::TickTimers,
                AppSystems::RecordInput,
                AppSystems::Update,
            )
                .chain(),
        );
        app.add_plugins((crate::board::logic_plugin, plugin));
        app.init_resource::<Requests>();
        app.add_systems(Last, record_requests);
        app
    }

    fn spawn_in_zone(app: &mut App, location: Location, at: Vec3) -> Entity {
        let entity = spawn_flat(app.world_mut(), location, at);
        app.world_mut()
            .resource_mut::<Zones>()
            .place(entity, &Card::at(location));
        entity
    }

    fn aim(app: &mut App, ray: Option<Ray3d>) {
        let mut pointer = app.world_mut().resource_mut::<Pointer>();
        pointer.ray = ray;
        pointer.moved = true;
        app.update();
    }

    fn click(app: &mut App) {
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.update();
        let mut mouse = app.world_mut().resource_mut::<ButtonInput<MouseButton>>();
        mouse.release_all();
        mouse.clear();
    }

    fn requests(app: &App) -> Vec<BoardRequest> {
        app.world().resource::<Requests>().0.clone()
    }

    #[test]
    fn test_clicking_the_deck_draws_one() {
        let mut app = pointer_app();
        spawn_in_zone(&mut app, Location::Deck, Vec3::new(75.0, 1.0, 50.0));

        aim(&mut app, Some(down_from(75.0, 50.0)));
        click(&mut app);

        assert_eq!(requests(&app), vec![BoardRequest::Draw { count: 1 }]);
        assert_eq!(app.world().resource::<Zones>().hand.len(), 1);
    }

    #[test]
    fn test_click_anywhere_while_inspecting_zooms_down() {
        let mut app = pointer_app();
        let card = spawn_in_zone(&mut app, Location::Hand, Vec3::new(0.0, 15.0, 90.0));
        spawn_in_zone(&mut app, Location::Deck, Vec3::new(75.0, 1.0, 50.0));

        aim(&mut app, Some(down_from(0.0, 90.0)));
        click(&mut app);
        assert_eq!(requests(&app), vec![BoardRequest::ZoomUp(card)]);
        assert!(app.world().resource::<EventGate>().is_allowed(GateFlags::HOP_UP));

        // Empty table, then the deck: both hop the inspected card back down.
        aim(&mut app, None);
        click(&mut app);
        aim(&mut app, Some(down_from(75.0, 50.0)));
        click(&mut app);
        assert_eq!(
            requests(&app),
            vec![
                BoardRequest::ZoomUp(card),
                BoardRequest::ZoomDown(card),
                BoardRequest::ZoomDown(card),
            ]
        );
        // The deck click did not draw.
        assert_eq!(app.world().resource::<Zones>().hand, vec![card]);
    }

    #[test]
    fn test_cards_in_flight_ignore_clicks() {
        let mut app = pointer_app();
        let card = spawn_in_zone(&mut app, Location::Hand, Vec3::new(0.0, 15.0, 90.0));
        app.world_mut().entity_mut(card).insert(in_flight());

        aim(&mut app, Some(down_from(0.0, 90.0)));
        click(&mut app);

        assert!(requests(&app).is_empty());
        assert_eq!(app.world().resource::<HoveredCard>().0, None);
    }

    #[test]
    fn test_hovering_a_hand_card_lifts_it() {
        let mut app = pointer_app();
        let card = spawn_in_zone(&mut app, Location::Hand, Vec3::new(0.0, 15.0, 90.0));
        let settings = BoardSettings::default();

        aim(&mut app, Some(down_from(0.0, 90.0)));
        assert_eq!(app.world().resource::<HoveredCard>().0, Some(card));
        let lift = &app.world().get::<CardMotion>(card).unwrap().0;
        let lifted = lift.end_pose(&Transform::default());
        assert!((lifted.translation.y - (settings.hand_height + settings.hover_rise)).abs() < 1e-4);
        assert!(app.world().get::<InFlight>(card).is_none());

        aim(&mut app, None);
        assert_eq!(app.world().resource::<HoveredCard>().0, None);
        let settle = &app.world().get::<CardMotion>(card).unwrap().0;
        let rested = settle.end_pose(&Transform::default());
        assert!((rested.translation.y - settings.hand_height).abs() < 1e-4);
        assert_eq!(rested.scale, Vec3::ONE);
    }
}
