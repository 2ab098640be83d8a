//! Board scene - camera, lights, table, cards, caption, and the inspection backdrop.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use bevy::{
    asset::LoadState, color::Srgba, light::NotShadowCaster, prelude::*, render::alpha::AlphaMode,
};
use bevy_rich_text3d::{Text3d, Text3dStyling, TextAlign, TextAnchor, TextAtlas};

use super::{Backdrop, Card, CastsShadow, Facing, Location, Zones, orbit::OrbitCamera};
use crate::{AppSystems, config::BoardSettings};

const SKY: Color = Color::srgb(0.733, 1.0, 1.0);
const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 180.0, 180.0);
const LIGHT_POSITION: Vec3 = Vec3::new(0.0, 150.0, 150.0);
const PLACEHOLDER: Color = Color::srgb(0.55, 0.55, 0.6);
const CAPTION_DISTANCE: f32 = 15.0;
const BACKDROP_DISTANCE: f32 = 60.0;
const FIELD_SLOTS: usize = 5;

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(ClearColor(SKY));
    app.add_systems(Startup, (spawn_stage, spawn_cards).chain());
    app.add_systems(
        Update,
        (sync_shadow_casting, sync_backdrop_material, fall_back_on_failed_textures)
            .in_set(AppSystems::Update),
    );
}

/// The camera cards are picked through.
#[derive(Component, Debug, Default)]
pub struct BoardCamera;

/// Shared card materials, and the images they were built from.
#[derive(Resource, Debug)]
struct CardMaterials {
    face: Handle<StandardMaterial>,
    back: Handle<StandardMaterial>,
    face_image: Handle<Image>,
    back_image: Handle<Image>,
}

fn spawn_stage(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<BoardSettings>,
) {
    commands.insert_resource(GlobalAmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
        affects_lightmapped_meshes: true,
    });

    commands.spawn((
        Name::new("Board Light"),
        SpotLight {
            intensity: 60_000_000.0,
            range: 1000.0,
            outer_angle: FRAC_PI_4,
            inner_angle: FRAC_PI_4 * 0.8,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(LIGHT_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Name::new("Board Table"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(260.0, 220.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.18, 0.36, 0.24),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::default(),
    ));

    let slot_mesh = meshes.add(
        Plane3d::default()
            .mesh()
            .size(settings.card_width + 2.0, settings.card_height + 2.0),
    );
    let slot_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.12, 0.26, 0.17),
        perceptual_roughness: 0.95,
        ..default()
    });
    let deck_slot = Vec3::new(settings.deck_origin.x, 0.05, settings.deck_origin.z);
    commands.spawn((
        Name::new("Deck Slot"),
        Mesh3d(slot_mesh.clone()),
        MeshMaterial3d(slot_material.clone()),
        Transform::from_translation(deck_slot),
    ));
    for x in super::choreo::hand_layout(FIELD_SLOTS, settings.hand_pitch() * 1.5) {
        commands.spawn((
            Name::new("Field Slot"),
            Mesh3d(slot_mesh.clone()),
            MeshMaterial3d(slot_material.clone()),
            Transform::from_xyz(x, 0.05, settings.menu_card_position.z),
        ));
    }

    let text_material = materials.add(StandardMaterial {
        base_color_texture: Some(TextAtlas::DEFAULT_IMAGE.clone()),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    let backdrop_material = materials.add(StandardMaterial {
        base_color: Color::BLACK.with_alpha(0.0),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    commands
        .spawn((
            Name::new("Board Camera"),
            BoardCamera,
            OrbitCamera::around(Vec3::ZERO, CAMERA_POSITION),
            Camera3d::default(),
            Projection::from(PerspectiveProjection {
                fov: 70f32.to_radians(),
                far: 2000.0,
                ..default()
            }),
            Transform::from_translation(CAMERA_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
        ))
        .with_children(|parent| {
            parent.spawn((
                Name::new("Board Caption"),
                Text3d::new("3D-BOARD"),
                Text3dStyling {
                    size: 32.0,
                    color: Srgba::new(1.0, 1.0, 1.0, 0.5),
                    align: TextAlign::Center,
                    anchor: TextAnchor::CENTER,
                    world_scale: Some(Vec2::splat(1.5)),
                    ..default()
                },
                Mesh3d::default(),
                MeshMaterial3d(text_material),
                Transform::from_xyz(0.0, 0.0, -CAPTION_DISTANCE),
                NotShadowCaster,
            ));
            parent.spawn((
                Name::new("Backdrop"),
                Backdrop::default(),
                Mesh3d(meshes.add(Rectangle::new(200.0, 400.0))),
                MeshMaterial3d(backdrop_material),
                Transform::from_xyz(0.0, 0.0, -BACKDROP_DISTANCE),
                Visibility::Hidden,
                NotShadowCaster,
            ));
        });
}

fn spawn_cards(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    asset_server: Res<AssetServer>,
    settings: Res<BoardSettings>,
    mut zones: ResMut<Zones>,
) {
    let face_image: Handle<Image> = asset_server.load(settings.face_image.clone());
    let back_image: Handle<Image> = asset_server.load(settings.back_image.clone());
    let card_materials = CardMaterials {
        face: materials.add(StandardMaterial {
            base_color_texture: Some(face_image.clone()),
            unlit: true,
            ..default()
        }),
        back: materials.add(StandardMaterial {
            base_color_texture: Some(back_image.clone()),
            unlit: true,
            ..default()
        }),
        face_image,
        back_image,
    };
    let edge_material = materials.add(StandardMaterial {
        base_color: Color::BLACK,
        unlit: true,
        ..default()
    });

    let body = meshes.add(Cuboid::new(
        settings.card_width,
        settings.card_height,
        settings.card_thickness,
    ));
    let quad = meshes.add(Rectangle::new(settings.card_width, settings.card_height));
    let skin = settings.card_thickness * 0.5 + 0.002;

    let mut spawn_card = |commands: &mut Commands, name: &str, card: Card, facing: Facing, at: Vec3| {
        let entity = commands
            .spawn((
                Name::new(name.to_string()),
                card,
                facing,
                Transform::from_translation(at).with_rotation(facing.quat()),
                Mesh3d(body.clone()),
                MeshMaterial3d(edge_material.clone()),
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh3d(quad.clone()),
                    MeshMaterial3d(card_materials.face.clone()),
                    Transform::from_xyz(0.0, 0.0, skin),
                ));
                parent.spawn((
                    Mesh3d(quad.clone()),
                    MeshMaterial3d(card_materials.back.clone()),
                    Transform::from_xyz(0.0, 0.0, -skin).with_rotation(Quat::from_rotation_y(PI)),
                ));
            })
            .id();
        zones.place(entity, &card);
    };

    spawn_card(
        &mut commands,
        "Menu Card",
        Card::at(Location::MenuOpen),
        Facing(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        settings.menu_card_position,
    );
    for i in 0..settings.deck_size {
        spawn_card(
            &mut commands,
            "Deck Card",
            Card::at(Location::Deck),
            Facing(Vec3::new(-FRAC_PI_2, PI, 0.0)),
            settings.deck_origin + Vec3::Y * settings.deck_step * i as f32,
        );
    }
    info!("Spawned {} deck cards", settings.deck_size);

    commands.insert_resource(card_materials);
}

/// Mirror [`CastsShadow`] onto a card's body and its face/back quads.
fn sync_shadow_casting(
    mut commands: Commands,
    cards: Query<(Entity, &CastsShadow, &Children), Changed<CastsShadow>>,
) {
    for (entity, shadow, children) in &cards {
        for part in std::iter::once(entity).chain(children.iter()) {
            if shadow.0 {
                commands.entity(part).remove::<NotShadowCaster>();
            } else {
                commands.entity(part).insert(NotShadowCaster);
            }
        }
    }
}

fn sync_backdrop_material(
    backdrops: Query<(&Backdrop, &MeshMaterial3d<StandardMaterial>), Changed<Backdrop>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (backdrop, material) in &backdrops {
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = Color::BLACK.with_alpha(backdrop.opacity());
        }
    }
}

/// Swap a card texture that failed to load for a flat colour, so the board stays usable.
fn fall_back_on_failed_textures(
    card_materials: Option<Res<CardMaterials>>,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(card_materials) = card_materials else {
        return;
    };
    for (image, material) in [
        (&card_materials.face_image, &card_materials.face),
        (&card_materials.back_image, &card_materials.back),
    ] {
        if !matches!(asset_server.load_state(image.id()), LoadState::Failed(_)) {
            continue;
        }
        let Some(material) = materials.get_mut(material) else {
            continue;
        };
        if material.base_color_texture.is_some() {
            warn!(
                "Card image {:?} failed to load, using a placeholder",
                image.path()
            );
            material.base_color_texture = None;
            material.base_color = PLACEHOLDER;
        }
    }
}
