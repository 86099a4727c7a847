//! # STRATA Simulation Loop
//!
//! ```text
//! tick():                                  render(frame_part):
//! ┌──────────────────────────────────┐     ┌──────────────────────────────────┐
//! │ 1. world.tick                    │     │ 1. dt = frame_part * tick_rate   │
//! │    └─ no chunks yet? stop here   │     │ 2. clear pointer deltas          │
//! │ 2. physics.tick                  │     │ 3. BeforeRender                  │
//! │ 3. entities.step                 │     │ 4. render positions + systems    │
//! │    ├─ flush removals             │     │ 5. sync visuals                  │
//! │    ├─ entity/terrain collisions  │     │ 6. render.render                 │
//! │    └─ visual sync + entity ticks │     │ 7. AfterRender                   │
//! │ 4. component systems             │     └──────────────────────────────────┘
//! │ 5. render.tick                   │
//! │ 6. block targeting               │
//! │ 7. Tick                          │
//! └──────────────────────────────────┘
//! ```
//!
//! Paused engines skip both entirely.

use strata_core::{
    BodySettings, Component, ComponentRegistry, EntityId, EntitySpec, EntityStore, FollowsEntity,
    PhysicsBackend,
};
use strata_shared::{BlockPos, Vec3};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::ConfigResult;
use crate::events::{EngineEvent, EventBus, EventReceiver};
use crate::render::{BlockFace, RenderBackend};
use crate::targeting::{self, BlockTargeter, PickResult, TargetUpdate, TargetedBlock};
use crate::world::VoxelWorld;

/// Gravity multiplier applied to the player body.
const PLAYER_GRAVITY_MULTIPLIER: f32 = 2.0;

/// The engine facade: owns the world, renderer, entities and components and
/// drives them at a fixed step.
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = Engine::new(EngineConfig::default(), world, renderer, KinematicPhysics::new())?;
/// let events = engine.subscribe();
///
/// engine.tick();
/// engine.render(0.5);
/// for event in events.drain() { /* ... */ }
/// ```
pub struct Engine<W: VoxelWorld, R: RenderBackend, P: PhysicsBackend> {
    config: EngineConfig,
    world: W,
    render: R,
    entities: EntityStore<P>,
    components: ComponentRegistry,
    targeter: BlockTargeter,
    events: EventBus,
    player: EntityId,
    camera_target: EntityId,
    player_eye_offset: f32,
    paused: bool,
    default_highlighting: bool,
    pointer_delta: (f32, f32),
    /// Completed simulation steps.
    tick_count: u64,
    /// Completed render frames.
    frame_count: u64,
}

impl<W: VoxelWorld, R: RenderBackend, P: PhysicsBackend> Engine<W, R, P> {
    /// Creates an engine, its player entity and the camera target that
    /// follows the player's eye.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::Invalid`] if `config` fails validation.
    pub fn new(config: EngineConfig, world: W, render: R, physics: P) -> ConfigResult<Self> {
        config.validate()?;

        let mut entities = EntityStore::new(physics);
        let mut components = ComponentRegistry::new();
        components.register(FollowsEntity);

        let player = entities.add(
            EntitySpec::new(config.player_start, config.player_width, config.player_height)
                .with_physics_body()
                .colliding_with_terrain()
                .colliding_with_entities(),
        );
        if let Some(body) = entities.body(player) {
            entities.physics_mut().configure_body(
                body,
                BodySettings {
                    gravity_multiplier: PLAYER_GRAVITY_MULTIPLIER,
                    auto_step: config.player_auto_step,
                },
            );
        }

        let player_eye_offset = config.eye_offset();
        let camera_target = entities.add(EntitySpec::new(config.player_start, 0.0, 0.0));
        components.add_component::<FollowsEntity>(
            camera_target,
            |state| {
                state.target = player;
                state.offset = Vec3::new(0.0, player_eye_offset, 0.0);
            },
            &mut entities,
        );

        info!(
            "engine ready: tick rate {}ms, player {player} at {:?}",
            config.tick_rate, config.player_start
        );

        Ok(Self {
            events: EventBus::new(config.event_capacity),
            default_highlighting: !config.skip_default_highlighting,
            config,
            world,
            render,
            entities,
            components,
            targeter: BlockTargeter::new(),
            player,
            camera_target,
            player_eye_offset,
            paused: false,
            pointer_delta: (0.0, 0.0),
            tick_count: 0,
            frame_count: 0,
        })
    }

    // =========================================================================
    // Loop
    // =========================================================================

    /// Advances the simulation by one fixed step.
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        let dt = self.config.tick_rate;

        self.world.tick(dt);
        if !self.world.has_loaded_chunks() {
            return;
        }
        self.entities.physics_mut().tick(dt);

        let removed = self.entities.step(dt, &mut self.render);
        for id in removed {
            self.components.remove_entity(id, &mut self.entities);
        }
        self.components.run_systems(dt, &mut self.entities);

        self.render.tick(dt);
        self.update_block_target();
        self.events.publish(EngineEvent::Tick(dt));
        self.tick_count += 1;
    }

    /// Draws one frame. `frame_part` is the fraction of a step elapsed since
    /// the last [`Engine::tick`].
    pub fn render(&mut self, frame_part: f32) {
        if self.paused {
            return;
        }
        let dt = frame_part * self.config.tick_rate;
        self.pointer_delta = (0.0, 0.0);

        self.events.publish(EngineEvent::BeforeRender(dt));
        self.entities.update_render_positions(dt);
        self.components.run_render_systems(dt, &mut self.entities);
        self.entities.sync_render_visuals(&mut self.render);
        self.render.render(dt);
        self.events.publish(EngineEvent::AfterRender(dt));
        self.frame_count += 1;
    }

    fn update_block_target(&mut self) {
        let update = match self.player_eye_position() {
            Some(eye) => self.targeter.update(
                &self.world,
                eye,
                self.render.aim_direction(),
                self.config.block_test_distance,
            ),
            None => self.targeter.clear(),
        };

        if let TargetUpdate::Changed(target) = update {
            if self.default_highlighting {
                self.render.highlight_block_face(target.map(|t| BlockFace {
                    position: t.position,
                    normal: t.normal,
                }));
            }
            self.events.publish(EngineEvent::TargetBlockChanged(target));
        }
    }

    /// Pauses or resumes the loop. Resuming discards accumulated pointer motion.
    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            info!("engine {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
        if !paused {
            self.pointer_delta = (0.0, 0.0);
        }
    }

    /// True while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Block id at `pos`.
    #[must_use]
    pub fn get_block(&self, pos: BlockPos) -> u32 {
        self.world.block_id(pos)
    }

    /// Writes a block without checking for entities in the way.
    pub fn set_block(&mut self, id: u32, pos: BlockPos) {
        self.world.set_block_id(id, pos);
    }

    /// Places a block unless a terrain-colliding entity occupies the cell.
    ///
    /// Returns `false` (and leaves the world untouched) when refused.
    pub fn add_block(&mut self, id: u32, pos: BlockPos) -> bool {
        if self.entities.is_terrain_blocked(pos) {
            debug!("refused block {id} at {pos}: cell is occupied");
            return false;
        }
        self.world.set_block_id(id, pos);
        true
    }

    /// Raycasts through the world.
    ///
    /// `origin` defaults to the player's eye, `direction` to the camera aim
    /// and `max_distance` to `block_test_distance`. A `max_distance` of zero
    /// never hits. With `collision_only` only solid blocks stop the ray.
    #[must_use]
    pub fn pick(
        &self,
        origin: Option<Vec3>,
        direction: Option<Vec3>,
        max_distance: Option<f32>,
        collision_only: bool,
    ) -> Option<PickResult> {
        if max_distance == Some(0.0) {
            return None;
        }
        let origin = origin.or_else(|| self.player_eye_position())?;
        let direction = direction.unwrap_or_else(|| self.render.aim_direction());
        let max_distance = max_distance.unwrap_or(self.config.block_test_distance);
        targeting::pick(&self.world, origin, direction, max_distance, collision_only)
    }

    /// The block targeted as of the last step.
    #[must_use]
    pub fn targeted_block(&self) -> Option<TargetedBlock> {
        self.targeter.target()
    }

    /// Enables or disables the built-in outline of the targeted block face.
    pub fn set_default_highlighting(&mut self, enabled: bool) {
        if self.default_highlighting && !enabled {
            self.render.highlight_block_face(None);
        }
        self.default_highlighting = enabled;
    }

    // =========================================================================
    // Player
    // =========================================================================

    /// The player entity.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// The entity that follows the player's eye (the camera's anchor).
    #[must_use]
    pub fn camera_target(&self) -> EntityId {
        self.camera_target
    }

    /// Bottom-center of the player box.
    #[must_use]
    pub fn player_position(&self) -> Option<Vec3> {
        self.entities.position(self.player)
    }

    /// Player position raised by the eye offset.
    #[must_use]
    pub fn player_eye_position(&self) -> Option<Vec3> {
        self.player_position()
            .map(|feet| feet + Vec3::new(0.0, self.player_eye_offset, 0.0))
    }

    /// Current eye offset above the player's feet.
    #[must_use]
    pub fn player_eye_offset(&self) -> f32 {
        self.player_eye_offset
    }

    /// Moves the eye, and the camera target with it.
    pub fn set_player_eye_offset(&mut self, y: f32) {
        self.player_eye_offset = y;
        if let Some(state) = self.components.state_mut::<FollowsEntity>(self.camera_target) {
            state.offset.y = y;
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Accumulates pointer motion until the next render frame.
    pub fn add_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.pointer_delta.0 += dx;
        self.pointer_delta.1 += dy;
    }

    /// Pointer motion accumulated since the last render frame.
    #[must_use]
    pub fn pointer_delta(&self) -> (f32, f32) {
        self.pointer_delta
    }

    // =========================================================================
    // Events & components
    // =========================================================================

    /// Subscribes to engine events.
    pub fn subscribe(&mut self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Registers a component kind. Returns `false` if already registered.
    pub fn register_component<C: Component>(&mut self, component: C) -> bool {
        self.components.register(component)
    }

    /// Attaches `C` to `entity`; see [`ComponentRegistry::add_component`].
    pub fn add_component<C: Component>(
        &mut self,
        entity: EntityId,
        init: impl FnOnce(&mut C::State),
    ) -> bool {
        self.components
            .add_component::<C>(entity, init, &mut self.entities)
    }

    /// Detaches `C` from `entity` immediately.
    pub fn remove_component<C: Component>(&mut self, entity: EntityId) -> bool {
        self.components
            .remove_component::<C>(entity, &mut self.entities)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fixed step length in milliseconds.
    #[must_use]
    pub fn tick_rate(&self) -> f32 {
        self.config.tick_rate
    }

    /// Completed simulation steps.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Completed render frames.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The voxel world.
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Mutable access to the voxel world.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// The renderer.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.render
    }

    /// Mutable access to the renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.render
    }

    /// The entity store.
    #[must_use]
    pub fn entities(&self) -> &EntityStore<P> {
        &self.entities
    }

    /// Mutable access to the entity store.
    pub fn entities_mut(&mut self) -> &mut EntityStore<P> {
        &mut self.entities
    }

    /// The component registry.
    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }
}
