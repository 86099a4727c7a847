//! Keeps an entity at a fixed offset from another entity.

use strata_shared::Vec3;

use super::{Attached, Component, ComponentContext};
use crate::ecs::EntityId;

/// State of a [`FollowsEntity`] record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowState {
    /// Entity being followed.
    pub target: EntityId,
    /// Offset from the target's position.
    pub offset: Vec3,
}

impl Default for FollowState {
    fn default() -> Self {
        Self {
            target: EntityId::NULL,
            offset: Vec3::ZERO,
        }
    }
}

/// Moves the owner to `target + offset` every step, and its render position
/// to `target.render_position + offset` every frame.
///
/// When the target disappears the record detaches itself at the end of the
/// pass; the owning entity is left untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct FollowsEntity;

impl FollowsEntity {
    fn sync_position(entity: EntityId, state: &FollowState, ctx: &mut ComponentContext<'_>) {
        match ctx.position(state.target) {
            Some(target) => {
                ctx.set_position(entity, target + state.offset);
            }
            None => ctx.remove_component_later::<Self>(entity),
        }
    }

    fn sync_render_position(entity: EntityId, state: &FollowState, ctx: &mut ComponentContext<'_>) {
        match ctx.render_position(state.target) {
            Some(target) => {
                ctx.set_render_position(entity, target + state.offset);
            }
            None => ctx.remove_component_later::<Self>(entity),
        }
    }
}

impl Component for FollowsEntity {
    const NAME: &'static str = "followsEntity";

    type State = FollowState;

    fn default_state(&self) -> FollowState {
        FollowState::default()
    }

    fn on_add(&mut self, entity: EntityId, state: &mut FollowState, ctx: &mut ComponentContext<'_>) {
        Self::sync_position(entity, state, ctx);
        Self::sync_render_position(entity, state, ctx);
    }

    fn system(&mut self, _dt: f32, states: &mut [Attached<FollowState>], ctx: &mut ComponentContext<'_>) {
        for record in states.iter() {
            Self::sync_position(record.entity, &record.state, ctx);
        }
    }

    fn render_system(
        &mut self,
        _dt: f32,
        states: &mut [Attached<FollowState>],
        ctx: &mut ComponentContext<'_>,
    ) {
        for record in states.iter() {
            Self::sync_render_position(record.entity, &record.state, ctx);
        }
    }
}
