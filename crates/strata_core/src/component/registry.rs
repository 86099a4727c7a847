//! Typed component storage.
//!
//! One store per registered component kind, keyed by `TypeId`. Access from
//! Rust code is fully typed; the string name is only used for logging and
//! [`ComponentRegistry::has_named`].

use std::any::{Any, TypeId};
use std::collections::HashMap;

use tracing::{debug, warn};

use super::{Attached, Component, ComponentContext, DeferredRemovals, EntityAccess};
use crate::ecs::EntityId;

/// Erased view of a [`TypedStore`] so heterogeneous stores share one list.
trait ErasedStore {
    fn name(&self) -> &'static str;
    fn has(&self, entity: EntityId) -> bool;
    fn detach(&mut self, entity: EntityId, ctx: &mut ComponentContext<'_>) -> bool;
    fn run_system(&mut self, dt: f32, ctx: &mut ComponentContext<'_>);
    fn run_render_system(&mut self, dt: f32, ctx: &mut ComponentContext<'_>);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedStore<C: Component> {
    component: C,
    records: Vec<Attached<C::State>>,
    index: HashMap<EntityId, usize>,
}

impl<C: Component> TypedStore<C> {
    fn new(component: C) -> Self {
        Self {
            component,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn state(&self, entity: EntityId) -> Option<&C::State> {
        self.index.get(&entity).map(|&i| &self.records[i].state)
    }

    fn state_mut(&mut self, entity: EntityId) -> Option<&mut C::State> {
        let i = *self.index.get(&entity)?;
        Some(&mut self.records[i].state)
    }
}

impl<C: Component> ErasedStore for TypedStore<C> {
    fn name(&self) -> &'static str {
        C::NAME
    }

    fn has(&self, entity: EntityId) -> bool {
        self.index.contains_key(&entity)
    }

    fn detach(&mut self, entity: EntityId, ctx: &mut ComponentContext<'_>) -> bool {
        let Some(i) = self.index.remove(&entity) else {
            return false;
        };
        let mut record = self.records.swap_remove(i);
        if let Some(moved) = self.records.get(i) {
            self.index.insert(moved.entity, i);
        }
        self.component.on_remove(entity, &mut record.state, ctx);
        debug!("detached {} from entity {entity}", C::NAME);
        true
    }

    fn run_system(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        if !self.records.is_empty() {
            self.component.system(dt, &mut self.records, ctx);
        }
    }

    fn run_render_system(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        if !self.records.is_empty() {
            self.component.render_system(dt, &mut self.records, ctx);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Holds every registered component kind and its attached records.
///
/// # Example
///
/// ```rust,ignore
/// let mut components = ComponentRegistry::new();
/// components.register(FollowsEntity);
///
/// components.add_component::<FollowsEntity>(follower, |s| s.target = leader, &mut store);
/// components.run_systems(dt, &mut store);
/// ```
#[derive(Default)]
pub struct ComponentRegistry {
    stores: Vec<Box<dyn ErasedStore>>,
    by_type: HashMap<TypeId, usize>,
    deferred: DeferredRemovals,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component kind. Returns `false` if it was already registered.
    pub fn register<C: Component>(&mut self, component: C) -> bool {
        let kind = TypeId::of::<C>();
        if self.by_type.contains_key(&kind) {
            return false;
        }
        self.by_type.insert(kind, self.stores.len());
        self.stores.push(Box::new(TypedStore::new(component)));
        debug!("registered component {}", C::NAME);
        true
    }

    /// True if `C` has been registered.
    #[must_use]
    pub fn is_registered<C: Component>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<C>())
    }

    fn store<C: Component>(&self) -> Option<&TypedStore<C>> {
        let &i = self.by_type.get(&TypeId::of::<C>())?;
        self.stores[i].as_any().downcast_ref::<TypedStore<C>>()
    }

    fn store_mut<C: Component>(&mut self) -> Option<&mut TypedStore<C>> {
        let &i = self.by_type.get(&TypeId::of::<C>())?;
        self.stores[i].as_any_mut().downcast_mut::<TypedStore<C>>()
    }

    /// Attaches `C` to `entity`.
    ///
    /// The record starts from [`Component::default_state`], `init` is applied
    /// over it, then [`Component::on_add`] runs. Returns `false` without side
    /// effects if `C` is not registered, the entity does not exist, or the
    /// entity already has a `C` record.
    pub fn add_component<C: Component>(
        &mut self,
        entity: EntityId,
        init: impl FnOnce(&mut C::State),
        entities: &mut dyn EntityAccess,
    ) -> bool {
        if !entities.contains(entity) {
            return false;
        }
        let Some(&i) = self.by_type.get(&TypeId::of::<C>()) else {
            warn!("component {} is not registered", C::NAME);
            return false;
        };
        let Some(store) = self.stores[i].as_any_mut().downcast_mut::<TypedStore<C>>() else {
            return false;
        };
        if store.index.contains_key(&entity) {
            return false;
        }

        let mut state = store.component.default_state();
        init(&mut state);
        let mut ctx = ComponentContext::new(entities, &mut self.deferred);
        store.component.on_add(entity, &mut state, &mut ctx);

        store.index.insert(entity, store.records.len());
        store.records.push(Attached { entity, state });
        debug!("attached {} to entity {entity}", C::NAME);
        true
    }

    /// True if `entity` has a `C` record.
    #[must_use]
    pub fn has<C: Component>(&self, entity: EntityId) -> bool {
        self.store::<C>().is_some_and(|s| s.has(entity))
    }

    /// True if `entity` has a record of the component registered as `name`.
    #[must_use]
    pub fn has_named(&self, name: &str, entity: EntityId) -> bool {
        self.stores
            .iter()
            .any(|s| s.name() == name && s.has(entity))
    }

    /// Names of every registered component kind, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stores.iter().map(|s| s.name())
    }

    /// The `C` record of `entity`.
    #[must_use]
    pub fn state<C: Component>(&self, entity: EntityId) -> Option<&C::State> {
        self.store::<C>()?.state(entity)
    }

    /// Mutable access to the `C` record of `entity`.
    pub fn state_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C::State> {
        self.store_mut::<C>()?.state_mut(entity)
    }

    /// Every `C` record.
    #[must_use]
    pub fn states<C: Component>(&self) -> &[Attached<C::State>] {
        self.store::<C>().map_or(&[][..], |s| s.records.as_slice())
    }

    /// Detaches `C` from `entity` now. Returns `false` if there was no record.
    pub fn remove_component<C: Component>(
        &mut self,
        entity: EntityId,
        entities: &mut dyn EntityAccess,
    ) -> bool {
        let Some(&i) = self.by_type.get(&TypeId::of::<C>()) else {
            return false;
        };
        let mut ctx = ComponentContext::new(entities, &mut self.deferred);
        self.stores[i].detach(entity, &mut ctx)
    }

    /// Detaches `C` from `entity` at the end of the current (or next) pass.
    pub fn remove_component_later<C: Component>(&mut self, entity: EntityId) {
        self.deferred.push(TypeId::of::<C>(), entity);
    }

    /// Detaches every component from `entity`. Returns the number detached.
    pub fn remove_entity(&mut self, entity: EntityId, entities: &mut dyn EntityAccess) -> usize {
        let mut detached = 0;
        for store in &mut self.stores {
            let mut ctx = ComponentContext::new(&mut *entities, &mut self.deferred);
            if store.detach(entity, &mut ctx) {
                detached += 1;
            }
        }
        detached
    }

    /// Runs every simulation system, then applies deferred detachments.
    pub fn run_systems(&mut self, dt: f32, entities: &mut dyn EntityAccess) {
        for store in &mut self.stores {
            let mut ctx = ComponentContext::new(&mut *entities, &mut self.deferred);
            store.run_system(dt, &mut ctx);
        }
        self.apply_deferred(entities);
    }

    /// Runs every render system, then applies deferred detachments.
    pub fn run_render_systems(&mut self, dt: f32, entities: &mut dyn EntityAccess) {
        for store in &mut self.stores {
            let mut ctx = ComponentContext::new(&mut *entities, &mut self.deferred);
            store.run_render_system(dt, &mut ctx);
        }
        self.apply_deferred(entities);
    }

    /// Applies queued detachments, including any queued by `on_remove` hooks.
    pub fn apply_deferred(&mut self, entities: &mut dyn EntityAccess) {
        while !self.deferred.is_empty() {
            for (kind, entity) in self.deferred.take() {
                let Some(&i) = self.by_type.get(&kind) else {
                    continue;
                };
                let mut ctx = ComponentContext::new(&mut *entities, &mut self.deferred);
                self.stores[i].detach(entity, &mut ctx);
            }
        }
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use strata_shared::Vec3;

    use super::*;
    use crate::backend::KinematicPhysics;
    use crate::ecs::{EntitySpec, EntityStore};

    /// Records lifecycle calls into a shared log.
    struct Probe {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Component for Probe {
        const NAME: &'static str = "probe";
        type State = u32;

        fn default_state(&self) -> u32 {
            7
        }

        fn on_add(&mut self, _entity: EntityId, state: &mut u32, _ctx: &mut ComponentContext<'_>) {
            self.log.borrow_mut().push(format!("add {state}"));
        }

        fn on_remove(&mut self, _entity: EntityId, state: &mut u32, _ctx: &mut ComponentContext<'_>) {
            self.log.borrow_mut().push(format!("remove {state}"));
        }

        fn system(&mut self, _dt: f32, states: &mut [Attached<u32>], ctx: &mut ComponentContext<'_>) {
            for record in states.iter_mut() {
                record.state += 1;
                if record.state > 10 {
                    ctx.remove_component_later::<Probe>(record.entity);
                }
            }
        }
    }

    fn setup() -> (ComponentRegistry, EntityStore<KinematicPhysics>, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ComponentRegistry::new();
        registry.register(Probe { log: Rc::clone(&log) });
        (registry, EntityStore::new(KinematicPhysics::new()), log)
    }

    #[test]
    fn test_init_applied_before_on_add() {
        let (mut registry, mut store, log) = setup();
        let id = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));

        assert!(registry.add_component::<Probe>(id, |s| *s += 1, &mut store));
        assert_eq!(registry.state::<Probe>(id), Some(&8));
        assert_eq!(log.borrow().as_slice(), ["add 8"]);
    }

    #[test]
    fn test_double_add_is_rejected() {
        let (mut registry, mut store, log) = setup();
        let id = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));

        assert!(registry.add_component::<Probe>(id, |_| {}, &mut store));
        assert!(!registry.add_component::<Probe>(id, |s| *s = 0, &mut store));
        assert_eq!(registry.state::<Probe>(id), Some(&7));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent_and_calls_hook_once() {
        let (mut registry, mut store, log) = setup();
        let id = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
        registry.add_component::<Probe>(id, |_| {}, &mut store);

        assert!(registry.remove_component::<Probe>(id, &mut store));
        assert!(!registry.remove_component::<Probe>(id, &mut store));
        assert!(!registry.has::<Probe>(id));
        assert_eq!(log.borrow().as_slice(), ["add 7", "remove 7"]);
    }

    #[test]
    fn test_deferred_removal_applied_after_systems() {
        let (mut registry, mut store, log) = setup();
        let id = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
        registry.add_component::<Probe>(id, |s| *s = 10, &mut store);

        registry.run_systems(50.0, &mut store);

        assert!(!registry.has::<Probe>(id));
        assert_eq!(log.borrow().last().map(String::as_str), Some("remove 11"));
    }

    #[test]
    fn test_swap_remove_keeps_index_consistent() {
        let (mut registry, mut store, _log) = setup();
        let a = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
        let b = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
        let c = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
        registry.add_component::<Probe>(a, |s| *s = 1, &mut store);
        registry.add_component::<Probe>(b, |s| *s = 2, &mut store);
        registry.add_component::<Probe>(c, |s| *s = 3, &mut store);

        registry.remove_component::<Probe>(a, &mut store);

        assert_eq!(registry.state::<Probe>(b), Some(&2));
        assert_eq!(registry.state::<Probe>(c), Some(&3));
        assert_eq!(registry.states::<Probe>().len(), 2);
    }

    #[test]
    fn test_name_lookup_and_unregistered_kind() {
        let (mut registry, mut store, _log) = setup();
        let id = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0));
        registry.add_component::<Probe>(id, |_| {}, &mut store);

        assert!(registry.has_named("probe", id));
        assert!(!registry.has_named("missing", id));
        assert_eq!(registry.remove_entity(id, &mut store), 1);
        assert!(!registry.has_named("probe", id));
    }
}
