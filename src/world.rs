// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! World: the top-level container — the entity directory and the archetype table.

use ahash::AHashMap;
use slotmap::SlotMap;
#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::Archetype;
use crate::component::{self, Component, ComponentMask};
use crate::entity::{EntityId, EntityLocation};
use crate::error::{EcsError, Result};
use crate::query::{Query, QueryFilter};

/// The archetype-based entity/component store.
///
/// A `World` is exclusively owned by its caller; entity handles are plain `Copy` values
/// that borrow nothing, but [`Query`] and component references returned by [`World::get`]
/// borrow `&World` for their lifetime, so the borrow checker — not a runtime check —
/// forbids mutating the world while one is alive.
pub struct World {
    entity_locations: SlotMap<EntityId, EntityLocation>,
    archetypes: Vec<Archetype>,
    archetype_by_mask: AHashMap<ComponentMask, usize>,
    empty_archetype: usize,
}

impl World {
    pub fn new() -> Self {
        let mut archetypes = Vec::new();
        let mut archetype_by_mask = AHashMap::new();
        archetypes.push(Archetype::new(ComponentMask::EMPTY));
        archetype_by_mask.insert(ComponentMask::EMPTY, 0);
        Self {
            entity_locations: SlotMap::with_key(),
            archetypes,
            archetype_by_mask,
            empty_archetype: 0,
        }
    }

    /// Creates an entity with no components, placed in the empty archetype.
    pub fn create_entity(&mut self) -> EntityId {
        let location = EntityLocation {
            archetype_index: self.empty_archetype,
            row: 0, // patched below once we know the real slot id
        };
        let entity = self.entity_locations.insert(location);
        let row = self.archetypes[self.empty_archetype].allocate_row(entity);
        self.entity_locations[entity].row = row;
        entity
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entity_locations.contains_key(entity)
    }

    /// Destroys `entity`. A no-op if it is already dead (idempotent, per §7).
    pub fn destroy_entity(&mut self, entity: EntityId) {
        let Some(location) = self.entity_locations.remove(entity) else {
            return;
        };
        self.archetypes[location.archetype_index].remove_row(location.row);
    }

    fn get_or_create_archetype(&mut self, mask: ComponentMask) -> usize {
        if let Some(&index) = self.archetype_by_mask.get(&mask) {
            return index;
        }
        let index = self.archetypes.len();
        self.archetypes.push(Archetype::new(mask));
        self.archetype_by_mask.insert(mask, index);
        index
    }

    /// Moves `entity` from its current archetype to `target_index`, copying the bytes of
    /// every component present in both archetypes, dropping components only in the old
    /// one, and leaving components only in the new one uninitialized.
    fn move_entity(&mut self, entity: EntityId, target_index: usize) -> usize {
        let old_location = self.entity_locations[entity];
        debug_assert_ne!(old_location.archetype_index, target_index);

        #[cfg(feature = "profiling")]
        let span = info_span!(
            "world.move_entity",
            from = old_location.archetype_index,
            to = target_index
        );
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let (old_archetype, new_archetype) = borrow_two_mut(
            &mut self.archetypes,
            old_location.archetype_index,
            target_index,
        );

        let new_row = new_archetype.allocate_row(entity);
        for id in old_archetype.mask().iter() {
            if let Some(new_col_idx) = new_archetype.column_of(id) {
                let old_col_idx = old_archetype.column_of(id).unwrap();
                let src = old_archetype.column(old_col_idx);
                let dst = new_archetype.column_mut(new_col_idx);
                dst.copy_from(src, old_location.row, new_row);
            }
        }

        let target_mask = new_archetype.mask();
        self.archetypes[old_location.archetype_index]
            .vacate_row_except(old_location.row, target_mask);
        self.entity_locations[entity] = EntityLocation {
            archetype_index: target_index,
            row: new_row,
        };
        new_row
    }

    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        let Some(id) = component::id_of::<T>().ok() else {
            return false;
        };
        match self.entity_locations.get(entity) {
            Some(loc) => self.archetypes[loc.archetype_index].mask().contains(id),
            None => false,
        }
    }

    /// Returns a reference to `T` on `entity`, borrowed from `&self`.
    ///
    /// The returned reference's lifetime is tied to this immutable borrow of the world,
    /// so the borrow checker refuses any call requiring `&mut World` (migration via
    /// `add`/`remove`, or `destroy_entity`) while the reference is alive. Holding the
    /// reference across a migrating call is rejected at compile time:
    ///
    /// ```compile_fail
    /// use archetype_ecs_core::World;
    ///
    /// #[derive(Clone, Copy)]
    /// struct Pos(f32, f32);
    /// #[derive(Clone, Copy)]
    /// struct Vel(f32, f32);
    ///
    /// let mut world = World::new();
    /// let e = world.create_entity();
    /// world.add(e, Pos(0.0, 0.0)).unwrap();
    ///
    /// let pos = world.get::<Pos>(e).unwrap();
    /// world.add(e, Vel(1.0, 1.0)).unwrap(); // forces a migration while `pos` is alive
    /// println!("{}", pos.0);
    /// ```
    pub fn get<T: Component>(&self, entity: EntityId) -> Result<&T> {
        let id = component::id_of::<T>().map_err(|_| EcsError::ComponentMissing)?;
        let loc = self.entity_locations.get(entity).ok_or(EcsError::EntityDead)?;
        let archetype = &self.archetypes[loc.archetype_index];
        let col_idx = archetype.column_of(id).ok_or(EcsError::ComponentMissing)?;
        let ptr = archetype.column(col_idx).row(loc.row) as *const T;
        Ok(unsafe { &*ptr })
    }

    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T> {
        let id = component::id_of::<T>().map_err(|_| EcsError::ComponentMissing)?;
        let loc = *self.entity_locations.get(entity).ok_or(EcsError::EntityDead)?;
        let archetype = &mut self.archetypes[loc.archetype_index];
        let col_idx = archetype.column_of(id).ok_or(EcsError::ComponentMissing)?;
        let ptr = archetype.column_mut(col_idx).row(loc.row) as *mut T;
        Ok(unsafe { &mut *ptr })
    }

    /// Adds `value` as a new component on `entity`. Fails with
    /// [`EcsError::ComponentAlreadyPresent`] if `entity` already has `T`.
    pub fn add<T: Component>(&mut self, entity: EntityId, value: T) -> Result<()> {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.add", archetype_count = self.archetypes.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let id = component::id_of::<T>()?;
        let loc = *self.entity_locations.get(entity).ok_or(EcsError::EntityDead)?;
        let old_mask = self.archetypes[loc.archetype_index].mask();
        if old_mask.contains(id) {
            return Err(EcsError::ComponentAlreadyPresent);
        }
        let new_mask = old_mask.with(id);
        let target = self.get_or_create_archetype(new_mask);
        let new_row = self.move_entity(entity, target);

        let archetype = &mut self.archetypes[target];
        let col_idx = archetype.column_of(id).unwrap();
        unsafe {
            (archetype.column_mut(col_idx).row(new_row) as *mut T).write(value);
        }
        Ok(())
    }

    /// Sets `entity`'s `T` to `value`: overwrites in place if already present (no
    /// migration, no address change), otherwise behaves like `add`.
    pub fn set<T: Component>(&mut self, entity: EntityId, value: T) -> Result<()> {
        let id = component::id_of::<T>()?;
        let loc = *self.entity_locations.get(entity).ok_or(EcsError::EntityDead)?;
        let mask = self.archetypes[loc.archetype_index].mask();

        if mask.contains(id) {
            let archetype = &mut self.archetypes[loc.archetype_index];
            let col_idx = archetype.column_of(id).unwrap();
            let ptr = archetype.column_mut(col_idx).row(loc.row) as *mut T;
            unsafe {
                *ptr = value;
            }
            Ok(())
        } else {
            self.add(entity, value)
        }
    }

    /// Removes `T` from `entity`. A no-op if not present (idempotent, per §7).
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Result<()> {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.remove", archetype_count = self.archetypes.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let Ok(id) = component::id_of::<T>() else {
            return Ok(());
        };
        let Some(&loc) = self.entity_locations.get(entity) else {
            return Ok(());
        };
        let old_mask = self.archetypes[loc.archetype_index].mask();
        if !old_mask.contains(id) {
            return Ok(());
        }
        let new_mask = old_mask.without(id);
        let target = self.get_or_create_archetype(new_mask);
        self.move_entity(entity, target);
        Ok(())
    }

    /// Builds a query over the component tuple `Q`. See [`Query`] for iteration and
    /// counting semantics.
    ///
    /// # Panics
    /// Panics if any of `Q`'s component types has never been registered and the process
    /// has already registered the maximum of 64 distinct components (so the on-demand
    /// registration this call would trigger fails). This can only happen at that exact
    /// boundary; ordinary use never hits it.
    pub fn query<Q: QueryFilter>(&self) -> Query<'_, Q> {
        Query::new(self)
    }

    pub(crate) fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    pub(crate) fn entity_location(&self, entity: EntityId) -> Option<EntityLocation> {
        self.entity_locations.get(entity).copied()
    }
}

/// Borrows two distinct elements of a slice mutably at once. Panics if `a == b`.
fn borrow_two_mut<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b);
    if a < b {
        let (left, right) = slice.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
