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

//! Component registration: a process-wide type -> dense id table, and the single-word
//! component-set mask that id feeds into.

use std::alloc::Layout;
use std::any::TypeId;
use std::sync::{Mutex, OnceLock};

use rustc_hash::FxHashMap;

use crate::error::{EcsError, Result};

/// Maximum number of distinct component types a process may register.
///
/// Chosen so that a full component set fits in one `u64` — see [`ComponentMask`].
pub const MAX_COMPONENTS: usize = 64;

/// Marker trait for components. Any `'static + Send + Sync` type qualifies.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// Dense id assigned to a registered component type, `0..MAX_COMPONENTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub(crate) u8);

impl ComponentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-component metadata recorded at registration time.
#[derive(Clone, Copy)]
pub(crate) struct ComponentInfo {
    pub layout: Layout,
    pub drop_fn: unsafe fn(*mut u8),
}

unsafe fn drop_in_place_as<T>(ptr: *mut u8) {
    std::ptr::drop_in_place(ptr as *mut T);
}

struct Registry {
    ids: FxHashMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
}

impl Registry {
    fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            infos: Vec::new(),
        }
    }
}

static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();

fn registry() -> &'static Mutex<Registry> {
    REGISTRY.get_or_init(|| Mutex::new(Registry::new()))
}

/// Returns the dense id for `T`, registering it on first use.
///
/// Registration is idempotent: repeated calls for the same `T` return the same id.
/// Ids are process-global so they mean the same thing across every `World`.
pub fn id_of<T: Component>() -> Result<ComponentId> {
    let type_id = TypeId::of::<T>();
    let mut reg = registry().lock().unwrap_or_else(|e| e.into_inner());

    if let Some(&id) = reg.ids.get(&type_id) {
        return Ok(id);
    }

    if reg.infos.len() >= MAX_COMPONENTS {
        return Err(EcsError::ComponentLimitExceeded);
    }

    let id = ComponentId(reg.infos.len() as u8);
    reg.infos.push(ComponentInfo {
        layout: Layout::new::<T>(),
        drop_fn: drop_in_place_as::<T>,
    });
    reg.ids.insert(type_id, id);
    Ok(id)
}

pub(crate) fn info_of(id: ComponentId) -> ComponentInfo {
    registry().lock().unwrap_or_else(|e| e.into_inner()).infos[id.index()]
}

/// Number of component types registered so far in this process. Exposed so tests
/// exercising the [`EcsError::ComponentLimitExceeded`] boundary can compute exactly how
/// many fresh types are needed to reach the cap, regardless of what other tests in the
/// same binary have already registered.
pub fn registered_count() -> usize {
    registry().lock().unwrap_or_else(|e| e.into_inner()).infos.len()
}

/// A 64-bit bitmap over component ids. Archetype and entity component sets are both
/// represented this way, so archetype-matching is a bitwise operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentMask(pub(crate) u64);

impl ComponentMask {
    pub const EMPTY: ComponentMask = ComponentMask(0);

    pub fn contains(self, id: ComponentId) -> bool {
        self.0 & (1u64 << id.0) != 0
    }

    pub fn with(self, id: ComponentId) -> ComponentMask {
        ComponentMask(self.0 | (1u64 << id.0))
    }

    pub fn without(self, id: ComponentId) -> ComponentMask {
        ComponentMask(self.0 & !(1u64 << id.0))
    }

    /// True iff `self` has every bit set in `required` (a superset test).
    pub fn is_superset_of(self, required: ComponentMask) -> bool {
        self.0 & required.0 == required.0
    }

    /// Number of set bits below `id`'s bit — the column's index within an archetype
    /// whose mask contains `id`, since columns are stored in ascending-id order.
    pub(crate) fn column_index(self, id: ComponentId) -> usize {
        (self.0 & ((1u64 << id.0) - 1)).count_ones() as usize
    }

    pub fn iter(self) -> ComponentMaskIter {
        ComponentMaskIter { bits: self.0 }
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Iterates the set component ids of a mask in ascending order, clearing the lowest
/// set bit each step.
pub struct ComponentMaskIter {
    bits: u64,
}

impl Iterator for ComponentMaskIter {
    type Item = ComponentId;

    fn next(&mut self) -> Option<ComponentId> {
        if self.bits == 0 {
            return None;
        }
        let bit = self.bits.trailing_zeros();
        self.bits &= self.bits - 1;
        Some(ComponentId(bit as u8))
    }
}
