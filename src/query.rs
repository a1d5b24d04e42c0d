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

//! Typed multi-component queries.
//!
//! A query is parametrised by a tuple `(T1, ..., Tk)` of component types, which determines
//! a required mask. Matching archetypes are those whose mask is a *superset* of the
//! required mask, not an exact match — an archetype with extra components still matches.

use slotmap::Key;
use smallvec::SmallVec;

use crate::archetype::Archetype;
use crate::component::{self, Component, ComponentMask};
use crate::entity::EntityId;
use crate::world::World;

/// Implemented for component tuples `(T1,)` through `(T1, ..., T8)`. Not meant to be
/// implemented by downstream crates.
pub trait QueryFilter {
    type Fetch<'w>;

    fn required_mask() -> ComponentMask;

    /// Column index within `archetype` for each requested component, in caller order.
    /// Computed once per matched archetype and reused for every row.
    fn column_indices(archetype: &Archetype) -> SmallVec<[usize; 8]>;

    /// # Safety
    /// `col_indices` must have been produced by [`column_indices`] for this archetype,
    /// and `row` must be a currently-alive row in it.
    unsafe fn fetch<'w>(archetype: &'w Archetype, col_indices: &[usize], row: usize) -> Self::Fetch<'w>;
}

macro_rules! impl_query_filter {
    ($($T:ident : $idx:tt),+) => {
        impl<$($T: Component),+> QueryFilter for ($($T,)+) {
            type Fetch<'w> = ($(&'w $T,)+);

            // `id_of` only fails once the 64-component cap (`MAX_COMPONENTS`) is exceeded;
            // `World::query` has no `Result` in its signature to propagate that through, so
            // a query built at exactly that boundary panics instead. Documented on
            // `World::query` rather than silently swallowed.
            fn required_mask() -> ComponentMask {
                let mut mask = ComponentMask::EMPTY;
                $(
                    mask = mask.with(component::id_of::<$T>().expect("component type not registered"));
                )+
                mask
            }

            fn column_indices(archetype: &Archetype) -> SmallVec<[usize; 8]> {
                let mut out = SmallVec::new();
                $(
                    out.push(archetype.column_of(component::id_of::<$T>().unwrap()).unwrap());
                )+
                out
            }

            unsafe fn fetch<'w>(archetype: &'w Archetype, col_indices: &[usize], row: usize) -> Self::Fetch<'w> {
                ($(
                    &*(archetype.column(col_indices[$idx]).row(row) as *const $T),
                )+)
            }
        }
    };
}

impl_query_filter!(A:0);
impl_query_filter!(A:0, B:1);
impl_query_filter!(A:0, B:1, C:2);
impl_query_filter!(A:0, B:1, C:2, D:3);
impl_query_filter!(A:0, B:1, C:2, D:3, E:4);
impl_query_filter!(A:0, B:1, C:2, D:3, E:4, F:5);
impl_query_filter!(A:0, B:1, C:2, D:3, E:4, F:5, G:6);
impl_query_filter!(A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7);

/// A query built against a specific `&World` borrow, over component tuple `Q`.
pub struct Query<'w, Q: QueryFilter> {
    world: &'w World,
    required_mask: ComponentMask,
    _marker: std::marker::PhantomData<Q>,
}

impl<'w, Q: QueryFilter> Query<'w, Q> {
    pub(crate) fn new(world: &'w World) -> Self {
        Self {
            world,
            required_mask: Q::required_mask(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn iter(&self) -> QueryIter<'w, Q> {
        QueryIter {
            world: self.world,
            required_mask: self.required_mask,
            archetype_index: 0,
            row: 0,
            current_columns: None,
        }
    }

    /// Number of live rows across every matching archetype, without materializing them.
    pub fn count(&self) -> usize {
        let mut total = 0;
        for archetype in self.world.archetypes() {
            if !archetype.mask().is_superset_of(self.required_mask) {
                continue;
            }
            for row in 0..archetype.len() {
                if !archetype.entity_at(row).is_null() {
                    total += 1;
                }
            }
        }
        total
    }
}

impl<'w, 'q, Q: QueryFilter> IntoIterator for &'q Query<'w, Q> {
    type Item = (EntityId, Q::Fetch<'w>);
    type IntoIter = QueryIter<'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterates matching archetypes in insertion order, then rows within each, skipping
/// archetypes whose mask doesn't match (or which are empty / fully tombstoned) and rows
/// whose entity has been vacated.
pub struct QueryIter<'w, Q: QueryFilter> {
    world: &'w World,
    required_mask: ComponentMask,
    archetype_index: usize,
    row: usize,
    current_columns: Option<SmallVec<[usize; 8]>>,
}

impl<'w, Q: QueryFilter> Iterator for QueryIter<'w, Q> {
    type Item = (EntityId, Q::Fetch<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        let archetypes = self.world.archetypes();
        loop {
            let Some(archetype) = archetypes.get(self.archetype_index) else {
                return None;
            };

            if self.current_columns.is_none() {
                if archetype.is_empty() || !archetype.mask().is_superset_of(self.required_mask) {
                    self.archetype_index += 1;
                    self.row = 0;
                    continue;
                }
                self.current_columns = Some(Q::column_indices(archetype));
            }

            if self.row >= archetype.len() {
                self.archetype_index += 1;
                self.row = 0;
                self.current_columns = None;
                continue;
            }

            let row = self.row;
            self.row += 1;
            let entity = archetype.entity_at(row);
            if entity.is_null() {
                continue;
            }

            let columns = self.current_columns.as_ref().unwrap();
            let item = unsafe { Q::fetch(archetype, columns, row) };
            return Some((entity, item));
        }
    }
}
