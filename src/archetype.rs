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

//! Archetype storage: a group of entities sharing the exact same component set.
//!
//! Row vacation deliberately does **not** swap-remove. A vacated row is tombstoned (its
//! entity slot set to [`EntityId::null`]) and pushed onto a per-archetype free-row list,
//! so surviving entities keep their row index. Queries skip tombstoned rows; insertion
//! prefers reusing a free row over growing the columns.

use slotmap::Key;

use crate::column::Column;
use crate::component::{info_of, ComponentId, ComponentMask};
use crate::entity::EntityId;

pub struct Archetype {
    mask: ComponentMask,
    columns: Vec<Column>,
    entities: Vec<EntityId>,
    free_rows: Vec<usize>,
}

impl Archetype {
    pub fn new(mask: ComponentMask) -> Self {
        let columns = mask.iter().map(|id| Column::new(info_of(id))).collect();
        Self {
            mask,
            columns,
            entities: Vec::new(),
            free_rows: Vec::new(),
        }
    }

    pub fn mask(&self) -> ComponentMask {
        self.mask
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.iter().all(|e| e.is_null())
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn entity_at(&self, row: usize) -> EntityId {
        self.entities[row]
    }

    pub fn is_alive_row(&self, row: usize, expected: EntityId) -> bool {
        row < self.entities.len() && self.entities[row] == expected
    }

    /// Column index within this archetype for a component id, if present.
    pub fn column_of(&self, id: ComponentId) -> Option<usize> {
        if self.mask.contains(id) {
            Some(self.mask.column_index(id))
        } else {
            None
        }
    }

    pub fn column(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub fn column_mut(&mut self, index: usize) -> &mut Column {
        &mut self.columns[index]
    }

    /// Allocates a row for `entity`, reusing a tombstoned row if one is free, otherwise
    /// growing every column by one. Component bytes at the returned row are uninitialized
    /// (or stale, if reused) — the caller is responsible for writing every column.
    pub fn allocate_row(&mut self, entity: EntityId) -> usize {
        if let Some(row) = self.free_rows.pop() {
            self.entities[row] = entity;
            row
        } else {
            let row = self.entities.len();
            self.entities.push(entity);
            for column in &mut self.columns {
                column.push_uninit();
            }
            row
        }
    }

    /// Vacates `row`: drops every column's value at that row, tombstones the entity slot,
    /// and records the row as free for reuse. Does **not** swap-remove.
    pub fn remove_row(&mut self, row: usize) {
        self.vacate_row_except(row, ComponentMask::EMPTY);
    }

    /// Vacates `row` like [`remove_row`](Self::remove_row), but only drops the columns
    /// whose component id is *not* in `keep_mask`. Used by migration: the components
    /// shared with the target archetype have already been byte-copied there and must be
    /// tombstoned here without running their drop glue, or the target ends up holding a
    /// value whose backing memory this archetype just freed.
    pub fn vacate_row_except(&mut self, row: usize, keep_mask: ComponentMask) {
        for id in self.mask.iter() {
            if !keep_mask.contains(id) {
                let idx = self.mask.column_index(id);
                self.columns[idx].drop_at(row);
            }
        }
        self.entities[row] = EntityId::null();
        self.free_rows.push(row);
    }
}

impl Drop for Archetype {
    fn drop(&mut self) {
        for row in 0..self.entities.len() {
            if !self.entities[row].is_null() {
                for column in &mut self.columns {
                    column.drop_at(row);
                }
            }
        }
    }
}
