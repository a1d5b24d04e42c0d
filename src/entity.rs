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

//! Entity identity

use slotmap::new_key_type;

new_key_type! {
    /// A handle identifying a slot in a [`World`](crate::World)'s entity directory.
    ///
    /// Packs a 32-bit slot index and a 32-bit generation counter into a single 64-bit
    /// value. The generation is bumped every time a slot is recycled, so a handle held
    /// past its entity's destruction fails liveness checks rather than aliasing a
    /// different, later entity occupying the same slot.
    pub struct EntityId;
}

/// Where an entity's component data currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub archetype_index: usize,
    pub row: usize,
}
