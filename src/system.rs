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

//! Stage and system identifiers, and the per-update context handed to systems.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::Result;
use crate::world::World;

/// Opaque stage identifier, minted from a process-wide counter.
///
/// `pre_update`, `update`, `post_update` are the three built-ins; additional stages can be
/// minted with [`StageId::custom`], but the scheduler only promises relative ordering
/// among the built-ins (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(u32);

static NEXT_STAGE_ID: AtomicU32 = AtomicU32::new(0);

impl StageId {
    pub fn custom() -> Self {
        StageId(NEXT_STAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn pre_update() -> Self {
        static ID: OnceLock<StageId> = OnceLock::new();
        *ID.get_or_init(StageId::custom)
    }

    pub fn update() -> Self {
        static ID: OnceLock<StageId> = OnceLock::new();
        *ID.get_or_init(StageId::custom)
    }

    pub fn post_update() -> Self {
        static ID: OnceLock<StageId> = OnceLock::new();
        *ID.get_or_init(StageId::custom)
    }
}

/// Identifier returned by [`crate::schedule::Schedule::register_system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(u32);

static NEXT_SYSTEM_ID: AtomicU32 = AtomicU32::new(0);

impl SystemId {
    pub(crate) fn next() -> Self {
        SystemId(NEXT_SYSTEM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-`update` context passed to every system invoked that tick.
pub struct SystemContext {
    dt: Duration,
}

impl SystemContext {
    pub(crate) fn new(dt: Duration) -> Self {
        Self { dt }
    }

    pub fn dt(&self) -> Duration {
        self.dt
    }
}

/// A registered system's callable body: given the world and this tick's context, do work
/// and report success or failure. Boxed so heterogeneous systems can share one stage.
pub(crate) type BoxedSystem = Box<dyn FnMut(&mut World, &SystemContext) -> Result<()>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_stages_are_stable_and_distinct() {
        assert_eq!(StageId::pre_update(), StageId::pre_update());
        assert_ne!(StageId::pre_update(), StageId::update());
        assert_ne!(StageId::update(), StageId::post_update());
    }

    #[test]
    fn custom_stages_are_distinct() {
        let a = StageId::custom();
        let b = StageId::custom();
        assert_ne!(a, b);
    }

    #[test]
    fn system_ids_are_distinct() {
        assert_ne!(SystemId::next(), SystemId::next());
    }
}
