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

//! Staged system scheduler: fixed stage order, unordered execution within a stage.

use std::time::Instant;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::error::Result;
use crate::query::{Query, QueryFilter};
use crate::system::{BoxedSystem, StageId, SystemContext, SystemId};
use crate::world::World;

struct Registered {
    id: SystemId,
    stage: StageId,
    run: BoxedSystem,
}

/// Drives `update()`: samples a monotonic clock for `dt`, then invokes every registered
/// system once, in the fixed order `pre_update -> update -> post_update`. Systems within
/// a stage run in registration order, but callers must not depend on that — the spec
/// only promises stage order, not intra-stage order.
pub struct Schedule {
    systems: Vec<Registered>,
    last_update: Instant,
}

impl Schedule {
    /// The last-update baseline is set here, at construction, not lazily on first
    /// `update()` — so the first measured `dt` is the wall-clock gap between
    /// construction and the first call to `update`. See DESIGN.md for the grounding.
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            last_update: Instant::now(),
        }
    }

    /// Registers a raw system over the whole world. `stage` defaults to `StageId::update()`
    /// if the caller has no preference.
    pub fn register_system(
        &mut self,
        stage: StageId,
        system: impl FnMut(&mut World, &SystemContext) -> Result<()> + 'static,
    ) -> SystemId {
        let id = SystemId::next();
        self.systems.push(Registered {
            id,
            stage,
            run: Box::new(system),
        });
        id
    }

    /// Registers a system whose work is expressed against a pre-declared component tuple
    /// `Q`: the callable receives the tick's context and a fresh [`Query<Q>`] built from
    /// the world at call time.
    pub fn register_query_system<Q, F>(&mut self, stage: StageId, mut f: F) -> SystemId
    where
        Q: QueryFilter + 'static,
        F: FnMut(&SystemContext, Query<'_, Q>) -> Result<()> + 'static,
    {
        self.register_system(stage, move |world, ctx| f(ctx, world.query::<Q>()))
    }

    /// Removes a system from whatever stage it inhabits. A no-op if `id` is unknown.
    pub fn destroy_system(&mut self, id: SystemId) {
        self.systems.retain(|r| r.id != id);
    }

    /// Samples the clock, computes `dt` since the previous `update` (or since
    /// construction, on the first call), then runs every stage in order. If a system
    /// errors, the remaining systems in that `update` call do not run and the error is
    /// returned to the caller.
    ///
    /// The three built-in stages run in the fixed order `pre_update -> update ->
    /// post_update`. Systems registered into a [`StageId::custom`] stage still run every
    /// tick — after `post_update`, grouped by stage in first-registration order — but that
    /// position relative to the built-ins is unspecified and callers must not depend on it
    /// (see SPEC_FULL.md §C).
    pub fn update(&mut self, world: &mut World) -> Result<()> {
        #[cfg(feature = "profiling")]
        let span = info_span!("schedule.update", system_count = self.systems.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let now = Instant::now();
        let dt = now.duration_since(self.last_update);
        self.last_update = now;
        let ctx = SystemContext::new(dt);

        let builtin_stages = [StageId::pre_update(), StageId::update(), StageId::post_update()];
        for stage in builtin_stages {
            for reg in self.systems.iter_mut().filter(|r| r.stage == stage) {
                (reg.run)(world, &ctx)?;
            }
        }
        for reg in self
            .systems
            .iter_mut()
            .filter(|r| !builtin_stages.contains(&r.stage))
        {
            (reg.run)(world, &ctx)?;
        }
        Ok(())
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn stage_ordering() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut schedule = Schedule::new();
        let mut world = World::new();

        let log_post = log.clone();
        schedule.register_system(StageId::post_update(), move |_, _| {
            log_post.borrow_mut().push("post");
            Ok(())
        });
        let log_mid = log.clone();
        schedule.register_system(StageId::update(), move |_, _| {
            log_mid.borrow_mut().push("mid");
            Ok(())
        });
        let log_pre = log.clone();
        schedule.register_system(StageId::pre_update(), move |_, _| {
            log_pre.borrow_mut().push("pre");
            Ok(())
        });

        schedule.update(&mut world).unwrap();
        assert_eq!(*log.borrow(), vec!["pre", "mid", "post"]);
    }

    #[test]
    fn dt_is_monotonic_and_positive() {
        let mut schedule = Schedule::new();
        let mut world = World::new();
        thread::sleep(Duration::from_millis(2));

        let observed = Rc::new(RefCell::new(Duration::ZERO));
        let observed_clone = observed.clone();
        schedule.register_system(StageId::update(), move |_, ctx| {
            *observed_clone.borrow_mut() = ctx.dt();
            Ok(())
        });

        schedule.update(&mut world).unwrap();
        assert!(*observed.borrow() >= Duration::from_millis(1));

        thread::sleep(Duration::from_millis(2));
        schedule.update(&mut world).unwrap();
        assert!(*observed.borrow() >= Duration::from_millis(1));
    }

    #[test]
    fn custom_stage_systems_still_run() {
        let ran = Rc::new(RefCell::new(false));
        let ran_clone = ran.clone();
        let mut schedule = Schedule::new();
        let mut world = World::new();

        let custom = StageId::custom();
        schedule.register_system(custom, move |_, _| {
            *ran_clone.borrow_mut() = true;
            Ok(())
        });

        schedule.update(&mut world).unwrap();
        assert!(*ran.borrow(), "a system registered into a custom stage must still run");
    }

    #[test]
    fn destroying_unknown_system_is_a_no_op() {
        let mut schedule = Schedule::new();
        schedule.destroy_system(SystemId::next());
    }

    #[test]
    fn system_error_stops_remaining_systems_in_this_update() {
        use crate::error::EcsError;

        let mut schedule = Schedule::new();
        let mut world = World::new();
        let ran_second = Rc::new(RefCell::new(false));
        let ran_second_clone = ran_second.clone();

        schedule.register_system(StageId::update(), |_, _| Err(EcsError::ComponentMissing));
        schedule.register_system(StageId::update(), move |_, _| {
            *ran_second_clone.borrow_mut() = true;
            Ok(())
        });

        let result = schedule.update(&mut world);
        assert!(result.is_err());
        assert!(!*ran_second.borrow());
    }
}
