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

//! Archetype ECS core
//!
//! An archetype-based Entity-Component-System store: entities are grouped by their exact
//! component set into archetypes, each archetype owning one column per component; queries
//! iterate archetypes rather than entities for cache locality, and a small staged
//! scheduler drives per-tick system execution.

pub mod archetype;
pub mod column;
pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod schedule;
pub mod system;
pub mod world;

pub use component::{Component, ComponentId, ComponentMask};
pub use entity::{EntityId, EntityLocation};
pub use error::{EcsError, Result};
pub use query::{Query, QueryFilter};
pub use schedule::Schedule;
pub use system::{StageId, SystemContext, SystemId};
pub use world::World;
