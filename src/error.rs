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

//! Error types

use std::fmt;

/// ECS error type. A closed set — operations either succeed or fail with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// The handle's generation does not match the directory entry.
    EntityDead,

    /// The requested component is not present on the entity.
    ComponentMissing,

    /// `add` was called for a component the entity already has.
    ComponentAlreadyPresent,

    /// Registering this component would exceed the 64-component limit.
    ComponentLimitExceeded,
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::EntityDead => write!(f, "entity is dead"),
            EcsError::ComponentMissing => write!(f, "component not present on entity"),
            EcsError::ComponentAlreadyPresent => write!(f, "component already present on entity"),
            EcsError::ComponentLimitExceeded => {
                write!(f, "component limit exceeded (max 64 distinct component types)")
            }
        }
    }
}

impl std::error::Error for EcsError {}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EcsError>;
