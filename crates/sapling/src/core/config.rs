use serde::{Deserialize, Serialize};

use crate::core::{
    error::Result,
    flags::{
        CAMERA, CONCATENATED_COLOR_TRANSFORM, CONCATENATED_TRANSFORM, Flags, HIERARCHY_ASCENDING,
        HIERARCHY_DESCENDING, INTERACTIVITY_MODE, LAYOUT, LAYOUT_ENABLED, STYLES, VIEWPORT,
    },
};

/// Process-wide defaults, fixed when a [`Core`](crate::Core) is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flags a container pushes down to its children when they are invalidated on it.
    pub cascading_flags: Flags,
    /// Flags a container pulls up from its children.
    pub bubbling_flags: Flags,
    /// Child flags that cause a container to re-measure.
    pub layout_invalidating_flags: Flags,
    /// Upper bound on validator invocations in a single `validate` call.
    pub max_validation_steps: usize,
    /// Default renderer cap for virtual lists.
    pub virtual_list_max_items: usize,
    /// Default out-of-bounds buffer for virtual lists, as a fraction of the viewport.
    pub virtual_list_buffer: f32,
    /// Released renderers a virtual list keeps for reuse before disposing extras.
    pub renderer_pool_capacity: usize,
    /// Seconds of simulated time per tick.
    pub tick_time: f32,
    /// Ticks run by one call to [`Core::tick`](crate::Core::tick) before the
    /// remaining time is dropped.
    pub max_ticks_per_update: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cascading_flags: HIERARCHY_DESCENDING
                | STYLES
                | CONCATENATED_COLOR_TRANSFORM
                | CONCATENATED_TRANSFORM
                | INTERACTIVITY_MODE
                | CAMERA
                | VIEWPORT,
            bubbling_flags: HIERARCHY_ASCENDING,
            layout_invalidating_flags: HIERARCHY_ASCENDING | LAYOUT | LAYOUT_ENABLED,
            max_validation_steps: 1024,
            virtual_list_max_items: 15,
            virtual_list_buffer: 0.15,
            renderer_pool_capacity: 64,
            tick_time: 1.0 / 60.0,
            max_ticks_per_update: 10,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
