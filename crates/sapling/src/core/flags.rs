//! Standard validation flags and their dependency table.
//!
//! Each flag is one bit naming a piece of derived component state. Widgets
//! may register additional flags from [`FIRST_CUSTOM`] upwards.

/// A set of validation flags.
pub type Flags = u32;

/// Style values have changed.
pub const STYLES: Flags = 1 << 0;
/// Something in the subtree changed; pulled up from children.
pub const HIERARCHY_ASCENDING: Flags = 1 << 1;
/// Something in the ancestry changed; pushed down to children.
pub const HIERARCHY_DESCENDING: Flags = 1 << 2;
/// Minimum and maximum dimensions.
pub const SIZE_CONSTRAINTS: Flags = 1 << 3;
/// Measured bounds and child placement.
pub const LAYOUT: Flags = 1 << 4;
/// Visibility or layout inclusion changed.
pub const LAYOUT_ENABLED: Flags = 1 << 5;
/// Local transform.
pub const TRANSFORM: Flags = 1 << 6;
/// Transform combined with all ancestors.
pub const CONCATENATED_TRANSFORM: Flags = 1 << 7;
/// Local color tint.
pub const COLOR_TRANSFORM: Flags = 1 << 8;
/// Color tint combined with all ancestors.
pub const CONCATENATED_COLOR_TRANSFORM: Flags = 1 << 9;
/// Inherited interactivity mode.
pub const INTERACTIVITY_MODE: Flags = 1 << 10;
/// Camera used for hit testing.
pub const CAMERA: Flags = 1 << 11;
/// Viewport inherited from the ancestry.
pub const VIEWPORT: Flags = 1 << 12;

/// The first bit available to widget-specific flags.
pub const FIRST_CUSTOM: Flags = 1 << 16;

/// Every flag.
pub const ALL: Flags = u32::MAX;

/// The standard flags with their dependencies, in registration order.
pub const STANDARD: [(Flags, Flags); 13] = [
    (STYLES, 0),
    (HIERARCHY_ASCENDING, 0),
    (HIERARCHY_DESCENDING, 0),
    (SIZE_CONSTRAINTS, STYLES),
    (LAYOUT, SIZE_CONSTRAINTS),
    (LAYOUT_ENABLED, 0),
    (TRANSFORM, 0),
    (CONCATENATED_TRANSFORM, TRANSFORM),
    (COLOR_TRANSFORM, 0),
    (CONCATENATED_COLOR_TRANSFORM, COLOR_TRANSFORM),
    (INTERACTIVITY_MODE, 0),
    (CAMERA, 0),
    (VIEWPORT, 0),
];

/// Names of the standard flags, indexed by bit.
const NAMES: [&str; 13] = [
    "STYLES",
    "HIERARCHY_ASCENDING",
    "HIERARCHY_DESCENDING",
    "SIZE_CONSTRAINTS",
    "LAYOUT",
    "LAYOUT_ENABLED",
    "TRANSFORM",
    "CONCATENATED_TRANSFORM",
    "COLOR_TRANSFORM",
    "CONCATENATED_COLOR_TRANSFORM",
    "INTERACTIVITY_MODE",
    "CAMERA",
    "VIEWPORT",
];

/// Render a flag set as `A|B|C` for diagnostics. Unknown bits print in hex.
pub fn describe(flags: Flags) -> String {
    if flags == 0 {
        return "NONE".into();
    }
    if flags == ALL {
        return "ALL".into();
    }
    let mut parts = Vec::new();
    for bit in 0..32 {
        let f = 1 << bit;
        if flags & f == 0 {
            continue;
        }
        match NAMES.get(bit) {
            Some(name) => parts.push((*name).to_string()),
            None => parts.push(format!("{f:#x}")),
        }
    }
    parts.join("|")
}

/// True if `flag` is exactly one bit.
pub fn is_single(flag: Flags) -> bool {
    flag.is_power_of_two()
}
