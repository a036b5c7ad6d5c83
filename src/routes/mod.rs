/// Router Module Index
///
/// Splits the screens into those anyone may open and those wrapped by an
/// access gate. Gates are attached per group with `route_layer`, so a screen is
/// protected by where it is registered rather than by its handler.

/// Screens and endpoints open to every visitor.
pub mod public;

/// Screens wrapped by `require_access`, each group with its own allow-list.
pub mod gated;
