// ============================================================================
// Module : ui
// ============================================================================
// Interface terminal : panneau des prix et écran de settings
// ============================================================================

pub mod dashboard; // Panneau des prix + routage
pub mod events;    // Événements clavier
pub mod settings;  // Écran de settings

pub use dashboard::render;
pub use events::{Event, EventHandler};
