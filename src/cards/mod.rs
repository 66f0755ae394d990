//! Card system: rarities, templates, and the deduplicating inventory.

pub mod inventory;
pub mod templates;
pub mod types;

pub use inventory::{CardsRecord, Inventory};
pub use templates::{template_for, total_unique_cards, CardTemplate};
pub use types::{Card, Rarity};
