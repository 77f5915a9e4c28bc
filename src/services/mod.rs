pub mod deck;
pub mod detail_panel;
pub mod gesture;
pub mod providers;
pub mod session;

pub use deck::DeckEngine;
pub use detail_panel::DetailPanel;
pub use providers::{CatalogClient, TmdbClient};
pub use session::{SessionConfig, SwipeSession};
