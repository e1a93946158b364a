mod in_memory_display;
mod in_memory_pairing;

pub use in_memory_display::InMemoryDisplayDirectory;
pub use in_memory_pairing::InMemoryPairingStore;
