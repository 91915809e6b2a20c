pub mod constants;
pub mod loader;
pub mod rays;
pub mod structs;

pub use loader::load_magic_tables;
pub use structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
