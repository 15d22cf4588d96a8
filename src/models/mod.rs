pub mod settings;
pub mod stock;
pub mod table;
