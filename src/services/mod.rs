pub mod columns;
pub mod dataset;
pub mod filter;
pub mod formatter;
pub mod proxy;
pub mod scheduler;
pub mod sort;
pub mod stock_data;
pub mod table;
