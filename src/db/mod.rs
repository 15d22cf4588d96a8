pub mod database;
pub mod state;
pub mod storage;
