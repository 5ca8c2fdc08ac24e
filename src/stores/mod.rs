pub mod json_store;
pub mod rest_store;
pub mod session_store;
pub mod storage;
