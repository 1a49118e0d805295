pub mod db_utils;
pub mod export;
pub mod format;
pub mod scan_guard;
