pub mod classify;
pub mod config;
pub mod media_class;
pub mod object_id;
pub mod opt;
pub mod property_store;
pub mod provider;
pub mod pw_dump;
pub mod render;
pub mod snapshot;
pub mod trace;
pub mod truncate;
