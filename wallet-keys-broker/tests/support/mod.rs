pub mod idp;
pub mod store;
