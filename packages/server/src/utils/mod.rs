pub mod filename;
pub mod hash;
pub mod jwt;
pub mod reconcile;
pub mod slug;
pub mod upload;
pub mod video;
