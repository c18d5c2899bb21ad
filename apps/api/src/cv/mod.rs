// CV upload and listing.

pub mod extract;
pub mod handlers;
