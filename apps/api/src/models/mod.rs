pub mod analysis;
pub mod cv;
pub mod user;
