pub mod coordinates;
pub mod projection;
