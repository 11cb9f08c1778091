pub mod cutout;
