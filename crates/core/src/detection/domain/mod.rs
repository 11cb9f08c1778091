pub mod detection;
pub mod heat_map;
pub mod localizer;
pub mod scan_stage;
pub mod subcell_refinement;
