pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Heat-map downsampling ratio of the localization network.
pub const DEFAULT_FACTOR: u32 = 8;

/// Minimum heat-map peak; the peak must be strictly greater to count.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

pub const DEFAULT_CUTOUT_SIZE: usize = 129;

/// Projection used when rendering the synthetic training faces.
pub const PROJECTION_MXX: f64 = 2.7990382;
pub const PROJECTION_MYY: f64 = 3.732051;
pub const PROJECTION_MZZ: f64 = -1.002002;
pub const PROJECTION_MZW: f64 = -1.0;
pub const PROJECTION_MWZ: f64 = -0.2002002;
pub const PROJECTION_MWW: f64 = 0.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
