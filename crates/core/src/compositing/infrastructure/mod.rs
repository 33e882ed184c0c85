pub mod cutout_compositor;
mod gradient;
pub mod raster_image;
pub mod surface;
