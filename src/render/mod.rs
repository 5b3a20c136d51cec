pub(crate) mod composite;
pub(crate) mod raster;
pub(crate) mod surface;
pub(crate) mod target;
