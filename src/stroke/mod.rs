pub(crate) mod fit;
pub(crate) mod segment;
pub(crate) mod width;
