pub mod app;
pub mod feed;
pub mod surface;
