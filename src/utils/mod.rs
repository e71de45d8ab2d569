pub mod channels;
pub mod filters;
pub mod text;
