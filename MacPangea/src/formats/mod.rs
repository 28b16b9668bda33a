//! On-disk format parsers.

pub mod resource_fork;
pub mod skeleton;
pub mod tga;
pub mod three_dmf;
