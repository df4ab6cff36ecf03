pub mod entities;
pub mod repositories;
pub mod seed;
pub mod value_objects;
