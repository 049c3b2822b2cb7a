pub mod hash_generator;
pub mod models;
pub mod packager;
pub mod resolver;
