pub mod common;
pub mod domain;
pub mod model;
pub mod modules;
pub mod numerics;
