//! API 处理器

pub mod health;
pub mod tweets;

pub use health::*;
pub use tweets::*;
