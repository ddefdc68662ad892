pub mod attrs;
pub mod leftover;
pub mod meta;
