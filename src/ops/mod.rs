pub mod check;
pub mod demo;
pub mod item_ops;
pub mod navigation;
pub mod search;
pub mod tree;
