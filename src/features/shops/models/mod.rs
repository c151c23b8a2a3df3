mod shop;

pub use shop::Shop;
