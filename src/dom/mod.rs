pub mod element;

pub use element::{ElementRef, ElementSnapshot, PageScope};
