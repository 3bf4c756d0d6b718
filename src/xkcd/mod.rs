pub mod comic;

pub use comic::Comic;
