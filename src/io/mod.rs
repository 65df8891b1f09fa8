pub mod decompress;
pub mod discover;
pub mod table;
