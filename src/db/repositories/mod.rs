pub mod daily;
pub mod pokemon;
