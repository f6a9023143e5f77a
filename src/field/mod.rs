pub mod compositor;
pub mod layer;
