mod encode;
mod interface;

pub use encode::*;
pub use interface::*;
