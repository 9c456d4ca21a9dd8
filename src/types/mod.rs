pub mod inbox;
pub mod notification;

pub use inbox::*;
pub use notification::*;
