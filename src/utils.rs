mod number;
mod other;

pub use number::{ceil_div, floor_div};
pub use other::{lock_state, HandyMutex, HandyRwLock};

pub use crate::log::init_log;
