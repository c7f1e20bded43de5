pub mod daily_stat;
pub mod dose_log;
pub mod enums;
pub mod medicine;
pub mod user;

pub use daily_stat::*;
pub use dose_log::*;
pub use medicine::*;
pub use user::*;
