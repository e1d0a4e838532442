mod new_user;
pub use new_user::*;

mod add;
pub use add::*;

mod log;
pub use log::*;
