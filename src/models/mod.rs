pub mod appointment;
pub mod availability;
pub mod enums;
pub mod notification;
pub mod profile;

pub use appointment::*;
pub use availability::*;
pub use enums::*;
pub use notification::*;
pub use profile::*;
