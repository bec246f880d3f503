//! Element rules for route files.

mod param;
mod plans;
mod route;
mod stop;
mod vehicles;

pub use param::*;
pub use plans::*;
pub use route::*;
pub use stop::*;
pub use vehicles::*;
