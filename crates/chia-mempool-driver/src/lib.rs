mod driver_error;
mod fast_forward;
mod perform_fast_forward;

pub use driver_error::*;
pub use fast_forward::*;
pub use perform_fast_forward::*;
