mod classification;
mod lookup;
mod signals;

pub use classification::*;
pub use lookup::*;
pub use signals::*;
