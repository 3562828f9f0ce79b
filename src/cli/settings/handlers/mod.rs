//! Setting handlers for different configuration patterns.

pub mod boolean;
pub mod numeric;
pub mod string;

pub use boolean::*;
pub use numeric::*;
pub use string::*;
