pub mod error;
pub mod matfun;
pub mod traits;

pub use error::{Error, Result};
pub use traits::{Manifold, SpdGeometry};
