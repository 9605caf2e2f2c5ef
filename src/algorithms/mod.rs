pub mod mean;

pub use mean::{arithmetic_mean, karcher_mean, Convergence};
