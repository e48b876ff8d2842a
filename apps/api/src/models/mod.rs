pub mod cv;
pub mod lenient;
