mod result_ext;
pub use result_ext::*;

mod matrix;
pub use matrix::*;
