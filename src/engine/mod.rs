//! Turning raw pointer samples into drawable stroke geometry.

mod preprocess;
pub use preprocess::*;

mod fit;
pub use fit::*;

mod chunk;
pub use chunk::*;

mod tessellate;
pub use tessellate::*;

mod ribbon;
pub use ribbon::*;

mod scene;
pub use scene::*;

mod stroke;
pub use stroke::*;

mod store;
pub use store::*;
