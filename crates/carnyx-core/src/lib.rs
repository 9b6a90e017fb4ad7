pub mod acquire;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod media;
pub mod path;
pub mod prelude;
pub mod reconcile;
pub mod record;
pub mod resolver;
pub mod scanner;
pub mod sync;
pub mod tag;
pub mod title;
pub mod ytdlp;

pub use config::*;
pub use error::*;
pub use reconcile::*;
pub use record::*;
pub use sync::*;
