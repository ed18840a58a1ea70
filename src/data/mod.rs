//! Customer data access: cached repository and the sources behind it.

pub mod repository {
    pub use crate::repository::*;
}

pub mod sources {
    pub use crate::sources::*;
}

pub mod db {
    pub use crate::db::*;
}
