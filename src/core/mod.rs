// Domain-layer modules and shared errors/models
pub mod recommender {
    pub use crate::recommender::*;
}

pub mod pipeline {
    pub use crate::pipeline::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
