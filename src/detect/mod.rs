mod backend;
mod backends;
mod result;

pub use backend::DetectorBackend;
pub use backends::StubDetector;
#[cfg(feature = "backend-tract")]
pub use backends::TractDetector;
pub use result::{any_proximate, label_set, Detection};
