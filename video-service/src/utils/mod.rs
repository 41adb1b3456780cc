pub mod cookies;
pub mod multipart;
pub mod password;
pub mod validation;

pub use multipart::MultipartForm;
pub use password::{hash_password, verify_password, Password};
pub use validation::ValidatedJson;
