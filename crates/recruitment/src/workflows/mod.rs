pub mod assessment;
pub mod candidates;
pub mod catalog;
pub mod pipeline;

mod acting_user;
mod blocking;
mod forms;
mod json_body;

pub use acting_user::{ActingUser, ACTING_USER_HEADER};
pub use blocking::run_blocking;
pub use forms::MultipartForm;
pub use json_body::JsonBody;

#[cfg(test)]
pub(crate) mod test_support;
