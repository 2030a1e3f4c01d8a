mod policy_file_loader;

pub use policy_file_loader::{PolicyLoadError, load_policy_files};
