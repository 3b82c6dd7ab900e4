mod options;
mod request;

pub use options::FetchOptions;
pub use request::FetchRequest;
