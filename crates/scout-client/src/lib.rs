pub mod source;
pub mod verifier;

pub use source::HttpListingSource;
pub use verifier::ReqwestVerifier;
