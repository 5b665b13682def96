pub mod assertions;
pub mod cancel;
pub mod extract;
pub mod http;
pub mod resolve;
pub mod runner;
