pub mod builtin;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod eval;
pub mod job;
pub mod logger;
pub mod parser;
pub mod types;


pub use crate::builtin::{Builtin,Handler,Registry};
pub use crate::dispatch::{Dispatcher,PARSE_FAILURE};
pub use crate::error::{ExecError,ParseError};
pub use crate::types::{Output,Pipeline,Stage};
