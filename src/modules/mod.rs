//! Route modules. `build.rs` turns the files of this directory into
//! `MODULES`; each still needs its `mod` line below to compile.

use crate::loader::{ModuleEntry, ModuleKind};

pub mod category;
pub mod client;
pub mod equipment;
pub mod hire_request;
pub mod lambda;
pub mod token;
pub mod user;

include!(concat!(env!("OUT_DIR"), "/modules_generated.rs"));
