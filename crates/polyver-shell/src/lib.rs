//! Generated `<identifier>_env.sh` scripts that shells source to pick up the
//! active runtime.

mod error;
mod script;
mod writer;

pub use error::ScriptWriteError;
pub use script::{escape_double_quoted, parse_active_path, render_script};
pub use writer::EnvScriptWriter;
