//! Registration of the sqlite-vec extension.
//!
//! The only unsafe code of the crate lives here.

use std::sync::Once;

use rusqlite::ffi::{sqlite3, sqlite3_api_routines, sqlite3_auto_extension};
use sqlite_vec::sqlite3_vec_init;
use tracing::debug;

type ExtensionEntryPoint =
    unsafe extern "C" fn(*mut sqlite3, *mut *mut i8, *const sqlite3_api_routines) -> i32;

static REGISTER: Once = Once::new();

/// Register sqlite-vec as an auto-loaded extension for every connection
/// opened afterwards. Later calls are no-ops.
#[allow(unsafe_code)]
pub fn register_sqlite_vec() {
    REGISTER.call_once(|| {
        // SAFETY: `sqlite3_vec_init` has the extension entry point ABI expected
        // by `sqlite3_auto_extension`; the registration runs once per process.
        unsafe {
            sqlite3_auto_extension(Some(std::mem::transmute::<*const (), ExtensionEntryPoint>(
                sqlite3_vec_init as *const (),
            )));
        }
        debug!("sqlite-vec registered as auto extension");
    });
}
