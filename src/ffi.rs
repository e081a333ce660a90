//! FFI (Foreign Function Interface) for the benchmark engine
//!
//! C-compatible entry points for the host application. The host calls
//! `arb_library_init` once, obtains an asset container with
//! `arb_assets_open`, then triggers benchmarks by name. Results go to the log
//! sink; the return code only says whether the run happened.
//!
//! Calls are serialized through a process-wide lock. Measurements taken
//! concurrently would not be meaningful anyway.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::assets::{self, AssetContainer};
use crate::config::BenchConfig;
use crate::engine::Engine;
use crate::error::{BenchError, ErrorKind, Result};
use crate::logging;
use crate::timing::BenchmarkResult;

/// Crate version reported over the C ABI
pub const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Return codes shared by every `arb_*` entry point
pub const ARB_OK: c_int = 0;
pub const ARB_ERR_INVALID_ARG: c_int = -1;
pub const ARB_ERR_NOT_FOUND: c_int = -2;
pub const ARB_ERR_IO: c_int = -3;
pub const ARB_ERR_PERMISSION: c_int = -6;
pub const ARB_ERR_NOT_INITIALIZED: c_int = -7;
pub const ARB_ERR_UNKNOWN: c_int = -99;

static STATE: Mutex<Option<BenchConfig>> = Mutex::new(None);
static LAST_ELAPSED_NANOS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

/// Opaque handle to an asset container
pub struct ArbAssets {
    inner: Box<dyn AssetContainer>,
}

fn error_code(e: &BenchError) -> c_int {
    match e.kind() {
        ErrorKind::NotFound => ARB_ERR_NOT_FOUND,
        ErrorKind::PermissionDenied => ARB_ERR_PERMISSION,
        ErrorKind::InvalidArgument => ARB_ERR_INVALID_ARG,
        ErrorKind::IoFailure => ARB_ERR_IO,
    }
}

fn set_last_error(message: &str) {
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = message);
}

fn fail(e: BenchError) -> c_int {
    set_last_error(&e.to_string());
    error_code(&e)
}

/// Reads an optional C string; null maps to `None`
unsafe fn opt_str<'a>(s: *const c_char) -> Result<Option<&'a str>> {
    if s.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(s) }
        .to_str()
        .map(Some)
        .map_err(|_| BenchError::InvalidArgument("string is not valid UTF-8".to_string()))
}

/// Runs `f` against an engine built from the current configuration
///
/// # Safety
/// `assets` must be null or a live handle from `arb_assets_open`; `data_dir`
/// must be null or a valid null-terminated string.
unsafe fn with_engine<T>(
    assets: *const ArbAssets,
    data_dir: *const c_char,
    f: impl FnOnce(&Engine<'_>) -> Result<T>,
) -> c_int {
    let state = STATE.lock();
    let Some(config) = state.as_ref() else {
        set_last_error("library not initialized");
        return ARB_ERR_NOT_INITIALIZED;
    };

    let data_dir = match unsafe { opt_str(data_dir) } {
        Ok(d) => d.map(Path::new),
        Err(e) => return fail(e),
    };
    let container = unsafe { assets.as_ref() }.map(|a| &*a.inner);

    let engine = Engine::new(container, data_dir, config.clone());
    // A panic must not unwind into the host
    match std::panic::catch_unwind(AssertUnwindSafe(|| f(&engine))) {
        Ok(Ok(_)) => ARB_OK,
        Ok(Err(e)) => fail(e),
        Err(_) => {
            set_last_error("internal panic");
            ARB_ERR_UNKNOWN
        }
    }
}

fn record(result: Result<BenchmarkResult>) -> Result<BenchmarkResult> {
    if let Ok(r) = &result {
        LAST_ELAPSED_NANOS.store(r.elapsed_nanos, Ordering::Relaxed);
    }
    result
}

/// Initialize the library
///
/// `config_json` may be null for the default configuration. Calling it again
/// replaces the configuration.
///
/// # Safety
/// `config_json` must be null or a valid null-terminated UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arb_library_init(config_json: *const c_char) -> c_int {
    let config = match unsafe { opt_str(config_json) } {
        Ok(Some(json)) => match BenchConfig::from_json(json) {
            Ok(c) => c,
            Err(e) => return fail(e),
        },
        Ok(None) => BenchConfig::default(),
        Err(e) => return fail(e),
    };

    logging::init(&config.log_filter);
    tracing::debug!(version = LIB_VERSION, "library initialized");
    *STATE.lock() = Some(config);
    ARB_OK
}

/// Tear down the library; later operations return `ARB_ERR_NOT_INITIALIZED`
#[unsafe(no_mangle)]
pub extern "C" fn arb_library_shutdown() -> c_int {
    match STATE.lock().take() {
        Some(_) => ARB_OK,
        None => ARB_ERR_NOT_INITIALIZED,
    }
}

/// Static greeting shown by the host UI
#[unsafe(no_mangle)]
pub extern "C" fn arb_hello_string() -> *const c_char {
    c"Hello from Rust".as_ptr()
}

/// Crate version as a C string
///
/// # Safety
/// The pointer stays valid for the life of the process and is owned by the library.
#[unsafe(no_mangle)]
pub extern "C" fn arb_lib_version() -> *const c_char {
    static VERSION: std::sync::OnceLock<CString> = std::sync::OnceLock::new();
    VERSION
        .get_or_init(|| CString::new(LIB_VERSION).unwrap_or_default())
        .as_ptr()
}

/// Elapsed nanoseconds of the last successful benchmark, 0 if none
#[unsafe(no_mangle)]
pub extern "C" fn arb_last_elapsed_nanos() -> u64 {
    LAST_ELAPSED_NANOS.load(Ordering::Relaxed)
}

/// Get the last error message of the calling thread
///
/// # Safety
/// Thread-local storage; the pointer is valid until the next failing call on
/// this thread.
#[unsafe(no_mangle)]
pub extern "C" fn arb_last_error() -> *const c_char {
    LAST_ERROR.with(|e| e.borrow().as_ptr())
}

/// Open an asset container (a directory or a pack file)
///
/// # Safety
/// - `path` must be a valid null-terminated UTF-8 string
/// - `handle_out` must be a valid pointer
/// - The returned handle must be freed with `arb_assets_close`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arb_assets_open(
    path: *const c_char,
    handle_out: *mut *mut ArbAssets,
) -> c_int {
    if path.is_null() || handle_out.is_null() {
        return ARB_ERR_INVALID_ARG;
    }

    let path = match unsafe { opt_str(path) } {
        Ok(Some(p)) => p,
        Ok(None) => return ARB_ERR_INVALID_ARG,
        Err(e) => return fail(e),
    };

    match assets::open(path) {
        Ok(inner) => {
            let handle = Box::new(ArbAssets { inner });
            unsafe { *handle_out = Box::into_raw(handle) };
            ARB_OK
        }
        Err(e) => fail(e.into()),
    }
}

/// Close an asset container handle
///
/// # Safety
/// - `handle` must be a valid handle returned by `arb_assets_open`
/// - `handle` is dangling once this returns
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arb_assets_close(handle: *mut ArbAssets) -> c_int {
    if handle.is_null() {
        return ARB_ERR_INVALID_ARG;
    }

    drop(unsafe { Box::from_raw(handle) });
    ARB_OK
}

/// Extract the benchmark asset into `data_dir`
///
/// # Safety
/// `assets` must be a live handle; `data_dir` a valid null-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arb_init(assets: *const ArbAssets, data_dir: *const c_char) -> c_int {
    if assets.is_null() || data_dir.is_null() {
        return ARB_ERR_INVALID_ARG;
    }
    unsafe { with_engine(assets, data_dir, |e| e.init()) }
}

macro_rules! asset_op {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        /// `assets` must be a live handle from `arb_assets_open`.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(assets: *const ArbAssets) -> c_int {
            if assets.is_null() {
                return ARB_ERR_INVALID_ARG;
            }
            unsafe { with_engine(assets, ptr::null(), |e| record(e.$method())) }
        }
    };
    ($(#[$meta:meta])* $name:ident => $method:ident(pieces)) => {
        $(#[$meta])*
        ///
        /// # Safety
        /// `assets` must be a live handle from `arb_assets_open`.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(assets: *const ArbAssets, pieces: i64) -> c_int {
            if assets.is_null() {
                return ARB_ERR_INVALID_ARG;
            }
            unsafe { with_engine(assets, ptr::null(), |e| record(e.$method(pieces))) }
        }
    };
}

macro_rules! file_op {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        /// `data_dir` must be a valid null-terminated UTF-8 string.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(data_dir: *const c_char) -> c_int {
            if data_dir.is_null() {
                return ARB_ERR_INVALID_ARG;
            }
            unsafe { with_engine(ptr::null(), data_dir, |e| record(e.$method())) }
        }
    };
    ($(#[$meta:meta])* $name:ident => $method:ident(pieces)) => {
        $(#[$meta])*
        ///
        /// # Safety
        /// `data_dir` must be a valid null-terminated UTF-8 string.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(data_dir: *const c_char, pieces: i64) -> c_int {
            if data_dir.is_null() {
                return ARB_ERR_INVALID_ARG;
            }
            unsafe { with_engine(ptr::null(), data_dir, |e| record(e.$method(pieces))) }
        }
    };
}

asset_op!(
    /// Read the benchmark asset in one call
    arb_asset_read_one_go => asset_read_one_go
);
asset_op!(
    /// Read the benchmark asset in `pieces` calls
    arb_asset_read_multiple_go => asset_read_multiple_go(pieces)
);
file_op!(
    /// Open and stat the extracted file
    arb_open_one_go => open_one_go
);
file_op!(
    /// Open the extracted file without stat
    arb_open_no_stat_one_go => open_no_stat_one_go
);
file_op!(
    /// Read the extracted file in one call
    arb_file_read_one_go => file_read_one_go
);
file_op!(
    /// Read the extracted file in `pieces` calls
    arb_file_read_multiple_go => file_read_multiple_go(pieces)
);
file_op!(
    /// Stream the extracted file until exhausted
    arb_stream_file_read_one_go => stream_file_read_one_go
);
file_op!(
    /// Stream the extracted file in `pieces` reads
    arb_stream_file_read_multiple_go => stream_file_read_multiple_go(pieces)
);
file_op!(
    /// Read the extracted file through a buffered reader
    arb_fopen_one_go => fopen_one_go
);
file_op!(
    /// Map the extracted file and copy it out
    arb_mmap_read_one_go => mmap_read_one_go
);
file_op!(
    /// Map the extracted file and copy it out in `pieces`
    arb_mmap_read_multiple_go => mmap_read_multiple_go(pieces)
);
