//! C FFI bindings for photoboard.
//!
//! Lets a native UI host drive an image grid: the host owns the UI thread,
//! calls `photoboard_pump` from it to apply finished fetches, and reads slot
//! pixels back with `photoboard_slot_image`. Fetching and decoding run on a
//! runtime owned by the handle.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use photoboard::{
    display_channel, BoardOptions, DisplayQueue, ImageDecoder, ImageGrid, SlotContent, SlotKey,
};

// ---------------------------------------------------------------------------
// Opaque handle
// ---------------------------------------------------------------------------

/// Opaque handle to an image grid.
pub struct PhotoBoard {
    grid: ImageGrid<ImageDecoder>,
    display: DisplayQueue,
    // Declared last so it shuts down after the grid is gone.
    runtime: tokio::runtime::Runtime,
}

// ---------------------------------------------------------------------------
// Thread-local error
// ---------------------------------------------------------------------------

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_error(e: impl std::fmt::Display) {
    let msg = CString::new(e.to_string()).unwrap_or_default();
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = Some(msg);
    });
}

fn clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

// ---------------------------------------------------------------------------
// C-visible types
// ---------------------------------------------------------------------------

/// Options for creating a board.
#[repr(C)]
pub struct PhotoBoardOptions {
    /// Base image URL, null-terminated UTF-8 (nullable; NULL = default).
    pub base_url: *const c_char,
    /// Identifiers generated per reload.
    pub initial_count: usize,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// What a slot currently shows.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoBoardSlotState {
    Empty = 0,
    Pending = 1,
    Ready = 2,
}

/// RGBA8 pixels of a ready slot.
///
/// `pixels` stays valid until the next call that can change the slot:
/// `photoboard_pump`, `photoboard_recycle_slot`, `photoboard_reload_all`,
/// `photoboard_dequeue_slot` or `photoboard_free`.
#[repr(C)]
pub struct PhotoBoardImage {
    pub width: u32,
    pub height: u32,
    pub pixels: *const u8,
    pub len: usize,
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Log level for the logger callback.
#[repr(C)]
pub enum PhotoBoardLogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

/// Logger callback type.
pub type PhotoBoardLogFn = unsafe extern "C" fn(
    level: PhotoBoardLogLevel,
    message: *const c_char,
    len: usize,
    userdata: *mut std::ffi::c_void,
);

struct LoggerState {
    callback: PhotoBoardLogFn,
    userdata: usize, // stored as usize for Send+Sync
}

// Safety: the caller guarantees the userdata pointer (and callback) are safe
// to call from any thread.
unsafe impl Send for LoggerState {}
unsafe impl Sync for LoggerState {}

static LOGGER: OnceLock<LoggerState> = OnceLock::new();
static MIN_LOG_LEVEL: AtomicU8 = AtomicU8::new(2); // default: Info

/// A tracing layer that forwards events to the C logger callback.
struct FfiLayer;

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FfiLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let Some(state) = LOGGER.get() else {
            return;
        };

        let (level, c_level) = match *event.metadata().level() {
            tracing::Level::TRACE => (0u8, PhotoBoardLogLevel::Trace),
            tracing::Level::DEBUG => (1, PhotoBoardLogLevel::Debug),
            tracing::Level::INFO => (2, PhotoBoardLogLevel::Info),
            tracing::Level::WARN => (3, PhotoBoardLogLevel::Warn),
            tracing::Level::ERROR => (4, PhotoBoardLogLevel::Error),
        };

        if level < MIN_LOG_LEVEL.load(Ordering::Relaxed) {
            return;
        }

        let mut buf = String::new();
        let mut visitor = MessageVisitor(&mut buf);
        event.record(&mut visitor);

        if let Ok(c_str) = CString::new(buf) {
            let len = c_str.as_bytes().len();
            unsafe {
                (state.callback)(
                    c_level,
                    c_str.as_ptr(),
                    len,
                    state.userdata as *mut std::ffi::c_void,
                );
            }
        }
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        use std::fmt::Write;
        if field.name() == "message" {
            let _ = write!(self.0, "{:?}", value);
        } else {
            if !self.0.is_empty() {
                self.0.push(' ');
            }
            let _ = write!(self.0, "{}={:?}", field.name(), value);
        }
    }
}

/// Install a logger callback that receives all internal log messages.
///
/// Should be called before `photoboard_new`. Only the first call takes
/// effect. `min_level` filters: 0=Trace, 1=Debug, 2=Info, 3=Warn, 4=Error.
///
/// # Safety
///
/// - `callback` must be a valid function pointer safe to call from any thread.
/// - `userdata` must remain valid for the lifetime of the process.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_set_logger(
    callback: PhotoBoardLogFn,
    userdata: *mut std::ffi::c_void,
    min_level: u8,
) {
    MIN_LOG_LEVEL.store(min_level.min(4), Ordering::Relaxed);

    if LOGGER
        .set(LoggerState {
            callback,
            userdata: userdata as usize,
        })
        .is_ok()
    {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let _ = tracing_subscriber::registry().with(FfiLayer).try_init();
    }
}

// ---------------------------------------------------------------------------
// Create / Free
// ---------------------------------------------------------------------------

/// Return default board options (default base URL, 140 images, 60s timeout).
#[unsafe(no_mangle)]
pub extern "C" fn photoboard_default_options() -> PhotoBoardOptions {
    let defaults = BoardOptions::default();
    PhotoBoardOptions {
        base_url: ptr::null(),
        initial_count: defaults.initial_count,
        timeout_ms: defaults.request_timeout.as_millis() as u64,
    }
}

/// Create an empty board. Call `photoboard_reload_all` to populate it.
///
/// `options` may be NULL for defaults. Returns NULL on error; call
/// `photoboard_error_message()` for details.
///
/// # Safety
///
/// `options`, if non-null, must point to a valid `PhotoBoardOptions` whose
/// `base_url` is NULL or a valid null-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_new(options: *const PhotoBoardOptions) -> *mut PhotoBoard {
    clear_error();

    let mut board_opts = BoardOptions::default();
    if !options.is_null() {
        let opts = unsafe { &*options };
        if !opts.base_url.is_null() {
            match unsafe { CStr::from_ptr(opts.base_url) }.to_str() {
                Ok(s) => board_opts.base_url = s.to_string(),
                Err(e) => {
                    set_error(format!("invalid UTF-8 in base_url: {e}"));
                    return ptr::null_mut();
                }
            }
        }
        board_opts.initial_count = opts.initial_count;
        board_opts.request_timeout = Duration::from_millis(opts.timeout_ms);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            set_error(format!("failed to create tokio runtime: {e}"));
            return ptr::null_mut();
        }
    };

    let (display_handle, display) = display_channel();
    match ImageGrid::with_http(&board_opts, runtime.handle().clone(), display_handle) {
        Ok(grid) => Box::into_raw(Box::new(PhotoBoard {
            grid,
            display,
            runtime,
        })),
        Err(e) => {
            set_error(e);
            ptr::null_mut()
        }
    }
}

/// Free a board. In-flight fetches are abandoned. Passing NULL is a no-op.
///
/// # Safety
///
/// `board` must be NULL or a pointer from `photoboard_new` not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_free(board: *mut PhotoBoard) {
    if board.is_null() {
        return;
    }
    let handle = unsafe { Box::from_raw(board) };
    let PhotoBoard {
        grid,
        display,
        runtime,
    } = *handle;
    drop(grid);
    drop(display);
    runtime.shutdown_background();
}

// ---------------------------------------------------------------------------
// Grid actions
// ---------------------------------------------------------------------------

/// Clear the cache and replace every identifier. Returns 0, or -1 on error.
///
/// Slots bound past the new end are left `Empty` but are not returned to the
/// pool; pass them to `photoboard_recycle_slot` or they stay checked out.
///
/// # Safety
///
/// `board` must be a valid pointer from `photoboard_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_reload_all(board: *mut PhotoBoard) -> i32 {
    let Some(handle) = (unsafe { board_mut(board) }) else {
        return -1;
    };
    handle.grid.reload_all();
    0
}

/// Append one identifier. Returns its position, or -1 on error.
///
/// # Safety
///
/// `board` must be a valid pointer from `photoboard_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_add_image(board: *mut PhotoBoard) -> i64 {
    let Some(handle) = (unsafe { board_mut(board) }) else {
        return -1;
    };
    handle.grid.add_image() as i64
}

/// Number of identifiers, or 0 for NULL.
///
/// # Safety
///
/// `board` must be NULL or a valid pointer from `photoboard_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_len(board: *const PhotoBoard) -> usize {
    if board.is_null() {
        return 0;
    }
    unsafe { &*board }.grid.len()
}

/// Bind a pooled slot to `position` and start loading its image.
///
/// Returns the slot id, or -1 if `position` is out of range.
///
/// # Safety
///
/// `board` must be a valid pointer from `photoboard_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_dequeue_slot(board: *mut PhotoBoard, position: usize) -> i64 {
    let Some(handle) = (unsafe { board_mut(board) }) else {
        return -1;
    };
    match handle.grid.dequeue_slot(position) {
        Some(SlotKey(key)) => key as i64,
        None => {
            set_error(format!(
                "position {position} out of range (len {})",
                handle.grid.len()
            ));
            -1
        }
    }
}

/// Return a slot to the pool. Returns 0, or -1 if the slot is unknown or
/// already recycled.
///
/// # Safety
///
/// `board` must be a valid pointer from `photoboard_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_recycle_slot(board: *mut PhotoBoard, slot: usize) -> i32 {
    let Some(handle) = (unsafe { board_mut(board) }) else {
        return -1;
    };
    if handle.grid.recycle_slot(SlotKey(slot)) {
        0
    } else {
        set_error(format!("slot {slot} is unknown or already recycled"));
        -1
    }
}

/// Apply every finished fetch. Must be called from the host's UI thread.
///
/// Returns the number of completions processed (stale ones included), or
/// -1 on error.
///
/// # Safety
///
/// `board` must be a valid pointer from `photoboard_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_pump(board: *mut PhotoBoard) -> i64 {
    let Some(handle) = (unsafe { board_mut(board) }) else {
        return -1;
    };
    handle.display.run_pending() as i64
}

/// Read a slot's state. When it is `Ready` and `out` is non-null, `out` is
/// filled with its pixels.
///
/// Returns a `PhotoBoardSlotState` value, or -1 on error.
///
/// # Safety
///
/// - `board` must be a valid pointer from `photoboard_new`.
/// - `out` must be NULL or point to writable memory for a `PhotoBoardImage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photoboard_slot_image(
    board: *mut PhotoBoard,
    slot: usize,
    out: *mut PhotoBoardImage,
) -> i32 {
    let Some(handle) = (unsafe { board_mut(board) }) else {
        return -1;
    };
    let Some(snapshot) = handle.grid.slot(SlotKey(slot)) else {
        set_error(format!("unknown slot {slot}"));
        return -1;
    };

    let state = match snapshot.content {
        SlotContent::Empty => PhotoBoardSlotState::Empty,
        SlotContent::Pending => PhotoBoardSlotState::Pending,
        SlotContent::Ready(image) => {
            if !out.is_null() {
                // The slot keeps its own reference to the buffer, so the
                // pointer outlives this clone.
                unsafe {
                    *out = PhotoBoardImage {
                        width: image.width,
                        height: image.height,
                        pixels: image.pixels.as_ptr(),
                        len: image.pixels.len(),
                    };
                }
            }
            PhotoBoardSlotState::Ready
        }
    };
    state as i32
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Get the last error message, or NULL if no error occurred.
///
/// The returned pointer is owned by the library and valid until the next
/// FFI call on the same thread.
#[unsafe(no_mangle)]
pub extern "C" fn photoboard_error_message() -> *const c_char {
    LAST_ERROR.with(|cell| {
        let borrow = cell.borrow();
        match borrow.as_ref() {
            Some(s) => s.as_ptr(),
            None => ptr::null(),
        }
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn a raw handle into a reference, recording an error for NULL.
///
/// # Safety
///
/// `board` must be NULL or a valid, unaliased pointer from `photoboard_new`.
unsafe fn board_mut<'a>(board: *mut PhotoBoard) -> Option<&'a mut PhotoBoard> {
    clear_error();
    if board.is_null() {
        set_error("board must not be NULL");
        return None;
    }
    Some(unsafe { &mut *board })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_error() -> String {
        let msg = photoboard_error_message();
        assert!(!msg.is_null());
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    }

    /// Port 9 (discard) refuses connections, so fetches fail fast and quietly.
    fn unreachable_board(count: usize) -> *mut PhotoBoard {
        let base = CString::new("http://127.0.0.1:9/img").unwrap();
        let options = PhotoBoardOptions {
            base_url: base.as_ptr(),
            initial_count: count,
            timeout_ms: 500,
        };
        let board = unsafe { photoboard_new(&options) };
        assert!(!board.is_null());
        board
    }

    static LOGGED: std::sync::Mutex<Vec<(u8, String)>> = std::sync::Mutex::new(Vec::new());

    unsafe extern "C" fn record_log(
        level: PhotoBoardLogLevel,
        message: *const c_char,
        _len: usize,
        _userdata: *mut std::ffi::c_void,
    ) {
        let text = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
        LOGGED.lock().unwrap().push((level as u8, text));
    }

    #[test]
    fn logger_receives_events_at_or_above_min_level() {
        unsafe { photoboard_set_logger(record_log, ptr::null_mut(), PhotoBoardLogLevel::Info as u8) };

        let board = unreachable_board(7);
        unsafe {
            assert_eq!(photoboard_reload_all(board), 0);
            // logged at debug, below the threshold
            assert_eq!(photoboard_add_image(board), 7);
            photoboard_free(board);
        }

        let logged = LOGGED.lock().unwrap();
        assert!(logged
            .iter()
            .any(|(level, msg)| *level == PhotoBoardLogLevel::Info as u8
                && msg == "reloaded 7 identifiers"));
        assert!(logged.iter().all(|(level, _)| *level >= PhotoBoardLogLevel::Info as u8));
        assert!(!logged.iter().any(|(_, msg)| msg.starts_with("added identifier")));
    }

    #[test]
    fn default_options_match_library_defaults() {
        let options = photoboard_default_options();
        assert!(options.base_url.is_null());
        assert_eq!(options.initial_count, 140);
        assert_eq!(options.timeout_ms, 60_000);
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let base = CString::new("not a url").unwrap();
        let options = PhotoBoardOptions {
            base_url: base.as_ptr(),
            ..photoboard_default_options()
        };
        let board = unsafe { photoboard_new(&options) };
        assert!(board.is_null());
        assert!(last_error().contains("Invalid base URL"));
    }

    #[test]
    fn null_board_is_rejected() {
        assert_eq!(unsafe { photoboard_reload_all(ptr::null_mut()) }, -1);
        assert_eq!(last_error(), "board must not be NULL");
        assert_eq!(unsafe { photoboard_len(ptr::null()) }, 0);
        unsafe { photoboard_free(ptr::null_mut()) };
    }

    #[test]
    fn reload_add_and_slot_lifecycle() {
        let board = unreachable_board(4);
        unsafe {
            assert_eq!(photoboard_len(board), 0);
            assert_eq!(photoboard_reload_all(board), 0);
            assert_eq!(photoboard_len(board), 4);
            assert_eq!(photoboard_add_image(board), 4);
            assert_eq!(photoboard_len(board), 5);

            assert_eq!(photoboard_dequeue_slot(board, 5), -1);
            let slot = photoboard_dequeue_slot(board, 0);
            assert_eq!(slot, 0);

            let mut image = PhotoBoardImage {
                width: 0,
                height: 0,
                pixels: ptr::null(),
                len: 0,
            };
            assert_eq!(
                photoboard_slot_image(board, slot as usize, &mut image),
                PhotoBoardSlotState::Pending as i32
            );
            assert!(image.pixels.is_null());
            assert!(photoboard_pump(board) >= 0);

            assert_eq!(photoboard_recycle_slot(board, slot as usize), 0);
            assert_eq!(photoboard_recycle_slot(board, slot as usize), -1);
            assert_eq!(
                photoboard_slot_image(board, slot as usize, ptr::null_mut()),
                PhotoBoardSlotState::Empty as i32
            );
            assert_eq!(photoboard_slot_image(board, 42, ptr::null_mut()), -1);

            photoboard_free(board);
        }
    }
}
