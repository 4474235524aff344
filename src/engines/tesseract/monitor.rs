//! Native `ETEXT_DESC` bound to a [`ProgressMonitor`]

use crate::capi::sys;
use crate::error::OcrError;
use crate::monitor::ProgressMonitor;
use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;

/// Lives for exactly one `TessBaseAPIRecognize` call
pub(crate) struct NativeMonitor<'m> {
    ptr: NonNull<sys::ETEXT_DESC>,
    _monitor: std::marker::PhantomData<&'m ProgressMonitor>,
}

impl<'m> NativeMonitor<'m> {
    /// Create the native monitor and point its callbacks at `monitor`.
    /// Any deadline starts counting now.
    pub(crate) fn new(monitor: &'m ProgressMonitor) -> Result<Self, OcrError> {
        let ptr = NonNull::new(unsafe { sys::TessMonitorCreate() })
            .ok_or_else(|| OcrError::Internal("TessMonitorCreate returned null".to_string()))?;

        unsafe {
            sys::TessMonitorSetCancelThis(ptr.as_ptr(), monitor.context_ptr() as *mut c_void);
            sys::TessMonitorSetCancelFunc(ptr.as_ptr(), Some(cancel_callback));
            sys::TessMonitorSetProgressFunc(ptr.as_ptr(), Some(progress_callback));

            if let Some(deadline) = monitor.deadline() {
                let millis = deadline.as_millis().min(c_int::MAX as u128) as c_int;
                sys::TessMonitorSetDeadlineMSecs(ptr.as_ptr(), millis);
            }
        }

        Ok(Self {
            ptr,
            _monitor: std::marker::PhantomData,
        })
    }

    pub(crate) fn as_ptr(&self) -> *mut sys::ETEXT_DESC {
        self.ptr.as_ptr()
    }
}

impl Drop for NativeMonitor<'_> {
    fn drop(&mut self) {
        unsafe { sys::TessMonitorDelete(self.ptr.as_ptr()) }
    }
}

unsafe extern "C" fn cancel_callback(cancel_this: *mut c_void, words: c_int) -> bool {
    if cancel_this.is_null() {
        return false;
    }
    let monitor = ProgressMonitor::from_context(cancel_this as *const ());
    monitor.record_words(words);
    monitor.is_cancelled()
}

unsafe extern "C" fn progress_callback(
    ths: *mut sys::ETEXT_DESC,
    _left: c_int,
    _right: c_int,
    _top: c_int,
    _bottom: c_int,
) -> bool {
    let context = sys::TessMonitorGetCancelThis(ths);
    if context.is_null() {
        return false;
    }
    ProgressMonitor::from_context(context as *const ()).record_progress(sys::TessMonitorGetProgress(ths));
    true
}
