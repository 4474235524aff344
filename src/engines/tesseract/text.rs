//! Ownership of strings and arrays returned by the C API

use crate::capi::sys;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr::NonNull;

/// A `char*` allocated by the engine, released with `TessDeleteText`
pub(crate) struct NativeText(NonNull<c_char>);

impl NativeText {
    /// # Safety
    ///
    /// `ptr` must be null or a string the engine allocated for the caller.
    pub(crate) unsafe fn from_raw(ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(NativeText)
    }

    pub(crate) fn to_string_lossy(&self) -> String {
        unsafe { CStr::from_ptr(self.0.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}

impl Drop for NativeText {
    fn drop(&mut self) {
        unsafe { sys::TessDeleteText(self.0.as_ptr()) }
    }
}

/// Copy out and release an owned `char*`
///
/// # Safety
///
/// Same contract as [`NativeText::from_raw`].
pub(crate) unsafe fn take_text(ptr: *mut c_char) -> Option<String> {
    NativeText::from_raw(ptr).map(|text| text.to_string_lossy())
}

/// Copy a `const char*` the engine keeps ownership of
///
/// # Safety
///
/// `ptr` must be null or a NUL-terminated string valid for this call.
pub(crate) unsafe fn borrowed_text(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

struct NativeTextArray(NonNull<*mut c_char>);

impl Drop for NativeTextArray {
    fn drop(&mut self) {
        unsafe { sys::TessDeleteTextArray(self.0.as_ptr()) }
    }
}

/// Copy out and release a NULL-terminated `char**`
///
/// # Safety
///
/// `ptr` must be null or an array the engine allocated for the caller.
pub(crate) unsafe fn take_text_array(ptr: *mut *mut c_char) -> Vec<String> {
    let Some(array) = NonNull::new(ptr).map(NativeTextArray) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut cursor = array.0.as_ptr();
    while !(*cursor).is_null() {
        items.push(CStr::from_ptr(*cursor).to_string_lossy().into_owned());
        cursor = cursor.add(1);
    }
    items
}

struct NativeIntArray(NonNull<c_int>);

impl Drop for NativeIntArray {
    fn drop(&mut self) {
        unsafe { sys::TessDeleteIntArray(self.0.as_ptr()) }
    }
}

/// Copy out and release a `-1`-terminated `int*`
///
/// # Safety
///
/// `ptr` must be null or an array the engine allocated for the caller.
pub(crate) unsafe fn take_int_array(ptr: *mut c_int) -> Vec<i32> {
    let Some(array) = NonNull::new(ptr).map(NativeIntArray) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut cursor = array.0.as_ptr();
    while *cursor != -1 {
        items.push(*cursor);
        cursor = cursor.add(1);
    }
    items
}
