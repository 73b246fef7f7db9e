//! The C ABI exposed to instrumented programs.
//!
//! Each hook mirrors one trace record. The instrumenter emits calls against
//! these symbols; the test framework calls `aardwolf_write_external` between
//! test cases. With the `noop-runtime` feature the same symbols are compiled
//! with empty bodies, so test binaries link unchanged without producing a
//! trace.

#[cfg(not(feature = "noop-runtime"))]
pub use live::*;
#[cfg(feature = "noop-runtime")]
pub use noop::*;

#[cfg(not(feature = "noop-runtime"))]
mod live {
    use std::ffi::{c_char, CStr};

    use crate::runtime::with_trace;

    /// Writes the trace header. The process-wide runtime emits the header on
    /// first use automatically; this exists for bare runtimes driving the
    /// sink manually.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_header() {
        // Opening the file writes the header; nothing else to do.
        with_trace(|_| Ok(()));
    }

    /// Records that statement `(file_id, stmt_id)` was reached.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_statement(file_id: u64, stmt_id: u64) {
        with_trace(|sink| sink.statement(file_id, stmt_id));
    }

    /// Records a test-case boundary with the given name.
    ///
    /// # Safety
    ///
    /// `external` must be a valid NUL-terminated C string or null (null is
    /// ignored).
    #[no_mangle]
    pub unsafe extern "C" fn aardwolf_write_external(external: *const c_char) {
        if external.is_null() {
            return;
        }
        let name = CStr::from_ptr(external).to_string_lossy();
        with_trace(|sink| sink.external(&name));
    }

    /// Records a produced `i8`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_i8(value: i8) {
        with_trace(|sink| sink.data_i8(value));
    }

    /// Records a produced `i16`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_i16(value: i16) {
        with_trace(|sink| sink.data_i16(value));
    }

    /// Records a produced `i32`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_i32(value: i32) {
        with_trace(|sink| sink.data_i32(value));
    }

    /// Records a produced `i64`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_i64(value: i64) {
        with_trace(|sink| sink.data_i64(value));
    }

    /// Records a produced `u8`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_u8(value: u8) {
        with_trace(|sink| sink.data_u8(value));
    }

    /// Records a produced `u16`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_u16(value: u16) {
        with_trace(|sink| sink.data_u16(value));
    }

    /// Records a produced `u32`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_u32(value: u32) {
        with_trace(|sink| sink.data_u32(value));
    }

    /// Records a produced `u64`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_u64(value: u64) {
        with_trace(|sink| sink.data_u64(value));
    }

    /// Records a produced `f32`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_f32(value: f32) {
        with_trace(|sink| sink.data_f32(value));
    }

    /// Records a produced `f64`.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_f64(value: f64) {
        with_trace(|sink| sink.data_f64(value));
    }

    /// Records a produced boolean.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_bool(value: bool) {
        with_trace(|sink| sink.data_bool(value));
    }

    /// Records a produced value of an unsupported type.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_unsupported() {
        with_trace(|sink| sink.data_unsupported());
    }

    /// Records a produced symbolic value.
    ///
    /// # Safety
    ///
    /// `name` must be a valid NUL-terminated C string or null (null is
    /// ignored).
    #[no_mangle]
    pub unsafe extern "C" fn aardwolf_write_data_named(name: *const c_char) {
        if name.is_null() {
            return;
        }
        let name = CStr::from_ptr(name).to_string_lossy();
        with_trace(|sink| sink.data_named(&name));
    }

    /// Records a produced null value.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_null() {
        with_trace(|sink| sink.data_null());
    }
}

#[cfg(feature = "noop-runtime")]
mod noop {
    use std::ffi::c_char;

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_header() {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_statement(_file_id: u64, _stmt_id: u64) {}

    /// No-op variant; see the `noop-runtime` feature.
    ///
    /// # Safety
    ///
    /// Never dereferences its argument.
    #[no_mangle]
    pub unsafe extern "C" fn aardwolf_write_external(_external: *const c_char) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_i8(_value: i8) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_i16(_value: i16) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_i32(_value: i32) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_i64(_value: i64) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_u8(_value: u8) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_u16(_value: u16) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_u32(_value: u32) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_u64(_value: u64) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_f32(_value: f32) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_f64(_value: f64) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_bool(_value: bool) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_unsupported() {}

    /// No-op variant; see the `noop-runtime` feature.
    ///
    /// # Safety
    ///
    /// Never dereferences its argument.
    #[no_mangle]
    pub unsafe extern "C" fn aardwolf_write_data_named(_name: *const c_char) {}

    /// No-op variant; see the `noop-runtime` feature.
    #[no_mangle]
    pub extern "C" fn aardwolf_write_data_null() {}
}
