//! Wabbit runtime library.
//!
//! The compiled module declares one external: `void print_char(i8)`. This
//! crate provides that symbol with C ABI so the object the external code
//! generator emits resolves at link time, whether linked statically or
//! loaded as a shared library.

/// Writes a single byte to stdout, unbuffered.
#[no_mangle]
pub extern "C" fn print_char(c: libc::c_char) {
    let byte = c as u8;
    // A short write of a single byte can only mean stdout is gone; there
    // is nowhere to report that, so the result is ignored.
    let _ = unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            &byte as *const u8 as *const libc::c_void,
            1,
        )
    };
}
