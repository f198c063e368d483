//! C ABI entry points called from generated code
//!
//! Names follow the assembly's call targets, hence the camel case.
//! Unparseable input reads as zero.

#![allow(non_snake_case)]

use crate::format::{format_int, format_real, parse_int, parse_real};
use std::ffi::{CStr, c_char};
use std::io::{BufRead, Write};

fn write_line(text: &str) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    // Nothing sensible to do on a closed stdout
    let _ = writeln!(out, "{}", text);
    let _ = out.flush();
}

fn read_line() -> String {
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        line.clear();
    }
    line
}

#[unsafe(no_mangle)]
pub extern "C" fn printInt(value: i32) {
    write_line(&format_int(value));
}

#[unsafe(no_mangle)]
pub extern "C" fn printReal(value: f32) {
    write_line(&format_real(value));
}

/// # Safety
///
/// `text` must be null or point to a NUL terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn printString(text: *const c_char) {
    if text.is_null() {
        write_line("");
        return;
    }
    // SAFETY: non-null and NUL terminated per the contract above
    let text = unsafe { CStr::from_ptr(text) };
    write_line(&text.to_string_lossy());
}

#[unsafe(no_mangle)]
pub extern "C" fn readInt() -> i32 {
    parse_int(&read_line()).unwrap_or(0)
}

#[unsafe(no_mangle)]
pub extern "C" fn readReal() -> f32 {
    parse_real(&read_line()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_string_accepts_null() {
        unsafe { printString(std::ptr::null()) };
        let text = c"hello";
        unsafe { printString(text.as_ptr()) };
    }
}
