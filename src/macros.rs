//! Helper macros for bounds-checked decoding.

/// Ensures that a given cursor has at least the expected amount of bytes left.
///
/// Returns [`Error::OutOfBounds`](crate::Error::OutOfBounds) from the enclosing function otherwise.
macro_rules! ensure_size {
    (in: $buf:ident, size: $expected:expr) => {{
        let available = $buf.len();
        let needed = $expected;
        if !(available >= needed) {
            return Err($crate::Error::OutOfBounds {
                offset: $buf.pos(),
                needed,
                available,
            });
        }
    }};
}
