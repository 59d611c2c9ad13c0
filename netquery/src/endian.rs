//! Conversions between host byte order and the two fixed byte orders used in
//! network programming: network (big-endian) order and little-endian order.
//! On a host that already matches the target order these are identity
//! functions.

/// Integer types whose byte order can be reversed.
pub trait ByteSwap: Copy {
    fn byte_swapped(self) -> Self;
}

macro_rules! impl_byte_swap {
    ($($t:ty),*) => {
        $(impl ByteSwap for $t {
            fn byte_swapped(self) -> Self {
                <$t>::swap_bytes(self)
            }
        })*
    };
}

impl_byte_swap!(u8, i8, u16, i16, u32, i32);

/// Returns `true` when the target stores integers in big-endian order.
pub const fn is_big_endian() -> bool {
    cfg!(target_endian = "big")
}

/// Converts a value from host order to network (big-endian) order.
pub fn host_to_network<T: ByteSwap>(value: T) -> T {
    if is_big_endian() {
        value
    } else {
        value.byte_swapped()
    }
}

/// Converts a value from network (big-endian) order to host order.
pub fn network_to_host<T: ByteSwap>(value: T) -> T {
    host_to_network(value)
}

/// Converts a value from host order to little-endian order.
pub fn host_to_little_endian<T: ByteSwap>(value: T) -> T {
    if is_big_endian() {
        value.byte_swapped()
    } else {
        value
    }
}

/// Converts a value from little-endian order to host order.
pub fn little_endian_to_host<T: ByteSwap>(value: T) -> T {
    host_to_little_endian(value)
}
