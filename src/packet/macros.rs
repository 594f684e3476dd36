/// Declares a 16-bit wire value as a newtype with named constants.
///
/// Unlike a native `enum`, values received off the wire that match no constant stay
/// representable and can be passed through unchanged.
macro_rules! wire_enum {
    (
        $( #[$attrs:meta] )*
        $v:vis enum $name:ident {
            $(
                $( #[$variant_attrs:meta] )*
                $variant:ident = $value:expr
            ),+
            $(,)?
        }
    ) => {
        $( #[$attrs] )*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
        #[repr(transparent)]
        $v struct $name(pub u16);

        impl $name {
            $(
                $( #[$variant_attrs] )*
                $v const $variant: Self = Self($value);
            )+
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match *self {
                    $(
                        Self::$variant => f.write_str(stringify!($variant)),
                    )+
                    _ => write!(f, "(unknown {}: {:#x})", stringify!($name), self.0),
                }
            }
        }
    };
}
