macro_rules! impl_bit_ops {
    ($t:tt, $b:tt) => {
        impl std::ops::BitOr for $t {
            type Output = $t;

            #[inline(always)]
            fn bitor(self, rhs: $t) -> $t {
                $t(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $t {
            #[inline(always)]
            fn bitor_assign(&mut self, rhs: $t) {
                self.0 |= rhs.0;
            }
        }

        impl std::ops::BitAnd for $t {
            type Output = $t;

            #[inline(always)]
            fn bitand(self, rhs: $t) -> $t {
                $t(self.0 & rhs.0)
            }
        }

        impl std::ops::BitAndAssign for $t {
            #[inline(always)]
            fn bitand_assign(&mut self, rhs: $t) {
                self.0 &= rhs.0;
            }
        }

        impl std::ops::BitXor for $t {
            type Output = $t;

            #[inline(always)]
            fn bitxor(self, rhs: $t) -> $t {
                $t(self.0 ^ rhs.0)
            }
        }

        impl std::ops::BitXorAssign for $t {
            #[inline(always)]
            fn bitxor_assign(&mut self, rhs: $t) {
                self.0 ^= rhs.0;
            }
        }

        impl std::ops::Not for $t {
            type Output = $t;

            #[inline(always)]
            fn not(self) -> $t {
                $t(!self.0)
            }
        }

        impl std::ops::Sub for $t {
            type Output = $t;

            #[inline(always)]
            fn sub(self, rhs: $t) -> $t {
                $t(self.0.wrapping_sub(rhs.0))
            }
        }

        impl std::ops::Sub<$b> for $t {
            type Output = $t;

            #[inline(always)]
            fn sub(self, rhs: $b) -> $t {
                $t(self.0.wrapping_sub(rhs))
            }
        }

        impl std::ops::Add<$b> for $t {
            type Output = $t;

            #[inline(always)]
            fn add(self, rhs: $b) -> $t {
                $t(self.0.wrapping_add(rhs))
            }
        }

        impl std::ops::Shl<$b> for $t {
            type Output = $t;

            #[inline(always)]
            fn shl(self, rhs: $b) -> $t {
                $t(self.0.wrapping_shl(rhs as u32))
            }
        }

        impl std::ops::Shr<$b> for $t {
            type Output = $t;

            #[inline(always)]
            fn shr(self, rhs: $b) -> $t {
                $t(self.0.wrapping_shr(rhs as u32))
            }
        }
    };
}
